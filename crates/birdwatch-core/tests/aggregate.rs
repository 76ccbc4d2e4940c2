//! Route dumps over a single shared table and over per-peer tables.

use std::sync::Arc;

use birdwatch_config::AppConfig;
use birdwatch_core::outcome::Outcome;
use birdwatch_core::parsed::{Parsed, Value};
use birdwatch_core::rate_limit::RateLimiter;
use birdwatch_core::BirdClient;
use birdwatch_test_utils::config::TestConfigBuilder;
use birdwatch_test_utils::executor::ScriptedExecutor;
use birdwatch_test_utils::fixtures;
use pretty_assertions::assert_eq;
use serde_json::json;

const IMPORTED: &str = "route all where net.type = NET_IP4";
const FILTERED: &str = "route all filtered where net.type = NET_IP4";
const FILTERED_ID_1: &str = "route all filtered protocol ID_1 where net.type = NET_IP4";
const FILTERED_ID_2: &str = "route all filtered protocol ID_2 where net.type = NET_IP4";

fn client(config: &AppConfig, executor: &Arc<ScriptedExecutor>) -> BirdClient {
    BirdClient::new(config, executor.clone(), Arc::new(RateLimiter::disabled()))
}

fn networks(dump: &Parsed, key: &str) -> Vec<String> {
    dump.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|route| route["network"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_single_table_dump() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .respond(FILTERED, fixtures::ROUTES_FILTERED),
    );
    let client = client(&TestConfigBuilder::new().build(), &executor);

    let fetched = client.routes_dump().await;
    assert!(!fetched.from_cache);
    let dump = fetched.outcome.into_parsed().unwrap();

    assert_eq!(
        networks(&dump, "imported"),
        ["10.0.0.0/24", "10.0.1.0/24", "10.2.0.0/24"]
    );
    assert_eq!(networks(&dump, "filtered"), ["192.168.0.0/16"]);
    assert_eq!(executor.calls("protocols all"), 0);
}

#[tokio::test]
async fn test_single_table_dump_reports_imported_cache_flag() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .respond(FILTERED, fixtures::ROUTES_FILTERED),
    );
    let client = client(&TestConfigBuilder::new().build(), &executor);

    client.routes_dump_single_table().await;
    let dump = client.routes_dump_single_table().await;

    assert!(dump.from_cache);
    assert_eq!(executor.calls(IMPORTED), 1);
    assert_eq!(executor.calls(FILTERED), 1);
}

#[tokio::test]
async fn test_single_table_dump_propagates_unreachable() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .fail(FILTERED),
    );
    let client = client(&TestConfigBuilder::new().build(), &executor);

    assert_eq!(client.routes_dump().await.outcome, Outcome::Unreachable);
}

#[tokio::test]
async fn test_per_peer_dump_queries_only_protocols_with_filtered_routes() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .respond("protocols all", fixtures::PROTOCOLS)
            .respond(FILTERED_ID_2, fixtures::ROUTES_FILTERED_ID_2),
    );
    let config = TestConfigBuilder::new().per_peer_tables(true).build();
    let client = client(&config, &executor);

    let dump = client.routes_dump().await.outcome.into_parsed().unwrap();

    assert_eq!(networks(&dump, "imported").len(), 3);
    assert_eq!(
        networks(&dump, "filtered"),
        ["192.168.0.0/16", "172.16.0.0/12"]
    );
    assert_eq!(executor.calls(FILTERED_ID_1), 0);
    assert_eq!(executor.calls(FILTERED_ID_2), 1);
    assert_eq!(executor.calls(FILTERED), 0);
}

#[tokio::test]
async fn test_per_peer_dump_skips_failed_protocol_queries() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .respond("protocols all", fixtures::PROTOCOLS)
            .fail(FILTERED_ID_2),
    );
    let config = TestConfigBuilder::new().per_peer_tables(true).build();
    let client = client(&config, &executor);

    let dump = client.routes_dump().await.outcome.into_parsed().unwrap();
    assert_eq!(dump["filtered"], json!([]));
}

#[tokio::test]
async fn test_per_peer_dump_tolerates_missing_counters() {
    let protocols = "BIRD 2.0.9 ready.
ID_9       BGP        ---        start  2024-02-01    Active
";
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .respond("protocols all", protocols),
    );
    let config = TestConfigBuilder::new().per_peer_tables(true).build();
    let client = client(&config, &executor);

    let dump = client.routes_dump().await.outcome.into_parsed().unwrap();
    assert_eq!(dump["filtered"], json!([]));
    assert_eq!(executor.total_calls(), 3);
}

#[tokio::test]
async fn test_per_peer_dump_propagates_unreachable_protocols() {
    let executor = Arc::new(
        ScriptedExecutor::new()
            .respond("status", fixtures::status("2.0.9"))
            .respond(IMPORTED, fixtures::ROUTES_IMPORTED)
            .fail("protocols all"),
    );
    let config = TestConfigBuilder::new().per_peer_tables(true).build();
    let client = client(&config, &executor);

    assert_eq!(client.routes_dump().await.outcome, Outcome::Unreachable);
}
