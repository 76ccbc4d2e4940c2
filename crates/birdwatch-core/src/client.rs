//! High-level daemon queries.
//!
//! Every operation builds a command, optionally adds the channel filter, and
//! hands it to the [`Dispatcher`] with the matching parser.

use std::sync::Arc;

use birdwatch_config::{AppConfig, ParserConfig};

use crate::cache::QueryCache;
use crate::dispatcher::Dispatcher;
use crate::executor::{BirdcExecutor, Executor};
use crate::outcome::Fetched;
use crate::parsed::{Parsed, Value};
use crate::parser::{BirdOutputParser, OutputParser};
use crate::query::{daemon_major_version, noexport_protocol, with_channel_filter};
use crate::rate_limit::RateLimiter;
use crate::status::StatusShaper;

/// Query facade over a running routing daemon.
pub struct BirdClient {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) parser: Arc<dyn OutputParser>,
    pub(crate) shaper: StatusShaper,
    pub(crate) topology: ParserConfig,
    pub(crate) ip_version: String,
}

impl BirdClient {
    /// Build a client around an explicit executor and rate limiter.
    pub fn new(config: &AppConfig, executor: Arc<dyn Executor>, limiter: Arc<RateLimiter>) -> Self {
        let cache = QueryCache::new(config.bird.cache_ttl);
        Self {
            dispatcher: Dispatcher::new(cache, limiter, executor),
            parser: Arc::new(BirdOutputParser),
            shaper: StatusShaper::from_config(config),
            topology: config.parser.clone(),
            ip_version: config.bird.ip_version.clone(),
        }
    }

    /// Build a client that runs the configured `birdc` binary.
    pub fn from_config(config: &AppConfig) -> Self {
        let executor = Arc::new(BirdcExecutor::from_config(&config.bird));
        let limiter = Arc::new(RateLimiter::from_config(&config.ratelimit));
        Self::new(config, executor, limiter)
    }

    /// Replace the output parser.
    pub fn with_parser(mut self, parser: Arc<dyn OutputParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.dispatcher.limiter()
    }

    pub fn per_peer_tables(&self) -> bool {
        self.topology.per_peer_tables
    }

    pub(crate) async fn run_routes(&self, cmd: &str) -> Fetched {
        self.dispatcher
            .run_and_parse(cmd, |raw| self.parser.routes(raw))
            .await
    }

    async fn run_routes_count(&self, cmd: &str) -> Fetched {
        self.dispatcher
            .run_and_parse(cmd, |raw| self.parser.routes_count(raw))
            .await
    }

    /// Daemon status, with `last_reconfig` and filtered fields shaped on
    /// fresh results.
    pub async fn status(&self) -> Fetched {
        self.dispatcher
            .run_and_parse("status", |raw| self.shaper.shape(self.parser.status(raw)))
            .await
    }

    pub async fn protocols(&self) -> Fetched {
        self.dispatcher
            .run_and_parse("protocols all", |raw| self.parser.protocols(raw))
            .await
    }

    /// The protocol listing restricted to BGP sessions.
    pub async fn protocols_bgp(&self) -> Fetched {
        self.protocols().await.map(bgp_only)
    }

    pub async fn symbols(&self) -> Fetched {
        self.dispatcher
            .run_and_parse("symbols", |raw| self.parser.symbols(raw))
            .await
    }

    /// Add the channel filter to `cmd` if the running daemon needs it.
    ///
    /// Goes through [`BirdClient::status`], so it may use the cache and
    /// consume a rate-limit token.
    pub async fn route_query_for_channel(&self, cmd: &str) -> String {
        let status = self.status().await;
        let major = status.outcome.as_parsed().and_then(daemon_major_version);
        with_channel_filter(cmd, major, &self.ip_version)
    }

    pub async fn routes_prefixed(&self, prefix: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route {prefix} all"))
            .await;
        self.run_routes(&cmd).await
    }

    pub async fn routes_proto(&self, protocol: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route all protocol {protocol}"))
            .await;
        self.run_routes(&cmd).await
    }

    pub async fn routes_proto_count(&self, protocol: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route protocol {protocol}"))
            .await;
        self.run_routes_count(&format!("{cmd} count")).await
    }

    pub async fn routes_filtered(&self, protocol: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route all filtered protocol {protocol}"))
            .await;
        self.run_routes(&cmd).await
    }

    pub async fn routes_export(&self, protocol: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route all export {protocol}"))
            .await;
        self.run_routes(&cmd).await
    }

    /// Routes rejected by the export filter of `protocol`.
    ///
    /// With per-peer tables the peer name is rewritten to its pipe protocol.
    pub async fn routes_noexport(&self, protocol: &str) -> Fetched {
        let protocol = noexport_protocol(protocol, &self.topology);
        let cmd = self
            .route_query_for_channel(&format!("route all noexport {protocol}"))
            .await;
        self.run_routes(&cmd).await
    }

    pub async fn routes_export_count(&self, protocol: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route export {protocol}"))
            .await;
        self.run_routes_count(&format!("{cmd} count")).await
    }

    pub async fn routes_table(&self, table: &str) -> Fetched {
        self.run_routes(&format!("route table {table} all")).await
    }

    pub async fn routes_table_count(&self, table: &str) -> Fetched {
        self.run_routes_count(&format!("route table {table} count"))
            .await
    }

    pub async fn routes_lookup_table(&self, net: &str, table: &str) -> Fetched {
        self.run_routes(&format!("route for {net} table {table} all"))
            .await
    }

    pub async fn routes_lookup_protocol(&self, net: &str, protocol: &str) -> Fetched {
        self.run_routes(&format!("route for {net} protocol {protocol} all"))
            .await
    }

    pub async fn routes_peer(&self, peer: &str) -> Fetched {
        let cmd = self
            .route_query_for_channel(&format!("route export {peer}"))
            .await;
        self.run_routes(&cmd).await
    }

    /// Imported routes of the main table, channel filtered.
    pub(crate) async fn routes_imported(&self) -> Fetched {
        let cmd = self.route_query_for_channel("route all").await;
        self.run_routes(&cmd).await
    }
}

/// Keep only protocols whose `bird_protocol` is `BGP`. Other top-level
/// fields, cache bookkeeping included, are left alone.
fn bgp_only(mut parsed: Parsed) -> Parsed {
    let bgp: Parsed = match parsed.remove("protocols") {
        Some(Value::Object(all)) => all
            .into_iter()
            .filter(|(_, details)| {
                details.get("bird_protocol").and_then(Value::as_str) == Some("BGP")
            })
            .collect(),
        _ => Parsed::new(),
    };
    parsed.insert("protocols".to_string(), Value::Object(bgp));
    parsed
}
