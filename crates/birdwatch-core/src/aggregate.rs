//! Route dumps: imported plus filtered routes.
//!
//! A single shared table exposes one filtered view. With per-peer tables,
//! filtered routes are only visible per ingress protocol, so the dump fans
//! out over every BGP session that reports filtered routes.

use serde_json::json;
use tracing::debug;

use crate::client::BirdClient;
use crate::outcome::{Fetched, Outcome};
use crate::parsed::{Parsed, Value, object};

/// Unwrap a ready payload or return the sentinel to the caller.
macro_rules! ready_or_return {
    ($fetched:expr) => {
        match $fetched.outcome {
            Outcome::Ready(parsed) => parsed,
            sentinel => {
                return Fetched {
                    outcome: sentinel,
                    from_cache: false,
                };
            }
        }
    };
}

fn routes_of(parsed: &Parsed) -> Value {
    parsed.get("routes").cloned().unwrap_or(Value::Null)
}

fn dump(imported: Value, filtered: Value, from_cache: bool) -> Fetched {
    Fetched::ready(
        object(json!({"imported": imported, "filtered": filtered})),
        from_cache,
    )
}

impl BirdClient {
    /// Dump every route, choosing the strategy from the configured topology.
    pub async fn routes_dump(&self) -> Fetched {
        if self.per_peer_tables() {
            self.routes_dump_per_peer_table().await
        } else {
            self.routes_dump_single_table().await
        }
    }

    /// `{imported, filtered}` from the one shared table.
    ///
    /// The cache flag is the one of the imported-routes query.
    pub async fn routes_dump_single_table(&self) -> Fetched {
        let imported = self.routes_imported().await;
        let cmd = self.route_query_for_channel("route all filtered").await;
        let filtered = self.run_routes(&cmd).await;

        let from_cache = imported.from_cache;
        let imported = ready_or_return!(imported);
        let filtered = ready_or_return!(filtered);

        dump(routes_of(&imported), routes_of(&filtered), from_cache)
    }

    /// `{imported, filtered}` where `filtered` is the union of the filtered
    /// routes of every BGP protocol with a non-zero filtered counter,
    /// visited in protocol name order.
    pub async fn routes_dump_per_peer_table(&self) -> Fetched {
        let imported = self.routes_imported().await;
        let from_cache = imported.from_cache;
        let imported = ready_or_return!(imported);

        let protocols = ready_or_return!(self.protocols_bgp().await);
        let Some(protocols) = protocols.get("protocols").and_then(Value::as_object) else {
            return dump(routes_of(&imported), Value::Array(Vec::new()), from_cache);
        };

        let mut filtered = Vec::new();
        for (name, details) in protocols.iter() {
            let Some(counters) = details.get("routes").and_then(Value::as_object) else {
                continue;
            };
            match counters.get("filtered").and_then(Value::as_i64) {
                Some(count) if count != 0 => {}
                _ => continue,
            }

            let Outcome::Ready(routes) = self.routes_filtered(name).await.outcome else {
                debug!(protocol = %name, "No filtered routes available");
                continue;
            };
            let Some(routes) = routes.get("routes").and_then(Value::as_array) else {
                continue;
            };
            filtered.extend(routes.iter().cloned());
        }

        dump(routes_of(&imported), Value::Array(filtered), from_cache)
    }
}
