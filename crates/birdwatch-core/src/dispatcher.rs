//! The single funnel every daemon query goes through.
//!
//! Cache lookup → rate-limit admission → client execution → parse → store.
//! Failed executions are never cached, so the next call retries naturally.
//! Concurrent misses on the same key are not coalesced: both callers may run
//! the client, and the last store wins.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::QueryCache;
use crate::executor::Executor;
use crate::outcome::Fetched;
use crate::parsed::Parsed;
use crate::rate_limit::RateLimiter;

pub struct Dispatcher {
    cache: QueryCache,
    limiter: Arc<RateLimiter>,
    executor: Arc<dyn Executor>,
}

impl Dispatcher {
    pub fn new(cache: QueryCache, limiter: Arc<RateLimiter>, executor: Arc<dyn Executor>) -> Self {
        Self {
            cache,
            limiter,
            executor,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run `cmd` and parse its output with `parse`, going through the cache.
    pub async fn run_and_parse<F>(&self, cmd: &str, parse: F) -> Fetched
    where
        F: FnOnce(&str) -> Parsed,
    {
        if let Some(cached) = self.cache.lookup(cmd) {
            debug!(cmd, "Cache hit");
            return Fetched::ready(cached, true);
        }

        if !self.limiter.admit() {
            warn!(cmd, "Query rejected by rate limiter");
            return Fetched::not_admitted();
        }

        let raw = match self.executor.run(cmd).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cmd, error = %e, "Daemon unreachable");
                return Fetched::unreachable();
            }
        };

        debug!(cmd, bytes = raw.len(), "Cache miss, storing fresh result");
        let parsed = self.cache.store(cmd, parse(&raw));
        Fetched::ready(parsed, false)
    }
}
