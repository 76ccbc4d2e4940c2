//! Token-bucket rate limiter for daemon invocations.
//!
//! A single process-wide bucket. Each admitted query consumes one token; a
//! background task puts the bucket back to its maximum once per interval,
//! whatever it held before (a strict reset, not a gradual refill).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use birdwatch_config::RateLimitConfig;

use crate::daemon::ShutdownSignal;

/// Interval at which the bucket is reset.
pub const RESET_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Bucket {
    enabled: bool,
    max: u32,
    remaining: u32,
}

/// Process-wide token bucket.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: RwLock<Bucket>,
    reset_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter holding `max` tokens.
    pub fn new(enabled: bool, max: u32) -> Self {
        Self {
            bucket: RwLock::new(Bucket {
                enabled,
                max,
                remaining: max,
            }),
            reset_interval: RESET_INTERVAL,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.enabled, config.requests_per_sec)
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        Self::new(false, 0)
    }

    /// Override the reset interval (tests use a short one).
    pub fn with_reset_interval(mut self, interval: Duration) -> Self {
        self.reset_interval = interval;
        self
    }

    /// Admit one query, consuming a token.
    ///
    /// Always `true` when disabled, and nothing is consumed. Returns `false`
    /// without side effects when the bucket is empty.
    pub fn admit(&self) -> bool {
        if !self.bucket.read().enabled {
            return true;
        }

        let mut bucket = self.bucket.write();
        if bucket.remaining < 1 {
            debug!(max = bucket.max, "Rate limit exhausted, rejecting query");
            return false;
        }
        bucket.remaining -= 1;
        true
    }

    /// Tokens left in the current interval.
    pub fn remaining(&self) -> u32 {
        self.bucket.read().remaining
    }

    pub fn enabled(&self) -> bool {
        self.bucket.read().enabled
    }

    /// Put the bucket back to its maximum.
    pub fn reset(&self) {
        let mut bucket = self.bucket.write();
        bucket.remaining = bucket.max;
    }

    /// Start the periodic reset task.
    ///
    /// The task runs until a [`ShutdownSignal`] arrives or the sender side of
    /// `shutdown_rx` is dropped.
    pub fn spawn_reset(
        self: &Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<ShutdownSignal>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.reset_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(interval = ?limiter.reset_interval, "Rate limit reset task started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        limiter.reset();
                        trace!("Rate limit bucket reset");
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            debug!("Rate limit reset task stopped");
        })
    }
}
