#![deny(unsafe_code)]

//! birdwatch core runtime.
//!
//! Queries the BIRD routing daemon through its restricted command-line
//! client, caches parsed results for a bounded time, throttles the number of
//! client invocations, and serves the results as JSON over HTTP.
//!
//! Every query goes through the [`Dispatcher`]:
//!
//! ```text
//! BirdClient ──▶ Dispatcher ──▶ QueryCache ──hit──▶ caller
//!                    │ miss
//!                    ▼
//!               RateLimiter ──reject──▶ NotAdmitted
//!                    │ admit
//!                    ▼
//!                 Executor ──fail──▶ Unreachable (not cached)
//!                    │
//!                    ▼
//!              OutputParser ──▶ QueryCache::store ──▶ caller
//! ```

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future for async trait methods that
/// need dynamic dispatch (`dyn Executor`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Route dumps over one shared table or per-peer tables.
pub mod aggregate;
/// HTTP API (axum).
pub mod api;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Time-bounded query cache.
pub mod cache;
/// High-level daemon queries.
pub mod client;
/// Async daemon runtime.
pub mod daemon;
/// Cache → rate limit → execute → parse → store.
pub mod dispatcher;
/// Runs the daemon's command-line client.
pub mod executor;
/// Query outcomes and sentinels.
pub mod outcome;
/// Dynamic parsed-result model.
pub mod parsed;
/// Text output parsers.
pub mod parser;
/// Version- and topology-aware command construction.
pub mod query;
/// Token bucket with periodic reset.
pub mod rate_limit;
/// Status payload shaping.
pub mod status;

pub use client::BirdClient;
pub use daemon::{Daemon, DaemonError, ShutdownSignal};
pub use dispatcher::Dispatcher;
pub use executor::{BirdcExecutor, ExecError, Executor};
pub use outcome::{Fetched, Outcome};
pub use parsed::{Parsed, Value, object};
pub use parser::{BirdOutputParser, OutputParser};
pub use rate_limit::RateLimiter;
