#![deny(unsafe_code)]

//! Shared test utilities for the birdwatch workspace.
//!
//! Provides config builders, a scripted stand-in for `birdc`, canned daemon
//! output and tracing helpers so that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! birdwatch-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod executor;
pub mod fixtures;
pub mod tracing_setup;
