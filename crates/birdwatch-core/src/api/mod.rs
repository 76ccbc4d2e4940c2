//! HTTP API: an axum router exposing every daemon query as JSON.
//!
//! ## Status codes
//!
//! ```text
//! Outcome::Ready        200  payload + "api" object
//! Outcome::Unreachable  503  {"error": "bird unreachable"}
//! Outcome::NotAdmitted  429  {"error": "rate limit exceeded"}
//! ```

pub mod server;
pub mod types;

pub use server::{ApiState, router, serve};
pub use types::*;
