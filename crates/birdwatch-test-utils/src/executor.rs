//! A scripted stand-in for the `birdc` executable.
//!
//! Answers each query with canned output, counts invocations per query and
//! can be told to fail or to respond slowly.

use std::collections::HashMap;
use std::time::Duration;

use birdwatch_core::BoxFuture;
use birdwatch_core::executor::{ExecError, Executor};
use parking_lot::Mutex;

enum Reply {
    Output(String),
    Failure,
}

/// [`Executor`] answering from a fixed script.
///
/// Queries without a script entry fail like a client exiting with status 1.
///
/// # Example
///
/// ```ignore
/// let executor = Arc::new(
///     ScriptedExecutor::new()
///         .respond("status", fixtures::status("2.0.9"))
///         .fail("protocols all"),
/// );
/// ```
#[derive(Default)]
pub struct ScriptedExecutor {
    script: HashMap<String, Reply>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with `output`.
    pub fn respond(mut self, query: &str, output: impl Into<String>) -> Self {
        self.script
            .insert(query.to_string(), Reply::Output(output.into()));
        self
    }

    /// Make `query` fail.
    pub fn fail(mut self, query: &str) -> Self {
        self.script.insert(query.to_string(), Reply::Failure);
        self
    }

    /// Sleep for `delay` before answering any query.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `query` was run.
    pub fn calls(&self, query: &str) -> usize {
        self.calls.lock().get(query).copied().unwrap_or(0)
    }

    /// Number of queries run in total.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Every query run so far, sorted.
    pub fn queries(&self) -> Vec<String> {
        let mut queries: Vec<String> = self.calls.lock().keys().cloned().collect();
        queries.sort();
        queries
    }
}

impl Executor for ScriptedExecutor {
    fn run<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String, ExecError>> {
        Box::pin(async move {
            *self.calls.lock().entry(query.to_string()).or_insert(0) += 1;

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.script.get(query) {
                Some(Reply::Output(output)) => Ok(output.clone()),
                Some(Reply::Failure) => Err(ExecError::ExitStatus {
                    code: Some(1),
                    stderr: "Unable to connect to server control socket".to_string(),
                }),
                None => Err(ExecError::ExitStatus {
                    code: Some(1),
                    stderr: format!("unscripted query: {query}"),
                }),
            }
        })
    }
}
