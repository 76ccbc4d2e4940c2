//! Runs the daemon's command-line client.
//!
//! Every invocation is `<bird_cmd> -r show <query...>`: `-r` keeps the
//! client in restricted (read-only) mode and must never be dropped. The query
//! string is split on single spaces, without any quoting or escaping.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use birdwatch_config::BirdConfig;

use crate::BoxFuture;

/// Errors from running the client executable.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("wait failed: {0}")]
    Wait(std::io::Error),

    #[error("client exited with status {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("client timed out after {0:?}")]
    Timeout(Duration),
}

/// Runs one daemon query and returns its raw output.
pub trait Executor: Send + Sync {
    /// Execute `query` (the part after `show`) and return stdout.
    fn run<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String, ExecError>>;
}

/// Build the argument list passed to the client for `query`.
pub fn command_args(query: &str) -> Vec<String> {
    format!("-r show {query}")
        .split(' ')
        .map(str::to_string)
        .collect()
}

/// [`Executor`] backed by the `birdc` binary.
#[derive(Debug, Clone)]
pub struct BirdcExecutor {
    bird_cmd: PathBuf,
    timeout: Option<Duration>,
}

impl BirdcExecutor {
    pub fn new(bird_cmd: impl Into<PathBuf>) -> Self {
        Self {
            bird_cmd: bird_cmd.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &BirdConfig) -> Self {
        let executor = Self::new(&config.bird_cmd);
        match config.command_timeout_secs {
            0 => executor,
            secs => executor.with_timeout(Duration::from_secs(secs)),
        }
    }

    /// Kill the client if it has not finished within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Executor for BirdcExecutor {
    fn run<'a>(&'a self, query: &'a str) -> BoxFuture<'a, Result<String, ExecError>> {
        Box::pin(async move {
            let args = command_args(query);
            tracing::debug!(program = %self.bird_cmd.display(), args = ?args, "Running client");

            let child = tokio::process::Command::new(&self.bird_cmd)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| ExecError::Spawn {
                    program: self.bird_cmd.clone(),
                    source,
                })?;

            let output = match self.timeout {
                Some(dur) => tokio::time::timeout(dur, child.wait_with_output())
                    .await
                    .map_err(|_| ExecError::Timeout(dur))?
                    .map_err(ExecError::Wait)?,
                None => child.wait_with_output().await.map_err(ExecError::Wait)?,
            };

            if !output.status.success() {
                return Err(ExecError::ExitStatus {
                    code: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_args_enforce_restricted_mode() {
        assert_eq!(command_args("status"), ["-r", "show", "status"]);
        assert_eq!(
            command_args("route all protocol ID_42 where net.type = NET_IP4"),
            [
                "-r", "show", "route", "all", "protocol", "ID_42", "where", "net.type", "=",
                "NET_IP4"
            ]
        );
    }

    #[test]
    fn test_from_config_timeout() {
        let mut config = BirdConfig::default();
        assert_eq!(
            BirdcExecutor::from_config(&config).timeout,
            Some(Duration::from_secs(30))
        );

        config.command_timeout_secs = 0;
        assert_eq!(BirdcExecutor::from_config(&config).timeout, None);
    }

    #[tokio::test]
    async fn test_echo_receives_restricted_args() {
        let executor = BirdcExecutor::new("echo");
        let out = executor.run("protocols all").await.unwrap();
        assert_eq!(out.trim(), "-r show protocols all");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_an_error() {
        let executor = BirdcExecutor::new("false");
        let err = executor.run("status").await.unwrap_err();
        assert!(matches!(err, ExecError::ExitStatus { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let executor = BirdcExecutor::new("/nonexistent/birdc");
        let err = executor.run("status").await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_hung_client() {
        // `sleep -r show 10` is rejected by sleep, so use a shell wrapper that ignores args.
        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("hang.sh");
        std::fs::write(&script, "#!/bin/sh\nsleep 10\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let executor = BirdcExecutor::new(&script).with_timeout(Duration::from_millis(100));
        let err = executor.run("status").await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout(_)));
    }
}
