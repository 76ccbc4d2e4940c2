#![deny(unsafe_code)]

//! Configuration loading and validation for birdwatch.
//!
//! Loads TOML configuration files and validates them against expected schemas.
//! Provides the [`AppConfig`] type as the central configuration structure.
//! Every section has serde defaults, so an empty file is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP API server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// How to reach the routing daemon.
    #[serde(default)]
    pub bird: BirdConfig,

    /// Routing table topology.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Status payload shaping.
    #[serde(default)]
    pub status: StatusConfig,

    /// Request throttling.
    #[serde(default)]
    pub ratelimit: RateLimitConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port the API listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    29184
}

/// Daemon client configuration.
///
/// ## TOML Example
///
/// ```toml
/// [bird]
/// bird_cmd = "/usr/sbin/birdc"
/// cache_ttl = 2
/// config_filename = "/etc/bird/bird.conf"
/// ip_version = "6"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirdConfig {
    /// Path to the daemon client executable.
    #[serde(default = "default_bird_cmd")]
    pub bird_cmd: String,

    /// Cache entry lifetime in minutes. Zero or negative selects the default.
    #[serde(default)]
    pub cache_ttl: i64,

    /// Daemon configuration file, used by the file based reconfig timestamp sources.
    #[serde(default = "default_config_filename")]
    pub config_filename: String,

    /// IP version used for the channel filter clause ("4" or "6").
    #[serde(default = "default_ip_version")]
    pub ip_version: String,

    /// Deadline for one client invocation in seconds (0 = no deadline).
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

impl Default for BirdConfig {
    fn default() -> Self {
        Self {
            bird_cmd: default_bird_cmd(),
            cache_ttl: 0,
            config_filename: default_config_filename(),
            ip_version: default_ip_version(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

fn default_bird_cmd() -> String {
    "birdc".to_string()
}

fn default_config_filename() -> String {
    "/etc/bird/bird.conf".to_string()
}

fn default_ip_version() -> String {
    "4".to_string()
}

fn default_command_timeout_secs() -> u64 {
    30
}

/// Routing table topology of the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Each peer owns its own table, connected to the master table by a pipe.
    #[serde(default)]
    pub per_peer_tables: bool,

    /// Name prefix of peer (BGP session) protocols.
    #[serde(default = "default_peer_protocol_prefix")]
    pub peer_protocol_prefix: String,

    /// Name prefix of the pipe protocols paired with each peer.
    #[serde(default = "default_pipe_protocol_prefix")]
    pub pipe_protocol_prefix: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            per_peer_tables: false,
            peer_protocol_prefix: default_peer_protocol_prefix(),
            pipe_protocol_prefix: default_pipe_protocol_prefix(),
        }
    }
}

fn default_peer_protocol_prefix() -> String {
    "ID_".to_string()
}

fn default_pipe_protocol_prefix() -> String {
    "P_".to_string()
}

/// Where the `last_reconfig` status field comes from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconfigTimestampSource {
    /// Use the value reported by the daemon.
    #[default]
    Bird,
    /// Use the modification time of the daemon configuration file.
    ConfigModified,
    /// Match a regex against the daemon configuration file content.
    ConfigRegex,
}

/// Status payload shaping.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Source of the `last_reconfig` field.
    #[serde(default)]
    pub reconfig_timestamp_source: ReconfigTimestampSource,

    /// Regex applied to the configuration file for the `config_regex` source.
    /// The first capture group is used when present.
    #[serde(default)]
    pub reconfig_timestamp_match: String,

    /// Status fields that are nulled before the payload is returned.
    #[serde(default)]
    pub filter_fields: Vec<String>,
}

/// Request throttling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Whether daemon queries are throttled at all.
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of daemon invocations per second.
    #[serde(default = "default_requests_per_sec")]
    pub requests_per_sec: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_sec: default_requests_per_sec(),
        }
    }
}

fn default_requests_per_sec() -> u32 {
    10
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading configuration");
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_port == 0 {
            return Err(ConfigError::Validation(
                "server.listen_port must be non-zero".to_string(),
            ));
        }
        if self.server.listen_addr.is_empty() {
            return Err(ConfigError::Validation(
                "server.listen_addr must not be empty".to_string(),
            ));
        }

        if self.bird.bird_cmd.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bird.bird_cmd must not be empty".to_string(),
            ));
        }
        let valid_ip_versions = ["4", "6"];
        if !valid_ip_versions.contains(&self.bird.ip_version.as_str()) {
            return Err(ConfigError::Validation(format!(
                "bird.ip_version must be one of {:?}, got {:?}",
                valid_ip_versions, self.bird.ip_version
            )));
        }

        if self.parser.per_peer_tables
            && (self.parser.peer_protocol_prefix.is_empty()
                || self.parser.pipe_protocol_prefix.is_empty())
        {
            return Err(ConfigError::Validation(
                "parser.peer_protocol_prefix and parser.pipe_protocol_prefix are required \
                 when per_peer_tables is enabled"
                    .to_string(),
            ));
        }

        if self.status.reconfig_timestamp_source == ReconfigTimestampSource::ConfigRegex {
            let pattern = &self.status.reconfig_timestamp_match;
            if pattern.is_empty() {
                return Err(ConfigError::Validation(
                    "status.reconfig_timestamp_match is required when reconfig_timestamp_source \
                     is \"config_regex\""
                        .to_string(),
                ));
            }
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "status.reconfig_timestamp_match is not a valid regex: {e}"
                )));
            }
        }

        if self.ratelimit.enabled && self.ratelimit.requests_per_sec == 0 {
            return Err(ConfigError::Validation(
                "ratelimit.requests_per_sec must be at least 1 when rate limiting is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
