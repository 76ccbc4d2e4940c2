//! Configuration builders for tests.

use std::path::Path;

use birdwatch_config::{AppConfig, ReconfigTimestampSource};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .ip_version("6")
///     .per_peer_tables(true)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn listen_addr(mut self, addr: &str) -> Self {
        self.config.server.listen_addr = addr.to_string();
        self
    }

    pub fn listen_port(mut self, port: u16) -> Self {
        self.config.server.listen_port = port;
        self
    }

    pub fn bird_cmd(mut self, cmd: &str) -> Self {
        self.config.bird.bird_cmd = cmd.to_string();
        self
    }

    pub fn cache_ttl(mut self, minutes: i64) -> Self {
        self.config.bird.cache_ttl = minutes;
        self
    }

    pub fn ip_version(mut self, version: &str) -> Self {
        self.config.bird.ip_version = version.to_string();
        self
    }

    pub fn config_filename(mut self, path: impl AsRef<Path>) -> Self {
        self.config.bird.config_filename = path.as_ref().display().to_string();
        self
    }

    pub fn per_peer_tables(mut self, enabled: bool) -> Self {
        self.config.parser.per_peer_tables = enabled;
        self
    }

    pub fn reconfig_source(mut self, source: ReconfigTimestampSource) -> Self {
        self.config.status.reconfig_timestamp_source = source;
        self
    }

    /// Use the `config_regex` source with `pattern`.
    pub fn reconfig_regex(mut self, pattern: &str) -> Self {
        self.config.status.reconfig_timestamp_source = ReconfigTimestampSource::ConfigRegex;
        self.config.status.reconfig_timestamp_match = pattern.to_string();
        self
    }

    pub fn filter_fields(mut self, fields: &[&str]) -> Self {
        self.config.status.filter_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn rate_limit(mut self, requests_per_sec: u32) -> Self {
        self.config.ratelimit.enabled = true;
        self.config.ratelimit.requests_per_sec = requests_per_sec;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
