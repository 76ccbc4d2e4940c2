//! Shaping of the daemon status payload.
//!
//! Applied once, to fresh results only; the shaped payload is what gets
//! cached, so cache hits are returned as they are.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

use birdwatch_config::{AppConfig, ReconfigTimestampSource};

use crate::parsed::{Parsed, Value};

/// Modification time of `path` in RFC 3339 form, or an empty string.
pub fn last_reconfig_from_file_stat(path: &Path) -> String {
    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified).to_rfc3339(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot stat daemon config");
            String::new()
        }
    }
}

/// First match of `pattern` in the content of `path`, or an empty string.
///
/// Returns the first capture group when the pattern has one.
pub fn last_reconfig_from_file_content(path: &Path, pattern: &Regex) -> String {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read daemon config");
            return String::new();
        }
    };

    pattern
        .captures(&content)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Rewrites `status.last_reconfig` and nulls filtered fields.
#[derive(Debug, Clone)]
pub struct StatusShaper {
    source: ReconfigTimestampSource,
    pattern: Option<Regex>,
    filter_fields: Vec<String>,
    config_filename: PathBuf,
}

impl StatusShaper {
    pub fn from_config(config: &AppConfig) -> Self {
        let pattern = match config.status.reconfig_timestamp_source {
            ReconfigTimestampSource::ConfigRegex => {
                Regex::new(&config.status.reconfig_timestamp_match)
                    .inspect_err(|e| warn!(error = %e, "Invalid reconfig timestamp regex"))
                    .ok()
            }
            _ => None,
        };

        Self {
            source: config.status.reconfig_timestamp_source,
            pattern,
            filter_fields: config.status.filter_fields.clone(),
            config_filename: PathBuf::from(&config.bird.config_filename),
        }
    }

    fn last_reconfig(&self, status: &Parsed) -> String {
        match self.source {
            ReconfigTimestampSource::Bird => status
                .get("last_reconfig")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            ReconfigTimestampSource::ConfigModified => {
                last_reconfig_from_file_stat(&self.config_filename)
            }
            ReconfigTimestampSource::ConfigRegex => match &self.pattern {
                Some(pattern) => last_reconfig_from_file_content(&self.config_filename, pattern),
                None => String::new(),
            },
        }
    }

    /// Shape a freshly parsed status payload.
    ///
    /// Payloads without a `status` mapping are returned unchanged.
    pub fn shape(&self, mut parsed: Parsed) -> Parsed {
        let Some(status) = parsed.get_mut("status").and_then(Value::as_object_mut) else {
            return parsed;
        };

        let last_reconfig = self.last_reconfig(status);
        status.insert("last_reconfig".to_string(), Value::String(last_reconfig));
        for field in &self.filter_fields {
            status.insert(field.clone(), Value::Null);
        }

        parsed
    }
}
