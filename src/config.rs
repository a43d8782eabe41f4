//! Link configuration
//!
//! Every field has a default, so a YAML document only needs the values it
//! changes:
//!
//! ```rust
//! use ctglink::{CrcPolicy, LinkConfig};
//!
//! let config = LinkConfig::from_yaml_str("idle_timeout_ms: 5000\ncrc_policy: reject\n").unwrap();
//! assert_eq!(config.idle_timeout().as_millis(), 5000);
//! assert_eq!(config.crc_policy, CrcPolicy::Reject);
//! assert_eq!(config.text_threshold, 3);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{LinkError, Result};

/// What to do with a frame whose received CRC differs from the computed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "lowercase")]
pub enum CrcPolicy {
    /// Deliver without comment
    Ignore,
    /// Deliver and log a warning
    #[default]
    Log,
    /// Drop the frame and raise a CRC mismatch error
    Reject,
}

fn default_read_chunk_size() -> usize {
    4096
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_idle_timeout_ms() -> u64 {
    2000
}

fn default_text_threshold() -> u32 {
    3
}

fn default_max_line_len() -> usize {
    4096
}

fn default_event_capacity() -> usize {
    1024
}

fn default_send_handshake() -> bool {
    true
}

fn default_continuous_start() -> String {
    "G".to_owned()
}

fn default_continuous_stop() -> String {
    "H".to_owned()
}

fn default_error_backoff_ms() -> u64 {
    100
}

fn default_close_grace_ms() -> u64 {
    500
}

fn default_close_timeout_ms() -> u64 {
    1000
}

/// Tunables for one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LinkConfig {
    /// Largest single transport read
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// Sleep between polls when no bytes are available
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Silence tolerated in continuous mode before a timeout is raised
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Consecutive text-like packets needed to switch to text mode
    #[serde(default = "default_text_threshold")]
    pub text_threshold: u32,
    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,
    /// Bound of the event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Send the plotter handshake after opening
    #[serde(default = "default_send_handshake")]
    pub send_handshake: bool,
    #[serde(default)]
    pub crc_policy: CrcPolicy,
    /// Emit records whose payload ran short
    #[serde(default)]
    pub deliver_malformed: bool,
    /// Payload that puts the device into continuous streaming
    #[serde(default = "default_continuous_start")]
    pub continuous_start: String,
    #[serde(default = "default_continuous_stop")]
    pub continuous_stop: String,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: default_read_chunk_size(),
            poll_interval_ms: default_poll_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            text_threshold: default_text_threshold(),
            max_line_len: default_max_line_len(),
            event_capacity: default_event_capacity(),
            send_handshake: default_send_handshake(),
            crc_policy: CrcPolicy::default(),
            deliver_malformed: false,
            continuous_start: default_continuous_start(),
            continuous_stop: default_continuous_stop(),
            error_backoff_ms: default_error_backoff_ms(),
            close_grace_ms: default_close_grace_ms(),
            close_timeout_ms: default_close_timeout_ms(),
        }
    }
}

impl LinkConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: LinkConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(config_path = %path.display(), "Loading link configuration");
        let contents = std::fs::read_to_string(path)
            .map_err(|source| LinkError::ConfigFile { path: path.to_path_buf(), source })?;
        Self::from_yaml_str(&contents)
    }

    /// Reject values the read loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_size == 0 {
            return Err(LinkError::config_error("read_chunk_size", "must be greater than zero"));
        }
        if self.event_capacity == 0 {
            return Err(LinkError::config_error("event_capacity", "must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(LinkError::config_error("poll_interval_ms", "must be greater than zero"));
        }
        if self.max_line_len == 0 {
            return Err(LinkError::config_error("max_line_len", "must be greater than zero"));
        }
        if self.continuous_start.is_empty() || self.continuous_start == self.continuous_stop {
            return Err(LinkError::config_error(
                "continuous_start",
                "must be non-empty and differ from continuous_stop",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LinkConfig::default();
        assert_eq!(config.read_chunk_size, 4096);
        assert_eq!(config.idle_timeout(), Duration::from_secs(2));
        assert_eq!(config.text_threshold, 3);
        assert_eq!(config.crc_policy, CrcPolicy::Log);
        assert!(config.send_handshake);
        assert!(!config.deliver_malformed);
        assert_eq!(config.continuous_start, "G");
        assert_eq!(config.continuous_stop, "H");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = LinkConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, LinkConfig::default());
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let yaml = "text_threshold: 5\nsend_handshake: false\ncrc_policy: ignore\n";
        let config = LinkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.text_threshold, 5);
        assert!(!config.send_handshake);
        assert_eq!(config.crc_policy, CrcPolicy::Ignore);
        assert_eq!(config.event_capacity, 1024);
    }

    #[test]
    fn zero_values_are_rejected() {
        let err = LinkConfig::from_yaml_str("read_chunk_size: 0").unwrap_err();
        assert!(matches!(err, LinkError::Config { ref field, .. } if field == "read_chunk_size"));

        let err = LinkConfig::from_yaml_str("event_capacity: 0").unwrap_err();
        assert!(matches!(err, LinkError::Config { ref field, .. } if field == "event_capacity"));

        let err = LinkConfig::from_yaml_str("poll_interval_ms: 0").unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));
    }

    #[test]
    fn identical_continuous_commands_are_rejected() {
        let err = LinkConfig::from_yaml_str("continuous_start: X\ncontinuous_stop: X").unwrap_err();
        assert!(matches!(err, LinkError::Config { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = LinkConfig::from_yaml_str("text_threshold: [oops").unwrap_err();
        assert!(matches!(err, LinkError::ConfigParse { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LinkConfig::from_file("/nonexistent/ctglink.yaml").unwrap_err();
        match err {
            LinkError::ConfigFile { path, .. } => assert!(path.ends_with("ctglink.yaml")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
