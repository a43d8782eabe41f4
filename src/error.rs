//! Error types for link processing.
//!
//! All errors implement `std::error::Error` and carry enough context to decide
//! how the read loop should recover.
//!
//! ## Error Categories
//!
//! - **Structural**: a frame's fixed marker bytes were wrong; only that frame is lost
//! - **CRC mismatch**: raised only when frames with bad checksums are rejected
//! - **Kind not recognized**: framing may be misaligned; buffered input is discarded
//! - **Timeout**: the device stopped streaming while in continuous mode
//! - **Transport / Disconnected**: the connection is dead and must be re-established
//! - **Invalid usage / Config**: programming or configuration mistakes
//!
//! ## User-facing messages
//!
//! Messages that start with `!` are already phrased for an operator. Everything
//! else gets a generic prefix from [`LinkError::user_message`]:
//!
//! ```rust
//! use ctglink::LinkError;
//!
//! let error = LinkError::Disconnected;
//! assert_eq!(error.user_message(), "!CTG has disconnected");
//!
//! let error = LinkError::transport_failed("port vanished");
//! assert!(error.user_message().starts_with("!Error reading from CTG: "));
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Prefix added to messages that are not already operator-facing.
pub const USER_MESSAGE_PREFIX: &str = "!Error reading from CTG: ";

/// Main error type for link operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("Frame structure error: {details}")]
    Structural { details: String, byte: u8 },

    #[error("Frame CRC mismatch: computed {computed:#06x}, received {received:#06x}")]
    CrcMismatch { computed: u16, received: u16 },

    #[error("!Frame not recognised (kind {kind:#04x})")]
    KindNotRecognized { kind: u8 },

    #[error("!Data from CTG has stopped (idle for {duration:?})")]
    Timeout { duration: Duration },

    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("!CTG has disconnected")]
    Disconnected,

    #[error("Link is closed")]
    Closed,

    #[error("Invalid usage: {details}")]
    InvalidUsage { details: String },

    #[error("Configuration error in {field}: {details}")]
    Config { field: String, details: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error")]
    ConfigParse {
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("I/O error")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

impl LinkError {
    /// Returns whether the read loop can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            LinkError::Structural { .. } => true,
            LinkError::CrcMismatch { .. } => true,
            LinkError::KindNotRecognized { .. } => true,
            LinkError::Timeout { .. } => true,
            LinkError::Transport { .. } => false,
            LinkError::Disconnected => false,
            LinkError::Closed => false,
            LinkError::InvalidUsage { .. } => false,
            LinkError::Config { .. } => false,
            LinkError::ConfigFile { .. } => false,
            LinkError::ConfigParse { .. } => false,
            LinkError::Io { .. } => false,
        }
    }

    /// Whether recovering from this error requires discarding all buffered input.
    pub fn requires_input_flush(&self) -> bool {
        matches!(self, LinkError::KindNotRecognized { .. })
    }

    /// Message suitable for showing to an operator.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.starts_with('!') { message } else { format!("{USER_MESSAGE_PREFIX}{message}") }
    }

    /// Helper constructor for structural frame errors.
    pub fn structural(details: impl Into<String>, byte: u8) -> Self {
        LinkError::Structural { details: details.into(), byte }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        LinkError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for misuse of an API.
    pub fn invalid_usage(details: impl Into<String>) -> Self {
        LinkError::InvalidUsage { details: details.into() }
    }

    /// Helper constructor for configuration validation errors.
    pub fn config_error(field: impl Into<String>, details: impl Into<String>) -> Self {
        LinkError::Config { field: field.into(), details: details.into() }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Io { source: err }
    }
}

impl From<serde_yaml_ng::Error> for LinkError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        LinkError::ConfigParse { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn user_messages_always_carry_the_operator_marker(
                reason in ".*",
                details in ".*",
                kind in any::<u8>(),
                byte in any::<u8>(),
                duration_ms in 1u64..60000u64
            ) {
                let errors = [
                    LinkError::transport_failed(reason.clone()),
                    LinkError::structural(details.clone(), byte),
                    LinkError::KindNotRecognized { kind },
                    LinkError::Timeout { duration: Duration::from_millis(duration_ms) },
                    LinkError::invalid_usage(details.clone()),
                ];

                for error in &errors {
                    let message = error.user_message();
                    prop_assert!(message.starts_with('!'));
                    prop_assert!(!message.starts_with("!!"));
                }
            }

            #[test]
            fn error_messages_contain_their_context(reason in "\\w+", kind in any::<u8>()) {
                let transport = LinkError::transport_failed(reason.clone());
                prop_assert!(transport.to_string().contains(&reason));

                let not_recognized = LinkError::KindNotRecognized { kind };
                let kind_hex = format!("{:#04x}", kind);
                prop_assert!(not_recognized.to_string().contains(&kind_hex));
            }
        }
    }

    #[test]
    fn operator_messages_are_not_prefixed_twice() {
        assert_eq!(LinkError::Disconnected.user_message(), "!CTG has disconnected");
        let timeout = LinkError::Timeout { duration: Duration::from_secs(2) };
        assert!(timeout.user_message().starts_with("!Data from CTG has stopped"));
    }

    #[test]
    fn generic_messages_get_prefix() {
        let error = LinkError::transport_failed("port vanished");
        assert_eq!(error.user_message(), "!Error reading from CTG: Transport failure: port vanished");
    }

    #[test]
    fn recovery_classification() {
        assert!(LinkError::structural("Header DLE expected", 0x41).is_recoverable());
        assert!(LinkError::KindNotRecognized { kind: b'Z' }.is_recoverable());
        assert!(LinkError::CrcMismatch { computed: 1, received: 2 }.is_recoverable());
        assert!(LinkError::Timeout { duration: Duration::from_secs(2) }.is_recoverable());
        assert!(!LinkError::transport_failed("gone").is_recoverable());
        assert!(!LinkError::Disconnected.is_recoverable());

        assert!(LinkError::KindNotRecognized { kind: 0 }.requires_input_flush());
        assert!(!LinkError::structural("x", 0).requires_input_flush());
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();

        let error = LinkError::transport_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn transport_source_is_chained() {
        let io = std::io::Error::other("broken pipe");
        let error = LinkError::transport_failed_with_source("write failed", Box::new(io));
        let source = std::error::Error::source(&error).expect("source should be set");
        assert_eq!(source.to_string(), "broken pipe");
    }

    #[test]
    fn from_conversions_work() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let link_err: LinkError = io_err.into();
        assert!(matches!(link_err, LinkError::Io { .. }));
    }
}
