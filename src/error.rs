//! Error types for the IMAP engine.
//!
//! One crate-wide enum covers every failure the engine can surface, from
//! transport problems through protocol violations to server-reported
//! command failures. Helpers classify errors so callers can decide
//! whether a connection is still usable.

use std::time::Duration;

use thiserror::Error;

use crate::response::Status;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Could not establish the connection or complete the greeting.
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// A read or write exceeded the configured timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the stream mid-operation.
    #[error("Connection closed by peer")]
    Closed,

    /// LOGIN or AUTHENTICATE was rejected or aborted.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server completed a command with NO, BAD, or BYE.
    #[error("Server returned {status}: {text}")]
    Server {
        /// The tagged status the server sent.
        status: Status,
        /// The server's human-readable text.
        text: String,
    },

    /// A server response did not match the IMAP grammar.
    #[error("Malformed response: {0}")]
    BadResponse(String),

    /// Protocol violation: missing continuation, literal framing
    /// mismatch, or an unexpected frame while reading.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The operation is not valid in the connection's current state.
    #[error("Invalid state: {0}")]
    State(String),
}

impl Error {
    /// Returns true if this error indicates the connection is dead and
    /// should not be reused.
    #[must_use]
    pub const fn is_connection_dead(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::Closed
                | Self::Timeout(_)
                | Self::ConnectFailed(_)
                | Self::Server {
                    status: Status::Bye,
                    ..
                }
        )
    }

    /// Returns true if this is an authentication failure.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if retrying on a fresh connection may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout(_) | Self::Closed)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_dead_classification() {
        assert!(Error::Closed.is_connection_dead());
        assert!(Error::Timeout(Duration::from_secs(5)).is_connection_dead());
        assert!(
            Error::Server {
                status: Status::Bye,
                text: "shutting down".to_string(),
            }
            .is_connection_dead()
        );
        assert!(
            !Error::Server {
                status: Status::No,
                text: "nope".to_string(),
            }
            .is_connection_dead()
        );
        assert!(!Error::Auth("bad creds".to_string()).is_connection_dead());
    }

    #[test]
    fn auth_classification() {
        assert!(Error::Auth("invalid".to_string()).is_auth_error());
        assert!(!Error::Closed.is_auth_error());
    }

    #[test]
    fn recoverable_classification() {
        assert!(Error::Closed.is_recoverable());
        assert!(!Error::Protocol("missing continuation".to_string()).is_recoverable());
    }
}
