//! IMAP connection management.
//!
//! - Configuration (host, port, transport, timeouts)
//! - TLS/plaintext stream abstraction with in-band upgrade
//! - The connection state machine and public operations
//! - IDLE support for real-time notifications
//! - A scripted stream double for protocol tests

mod client;
mod config;
mod fake;
mod idle;
mod stream;

pub use client::{Connection, ConnectionState};
pub use config::{Config, ConfigBuilder, Transport};
pub use fake::FakeStream;
pub use stream::{ImapStream, TlsUpgrade, connect_plain, connect_tls, create_tls_connector};
