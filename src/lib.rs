//! # imap-engine
//!
//! The wire-level core of an IMAP4rev1 client (RFC 3501 plus the IDLE,
//! MOVE, ID, UIDPLUS, QUOTA, STARTTLS, and XOAUTH2 extensions): a
//! streaming tokenizer, a recursive-descent response parser, a command
//! encoder with synchronizing-literal handling, and the connection state
//! machine that ties them together.
//!
//! ## Features
//!
//! - **Binary-safe parsing**: quoted strings and literals are opaque
//!   byte payloads; atoms preserve case
//! - **Synchronizing literals both ways**: reads switch to byte-counted
//!   mode on `{n}`, writes pause for the server's `+` continuation
//! - **One connection, one command**: tagged/untagged demultiplexing
//!   with a notification queue for server pushes
//! - **IDLE**: continuation handshake, non-blocking drain, DONE flow
//!   that preserves interleaved events
//! - **TLS via rustls**: implicit TLS or in-band STARTTLS upgrade
//!
//! ## Quick Start
//!
//! ```ignore
//! use imap_engine::{Config, Connection, Mode, SequenceSet};
//!
//! #[tokio::main]
//! async fn main() -> imap_engine::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let mut conn = Connection::connect(&config).await?;
//!     conn.login("user@example.com", "password").await?;
//!
//!     let inbox = conn.select_folder("INBOX").await?;
//!     println!("{} messages", inbox.exists);
//!
//!     let headers = conn
//!         .headers(&SequenceSet::starting_at(1), Mode::Uid)
//!         .await?;
//!     for (uid, header) in &headers {
//!         println!("{uid}: {} header bytes", header.len());
//!     }
//!
//!     conn.idle().await?;
//!     let event = conn.next_notification().await?;
//!     println!("server push: {event:?}");
//!     conn.done().await?;
//!
//!     conn.logout().await
//! }
//! ```
//!
//! ## Connection states
//!
//! ```text
//! Greeting ── * OK ──→ NotAuthenticated ── LOGIN/AUTHENTICATE ──→ Authenticated
//!                                                                     │
//!                           Selected ←── SELECT/EXAMINE ──────────────┘
//!                              │  ↑
//!                       IDLE + │  │ DONE
//!                              ↓  │
//!                             Idle          any ── LOGOUT ──→ LoggedOut
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: tokenizer and value parser
//! - [`command`]: command model, tagging, and wire encoding
//! - [`response`]: response classification and extraction
//! - [`connection`]: configuration, streams, and the state machine
//! - [`types`]: sequence sets, folder state, quota rows
//! - [`sasl`]: SASL initial-response encoding

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod response;
pub mod sasl;
pub mod types;

pub use command::{Arg, Command, TagGenerator};
pub use connection::{
    Config, ConfigBuilder, Connection, ConnectionState, FakeStream, ImapStream, TlsUpgrade,
    Transport,
};
pub use error::{Error, Result};
pub use parser::{Parser, Value};
pub use response::{FetchData, Response, Status, Unsolicited};
pub use types::{
    Bound, FolderInfo, FolderStatus, Mode, Quota, QuotaResource, SelectedState, SequenceSet,
    StoreAction,
};
