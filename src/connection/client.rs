//! The IMAP connection state machine.
//!
//! A `Connection` owns the stream (through the parser), assigns command
//! tags, runs the continuation handshake for literal-bearing lines, and
//! demultiplexes tagged and untagged responses. One command is in flight
//! at a time; untagged frames received during a command attach to that
//! command's response, and untagged frames received outside a command
//! land in the notification queue.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::config::{Config, Transport};
use super::stream::{self, ImapStream, TlsUpgrade};
use crate::command::{Arg, Command, TagGenerator};
use crate::parser::{Parser, Value};
use crate::response::{self, FetchData, Response, Status, Unsolicited, text_of};
use crate::sasl;
use crate::types::{
    Bound, FolderInfo, FolderStatus, Mode, Quota, SelectedState, SequenceSet, StoreAction,
};
use crate::{Error, Result};

/// Connection lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Stream died; only teardown is possible.
    Disconnected,
    /// Waiting for the server greeting.
    Greeting,
    /// Greeted, not yet authenticated.
    NotAuthenticated,
    /// Authenticated, no folder selected.
    Authenticated,
    /// A folder is selected.
    Selected(String),
    /// IDLE is active on the selected folder.
    Idle(String),
    /// LOGOUT completed (or was skipped on a dead stream).
    LoggedOut,
}

/// Accumulated result of one command exchange.
#[derive(Debug)]
pub(crate) struct Outcome {
    /// Untagged frames received before the tagged OK, `*` stripped.
    pub untagged: Vec<Vec<Value>>,
    /// Values of the tagged OK line after the status keyword.
    pub tagged: Vec<Value>,
}

/// An IMAP client connection.
///
/// Not safe for concurrent use: IMAP is stateful (selected folder,
/// command tags, IDLE), so callers serialize access or use one
/// connection per task. Dropping the connection closes the socket
/// abortively; call [`Connection::logout`] for a graceful close.
pub struct Connection<S> {
    pub(crate) parser: Parser<S>,
    pub(crate) tags: TagGenerator,
    pub(crate) state: ConnectionState,
    pub(crate) capabilities: Vec<String>,
    pub(crate) notifications: VecDeque<Unsolicited>,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) idle_tag: Option<String>,
    host: String,
}

impl Connection<ImapStream> {
    /// Connects to the configured server and completes the greeting
    /// (and STARTTLS upgrade, for that transport).
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = match config.transport {
            Transport::Tls => stream::connect_tls(config).await?,
            Transport::Tcp | Transport::StartTls => stream::connect_plain(config).await?,
        };
        Self::setup(stream, config).await
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + TlsUpgrade + Unpin + Send,
{
    /// Builds a connection over an already-established stream: reads the
    /// greeting and, for the STARTTLS transport, negotiates the upgrade
    /// before anything else is written.
    pub async fn setup(stream: S, config: &Config) -> Result<Self> {
        let mut conn = Self {
            parser: Parser::new(stream),
            tags: TagGenerator::new(),
            state: ConnectionState::Greeting,
            capabilities: Vec::new(),
            notifications: VecDeque::new(),
            read_timeout: config.read_timeout,
            idle_tag: None,
            host: config.host.clone(),
        };
        conn.read_greeting().await?;
        if config.transport == Transport::StartTls {
            conn = conn.starttls().await?;
        }
        Ok(conn)
    }

    /// Issues STARTTLS and performs the in-band handshake.
    async fn starttls(mut self) -> Result<Self> {
        self.run_command(Command::new("STARTTLS"))
            .await
            .map_err(|e| match e {
                Error::Server { text, .. } => {
                    Error::ConnectFailed(format!("STARTTLS refused: {text}"))
                }
                other => other,
            })?;

        let Self {
            parser,
            tags,
            state,
            capabilities: _,
            notifications,
            read_timeout,
            idle_tag,
            host,
        } = self;
        let (plain, readahead) = parser.into_parts();
        if !readahead.is_empty() {
            return Err(Error::Protocol(
                "server sent data between STARTTLS and handshake".to_string(),
            ));
        }
        let tls = plain.upgrade_tls(&host).await?;
        tracing::debug!(host = %host, "TLS established");

        // Capabilities seen before the handshake are untrusted.
        Ok(Self {
            parser: Parser::from_parts(tls, readahead),
            tags,
            state,
            capabilities: Vec::new(),
            notifications,
            read_timeout,
            idle_tag,
            host,
        })
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting and sets the initial state.
    async fn read_greeting(&mut self) -> Result<()> {
        let frame = self.read_frame().await.map_err(|e| match e {
            Error::Closed => Error::ConnectFailed("connection closed before greeting".to_string()),
            other => other,
        })?;

        let Response::Untagged(values) = Response::classify(frame)? else {
            return Err(Error::ConnectFailed("missing server greeting".to_string()));
        };

        let caps = response::capabilities(std::slice::from_ref(&values));
        if !caps.is_empty() {
            self.capabilities = caps;
        }

        match values.first() {
            Some(v) if v.eq_atom("OK") => {
                self.state = ConnectionState::NotAuthenticated;
                tracing::debug!(host = %self.host, "connected");
                Ok(())
            }
            Some(v) if v.eq_atom("PREAUTH") => {
                self.state = ConnectionState::Authenticated;
                Ok(())
            }
            Some(v) if v.eq_atom("BYE") => Err(Error::ConnectFailed(text_of(&values[1..]))),
            _ => Err(Error::ConnectFailed(format!(
                "unexpected greeting: {}",
                text_of(&values)
            ))),
        }
    }

    /// Reads one response frame, honoring the read timeout and marking
    /// the connection dead on fatal stream errors.
    pub(crate) async fn read_frame(&mut self) -> Result<Vec<Value>> {
        let result = match self.read_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.parser.read_frame()).await {
                Ok(r) => r,
                Err(_) => Err(Error::Timeout(limit)),
            },
            None => self.parser.read_frame().await,
        };
        if let Err(e) = &result
            && e.is_connection_dead()
        {
            self.state = ConnectionState::Disconnected;
        }
        result
    }

    /// Writes one wire line and flushes.
    pub(crate) async fn write_line(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.parser.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Dispatches a command and reads its complete response.
    ///
    /// Lines announcing a literal pause for the server's `+`
    /// continuation before the payload line is sent.
    pub(crate) async fn run_command(&mut self, command: Command) -> Result<Outcome> {
        match &self.state {
            ConnectionState::Idle(_) => {
                return Err(Error::State(
                    "connection is idling; call done() first".to_string(),
                ));
            }
            ConnectionState::LoggedOut => {
                return Err(Error::State("connection is logged out".to_string()));
            }
            ConnectionState::Disconnected => {
                return Err(Error::State("connection is closed".to_string()));
            }
            _ => {}
        }

        let tag = self.tags.next();
        tracing::debug!(command = command.name(), tag = %tag, "dispatch");

        for line in command.encode(&tag) {
            self.write_line(&line.bytes).await?;
            if line.ends_with_literal {
                self.await_continuation(&tag).await?;
            }
        }

        self.read_until_tagged(&tag).await
    }

    /// Requires a `+` continuation before a literal payload may be sent.
    async fn await_continuation(&mut self, tag: &str) -> Result<()> {
        let frame = self.read_frame().await?;
        match Response::classify(frame)? {
            Response::Continuation(_) => Ok(()),
            Response::Tagged {
                tag: t,
                status,
                values,
            } if t == tag => Err(Error::Server {
                status,
                text: text_of(&values),
            }),
            _ => Err(Error::Protocol(
                "expected continuation before literal".to_string(),
            )),
        }
    }

    /// Reads frames until the tagged status for `tag` arrives.
    pub(crate) async fn read_until_tagged(&mut self, tag: &str) -> Result<Outcome> {
        let mut untagged = Vec::new();

        loop {
            let frame = self.read_frame().await?;
            match Response::classify(frame)? {
                Response::Untagged(values) => untagged.push(values),
                Response::Continuation(_) => {
                    return Err(Error::Protocol("unexpected continuation".to_string()));
                }
                Response::Tagged {
                    tag: t,
                    status,
                    values,
                } => {
                    if t != tag {
                        return Err(Error::Protocol(format!("response for unknown tag {t}")));
                    }
                    tracing::debug!(tag = %tag, status = %status, "complete");
                    return match status {
                        Status::Ok => Ok(Outcome {
                            untagged,
                            tagged: values,
                        }),
                        status => Err(Error::Server {
                            status,
                            text: text_of(&values),
                        }),
                    };
                }
            }
        }
    }

    fn absorb_capabilities(&mut self, outcome: &Outcome) {
        let caps = response::capabilities(&outcome.untagged);
        if !caps.is_empty() {
            self.capabilities = caps;
            return;
        }
        // Some servers put capabilities in the tagged OK's status code.
        if let Some((keyword, args)) = response::bracket_code(&outcome.tagged)
            && keyword == "CAPABILITY"
        {
            self.capabilities = args
                .iter()
                .filter_map(|v| v.as_str().map(ToOwned::to_owned))
                .collect();
        }
    }

    fn require_not_authenticated(&self, op: &str) -> Result<()> {
        if self.state == ConnectionState::NotAuthenticated {
            Ok(())
        } else {
            Err(Error::State(format!("{op} requires a fresh connection")))
        }
    }

    fn require_authenticated(&self, op: &str) -> Result<()> {
        match self.state {
            ConnectionState::Authenticated | ConnectionState::Selected(_) => Ok(()),
            _ => Err(Error::State(format!("{op} requires authentication"))),
        }
    }

    fn require_selected(&self, op: &str) -> Result<&str> {
        match &self.state {
            ConnectionState::Selected(folder) => Ok(folder),
            _ => Err(Error::State(format!("{op} requires a selected folder"))),
        }
    }

    // ----- lifecycle -------------------------------------------------

    /// Authenticates with LOGIN.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<()> {
        self.require_not_authenticated("LOGIN")?;
        let command = Command::new("LOGIN").string(user).string(password);
        match self.run_command(command).await {
            Ok(outcome) => {
                self.absorb_capabilities(&outcome);
                self.state = ConnectionState::Authenticated;
                tracing::debug!(user, "logged in");
                Ok(())
            }
            Err(Error::Server { text, .. }) => Err(Error::Auth(text)),
            Err(e) => Err(e),
        }
    }

    /// Authenticates with the XOAUTH2 mechanism.
    ///
    /// On rejection most servers send a base64 challenge first; the
    /// client answers it with an empty request (no new tag) and then
    /// receives the tagged NO.
    pub async fn authenticate(&mut self, user: &str, token: &str) -> Result<()> {
        self.require_not_authenticated("AUTHENTICATE")?;

        let tag = self.tags.next();
        let command = Command::new("AUTHENTICATE")
            .atom("XOAUTH2")
            .atom(sasl::xoauth2_response(user, token));
        tracing::debug!(tag = %tag, user, "authenticate XOAUTH2");
        for line in command.encode(&tag) {
            self.write_line(&line.bytes).await?;
        }

        let mut untagged = Vec::new();
        loop {
            let frame = self.read_frame().await?;
            match Response::classify(frame)? {
                Response::Continuation(_) => self.write_line(b"\r\n").await?,
                Response::Untagged(values) => untagged.push(values),
                Response::Tagged {
                    tag: t,
                    status,
                    values,
                } if t == tag => {
                    return match status {
                        Status::Ok => {
                            self.absorb_capabilities(&Outcome {
                                untagged,
                                tagged: values,
                            });
                            self.state = ConnectionState::Authenticated;
                            Ok(())
                        }
                        _ => Err(Error::Auth(text_of(&values))),
                    };
                }
                Response::Tagged { tag: t, .. } => {
                    return Err(Error::Protocol(format!("response for unknown tag {t}")));
                }
            }
        }
    }

    /// Gracefully closes the connection.
    ///
    /// Best effort and idempotent: errors during teardown are logged
    /// and swallowed, and repeated calls are no-ops. A dead stream
    /// skips the wire exchange entirely.
    pub async fn logout(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::LoggedOut => return Ok(()),
            ConnectionState::Disconnected => {
                self.state = ConnectionState::LoggedOut;
                return Ok(());
            }
            _ => {}
        }

        if matches!(self.state, ConnectionState::Idle(_)) {
            let _ = self.done().await;
        }

        let tag = self.tags.next();
        let line = Command::new("LOGOUT").encode(&tag).remove(0);
        let teardown = async {
            self.write_line(&line.bytes).await?;
            // The server answers with untagged BYE, then the tagged OK.
            self.read_until_tagged(&tag).await?;
            Ok::<(), Error>(())
        }
        .await;
        if let Err(e) = teardown {
            tracing::warn!(error = %e, "logout teardown failed");
        }

        self.state = ConnectionState::LoggedOut;
        Ok(())
    }

    // ----- folders ---------------------------------------------------

    /// Opens a folder read-write and returns its state.
    pub async fn select_folder(&mut self, folder: &str) -> Result<SelectedState> {
        self.require_authenticated("SELECT")?;
        let outcome = self.run_command(Command::new("SELECT").string(folder)).await?;
        let state = Self::folder_open_state(&outcome, false)?;
        self.state = ConnectionState::Selected(folder.to_string());
        Ok(state)
    }

    /// Opens a folder read-only and returns its state.
    pub async fn examine_folder(&mut self, folder: &str) -> Result<SelectedState> {
        self.require_authenticated("EXAMINE")?;
        let outcome = self
            .run_command(Command::new("EXAMINE").string(folder))
            .await?;
        let state = Self::folder_open_state(&outcome, true)?;
        self.state = ConnectionState::Selected(folder.to_string());
        Ok(state)
    }

    fn folder_open_state(outcome: &Outcome, read_only: bool) -> Result<SelectedState> {
        let mut state = response::selected_state(&outcome.untagged, read_only)?;
        // The tagged OK often carries the authoritative access mode.
        if let Some((keyword, _)) = response::bracket_code(&outcome.tagged) {
            match keyword.as_str() {
                "READ-ONLY" => state.read_only = true,
                "READ-WRITE" => state.read_only = false,
                _ => {}
            }
        }
        Ok(state)
    }

    /// Leaves the selected folder, via UNSELECT when available, CLOSE
    /// otherwise.
    pub async fn unselect(&mut self) -> Result<()> {
        self.require_selected("UNSELECT")?;
        let name = if self.has_capability("UNSELECT") {
            "UNSELECT"
        } else {
            "CLOSE"
        };
        self.run_command(Command::new(name)).await?;
        self.state = ConnectionState::Authenticated;
        Ok(())
    }

    /// Requests STATUS attributes for a folder without selecting it.
    pub async fn folder_status(&mut self, folder: &str, attrs: &[&str]) -> Result<FolderStatus> {
        self.require_authenticated("STATUS")?;
        let items = attrs.iter().map(|a| Arg::atom(*a)).collect();
        let outcome = self
            .run_command(Command::new("STATUS").string(folder).list(items))
            .await?;
        Ok(response::folder_status(&outcome.untagged))
    }

    /// Lists folders matching a pattern under a reference name.
    pub async fn list_folders(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> Result<BTreeMap<String, FolderInfo>> {
        self.require_authenticated("LIST")?;
        let outcome = self
            .run_command(Command::new("LIST").string(reference).string(pattern))
            .await?;
        Ok(response::list_folders(&outcome.untagged))
    }

    /// Creates a folder.
    pub async fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.require_authenticated("CREATE")?;
        self.run_command(Command::new("CREATE").string(folder)).await?;
        Ok(())
    }

    /// Renames a folder.
    pub async fn rename_folder(&mut self, from: &str, to: &str) -> Result<()> {
        self.require_authenticated("RENAME")?;
        self.run_command(Command::new("RENAME").string(from).string(to))
            .await?;
        Ok(())
    }

    /// Deletes a folder.
    pub async fn delete_folder(&mut self, folder: &str) -> Result<()> {
        self.require_authenticated("DELETE")?;
        self.run_command(Command::new("DELETE").string(folder)).await?;
        Ok(())
    }

    /// Subscribes to a folder.
    pub async fn subscribe_folder(&mut self, folder: &str) -> Result<()> {
        self.require_authenticated("SUBSCRIBE")?;
        self.run_command(Command::new("SUBSCRIBE").string(folder))
            .await?;
        Ok(())
    }

    /// Unsubscribes from a folder.
    pub async fn unsubscribe_folder(&mut self, folder: &str) -> Result<()> {
        self.require_authenticated("UNSUBSCRIBE")?;
        self.run_command(Command::new("UNSUBSCRIBE").string(folder))
            .await?;
        Ok(())
    }

    // ----- messages --------------------------------------------------

    /// Fetches the given items for a set of messages.
    ///
    /// Results are keyed by UID in `Mode::Uid` and by sequence number in
    /// `Mode::Seq`. One requested item yields its value directly; more
    /// than one yields an item map.
    pub async fn fetch(
        &mut self,
        items: &[&str],
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<BTreeMap<u32, FetchData>> {
        self.require_selected("FETCH")?;
        let command = Command::new(format!("{}FETCH", mode.prefix()))
            .atom(ids.to_string())
            .arg(fetch_items_arg(items));
        let outcome = self.run_command(command).await?;
        Ok(response::collect_fetch(
            &outcome.untagged,
            items,
            single_id(ids),
            mode,
        ))
    }

    /// Fetches full raw message content (RFC822).
    pub async fn content(
        &mut self,
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<BTreeMap<u32, Vec<u8>>> {
        let data = self.fetch(&["RFC822"], ids, mode).await?;
        Ok(extract_bytes(data))
    }

    /// Fetches raw message headers (RFC822.HEADER).
    pub async fn headers(
        &mut self,
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<BTreeMap<u32, Vec<u8>>> {
        let data = self.fetch(&["RFC822.HEADER"], ids, mode).await?;
        Ok(extract_bytes(data))
    }

    /// Fetches message flags.
    pub async fn flags(
        &mut self,
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<BTreeMap<u32, Vec<String>>> {
        let data = self.fetch(&["FLAGS"], ids, mode).await?;
        Ok(extract_flag_lists(data))
    }

    /// Fetches message sizes (RFC822.SIZE).
    pub async fn sizes(&mut self, ids: &SequenceSet, mode: Mode) -> Result<BTreeMap<u32, u32>> {
        let data = self.fetch(&["RFC822.SIZE"], ids, mode).await?;
        Ok(data
            .into_iter()
            .filter_map(|(id, d)| match d {
                FetchData::Value(v) => Some((id, v.to_u32()?)),
                FetchData::Items(_) => None,
            })
            .collect())
    }

    /// Maps sequence numbers to UIDs.
    pub async fn uids(&mut self, msgns: &SequenceSet) -> Result<BTreeMap<u32, u32>> {
        let data = self.fetch(&["UID"], msgns, Mode::Seq).await?;
        Ok(data
            .into_iter()
            .filter_map(|(msgn, d)| match d {
                FetchData::Value(v) => Some((msgn, v.to_u32()?)),
                FetchData::Items(_) => None,
            })
            .collect())
    }

    /// Modifies message flags.
    ///
    /// Returns the post-store flags per message; silent mode suppresses
    /// the echo and returns an empty map.
    pub async fn store(
        &mut self,
        ids: &SequenceSet,
        action: &StoreAction,
        silent: bool,
        mode: Mode,
    ) -> Result<BTreeMap<u32, Vec<String>>> {
        self.require_selected("STORE")?;
        let flags = action.flags().iter().map(|f| Arg::atom(f.clone())).collect();
        let command = Command::new(format!("{}STORE", mode.prefix()))
            .atom(ids.to_string())
            .atom(action.item(silent))
            .list(flags);
        let outcome = self.run_command(command).await?;
        Ok(extract_flag_lists(response::collect_fetch(
            &outcome.untagged,
            &["FLAGS"],
            None,
            mode,
        )))
    }

    /// Appends a message to a folder, with optional flags and an
    /// optional internal date.
    pub async fn append(
        &mut self,
        folder: &str,
        message: &[u8],
        flags: Option<&[&str]>,
        date: Option<&str>,
    ) -> Result<()> {
        self.require_authenticated("APPEND")?;
        let mut command = Command::new("APPEND").string(folder);
        if let Some(flags) = flags {
            command = command.list(flags.iter().map(|f| Arg::atom(*f)).collect());
        }
        if let Some(date) = date {
            command = command.string(date);
        }
        self.run_command(command.literal(message)).await?;
        Ok(())
    }

    /// Copies messages into another folder.
    pub async fn copy_messages(
        &mut self,
        folder: &str,
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<()> {
        self.require_selected("COPY")?;
        let command = Command::new(format!("{}COPY", mode.prefix()))
            .atom(ids.to_string())
            .string(folder);
        self.run_command(command).await?;
        Ok(())
    }

    /// Moves messages into another folder (RFC 6851).
    pub async fn move_messages(
        &mut self,
        folder: &str,
        ids: &SequenceSet,
        mode: Mode,
    ) -> Result<()> {
        self.require_selected("MOVE")?;
        let command = Command::new(format!("{}MOVE", mode.prefix()))
            .atom(ids.to_string())
            .string(folder);
        self.run_command(command).await?;
        Ok(())
    }

    /// Searches the selected folder; an empty id list is a valid result.
    pub async fn search(&mut self, query: &str, mode: Mode) -> Result<Vec<u32>> {
        self.require_selected("SEARCH")?;
        let command = Command::new(format!("{}SEARCH", mode.prefix())).atom(query);
        let outcome = self.run_command(command).await?;
        Ok(response::search_ids(&outcome.untagged))
    }

    /// Permanently removes messages marked `\Deleted`; returns the
    /// expunged sequence numbers.
    pub async fn expunge(&mut self) -> Result<Vec<u32>> {
        self.require_selected("EXPUNGE")?;
        let outcome = self.run_command(Command::new("EXPUNGE")).await?;
        Ok(response::expunged_ids(&outcome.untagged))
    }

    /// Expunges only the given UIDs (RFC 4315 UIDPLUS).
    pub async fn uid_expunge(&mut self, uids: &SequenceSet) -> Result<Vec<u32>> {
        self.require_selected("UID EXPUNGE")?;
        let outcome = self
            .run_command(Command::new("UID EXPUNGE").atom(uids.to_string()))
            .await?;
        Ok(response::expunged_ids(&outcome.untagged))
    }

    // ----- server ----------------------------------------------------

    /// Requests the server's capabilities and refreshes the cache.
    pub async fn capability(&mut self) -> Result<Vec<String>> {
        let outcome = self.run_command(Command::new("CAPABILITY")).await?;
        self.absorb_capabilities(&outcome);
        Ok(self.capabilities.clone())
    }

    /// Sends NOOP; server updates delivered with the reply are routed to
    /// the notification queue.
    pub async fn noop(&mut self) -> Result<()> {
        let outcome = self.run_command(Command::new("NOOP")).await?;
        for values in outcome.untagged {
            self.notifications.push_back(Unsolicited::classify(values));
        }
        Ok(())
    }

    /// Exchanges client/server identification (RFC 2971).
    pub async fn id(
        &mut self,
        params: Option<&[(&str, &str)]>,
    ) -> Result<Option<BTreeMap<String, String>>> {
        let command = match params {
            Some(pairs) => {
                let mut items = Vec::with_capacity(pairs.len() * 2);
                for (key, value) in pairs {
                    items.push(Arg::string(*key));
                    items.push(Arg::string(*value));
                }
                Command::new("ID").list(items)
            }
            None => Command::new("ID").atom("NIL"),
        };
        let outcome = self.run_command(command).await?;
        Ok(response::id_params(&outcome.untagged))
    }

    /// Requests quota usage for a quota root (RFC 2087).
    pub async fn get_quota(&mut self, root: &str) -> Result<Vec<Quota>> {
        self.require_authenticated("GETQUOTA")?;
        let outcome = self
            .run_command(Command::new("GETQUOTA").string(root))
            .await?;
        Ok(response::quotas(&outcome.untagged))
    }

    /// Requests the quota roots of a folder and their usage (RFC 2087).
    pub async fn get_quota_root(&mut self, folder: &str) -> Result<(Vec<String>, Vec<Quota>)> {
        self.require_authenticated("GETQUOTAROOT")?;
        let outcome = self
            .run_command(Command::new("GETQUOTAROOT").string(folder))
            .await?;
        Ok((
            response::quota_roots(&outcome.untagged),
            response::quotas(&outcome.untagged),
        ))
    }

    // ----- accessors -------------------------------------------------

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Returns true if the connection can still carry commands.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::LoggedOut
        )
    }

    /// Returns the cached server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Checks a capability by name, case-insensitively.
    #[must_use]
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Adjusts the read timeout; `None` waits indefinitely.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Gets a reference to the underlying stream.
    pub fn stream_ref(&self) -> &S {
        self.parser.get_ref()
    }
}

fn fetch_items_arg(items: &[&str]) -> Arg {
    if let [single] = items {
        Arg::atom(*single)
    } else {
        Arg::List(items.iter().map(|i| Arg::atom(*i)).collect())
    }
}

/// A request targets a single id when it is `n` or the degenerate range
/// `n:n`; unrelated FETCH entries are then filtered out.
fn single_id(ids: &SequenceSet) -> Option<u32> {
    match ids {
        SequenceSet::Single(n) => Some(*n),
        SequenceSet::Range(a, Bound::Num(b)) if a == b => Some(*a),
        _ => None,
    }
}

fn extract_bytes(data: BTreeMap<u32, FetchData>) -> BTreeMap<u32, Vec<u8>> {
    data.into_iter()
        .filter_map(|(id, d)| match d {
            FetchData::Value(v) => v.as_bytes().map(|b| (id, b.to_vec())),
            FetchData::Items(_) => None,
        })
        .collect()
}

fn extract_flag_lists(data: BTreeMap<u32, FetchData>) -> BTreeMap<u32, Vec<String>> {
    data.into_iter()
        .filter_map(|(id, d)| match d {
            FetchData::Value(Value::List(flags)) => Some((
                id,
                flags
                    .iter()
                    .filter_map(|f| f.as_str().map(ToOwned::to_owned))
                    .collect(),
            )),
            _ => None,
        })
        .collect()
}
