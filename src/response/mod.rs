//! Response classification and extraction.
//!
//! Every response frame is classified by its leading value: `*` marks
//! untagged server data, `+` a continuation request, anything else a
//! tagged status line. The helpers below pull structured results out of
//! the untagged frames a command accumulated: SELECT state, FETCH item
//! maps, SEARCH id lists, LIST rows, STATUS counters, QUOTA usage.
//!
//! Servers disagree about item order inside FETCH responses, so lookups
//! here always scan key/value pairs by name and never index by position.

use std::collections::BTreeMap;

use crate::parser::Value;
use crate::types::{FolderInfo, FolderStatus, Mode, Quota, QuotaResource, SelectedState};
use crate::{Error, Result};

/// Tagged response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Operational error; the command failed.
    No,
    /// Protocol-level rejection of the command.
    Bad,
    /// Server is closing the connection.
    Bye,
    /// Greeting-only: the connection starts out authenticated.
    PreAuth,
}

impl Status {
    /// Parses a status keyword value.
    #[must_use]
    pub fn parse(value: &Value) -> Option<Self> {
        if value.eq_atom("OK") {
            Some(Self::Ok)
        } else if value.eq_atom("NO") {
            Some(Self::No)
        } else if value.eq_atom("BAD") {
            Some(Self::Bad)
        } else if value.eq_atom("BYE") {
            Some(Self::Bye)
        } else if value.eq_atom("PREAUTH") {
            Some(Self::PreAuth)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::Bye => "BYE",
            Self::PreAuth => "PREAUTH",
        })
    }
}

/// A classified response frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Untagged server data; the leading `*` is stripped.
    Untagged(Vec<Value>),
    /// Continuation request; the leading `+` is stripped.
    Continuation(Vec<Value>),
    /// Tagged status line.
    Tagged {
        /// The command tag this status completes.
        tag: String,
        /// OK, NO, BAD, or BYE.
        status: Status,
        /// Everything after the status keyword.
        values: Vec<Value>,
    },
}

impl Response {
    /// Classifies a parsed frame by its leading value.
    pub fn classify(mut frame: Vec<Value>) -> Result<Self> {
        if frame.is_empty() {
            return Err(Error::BadResponse("empty response frame".to_string()));
        }
        let lead = frame.remove(0);

        if lead.eq_atom("*") {
            return Ok(Self::Untagged(frame));
        }
        if lead.eq_atom("+") {
            return Ok(Self::Continuation(frame));
        }

        let Some(tag) = lead.as_str().map(ToOwned::to_owned) else {
            return Err(Error::BadResponse("non-atom response tag".to_string()));
        };
        if frame.is_empty() {
            return Err(Error::BadResponse(format!(
                "tagged response {tag} without status"
            )));
        }
        let status_value = frame.remove(0);
        let Some(status) = Status::parse(&status_value) else {
            return Err(Error::BadResponse(format!(
                "unknown status {:?} for tag {tag}",
                status_value
            )));
        };

        Ok(Self::Tagged {
            tag,
            status,
            values: frame,
        })
    }
}

/// Renders values as human-readable text (server messages in errors).
#[must_use]
pub fn text_of(values: &[Value]) -> String {
    fn render(value: &Value, out: &mut String) {
        match value {
            Value::Atom(b) | Value::String(b) => out.push_str(&String::from_utf8_lossy(b)),
            Value::List(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    render(item, out);
                }
                out.push(')');
            }
        }
    }

    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        render(value, &mut out);
    }
    out
}

/// Extracts a bracketed status code from response text values.
///
/// `[UIDVALIDITY 857529045] UIDs valid` arrives as the atoms
/// `[UIDVALIDITY` and `857529045]` followed by free text; this returns
/// the uppercased keyword and the argument values with the brackets
/// stripped.
#[must_use]
pub fn bracket_code(values: &[Value]) -> Option<(String, Vec<Value>)> {
    let first = values.first()?.as_bytes()?;
    let rest = first.strip_prefix(b"[")?;

    // Single-word codes close their own bracket: `[READ-ONLY]`.
    if let Some(word) = rest.strip_suffix(b"]") {
        let keyword = String::from_utf8_lossy(word).to_uppercase();
        return Some((keyword, Vec::new()));
    }

    let keyword = String::from_utf8_lossy(rest).to_uppercase();
    let mut args = Vec::new();
    for value in &values[1..] {
        let Some(bytes) = value.as_bytes() else {
            args.push(value.clone());
            continue;
        };
        if let Some(stripped) = bytes.strip_suffix(b"]") {
            args.push(Value::Atom(stripped.to_vec()));
            return Some((keyword, args));
        }
        args.push(value.clone());
    }
    // Unterminated code: treat what we have as the arguments.
    Some((keyword, args))
}

/// Pulls capability names out of untagged frames and bracketed
/// `[CAPABILITY …]` greeting codes.
#[must_use]
pub fn capabilities(frames: &[Vec<Value>]) -> Vec<String> {
    let mut caps = Vec::new();

    for frame in frames {
        if frame.first().is_some_and(|v| v.eq_atom("CAPABILITY")) {
            caps.extend(
                frame[1..]
                    .iter()
                    .filter_map(|v| v.as_str().map(ToOwned::to_owned)),
            );
        } else if frame.first().is_some_and(|v| v.eq_atom("OK") || v.eq_atom("PREAUTH"))
            && let Some((keyword, args)) = bracket_code(&frame[1..])
            && keyword == "CAPABILITY"
        {
            caps.extend(args.iter().filter_map(|v| v.as_str().map(ToOwned::to_owned)));
        }
    }

    caps
}

/// Builds the selected-folder state from SELECT/EXAMINE untagged frames.
///
/// The status-code table covers the codes the original engine reacts to;
/// `[NONEXISTENT]` is a hard error even when the server wraps it in OK.
pub fn selected_state(frames: &[Vec<Value>], read_only: bool) -> Result<SelectedState> {
    let mut state = SelectedState {
        read_only,
        ..SelectedState::default()
    };

    for frame in frames {
        match frame.as_slice() {
            [count, keyword, ..] if keyword.eq_atom("EXISTS") => {
                state.exists = count.to_u32().unwrap_or(0);
            }
            [count, keyword, ..] if keyword.eq_atom("RECENT") => {
                state.recent = count.to_u32().unwrap_or(0);
            }
            [keyword, Value::List(flags), ..] if keyword.eq_atom("FLAGS") => {
                state.flags = flags
                    .iter()
                    .filter_map(|v| v.as_str().map(ToOwned::to_owned))
                    .collect();
            }
            [keyword, rest @ ..] if keyword.eq_atom("OK") => {
                let Some((code, args)) = bracket_code(rest) else {
                    continue;
                };
                let number = args.first().and_then(Value::to_u32);
                match code.as_str() {
                    "UIDVALIDITY" => state.uid_validity = number,
                    "UIDNEXT" => state.uid_next = number,
                    "UNSEEN" => state.unseen = number,
                    "READ-ONLY" => state.read_only = true,
                    "READ-WRITE" => state.read_only = false,
                    "NONEXISTENT" => {
                        return Err(Error::Server {
                            status: Status::No,
                            text: "mailbox does not exist".to_string(),
                        });
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Ok(state)
}

/// Value of one message in a FETCH result.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchData {
    /// The single requested item's value.
    Value(Value),
    /// Requested-item name (uppercased) to value.
    Items(BTreeMap<String, Value>),
}

/// Assembles FETCH responses into a map keyed by UID or sequence number.
///
/// Each untagged `n FETCH (k1 v1 k2 v2 …)` frame contributes one entry.
/// The UID is located by scanning the pairs, wherever the server put it.
/// When the request targeted a single id, entries for other ids (flag
/// updates the server volunteered) are skipped.
#[must_use]
pub fn collect_fetch(
    frames: &[Vec<Value>],
    items: &[&str],
    single_target: Option<u32>,
    mode: Mode,
) -> BTreeMap<u32, FetchData> {
    let mut results = BTreeMap::new();

    for frame in frames {
        let [seq, keyword, Value::List(pairs), ..] = frame.as_slice() else {
            continue;
        };
        if !keyword.eq_atom("FETCH") {
            continue;
        }
        let Some(msgn) = seq.to_u32() else {
            continue;
        };

        let pairs: Vec<(String, &Value)> = pairs
            .chunks_exact(2)
            .filter_map(|kv| {
                kv[0]
                    .as_str()
                    .map(|key| (key.to_uppercase(), &kv[1]))
            })
            .collect();

        let uid = pairs
            .iter()
            .find(|(key, _)| key == "UID")
            .and_then(|(_, value)| value.to_u32());

        let id = match mode {
            Mode::Uid => match uid {
                Some(uid) => uid,
                None => continue,
            },
            Mode::Seq => msgn,
        };
        if single_target.is_some_and(|target| target != id) {
            continue;
        }

        if let [item] = items {
            let wanted = item.to_uppercase();
            if let Some((_, value)) = pairs.iter().find(|(key, _)| *key == wanted) {
                results.insert(id, FetchData::Value((*value).clone()));
            }
        } else {
            let wanted: Vec<String> = items.iter().map(|i| i.to_uppercase()).collect();
            let map: BTreeMap<String, Value> = pairs
                .iter()
                .filter(|(key, _)| wanted.contains(key))
                .map(|(key, value)| (key.clone(), (*value).clone()))
                .collect();
            results.insert(id, FetchData::Items(map));
        }
    }

    results
}

/// Extracts the id list from SEARCH responses.
///
/// An empty result is a valid success.
#[must_use]
pub fn search_ids(frames: &[Vec<Value>]) -> Vec<u32> {
    let mut ids = Vec::new();

    for frame in frames {
        if frame.first().is_some_and(|v| v.eq_atom("SEARCH")) {
            ids.extend(frame[1..].iter().filter_map(Value::to_u32));
        }
    }

    ids
}

/// Extracts folder rows from LIST responses: name to flags + delimiter.
#[must_use]
pub fn list_folders(frames: &[Vec<Value>]) -> BTreeMap<String, FolderInfo> {
    let mut folders = BTreeMap::new();

    for frame in frames {
        let [keyword, Value::List(flags), delimiter, name, ..] = frame.as_slice() else {
            continue;
        };
        if !keyword.eq_atom("LIST") {
            continue;
        }
        let Some(name) = name.as_bytes() else {
            continue;
        };

        let info = FolderInfo {
            flags: flags
                .iter()
                .filter_map(|v| v.as_str().map(ToOwned::to_owned))
                .collect(),
            delimiter: if delimiter.eq_atom("NIL") {
                None
            } else {
                delimiter.as_str().map(ToOwned::to_owned)
            },
        };
        folders.insert(String::from_utf8_lossy(name).to_string(), info);
    }

    folders
}

/// Extracts STATUS counters: lowercased attribute name to integer.
#[must_use]
pub fn folder_status(frames: &[Vec<Value>]) -> FolderStatus {
    let mut status = FolderStatus::new();

    for frame in frames {
        let [keyword, _mailbox, rest @ ..] = frame.as_slice() else {
            continue;
        };
        if !keyword.eq_atom("STATUS") {
            continue;
        }
        let Some(Value::List(pairs)) = rest.iter().find(|v| v.as_list().is_some()) else {
            continue;
        };
        for kv in pairs.chunks_exact(2) {
            if let (Some(key), Some(value)) = (kv[0].as_str(), kv[1].to_u64()) {
                status.insert(key.to_lowercase(), value);
            }
        }
    }

    status
}

/// Extracts expunged sequence numbers from EXPUNGE responses.
#[must_use]
pub fn expunged_ids(frames: &[Vec<Value>]) -> Vec<u32> {
    let mut ids = Vec::new();

    for frame in frames {
        if let [seq, keyword, ..] = frame.as_slice()
            && keyword.eq_atom("EXPUNGE")
            && let Some(n) = seq.to_u32()
        {
            ids.push(n);
        }
    }

    ids
}

/// Extracts quota rows from QUOTA responses.
#[must_use]
pub fn quotas(frames: &[Vec<Value>]) -> Vec<Quota> {
    let mut result = Vec::new();

    for frame in frames {
        let [keyword, root, Value::List(triples), ..] = frame.as_slice() else {
            continue;
        };
        if !keyword.eq_atom("QUOTA") {
            continue;
        }

        let resources = triples
            .chunks_exact(3)
            .filter_map(|t| {
                Some(QuotaResource {
                    name: t[0].as_str()?.to_uppercase(),
                    usage: t[1].to_u64()?,
                    limit: t[2].to_u64()?,
                })
            })
            .collect();

        result.push(Quota {
            root: root
                .as_bytes()
                .map(|b| String::from_utf8_lossy(b).to_string())
                .unwrap_or_default(),
            resources,
        });
    }

    result
}

/// Extracts quota root names from a GETQUOTAROOT response.
#[must_use]
pub fn quota_roots(frames: &[Vec<Value>]) -> Vec<String> {
    let mut roots = Vec::new();

    for frame in frames {
        if frame.first().is_some_and(|v| v.eq_atom("QUOTAROOT")) {
            roots.extend(
                frame[2..]
                    .iter()
                    .filter_map(|v| v.as_bytes().map(|b| String::from_utf8_lossy(b).to_string())),
            );
        }
    }

    roots
}

/// Extracts the server's ID parameters, `None` when it answered NIL.
#[must_use]
pub fn id_params(frames: &[Vec<Value>]) -> Option<BTreeMap<String, String>> {
    for frame in frames {
        let [keyword, params, ..] = frame.as_slice() else {
            continue;
        };
        if !keyword.eq_atom("ID") {
            continue;
        }
        let Some(pairs) = params.as_list() else {
            return None; // ID NIL
        };
        return Some(
            pairs
                .chunks_exact(2)
                .filter_map(|kv| {
                    Some((
                        kv[0].as_str()?.to_string(),
                        kv[1].as_str().unwrap_or_default().to_string(),
                    ))
                })
                .collect(),
        );
    }

    None
}

/// An untagged response received outside a command: server push during
/// IDLE or between commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Unsolicited {
    /// New message count.
    Exists(u32),
    /// Recent message count.
    Recent(u32),
    /// A message was expunged.
    Expunge(u32),
    /// Flag or item update for a message.
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// The raw FETCH item values.
        items: Vec<Value>,
    },
    /// Server is closing the connection.
    Bye {
        /// The server's parting text.
        text: String,
    },
    /// Anything else, passed through raw.
    Other(Vec<Value>),
}

impl Unsolicited {
    /// Classifies an untagged frame (leading `*` already stripped).
    #[must_use]
    pub fn classify(frame: Vec<Value>) -> Self {
        match frame.as_slice() {
            [count, keyword] if keyword.eq_atom("EXISTS") => {
                if let Some(n) = count.to_u32() {
                    return Self::Exists(n);
                }
            }
            [count, keyword] if keyword.eq_atom("RECENT") => {
                if let Some(n) = count.to_u32() {
                    return Self::Recent(n);
                }
            }
            [seq, keyword] if keyword.eq_atom("EXPUNGE") => {
                if let Some(n) = seq.to_u32() {
                    return Self::Expunge(n);
                }
            }
            [seq, keyword, Value::List(items)] if keyword.eq_atom("FETCH") => {
                if let Some(n) = seq.to_u32() {
                    return Self::Fetch {
                        seq: n,
                        items: items.clone(),
                    };
                }
            }
            [keyword, rest @ ..] if keyword.eq_atom("BYE") => {
                return Self::Bye {
                    text: text_of(rest),
                };
            }
            _ => {}
        }
        Self::Other(frame)
    }
}
