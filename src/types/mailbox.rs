//! Folder-level types returned by the connection.

use std::collections::BTreeMap;

/// State accumulated from a SELECT or EXAMINE exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedState {
    /// Flags defined for this folder.
    pub flags: Vec<String>,
    /// Number of messages in the folder.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// UIDVALIDITY value, if the server reported one.
    pub uid_validity: Option<u32>,
    /// Next UID to be assigned, if reported.
    pub uid_next: Option<u32>,
    /// First unseen message sequence number, if reported.
    pub unseen: Option<u32>,
    /// Whether the folder was opened read-only.
    pub read_only: bool,
}

/// One row of a LIST response: the folder's attribute flags and
/// hierarchy delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderInfo {
    /// Attribute flags such as `\HasChildren` or `\Noselect`.
    pub flags: Vec<String>,
    /// Hierarchy delimiter, `None` when the server sent NIL.
    pub delimiter: Option<String>,
}

/// STATUS response attributes, keys lowercased.
pub type FolderStatus = BTreeMap<String, u64>;

/// One resource line of a QUOTA response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name, e.g. `STORAGE` or `MESSAGE`.
    pub name: String,
    /// Current usage.
    pub usage: u64,
    /// Resource limit.
    pub limit: u64,
}

/// Quota root with its resource usage/limits (RFC 2087).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quota {
    /// Name of the quota root.
    pub root: String,
    /// Per-resource usage and limits.
    pub resources: Vec<QuotaResource>,
}
