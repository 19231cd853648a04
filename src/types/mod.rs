//! Core IMAP types.

mod mailbox;
mod sequence;

pub use mailbox::{FolderInfo, FolderStatus, Quota, QuotaResource, SelectedState};
pub use sequence::{Bound, SequenceSet};


/// Message addressing mode for id-bearing commands.
///
/// `Uid` prefixes commands with `UID ` and keys results by UID; UIDs are
/// stable across sessions and tolerate server expunges. `Seq` uses
/// ephemeral 1-based sequence numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Address messages by UID (default).
    #[default]
    Uid,
    /// Address messages by sequence number.
    Seq,
}

impl Mode {
    /// Returns the command prefix for this mode (`"UID "` or `""`).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Uid => "UID ",
            Self::Seq => "",
        }
    }
}

/// Flag mutation for the STORE command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace the flag set (`FLAGS`).
    Set(Vec<String>),
    /// Add flags (`+FLAGS`).
    Add(Vec<String>),
    /// Remove flags (`-FLAGS`).
    Remove(Vec<String>),
}

impl StoreAction {
    /// Returns the wire item name, with `.SILENT` appended when the
    /// server should suppress the FETCH echo.
    #[must_use]
    pub fn item(&self, silent: bool) -> String {
        let base = match self {
            Self::Set(_) => "FLAGS",
            Self::Add(_) => "+FLAGS",
            Self::Remove(_) => "-FLAGS",
        };
        if silent {
            format!("{base}.SILENT")
        } else {
            base.to_string()
        }
    }

    /// Returns the flags being stored.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        match self {
            Self::Set(f) | Self::Add(f) | Self::Remove(f) => f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_prefix() {
        assert_eq!(Mode::Uid.prefix(), "UID ");
        assert_eq!(Mode::Seq.prefix(), "");
        assert_eq!(Mode::default(), Mode::Uid);
    }
}
