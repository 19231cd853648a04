//! IMAP token types.

/// Token produced by the tokenizer.
///
/// Atoms preserve case; quoted and literal payloads are opaque binary
/// (they may contain NUL, CR, LF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word: a maximal run of non-special bytes.
    Atom(Vec<u8>),
    /// Quoted string payload, surrounding quotes and escapes removed.
    Quoted(Vec<u8>),
    /// Literal payload, exactly the `{n}` announced bytes.
    Literal(Vec<u8>),
    /// Opening parenthesis.
    ListOpen,
    /// Closing parenthesis.
    ListClose,
    /// CRLF line ending.
    Crlf,
    /// End of input.
    Eof,
}

impl Token {
    /// Returns the payload bytes for string-like tokens.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(b) | Self::Quoted(b) | Self::Literal(b) => Some(b),
            _ => None,
        }
    }
}
