//! Streaming IMAP tokenizer.
//!
//! Consumes raw bytes from the underlying stream and yields one typed
//! token per call. The tokenizer reads ahead only as far as a single
//! token requires; the exception is literal consumption, where exactly
//! the announced number of bytes is gathered before lexing resumes in
//! line mode.

mod token;

pub use token::Token;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, Result};

/// Initial readahead buffer capacity.
const BUFFER_SIZE: usize = 8192;

/// Maximum accepted size for a single atom or quoted string.
const MAX_TOKEN_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum accepted literal size.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Streaming tokenizer over any byte stream.
pub struct Tokenizer<S> {
    stream: S,
    buf: BytesMut,
}

impl<S> Tokenizer<S> {
    /// Creates a tokenizer over the given stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }

    /// Returns true if undecoded bytes are sitting in the readahead
    /// buffer.
    #[must_use]
    pub fn has_buffered(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Splits the tokenizer into the stream and any unconsumed readahead.
    pub fn into_parts(self) -> (S, BytesMut) {
        (self.stream, self.buf)
    }

    /// Rebuilds a tokenizer from a stream and leftover readahead bytes.
    pub fn from_parts(stream: S, buf: BytesMut) -> Self {
        Self { stream, buf }
    }
}

impl<S> Tokenizer<S>
where
    S: AsyncRead + Unpin,
{
    /// Reads more bytes from the stream into the buffer.
    ///
    /// Returns the number of bytes read; 0 means EOF.
    async fn fill(&mut self) -> Result<usize> {
        let n = self.stream.read_buf(&mut self.buf).await?;
        Ok(n)
    }

    /// Peeks at the byte at `offset`, filling the buffer as needed.
    ///
    /// Returns `None` at end of stream.
    async fn peek_at(&mut self, offset: usize) -> Result<Option<u8>> {
        while self.buf.len() <= offset {
            if self.fill().await? == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[offset]))
    }

    /// Consumes and returns the next byte.
    ///
    /// Only valid after a successful peek.
    fn bump(&mut self) -> u8 {
        let b = self.buf[0];
        let _ = self.buf.split_to(1);
        b
    }

    /// Reads the next token.
    pub async fn next_token(&mut self) -> Result<Token> {
        // SP separates tokens and is consumed silently.
        loop {
            match self.peek_at(0).await? {
                Some(b' ') => {
                    self.bump();
                }
                Some(_) => break,
                None => return Ok(Token::Eof),
            }
        }

        // The leading byte decides the token shape.
        match self.buf[0] {
            b'\r' => {
                if self.peek_at(1).await? == Some(b'\n') {
                    self.bump();
                    self.bump();
                    Ok(Token::Crlf)
                } else {
                    Err(Error::BadResponse("expected LF after CR".to_string()))
                }
            }
            b'\n' => Err(Error::BadResponse("bare LF in response".to_string())),
            b'(' => {
                self.bump();
                Ok(Token::ListOpen)
            }
            b')' => {
                self.bump();
                Ok(Token::ListClose)
            }
            b'"' => self.read_quoted().await,
            b'{' => self.read_literal().await,
            b if is_atom_byte(b) => self.read_atom().await,
            b => Err(Error::BadResponse(format!("unexpected byte {b:#04x}"))),
        }
    }

    /// Reads an atom: a maximal run of non-special bytes.
    async fn read_atom(&mut self) -> Result<Token> {
        let mut atom = Vec::new();

        loop {
            match self.peek_at(0).await? {
                Some(b) if is_atom_byte(b) => {
                    atom.push(self.bump());
                    if atom.len() > MAX_TOKEN_LENGTH {
                        return Err(Error::BadResponse("atom too long".to_string()));
                    }
                }
                // A delimiter or EOF ends the atom. EOF here is left for
                // the next call so the parser can apply its end-of-stream
                // tolerance after consuming this token.
                _ => break,
            }
        }

        Ok(Token::Atom(atom))
    }

    /// Reads a quoted string, decoding `\"` and `\\` escapes.
    async fn read_quoted(&mut self) -> Result<Token> {
        self.bump(); // opening quote

        let mut payload = Vec::new();

        loop {
            let Some(b) = self.peek_at(0).await? else {
                return Err(Error::BadResponse(
                    "end of stream inside quoted string".to_string(),
                ));
            };
            match b {
                b'"' => {
                    self.bump();
                    break;
                }
                b'\\' => {
                    self.bump();
                    match self.peek_at(0).await? {
                        Some(b'"' | b'\\') => payload.push(self.bump()),
                        Some(c) => {
                            return Err(Error::BadResponse(format!("invalid escape \\{c:#04x}")));
                        }
                        None => {
                            return Err(Error::BadResponse(
                                "end of stream inside quoted string".to_string(),
                            ));
                        }
                    }
                }
                b'\r' | b'\n' => {
                    return Err(Error::BadResponse(
                        "CR/LF inside quoted string".to_string(),
                    ));
                }
                _ => {
                    payload.push(self.bump());
                    if payload.len() > MAX_TOKEN_LENGTH {
                        return Err(Error::BadResponse("quoted string too long".to_string()));
                    }
                }
            }
        }

        Ok(Token::Quoted(payload))
    }

    /// Reads a literal: `{n}` CRLF followed by exactly `n` payload bytes.
    async fn read_literal(&mut self) -> Result<Token> {
        self.bump(); // opening brace

        let mut size: usize = 0;
        let mut digits = 0usize;

        loop {
            match self.peek_at(0).await? {
                Some(b @ b'0'..=b'9') => {
                    self.bump();
                    digits += 1;
                    size = size
                        .checked_mul(10)
                        .and_then(|s| s.checked_add(usize::from(b - b'0')))
                        .ok_or_else(|| Error::BadResponse("literal size overflow".to_string()))?;
                }
                Some(b'}') => {
                    self.bump();
                    break;
                }
                Some(b) => {
                    return Err(Error::BadResponse(format!(
                        "invalid byte {b:#04x} in literal size"
                    )));
                }
                None => return Err(Error::Closed),
            }
        }

        if digits == 0 {
            return Err(Error::BadResponse("empty literal size".to_string()));
        }
        if size > MAX_LITERAL_SIZE {
            return Err(Error::BadResponse(format!(
                "literal too large: {size} bytes"
            )));
        }

        // The size marker is followed by CRLF, then the payload starts.
        if self.peek_at(0).await? != Some(b'\r') || self.peek_at(1).await? != Some(b'\n') {
            return Err(Error::BadResponse(
                "expected CRLF after literal size".to_string(),
            ));
        }
        self.bump();
        self.bump();

        // Byte-counted mode: gather exactly `size` bytes verbatim.
        while self.buf.len() < size {
            if self.fill().await? == 0 {
                return Err(Error::Closed);
            }
        }
        let payload = self.buf.split_to(size).to_vec();

        Ok(Token::Literal(payload))
    }
}

/// Returns true if the byte may appear in an atom.
///
/// Everything except SP, CTL, `(`, `)`, `{`, `"`, CR, and LF. Note that
/// `*`, `+`, `[`, and `]` are atom bytes here: response frames are lexed
/// generically and the response layer inspects leading atoms and
/// bracketed status codes itself.
#[must_use]
pub const fn is_atom_byte(b: u8) -> bool {
    !matches!(b, b' ' | b'(' | b')' | b'{' | b'"' | b'\r' | b'\n') && b >= 0x20 && b != 0x7F
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    fn tokenizer(script: &[u8]) -> Tokenizer<tokio_test::io::Mock> {
        Tokenizer::new(Builder::new().read(script).build())
    }

    #[tokio::test]
    async fn simple_tokens() {
        let mut t = tokenizer(b"* OK ready\r\n");

        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"*".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"OK".to_vec()));
        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Atom(b"ready".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn atom_preserves_case_and_brackets() {
        let mut t = tokenizer(b"TAG1 Ok [UIDVALIDITY 44]\r\n");

        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"TAG1".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"Ok".to_vec()));
        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Atom(b"[UIDVALIDITY".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"44]".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn quoted_string() {
        let mut t = tokenizer(b"\"hello world\"\r\n");

        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Quoted(b"hello world".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn quoted_string_escapes() {
        let mut t = tokenizer(b"\"a \\\"b\\\" c\\\\d\"\r\n");

        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Quoted(b"a \"b\" c\\d".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn crlf_inside_quoted_string_is_rejected() {
        let mut t = tokenizer(b"\"bad\rvalue\"\r\n");

        let err = t.next_token().await.unwrap_err();
        assert!(matches!(err, Error::BadResponse(_)));
    }

    #[tokio::test]
    async fn literal_reads_exact_bytes() {
        let mut t = tokenizer(b"{5}\r\nhello\r\n");

        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Literal(b"hello".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn literal_payload_is_opaque() {
        // CR, LF, NUL, and quote bytes inside the literal are payload,
        // not syntax.
        let mut t = tokenizer(b"{9}\r\na\r\n\x00\"(){b\r\n");

        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Literal(b"a\r\n\x00\"(){b".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn literal_split_across_reads() {
        let mock = Builder::new()
            .read(b"{11}\r\nhello")
            .read(b" world\r\n")
            .build();
        let mut t = Tokenizer::new(mock);

        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Literal(b"hello world".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn lexing_resumes_after_literal() {
        let mut t = tokenizer(b"(RFC822.HEADER {4}\r\nabcd UID 7)\r\n");

        assert_eq!(t.next_token().await.unwrap(), Token::ListOpen);
        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Atom(b"RFC822.HEADER".to_vec())
        );
        assert_eq!(
            t.next_token().await.unwrap(),
            Token::Literal(b"abcd".to_vec())
        );
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"UID".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"7".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::ListClose);
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn parens_abutting_atoms_tokenize_separately() {
        let mut t = tokenizer(b"(A B)C\r\n");

        assert_eq!(t.next_token().await.unwrap(), Token::ListOpen);
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"A".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"B".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::ListClose);
        assert_eq!(t.next_token().await.unwrap(), Token::Atom(b"C".to_vec()));
        assert_eq!(t.next_token().await.unwrap(), Token::Crlf);
    }

    #[tokio::test]
    async fn oversized_literal_is_rejected() {
        let script = format!("{{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mut t = tokenizer(script.as_bytes());

        let err = t.next_token().await.unwrap_err();
        assert!(matches!(err, Error::BadResponse(_)));
    }

    #[test]
    fn atom_byte_table() {
        assert!(is_atom_byte(b'A'));
        assert!(is_atom_byte(b'*'));
        assert!(is_atom_byte(b'+'));
        assert!(is_atom_byte(b'['));
        assert!(is_atom_byte(b']'));
        assert!(is_atom_byte(b'\\'));
        assert!(is_atom_byte(0x80));
        assert!(!is_atom_byte(b' '));
        assert!(!is_atom_byte(b'('));
        assert!(!is_atom_byte(b')'));
        assert!(!is_atom_byte(b'{'));
        assert!(!is_atom_byte(b'"'));
        assert!(!is_atom_byte(b'\r'));
        assert!(!is_atom_byte(b'\n'));
        assert!(!is_atom_byte(0x01));
        assert!(!is_atom_byte(0x7F));
    }
}
