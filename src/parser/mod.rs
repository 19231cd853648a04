//! IMAP response value parser.
//!
//! Groups the tokenizer's output into structured values: scalars and
//! arbitrarily nested lists, one response unit per top-level CRLF.

pub mod lexer;

use bytes::BytesMut;
use tokio::io::AsyncRead;

use crate::{Error, Result};

use lexer::{Token, Tokenizer};

/// A parsed response value.
///
/// `Atom` preserves the server's bytes verbatim (case included);
/// `String` is the opaque payload of a quoted string or literal; `List`
/// nests without depth limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Bare atom bytes.
    Atom(Vec<u8>),
    /// Quoted-string or literal payload.
    String(Vec<u8>),
    /// Parenthesized list.
    List(Vec<Value>),
}

impl Value {
    /// Returns the scalar payload bytes, `None` for lists.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(b) | Self::String(b) => Some(b),
            Self::List(_) => None,
        }
    }

    /// Returns the scalar payload as UTF-8, if it is valid.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Parses the scalar payload as a decimal number.
    #[must_use]
    pub fn to_u32(&self) -> Option<u32> {
        self.as_str().and_then(|s| s.parse().ok())
    }

    /// Parses the scalar payload as a decimal number (64-bit).
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        self.as_str().and_then(|s| s.parse().ok())
    }

    /// Returns the list elements, `None` for scalars.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Case-insensitive comparison of a scalar against a keyword.
    #[must_use]
    pub fn eq_atom(&self, keyword: &str) -> bool {
        self.as_bytes()
            .is_some_and(|b| b.eq_ignore_ascii_case(keyword.as_bytes()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Atom(s.as_bytes().to_vec())
    }
}

/// Recursive-descent parser over a tokenizer.
pub struct Parser<S> {
    tokenizer: Tokenizer<S>,
}

impl<S> Parser<S> {
    /// Creates a parser reading from the given stream.
    pub fn new(stream: S) -> Self {
        Self {
            tokenizer: Tokenizer::new(stream),
        }
    }

    /// Returns true if undecoded bytes are buffered.
    #[must_use]
    pub fn has_buffered(&self) -> bool {
        self.tokenizer.has_buffered()
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.tokenizer.get_ref()
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.tokenizer.get_mut()
    }

    /// Splits into the stream and unconsumed readahead.
    pub fn into_parts(self) -> (S, BytesMut) {
        self.tokenizer.into_parts()
    }

    /// Rebuilds from a stream and leftover readahead bytes.
    pub fn from_parts(stream: S, buf: BytesMut) -> Self {
        Self {
            tokenizer: Tokenizer::from_parts(stream, buf),
        }
    }
}

impl<S> Parser<S>
where
    S: AsyncRead + Unpin,
{
    /// Reads one full response frame: all values up to the next
    /// top-level CRLF.
    ///
    /// A `)` without a matching `(` is a grammar error. A missing `)` at
    /// end of stream promotes the outstanding lists to the result, which
    /// keeps truncating servers readable.
    pub async fn read_frame(&mut self) -> Result<Vec<Value>> {
        let mut current = Vec::new();
        let mut stack: Vec<Vec<Value>> = Vec::new();

        loop {
            match self.tokenizer.next_token().await? {
                Token::Atom(b) => current.push(Value::Atom(b)),
                Token::Quoted(b) | Token::Literal(b) => current.push(Value::String(b)),
                Token::ListOpen => stack.push(std::mem::take(&mut current)),
                Token::ListClose => {
                    let Some(parent) = stack.pop() else {
                        return Err(Error::BadResponse("unbalanced )".to_string()));
                    };
                    let list = std::mem::replace(&mut current, parent);
                    current.push(Value::List(list));
                }
                // CRLF terminates the frame only at the top level;
                // inside a list it is server noise and skipped.
                Token::Crlf => {
                    if stack.is_empty() {
                        break;
                    }
                }
                Token::Eof => {
                    while let Some(parent) = stack.pop() {
                        let list = std::mem::replace(&mut current, parent);
                        current.push(Value::List(list));
                    }
                    if current.is_empty() {
                        return Err(Error::Closed);
                    }
                    break;
                }
            }
        }

        Ok(current)
    }

    /// Reads one frame and unwraps a lone scalar.
    ///
    /// A single value followed by CRLF comes back as that value; a
    /// sequence of values comes back as a flat list.
    pub async fn parse(&mut self) -> Result<Value> {
        let mut frame = self.read_frame().await?;
        Ok(if frame.len() == 1 {
            frame.swap_remove(0)
        } else {
            Value::List(frame)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::connection::FakeStream;

    use super::*;

    fn parser(script: &[u8]) -> Parser<FakeStream> {
        Parser::new(FakeStream::new(script))
    }

    fn atoms(words: &[&str]) -> Vec<Value> {
        words.iter().map(|w| Value::from(*w)).collect()
    }

    #[tokio::test]
    async fn greeting_parses_to_flat_list() {
        let mut p = parser(b"* OK Dovecot ready.\r\n");

        let value = p.parse().await.unwrap();
        assert_eq!(value, Value::List(atoms(&["*", "OK", "Dovecot", "ready."])));
    }

    #[tokio::test]
    async fn lone_quoted_string_is_not_wrapped() {
        let mut p = parser(b"\"Hello, world!\"\r\n");

        let value = p.parse().await.unwrap();
        assert_eq!(value, Value::String(b"Hello, world!".to_vec()));
    }

    #[tokio::test]
    async fn lone_literal_is_not_wrapped() {
        let mut p = parser(b"{5}\r\nHello");

        let value = p.parse().await.unwrap();
        assert_eq!(value, Value::String(b"Hello".to_vec()));
    }

    #[tokio::test]
    async fn nested_lists() {
        let mut p = parser(b"(A (B C) D)\r\n");

        let value = p.parse().await.unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::from("A"),
                Value::List(atoms(&["B", "C"])),
                Value::from("D"),
            ])
        );
    }

    #[tokio::test]
    async fn deeply_nested_lists() {
        let mut p = parser(b"(((X)))\r\n");

        let value = p.parse().await.unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::List(vec![Value::List(vec![Value::from("X")])])])
        );
    }

    #[tokio::test]
    async fn unmatched_close_is_an_error() {
        let mut p = parser(b"A) B\r\n");

        let err = p.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::BadResponse(_)));
    }

    #[tokio::test]
    async fn missing_close_at_eof_promotes_stack() {
        let mut p = parser(b"(A (B C");

        let frame = p.read_frame().await.unwrap();
        assert_eq!(
            frame,
            vec![Value::List(vec![
                Value::from("A"),
                Value::List(atoms(&["B", "C"])),
            ])]
        );
    }

    #[tokio::test]
    async fn eof_with_no_data_is_closed() {
        let mut p = parser(b"");

        let err = p.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::Closed));
    }

    #[tokio::test]
    async fn frame_with_embedded_literal() {
        let mut p = parser(b"* 2 FETCH (RFC822.HEADER {4}\r\nabcd)\r\n");

        let frame = p.read_frame().await.unwrap();
        assert_eq!(
            frame,
            vec![
                Value::from("*"),
                Value::from("2"),
                Value::from("FETCH"),
                Value::List(vec![
                    Value::from("RFC822.HEADER"),
                    Value::String(b"abcd".to_vec()),
                ]),
            ]
        );
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::from("17").to_u32(), Some(17));
        assert!(Value::from("UID").eq_atom("uid"));
        assert!(Value::String(b"UID".to_vec()).eq_atom("uid"));
        assert!(!Value::List(Vec::new()).eq_atom("uid"));
        assert_eq!(Value::from("x").as_list(), None);
    }
}
