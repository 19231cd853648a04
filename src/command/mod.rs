//! IMAP command model and wire encoding.
//!
//! A command is a name plus an ordered list of argument tokens. Encoding
//! produces one or more wire lines: any argument that must travel as a
//! synchronizing literal ends its line with the `{n}` marker, and the
//! connection waits for the server's continuation before sending the
//! next line.

mod encode;
mod tag;

pub use tag::TagGenerator;

use encode::{needs_literal, write_string};

/// One argument token of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Wire-ready word emitted verbatim: keywords, sequence sets,
    /// flags, pre-encoded payloads.
    Atom(String),
    /// String emitted bare, quoted, or as a literal depending on its
    /// bytes.
    String(Vec<u8>),
    /// Parenthesized list, encoded recursively.
    List(Vec<Arg>),
    /// Payload that always travels as a synchronizing literal.
    Literal(Vec<u8>),
}

impl Arg {
    /// Convenience constructor for an atom argument.
    pub fn atom(s: impl Into<String>) -> Self {
        Self::Atom(s.into())
    }

    /// Convenience constructor for a string argument.
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        Self::String(s.into())
    }
}

/// One encoded wire line.
///
/// `ends_with_literal` marks lines whose tail is a `{n}` marker; the
/// writer must await a `+` continuation before sending the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The raw bytes including the trailing CRLF.
    pub bytes: Vec<u8>,
    /// Whether this line announces a literal and requires continuation.
    pub ends_with_literal: bool,
}

/// An IMAP command ready for encoding.
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    args: Vec<Arg>,
}

impl Command {
    /// Creates a command with the given name (e.g. `FETCH`, `UID FETCH`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument token.
    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Appends a verbatim word.
    #[must_use]
    pub fn atom(self, s: impl Into<String>) -> Self {
        self.arg(Arg::Atom(s.into()))
    }

    /// Appends a string that is quoted or sent as a literal as needed.
    #[must_use]
    pub fn string(self, s: impl Into<Vec<u8>>) -> Self {
        self.arg(Arg::String(s.into()))
    }

    /// Appends a payload that always goes as a synchronizing literal.
    #[must_use]
    pub fn literal(self, payload: impl Into<Vec<u8>>) -> Self {
        self.arg(Arg::Literal(payload.into()))
    }

    /// Appends a parenthesized list.
    #[must_use]
    pub fn list(self, items: Vec<Arg>) -> Self {
        self.arg(Arg::List(items))
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encodes the command into wire lines under the given tag.
    ///
    /// An empty tag omits the tag prefix (used for `DONE`, which is sent
    /// while an IDLE tag is still outstanding).
    #[must_use]
    pub fn encode(&self, tag: &str) -> Vec<Line> {
        let mut encoder = Encoder::default();

        if !tag.is_empty() {
            encoder.current.extend_from_slice(tag.as_bytes());
            encoder.current.push(b' ');
        }
        encoder.current.extend_from_slice(self.name.as_bytes());

        for arg in &self.args {
            encoder.current.push(b' ');
            encoder.write_arg(arg);
        }

        encoder.finish()
    }
}

#[derive(Default)]
struct Encoder {
    lines: Vec<Line>,
    current: Vec<u8>,
}

impl Encoder {
    fn write_arg(&mut self, arg: &Arg) {
        match arg {
            Arg::Atom(s) => self.current.extend_from_slice(s.as_bytes()),
            Arg::String(s) => {
                if needs_literal(s) {
                    self.write_literal(s);
                } else {
                    write_string(&mut self.current, s);
                }
            }
            Arg::Literal(s) => self.write_literal(s),
            Arg::List(items) => {
                self.current.push(b'(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.current.push(b' ');
                    }
                    self.write_arg(item);
                }
                self.current.push(b')');
            }
        }
    }

    /// Closes the current line with a `{n}` marker and opens the next
    /// line with the raw payload.
    fn write_literal(&mut self, payload: &[u8]) {
        self.current
            .extend_from_slice(format!("{{{}}}\r\n", payload.len()).as_bytes());
        self.lines.push(Line {
            bytes: std::mem::take(&mut self.current),
            ends_with_literal: true,
        });
        self.current.extend_from_slice(payload);
    }

    fn finish(mut self) -> Vec<Line> {
        self.current.extend_from_slice(b"\r\n");
        self.lines.push(Line {
            bytes: self.current,
            ends_with_literal: false,
        });
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_line(cmd: &Command, tag: &str) -> Vec<u8> {
        let lines = cmd.encode(tag);
        assert_eq!(lines.len(), 1, "expected a single wire line");
        lines.into_iter().next().unwrap().bytes
    }

    #[test]
    fn bare_command() {
        let cmd = Command::new("CAPABILITY");
        assert_eq!(single_line(&cmd, "TAG1"), b"TAG1 CAPABILITY\r\n");
    }

    #[test]
    fn login_with_bare_args() {
        let cmd = Command::new("LOGIN").string("user").string("pass");
        assert_eq!(single_line(&cmd, "TAG1"), b"TAG1 LOGIN user pass\r\n");
    }

    #[test]
    fn login_quotes_spaces() {
        let cmd = Command::new("LOGIN")
            .string("user@example.com")
            .string("pass word");
        assert_eq!(
            single_line(&cmd, "TAG1"),
            b"TAG1 LOGIN user@example.com \"pass word\"\r\n"
        );
    }

    #[test]
    fn crlf_in_arg_becomes_literal_lines() {
        let cmd = Command::new("LOGIN").string("user").string("pa\r\nss");
        let lines = cmd.encode("TAG2");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].bytes, b"TAG2 LOGIN user {6}\r\n");
        assert!(lines[0].ends_with_literal);
        assert_eq!(lines[1].bytes, b"pa\r\nss\r\n");
        assert!(!lines[1].ends_with_literal);
    }

    #[test]
    fn forced_literal_with_trailing_args() {
        let cmd = Command::new("APPEND")
            .string("Drafts")
            .literal(b"Subject: hi\r\n\r\nbody".to_vec());
        let lines = cmd.encode("TAG3");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].bytes, b"TAG3 APPEND Drafts {19}\r\n");
        assert!(lines[0].ends_with_literal);
        assert_eq!(lines[1].bytes, b"Subject: hi\r\n\r\nbody\r\n");
    }

    #[test]
    fn list_args_render_parenthesized() {
        let cmd = Command::new("STORE")
            .atom("1:3")
            .atom("+FLAGS.SILENT")
            .list(vec![Arg::atom("\\Seen"), Arg::atom("\\Flagged")]);
        assert_eq!(
            single_line(&cmd, "TAG4"),
            b"TAG4 STORE 1:3 +FLAGS.SILENT (\\Seen \\Flagged)\r\n"
        );
    }

    #[test]
    fn nested_lists_recurse() {
        let cmd = Command::new("ID").list(vec![
            Arg::string("name"),
            Arg::string("imap-engine"),
            Arg::List(vec![Arg::atom("a"), Arg::atom("b")]),
        ]);
        assert_eq!(
            single_line(&cmd, "TAG5"),
            b"TAG5 ID (name imap-engine (a b))\r\n"
        );
    }

    #[test]
    fn done_has_no_tag() {
        let cmd = Command::new("DONE");
        assert_eq!(single_line(&cmd, ""), b"DONE\r\n");
    }

    #[test]
    fn literal_inside_list_splits_lines() {
        let cmd = Command::new("X").list(vec![Arg::string("ok"), Arg::string(b"a\rb".to_vec())]);
        let lines = cmd.encode("TAG6");

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].bytes, b"TAG6 X (ok {3}\r\n");
        assert!(lines[0].ends_with_literal);
        assert_eq!(lines[1].bytes, b"a\rb)\r\n");
    }
}
