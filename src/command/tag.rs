//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

use std::sync::atomic::{AtomicU32, Ordering};

/// Tag generator for IMAP commands.
///
/// Generates unique sequential tags `TAG1`, `TAG2`, … for the lifetime
/// of a connection.
#[derive(Debug)]
pub struct TagGenerator {
    counter: AtomicU32,
}

impl TagGenerator {
    /// Creates a new tag generator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("TAG{}", n + 1)
    }

    /// Returns how many tags have been generated.
    #[must_use]
    pub fn issued(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_tags() {
        let generator = TagGenerator::new();
        assert_eq!(generator.next(), "TAG1");
        assert_eq!(generator.next(), "TAG2");
        assert_eq!(generator.next(), "TAG3");
    }

    #[test]
    fn issued_count() {
        let generator = TagGenerator::new();
        assert_eq!(generator.issued(), 0);
        let _ = generator.next();
        let _ = generator.next();
        assert_eq!(generator.issued(), 2);
    }

    #[test]
    fn uniqueness() {
        let generator = TagGenerator::new();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..10_000 {
            let tag = generator.next();
            assert!(seen.insert(tag), "duplicate tag generated");
        }
    }
}
