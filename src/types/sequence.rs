//! Sequence sets for message ranges.

/// Upper bound of a message range.
///
/// `Star` is the wire `*`, meaning the highest id in the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// A concrete message id.
    Num(u32),
    /// The highest id in the mailbox (`*`).
    Star,
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Star => write!(f, "*"),
        }
    }
}

impl From<u32> for Bound {
    fn from(n: u32) -> Self {
        Self::Num(n)
    }
}

/// Set of message ids or UIDs for id-bearing commands.
///
/// Renders to the wire forms `n`, `n:m`, `n:*`, and `a,b,c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single message id.
    Single(u32),
    /// Inclusive range from an id to a bound.
    Range(u32, Bound),
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a single-id set.
    #[must_use]
    pub const fn single(n: u32) -> Self {
        Self::Single(n)
    }

    /// Creates an inclusive range.
    #[must_use]
    pub fn range(from: u32, to: impl Into<Bound>) -> Self {
        Self::Range(from, to.into())
    }

    /// Creates a range open towards the end of the mailbox (`from:*`).
    #[must_use]
    pub const fn starting_at(from: u32) -> Self {
        Self::Range(from, Bound::Star)
    }
}

impl From<u32> for SequenceSet {
    fn from(n: u32) -> Self {
        Self::Single(n)
    }
}

impl From<&[u32]> for SequenceSet {
    /// A one-element slice becomes the range `n:n`; longer slices become
    /// a comma-joined set.
    fn from(ids: &[u32]) -> Self {
        match ids {
            [n] => Self::Range(*n, Bound::Num(*n)),
            _ => Self::Set(ids.iter().map(|&n| Self::Single(n)).collect()),
        }
    }
}

impl<const N: usize> From<[u32; N]> for SequenceSet {
    fn from(ids: [u32; N]) -> Self {
        ids.as_slice().into()
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(from, to) => write!(f, "{from}:{to}"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_single() {
        assert_eq!(SequenceSet::single(42).to_string(), "42");
        assert_eq!(SequenceSet::from(7).to_string(), "7");
    }

    #[test]
    fn display_range() {
        assert_eq!(SequenceSet::range(1, 100).to_string(), "1:100");
        assert_eq!(SequenceSet::range(50, Bound::Star).to_string(), "50:*");
    }

    #[test]
    fn display_open_range() {
        assert_eq!(SequenceSet::starting_at(50).to_string(), "50:*");
    }

    #[test]
    fn display_set() {
        let set = SequenceSet::Set(vec![
            SequenceSet::single(1),
            SequenceSet::range(5, 10),
            SequenceSet::starting_at(20),
        ]);
        assert_eq!(set.to_string(), "1,5:10,20:*");
    }

    #[test]
    fn one_element_slice_becomes_closed_range() {
        let set = SequenceSet::from([4]);
        assert_eq!(set.to_string(), "4:4");
    }

    #[test]
    fn multi_element_slice_becomes_comma_set() {
        let set = SequenceSet::from([1, 2, 5]);
        assert_eq!(set.to_string(), "1,2,5");
    }
}
