//! Name-prefix search expressed as a lexicographic range.
//!
//! Names are persisted upper-cased, so a typed prefix `p` matches every name
//! in `[P, P + MAX_SENTINEL)` where `P` is `p` upper-cased.

use std::fmt;

/// Highest private-use code point; sorts after every character expected in a
/// vehicle name.
pub const MAX_SENTINEL: char = '\u{f8ff}';

/// Half-open range `[lower, upper)` over upper-cased listing names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRange {
    lower: String,
    upper: String,
}

impl SearchRange {
    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn upper(&self) -> &str {
        &self.upper
    }

    /// Code-point order, which is also the byte order of UTF-8 strings.
    pub fn contains(&self, name: &str) -> bool {
        name >= self.lower.as_str() && name < self.upper.as_str()
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?})", self.lower, self.upper)
    }
}

/// Derives the range for a user-typed prefix.
///
/// An empty prefix means "no filter" and yields `None`; callers fall back to
/// the default newest-first listing.
pub fn range_for(prefix: &str) -> Option<SearchRange> {
    if prefix.is_empty() {
        return None;
    }
    let lower = prefix.to_uppercase();
    let mut upper = lower.clone();
    upper.push(MAX_SENTINEL);
    Some(SearchRange { lower, upper })
}
