//! Per-page outcomes recorded by workers

use std::collections::BTreeSet;

/// 1-based catalog page number
pub type PageNumber = u32;

/// Unordered set of identifiers found on a page
///
/// Kept as a `BTreeSet` so every flatten is deterministic.
pub type IdentifierSet = BTreeSet<String>;

/// What processing a page produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Identifiers found on the page (possibly none, including hard failures)
    Items(IdentifierSet),

    /// The page repeated the first page's content; the catalog has ended
    RepeatSignal,
}

impl PageOutcome {
    /// Builds an `Items` outcome from an extracted sequence
    pub fn from_sequence<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Items(identifiers.into_iter().map(Into::into).collect())
    }

    /// Outcome recorded for a page without identifiers
    pub fn empty() -> Self {
        Self::Items(IdentifierSet::new())
    }

    /// Returns the identifiers, or None for a repeat signal
    pub fn items(&self) -> Option<&IdentifierSet> {
        match self {
            Self::Items(items) => Some(items),
            Self::RepeatSignal => None,
        }
    }

    pub fn is_repeat(&self) -> bool {
        matches!(self, Self::RepeatSignal)
    }
}
