/// Ledger status of a processed page
///
/// The status is richer than [`PageOutcome`](super::PageOutcome): a page that
/// failed to load and a page that legitimately listed nothing both merge as an
/// empty identifier set, but the ledger keeps them apart.
use std::fmt;

/// Represents how the processing of a single page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageStatus {
    /// Page rendered and yielded at least one identifier
    Loaded,

    /// Page rendered but yielded no identifiers
    Empty,

    /// Both navigation attempts failed
    Failed,

    /// Page served the first page's content again
    Repeat,
}

impl PageStatus {
    /// Returns true if the page contributed identifiers
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Returns true if the page contributed nothing to the merge
    pub fn is_empty_outcome(&self) -> bool {
        matches!(self, Self::Empty | Self::Failed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Empty => "empty",
            Self::Failed => "failed",
            Self::Repeat => "repeat",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "loaded" => Some(Self::Loaded),
            "empty" => Some(Self::Empty),
            "failed" => Some(Self::Failed),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }

    /// Returns all possible page statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Loaded, Self::Empty, Self::Failed, Self::Repeat]
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(PageStatus::Loaded.is_success());

        assert!(!PageStatus::Empty.is_success());
        assert!(!PageStatus::Failed.is_success());
        assert!(!PageStatus::Repeat.is_success());
    }

    #[test]
    fn test_failed_and_empty_merge_the_same() {
        assert!(PageStatus::Empty.is_empty_outcome());
        assert!(PageStatus::Failed.is_empty_outcome());

        assert!(!PageStatus::Loaded.is_empty_outcome());
        assert!(!PageStatus::Repeat.is_empty_outcome());
    }

    #[test]
    fn test_from_db_string() {
        assert_eq!(PageStatus::from_db_string("loaded"), Some(PageStatus::Loaded));
        assert_eq!(PageStatus::from_db_string("failed"), Some(PageStatus::Failed));
        assert_eq!(PageStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_roundtrip_db_string() {
        for status in PageStatus::all_statuses() {
            let parsed = PageStatus::from_db_string(status.to_db_string());
            assert_eq!(Some(status), parsed, "Failed roundtrip for {:?}", status);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageStatus::Repeat), "repeat");
        assert_eq!(format!("{}", PageStatus::Empty), "empty");
    }
}
