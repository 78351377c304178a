//! Delete target extraction.

use std::sync::LazyLock;

use regex::Regex;

static DELETE_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)delete\s+(?:email|mail)\s+(\d+)").expect("valid delete-index regex")
});

/// Which message a delete command points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCommand {
    /// 1-based position in the fetched window.
    Index(usize),
    /// The final message of the fetched window.
    Last,
}

impl DeleteCommand {
    /// Parse "delete email N" / "delete mail N", or "delete last email" /
    /// "delete latest email". The numbered form wins when both appear.
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = DELETE_INDEX.captures(text) {
            // Too many digits to be a position: nothing sensible to point at.
            return caps[1].parse().ok().map(DeleteCommand::Index);
        }

        let t = text.to_lowercase();
        if t.contains("delete last email") || t.contains("delete latest email") {
            return Some(DeleteCommand::Last);
        }
        None
    }

    /// The requested index as shown to the user, if any.
    pub fn requested_index(self) -> Option<usize> {
        match self {
            DeleteCommand::Index(n) => Some(n),
            DeleteCommand::Last => None,
        }
    }

    /// Zero-based position within a window of `len` messages, if in range.
    pub fn resolve(self, len: usize) -> Option<usize> {
        let pos = match self {
            DeleteCommand::Last => len.checked_sub(1)?,
            DeleteCommand::Index(n) => n.checked_sub(1)?,
        };
        (pos < len).then_some(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_forms() {
        assert_eq!(DeleteCommand::parse("delete email 3"), Some(DeleteCommand::Index(3)));
        assert_eq!(DeleteCommand::parse("Delete Mail 12"), Some(DeleteCommand::Index(12)));
        assert_eq!(
            DeleteCommand::parse("could you delete   email 2 please"),
            Some(DeleteCommand::Index(2))
        );
    }

    #[test]
    fn last_forms() {
        assert_eq!(DeleteCommand::parse("delete last email"), Some(DeleteCommand::Last));
        assert_eq!(DeleteCommand::parse("Delete LATEST email now"), Some(DeleteCommand::Last));
    }

    #[test]
    fn unparsable() {
        assert_eq!(DeleteCommand::parse("delete something"), None);
        assert_eq!(DeleteCommand::parse("delete email"), None);
        assert_eq!(DeleteCommand::parse("delete my last email"), None);
        assert_eq!(DeleteCommand::parse("delete email 99999999999999999999999"), None);
    }

    #[test]
    fn numbered_beats_last() {
        assert_eq!(
            DeleteCommand::parse("delete last email, no wait, delete email 4"),
            Some(DeleteCommand::Index(4))
        );
    }

    #[test]
    fn resolve_bounds() {
        assert_eq!(DeleteCommand::Index(1).resolve(5), Some(0));
        assert_eq!(DeleteCommand::Index(5).resolve(5), Some(4));
        assert_eq!(DeleteCommand::Index(6).resolve(5), None);
        assert_eq!(DeleteCommand::Index(0).resolve(5), None);
        assert_eq!(DeleteCommand::Last.resolve(3), Some(2));
        assert_eq!(DeleteCommand::Last.resolve(0), None);
    }
}
