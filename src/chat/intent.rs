//! Keyword intent classification for chat commands.

use std::fmt;

/// The action a chat utterance asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    List,
    Delete,
    Reply,
    Digest,
    Smalltalk,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::List => "list",
            Intent::Delete => "delete",
            Intent::Reply => "reply",
            Intent::Digest => "digest",
            Intent::Smalltalk => "smalltalk",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify an utterance by case-insensitive substring match.
///
/// Checks run in a fixed order: delete, digest, reply, then "last" together
/// with "email" for list. Anything else is smalltalk. "delete the digest
/// email" is therefore a delete, and "reply to the delete notice" is too.
pub fn classify(text: &str) -> Intent {
    let t = text.to_lowercase();

    if t.contains("delete") {
        Intent::Delete
    } else if t.contains("digest") {
        Intent::Digest
    } else if t.contains("reply") {
        Intent::Reply
    } else if t.contains("last") && t.contains("email") {
        Intent::List
    } else {
        Intent::Smalltalk
    }
}
