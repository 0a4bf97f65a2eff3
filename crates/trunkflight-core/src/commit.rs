//! Plain-value projection of a commit.

use serde::{Deserialize, Serialize};

/// Number of hex characters kept in [`SimpleCommit::short_hash`].
pub const SHORT_HASH_LEN: usize = 7;

/// A commit copied out of the object database.
///
/// Holds owned data only, so it stays valid after the repository handle it
/// was read from is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleCommit {
    pub short_hash: String,
    pub short_message: String,
}

impl SimpleCommit {
    /// Builds a projection from a full hex id and a message.
    ///
    /// Only the first line of `message` is kept.
    pub fn new(full_hash: &str, message: &str) -> Self {
        let short_hash = full_hash.chars().take(SHORT_HASH_LEN).collect();
        let short_message = message.lines().next().unwrap_or("").trim().to_string();
        Self {
            short_hash,
            short_message,
        }
    }
}

impl std::fmt::Display for SimpleCommit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.short_hash, self.short_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_hash_and_message() {
        let c = SimpleCommit::new(
            "0123456789abcdef0123456789abcdef01234567",
            "Fix the widget\n\nLonger body text.",
        );
        assert_eq!(c.short_hash, "0123456");
        assert_eq!(c.short_message, "Fix the widget");
        assert_eq!(c.to_string(), "0123456 Fix the widget");
    }

    #[test]
    fn empty_message() {
        let c = SimpleCommit::new("abc", "");
        assert_eq!(c.short_hash, "abc");
        assert_eq!(c.short_message, "");
    }
}
