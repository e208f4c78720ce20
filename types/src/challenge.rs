//! Proof-of-work challenge issued by the server.

use serde::{Deserialize, Serialize};

use crate::{Difficulty, TypesError};

/// A single solving round: find a suffix so that `SHA1(prefix + suffix)` has
/// at least `difficulty` leading zero hex digits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Server-supplied authentication data, hashed as the fixed prefix.
    pub prefix: String,
    pub difficulty: Difficulty,
}

impl Challenge {
    pub fn new(prefix: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            prefix: prefix.into(),
            difficulty,
        }
    }

    /// Build a challenge from the raw `POW` arguments.
    pub fn parse(prefix: &str, difficulty: &str) -> Result<Self, TypesError> {
        Ok(Self::new(prefix, difficulty.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_arguments() {
        let challenge = Challenge::parse("abc123", "3").unwrap();
        assert_eq!(challenge.prefix, "abc123");
        assert_eq!(challenge.difficulty.get(), 3);
    }

    #[test]
    fn parse_rejects_bad_difficulty() {
        assert!(Challenge::parse("abc123", "x").is_err());
    }
}
