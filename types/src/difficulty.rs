//! Proof-of-work difficulty, measured in leading zero hex nibbles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::digest::DIGEST_LEN;
use crate::TypesError;

/// Required number of leading `0` hex digits in a digest.
///
/// A SHA1 digest has 40 nibbles, so anything above 40 can never be met.
/// Such values are rejected at construction rather than wrapped or clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self((DIGEST_LEN * 2) as u8);

    pub fn new(nibbles: u64) -> Result<Self, TypesError> {
        if nibbles > Self::MAX.0 as u64 {
            return Err(TypesError::DifficultyOutOfRange {
                requested: nibbles,
                max: Self::MAX.0,
            });
        }
        Ok(Self(nibbles as u8))
    }

    /// Number of leading zero nibbles required.
    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_trivial(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Difficulty {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let nibbles: u64 = s
            .trim()
            .parse()
            .map_err(|_| TypesError::InvalidDifficulty(s.to_string()))?;
        Self::new(nibbles)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value as u64)
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        assert_eq!(Difficulty::new(0).unwrap(), Difficulty::ZERO);
        assert_eq!(Difficulty::new(40).unwrap(), Difficulty::MAX);
    }

    #[test]
    fn rejects_above_digest_width() {
        assert_eq!(
            Difficulty::new(41),
            Err(TypesError::DifficultyOutOfRange {
                requested: 41,
                max: 40
            })
        );
    }

    #[test]
    fn parses_decimal() {
        assert_eq!("6".parse::<Difficulty>().unwrap().get(), 6);
        assert_eq!(" 9 ".parse::<Difficulty>().unwrap().get(), 9);
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(matches!(
            "six".parse::<Difficulty>(),
            Err(TypesError::InvalidDifficulty(_))
        ));
        assert!(matches!(
            "-1".parse::<Difficulty>(),
            Err(TypesError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Difficulty>("41").is_err());
        assert_eq!(serde_json::from_str::<Difficulty>("3").unwrap().get(), 3);
    }
}
