//! Top-level error type shared across crates.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("difficulty {requested} exceeds the {max} nibbles of a SHA1 digest")]
    DifficultyOutOfRange { requested: u64, max: u8 },

    #[error("difficulty is not a non-negative integer: {0:?}")]
    InvalidDifficulty(String),
}
