//! Fundamental types for the saltpow client.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! SHA1 digests, difficulty levels, proof-of-work challenges and the contact profile
//! used to answer the server's field requests.

pub mod challenge;
pub mod difficulty;
pub mod digest;
pub mod error;
pub mod profile;

pub use challenge::Challenge;
pub use difficulty::Difficulty;
pub use digest::Digest;
pub use error::TypesError;
pub use profile::Profile;
