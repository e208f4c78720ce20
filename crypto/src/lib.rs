//! Hashing primitives for the saltpow client.
//!
//! - **SHA1** one-shot and multi-part hashing
//! - **Cached prefix state** so a fixed challenge prefix is absorbed once per round
//! - **Field replies**: `hex(SHA1(authdata ‖ token))` authenticating profile answers

pub mod hash;

pub use hash::{field_reply, sha1, sha1_multi, PrefixHasher};
