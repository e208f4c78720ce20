//! SHA1 hashing for challenge candidates and field replies.

use saltpow_types::Digest;
use sha1::{Digest as _, Sha1};

/// Compute the SHA1 digest of arbitrary data.
pub fn sha1(data: &[u8]) -> Digest {
    let mut hasher = Sha1::new();
    hasher.update(data);
    Digest::new(hasher.finalize().into())
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha1_multi(parts: &[&[u8]]) -> Digest {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part);
    }
    Digest::new(hasher.finalize().into())
}

/// Authenticator for a field reply: lowercase hex of `SHA1(authdata ‖ token)`.
pub fn field_reply(authdata: &str, token: &str) -> String {
    hex::encode(sha1_multi(&[authdata.as_bytes(), token.as_bytes()]).as_bytes())
}

/// SHA1 state with a fixed prefix already absorbed.
///
/// Every call to [`digest`](Self::digest) starts from a copy of the cached
/// state, so calls never observe each other's suffixes. The output is
/// identical to `sha1(prefix ‖ suffix)`.
#[derive(Clone)]
pub struct PrefixHasher {
    state: Sha1,
    prefix_len: usize,
}

impl PrefixHasher {
    pub fn new(prefix: &[u8]) -> Self {
        let mut state = Sha1::new();
        state.update(prefix);
        Self {
            state,
            prefix_len: prefix.len(),
        }
    }

    /// Digest of the cached prefix followed by `suffix`.
    pub fn digest(&self, suffix: &[u8]) -> Digest {
        let mut hasher = self.state.clone();
        hasher.update(suffix);
        Digest::new(hasher.finalize().into())
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }
}

impl std::fmt::Debug for PrefixHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixHasher")
            .field("prefix_len", &self.prefix_len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vectors() {
        assert_eq!(
            sha1(b"").to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            sha1(b"abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            sha1(b"l").to_hex(),
            "07c342be6e560e7f43842e2e21b774e61d85f047"
        );
    }

    #[test]
    fn sha1_multi_equivalent() {
        let single = sha1(b"helloworld");
        let multi = sha1_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn prefix_hasher_matches_one_shot() {
        let hasher = PrefixHasher::new(b"abc123");
        for suffix in [&b"x"[..], b"another-suffix", b""] {
            let mut full = b"abc123".to_vec();
            full.extend_from_slice(suffix);
            assert_eq!(hasher.digest(suffix), sha1(&full));
        }
    }

    #[test]
    fn prefix_hasher_calls_are_isolated() {
        let hasher = PrefixHasher::new(b"prefix");
        let first = hasher.digest(b"one");
        let _ = hasher.digest(b"two");
        assert_eq!(hasher.digest(b"one"), first);
    }

    #[test]
    fn field_reply_is_hex_sha1_of_concatenation() {
        assert_eq!(
            field_reply("abc123", "NAME"),
            "87702fc1bb7c04d4ab07032142e8546e7bfead0a"
        );
    }
}
