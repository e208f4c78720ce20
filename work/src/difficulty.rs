//! Leading-zero difficulty checks on SHA1 digests.
//!
//! Two strategies are provided and must always agree:
//! - [`meets_difficulty_hex`] renders the digest as hex and compares the
//!   prefix against `d` zero characters. Simple, allocates.
//! - [`NibbleMask`] masks the first `⌈d/2⌉` bytes (`0xFF` per full byte,
//!   `0xF0` for an odd trailing nibble) and requires every masked bit to be
//!   zero. Used in the hot search loop.

use saltpow_types::digest::DIGEST_LEN;
use saltpow_types::{Difficulty, Digest};

/// Hex-prefix strategy.
pub fn meets_difficulty_hex(digest: &Digest, difficulty: Difficulty) -> bool {
    let zeros = "0".repeat(difficulty.get() as usize);
    digest.to_hex().starts_with(&zeros)
}

/// Nibble-mask strategy.
pub fn meets_difficulty(digest: &Digest, difficulty: Difficulty) -> bool {
    NibbleMask::new(difficulty).matches(digest)
}

/// Count of leading zero hex digits in the digest.
pub fn leading_zero_nibbles(digest: &Digest) -> u8 {
    let mut count = 0u8;
    for byte in digest.as_bytes() {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte & 0xF0 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// Byte mask covering the leading `d` nibbles of a digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NibbleMask {
    bytes: [u8; DIGEST_LEN],
    len: usize,
}

impl NibbleMask {
    pub fn new(difficulty: Difficulty) -> Self {
        let nibbles = difficulty.get() as usize;
        let full = nibbles / 2;
        let mut bytes = [0u8; DIGEST_LEN];
        bytes[..full].fill(0xFF);
        if nibbles % 2 == 1 {
            bytes[full] = 0xF0;
        }
        Self {
            bytes,
            len: nibbles.div_ceil(2),
        }
    }

    /// The masked prefix, `⌈d/2⌉` bytes long.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn matches(&self, digest: &Digest) -> bool {
        digest.as_bytes()[..self.len]
            .iter()
            .zip(self.as_bytes())
            .all(|(byte, mask)| byte & mask == 0)
    }
}

/// Difficulty predicate prepared once per round.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyChecker {
    difficulty: Difficulty,
    mask: NibbleMask,
}

impl DifficultyChecker {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            mask: NibbleMask::new(difficulty),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn check(&self, digest: &Digest) -> bool {
        self.mask.matches(digest)
    }

    pub fn check_hex(&self, digest: &Digest) -> bool {
        meets_difficulty_hex(digest, self.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn difficulty(n: u64) -> Difficulty {
        Difficulty::new(n).unwrap()
    }

    fn digest_with_prefix(prefix: &[u8]) -> Digest {
        let mut bytes = [0xFFu8; DIGEST_LEN];
        bytes[..prefix.len()].copy_from_slice(prefix);
        Digest::new(bytes)
    }

    #[test]
    fn mask_layout() {
        assert_eq!(NibbleMask::new(difficulty(0)).as_bytes(), &[] as &[u8]);
        assert_eq!(NibbleMask::new(difficulty(1)).as_bytes(), &[0xF0]);
        assert_eq!(NibbleMask::new(difficulty(2)).as_bytes(), &[0xFF]);
        assert_eq!(NibbleMask::new(difficulty(5)).as_bytes(), &[0xFF, 0xFF, 0xF0]);
        assert_eq!(NibbleMask::new(Difficulty::MAX).as_bytes().len(), DIGEST_LEN);
    }

    #[test]
    fn zero_difficulty_always_passes() {
        let digest = Digest::new([0xFF; DIGEST_LEN]);
        assert!(meets_difficulty(&digest, Difficulty::ZERO));
        assert!(meets_difficulty_hex(&digest, Difficulty::ZERO));
    }

    #[test]
    fn odd_nibble_boundary() {
        // 0x0F.. has exactly one leading zero nibble.
        let digest = digest_with_prefix(&[0x0F]);
        assert!(meets_difficulty(&digest, difficulty(1)));
        assert!(!meets_difficulty(&digest, difficulty(2)));
        assert_eq!(leading_zero_nibbles(&digest), 1);
    }

    #[test]
    fn strategies_agree_on_edge_digests() {
        let digests = [
            digest_with_prefix(&[]),
            digest_with_prefix(&[0x00]),
            digest_with_prefix(&[0x00, 0x0A]),
            digest_with_prefix(&[0x00, 0x00, 0x01]),
            digest_with_prefix(&[0x10]),
            Digest::ZERO,
        ];
        for digest in &digests {
            for d in 0..=40 {
                let d = difficulty(d);
                assert_eq!(
                    meets_difficulty(digest, d),
                    meets_difficulty_hex(digest, d),
                    "strategies disagree for {digest} at {d}"
                );
            }
        }
    }

    #[test]
    fn all_zero_digest_meets_max() {
        assert!(meets_difficulty(&Digest::ZERO, Difficulty::MAX));
        assert_eq!(leading_zero_nibbles(&Digest::ZERO), 40);
    }

    #[test]
    fn checker_uses_both_strategies_consistently() {
        let checker = DifficultyChecker::new(difficulty(3));
        let pass = digest_with_prefix(&[0x00, 0x0C]);
        let fail = digest_with_prefix(&[0x00, 0x1C]);
        assert!(checker.check(&pass) && checker.check_hex(&pass));
        assert!(!checker.check(&fail) && !checker.check_hex(&fail));
    }
}
