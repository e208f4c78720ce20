use proptest::prelude::*;

use saltpow_types::{Difficulty, Digest, TypesError};

proptest! {
    /// Digest roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn digest_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let digest = Digest::new(bytes);
        prop_assert_eq!(digest.as_bytes(), &bytes);
    }

    /// Hex rendering is always 40 lowercase hex characters.
    #[test]
    fn digest_hex_shape(bytes in prop::array::uniform20(0u8..)) {
        let hex = Digest::new(bytes).to_hex();
        prop_assert_eq!(hex.len(), 40);
        prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    /// Every in-range difficulty parses back to itself.
    #[test]
    fn difficulty_parse_in_range(n in 0u64..=40) {
        let parsed: Difficulty = n.to_string().parse().unwrap();
        prop_assert_eq!(parsed.get() as u64, n);
    }

    /// Out-of-range difficulties are rejected, never wrapped.
    #[test]
    fn difficulty_rejects_out_of_range(n in 41u64..u64::MAX) {
        prop_assert!(
            matches!(
                Difficulty::new(n),
                Err(TypesError::DifficultyOutOfRange { .. })
            ),
            "difficulty {} should be rejected",
            n
        );
    }
}
