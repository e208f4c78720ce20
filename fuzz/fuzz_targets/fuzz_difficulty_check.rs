#![no_main]

use libfuzzer_sys::fuzz_target;
use saltpow_types::{Difficulty, Digest};
use saltpow_work::{leading_zero_nibbles, meets_difficulty, meets_difficulty_hex};

fuzz_target!(|data: &[u8]| {
    // 20 digest bytes followed by one difficulty byte.
    if data.len() < 21 {
        return;
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&data[..20]);
    let digest = Digest::new(bytes);

    let Ok(difficulty) = Difficulty::new(u64::from(data[20])) else {
        return;
    };

    // Both strategies must agree with each other and with the zero count.
    let mask = meets_difficulty(&digest, difficulty);
    assert_eq!(mask, meets_difficulty_hex(&digest, difficulty));
    assert_eq!(mask, leading_zero_nibbles(&digest) >= difficulty.get());
});
