#![no_main]

use libfuzzer_sys::fuzz_target;
use saltpow_protocol::{Command, Field};
use saltpow_types::Profile;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing must never panic, whatever the server sends.
    match Command::parse(line) {
        Ok(Command::Field { field, token }) => {
            assert!(!token.is_empty());
            // Looking up a field in an empty profile either yields a value or
            // reports the missing entry.
            let _ = field.value(&Profile::default());
            // The keyword must round-trip through its display form.
            assert_eq!(Field::from_keyword(&field.to_string()), Some(field));
        }
        Ok(Command::Pow(challenge)) => {
            assert!(challenge.difficulty.get() <= 40);
            assert!(!challenge.prefix.is_empty());
        }
        Ok(_) | Err(_) => {}
    }
});
