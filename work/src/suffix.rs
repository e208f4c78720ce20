//! Random candidate suffixes.
//!
//! The server accepts any UTF-8 suffix except newline, carriage return, tab
//! and space. Both alphabets here are plain ASCII subsets that exclude those
//! bytes, so every generated suffix is valid UTF-8 and safe to send as a line.

use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::WorkError;

/// Bytes that may never appear in a suffix.
pub const FORBIDDEN_BYTES: [u8; 4] = [b'\n', b'\r', b'\t', b' '];

const ALPHANUMERIC: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Every printable ASCII byte from `!` (0x21) to `~` (0x7E).
const PRINTABLE: [u8; 94] = printable_ascii();

const fn printable_ascii() -> [u8; 94] {
    let mut out = [0u8; 94];
    let mut i = 0;
    while i < out.len() {
        out[i] = 0x21 + i as u8;
        i += 1;
    }
    out
}

/// Character set suffixes are drawn from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixAlphabet {
    /// `[0-9a-zA-Z]`.
    #[default]
    Alphanumeric,
    /// `0x21..=0x7E`, denser entropy per byte.
    Printable,
}

impl SuffixAlphabet {
    pub fn symbols(&self) -> &'static [u8] {
        match self {
            Self::Alphanumeric => ALPHANUMERIC,
            Self::Printable => &PRINTABLE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alphanumeric => "alphanumeric",
            Self::Printable => "printable",
        }
    }
}

impl FromStr for SuffixAlphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alphanumeric" => Ok(Self::Alphanumeric),
            "printable" => Ok(Self::Printable),
            other => Err(format!("unknown suffix alphabet: {other}")),
        }
    }
}

/// Inclusive range of suffix lengths; a length is picked uniformly per candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuffixLength {
    min: usize,
    max: usize,
}

impl SuffixLength {
    pub fn range(min: usize, max: usize) -> Result<Self, WorkError> {
        if min == 0 || min > max {
            return Err(WorkError::InvalidSuffixLength { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn fixed(len: usize) -> Result<Self, WorkError> {
        Self::range(len, len)
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for SuffixLength {
    fn default() -> Self {
        Self { min: 5, max: 64 }
    }
}

/// Non-cryptographic suffix source.
///
/// Seeded either from the operating system's entropy source or from an
/// explicit seed (tests, reproducible benchmarks).
#[derive(Debug)]
pub struct SuffixGenerator {
    rng: SmallRng,
    alphabet: SuffixAlphabet,
    length: SuffixLength,
}

impl SuffixGenerator {
    pub fn from_entropy(alphabet: SuffixAlphabet, length: SuffixLength) -> Result<Self, WorkError> {
        let rng = SmallRng::try_from_os_rng().map_err(|e| WorkError::RandomSource(e.to_string()))?;
        Ok(Self {
            rng,
            alphabet,
            length,
        })
    }

    pub fn from_seed(seed: u64, alphabet: SuffixAlphabet, length: SuffixLength) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            alphabet,
            length,
        }
    }

    pub fn length(&self) -> SuffixLength {
        self.length
    }

    fn next_len(&mut self) -> usize {
        if self.length.min == self.length.max {
            self.length.min
        } else {
            self.rng.random_range(self.length.min..=self.length.max)
        }
    }

    /// Overwrite `buf` with symbols from the alphabet.
    pub fn fill(&mut self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf);
        let symbols = self.alphabet.symbols();
        for byte in buf.iter_mut() {
            *byte = symbols[*byte as usize % symbols.len()];
        }
    }

    /// Replace the contents of `buf` with a fresh suffix, reusing its allocation.
    pub fn next_into(&mut self, buf: &mut Vec<u8>) {
        let len = self.next_len();
        buf.clear();
        buf.resize(len, 0);
        self.fill(buf);
    }

    pub fn next_suffix(&mut self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length.max);
        self.next_into(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabets_exclude_forbidden_bytes() {
        for alphabet in [SuffixAlphabet::Alphanumeric, SuffixAlphabet::Printable] {
            assert!(alphabet
                .symbols()
                .iter()
                .all(|b| !FORBIDDEN_BYTES.contains(b)));
        }
    }

    #[test]
    fn printable_spans_bang_to_tilde() {
        let symbols = SuffixAlphabet::Printable.symbols();
        assert_eq!(symbols.first(), Some(&b'!'));
        assert_eq!(symbols.last(), Some(&b'~'));
    }

    #[test]
    fn generated_suffixes_have_no_forbidden_bytes() {
        for alphabet in [SuffixAlphabet::Alphanumeric, SuffixAlphabet::Printable] {
            for n in [1, 5, 32, 64] {
                let mut generator =
                    SuffixGenerator::from_seed(n as u64, alphabet, SuffixLength::fixed(n).unwrap());
                for _ in 0..100 {
                    let suffix = generator.next_suffix();
                    assert_eq!(suffix.len(), n);
                    assert!(suffix.iter().all(|b| !FORBIDDEN_BYTES.contains(b)));
                    assert!(suffix.iter().all(|b| alphabet.symbols().contains(b)));
                }
            }
        }
    }

    #[test]
    fn lengths_stay_in_range() {
        let length = SuffixLength::range(5, 9).unwrap();
        let mut generator = SuffixGenerator::from_seed(7, SuffixAlphabet::Alphanumeric, length);
        for _ in 0..500 {
            let len = generator.next_suffix().len();
            assert!((5..=9).contains(&len), "length {len} out of range");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let length = SuffixLength::default();
        let mut a = SuffixGenerator::from_seed(42, SuffixAlphabet::Printable, length);
        let mut b = SuffixGenerator::from_seed(42, SuffixAlphabet::Printable, length);
        for _ in 0..10 {
            assert_eq!(a.next_suffix(), b.next_suffix());
        }
    }

    #[test]
    fn entropy_seeding_works() {
        let mut generator =
            SuffixGenerator::from_entropy(SuffixAlphabet::Alphanumeric, SuffixLength::default())
                .unwrap();
        assert!(!generator.next_suffix().is_empty());
    }

    #[test]
    fn invalid_ranges_rejected() {
        assert_eq!(
            SuffixLength::range(0, 4),
            Err(WorkError::InvalidSuffixLength { min: 0, max: 4 })
        );
        assert!(SuffixLength::range(10, 9).is_err());
    }

    #[test]
    fn alphabet_from_str() {
        assert_eq!(
            "Printable".parse::<SuffixAlphabet>().unwrap(),
            SuffixAlphabet::Printable
        );
        assert!("emoji".parse::<SuffixAlphabet>().is_err());
    }
}
