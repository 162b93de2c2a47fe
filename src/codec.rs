//! Record codec: bytes to decimal words and back.
//!
//! Every byte takes a fixed three-digit slot and every word starts with the
//! sentinel digit `1`, so `"ab"` becomes `1 097 098`. The sentinel keeps
//! leading zero slots from vanishing once the word is a number.

use num_bigint::BigUint;

use crate::error::{DecodeError, PsiError, Result};

/// Decimal digits used by a single byte.
pub const CHAR_SPACES: usize = 3;

const SLOT_BASE: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCodec {
    max_chars_per_word: usize,
}

impl RecordCodec {
    /// Codec storing at most `max_chars_per_word` bytes in each word.
    pub fn new(max_chars_per_word: usize) -> Result<Self> {
        if max_chars_per_word == 0 {
            return Err(PsiError::Config(
                "a word must hold at least one character".to_string(),
            ));
        }
        Ok(Self { max_chars_per_word })
    }

    /// Codec whose words always stay below `prime`.
    ///
    /// A word holding `c` characters is smaller than `2 * 1000^c`, so the
    /// capacity is the largest `c` with `2 * 1000^c < prime`. An explicit
    /// capacity is accepted only if it respects the same bound.
    pub fn for_prime(prime: &BigUint, max_chars_per_word: Option<usize>) -> Result<Self> {
        let fits = |chars: usize| word_bound(chars) < *prime;

        let chars = match max_chars_per_word {
            Some(chars) if chars > 0 && fits(chars) => chars,
            Some(chars) => {
                return Err(PsiError::Config(format!(
                    "{chars} characters per word do not fit below a {}-bit prime",
                    prime.bits()
                )));
            }
            None => {
                if !fits(1) {
                    return Err(PsiError::Config(format!(
                        "prime {prime} is too small to hold a single character"
                    )));
                }
                let mut chars = 1;
                while fits(chars + 1) {
                    chars += 1;
                }
                chars
            }
        };

        Self::new(chars)
    }

    pub fn max_chars_per_word(&self) -> usize {
        self.max_chars_per_word
    }

    /// Split `input` into words of at most `max_chars_per_word` bytes.
    ///
    /// The empty input produces no words.
    pub fn encode(&self, input: &[u8]) -> Vec<BigUint> {
        input
            .chunks(self.max_chars_per_word)
            .map(|chunk| {
                chunk.iter().fold(BigUint::from(1u8), |word, &c| {
                    word * SLOT_BASE + u32::from(c)
                })
            })
            .collect()
    }

    pub fn encode_str(&self, input: &str) -> Vec<BigUint> {
        self.encode(input.as_bytes())
    }

    /// Reverse [`RecordCodec::encode`].
    pub fn decode(&self, words: &[BigUint]) -> Result<Vec<u8>, DecodeError> {
        decode_words(words)
    }

    pub fn decode_str(&self, words: &[BigUint]) -> Result<String, DecodeError> {
        let bytes = self.decode(words)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Exclusive upper bound of a word holding `chars` characters.
fn word_bound(chars: usize) -> BigUint {
    BigUint::from(2u8) * BigUint::from(SLOT_BASE).pow(chars as u32)
}

fn decode_words(words: &[BigUint]) -> Result<Vec<u8>, DecodeError> {
    let mut bytes = Vec::new();

    for (w, word) in words.iter().enumerate() {
        let digits = word.to_str_radix(10);
        let slots = digits
            .strip_prefix('1')
            .ok_or(DecodeError::MissingSentinel { word: w })?;

        if slots.is_empty() {
            return Err(DecodeError::EmptyWord { word: w });
        }
        if slots.len() % CHAR_SPACES != 0 {
            return Err(DecodeError::Truncated {
                word: w,
                digits: slots.len(),
                slot: CHAR_SPACES,
            });
        }

        for group in slots.as_bytes().chunks(CHAR_SPACES) {
            let value = group
                .iter()
                .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
            let byte =
                u8::try_from(value).map_err(|_| DecodeError::InvalidByte { word: w, value })?;
            bytes.push(byte);
        }
    }

    Ok(bytes)
}
