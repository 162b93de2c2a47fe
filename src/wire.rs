//! Messages exchanged between the two parties.
//!
//! Words cross the wire as lowercase base-16 text, the same form the Bloom
//! filter hashes, so any implementation hashing the same ciphertexts lands on
//! the same filter bits.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// One record after one or more layers of SRA encryption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedRecord(#[serde(with = "hex_words")] Vec<BigUint>);

/// A party's records, in the order the owner supplied them.
pub type EncryptedSet = Vec<EncryptedRecord>;

impl EncryptedRecord {
    pub fn new(words: Vec<BigUint>) -> Self {
        Self(words)
    }

    pub fn words(&self) -> &[BigUint] {
        &self.0
    }

    pub fn into_words(self) -> Vec<BigUint> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Concatenated base-16 text of every word, used as the filter key.
    pub fn flatten(&self) -> Vec<u8> {
        flatten_words(&self.0)
    }
}

impl From<Vec<BigUint>> for EncryptedRecord {
    fn from(words: Vec<BigUint>) -> Self {
        Self(words)
    }
}

pub(crate) fn flatten_words(words: &[BigUint]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|word| word.to_str_radix(16).into_bytes())
        .collect()
}

mod hex_words {
    use num_bigint::BigUint;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(words: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(words.iter().map(|word| word.to_str_radix(16)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .iter()
            .map(|text| {
                BigUint::parse_bytes(text.as_bytes(), 16)
                    .ok_or_else(|| D::Error::custom(format!("invalid base-16 word {text:?}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_concatenates_hex() {
        let record = EncryptedRecord::new(vec![BigUint::from(0xabcu32), BigUint::from(0x1fu8)]);
        assert_eq!(record.flatten(), b"abc1f".to_vec());
    }

    #[test]
    fn test_bincode_roundtrip() {
        let set: EncryptedSet = vec![
            EncryptedRecord::new(vec![BigUint::from(1_097_098u32)]),
            EncryptedRecord::new(vec![BigUint::from(u64::MAX) * 3u8, BigUint::from(7u8)]),
            EncryptedRecord::new(Vec::new()),
        ];

        let bytes = bincode::serialize(&set).unwrap();
        let restored: EncryptedSet = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, set);
    }
}
