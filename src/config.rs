use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PsiError, Result};

/// Protocol parameters shared by both roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PsiConfig {
    /// Size of the shared SRA prime.
    pub prime_bits: u64,
    /// Size of each party's secret exponent.
    pub key_bits: u64,
    /// RSA modulus used to transport the shared prime.
    pub rsa_bits: usize,
    /// Target false-positive rate of the intersection filter.
    pub false_positive_rate: f64,
    /// Secret exponents drawn before key generation gives up.
    pub max_key_attempts: usize,
    /// Characters per encoded word; derived from the prime when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chars_per_word: Option<usize>,
}

impl Default for PsiConfig {
    fn default() -> Self {
        Self {
            prime_bits: 256,
            key_bits: 32,
            rsa_bits: 2048,
            false_positive_rate: 0.0001,
            max_key_attempts: 1024,
            max_chars_per_word: None,
        }
    }
}

impl PsiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.prime_bits < 16 {
            return Err(PsiError::Config(format!(
                "prime_bits = {} cannot hold an encoded character",
                self.prime_bits
            )));
        }
        if self.key_bits < 2 {
            return Err(PsiError::Config(format!(
                "key_bits = {} is too small",
                self.key_bits
            )));
        }
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(PsiError::Config(format!(
                "false_positive_rate = {} is outside (0, 1)",
                self.false_positive_rate
            )));
        }
        if self.max_key_attempts == 0 {
            return Err(PsiError::Config(
                "max_key_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_chars_per_word == Some(0) {
            return Err(PsiError::Config(
                "max_chars_per_word must be at least 1".to_string(),
            ));
        }
        // OAEP-SHA256 carries at most k - 66 bytes; the prime travels as hex.
        let prime_hex_len = self.prime_bits.div_ceil(4) as usize;
        let oaep_capacity = (self.rsa_bits / 8).saturating_sub(66);
        if prime_hex_len > oaep_capacity {
            return Err(PsiError::Config(format!(
                "rsa_bits = {} cannot carry a {}-bit prime",
                self.rsa_bits, self.prime_bits
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PsiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| PsiError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PsiError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        PsiConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PsiConfig::from_toml_str("false_positive_rate = 0.001\n").unwrap();
        assert_eq!(config.false_positive_rate, 0.001);
        assert_eq!(config.prime_bits, 256);
        assert_eq!(config.max_chars_per_word, None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PsiConfig {
            prime_bits: 512,
            max_chars_per_word: Some(12),
            ..PsiConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(PsiConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            "false_positive_rate = 1.5",
            "false_positive_rate = 0.0",
            "max_key_attempts = 0",
            "key_bits = 1",
            "prime_bits = 8",
            "max_chars_per_word = 0",
            "rsa_bits = 1024",
            "prime_bits = \"many\"",
        ];
        for text in bad {
            assert!(
                matches!(PsiConfig::from_toml_str(text), Err(PsiError::Config(_))),
                "{text} should be rejected"
            );
        }
    }
}
