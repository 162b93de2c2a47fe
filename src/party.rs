//! Two-party PSI session.
//!
//! Protocol, with the initiator holding set `X` and the responder set `Y`:
//!
//! 1. The initiator draws the shared prime and sends it to the responder over
//!    a [`SecureChannel`]. Each side derives its own [`SraKey`].
//! 2. Both sides encode and encrypt their records once: `E_x(X)`, `E_y(Y)`.
//! 3. The responder cross-encrypts the initiator's set, `E_y(E_x(X))`, and
//!    returns it along with its own `E_y(Y)`.
//! 4. The initiator loads `E_y(E_x(X))` into a Bloom filter, computes
//!    `E_x(E_y(Y))`, and keeps every `E_y(y)` whose double encryption hits
//!    the filter.
//! 5. The responder decrypts those records with its own key and decodes them.

use std::fmt;

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::bloom::BloomFilter;
use crate::channel::{encrypt_with_public_key, SecureChannel};
use crate::codec::RecordCodec;
use crate::config::PsiConfig;
use crate::error::{DecodeError, ProtocolError, PsiError, Result};
use crate::sra::{is_probable_prime, random_prime, SraKey};
use crate::wire::{flatten_words, EncryptedRecord, EncryptedSet};

/// Which half of the protocol a [`Party`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Draws the prime, builds the filter and computes the intersection.
    Initiator,
    /// Cross-encrypts the initiator's records and decodes the result.
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator => write!(f, "initiator"),
            Role::Responder => write!(f, "responder"),
        }
    }
}

/// Last completed phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    Uninitialized,
    PrimeAgreed,
    DataLoaded,
    Encrypted,
    Intersected,
    Done,
}

#[derive(Debug)]
pub struct Party {
    role: Role,
    config: PsiConfig,
    state: SessionState,
    key: Option<SraKey>,
    codec: Option<RecordCodec>,
    records: Option<EncryptedSet>,
    filter: Option<BloomFilter>,
}

impl Party {
    pub fn new(role: Role, config: PsiConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            role,
            config,
            state: SessionState::Uninitialized,
            key: None,
            codec: None,
            records: None,
            filter: None,
        })
    }

    pub fn initiator(config: PsiConfig) -> Result<Self> {
        Self::new(Role::Initiator, config)
    }

    pub fn responder(config: PsiConfig) -> Result<Self> {
        Self::new(Role::Responder, config)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &PsiConfig {
        &self.config
    }

    /// The shared prime, once agreed.
    pub fn prime(&self) -> Option<&BigUint> {
        self.key.as_ref().map(SraKey::prime)
    }

    /// Short digest of the shared prime for comparing both sides out of band.
    pub fn prime_fingerprint(&self) -> Option<String> {
        self.prime().map(|prime| {
            let digest = blake3::hash(prime.to_str_radix(16).as_bytes());
            digest.to_hex()[..16].to_string()
        })
    }

    /// This party's own records, encrypted once, after [`Party::load_data`].
    pub fn encrypted_records(&self) -> Option<&[EncryptedRecord]> {
        self.records.as_deref()
    }

    /// Draw the shared prime and derive this party's key from it.
    pub fn generate_prime(&mut self) -> Result<&BigUint> {
        self.require_role(Role::Initiator, "generate_prime")?;
        self.require_no_prime()?;

        let prime = random_prime(&mut OsRng, self.config.prime_bits)?;
        info!(bits = prime.bits(), "generated shared prime");
        self.install_key(prime)?;
        self.prime().ok_or(ProtocolError::KeyNotSet.into())
    }

    /// Draw the shared prime and seal its base-16 text for the counterpart.
    pub fn share_prime(&mut self, counterpart_public_key: &[u8]) -> Result<Vec<u8>> {
        self.require_role(Role::Initiator, "share_prime")?;
        self.require_no_prime()?;

        let prime = random_prime(&mut OsRng, self.config.prime_bits)?;
        let prime_text = prime.to_str_radix(16);
        let sealed = encrypt_with_public_key(counterpart_public_key, prime_text.as_bytes())?;
        info!(bits = prime.bits(), "generated and sealed shared prime");
        self.install_key(prime)?;
        Ok(sealed)
    }

    /// Adopt the prime chosen by the counterpart and derive an own key.
    pub fn install_prime(&mut self, prime: BigUint) -> Result<()> {
        self.require_role(Role::Responder, "install_prime")?;
        self.require_no_prime()?;

        if !is_probable_prime(&prime) {
            return Err(PsiError::KeyGeneration(
                "received shared modulus is not prime".to_string(),
            ));
        }
        info!(bits = prime.bits(), "installed shared prime");
        self.install_key(prime)
    }

    /// Open the sealed prime with `channel` and install it.
    pub fn receive_prime<C: SecureChannel + ?Sized>(
        &mut self,
        channel: &C,
        sealed_prime: &[u8],
    ) -> Result<()> {
        self.require_role(Role::Responder, "receive_prime")?;
        self.require_no_prime()?;

        let text = channel.decrypt(sealed_prime)?;
        let prime = BigUint::parse_bytes(&text, 16).ok_or_else(|| {
            PsiError::Channel("shared prime is not base-16 text".to_string())
        })?;
        self.install_prime(prime)
    }

    /// Encode and encrypt this party's records once.
    ///
    /// The returned set is what the counterpart receives; a copy stays in the
    /// session.
    pub fn load_data<S: AsRef<str> + Sync>(&mut self, records: &[S]) -> Result<EncryptedSet> {
        let (key, codec) = self.key_and_codec()?;
        if self.records.is_some() {
            return Err(ProtocolError::DataAlreadyLoaded.into());
        }

        let encrypted = records
            .par_iter()
            .map(|record| {
                let words = codec.encode_str(record.as_ref());
                encrypt_words(key, &words).map(EncryptedRecord::from)
            })
            .collect::<Result<EncryptedSet>>()?;

        debug!(role = %self.role, records = encrypted.len(), "loaded and encrypted records");
        self.records = Some(encrypted.clone());
        self.advance(SessionState::DataLoaded);
        Ok(encrypted)
    }

    /// Add this party's encryption layer to the counterpart's records.
    pub fn encrypt_external(&mut self, input: &[EncryptedRecord]) -> Result<EncryptedSet> {
        self.require_role(Role::Responder, "encrypt_external")?;
        let (key, _) = self.key_and_codec()?;

        let output = input
            .par_iter()
            .map(|record| encrypt_words(key, record.words()).map(EncryptedRecord::from))
            .collect::<Result<EncryptedSet>>()?;

        debug!(role = %self.role, records = output.len(), "cross-encrypted counterpart records");
        self.advance(SessionState::Encrypted);
        Ok(output)
    }

    /// Build this round's filter from the own records as cross-encrypted by
    /// the counterpart.
    pub fn prepare_intersection(&mut self, cross_encrypted: &[EncryptedRecord]) -> Result<()> {
        self.require_role(Role::Initiator, "prepare_intersection")?;
        if self.key.is_none() {
            return Err(ProtocolError::KeyNotSet.into());
        }

        let own = self.records.as_ref().ok_or(ProtocolError::DataNotLoaded)?;
        if own.len() != cross_encrypted.len() {
            return Err(ProtocolError::SetSizeMismatch {
                expected: own.len(),
                actual: cross_encrypted.len(),
            }
            .into());
        }

        let mut filter = BloomFilter::new(
            cross_encrypted.len().max(1),
            self.config.false_positive_rate,
        )?;
        filter.add_all(cross_encrypted.iter().map(EncryptedRecord::flatten));

        debug!(
            role = %self.role,
            items = filter.len(),
            bits = filter.bits(),
            hashes = filter.hashes(),
            "built intersection filter"
        );
        self.filter = Some(filter);
        self.advance(SessionState::Encrypted);
        Ok(())
    }

    /// Return the counterpart's records that are also in this party's set.
    ///
    /// Records come back exactly as received, encrypted only by their owner,
    /// in the order received. The filter is spent by this call.
    pub fn intersect(&mut self, counterpart: &[EncryptedRecord]) -> Result<EncryptedSet> {
        self.require_role(Role::Initiator, "intersect")?;
        let (key, _) = self.key_and_codec()?;
        let filter = self.filter.as_ref().ok_or(ProtocolError::FilterNotReady)?;

        let flattened = counterpart
            .par_iter()
            .map(|record| encrypt_words(key, record.words()).map(|words| flatten_words(&words)))
            .collect::<Result<Vec<_>>>()?;
        let hits = filter.test_multiple(&flattened);

        let common: EncryptedSet = counterpart
            .iter()
            .zip(hits)
            .filter_map(|(record, hit)| hit.then(|| record.clone()))
            .collect();

        info!(
            role = %self.role,
            tested = counterpart.len(),
            common = common.len(),
            "computed intersection"
        );
        self.filter = None;
        self.advance(SessionState::Intersected);
        Ok(common)
    }

    /// Decrypt and decode the intersection returned by the counterpart.
    ///
    /// A record that fails to decode yields its own error without affecting
    /// the others.
    pub fn parse_intersection(
        &mut self,
        common: &[EncryptedRecord],
    ) -> Result<Vec<Result<String, DecodeError>>> {
        self.require_role(Role::Responder, "parse_intersection")?;
        let (key, codec) = self.key_and_codec()?;

        let decoded: Vec<Result<String, DecodeError>> = common
            .par_iter()
            .enumerate()
            .map(|(i, record)| {
                decrypt_record(key, &codec, record).inspect_err(|e| {
                    warn!(record = i, error = %e, "failed to decode intersection record");
                })
            })
            .collect();

        debug!(role = %self.role, records = decoded.len(), "decoded intersection");
        self.advance(SessionState::Done);
        Ok(decoded)
    }

    fn install_key(&mut self, prime: BigUint) -> Result<()> {
        let codec = RecordCodec::for_prime(&prime, self.config.max_chars_per_word)?;
        let key = SraKey::generate(
            &prime,
            self.config.key_bits,
            self.config.max_key_attempts,
            &mut OsRng,
        )?;

        debug!(
            role = %self.role,
            chars_per_word = codec.max_chars_per_word(),
            "derived session key"
        );
        self.key = Some(key);
        self.codec = Some(codec);
        self.advance(SessionState::PrimeAgreed);
        Ok(())
    }

    /// Phases only move forward.
    fn advance(&mut self, next: SessionState) {
        self.state = self.state.max(next);
    }

    fn key_and_codec(&self) -> Result<(&SraKey, RecordCodec)> {
        match (&self.key, self.codec) {
            (Some(key), Some(codec)) => Ok((key, codec)),
            _ => Err(ProtocolError::KeyNotSet.into()),
        }
    }

    fn require_no_prime(&self) -> Result<()> {
        if self.key.is_some() {
            return Err(ProtocolError::PrimeAlreadySet.into());
        }
        Ok(())
    }

    fn require_role(&self, role: Role, operation: &'static str) -> Result<()> {
        if self.role != role {
            return Err(ProtocolError::WrongRole {
                operation,
                role: self.role,
            }
            .into());
        }
        Ok(())
    }
}

fn encrypt_words(key: &SraKey, words: &[BigUint]) -> Result<Vec<BigUint>> {
    words.iter().map(|word| key.encrypt(word)).collect()
}

fn decrypt_record(
    key: &SraKey,
    codec: &RecordCodec,
    record: &EncryptedRecord,
) -> Result<String, DecodeError> {
    let words = record
        .words()
        .iter()
        .enumerate()
        .map(|(word, value)| {
            key.decrypt(value)
                .map_err(|_| DecodeError::WordOutOfRange { word })
        })
        .collect::<Result<Vec<_>, _>>()?;
    codec.decode_str(&words)
}
