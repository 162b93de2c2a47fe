use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = PsiError> = std::result::Result<T, E>;

/// Errors produced by the PSI protocol and its building blocks.
#[derive(Error, Debug)]
pub enum PsiError {
    /// Entropy or arithmetic failure while setting up key material.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// An operation was issued out of order or by the wrong party.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A numeric payload could not be turned back into a record.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Bloom filter parameters outside of their valid range.
    #[error("invalid filter parameters: {0}")]
    InvalidFilter(String),

    /// Cipher input is not smaller than the shared prime.
    #[error("value is not smaller than the shared prime")]
    OutOfRange,

    /// The secure channel used to transport the shared prime failed.
    #[error("secure channel error: {0}")]
    Channel(String),

    /// Invalid or unreadable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Out-of-order or duplicate state transitions of a [`crate::Party`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("prime already set")]
    PrimeAlreadySet,

    #[error("key not set")]
    KeyNotSet,

    /// Intersection requested before the filter was built for this round.
    #[error("filter not ready")]
    FilterNotReady,

    #[error("data already loaded")]
    DataAlreadyLoaded,

    /// The filter is built from the own records, which are not loaded yet.
    #[error("data not loaded")]
    DataNotLoaded,

    #[error("{operation} is not available to the {role} role")]
    WrongRole {
        operation: &'static str,
        role: crate::Role,
    },

    #[error("expected {expected} records, received {actual}")]
    SetSizeMismatch { expected: usize, actual: usize },
}

/// Failure to decode a word list back into record bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("word {word} does not start with the sentinel digit")]
    MissingSentinel { word: usize },

    #[error("word {word} carries no characters")]
    EmptyWord { word: usize },

    #[error("word {word} has {digits} digits, not a multiple of {slot}")]
    Truncated {
        word: usize,
        digits: usize,
        slot: usize,
    },

    #[error("word {word} is not smaller than the shared prime")]
    WordOutOfRange { word: usize },

    #[error("word {word} holds {value}, which is not a byte")]
    InvalidByte { word: usize, value: u32 },

    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

impl PsiError {
    /// Shorthand for wrapping any displayable failure as a channel error.
    pub(crate) fn channel(e: impl fmt::Display) -> Self {
        PsiError::Channel(e.to_string())
    }
}
