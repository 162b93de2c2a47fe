//! Two-party private set intersection built on SRA commutative encryption.
//!
//! Each party encrypts its records with its own key over a shared prime, the
//! counterpart adds a second layer, and equal records end up with equal
//! doubly-encrypted values. The initiator matches those values through a
//! Bloom filter and hands back the responder's matching records, which only
//! the responder can decrypt.
//!
//! ```no_run
//! use sra_psi::{Party, PsiConfig, RsaChannel, SecureChannel};
//!
//! # fn main() -> sra_psi::Result<()> {
//! let mut server = Party::initiator(PsiConfig::default())?;
//! let mut client = Party::responder(PsiConfig::default())?;
//!
//! let channel = RsaChannel::generate(2048)?;
//! let sealed = server.share_prime(&channel.public_key_bytes()?)?;
//! client.receive_prime(&channel, &sealed)?;
//!
//! let server_set = server.load_data(&["bbb", "ccc", "ddd"])?;
//! let client_set = client.load_data(&["aaa", "bbb", "ccc"])?;
//!
//! let cross = client.encrypt_external(&server_set)?;
//! server.prepare_intersection(&cross)?;
//! let common = server.intersect(&client_set)?;
//!
//! for record in client.parse_intersection(&common)? {
//!     println!("{}", record?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bloom;
pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod party;
pub mod sra;
pub mod wire;

pub use bloom::BloomFilter;
pub use channel::{encrypt_with_public_key, RsaChannel, SecureChannel};
pub use codec::RecordCodec;
pub use config::PsiConfig;
pub use error::{DecodeError, ProtocolError, PsiError, Result};
pub use party::{Party, Role, SessionState};
pub use sra::{random_prime, SraKey};
pub use wire::{EncryptedRecord, EncryptedSet};
