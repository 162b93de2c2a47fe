//! One-shot secure channel used to hand the shared prime to the counterpart.
//!
//! The receiving party publishes a public key, the sender encrypts the prime
//! with it and the receiver decrypts with its private key. [`RsaChannel`]
//! does this with RSA-OAEP (SHA-256) and DER-encoded public keys.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{PsiError, Result};

/// Receiving end of the secure channel.
pub trait SecureChannel {
    /// Public key to hand to the counterpart.
    fn public_key_bytes(&self) -> Result<Vec<u8>>;

    /// Open a message sealed with [`SecureChannel::public_key_bytes`].
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Seal `plaintext` for the holder of the DER-encoded RSA public key.
pub fn encrypt_with_public_key(public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPublicKey::from_public_key_der(public_key).map_err(PsiError::channel)?;
    key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(PsiError::channel)
}

pub struct RsaChannel {
    private_key: RsaPrivateKey,
}

impl RsaChannel {
    /// Generate a fresh RSA key pair of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits).map_err(PsiError::channel)?;
        private_key.validate().map_err(PsiError::channel)?;
        Ok(Self { private_key })
    }
}

impl SecureChannel for RsaChannel {
    fn public_key_bytes(&self) -> Result<Vec<u8>> {
        let document = self
            .private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(PsiError::channel)?;
        Ok(document.as_bytes().to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(PsiError::channel)
    }
}
