//! SRA commutative encryption (Shamir, Rivest, Adleman, "Mental Poker").
//!
//! Both parties share a prime `p`. Each one picks a secret exponent `e` with
//! `gcd(e, p - 1) = 1` and its inverse `d = e^-1 mod (p - 1)`. Encryption is
//! `m^e mod p`, decryption `c^d mod p`, and two keys over the same prime
//! commute: `E_a(E_b(m)) = E_b(E_a(m))`.

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_prime::nt_funcs::is_prime;
use num_traits::One;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PsiError, Result};

/// Upper bound on candidates drawn while searching for a random prime.
const PRIME_SEARCH_LIMIT: usize = 1 << 16;

/// Draw a random probable prime of exactly `bits` bits.
pub fn random_prime<R: Rng + CryptoRng + ?Sized>(rng: &mut R, bits: u64) -> Result<BigUint> {
    if bits < 2 {
        return Err(PsiError::KeyGeneration(format!(
            "cannot draw a {bits}-bit prime"
        )));
    }

    for _ in 0..PRIME_SEARCH_LIMIT {
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        if is_prime(&candidate, None).probably() {
            return Ok(candidate);
        }
    }

    Err(PsiError::KeyGeneration(format!(
        "no {bits}-bit prime found after {PRIME_SEARCH_LIMIT} candidates"
    )))
}

/// Test whether `value` is (probably) prime.
pub fn is_probable_prime(value: &BigUint) -> bool {
    is_prime(value, None).probably()
}

/// One party's SRA key pair over a shared prime.
///
/// The exponents never leave this type; only [`SraKey::encrypt`] and
/// [`SraKey::decrypt`] use them.
#[derive(Clone)]
pub struct SraKey {
    prime: BigUint,
    secret: BigUint,
    secret_inv: BigUint,
}

impl SraKey {
    /// Generate a key pair over `prime`.
    ///
    /// Draws random `key_bits`-bit primes until one is coprime with
    /// `prime - 1`, giving up after `max_attempts` draws.
    pub fn generate<R: Rng + CryptoRng + ?Sized>(
        prime: &BigUint,
        key_bits: u64,
        max_attempts: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if *prime < BigUint::from(3u8) {
            return Err(PsiError::KeyGeneration(
                "shared prime must be at least 3".to_string(),
            ));
        }

        let phi = prime - 1u8;
        for attempt in 1..=max_attempts {
            let secret = random_prime(rng, key_bits)?;
            if !secret.gcd(&phi).is_one() {
                tracing::debug!(attempt, "secret exponent shares a factor with p - 1");
                continue;
            }

            let secret_inv = secret.modinv(&phi).ok_or_else(|| {
                PsiError::KeyGeneration("secret exponent has no inverse mod p - 1".to_string())
            })?;

            return Ok(Self {
                prime: prime.clone(),
                secret,
                secret_inv,
            });
        }

        Err(PsiError::KeyGeneration(format!(
            "no exponent coprime with p - 1 after {max_attempts} attempts"
        )))
    }

    /// The shared prime this key operates over.
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// `m^secret mod prime`.
    pub fn encrypt(&self, message: &BigUint) -> Result<BigUint> {
        self.check_range(message)?;
        Ok(message.modpow(&self.secret, &self.prime))
    }

    /// `c^secret_inv mod prime`.
    pub fn decrypt(&self, cipher: &BigUint) -> Result<BigUint> {
        self.check_range(cipher)?;
        Ok(cipher.modpow(&self.secret_inv, &self.prime))
    }

    fn check_range(&self, value: &BigUint) -> Result<()> {
        if *value >= self.prime {
            return Err(PsiError::OutOfRange);
        }
        Ok(())
    }
}

/// Overwrite the limbs of `value` with zeros in their current allocation.
fn wipe(value: &mut BigUint) {
    let limbs = value.bits().div_ceil(32) as usize;
    value.assign_from_slice(&vec![0u32; limbs]);
}

impl Zeroize for SraKey {
    fn zeroize(&mut self) {
        wipe(&mut self.secret);
        wipe(&mut self.secret_inv);
    }
}

impl Drop for SraKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SraKey {}

impl fmt::Debug for SraKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SraKey")
            .field("prime_bits", &self.prime.bits())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use rand::rngs::OsRng;

    fn shared_prime() -> BigUint {
        random_prime(&mut OsRng, 128).unwrap()
    }

    #[test]
    fn test_random_prime_size() {
        let p = random_prime(&mut OsRng, 64).unwrap();
        assert_eq!(p.bits(), 64);
        assert!(is_probable_prime(&p));
    }

    #[test]
    fn test_random_prime_rejects_tiny_sizes() {
        assert!(matches!(
            random_prime(&mut OsRng, 1),
            Err(PsiError::KeyGeneration(_))
        ));
    }

    #[test]
    fn test_key_inverse_relation() {
        let prime = shared_prime();
        let key = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();
        let phi = &prime - 1u8;

        assert!(key.secret.gcd(&phi).is_one());
        assert!((&key.secret * &key.secret_inv % &phi).is_one());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let prime = shared_prime();
        let key = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();

        for m in [0u64, 1, 2, 1_097_098, u64::MAX] {
            let m = BigUint::from(m);
            let c = key.encrypt(&m).unwrap();
            assert_eq!(key.decrypt(&c).unwrap(), m);
        }
    }

    #[test]
    fn test_commutativity() {
        let prime = shared_prime();
        let alice = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();
        let bob = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();
        let m = OsRng.gen_biguint_below(&prime);

        let ab = bob.encrypt(&alice.encrypt(&m).unwrap()).unwrap();
        let ba = alice.encrypt(&bob.encrypt(&m).unwrap()).unwrap();
        assert_eq!(ab, ba);

        // Peeling the layers in either order recovers the plaintext.
        let peeled = bob.decrypt(&alice.decrypt(&ab).unwrap()).unwrap();
        assert_eq!(peeled, m);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let prime = shared_prime();
        let key = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();

        assert!(matches!(key.encrypt(&prime), Err(PsiError::OutOfRange)));
        assert!(matches!(
            key.decrypt(&(&prime + 1u8)),
            Err(PsiError::OutOfRange)
        ));
    }

    #[test]
    fn test_small_prime_rejected() {
        let err = SraKey::generate(&BigUint::from(2u8), 8, 4, &mut OsRng).unwrap_err();
        assert!(matches!(err, PsiError::KeyGeneration(_)));
    }

    #[test]
    fn test_zeroize_clears_exponents() {
        let prime = shared_prime();
        let mut key = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();
        assert!(!key.secret.is_zero());

        key.zeroize();
        assert!(key.secret.is_zero());
        assert!(key.secret_inv.is_zero());
        assert_eq!(key.prime(), &prime);
    }

    #[test]
    fn test_debug_hides_exponents() {
        let prime = shared_prime();
        let key = SraKey::generate(&prime, 32, 16, &mut OsRng).unwrap();
        let shown = format!("{key:?}");

        assert!(shown.contains("prime_bits"));
        assert!(!shown.contains(&key.secret.to_string()));
    }
}
