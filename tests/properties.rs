//! Property-based tests for the cipher, codec and filter.

use num_bigint::{BigUint, RandBigInt};
use proptest::prelude::*;
use rand::rngs::OsRng;
use sra_psi::{random_prime, BloomFilter, RecordCodec, SraKey};
use std::sync::OnceLock;

/// One prime and two independent keys shared by every case.
fn keys() -> &'static (BigUint, SraKey, SraKey) {
    static KEYS: OnceLock<(BigUint, SraKey, SraKey)> = OnceLock::new();
    KEYS.get_or_init(|| {
        let prime = random_prime(&mut OsRng, 256).unwrap();
        let alice = SraKey::generate(&prime, 32, 64, &mut OsRng).unwrap();
        let bob = SraKey::generate(&prime, 32, 64, &mut OsRng).unwrap();
        (prime, alice, bob)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: decrypt(encrypt(m)) == m for any m below the prime
    #[test]
    fn sra_roundtrip(seed in prop::collection::vec(any::<u8>(), 0..40)) {
        let (prime, alice, _) = keys();
        let m = BigUint::from_bytes_be(&seed) % prime;

        let c = alice.encrypt(&m).unwrap();
        prop_assert_eq!(alice.decrypt(&c).unwrap(), m);
    }

    /// Property: encryption order does not matter
    #[test]
    fn sra_commutes(_case in any::<u8>()) {
        let (prime, alice, bob) = keys();
        let m = OsRng.gen_biguint_below(prime);

        let ab = bob.encrypt(&alice.encrypt(&m).unwrap()).unwrap();
        let ba = alice.encrypt(&bob.encrypt(&m).unwrap()).unwrap();
        prop_assert_eq!(ab, ba);
    }

    /// Property: decode(encode(s)) == s for arbitrary bytes and word sizes
    #[test]
    fn codec_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..200),
        chars in 1usize..30,
    ) {
        let codec = RecordCodec::new(chars).unwrap();
        let words = codec.encode(&data);

        prop_assert_eq!(words.len(), data.len().div_ceil(chars));
        prop_assert_eq!(codec.decode(&words).unwrap(), data);
    }

    /// Property: words produced for a prime stay below it
    #[test]
    fn codec_words_below_prime(data in prop::collection::vec(any::<u8>(), 1..100)) {
        let (prime, _, _) = keys();
        let codec = RecordCodec::for_prime(prime, None).unwrap();

        for word in codec.encode(&data) {
            prop_assert!(&word < prime);
        }
    }

    /// Property: everything added to a filter tests positive
    #[test]
    fn filter_has_no_false_negatives(
        items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..200),
        rate in 0.0001f64..0.5,
    ) {
        let mut filter = BloomFilter::new(items.len(), rate).unwrap();
        filter.add_all(&items);

        for item in &items {
            prop_assert!(filter.test(item));
        }
    }
}
