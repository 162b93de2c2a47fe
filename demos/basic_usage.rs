use rand::rngs::OsRng;
use sra_psi::{random_prime, RecordCodec, SraKey};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SRA Commutative Encryption Example ===\n");

    // Agree on a prime seed
    let prime = random_prime(&mut OsRng, 256)?;
    println!("Shared prime: {}\n", prime);

    // Each side derives an independent key pair over it
    let alice = SraKey::generate(&prime, 32, 1024, &mut OsRng)?;
    let bob = SraKey::generate(&prime, 32, 1024, &mut OsRng)?;

    let codec = RecordCodec::for_prime(&prime, None)?;
    let message = "testemailAddress43@gmail.com";
    let words = codec.encode_str(message);
    println!("Message {:?} encodes to {} word(s)", message, words.len());

    let mut alice_then_bob = Vec::new();
    let mut bob_then_alice = Vec::new();
    let mut partial_equal = true;
    for word in &words {
        let by_alice = alice.encrypt(word)?;
        let by_bob = bob.encrypt(word)?;
        partial_equal &= by_alice == by_bob;

        alice_then_bob.push(bob.encrypt(&by_alice)?);
        bob_then_alice.push(alice.encrypt(&by_bob)?);
    }

    println!("Are both partial encrypted messages equal? {}", partial_equal);
    println!(
        "Are both final encrypted messages equal? {}\n",
        alice_then_bob == bob_then_alice
    );

    // Either party can peel its own layer off first
    let mut recovered = Vec::new();
    for word in &alice_then_bob {
        recovered.push(bob.decrypt(&alice.decrypt(word)?)?);
    }
    println!("Recovered: {:?}", codec.decode_str(&recovered)?);

    Ok(())
}
