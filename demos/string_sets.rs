use sra_psi::{Party, PsiConfig, RsaChannel, SecureChannel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== SRA-PSI String Sets Example ===\n");

    // Alice's contacts
    let alice_contacts = vec![
        "at.iaculis@google.couk",
        "luctus.et@outlook.couk",
        "sem@aol.edu",
        "donec@outlook.net",
        "nisi@outlook.com",
        "nunc.pulvinar@google.ca",
        "curabitur.dictum@protonmail.edu",
    ];

    // Bob's contacts
    let bob_contacts = vec![
        "neque.et@outlook.ca",
        "vehicula.aliquet@yahoo.couk",
        "sem@aol.edu",
        "ut.pellentesque@hotmail.org",
        "non.enim@google.com",
        "justo.praesent@hotmail.couk",
        "nunc.pulvinar@google.ca",
        "amet.consectetuer@hotmail.com",
        "lacinia.sed.congue@aol.com",
        "donec@outlook.net",
    ];

    println!("Alice's contacts: {:?}", alice_contacts);
    println!("Bob's contacts: {:?}\n", bob_contacts);

    // Bob runs the filter side, Alice receives the result
    let mut bob = Party::initiator(PsiConfig::default())?;
    let mut alice = Party::responder(PsiConfig::default())?;

    println!("Agreeing on a shared prime...");
    let alice_channel = RsaChannel::generate(2048)?;
    let sealed = bob.share_prime(&alice_channel.public_key_bytes()?)?;
    alice.receive_prime(&alice_channel, &sealed)?;
    println!(
        "✓ Both sides hold prime {}\n",
        alice.prime_fingerprint().unwrap_or_default()
    );

    let bob_encrypted = bob.load_data(&bob_contacts)?;
    let alice_encrypted = alice.load_data(&alice_contacts)?;
    println!(
        "✓ Alice encrypted {} contacts, Bob encrypted {}\n",
        alice_encrypted.len(),
        bob_encrypted.len()
    );

    // Alice adds her layer to Bob's contacts and sends both sets back
    let bob_by_alice = alice.encrypt_external(&bob_encrypted)?;

    bob.prepare_intersection(&bob_by_alice)?;
    let common = bob.intersect(&alice_encrypted)?;
    println!("✓ Bob found {} common contacts\n", common.len());

    println!("Alice decrypting the result...");
    for contact in alice.parse_intersection(&common)? {
        println!("\t{}", contact?);
    }

    println!("\n=== Summary ===");
    println!("Alice learned the common contacts without seeing the rest of Bob's list,");
    println!("and Bob only ever handled encrypted values.");

    Ok(())
}
