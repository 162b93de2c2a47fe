use anyhow::{Context, Result};
use clap::Parser;
use sra_psi::PsiConfig;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "psi-setup")]
#[command(about = "Write and validate a PSI session configuration", long_about = None)]
struct Args {
    /// Size of the shared SRA prime in bits
    #[arg(long, default_value = "256")]
    prime_bits: u64,

    /// Size of each party's secret exponent in bits
    #[arg(long, default_value = "32")]
    key_bits: u64,

    /// RSA modulus used to transport the shared prime
    #[arg(long, default_value = "2048")]
    rsa_bits: usize,

    /// Target false-positive rate of the intersection filter
    #[arg(long, default_value = "0.0001")]
    fp_rate: f64,

    /// Characters per encoded word (derived from the prime when omitted)
    #[arg(long)]
    max_chars_per_word: Option<usize>,

    /// Output file for the configuration
    #[arg(short, long, default_value = "psi.toml")]
    output: PathBuf,

    /// Draw a sample prime and key to check the parameters are usable
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = PsiConfig {
        prime_bits: args.prime_bits,
        key_bits: args.key_bits,
        rsa_bits: args.rsa_bits,
        false_positive_rate: args.fp_rate,
        max_chars_per_word: args.max_chars_per_word,
        ..PsiConfig::default()
    };
    config.validate().context("Invalid parameters")?;

    println!(
        "PSI configuration: {}-bit prime, {}-bit exponents, fp rate {}",
        config.prime_bits, config.key_bits, config.false_positive_rate
    );

    if args.check {
        let start = Instant::now();
        let mut party = sra_psi::Party::initiator(config.clone())?;
        party.generate_prime().context("Failed to draw a sample prime")?;
        println!(
            "Sample prime and key drawn in {:.2?} (fingerprint {})",
            start.elapsed(),
            party.prime_fingerprint().unwrap_or_default()
        );
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.output, config.to_toml_string()?)
        .with_context(|| format!("Failed to write config to {:?}", args.output))?;
    println!("Saved configuration to {:?}", args.output);

    println!("\nNext steps:");
    println!("  1. Use 'psi-cli --config {:?} intersect' to run an intersection", args.output);
    println!("  2. Use 'psi-cli encode' to inspect how records map to words");

    Ok(())
}
