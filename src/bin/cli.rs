use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use sra_psi::{EncryptedSet, Party, PsiConfig, RecordCodec, RsaChannel, SecureChannel};

#[derive(Parser)]
#[command(name = "psi-cli")]
#[command(about = "SRA private set intersection CLI", long_about = None)]
struct Cli {
    /// Configuration file written by psi-setup
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both parties of the protocol locally and print the intersection
    Intersect {
        /// Client (responder) records, comma-separated
        #[arg(short = 'c', long)]
        client: String,

        /// Server (initiator) records, comma-separated
        #[arg(short = 's', long)]
        server: String,

        /// Override the filter false-positive rate
        #[arg(long)]
        fp_rate: Option<f64>,

        /// Override the shared prime size in bits
        #[arg(long)]
        prime_bits: Option<u64>,
    },

    /// Show the words a record encodes to
    Encode {
        /// Record to encode
        record: String,

        /// Characters per word
        #[arg(long, default_value = "25")]
        max_chars_per_word: usize,
    },
}

/// Parse a comma-separated list of records
fn parse_set(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn message_size(set: &EncryptedSet) -> Result<usize> {
    Ok(bincode::serialize(set)?.len())
}

fn intersect_command(
    config: PsiConfig,
    client_str: String,
    server_str: String,
) -> Result<()> {
    println!("SRA-PSI Intersection");

    let start = Instant::now();
    let client_records = parse_set(&client_str);
    let server_records = parse_set(&server_str);

    println!("  Client: {} records", client_records.len());
    println!("  Server: {} records", server_records.len());

    let mut server = Party::initiator(config.clone())?;
    let mut client = Party::responder(config.clone())?;

    // Prime agreement over the RSA channel.
    let phase = Instant::now();
    let channel = RsaChannel::generate(config.rsa_bits).context("Failed to generate RSA key")?;
    let sealed = server
        .share_prime(&channel.public_key_bytes()?)
        .context("Failed to share prime")?;
    client
        .receive_prime(&channel, &sealed)
        .context("Failed to receive prime")?;
    println!(
        "Prime agreed in {:.2?} (server {}, client {})",
        phase.elapsed(),
        server.prime_fingerprint().unwrap_or_default(),
        client.prime_fingerprint().unwrap_or_default()
    );

    let phase = Instant::now();
    let server_set = server.load_data(&server_records)?;
    let client_set = client.load_data(&client_records)?;
    println!("Records encrypted in {:.2?}", phase.elapsed());

    let phase = Instant::now();
    let cross = client.encrypt_external(&server_set)?;
    server.prepare_intersection(&cross)?;
    let common = server.intersect(&client_set)?;
    println!("Intersection computed in {:.2?}", phase.elapsed());

    println!(
        "Messages: server set {} bytes, cross-encrypted {} bytes, client set {} bytes, result {} bytes",
        message_size(&server_set)?,
        message_size(&cross)?,
        message_size(&client_set)?,
        message_size(&common)?
    );

    let results = client.parse_intersection(&common)?;
    println!("\n{} common records:", results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(record) => println!("\t{}. {}", i, record),
            Err(e) => println!("\t{}. <undecodable: {}>", i, e),
        }
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    Ok(())
}

fn encode_command(record: String, max_chars_per_word: usize) -> Result<()> {
    let codec = RecordCodec::new(max_chars_per_word)?;
    let words = codec.encode_str(&record);

    println!("{:?} -> {} word(s)", record, words.len());
    for word in &words {
        println!("\t{}", word);
    }

    let decoded = codec.decode_str(&words).context("Round trip failed")?;
    println!("decodes back to {:?}", decoded);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PsiConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => PsiConfig::default(),
    };

    match cli.command {
        Commands::Intersect {
            client,
            server,
            fp_rate,
            prime_bits,
        } => {
            if let Some(rate) = fp_rate {
                config.false_positive_rate = rate;
            }
            if let Some(bits) = prime_bits {
                config.prime_bits = bits;
            }
            config.validate().context("Invalid parameters")?;
            intersect_command(config, client, server)
        }

        Commands::Encode {
            record,
            max_chars_per_word,
        } => encode_command(record, max_chars_per_word),
    }
}
