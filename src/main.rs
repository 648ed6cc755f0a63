//! # Main — CLI Entry Point
//!
//! Routes the attack subcommands to their drivers. Each command builds a
//! fresh demo key, prints it as a hex triple, mounts its attack, and
//! prints the results to stdout; diagnostics go to stderr via `tracing`
//! (`RUST_LOG=debug` shows the oracle attack's per-round progress).
//!
//! ## Subcommands
//!
//! - `mul` / `div` — raw RSA malleability demos.
//! - `pkcs1` — the padding-oracle attack against this crate's own
//!   decryption routine.
//! - `weak` — equivalent-exponent enumeration for keys built from weak
//!   primes.
//!
//! Every subcommand takes `[<key-bits> [<max-factor-p-and-q>]]`; the key
//! width defaults to 100 and, when the factor bound is present, the key is
//! built from weak primes instead of balanced random ones.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "oracular",
    about = "Didactic RSA playground: build keys, then break them with classical attacks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Demo: multiply a plaintext inside its ciphertext without decrypting
    Mul {
        /// Modulus width in bits
        #[arg(default_value_t = 100)]
        key_bits: u32,
        /// Build the key from weak primes with p-1/q-1 factors below this bound
        max_factor: Option<u64>,
    },
    /// Demo: divide a plaintext inside its ciphertext without decrypting
    Div {
        /// Modulus width in bits
        #[arg(default_value_t = 100)]
        key_bits: u32,
        /// Build the key from weak primes with p-1/q-1 factors below this bound
        max_factor: Option<u64>,
    },
    /// Recover a PKCS#1 plaintext from a conforming/non-conforming oracle
    Pkcs1 {
        /// Modulus width in bits
        #[arg(default_value_t = 100)]
        key_bits: u32,
        /// Build the key from weak primes with p-1/q-1 factors below this bound
        max_factor: Option<u64>,
    },
    /// Enumerate the equivalent private exponents of a weak key
    Weak {
        /// Modulus width in bits
        #[arg(default_value_t = 100)]
        key_bits: u32,
        /// Largest prime factor allowed in p-1 and q-1 (default 10000)
        max_factor: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Mul { key_bits, max_factor } => cli::run_mul(key_bits, max_factor),
        Commands::Div { key_bits, max_factor } => cli::run_div(key_bits, max_factor),
        Commands::Pkcs1 { key_bits, max_factor } => cli::run_pkcs1(key_bits, max_factor),
        Commands::Weak { key_bits, max_factor } => cli::run_weak(key_bits, max_factor),
    }
}
