//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim: one driver per
//! attack subcommand, plus the shared key-construction step. Demo keys are
//! either balanced random primes or, when a factor bound is given, weak
//! primes whose `p − 1` is smooth below that bound.

use anyhow::Result;
use oracular::attack::{attack_pkcs1, attack_raw_divide, attack_raw_multiply, attack_weak_key};
use oracular::rsa::{
    create_key_bits, create_key_from_primes, create_weak_prime, decrypt_raw,
    default_public_exponent, encrypt_pkcs1, Key,
};
use rug::Integer;
use tracing::info;

/// Canonical demo payload; masked to the key's payload width before use.
const DEMO_PAYLOAD: u64 = 0x123456789abcdef;

/// Factor bound for weak primes when the CLI does not supply one.
pub const DEFAULT_WEAK_FACTOR: u64 = 10_000;

/// Build and print the demo key.
fn build_key(key_bits: u32, weak_below: Option<u64>) -> Result<Key> {
    let key = match weak_below {
        Some(bound) => {
            info!(bound, "building key from weak primes");
            let p_bits = key_bits / 2;
            let q_bits = key_bits + 1 - p_bits;
            let p = create_weak_prime(p_bits, bound)?;
            let mut q = create_weak_prime(q_bits, bound)?;
            while q == p {
                q = create_weak_prime(q_bits, bound)?;
            }
            create_key_from_primes(vec![p, q], default_public_exponent(key_bits))?
        }
        None => create_key_bits(key_bits, 2, None)?,
    };
    println!("{}", key);
    Ok(key)
}

/// `mul` — show that ciphertexts multiply without decryption.
pub fn run_mul(key_bits: u32, weak_below: Option<u64>) -> Result<()> {
    let key = build_key(key_bits, weak_below)?;
    for t in [2u64, 3] {
        println!("raw attack, multiply by {}", t);
        for (m, got) in attack_raw_multiply(&key, t)? {
            println!("{} -> {}", m, got);
        }
    }
    Ok(())
}

/// `div` — the same malleability through a modular inverse.
pub fn run_div(key_bits: u32, weak_below: Option<u64>) -> Result<()> {
    let key = build_key(key_bits, weak_below)?;
    for t in [2u64, 3] {
        println!("raw attack, divide by {}", t);
        for (m, got) in attack_raw_divide(&key, t)? {
            println!("{} -> {}", m, got);
        }
    }
    Ok(())
}

/// `pkcs1` — recover a padded plaintext from conforming/non-conforming
/// answers alone.
pub fn run_pkcs1(key_bits: u32, weak_below: Option<u64>) -> Result<()> {
    let key = build_key(key_bits, weak_below)?;
    let layout = key.layout()?;
    let mut payload = Integer::from(DEMO_PAYLOAD);
    payload.keep_bits_mut(layout.data_bits);
    if payload == 0 {
        payload = Integer::from(1);
    }
    info!(payload = %payload, data_bits = layout.data_bits, "encrypting demo payload");
    let c = encrypt_pkcs1(&key, &payload)?;
    let recovery = attack_pkcs1(&key, &c)?;
    let truth = decrypt_raw(&key, &c)?;
    println!("found=0x{:x}", recovery.plaintext);
    println!("   m0=0x{:x}", truth);
    println!("decrypt op count={}", recovery.oracle_calls);
    Ok(())
}

/// `weak` — enumerate the equivalent private exponents of a weak key.
pub fn run_weak(key_bits: u32, max_factor: Option<u64>) -> Result<()> {
    let bound = max_factor.unwrap_or(DEFAULT_WEAK_FACTOR);
    let key = build_key(key_bits, Some(bound))?;
    let report = attack_weak_key(&key)?;
    println!("shared smooth part A=0x{:x}", report.shared);
    println!("exponent stride phi/A=0x{:x}", report.stride);
    if report.enumerated {
        println!("{} equivalent private exponents:", report.equivalent.len());
        for d in &report.equivalent {
            println!("  d=0x{:x}", d);
        }
    } else {
        println!("enumeration skipped: A exceeds the demo limit");
    }
    Ok(())
}
