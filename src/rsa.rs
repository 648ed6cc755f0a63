//! # RSA — Keys, Raw and PKCS#1 v1.5 Encryption
//!
//! Key construction from random or supplied primes, "textbook" RSA, and a
//! simplified PKCS#1 v1.5 block cipher over it. Within an `n`-bit modulus
//! the plaintext block spans `k = bit_length(n) − 1` bits:
//!
//! ```text
//!  bit k-1 ──────────────────────────────────────────── bit 0
//! | command 0x0002 (16) | padding (64) | zero (8) | payload  |
//! ```
//!
//! equivalently, with `data_bits = k − 88`:
//! `raw = (2 << cmd_offset) | (R << padding_offset) | m` for a random
//! 64-bit `R`. Decryption checks only the command field and answers with
//! the sentinel `0` when it is not `0x0002` — exactly the one bit of
//! leakage the padding-oracle attack in [`crate::attack`] feeds on. The
//! narrow random field (64 bits rather than a byte-string to the brim) is
//! a deliberate simplification that keeps the attack's interval arithmetic
//! visible.
//!
//! Weak keys for the equivalent-exponent demo come from
//! [`create_weak_prime`], which builds `p` so that `p − 1` is a product of
//! small primes only.
//!
//! ## References
//!
//! - RSA Laboratories, PKCS #1 v1.5: RSA Encryption Standard.
//! - R. Rivest, A. Shamir, L. Adleman, "A Method for Obtaining Digital
//!   Signatures and Public-Key Cryptosystems", CACM 21(2), 1978.

use std::fmt;

use anyhow::{ensure, Result};
use rug::Integer;
use tracing::debug;

use crate::arith::{mult_inverse, powmod};
use crate::entropy::{random_bits, random_u64};
use crate::primality::{next_probably_prime, probably_prime};
use crate::primes::random_prime_to;

/// An RSA key over at least two distinct primes. Immutable once built;
/// `n = Π primes`, `phi = Π (p−1)`, `e·d ≡ 1 (mod phi)`, `d >= 1`.
#[derive(Clone, Debug)]
pub struct Key {
    pub n: Integer,
    pub e: Integer,
    pub d: Integer,
    pub phi: Integer,
    pub primes: Vec<Integer>,
}

/// PKCS#1 block geometry for one modulus. The command field occupies the
/// top 16 of the `k` block bits, the random padding the 64 below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLayout {
    pub k: u32,
    pub data_bits: u32,
    pub padding_offset: u32,
    pub cmd_offset: u32,
}

impl Key {
    /// Block geometry for this modulus; needs `k > 88` so at least one
    /// payload bit remains below the command and padding fields.
    pub fn layout(&self) -> Result<BlockLayout> {
        let k = self.n.significant_bits() - 1;
        ensure!(
            k > 88,
            "modulus too small for the PKCS#1 block layout (k = {}, need > 88)",
            k
        );
        let data_bits = k - 88;
        Ok(BlockLayout {
            k,
            data_bits,
            padding_offset: data_bits + 8,
            cmd_offset: data_bits + 72,
        })
    }
}

impl fmt::Display for Key {
    /// The crate's only key serialisation: the hex triple.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n=0x{:x} e=0x{:x} d=0x{:x}", self.n, self.e, self.d)
    }
}

/// Random probable prime with exactly `bits` significant bits: the top and
/// low bits are forced, then the candidate advances by 2 until Miller–Rabin
/// accepts. `bits <= 2` gives 2 and `bits == 3` gives 3.
pub fn random_prime(bits: u32) -> Integer {
    if bits <= 2 {
        return Integer::from(2);
    }
    if bits == 3 {
        return Integer::from(3);
    }
    let mut p = random_bits(bits);
    p.set_bit(bits - 1, true);
    p.set_bit(0, true);
    while !probably_prime(&p) {
        p += 2;
    }
    p
}

/// Default public exponent by key size.
pub fn default_public_exponent(bits: u32) -> u64 {
    if bits >= 14 {
        0x1001
    } else if bits >= 10 {
        0x101
    } else {
        0x11
    }
}

/// Build a key over the supplied primes. The public exponent becomes the
/// smallest `e' >= e` coprime to `phi`; `d` is its inverse mod `phi`.
pub fn create_key_from_primes(primes: Vec<Integer>, e: u64) -> Result<Key> {
    ensure!(
        primes.len() >= 2,
        "a key needs at least two primes, got {}",
        primes.len()
    );
    for (i, p) in primes.iter().enumerate() {
        ensure!(probably_prime(p), "key factor {} is not prime", p);
        ensure!(!primes[..i].contains(p), "duplicate key factor {}", p);
    }
    let mut n = Integer::from(1);
    let mut phi = Integer::from(1);
    for p in &primes {
        n *= p;
        phi *= Integer::from(p - 1u32);
    }
    let mut e = Integer::from(e);
    let d = loop {
        let d = mult_inverse(&e, &phi)?;
        if d != 0 {
            break d;
        }
        e += 1;
    };
    Ok(Key { n, e, d, phi, primes })
}

/// Generate a key from `r_count` distinct random primes whose product has
/// exactly `bits + 1` significant bits, i.e. a usable block width of
/// `k = bits`. Prime widths are balanced against the bits still missing;
/// an overshooting final prime is halved, re-primed and the product
/// rebuilt, and generation repeats until the width invariant holds.
pub fn create_key_bits(bits: u32, r_count: usize, e: Option<u64>) -> Result<Key> {
    ensure!(r_count >= 2, "a key needs at least two primes");
    ensure!(bits >= 8, "key width {} is too small to split", bits);
    let target = bits + 1;
    let e = e.unwrap_or_else(|| default_public_exponent(bits));

    loop {
        let mut primes: Vec<Integer> = Vec::with_capacity(r_count);
        let mut n = Integer::from(1);
        for i in 0..r_count {
            let have = n.significant_bits();
            if have >= target {
                break;
            }
            let p_bits = ((target - have) / (r_count - i) as u32).max(2);
            let mut p = random_prime(p_bits);
            while primes.contains(&p) {
                p = next_probably_prime(&p);
            }
            n *= &p;
            primes.push(p);
        }
        if primes.len() < r_count {
            continue;
        }

        if n.significant_bits() > target {
            if let Some(last) = primes.pop() {
                let mut shrunk = Integer::from(&last >> 1);
                shrunk.set_bit(0, true);
                while !probably_prime(&shrunk) {
                    shrunk += 2;
                }
                primes.push(shrunk);
                n = primes.iter().fold(Integer::from(1), |acc, p| acc * p);
            }
        }

        let distinct = primes
            .iter()
            .enumerate()
            .all(|(i, p)| !primes[..i].contains(p));
        if n.significant_bits() == target && distinct {
            debug!(width = target, primes = primes.len(), "key material ready");
            return create_key_from_primes(primes, e);
        }
    }
}

/// Textbook RSA: `m^e mod n`. Requires `0 <= m < n`.
pub fn encrypt_raw(key: &Key, m: &Integer) -> Result<Integer> {
    ensure!(
        *m >= 0 && *m < key.n,
        "plaintext out of range for the modulus"
    );
    powmod(m, &key.e, &key.n)
}

/// Textbook RSA decryption: `c^d mod n`.
pub fn decrypt_raw(key: &Key, c: &Integer) -> Result<Integer> {
    powmod(c, &key.d, &key.n)
}

/// Assemble the PKCS#1 block around `m` and encrypt it. The payload must
/// satisfy `1 <= m < 2^data_bits`; zero is reserved as the oracle
/// sentinel and must never round-trip.
pub fn encrypt_pkcs1(key: &Key, m: &Integer) -> Result<Integer> {
    let layout = key.layout()?;
    ensure!(*m >= 1, "PKCS#1 payload must be at least 1");
    ensure!(
        m.significant_bits() <= layout.data_bits,
        "payload needs {} bits but the block carries {}",
        m.significant_bits(),
        layout.data_bits
    );
    let mut raw = Integer::from(2) << layout.cmd_offset;
    raw |= Integer::from(random_u64()) << layout.padding_offset;
    raw |= m;
    powmod(&raw, &key.e, &key.n)
}

/// Decrypt a PKCS#1 ciphertext. Returns the payload field, or the sentinel
/// `0` when the block's command field is not `0x0002`. That verdict is the
/// only signal a padding oracle built on this function can leak.
pub fn decrypt_pkcs1(key: &Key, c: &Integer) -> Result<Integer> {
    let layout = key.layout()?;
    let raw = powmod(c, &key.d, &key.n)?;
    if Integer::from(&raw >> layout.cmd_offset) != 2 {
        return Ok(Integer::new());
    }
    Ok(raw.keep_bits(layout.data_bits))
}

/// Build a prime `p` whose `p − 1` has only factors below
/// `max_prime_factor`: multiply random small primes onto 2 until the
/// product reaches `bits` bits, add one, and retry until the result is
/// prime. The seed factor 2 is forced, since `p − 1` is even for every
/// odd prime `p`.
pub fn create_weak_prime(bits: u32, max_prime_factor: u64) -> Result<Integer> {
    ensure!(bits >= 4, "weak prime width {} is too small", bits);
    ensure!(
        max_prime_factor >= 3,
        "the factor bound must admit an odd prime"
    );
    loop {
        let mut p = Integer::from(2);
        while p.significant_bits() < bits {
            p *= random_prime_to(max_prime_factor)?;
        }
        p += 1;
        if probably_prime(&p) {
            return Ok(p);
        }
    }
}
