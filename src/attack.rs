//! # Attack — Malleability Demos and the PKCS#1 Padding Oracle
//!
//! Three classical attacks against the RSA core, ordered by weight:
//!
//! 1. **Raw malleability** — textbook RSA is multiplicative, so a
//!    ciphertext can be multiplied (or divided) by `t^e mod n` and the
//!    hidden plaintext moves with it. The demos decrypt the mauled
//!    ciphertexts to make the homomorphism visible.
//! 2. **Padding oracle** — an adaptive chosen-ciphertext attack in the
//!    style of Bleichenbacher. The attacker sees only whether
//!    `c·s^e mod n` decrypts to a conforming block (command field
//!    `0x0002`, i.e. a plaintext in `[2B, 3B)` for `B = 1 << cmd_offset`).
//!    Each accepted multiplier `s` narrows an interval set known to
//!    contain the plaintext until a single value remains.
//! 3. **Weak keys** — when `p − 1` and `q − 1` share many small factors,
//!    their shared smooth part `A` makes `phi/A` a multiple of the
//!    Carmichael exponent, so `A` distinct private exponents decrypt
//!    identically. The attack computes `A` from bounded factorizations and
//!    verifies every equivalent exponent against a sample ciphertext.
//!
//! The interval engine is written against a *multiplier oracle*
//! (`s ↦ conforming?`); the public entry point instantiates it with the
//! real decryption of `c·s^e mod n`, so the private exponent never leaves
//! the oracle closure.
//!
//! ## References
//!
//! - D. Bleichenbacher, "Chosen Ciphertext Attacks Against Protocols Based
//!   on the RSA Encryption Standard PKCS #1", CRYPTO '98.
//! - D. Boneh, "Twenty Years of Attacks on the RSA Cryptosystem", Notices
//!   of the AMS 46(2), 1999.

use anyhow::{bail, ensure, Result};
use rayon::prelude::*;
use rug::ops::{DivRounding, Pow};
use rug::Integer;
use tracing::{debug, info, warn};

use crate::arith::{mult_inverse, powmod};
use crate::factor::factor_bounded;
use crate::rsa::{decrypt_pkcs1, decrypt_raw, encrypt_raw, Key};

/// Deterministic plaintexts for the malleability demos.
const DEMO_PLAINTEXTS: std::ops::Range<u32> = 2..24;

/// Trial-division bound when factoring `p − 1` and `q − 1`.
const WEAK_FACTOR_BOUND: u64 = 50_000;

/// Enumerations larger than this are reported but not executed.
const MAX_ENUMERATION: u32 = 1000;

/// Multiply a plaintext inside its ciphertext: for each demo plaintext
/// `m`, decrypting `encrypt(m)·t^e mod n` yields `t·m mod n`. Returns the
/// `(m, recovered)` rows.
pub fn attack_raw_multiply(key: &Key, t: u64) -> Result<Vec<(Integer, Integer)>> {
    let f = powmod(&Integer::from(t), &key.e, &key.n)?;
    malleate(key, &f)
}

/// Divide a plaintext inside its ciphertext: the multiplier is
/// `(t⁻¹)^e mod n`, so plaintexts divisible by `t` come back divided.
pub fn attack_raw_divide(key: &Key, t: u64) -> Result<Vec<(Integer, Integer)>> {
    let inv = mult_inverse(&Integer::from(t), &key.n)?;
    ensure!(inv != 0, "{} is not invertible modulo n", t);
    let f = powmod(&inv, &key.e, &key.n)?;
    malleate(key, &f)
}

fn malleate(key: &Key, f: &Integer) -> Result<Vec<(Integer, Integer)>> {
    let mut rows = Vec::new();
    for m in DEMO_PLAINTEXTS {
        let m = Integer::from(m);
        let c = Integer::from(encrypt_raw(key, &m)? * f) % &key.n;
        let recovered = decrypt_raw(key, &c)?;
        rows.push((m, recovered));
    }
    Ok(rows)
}

/// Outcome of a padding-oracle run: the recovered conforming block, the
/// number of oracle queries, and the narrowing rounds taken.
#[derive(Clone, Debug)]
pub struct Recovery {
    pub plaintext: Integer,
    pub oracle_calls: u64,
    pub rounds: u32,
}

/// Adaptive chosen-ciphertext attack against [`decrypt_pkcs1`]. Consumes
/// only the conforming/non-conforming verdict of each query and returns
/// the full plaintext block of `c` along with the query count.
pub fn attack_pkcs1(key: &Key, c: &Integer) -> Result<Recovery> {
    let layout = key.layout()?;
    let b = Integer::from(1) << layout.cmd_offset;
    recover(&key.n, &b, |s| {
        let cs = Integer::from(c * powmod(s, &key.e, &key.n)?) % &key.n;
        Ok(decrypt_pkcs1(key, &cs)? != 0)
    })
}

/// The interval-narrowing engine. `conforming(s)` must answer whether
/// `m·s mod n` is a conforming block for the hidden plaintext `m`;
/// `b` is `1 << cmd_offset`, so conforming means landing in `[2b, 3b)`.
fn recover<F>(n: &Integer, b: &Integer, mut conforming: F) -> Result<Recovery>
where
    F: FnMut(&Integer) -> Result<bool>,
{
    let two_b = Integer::from(2u32 * b);
    let three_b = Integer::from(3u32 * b);
    let mut m: Vec<(Integer, Integer)> =
        vec![(two_b.clone(), Integer::from(&three_b - 1u32))];
    let mut s_prev = Integer::from(1);
    let mut calls = 0u64;
    let mut rounds = 0u32;

    loop {
        if m.len() == 1 && m[0].0 == m[0].1 {
            let found = m.remove(0).0;
            info!(rounds, oracle_calls = calls, "padding oracle attack converged");
            return Ok(Recovery {
                plaintext: found,
                oracle_calls: calls,
                rounds,
            });
        }
        rounds += 1;

        // Choose the next multiplier: 11n over the remaining span, forced
        // strictly increasing, then advanced until the oracle accepts.
        let span = Integer::from(&m[m.len() - 1].1 - &m[0].0);
        let mut s = Integer::from(11u32 * n) / span;
        if s <= s_prev {
            s = Integer::from(&s_prev * 53u32) / 47u32 + 1u32;
        }
        loop {
            calls += 1;
            if conforming(&s)? {
                break;
            }
            s += 1;
        }
        debug!(round = rounds, s = %s, oracle_calls = calls, "multiplier accepted");

        // Every interval is intersected with the congruence
        // 2b <= m·s − r·n < 3b for each feasible wrap count r.
        let mut refined: Vec<(Integer, Integer)> = Vec::new();
        for (a, bb) in &m {
            refine_interval(a, bb, &s, n, &two_b, &three_b, &mut refined);
        }
        refined.sort();
        m = merge_intervals(refined);
        if m.is_empty() {
            bail!("interval set collapsed; the oracle answered inconsistently");
        }
        debug!(round = rounds, intervals = m.len(), "intervals refined");
        s_prev = s;
    }
}

/// Emit the sub-intervals of `[a, bb]` compatible with the accepted
/// multiplier `s`: for each wrap count `r` from `⌈(a·s − 3b + 1)/n⌉`
/// upward, the plaintext must lie in
/// `[⌈(2b + r·n)/s⌉, ⌊(3b − 1 + r·n)/s⌋]` clamped to `[a, bb]`. Stops
/// once the lower bound passes `bb`.
fn refine_interval(
    a: &Integer,
    bb: &Integer,
    s: &Integer,
    n: &Integer,
    two_b: &Integer,
    three_b: &Integer,
    out: &mut Vec<(Integer, Integer)>,
) {
    let mut r = (Integer::from(a * s) - three_b + 1u32).div_ceil(n);
    loop {
        let rn = Integer::from(&r * n);
        let lower = Integer::from(two_b + &rn).div_ceil(s);
        if lower > *bb {
            break;
        }
        let upper = (Integer::from(three_b + &rn) - 1u32).div_floor(s);
        let lo = lower.max(a.clone());
        let hi = upper.min(bb.clone());
        if lo <= hi {
            out.push((lo, hi));
        }
        r += 1;
    }
}

/// Merge sorted closed intervals, joining any that overlap or touch
/// (`prev.b + 1 >= next.a`).
fn merge_intervals(sorted: Vec<(Integer, Integer)>) -> Vec<(Integer, Integer)> {
    let mut merged: Vec<(Integer, Integer)> = Vec::with_capacity(sorted.len());
    for (a, b) in sorted {
        if let Some((_, last_b)) = merged.last_mut() {
            if Integer::from(&*last_b + 1u32) >= a {
                if b > *last_b {
                    *last_b = b;
                }
                continue;
            }
        }
        merged.push((a, b));
    }
    merged
}

/// Outcome of the weak-key sweep: the shared smooth part `A` of `p − 1`
/// and `q − 1`, the exponent stride `phi/A`, and the equivalent private
/// exponents verified against a sample ciphertext (empty when the
/// enumeration was skipped).
#[derive(Clone, Debug)]
pub struct WeakKeyReport {
    pub shared: Integer,
    pub stride: Integer,
    pub equivalent: Vec<Integer>,
    pub enumerated: bool,
}

/// Exploit shared small factors of `p − 1` and `q − 1`: with `A` their
/// common smooth part, every exponent `d_k = (d + k·phi/A) mod phi` for
/// `k` in `[0, A)` decrypts identically. Each candidate is verified
/// against a sample ciphertext; enumerations past [`MAX_ENUMERATION`]
/// are reported but skipped.
pub fn attack_weak_key(key: &Key) -> Result<WeakKeyReport> {
    ensure!(
        key.primes.len() == 2,
        "the weak-key attack expects a two-prime key"
    );
    let p1 = Integer::from(&key.primes[0] - 1u32);
    let q1 = Integer::from(&key.primes[1] - 1u32);
    let fp = factor_bounded(&p1, WEAK_FACTOR_BOUND);
    let fq = factor_bounded(&q1, WEAK_FACTOR_BOUND);

    // Shared prime powers, minimum exponent on either side.
    let mut shared = Integer::from(1);
    for (cp, p) in &fp {
        if let Some((cq, _)) = fq.iter().find(|(_, q)| q == p) {
            shared *= Integer::from(p.pow((*cp).min(*cq)));
        }
    }
    let stride = Integer::from(&key.phi / &shared);
    info!(shared = %shared, "shared smooth part of p-1 and q-1");

    let count = match shared.to_u32() {
        Some(a) if a <= MAX_ENUMERATION => a,
        _ => {
            warn!(
                shared = %shared,
                "shared factor exceeds {}; skipping exponent enumeration",
                MAX_ENUMERATION
            );
            return Ok(WeakKeyReport {
                shared,
                stride,
                equivalent: Vec::new(),
                enumerated: false,
            });
        }
    };

    // Every candidate must decrypt the sample; a failure would mean the
    // shared part was computed wrong.
    let sample = Integer::from(12345u32) % &key.n;
    let c = encrypt_raw(key, &sample)?;
    let checked: Result<Vec<(Integer, bool)>> = (0..count)
        .into_par_iter()
        .map(|k| {
            let dk = Integer::from(&key.d + Integer::from(&stride * k)) % &key.phi;
            let ok = powmod(&c, &dk, &key.n)? == sample;
            Ok((dk, ok))
        })
        .collect();
    let mut equivalent = Vec::with_capacity(count as usize);
    for (dk, ok) in checked? {
        ensure!(ok, "candidate exponent {} failed to decrypt the sample", dk);
        equivalent.push(dk);
    }
    info!(count = equivalent.len(), "equivalent private exponents verified");
    Ok(WeakKeyReport {
        shared,
        stride,
        equivalent,
        enumerated: true,
    })
}
