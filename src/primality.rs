//! # Primality — Deterministic-for-Known-Ranges Miller–Rabin
//!
//! `probably_prime` layers a trial-division pre-filter over Miller–Rabin
//! with witness sets chosen from the published sharp bounds, so every
//! verdict below 3.3·10²⁴ is deterministic; beyond that the primes up to 47
//! give a probabilistic test whose error is far below anything this crate's
//! key sizes can exercise.
//!
//! | n below                          | witnesses        |
//! |----------------------------------|------------------|
//! | 53²                              | (trial division) |
//! | 1 373 653                        | 2, 3             |
//! | 9 080 191                        | 31, 73           |
//! | 4 759 123 141                    | 2, 7, 61         |
//! | 2 152 302 898 747                | primes ≤ 11      |
//! | 3 474 749 660 383                | primes ≤ 13      |
//! | 341 550 071 728 321              | primes ≤ 17      |
//! | 3 825 123 056 546 413 051        | primes ≤ 23      |
//! | 3 317 044 064 679 887 385 961 981| primes ≤ 41      |
//! | otherwise                        | primes ≤ 47      |
//!
//! ## References
//!
//! - Gary L. Miller, "Riemann's Hypothesis and Tests for Primality", 1976.
//! - Michael O. Rabin, "Probabilistic Algorithm for Testing Primality", 1980.
//! - Jaeschke; Sorenson & Webster — strong-pseudoprime bounds behind the
//!   witness table (OEIS [A014233](https://oeis.org/A014233)).

use std::sync::OnceLock;

use rug::Integer;

use crate::arith::powmod_unchecked;
use crate::primes::primes_to;

/// Trial division covers the primes up to this before Miller–Rabin runs.
const TRIAL_LIMIT: u64 = 53;

/// Largest threshold in the witness table; past 64 bits, so parsed once.
fn huge_threshold() -> &'static Integer {
    static HUGE: OnceLock<Integer> = OnceLock::new();
    HUGE.get_or_init(|| {
        "3317044064679887385961981"
            .parse()
            .expect("threshold literal")
    })
}

fn witnesses(n: &Integer) -> Vec<u64> {
    if *n < 1_373_653u64 {
        primes_to(3).collect()
    } else if *n < 9_080_191u64 {
        vec![31, 73]
    } else if *n < 4_759_123_141u64 {
        vec![2, 7, 61]
    } else if *n < 2_152_302_898_747u64 {
        primes_to(11).collect()
    } else if *n < 3_474_749_660_383u64 {
        primes_to(13).collect()
    } else if *n < 341_550_071_728_321u64 {
        primes_to(17).collect()
    } else if *n < 3_825_123_056_546_413_051u64 {
        primes_to(23).collect()
    } else if n < huge_threshold() {
        primes_to(41).collect()
    } else {
        primes_to(47).collect()
    }
}

/// Primality test: trial division by the primes up to
/// `min(53, floor(sqrt(n)))`, then Miller–Rabin over the witness set for
/// `n`'s magnitude. `false` for anything below 2.
pub fn probably_prime(n: &Integer) -> bool {
    if *n < 2 {
        return false;
    }
    let sqrt = n.clone().sqrt();
    let trial_to = if sqrt < TRIAL_LIMIT {
        sqrt.to_u64().unwrap_or(TRIAL_LIMIT)
    } else {
        TRIAL_LIMIT
    };
    for p in primes_to(trial_to) {
        if n.is_divisible_u(p as u32) {
            // p <= sqrt(n), so n == p is impossible here.
            return false;
        }
    }
    if *n < TRIAL_LIMIT * TRIAL_LIMIT {
        // Trial division was exhaustive.
        return true;
    }
    miller_rabin(n, &witnesses(n))
}

/// Core Miller–Rabin: write n−1 = d·2^r with d odd; a witness proves n
/// composite unless a^d lands on 1 or n−1, or some squaring reaches n−1
/// within r−1 steps.
fn miller_rabin(n: &Integer, witnesses: &[u64]) -> bool {
    let n_minus_1 = Integer::from(n - 1u32);
    let r = n_minus_1.find_one(0).unwrap_or(0);
    let d = Integer::from(&n_minus_1 >> r);

    'witness: for &a in witnesses {
        let mut x = powmod_unchecked(&Integer::from(a), &d, n);
        if x == 1 || x == n_minus_1 {
            continue;
        }
        for _ in 1..r {
            x.square_mut();
            x %= n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Smallest odd `m > n` with `probably_prime(m)`; anything below 2 starts
/// the search at 3.
pub fn next_probably_prime(n: &Integer) -> Integer {
    let mut m = if n.is_odd() {
        Integer::from(n + 2u32)
    } else {
        Integer::from(n + 1u32)
    };
    if m < 3 {
        m = Integer::from(3);
    }
    while !probably_prime(&m) {
        m += 2;
    }
    m
}
