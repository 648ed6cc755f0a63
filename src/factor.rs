//! # Factor — Factorization, Divisors, and Multiplicative Functions
//!
//! Trial-division factorization backed by the shared prime cache, divisor
//! enumeration by cartesian expansion over the prime-power basis, the
//! aliquot-sum predicates, Euler's totient and the Carmichael function.
//!
//! The aliquot sum is memoised for the life of the process (the amicable
//! predicate evaluates it twice per query and chains grow slowly), mirroring
//! the prime cache's guarded-singleton shape.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, OnceLock, PoisonError};

use rug::ops::Pow;
use rug::Integer;

use crate::primality::probably_prime;
use crate::primes::primes_to;

/// Prime factorization of `n >= 1` as ascending `(exponent, prime)` pairs
/// whose product is `n`. `factor(1)` is empty.
pub fn factor(n: &Integer) -> Vec<(u32, Integer)> {
    factor_bounded(n, 0)
}

/// Like [`factor`], but when `upto > 0` the trial phase stops at the first
/// prime `>= upto`, leaving whatever remains (possibly composite) as the
/// final entry.
pub fn factor_bounded(n: &Integer, upto: u64) -> Vec<(u32, Integer)> {
    debug_assert!(*n >= 1, "factor requires n >= 1");
    let mut rem = n.clone();
    let mut factors: Vec<(u32, Integer)> = Vec::new();
    if rem <= 1 {
        return factors;
    }
    let mut limit = rem.clone().sqrt();
    for p in primes_to(u64::MAX) {
        if upto > 0 && p >= upto {
            break;
        }
        if limit < p {
            break;
        }
        let pi = Integer::from(p);
        let mut c = 0u32;
        while rem.is_divisible(&pi) {
            rem /= &pi;
            c += 1;
        }
        if c > 0 {
            limit = rem.clone().sqrt();
            factors.push((c, pi));
            // A prime cofactor ends the search early.
            if rem > 1 && probably_prime(&rem) {
                factors.push((1, rem));
                return factors;
            }
        }
    }
    if rem > 1 {
        factors.push((1, rem));
    }
    factors
}

/// All positive divisors of `n`, ascending.
pub fn divisors(n: &Integer) -> Vec<Integer> {
    let mut divs = vec![Integer::from(1)];
    for (c, p) in factor(n) {
        let mut expanded = Vec::with_capacity(divs.len() * (c as usize + 1));
        for d in &divs {
            let mut acc = d.clone();
            expanded.push(acc.clone());
            for _ in 0..c {
                acc *= &p;
                expanded.push(acc.clone());
            }
        }
        divs = expanded;
    }
    divs.sort();
    divs
}

/// Divisors of `n` excluding `n` itself; empty for `n = 1`.
pub fn proper_divisors(n: &Integer) -> Vec<Integer> {
    let mut divs = divisors(n);
    divs.pop();
    divs
}

fn aliquot_memo() -> &'static Mutex<HashMap<Integer, Integer>> {
    static MEMO: OnceLock<Mutex<HashMap<Integer, Integer>>> = OnceLock::new();
    MEMO.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Sum of the proper divisors of `n` (the aliquot sum), memoised for the
/// life of the process.
pub fn sum_proper_divisors(n: &Integer) -> Integer {
    if let Some(hit) = aliquot_memo()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(n)
        .cloned()
    {
        return hit;
    }
    let sum = proper_divisors(n)
        .into_iter()
        .fold(Integer::new(), |acc, d| acc + d);
    aliquot_memo()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(n.clone(), sum.clone());
    sum
}

pub fn is_perfect(n: &Integer) -> bool {
    sum_proper_divisors(n) == *n
}

pub fn is_deficient(n: &Integer) -> bool {
    sum_proper_divisors(n) < *n
}

pub fn is_abundant(n: &Integer) -> bool {
    sum_proper_divisors(n) > *n
}

/// `s(n) != n` and `s(s(n)) == n`. `1` (aliquot sum 0) is never amicable.
pub fn is_amicable(n: &Integer) -> bool {
    let s = sum_proper_divisors(n);
    s != *n && s >= 1 && sum_proper_divisors(&s) == *n
}

/// Euler's totient from the factorization: `prod p^(e-1) · (p-1)`.
pub fn euler_phi(n: &Integer) -> Integer {
    let mut phi = Integer::from(1);
    for (c, p) in factor(n) {
        phi *= Integer::from(&p - 1u32);
        phi *= p.pow(c - 1);
    }
    phi
}

/// λ of one prime power: `p^(e-1)(p-1)`, except `λ(2^e) = 2^(e-2)` for
/// `e >= 3`.
fn lambda_prime_power(c: u32, p: &Integer) -> Integer {
    if *p == 2 && c >= 3 {
        Integer::from(1) << (c - 2)
    } else {
        Integer::from(p - 1u32) * Integer::from(p.pow(c - 1))
    }
}

/// Carmichael function λ(n): the exponent of the multiplicative group
/// mod n, i.e. the lcm of the prime-power λ values.
pub fn carmichael_lambda(n: &Integer) -> Integer {
    carmichael_lambda_list(std::slice::from_ref(n))
}

/// λ of the lcm across several moduli. The lcm is aggregated by tracking
/// the maximum exponent seen for each prime of each prime-power λ.
pub fn carmichael_lambda_list(ns: &[Integer]) -> Integer {
    let mut best: BTreeMap<Integer, u32> = BTreeMap::new();
    for n in ns {
        for (c, p) in factor(n) {
            let lam = lambda_prime_power(c, &p);
            if lam == 1 {
                continue;
            }
            for (lc, lp) in factor(&lam) {
                let entry = best.entry(lp).or_insert(0);
                if lc > *entry {
                    *entry = lc;
                }
            }
        }
    }
    best.into_iter()
        .fold(Integer::from(1), |acc, (p, e)| acc * p.pow(e))
}
