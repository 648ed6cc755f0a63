//! # Primes — The Process-Wide Prime Cache and Incremental Sieve
//!
//! One ordered, monotonically growing list of primes serves the whole
//! process. It starts at `[2, 3]` and is extended on demand by an
//! incremental sieve of Eratosthenes: each pass covers the half-open range
//! `(sieved_to, min(2·sieved_to, limit, PRIME_CACHE_LIMIT)]` with a packed
//! odd-only bitmap, crossing out multiples of every already-cached odd
//! prime starting at its least odd multiple past the frontier. Doubling the
//! frontier per pass keeps the amortized cost near a one-shot sieve while
//! letting callers grow the cache a little at a time.
//!
//! After any sieve call the cache also holds one *lookahead* prime beyond
//! the sieved frontier — several kernel algorithms (trial factorization in
//! particular) peek one prime past their nominal limit.
//!
//! The cache is capped at [`PRIME_CACHE_LIMIT`]. Streams that need primes
//! beyond the cap fall back to stepping odd candidates through
//! [`probably_prime`] one at a time.
//!
//! ## Concurrency
//!
//! All access goes through one mutex: sieve passes are serialised and
//! idempotent, and readers always observe a consistent, append-only view.
//! The lookahead is computed outside the lock (it runs Miller–Rabin, which
//! itself reads the cache) and re-checked before being stored.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{ensure, Result};
use rand::rngs::OsRng;
use rand::Rng;
use rug::Integer;
use tracing::debug;

use crate::primality::{next_probably_prime, probably_prime};

/// Largest value the sieve cache may cover. Primes beyond this are produced
/// by per-candidate Miller–Rabin instead of sieving.
pub const PRIME_CACHE_LIMIT: u64 = 500_000_000;

/// Cache state: every prime `<= sieved_to` in ascending order, plus one
/// lookahead prime beyond the frontier.
struct PrimeCache {
    primes: Vec<u64>,
    sieved_to: u64,
    lookahead: Option<u64>,
}

static CACHE: Mutex<PrimeCache> = Mutex::new(PrimeCache {
    primes: Vec::new(),
    sieved_to: 0,
    lookahead: None,
});

fn cache() -> MutexGuard<'static, PrimeCache> {
    let mut guard = CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.primes.is_empty() {
        guard.primes.extend_from_slice(&[2, 3]);
        guard.sieved_to = 3;
    }
    guard
}

/// Packed bitmap over the odd candidates of one sieve pass. Bit `i` tracks
/// `base + 2i`; a set bit means the candidate has not been crossed out.
struct SieveWindow {
    words: Vec<u64>,
    base: u64,
}

impl SieveWindow {
    fn all_set(base: u64, len: usize) -> Self {
        debug_assert!(base % 2 == 1);
        let num_words = (len + 63) / 64;
        let mut words = vec![u64::MAX; num_words];
        let extra = num_words * 64 - len;
        if extra > 0 && num_words > 0 {
            words[num_words - 1] >>= extra;
        }
        SieveWindow { words, base }
    }

    fn cross_out(&mut self, v: u64) {
        debug_assert!(v >= self.base && (v - self.base) % 2 == 0);
        let idx = ((v - self.base) / 2) as usize;
        self.words[idx / 64] &= !(1u64 << (idx % 64));
    }

    /// Surviving candidates in ascending order.
    fn surviving(&self) -> impl Iterator<Item = u64> + '_ {
        let base = self.base;
        self.words.iter().enumerate().flat_map(move |(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let tz = w.trailing_zeros() as u64;
                w &= w - 1;
                Some(base + 2 * (wi as u64 * 64 + tz))
            })
        })
    }
}

/// One doubling pass: sieve `(sieved_to, min(2·sieved_to, goal)]` and append
/// the survivors. Returns whether the frontier moved.
fn extend_step(cache: &mut PrimeCache, goal: u64) -> bool {
    let goal = goal.min(PRIME_CACHE_LIMIT);
    if cache.sieved_to >= goal {
        return false;
    }
    let lo = cache.sieved_to;
    let hi = goal.min(lo.saturating_mul(2));
    let first = if lo % 2 == 0 { lo + 1 } else { lo + 2 };
    if first > hi {
        cache.sieved_to = hi;
        return true;
    }
    let len = ((hi - first) / 2 + 1) as usize;
    let mut window = SieveWindow::all_set(first, len);

    // Cross out multiples of each cached odd prime, starting at the least
    // odd multiple strictly past the frontier. Primes up to sqrt(hi) always
    // exist in the cache because hi <= 2·lo.
    let mut i = 1; // skip 2: the window holds odd candidates only
    while i < cache.primes.len() {
        let p = cache.primes[i];
        if p.saturating_mul(p) > hi {
            break;
        }
        let mut m = (lo / p + 1) * p;
        if m % 2 == 0 {
            m += p;
        }
        while m <= hi {
            window.cross_out(m);
            m += 2 * p;
        }
        i += 1;
    }

    for p in window.surviving() {
        cache.primes.push(p);
    }
    cache.sieved_to = hi;
    debug!(sieved_to = hi, cached = cache.primes.len(), "sieve pass appended");
    true
}

fn extend(cache: &mut PrimeCache, limit: u64) {
    while extend_step(cache, limit) {}
}

/// Recompute the lookahead prime when the frontier has passed it. Runs the
/// probable-prime search outside the cache lock and re-checks before
/// storing, so concurrent sievers stay consistent.
fn ensure_lookahead() {
    let (last, stale) = {
        let c = cache();
        let last = c.primes.last().copied().unwrap_or(3);
        let stale = match c.lookahead {
            Some(l) => l <= c.sieved_to,
            None => true,
        };
        (last, stale)
    };
    if !stale {
        return;
    }
    let next = next_probably_prime(&Integer::from(last)).to_u64();
    let mut c = cache();
    if c.primes.last().copied() == Some(last) {
        c.lookahead = next;
    }
}

/// Grow the cache so it holds every prime `<= min(limit, PRIME_CACHE_LIMIT)`
/// plus one lookahead prime past the frontier. Idempotent and monotonic;
/// calling with a smaller limit than before is a no-op.
pub fn sieve_eratosthenes(limit: u64) {
    {
        let mut c = cache();
        extend(&mut c, limit);
    }
    ensure_lookahead();
}

/// Lazy ascending stream of the primes `<= limit`. Values up to the cache
/// cap come from the sieve; past it, odd candidates are screened one by one.
pub fn primes_to(limit: u64) -> Primes {
    Primes {
        limit,
        idx: 0,
        beyond: None,
    }
}

pub struct Primes {
    limit: u64,
    idx: usize,
    beyond: Option<u64>,
}

impl Iterator for Primes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if let Some(prev) = self.beyond {
            let mut cand = prev.checked_add(2)?;
            loop {
                if cand > self.limit {
                    return None;
                }
                if probably_prime(&Integer::from(cand)) {
                    self.beyond = Some(cand);
                    return Some(cand);
                }
                cand = cand.checked_add(2)?;
            }
        }
        loop {
            {
                let mut c = cache();
                if let Some(&p) = c.primes.get(self.idx) {
                    if p <= self.limit {
                        self.idx += 1;
                        return Some(p);
                    }
                    return None;
                }
                if extend_step(&mut c, self.limit) {
                    continue;
                }
            }
            // Cache saturated at the cap: hand over to the lookahead and
            // per-candidate testing.
            ensure_lookahead();
            let look = cache().lookahead?;
            if look > self.limit {
                return None;
            }
            self.beyond = Some(look);
            return Some(look);
        }
    }
}

/// Lazy ascending stream of the positive integers `<= limit` that are not
/// prime, `1` included.
pub fn not_primes_to(limit: u64) -> NotPrimes {
    NotPrimes {
        limit,
        next: 1,
        primes: primes_to(limit),
        upcoming: None,
        started: false,
    }
}

pub struct NotPrimes {
    limit: u64,
    next: u64,
    primes: Primes,
    upcoming: Option<u64>,
    started: bool,
}

impl Iterator for NotPrimes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if !self.started {
            self.started = true;
            self.upcoming = self.primes.next();
        }
        loop {
            if self.next > self.limit {
                return None;
            }
            let n = self.next;
            self.next += 1;
            match self.upcoming {
                Some(p) if p == n => self.upcoming = self.primes.next(),
                _ => return Some(n),
            }
        }
    }
}

/// Uniformly random prime `<= limit`, selected from the sieve cache with
/// the OS CSPRNG. The limit must not exceed [`PRIME_CACHE_LIMIT`].
pub fn random_prime_to(limit: u64) -> Result<u64> {
    ensure!(
        limit <= PRIME_CACHE_LIMIT,
        "random_prime_to: limit {} exceeds the prime cache cap {}",
        limit,
        PRIME_CACHE_LIMIT
    );
    ensure!(limit >= 2, "random_prime_to: no prime <= {}", limit);
    let pick = {
        let mut c = cache();
        extend(&mut c, limit);
        let count = c.primes.partition_point(|&p| p <= limit);
        let idx = OsRng.gen_range(0..count);
        c.primes[idx]
    };
    ensure_lookahead();
    Ok(pick)
}
