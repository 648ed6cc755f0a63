//! # Oracular — Core Library
//!
//! A didactic RSA playground: build keys over arbitrary-precision integers,
//! encrypt under raw and PKCS#1 v1.5 schemes, then break both with the
//! classical chosen-ciphertext attacks. Everything runs locally; the
//! "oracle" of the padding attack is this crate's own decryption routine,
//! consulted only for its conforming/non-conforming verdict.
//!
//! ## Module Organization
//!
//! **Number-theory kernel** (the bulk of the crate):
//! - [`arith`] — gcd, lcm, binary exponentiation, modular exponentiation,
//!   extended-Euclidean modular inverse.
//! - [`primes`] — the process-wide prime cache, the incremental odd-only
//!   sieve of Eratosthenes behind it, lazy prime/non-prime streams, and
//!   uniform prime selection.
//! - [`primality`] — trial division plus deterministic-for-known-ranges
//!   Miller–Rabin, and probable-prime stepping.
//! - [`factor`] — trial-division factorization, divisor enumeration, the
//!   aliquot predicates (perfect/deficient/abundant/amicable), Euler's
//!   totient and the Carmichael function.
//!
//! **RSA core**:
//! - [`rsa`] — key construction from random or supplied primes, the PKCS#1
//!   v1.5 plaintext block layout, raw and padded encryption/decryption,
//!   and deliberately weak prime construction.
//! - [`entropy`] — OS-CSPRNG draws for key material and padding.
//!
//! **Attack engine**:
//! - [`attack`] — ciphertext malleability demos (homomorphic multiply and
//!   divide), the Bleichenbacher-style PKCS#1 padding-oracle attack, and
//!   the weak-key equivalent-exponent attack.
//!
//! ## Design Notes
//!
//! All arithmetic is on GMP-backed [`rug::Integer`]. The prime cache and
//! the aliquot-sum memo are the only process-wide mutable state; both are
//! append-only behind a lock. Keys are immutable after construction, and
//! attack state is owned by the attacking call.

pub mod arith;
pub mod attack;
pub mod entropy;
pub mod factor;
pub mod primality;
pub mod primes;
pub mod rsa;

pub use rsa::Key;
