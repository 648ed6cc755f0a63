//! # Arith — Ring Operations over Arbitrary-Precision Integers
//!
//! The bottom layer of the number-theory kernel: Euclidean gcd/lcm, binary
//! exponentiation (plain and modular), and the extended-Euclidean modular
//! inverse. Everything operates on GMP-backed [`rug::Integer`] values; the
//! exponentiation loops walk the exponent's bits directly rather than
//! recursing.
//!
//! Domain errors (negative exponents, non-positive moduli, `lcm(0, 0)`)
//! are surfaced to the caller; the modular inverse signals a non-invertible
//! argument with the value `0` instead of an error, which downstream code
//! (public-exponent search, the padding oracle) relies on.

use anyhow::{bail, Result};
use rug::ops::RemRounding;
use rug::Integer;

/// Greatest common divisor by the classical Euclidean algorithm, on
/// magnitudes. `gcd(0, 0) = 0` and `gcd(a, 0) = |a|`.
pub fn gcd(a: &Integer, b: &Integer) -> Integer {
    let mut a = Integer::from(a.abs_ref());
    let mut b = Integer::from(b.abs_ref());
    while b != 0 {
        let r = Integer::from(&a % &b);
        a = b;
        b = r;
    }
    a
}

/// Least common multiple: `|a·b| / gcd(a, b)`, with `lcm(0, x) = 0`.
/// `lcm(0, 0)` divides by zero and is rejected.
pub fn lcm(a: &Integer, b: &Integer) -> Result<Integer> {
    let g = gcd(a, b);
    if g == 0 {
        bail!("lcm(0, 0) is undefined");
    }
    Ok(Integer::from(a * b).abs() / g)
}

/// Binary exponentiation: `base^exp`, with `power(·, 0) = 1`.
pub fn power(base: &Integer, exp: u32) -> Integer {
    let mut acc = Integer::from(1);
    let mut sq = base.clone();
    let mut e = exp;
    while e > 0 {
        if e & 1 == 1 {
            acc *= &sq;
        }
        e >>= 1;
        if e > 0 {
            sq.square_mut();
        }
    }
    acc
}

/// Binary modular exponentiation: `base^exp mod modulus`, result in
/// `[0, modulus)`. Requires `exp >= 0` and `modulus >= 1`.
pub fn powmod(base: &Integer, exp: &Integer, modulus: &Integer) -> Result<Integer> {
    if *exp < 0 {
        bail!("powmod: negative exponent {}", exp);
    }
    if *modulus < 1 {
        bail!("powmod: modulus must be positive, got {}", modulus);
    }
    Ok(powmod_unchecked(base, exp, modulus))
}

/// `powmod` with the domain checks already done by the caller.
pub(crate) fn powmod_unchecked(base: &Integer, exp: &Integer, modulus: &Integer) -> Integer {
    debug_assert!(*exp >= 0 && *modulus >= 1);
    if *modulus == 1 {
        return Integer::new();
    }
    let mut acc = Integer::from(1);
    let mut sq = base.clone().rem_euc(modulus);
    let bits = exp.significant_bits();
    for i in 0..bits {
        if exp.get_bit(i) {
            acc *= &sq;
            acc %= modulus;
        }
        if i + 1 < bits {
            sq.square_mut();
            sq %= modulus;
        }
    }
    acc
}

/// Extended-Euclidean modular inverse. Returns `0` when `gcd(a, n) != 1`,
/// otherwise the unique inverse in `[1, n-1]`. Requires `n >= 1`; the
/// intermediate Bezout coefficients are the only negatives in the kernel.
pub fn mult_inverse(a: &Integer, n: &Integer) -> Result<Integer> {
    if *n < 1 {
        bail!("mult_inverse: modulus must be positive, got {}", n);
    }
    let mut t1 = Integer::new();
    let mut t2 = Integer::from(1);
    let mut r1 = n.clone();
    let mut r2 = a.clone().rem_euc(n);

    while r2 != 0 {
        let q = Integer::from(&r1 / &r2);
        let t3 = t1 - Integer::from(&q * &t2);
        t1 = t2;
        t2 = t3;
        let r3 = r1 - q * &r2;
        r1 = r2;
        r2 = r3;
    }

    if r1 > 1 {
        return Ok(Integer::new());
    }
    if t1 < 0 {
        t1 += n;
    }
    Ok(t1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Integer {
        Integer::from(v)
    }

    #[test]
    fn gcd_known_values() {
        assert_eq!(gcd(&int(462), &int(1071)), 21);
        assert_eq!(gcd(&int(1071), &int(462)), 21);
        assert_eq!(gcd(&int(0), &int(0)), 0);
        assert_eq!(gcd(&int(-12), &int(0)), 12);
        assert_eq!(gcd(&int(-12), &int(-18)), 6);
        assert_eq!(gcd(&int(17), &int(13)), 1);
    }

    #[test]
    fn lcm_known_values() {
        assert_eq!(lcm(&int(462), &int(1071)).unwrap(), 23562);
        assert_eq!(lcm(&int(0), &int(7)).unwrap(), 0);
        assert_eq!(lcm(&int(-4), &int(6)).unwrap(), 12);
        assert!(lcm(&int(0), &int(0)).is_err());
    }

    #[test]
    fn gcd_times_lcm_is_product() {
        for (a, b) in [(12i64, 18), (100, 75), (7, 13), (1, 999), (360, 48)] {
            let (a, b) = (int(a), int(b));
            let g = gcd(&a, &b);
            let l = lcm(&a, &b).unwrap();
            assert_eq!(g * l, Integer::from(&a * &b));
        }
    }

    #[test]
    fn power_small_cases() {
        assert_eq!(power(&int(0), 0), 1);
        assert_eq!(power(&int(5), 0), 1);
        assert_eq!(power(&int(2), 10), 1024);
        assert_eq!(power(&int(-3), 3), -27);
        let expected: Integer = "1000000000000000000000000000000".parse().unwrap();
        assert_eq!(power(&int(10), 30), expected);
    }

    #[test]
    fn powmod_known_values() {
        // 4^13 mod 497 = 445
        assert_eq!(powmod(&int(4), &int(13), &int(497)).unwrap(), 445);
        assert_eq!(powmod(&int(2), &int(0), &int(7)).unwrap(), 1);
        assert_eq!(powmod(&int(9), &int(5), &int(1)).unwrap(), 0);
        // Negative bases are reduced into [0, m) first.
        assert_eq!(powmod(&int(-2), &int(3), &int(7)).unwrap(), 6);
    }

    #[test]
    fn powmod_rejects_bad_domain() {
        assert!(powmod(&int(2), &int(-1), &int(7)).is_err());
        assert!(powmod(&int(2), &int(3), &int(0)).is_err());
        assert!(powmod(&int(2), &int(3), &int(-5)).is_err());
    }

    #[test]
    fn powmod_matches_power_reduced() {
        for base in 0i64..8 {
            for exp in 0u32..12 {
                for m in 1i64..9 {
                    let expected = power(&int(base), exp) % int(m);
                    let got = powmod(&int(base), &Integer::from(exp), &int(m)).unwrap();
                    assert_eq!(got, expected, "base={} exp={} m={}", base, exp, m);
                }
            }
        }
    }

    #[test]
    fn mult_inverse_known_values() {
        // 7 * 23 = 161 = 4*40 + 1
        assert_eq!(mult_inverse(&int(7), &int(40)).unwrap(), 23);
        assert_eq!(mult_inverse(&int(3), &int(7)).unwrap(), 5);
        // Non-coprime arguments yield the 0 sentinel.
        assert_eq!(mult_inverse(&int(6), &int(40)).unwrap(), 0);
        assert_eq!(mult_inverse(&int(0), &int(40)).unwrap(), 0);
    }

    #[test]
    fn mult_inverse_rejects_bad_modulus() {
        assert!(mult_inverse(&int(3), &int(0)).is_err());
        assert!(mult_inverse(&int(3), &int(-7)).is_err());
    }

    /// Cross-validate the hand-rolled square-and-multiply loop against
    /// GMP's own modular exponentiation across mixed magnitudes.
    #[test]
    fn powmod_matches_gmp() {
        let cases: &[(&str, &str, &str)] = &[
            ("2", "1000", "1000003"),
            ("123456789", "987654321", "1000000007"),
            ("98765432123456789", "12345678998765", "340282366920938463463374607431768211507"),
            ("3", "0", "7"),
            ("0", "5", "11"),
        ];
        for (b, e, m) in cases {
            let b: Integer = b.parse().unwrap();
            let e: Integer = e.parse().unwrap();
            let m: Integer = m.parse().unwrap();
            let expected = b.clone().pow_mod(&e, &m).unwrap();
            assert_eq!(powmod(&b, &e, &m).unwrap(), expected, "{}^{} mod {}", b, e, m);
        }
    }

    /// gcd against GMP's implementation over a dense small grid.
    #[test]
    fn gcd_matches_gmp_on_grid() {
        for a in 0i64..40 {
            for b in 0i64..40 {
                let expected = int(a).gcd(&int(b));
                assert_eq!(gcd(&int(a), &int(b)), expected, "gcd({}, {})", a, b);
            }
        }
    }

    #[test]
    fn mult_inverse_roundtrips() {
        for a in 1i64..50 {
            for n in 2i64..30 {
                let inv = mult_inverse(&int(a), &int(n)).unwrap();
                if gcd(&int(a), &int(n)) == 1 {
                    assert!(inv >= 1 && inv < n);
                    assert_eq!(int(a) * inv % int(n), 1, "a={} n={}", a, n);
                } else {
                    assert_eq!(inv, 0, "a={} n={}", a, n);
                }
            }
        }
    }
}
