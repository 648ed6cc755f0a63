//! # Entropy — OS-Backed Randomness for Key Material
//!
//! Key generation and PKCS#1 padding must draw from a cryptographically
//! strong source, so everything here goes through the operating system's
//! CSPRNG. The attack engine deliberately uses no randomness at all.

use rand::rngs::OsRng;
use rand::RngCore;
use rug::integer::Order;
use rug::Integer;

/// Uniform integer in `[0, 2^bits)`.
pub fn random_bits(bits: u32) -> Integer {
    if bits == 0 {
        return Integer::new();
    }
    let mut buf = vec![0u8; ((bits + 7) / 8) as usize];
    OsRng.fill_bytes(&mut buf);
    let mut n = Integer::from_digits(&buf, Order::Msf);
    n.keep_bits_mut(bits);
    n
}

/// One raw 64-bit draw from the OS CSPRNG.
pub fn random_u64() -> u64 {
    OsRng.next_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bits_respects_width() {
        assert_eq!(random_bits(0), 0);
        for bits in [1u32, 7, 8, 9, 63, 64, 65, 256] {
            for _ in 0..16 {
                let n = random_bits(bits);
                assert!(n.significant_bits() <= bits, "{} bits drew {}", bits, n);
                assert!(n >= 0);
            }
        }
    }

    #[test]
    fn random_bits_eventually_fills_top_bit() {
        // 256 draws of 8 bits each: the top bit shows up with probability
        // 1 - 2^-256 for a working generator.
        let hit = (0..256).any(|_| random_bits(8).significant_bits() == 8);
        assert!(hit);
    }

    #[test]
    fn random_u64_varies() {
        let a = random_u64();
        let b = random_u64();
        let c = random_u64();
        assert!(a != b || b != c);
    }
}
