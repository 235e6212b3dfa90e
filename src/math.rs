// Big-integer helpers - exact division, modular inverse, fixed-width encoding
//
// Every division performed by the attack engine routes through these helpers
// so the rounding policy lives in one place. The interval arithmetic is
// numerically unforgiving: a single off-by-one in a ceiling or floor stalls
// convergence of the search.

use crate::Result;
use crate::error::AttackError;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Ceiling division `⌈a / b⌉` of non-negative integers.
///
/// Computed through `div_rem`, adding one iff the remainder is nonzero.
pub fn ceil_div(a: &BigUint, b: &BigUint) -> BigUint {
    assert!(!b.is_zero(), "division by zero");
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + BigUint::one()
    }
}

/// Floor division `⌊a / b⌋` of non-negative integers.
pub fn floor_div(a: &BigUint, b: &BigUint) -> BigUint {
    assert!(!b.is_zero(), "division by zero");
    a / b
}

/// Modular inverse `a⁻¹ mod n` via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, n) != 1` and no inverse exists.
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let a = BigInt::from(a.clone());
    let n = BigInt::from(n.clone());
    let extended = a.extended_gcd(&n);
    if extended.gcd != BigInt::one() {
        return None;
    }
    let mut inverse = extended.x % &n;
    if inverse.is_negative() {
        inverse += &n;
    }
    inverse.to_biguint()
}

/// Minimal big-endian byte length of `v`; zero for zero.
pub fn byte_len(v: &BigUint) -> usize {
    if v.is_zero() {
        0
    } else {
        ((v.bits() + 7) / 8) as usize
    }
}

/// Big-endian encoding of `v`, left-padded with zeros to exactly `width`
/// bytes.
///
/// Fails when `v` does not fit into `width` bytes. This is how every block
/// handed to an oracle is produced: the byte length must match the modulus
/// block size exactly or the oracle answers for a different number.
pub fn to_fixed_bytes(v: &BigUint, width: usize) -> Result<Vec<u8>> {
    let len = byte_len(v);
    if len > width {
        return Err(AttackError::MessageTooLarge {
            bits: v.bits(),
            width,
        });
    }
    let mut block = vec![0u8; width];
    if len > 0 {
        block[width - len..].copy_from_slice(&v.to_bytes_be());
    }
    Ok(block)
}
