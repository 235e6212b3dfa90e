// Query builder - produces the modulus-wide blocks submitted to the oracle
//
// Given the current base value and a multiplier, the builder computes the
// blinded value and serializes it to exactly the oracle's block size. Against
// a real ciphertext oracle the multiplier is encrypted first; against a
// plaintext oracle it is applied directly. The mathematics of the search is
// identical either way.

use crate::Result;
use crate::key::RsaPublicKey;
use crate::math;
use num_bigint::BigUint;

/// Builder for oracle query blocks
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    key: RsaPublicKey,
    block_size: usize,
    plaintext_oracle: bool,
}

impl QueryBuilder {
    pub fn new(key: RsaPublicKey, block_size: usize, plaintext_oracle: bool) -> Self {
        Self {
            key,
            block_size,
            plaintext_oracle,
        }
    }

    /// The blinded value itself: `m * s^e mod n`, or `m * s mod n` for a
    /// plaintext oracle.
    pub fn blinded(&self, m: &BigUint, s: &BigUint) -> BigUint {
        let factor = if self.plaintext_oracle {
            s.clone()
        } else {
            s.modpow(self.key.exponent(), self.key.modulus())
        };
        (m * factor) % self.key.modulus()
    }

    /// Blind `m` with `s` and serialize to exactly the block size.
    pub fn prepare(&self, m: &BigUint, s: &BigUint) -> Result<Vec<u8>> {
        math::to_fixed_bytes(&self.blinded(m, s), self.block_size)
    }

    /// Serialize `v mod n` without multiplication.
    pub fn prepare_raw(&self, v: &BigUint) -> Result<Vec<u8>> {
        math::to_fixed_bytes(&(v % self.key.modulus()), self.block_size)
    }
}
