// RSA public key material
//
// The attack only ever sees the public half of the key: the modulus and the
// public exponent, both handed over by the oracle. A minimal owned type keeps
// the engine independent of any particular crypto backend.

use crate::Result;
use crate::error::AttackError;
use crate::math;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// RSA public key `(n, e)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
}

impl RsaPublicKey {
    /// Create a public key, rejecting degenerate parameters.
    pub fn new(n: BigUint, e: BigUint) -> Result<Self> {
        if n < BigUint::from(3u32) {
            return Err(AttackError::InvalidKey {
                details: format!("modulus {} is too small", n),
            });
        }
        if e < BigUint::from(1u32) {
            return Err(AttackError::InvalidKey {
                details: "public exponent must be positive".to_string(),
            });
        }
        Ok(Self { n, e })
    }

    /// Public modulus `n`
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Public exponent `e`
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// Byte length of the modulus: the smallest `k` with `256^k >= n`.
    ///
    /// Every block exchanged with an oracle for this key is exactly this
    /// many bytes unless the oracle overrides it.
    pub fn byte_len(&self) -> usize {
        math::byte_len(&self.n)
    }
}
