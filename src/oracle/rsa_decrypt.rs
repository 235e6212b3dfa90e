// RSA decryption oracle - decrypts submitted ciphertexts before validating
//
// Simulation stand-in for a live server-side oracle: it holds the private
// exponent, performs the textbook RSA decryption, and validates the resulting
// block. Every multiplier the engine sends through this oracle has to be
// encrypted first, exactly as against a real target.

use super::{ConformanceCheck, Pkcs1Oracle};
use crate::error::OracleError;
use crate::key::RsaPublicKey;
use crate::math;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ciphertext-mode padding oracle backed by a local private exponent
#[derive(Debug)]
pub struct RsaDecryptOracle {
    key: RsaPublicKey,
    d: BigUint,
    block_size: usize,
    check: ConformanceCheck,
    queries: AtomicU64,
}

impl RsaDecryptOracle {
    /// Create a lenient decryption oracle for `(key, d)`.
    pub fn new(key: RsaPublicKey, d: BigUint) -> Self {
        let block_size = key.byte_len();
        Self {
            key,
            d,
            block_size,
            check: ConformanceCheck::Lenient,
            queries: AtomicU64::new(0),
        }
    }

    /// Select the conformance mode.
    pub fn with_check(mut self, check: ConformanceCheck) -> Self {
        self.check = check;
        self
    }
}

#[async_trait]
impl Pkcs1Oracle for RsaDecryptOracle {
    fn public_key(&self) -> &RsaPublicKey {
        &self.key
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    async fn check_conformant(&self, block: &[u8]) -> Result<bool, OracleError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if block.len() != self.block_size {
            return Err(OracleError::Protocol {
                details: format!(
                    "expected a {}-byte block, got {} bytes",
                    self.block_size,
                    block.len()
                ),
            });
        }
        let ciphertext = BigUint::from_bytes_be(block);
        if &ciphertext >= self.key.modulus() {
            return Err(OracleError::Protocol {
                details: "ciphertext is not a residue of the modulus".to_string(),
            });
        }
        let plaintext = ciphertext.modpow(&self.d, self.key.modulus());
        let decrypted =
            math::to_fixed_bytes(&plaintext, self.block_size).map_err(|_| OracleError::Protocol {
                details: "decryption result wider than the block size".to_string(),
            })?;
        Ok(self.check.matches(&decrypted))
    }

    fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}
