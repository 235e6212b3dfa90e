// Plaintext oracle - validates PKCS#1 framing directly on submitted blocks
//
// The submitted block is treated as the decryption result itself, so the
// engine's multipliers stay unencrypted. This is the reproducible-simulation
// mode: runs are fast, need no private key, and exercise the full search
// arithmetic against a trusted reference decoder.

use super::{ConformanceCheck, Pkcs1Oracle};
use crate::error::OracleError;
use crate::key::RsaPublicKey;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Plaintext-mode padding oracle
#[derive(Debug)]
pub struct PlaintextPkcs1Oracle {
    key: RsaPublicKey,
    block_size: usize,
    check: ConformanceCheck,
    queries: AtomicU64,
}

impl PlaintextPkcs1Oracle {
    /// Create a lenient plaintext oracle with the key's natural block size.
    pub fn new(key: RsaPublicKey) -> Self {
        let block_size = key.byte_len();
        Self {
            key,
            block_size,
            check: ConformanceCheck::Lenient,
            queries: AtomicU64::new(0),
        }
    }

    /// Override the block size.
    ///
    /// Degenerate test moduli need a block wider than the modulus itself so
    /// that `B = 256^(k - 2)` stays positive.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Select the conformance mode.
    pub fn with_check(mut self, check: ConformanceCheck) -> Self {
        self.check = check;
        self
    }
}

#[async_trait]
impl Pkcs1Oracle for PlaintextPkcs1Oracle {
    fn public_key(&self) -> &RsaPublicKey {
        &self.key
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn is_plaintext_oracle(&self) -> bool {
        true
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
        Ok(self.check.matches(block))
    }

    fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}
