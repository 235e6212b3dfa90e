// Error types for OracleRun
//
// This module provides structured error types using thiserror. Oracle-level
// transport failures are kept separate from attack-level failures: the former
// are retryable (the engine state stays valid and a repeated attack call
// resumes at the failed query), the latter are terminal for the run.

use crate::attack::AttackProgress;
use std::io;
use thiserror::Error;

/// Failure of the underlying padding oracle call
///
/// These originate outside the attack arithmetic (network I/O, protocol
/// violations) and propagate to the caller unchanged.
#[derive(Debug, Error)]
pub enum OracleError {
    /// I/O failure while talking to the oracle
    #[error("oracle I/O failure: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// The oracle endpoint misbehaved or rejected the query shape
    #[error("oracle protocol error: {details}")]
    Protocol { details: String },

    /// Generic oracle failure with context
    #[error("{0}")]
    Other(String),
}

/// Main error type for OracleRun operations
#[derive(Debug, Error)]
pub enum AttackError {
    /// An oracle query failed; the engine remains valid for retry
    #[error("oracle query failed: {0}")]
    Oracle(#[from] OracleError),

    /// Interval narrowing eliminated every candidate
    ///
    /// Fatal: the oracle is lying, the ciphertext does not belong to this
    /// key, or the key parameters are wrong.
    #[error("interval narrowing produced no candidates at iteration {iteration}")]
    NoCandidates { iteration: u64 },

    /// The blinding factor has no inverse modulo n
    ///
    /// Implies `gcd(s0, n) != 1`, which for a real RSA modulus means a factor
    /// of n was just found by accident.
    #[error("blinding factor is not invertible modulo the modulus")]
    NotInvertible,

    /// The target ciphertext is not a residue of the modulus
    #[error("ciphertext ({len} bytes) is not smaller than the modulus")]
    InputTooLarge { len: usize },

    /// The oracle's block size cannot carry this modulus
    #[error("block size {block_size} is unusable for a {modulus_bits}-bit modulus")]
    InvalidBlockSize {
        block_size: usize,
        modulus_bits: u64,
    },

    /// Degenerate RSA public key parameters
    #[error("invalid RSA public key: {details}")]
    InvalidKey { details: String },

    /// A value does not fit the fixed block width
    #[error("value of {bits} bits does not fit into {width} bytes")]
    MessageTooLarge { bits: u64, width: usize },

    /// Cooperative cancellation tripped between oracle queries
    #[error("attack cancelled after {} oracle queries", .progress.oracle_queries)]
    Cancelled { progress: Box<AttackProgress> },

    /// The configured query budget ran out
    #[error("query limit of {limit} reached after {} oracle queries", .progress.oracle_queries)]
    QueryLimitReached {
        limit: u64,
        progress: Box<AttackProgress>,
    },
}
