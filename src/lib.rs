// OracleRun - A fast, modular RSA PKCS#1 v1.5 padding oracle attack engine
// Copyright (C) 2025 OracleRun Team
// Licensed under GPL-3.0

//! OracleRun implements Bleichenbacher's adaptive chosen-ciphertext attack
//! against RSA PKCS#1 v1.5 encryption. Given a padding oracle that reports
//! whether a ciphertext decrypts to a conformant encryption block, the engine
//! recovers the plaintext behind a target ciphertext (typically a TLS
//! pre-master secret) by multiplicative blinding and interval narrowing.
//!
//! The crate ships the attack engine, the oracle abstraction, and two local
//! simulation oracles. Transport to a real target (TLS handshakes, sockets,
//! certificates) is deliberately left to callers: anything that can answer
//! "does this block decrypt to `00 02 ...`" can implement [`Pkcs1Oracle`]
//! and be attacked.

pub mod attack;
pub mod constants;
pub mod error;
pub mod key;
pub mod math;
pub mod oracle;

// Re-export commonly used types
pub use crate::attack::{
    AttackOutcome, AttackProgress, BleichenbacherAttack, CancelToken, Interval, QueryBuilder,
};
pub use crate::error::{AttackError, OracleError};
pub use crate::key::RsaPublicKey;
pub use crate::oracle::{ConformanceCheck, Pkcs1Oracle, PlaintextPkcs1Oracle, RsaDecryptOracle};

/// Result type for OracleRun operations
///
/// This is the standard Result type used throughout OracleRun, wrapping the
/// structured AttackError enum for exhaustive matching.
///
/// # Examples
///
/// ```no_run
/// use oraclerun::{AttackOutcome, Result};
///
/// async fn run_attack() -> Result<AttackOutcome> {
///     // Build an oracle and a BleichenbacherAttack, then drive it
///     unimplemented!()
/// }
/// ```
pub type Result<T> = std::result::Result<T, AttackError>;
