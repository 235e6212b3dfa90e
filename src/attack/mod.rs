// Attack module - adaptive chosen-ciphertext attacks against PKCS#1 v1.5

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod bleichenbacher;
pub mod interval;
pub mod query;

pub use bleichenbacher::{AttackOutcome, BleichenbacherAttack};
pub use interval::Interval;
pub use query::QueryBuilder;

/// Cooperative cancellation token
///
/// Cloneable handle around a shared flag. The engine consults it before every
/// oracle query; tripping it makes the current `attack` call return with a
/// progress snapshot instead of querying further.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Irrevocable for the lifetime of the token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Diagnostic snapshot of a run that stopped before finding the solution
///
/// The interval set still satisfies the search invariants, so a caller can
/// inspect how far the narrowing got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProgress {
    /// Iteration the engine was in
    pub iteration: u64,
    /// Oracle queries issued so far
    pub oracle_queries: u64,
    /// Multiplier candidate under test
    pub s: BigUint,
    /// Remaining candidate plaintext intervals
    pub intervals: Vec<Interval>,
}
