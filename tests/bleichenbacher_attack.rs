// Integration tests for the Bleichenbacher attack engine
//
// The tiny-modulus scenarios (n = 77) are small enough that every oracle
// query can be verified by hand, which pins exact query counts. The 64-bit
// scenarios (n = (2^32 - 5)(2^32 - 17)) exercise the full search including
// blinding and the window scan; their query counts are deterministic but not
// asserted numerically.

use async_trait::async_trait;
use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use oraclerun::math::mod_inverse;
use oraclerun::{
    AttackError, BleichenbacherAttack, CancelToken, OracleError, Pkcs1Oracle, PlaintextPkcs1Oracle,
    QueryBuilder, RsaDecryptOracle, RsaPublicKey,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};

/// Generous ceiling so a broken search fails instead of hanging
const SAFETY_QUERY_LIMIT: u64 = 5_000_000;

fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

/// n = 77 = 7 * 11 with a forced 2-byte block: B = 1, conformant band [2, 2]
fn tiny_oracle() -> PlaintextPkcs1Oracle {
    let key = RsaPublicKey::new(big(77), big(17)).expect("valid key");
    PlaintextPkcs1Oracle::new(key).with_block_size(2)
}

/// 64-bit two-prime modulus with the matching private exponent
fn small_rsa() -> (RsaPublicKey, BigUint) {
    let p = big(4_294_967_291); // 2^32 - 5
    let q = big(4_294_967_279); // 2^32 - 17
    let n = &p * &q;
    let e = big(65_537);
    let phi = (&p - 1u32) * (&q - 1u32);
    let d = mod_inverse(&e, &phi).expect("e is coprime to phi");
    (RsaPublicKey::new(n, e).expect("valid key"), d)
}

/// B = 2^48 for the 8-byte block of the 64-bit modulus
fn small_big_b() -> BigUint {
    BigUint::one() << 48
}

/// Delegating oracle that fails one call, then answers normally once disarmed
struct FailingOracle {
    inner: PlaintextPkcs1Oracle,
    fail_at: u64,
    armed: AtomicBool,
}

impl FailingOracle {
    fn new(inner: PlaintextPkcs1Oracle, fail_at: u64) -> Self {
        Self {
            inner,
            fail_at,
            armed: AtomicBool::new(true),
        }
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed);
    }
}

#[async_trait]
impl Pkcs1Oracle for FailingOracle {
    fn public_key(&self) -> &RsaPublicKey {
        self.inner.public_key()
    }

    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn is_plaintext_oracle(&self) -> bool {
        self.inner.is_plaintext_oracle()
    }

    async fn check_conformant(&self, block: &[u8]) -> Result<bool, OracleError> {
        let answer = self.inner.check_conformant(block).await?;
        if self.armed.load(Ordering::Relaxed) && self.inner.query_count() == self.fail_at {
            return Err(OracleError::Protocol {
                details: "connection reset by peer".to_string(),
            });
        }
        Ok(answer)
    }

    fn query_count(&self) -> u64 {
        self.inner.query_count()
    }
}

/// Delegating oracle that trips a cancellation token after a fixed number of
/// answered queries
struct TrippingOracle {
    inner: PlaintextPkcs1Oracle,
    token: CancelToken,
    trip_at: u64,
}

#[async_trait]
impl Pkcs1Oracle for TrippingOracle {
    fn public_key(&self) -> &RsaPublicKey {
        self.inner.public_key()
    }

    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn is_plaintext_oracle(&self) -> bool {
        self.inner.is_plaintext_oracle()
    }

    async fn check_conformant(&self, block: &[u8]) -> Result<bool, OracleError> {
        let answer = self.inner.check_conformant(block).await?;
        if self.inner.query_count() == self.trip_at {
            self.token.cancel();
        }
        Ok(answer)
    }

    fn query_count(&self) -> u64 {
        self.inner.query_count()
    }
}

#[tokio::test]
async fn test_tiny_plaintext_oracle_recovers_in_one_iteration() {
    // m* = 2 is the single conformant value; the first accepted multiplier
    // is s = 78 (2 * 78 = 156 = 2 mod 77), reached after 53 queries from the
    // step 2a start of ceil(77 / 3) = 26
    let mut attack =
        BleichenbacherAttack::new(&[0x02], tiny_oracle(), true).expect("valid engine");
    let outcome = attack.attack().await.expect("attack succeeds");

    assert_eq!(outcome.solution, big(2));
    assert_eq!(outcome.solution_bytes, vec![0x02]);
    assert_eq!(outcome.s0, big(1));
    assert_eq!(outcome.iterations, 1);
    assert_eq!(outcome.oracle_queries, 53);
}

#[tokio::test]
async fn test_small_modulus_recovery() {
    let (key, _) = small_rsa();
    let m = &small_big_b() * 2u32 + big(0x00AB_CDEF_1234);
    let oracle = PlaintextPkcs1Oracle::new(key);

    let mut attack = BleichenbacherAttack::new(&m.to_bytes_be(), oracle, true)
        .expect("valid engine")
        .with_max_queries(SAFETY_QUERY_LIMIT);
    let outcome = attack.attack().await.expect("attack succeeds");

    assert_eq!(outcome.solution, m);
    assert_eq!(outcome.s0, big(1));
    assert!(outcome.oracle_queries > 0);
    assert!(outcome.iterations >= 1);
}

#[tokio::test]
async fn test_identical_runs_are_deterministic() {
    let (key, _) = small_rsa();
    let m = &small_big_b() * 2u32 + big(0x0000_DEAD_BEEF);

    let mut first = BleichenbacherAttack::new(
        &m.to_bytes_be(),
        PlaintextPkcs1Oracle::new(key.clone()),
        true,
    )
    .expect("valid engine")
    .with_max_queries(SAFETY_QUERY_LIMIT);
    let mut second =
        BleichenbacherAttack::new(&m.to_bytes_be(), PlaintextPkcs1Oracle::new(key), true)
            .expect("valid engine")
            .with_max_queries(SAFETY_QUERY_LIMIT);

    let a = first.attack().await.expect("attack succeeds");
    let b = second.attack().await.expect("attack succeeds");
    assert_eq!(a, b);

    // re-running a solved engine returns the cached outcome without querying
    let queries_before = first.query_count();
    let again = first.attack().await.expect("cached outcome");
    assert_eq!(again, a);
    assert_eq!(first.query_count(), queries_before);
}

#[tokio::test]
async fn test_blinding_from_random_ciphertext() {
    let (key, _) = small_rsa();
    let mut rng = StdRng::seed_from_u64(42);
    let c = rng.gen_biguint_below(key.modulus());
    let oracle = PlaintextPkcs1Oracle::new(key.clone());

    let mut attack = BleichenbacherAttack::new(&c.to_bytes_be(), oracle, false)
        .expect("valid engine")
        .with_max_queries(SAFETY_QUERY_LIMIT);
    let outcome = attack.attack().await.expect("attack succeeds");

    // a plaintext oracle recovers the original value once unblinded
    assert_eq!(outcome.solution, c);
    assert!(outcome.s0 >= big(1));

    // the blinded ciphertext the search ran against is itself conformant
    let big_b = small_big_b();
    let c0 = attack.blinded_ciphertext();
    assert!(c0 >= &(&big_b * 2u32));
    assert!(c0 <= &(&big_b * 3u32 - 1u32));
    let builder = QueryBuilder::new(key, 8, true);
    let block = builder.prepare_raw(c0).expect("fits the block");
    assert!(attack.oracle().check_conformant(&block).await.expect("query"));
}

#[tokio::test]
async fn test_oracle_error_surfaces_and_resumes() {
    let oracle = FailingOracle::new(tiny_oracle(), 10);
    let mut attack = BleichenbacherAttack::new(&[0x02], oracle, true).expect("valid engine");

    let err = attack.attack().await.unwrap_err();
    assert!(matches!(err, AttackError::Oracle(_)));
    assert_eq!(attack.query_count(), 10);

    // the engine state is still valid: clearing the fault and re-invoking
    // resumes at the failed query and solves the same instance, one query
    // over the clean run's 53
    attack.oracle().disarm();
    let outcome = attack.attack().await.expect("attack resumes");
    assert_eq!(outcome.solution, big(2));
    assert_eq!(outcome.oracle_queries, 54);
}

#[tokio::test]
async fn test_cancellation_preserves_valid_state() {
    let token = CancelToken::new();
    let oracle = TrippingOracle {
        inner: tiny_oracle(),
        token: token.clone(),
        trip_at: 50,
    };
    let mut attack = BleichenbacherAttack::new(&[0x02], oracle, true)
        .expect("valid engine")
        .with_cancel_token(token);

    let err = attack.attack().await.unwrap_err();
    let progress = match err {
        AttackError::Cancelled { progress } => progress,
        other => panic!("expected Cancelled, got {other:?}"),
    };
    assert_eq!(progress.oracle_queries, 50);

    // the snapshot still satisfies the search invariants: intervals inside
    // the band, ordered bounds, true plaintext retained
    let big_b = big(1);
    for interval in &progress.intervals {
        assert!(interval.lower <= interval.upper);
        assert!(interval.lower >= &big_b * 2u32);
        assert!(interval.upper <= &big_b * 3u32 - 1u32);
    }
    assert!(
        progress
            .intervals
            .iter()
            .any(|interval| interval.contains(&big(2)))
    );
}

#[tokio::test]
async fn test_query_limit_stops_the_search() {
    let mut attack = BleichenbacherAttack::new(&[0x02], tiny_oracle(), true)
        .expect("valid engine")
        .with_max_queries(25);

    let err = attack.attack().await.unwrap_err();
    match err {
        AttackError::QueryLimitReached { limit, progress } => {
            assert_eq!(limit, 25);
            assert_eq!(progress.oracle_queries, 25);
        }
        other => panic!("expected QueryLimitReached, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rsa_decrypt_oracle_end_to_end() {
    let (key, d) = small_rsa();
    let m = &small_big_b() * 2u32 + big(0x0012_3456_789A);
    let c = m.modpow(key.exponent(), key.modulus());
    let oracle = RsaDecryptOracle::new(key, d);

    // without the conformance hint the engine blinds first; m is already in
    // the band, so the very first factor s0 = 1 is accepted
    let mut attack = BleichenbacherAttack::new(&c.to_bytes_be(), oracle, false)
        .expect("valid engine")
        .with_max_queries(SAFETY_QUERY_LIMIT);
    let outcome = attack.attack().await.expect("attack succeeds");

    assert_eq!(outcome.solution, m);
    assert_eq!(outcome.solution_bytes, m.to_bytes_be());
    assert_eq!(outcome.s0, big(1));
}

#[tokio::test]
async fn test_rsa_decrypt_oracle_with_blinding() {
    let (key, d) = small_rsa();
    // an arbitrary ciphertext, almost surely not conformant
    let c = big(0x0123_4567_89AB_CDEF);
    let expected = c.modpow(&d, key.modulus());
    let oracle = RsaDecryptOracle::new(key, d.clone());

    let mut attack = BleichenbacherAttack::new(&c.to_bytes_be(), oracle, false)
        .expect("valid engine")
        .with_max_queries(SAFETY_QUERY_LIMIT);
    let outcome = attack.attack().await.expect("attack succeeds");

    assert_eq!(outcome.solution, expected);
    assert!(outcome.s0 >= big(1));
}

#[tokio::test]
async fn test_outcome_serde_round_trip() {
    let mut attack =
        BleichenbacherAttack::new(&[0x02], tiny_oracle(), true).expect("valid engine");
    let outcome = attack.attack().await.expect("attack succeeds");

    let json = serde_json::to_string(&outcome).expect("serializes");
    let restored = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(outcome, restored);
}
