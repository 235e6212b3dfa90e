// Interval set - candidate plaintext ranges and the narrowing arithmetic
//
// The attack tracks a set of disjoint closed intervals that is guaranteed to
// contain the hidden plaintext. Each conformant multiplier shrinks the set:
// for every interval and every feasible wrap count r, the overlap between the
// interval and the preimage of the conformant band is kept, everything else
// is discarded.

use crate::math::{ceil_div, floor_div};
use num_bigint::BigUint;
use num_traits::{CheckedSub, One, Zero};
use serde::{Deserialize, Serialize};
use std::cmp;

/// Closed integer interval `[lower, upper]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: BigUint,
    pub upper: BigUint,
}

impl Interval {
    pub fn new(lower: BigUint, upper: BigUint) -> Self {
        debug_assert!(lower <= upper);
        Self { lower, upper }
    }

    /// A single remaining candidate
    pub fn is_singleton(&self) -> bool {
        self.lower == self.upper
    }

    pub fn contains(&self, v: &BigUint) -> bool {
        &self.lower <= v && v <= &self.upper
    }
}

/// Narrow the interval set with a just-found conformant multiplier `s`.
///
/// For each source interval `[a, b]` the feasible wrap counts are
/// `r ∈ [⌊(a·s − 3B + 1) / n⌋, ⌈(b·s − 2B) / n⌉]`; for each the surviving
/// overlap is `[max(a, ⌈(2B + r·n) / s⌉), min(b, ⌊(3B − 1 + r·n) / s⌋)]`.
/// Empty overlaps are dropped and the survivors are returned unmerged.
///
/// `r` counts how often `m·s` wrapped around the modulus and is never
/// negative, so a numerator that would underflow clamps to zero.
pub fn narrow_intervals(
    intervals: &[Interval],
    s: &BigUint,
    n: &BigUint,
    big_b: &BigUint,
) -> Vec<Interval> {
    let two_b = big_b * 2u32;
    let three_b_minus_one = big_b * 3u32 - BigUint::one();

    let mut narrowed = Vec::new();
    for interval in intervals {
        let r_lo = match (&interval.lower * s + BigUint::one()).checked_sub(&(big_b * 3u32)) {
            Some(numerator) => floor_div(&numerator, n),
            None => BigUint::zero(),
        };
        let r_hi = match (&interval.upper * s).checked_sub(&two_b) {
            Some(numerator) => ceil_div(&numerator, n),
            None => BigUint::zero(),
        };

        let mut r = r_lo;
        while r <= r_hi {
            let rn = &r * n;
            let lower = cmp::max(interval.lower.clone(), ceil_div(&(&two_b + &rn), s));
            let upper = cmp::min(
                interval.upper.clone(),
                floor_div(&(&three_b_minus_one + &rn), s),
            );
            if lower <= upper {
                narrowed.push(Interval::new(lower, upper));
            }
            r += BigUint::one();
        }
    }
    narrowed
}
