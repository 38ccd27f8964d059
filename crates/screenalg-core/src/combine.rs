//! The probability combination algebra.
//!
//! Every operator assumes the two tests are statistically independent. For the
//! serial operators `a` is the test applied first.

use crate::model::ProbabilityPair;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uptake used by the deployment algorithms when folding in a lab test.
pub const LAB_UPTAKE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    AndSerial,
    OrSerial,
    AndParallel,
    OrParallel,
}

impl Combinator {
    pub const ALL: [Combinator; 4] = [
        Combinator::AndSerial,
        Combinator::OrSerial,
        Combinator::AndParallel,
        Combinator::OrParallel,
    ];

    pub fn apply(self, a: ProbabilityPair, b: ProbabilityPair) -> ProbabilityPair {
        match self {
            Combinator::AndSerial => and_serial(a, b),
            Combinator::OrSerial => or_serial(a, b),
            Combinator::AndParallel => and_parallel(a, b),
            Combinator::OrParallel => or_parallel(a, b),
        }
    }

    /// Short name used in traces and explanations (CAS, COS, CAP, COP).
    pub fn abbreviation(self) -> &'static str {
        match self {
            Combinator::AndSerial => "CAS",
            Combinator::OrSerial => "COS",
            Combinator::AndParallel => "CAP",
            Combinator::OrParallel => "COP",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Combinator::AndSerial => "AND (serial)",
            Combinator::OrSerial => "OR (serial)",
            Combinator::AndParallel => "AND (parallel)",
            Combinator::OrParallel => "OR (parallel)",
        };
        write!(f, "{s}")
    }
}

/// Both tests must be positive; the second only runs on positives of the first.
pub fn and_serial(a: ProbabilityPair, b: ProbabilityPair) -> ProbabilityPair {
    ProbabilityPair::new(
        a.sensitivity * b.sensitivity,
        a.specificity + (1.0 - a.specificity) * b.specificity,
    )
}

/// Either test suffices; the second only runs on negatives of the first.
pub fn or_serial(a: ProbabilityPair, b: ProbabilityPair) -> ProbabilityPair {
    ProbabilityPair::new(
        a.sensitivity + (1.0 - a.sensitivity) * b.sensitivity,
        a.specificity * b.specificity,
    )
}

pub fn and_parallel(a: ProbabilityPair, b: ProbabilityPair) -> ProbabilityPair {
    ProbabilityPair::new(
        a.sensitivity * b.sensitivity,
        a.specificity + b.specificity - a.specificity * b.specificity,
    )
}

pub fn or_parallel(a: ProbabilityPair, b: ProbabilityPair) -> ProbabilityPair {
    ProbabilityPair::new(
        a.sensitivity + b.sensitivity - a.sensitivity * b.sensitivity,
        a.specificity * b.specificity,
    )
}

/// Discount a test by the fraction of patients who actually receive it.
///
/// Patients who are not tested are never called positive, so sensitivity
/// scales with `uptake` and the untested share counts towards specificity.
pub fn attenuate(pair: ProbabilityPair, uptake: f64) -> ProbabilityPair {
    ProbabilityPair::new(
        pair.sensitivity * uptake,
        pair.specificity + (1.0 - pair.specificity) * (1.0 - uptake),
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn pair() -> impl Strategy<Value = ProbabilityPair> {
        (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(s, sp)| ProbabilityPair::new(s, sp))
    }

    proptest! {
        #[test]
        fn and_operators_share_sensitivity(a in pair(), b in pair()) {
            prop_assert_eq!(and_serial(a, b).sensitivity, and_parallel(a, b).sensitivity);
        }

        #[test]
        fn or_operators_share_specificity(a in pair(), b in pair()) {
            prop_assert_eq!(or_serial(a, b).specificity, or_parallel(a, b).specificity);
        }

        #[test]
        fn parallel_operators_commute(a in pair(), b in pair()) {
            let ab = and_parallel(a, b);
            let ba = and_parallel(b, a);
            prop_assert!((ab.sensitivity - ba.sensitivity).abs() < 1e-12);
            prop_assert!((ab.specificity - ba.specificity).abs() < 1e-12);
            let ab = or_parallel(a, b);
            let ba = or_parallel(b, a);
            prop_assert!((ab.sensitivity - ba.sensitivity).abs() < 1e-12);
            prop_assert!((ab.specificity - ba.specificity).abs() < 1e-12);
        }

        #[test]
        fn and_serial_specificity_monotone(a in pair(), b in pair(), bump in 0.0f64..=1.0) {
            let base = and_serial(a, b).specificity;
            let a_up = ProbabilityPair::new(a.sensitivity, a.specificity + (1.0 - a.specificity) * bump);
            let b_up = ProbabilityPair::new(b.sensitivity, b.specificity + (1.0 - b.specificity) * bump);
            prop_assert!(and_serial(a_up, b).specificity >= base - 1e-12);
            prop_assert!(and_serial(a, b_up).specificity >= base - 1e-12);
        }

        #[test]
        fn or_serial_sensitivity_monotone(a in pair(), b in pair(), bump in 0.0f64..=1.0) {
            let base = or_serial(a, b).sensitivity;
            let a_up = ProbabilityPair::new(a.sensitivity + (1.0 - a.sensitivity) * bump, a.specificity);
            let b_up = ProbabilityPair::new(b.sensitivity + (1.0 - b.sensitivity) * bump, b.specificity);
            prop_assert!(or_serial(a_up, b).sensitivity >= base - 1e-12);
            prop_assert!(or_serial(a, b_up).sensitivity >= base - 1e-12);
        }

        #[test]
        fn results_stay_in_unit_interval(a in pair(), b in pair(), uptake in 0.0f64..=1.0) {
            for op in Combinator::ALL {
                let r = op.apply(a, b);
                prop_assert!((-1e-12..=1.0 + 1e-12).contains(&r.sensitivity));
                prop_assert!((-1e-12..=1.0 + 1e-12).contains(&r.specificity));
            }
            let r = attenuate(a, uptake);
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&r.specificity));
        }
    }
}
