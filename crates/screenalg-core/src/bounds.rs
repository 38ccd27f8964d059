//! Bound and scenario selection.
//!
//! Picks which estimate of each test feeds a run, and which node-involvement
//! prevalence stands in for the scenario slot of a topology.

use crate::error::ScreenError;
use crate::model::{is_probability, Estimate, ProbabilityPair, Test};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bound {
    Lower,
    Mean,
    Upper,
}

impl Bound {
    pub const ALL: [Bound; 3] = [Bound::Lower, Bound::Mean, Bound::Upper];
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Lower => write!(f, "lower"),
            Bound::Mean => write!(f, "mean"),
            Bound::Upper => write!(f, "upper"),
        }
    }
}

impl Estimate {
    pub fn select(&self, bound: Bound) -> f64 {
        match bound {
            Bound::Lower => self.lower,
            Bound::Mean => self.mean,
            Bound::Upper => self.upper,
        }
    }
}

impl Test {
    /// The (sensitivity, specificity) pair of this test at the given bound.
    pub fn pair(&self, bound: Bound) -> ProbabilityPair {
        ProbabilityPair::new(self.sensitivity.select(bound), self.specificity.select(bound))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Optimistic,
    Pessimistic,
}

impl Mood {
    pub const ALL: [Mood; 2] = [Mood::Optimistic, Mood::Pessimistic];
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mood::Optimistic => write!(f, "optimistic"),
            Mood::Pessimistic => write!(f, "pessimistic"),
        }
    }
}

/// Proportion of patients with palpable lymph nodes, with and without the disease.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePrevalence {
    pub given_disease: f64,
    pub given_non_disease: f64,
}

impl NodePrevalence {
    pub const fn new(given_disease: f64, given_non_disease: f64) -> Self {
        Self {
            given_disease,
            given_non_disease,
        }
    }

    /// Node palpation treated as a test: positive when nodes are present.
    pub fn pair(&self) -> ProbabilityPair {
        ProbabilityPair::new(self.given_disease, 1.0 - self.given_non_disease)
    }
}

/// Caller-supplied scenario constants, one prevalence pair per mood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConstants {
    pub pessimistic: NodePrevalence,
    pub optimistic: NodePrevalence,
}

impl Default for ScenarioConstants {
    /// Worst case 50% / 10%, optimistic 74% / 10%.
    fn default() -> Self {
        Self {
            pessimistic: NodePrevalence::new(0.5, 0.1),
            optimistic: NodePrevalence::new(0.74, 0.1),
        }
    }
}

impl ScenarioConstants {
    pub fn select(&self, mood: Mood) -> NodePrevalence {
        match mood {
            Mood::Optimistic => self.optimistic,
            Mood::Pessimistic => self.pessimistic,
        }
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        for mood in Mood::ALL {
            let p = self.select(mood);
            let subject = format!("{mood} scenario");
            if !is_probability(p.given_disease) {
                return Err(ScreenError::validation(&subject, "given_disease", p.given_disease));
            }
            if !is_probability(p.given_non_disease) {
                return Err(ScreenError::validation(
                    &subject,
                    "given_non_disease",
                    p.given_non_disease,
                ));
            }
        }
        Ok(())
    }
}
