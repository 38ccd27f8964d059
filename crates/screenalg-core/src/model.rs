use crate::error::ScreenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A (sensitivity, specificity) pair. The unit every combinator consumes and produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityPair {
    pub sensitivity: f64,
    pub specificity: f64,
}

impl ProbabilityPair {
    pub const fn new(sensitivity: f64, specificity: f64) -> Self {
        Self {
            sensitivity,
            specificity,
        }
    }

    /// Pair for a constant probability level `v`: detects with `v`, clears with `1 - v`.
    pub fn from_level(level: f64) -> Self {
        Self::new(level, 1.0 - level)
    }
}

impl fmt::Display for ProbabilityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.sensitivity, self.specificity)
    }
}

/// Lower, mean and upper estimate of one test characteristic.
///
/// A bare number in JSON is read as a point estimate with all three equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "EstimateRepr")]
pub struct Estimate {
    pub lower: f64,
    pub mean: f64,
    pub upper: f64,
}

impl Estimate {
    pub const fn new(lower: f64, mean: f64, upper: f64) -> Self {
        Self { lower, mean, upper }
    }

    pub const fn point(value: f64) -> Self {
        Self::new(value, value, value)
    }

    fn validate(&self, subject: &str, field: &str) -> Result<(), ScreenError> {
        for (part, value) in [("lower", self.lower), ("mean", self.mean), ("upper", self.upper)] {
            if !is_probability(value) {
                return Err(ScreenError::validation(
                    subject,
                    &format!("{field}.{part}"),
                    value,
                ));
            }
        }
        if self.lower > self.mean || self.mean > self.upper {
            return Err(ScreenError::EstimateOrder {
                subject: subject.to_string(),
                field: field.to_string(),
                lower: self.lower,
                mean: self.mean,
                upper: self.upper,
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EstimateRepr {
    Point(f64),
    Range { lower: f64, mean: f64, upper: f64 },
}

impl From<EstimateRepr> for Estimate {
    fn from(repr: EstimateRepr) -> Self {
        match repr {
            EstimateRepr::Point(v) => Estimate::point(v),
            EstimateRepr::Range { lower, mean, upper } => Estimate::new(lower, mean, upper),
        }
    }
}

/// Semantic test category, used by conflict rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    Clinical,
    Serological,
    SerologicalDilution,
    RapidDiagnostic,
    Parasitological,
    Molecular,
    #[default]
    Other,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestCategory::Clinical => "clinical",
            TestCategory::Serological => "serological",
            TestCategory::SerologicalDilution => "serological dilution",
            TestCategory::RapidDiagnostic => "rapid diagnostic",
            TestCategory::Parasitological => "parasitological",
            TestCategory::Molecular => "molecular",
            TestCategory::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// One diagnostic test as supplied by the data feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    #[serde(default)]
    pub category: TestCategory,
    pub sensitivity: Estimate,
    pub specificity: Estimate,
}

impl Test {
    /// A test with single-valued sensitivity and specificity.
    pub fn point(name: impl Into<String>, sensitivity: f64, specificity: f64) -> Self {
        Self {
            name: name.into(),
            category: TestCategory::Other,
            sensitivity: Estimate::point(sensitivity),
            specificity: Estimate::point(specificity),
        }
    }

    pub fn with_category(mut self, category: TestCategory) -> Self {
        self.category = category;
        self
    }

    /// Names become label fragments joined by `+`, so they may not be empty or contain `+`.
    pub fn validate(&self) -> Result<(), ScreenError> {
        let bad_name = |reason: &str| ScreenError::TestName {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(bad_name("name must not be empty"));
        }
        if self.name.contains('+') {
            return Err(bad_name("'+' separates label fragments"));
        }
        self.sensitivity.validate(&self.name, "sensitivity")?;
        self.specificity.validate(&self.name, "specificity")
    }
}

/// Ordered tests sharing one role. Empty means "branch absent" for optional slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestGroup {
    tests: Vec<Test>,
}

impl TestGroup {
    pub fn new(tests: Vec<Test>) -> Self {
        Self { tests }
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Test> {
        self.tests.iter()
    }
}

impl FromIterator<Test> for TestGroup {
    fn from_iter<I: IntoIterator<Item = Test>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The in-memory input of a run: test groups and constant levels keyed by role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestFeed {
    #[serde(default)]
    pub groups: BTreeMap<String, TestGroup>,
    #[serde(default)]
    pub levels: BTreeMap<String, Vec<f64>>,
}

impl TestFeed {
    pub fn with_group(mut self, role: impl Into<String>, group: TestGroup) -> Self {
        self.groups.insert(role.into(), group);
        self
    }

    pub fn with_levels(mut self, role: impl Into<String>, levels: Vec<f64>) -> Self {
        self.levels.insert(role.into(), levels);
        self
    }

    pub fn group(&self, role: &str) -> Option<&TestGroup> {
        self.groups.get(role)
    }

    pub fn levels(&self, role: &str) -> Option<&[f64]> {
        self.levels.get(role).map(Vec::as_slice)
    }

    /// Reject any estimate or level outside [0, 1].
    pub fn validate(&self) -> Result<(), ScreenError> {
        for group in self.groups.values() {
            for test in group.iter() {
                test.validate()?;
            }
        }
        for (role, levels) in &self.levels {
            for &level in levels {
                if !is_probability(level) {
                    return Err(ScreenError::validation(role, "level", level));
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_estimate_from_number() {
        let test: Test = serde_json::from_str(
            r#"{ "name": "CATT", "sensitivity": 0.91, "specificity": 0.97 }"#,
        )
        .unwrap();
        assert_eq!(test.sensitivity, Estimate::point(0.91));
        assert_eq!(test.category, TestCategory::Other);
    }

    #[test]
    fn test_range_estimate_and_category() {
        let test: Test = serde_json::from_str(
            r#"{
                "name": "RDT",
                "category": "rapid_diagnostic",
                "sensitivity": { "lower": 0.8, "mean": 0.88, "upper": 0.94 },
                "specificity": 0.95
            }"#,
        )
        .unwrap();
        assert_eq!(test.category, TestCategory::RapidDiagnostic);
        assert_eq!(test.sensitivity.upper, 0.94);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let feed = TestFeed::default().with_group(
            "screening",
            TestGroup::new(vec![Test::point("Bad", 1.2, 0.9)]),
        );
        match feed.validate() {
            Err(ScreenError::Validation { subject, field, .. }) => {
                assert_eq!(subject, "Bad");
                assert_eq!(field, "sensitivity.lower");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_inverted_estimate_rejected() {
        let test = Test {
            name: "mAECT".into(),
            category: TestCategory::Parasitological,
            sensitivity: Estimate::new(0.85, 0.77, 0.69),
            specificity: Estimate::point(1.0),
        };
        match test.validate() {
            Err(ScreenError::EstimateOrder { subject, field, .. }) => {
                assert_eq!(subject, "mAECT");
                assert_eq!(field, "sensitivity");
            }
            other => panic!("expected ordering error, got {other:?}"),
        }
    }

    #[test]
    fn test_label_breaking_names_rejected() {
        for name in ["", "  ", "GBF+CTC"] {
            let feed = TestFeed::default()
                .with_group("parasitology", TestGroup::new(vec![Test::point(name, 0.5, 1.0)]));
            assert!(
                matches!(feed.validate(), Err(ScreenError::TestName { .. })),
                "name {name:?} accepted"
            );
        }
        assert!(Test::point("CATT-dil 1:8", 0.85, 0.99).validate().is_ok());
    }

    #[test]
    fn test_nan_level_rejected() {
        let feed = TestFeed::default().with_levels("uptake", vec![0.4, f64::NAN]);
        assert!(feed.validate().is_err());
    }

    #[test]
    fn test_level_pair() {
        let p = ProbabilityPair::from_level(0.25);
        assert_eq!(p, ProbabilityPair::new(0.25, 0.75));
    }
}
