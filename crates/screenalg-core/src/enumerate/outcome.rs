use crate::bounds::{Bound, Mood};
use crate::model::Estimate;
use crate::trace::TraceStep;
use serde::{Deserialize, Serialize};

/// One evaluated assignment of tests to a topology's slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Selected names in slot order, joined by `+`, followed by the topology tag.
    pub label: String,
    pub sensitivity: f64,
    pub specificity: f64,
    /// Names of the tests selected, in slot order. Absent slots are omitted.
    pub tests: Vec<String>,
    /// Operator steps, present only when tracing was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceStep>,
}

/// All combinations of one topology run at a single bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub topology: String,
    pub tag: String,
    pub bound: Bound,
    pub mood: Mood,
    pub rows: Vec<Combination>,
    /// Candidates dropped by conflict rules.
    pub excluded: usize,
    /// Rows dropped because their label had already been produced.
    pub duplicates_removed: usize,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, label: &str) -> Option<&Combination> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Rows ordered by descending sensitivity, then descending specificity.
    pub fn ranked(&self) -> Vec<&Combination> {
        let mut rows: Vec<&Combination> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            b.sensitivity
                .total_cmp(&a.sensitivity)
                .then(b.specificity.total_cmp(&a.specificity))
        });
        rows
    }
}

/// One combination evaluated at the lower, mean and upper bound together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedRow {
    pub label: String,
    pub sensitivity: Estimate,
    pub specificity: Estimate,
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundedResultSet {
    pub topology: String,
    pub tag: String,
    pub mood: Mood,
    pub rows: Vec<BoundedRow>,
    pub excluded: usize,
    pub duplicates_removed: usize,
}

impl BoundedResultSet {
    pub fn row(&self, label: &str) -> Option<&BoundedRow> {
        self.rows.iter().find(|r| r.label == label)
    }
}
