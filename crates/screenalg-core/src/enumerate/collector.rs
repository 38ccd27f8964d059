use crate::enumerate::outcome::{BoundedRow, Combination};
use std::collections::HashSet;

/// Anything the collector can deduplicate.
pub trait Labelled {
    fn label(&self) -> &str;
}

impl Labelled for Combination {
    fn label(&self) -> &str {
        &self.label
    }
}

impl Labelled for BoundedRow {
    fn label(&self) -> &str {
        &self.label
    }
}

/// Accumulates rows in arrival order, keeping the first row for each label.
#[derive(Debug)]
pub struct ResultCollector<T> {
    rows: Vec<T>,
    seen: HashSet<String>,
    duplicates: usize,
}

impl<T> Default for ResultCollector<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::new(),
            duplicates: 0,
        }
    }
}

impl<T: Labelled> ResultCollector<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the row was a duplicate and has been dropped.
    pub fn push(&mut self, row: T) -> bool {
        if self.seen.contains(row.label()) {
            log::debug!("dropping duplicate row '{}'", row.label());
            self.duplicates += 1;
            return false;
        }
        self.seen.insert(row.label().to_string());
        self.rows.push(row);
        true
    }

    /// The collected rows and the number of duplicates dropped.
    pub fn finish(self) -> (Vec<T>, usize) {
        (self.rows, self.duplicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, sensitivity: f64) -> Combination {
        Combination {
            label: label.into(),
            sensitivity,
            specificity: 0.9,
            tests: vec![],
            trace: vec![],
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut c = ResultCollector::new();
        assert!(c.push(row("a NOXP", 0.1)));
        assert!(c.push(row("b NOXP", 0.2)));
        assert!(!c.push(row("a NOXP", 0.3)));
        let (rows, dups) = c.finish();
        assert_eq!(dups, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sensitivity, 0.1);
        assert_eq!(rows[1].label, "b NOXP");
    }

    #[test]
    fn test_order_preserved() {
        let mut c = ResultCollector::new();
        for label in ["z", "a", "m"] {
            c.push(row(label, 0.5));
        }
        let (rows, _) = c.finish();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["z", "a", "m"]);
    }
}
