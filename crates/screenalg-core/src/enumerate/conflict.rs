use crate::error::ScreenError;
use crate::model::TestCategory;
use crate::topology::schema::{ConflictRule, LibraryDef, TopologyDef};

/// The conflict rules a topology opted into.
#[derive(Debug, Clone, Default)]
pub struct ConflictFilter<'a> {
    rules: Vec<&'a ConflictRule>,
}

impl<'a> ConflictFilter<'a> {
    pub fn new(rules: Vec<&'a ConflictRule>) -> Self {
        Self { rules }
    }

    /// Resolve the rule names listed by `topology` against the library.
    pub fn for_topology(library: &'a LibraryDef, topology: &TopologyDef) -> Result<Self, ScreenError> {
        let rules = topology
            .conflicts
            .iter()
            .map(|name| {
                library.conflict_rule(name).ok_or_else(|| {
                    ScreenError::LibraryInvalid(format!(
                        "topology '{}' references unknown conflict rule '{}'",
                        topology.name, name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The first rule violated by a selection with these categories, if any.
    pub fn violation(&self, categories: &[TestCategory]) -> Option<&'a ConflictRule> {
        self.rules.iter().copied().find(|rule| {
            categories.contains(&rule.trigger) && categories.contains(&rule.excludes)
        })
    }

    pub fn admits(&self, categories: &[TestCategory]) -> bool {
        self.violation(categories).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rdt_rule() -> ConflictRule {
        ConflictRule {
            name: "rdt-excludes-catt-dilution".into(),
            description: None,
            trigger: TestCategory::RapidDiagnostic,
            excludes: TestCategory::SerologicalDilution,
        }
    }

    #[test]
    fn test_conflicting_pair_rejected() {
        let rule = rdt_rule();
        let filter = ConflictFilter::new(vec![&rule]);
        assert!(!filter.admits(&[
            TestCategory::RapidDiagnostic,
            TestCategory::Parasitological,
            TestCategory::SerologicalDilution,
        ]));
        assert_eq!(
            filter
                .violation(&[TestCategory::SerologicalDilution, TestCategory::RapidDiagnostic])
                .map(|r| r.name.as_str()),
            Some("rdt-excludes-catt-dilution")
        );
    }

    #[test]
    fn test_trigger_alone_admitted() {
        let rule = rdt_rule();
        let filter = ConflictFilter::new(vec![&rule]);
        assert!(filter.admits(&[TestCategory::RapidDiagnostic, TestCategory::Serological]));
        assert!(filter.admits(&[TestCategory::Serological, TestCategory::SerologicalDilution]));
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        let filter = ConflictFilter::default();
        assert!(filter.admits(&[TestCategory::RapidDiagnostic, TestCategory::SerologicalDilution]));
    }
}
