use crate::bounds::{Bound, Mood, NodePrevalence, ScenarioConstants};
use crate::enumerate::collector::ResultCollector;
use crate::enumerate::conflict::ConflictFilter;
use crate::enumerate::outcome::{BoundedResultSet, BoundedRow, Combination, ResultSet};
use crate::error::ScreenError;
use crate::model::{Estimate, ProbabilityPair, Test, TestCategory, TestFeed, TestGroup};
use crate::topology::schema::{LibraryDef, SlotSource};
use crate::topology::Topology;

/// Parameters of a single enumeration run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    pub bound: Bound,
    pub mood: Mood,
    pub scenario: ScenarioConstants,
    /// Attach per-row operator traces to the output.
    pub trace: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            bound: Bound::Mean,
            mood: Mood::Optimistic,
            scenario: ScenarioConstants::default(),
            trace: false,
        }
    }
}

/// What a slot can take, resolved against the feed.
#[derive(Debug, Clone, Copy)]
enum SlotChoices<'a> {
    Tests(&'a TestGroup),
    Levels(&'a [f64]),
    Scenario,
    Alternate { primary: usize, group: &'a TestGroup },
    Absent,
}

/// The value chosen for one slot in one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pick<'a> {
    Test { index: usize, test: &'a Test },
    Level(f64),
    Scenario,
    Absent,
}

impl Pick<'_> {
    fn pair(&self, bound: Bound, prevalence: NodePrevalence) -> Option<ProbabilityPair> {
        match self {
            Pick::Test { test, .. } => Some(test.pair(bound)),
            Pick::Level(level) => Some(ProbabilityPair::from_level(*level)),
            Pick::Scenario => Some(prevalence.pair()),
            Pick::Absent => None,
        }
    }

    fn fragment(&self, mood: Mood) -> Option<String> {
        match self {
            Pick::Test { test, .. } => Some(test.name.clone()),
            Pick::Level(level) => Some(level.to_string()),
            Pick::Scenario => Some(mood.to_string()),
            Pick::Absent => None,
        }
    }

    fn category(&self) -> Option<TestCategory> {
        match self {
            Pick::Test { test, .. } => Some(test.category),
            _ => None,
        }
    }
}

/// An admissible assignment of the slots, labelled but not yet evaluated.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub picks: Vec<Pick<'a>>,
    pub label: String,
}

impl Candidate<'_> {
    pub fn tests(&self) -> Vec<String> {
        self.picks
            .iter()
            .filter_map(|p| match p {
                Pick::Test { test, .. } => Some(test.name.clone()),
                _ => None,
            })
            .collect()
    }

    fn inputs(&self, bound: Bound, prevalence: NodePrevalence) -> Vec<Option<ProbabilityPair>> {
        self.picks.iter().map(|p| p.pair(bound, prevalence)).collect()
    }
}

/// Walks the cross product of one topology's slots over a feed.
///
/// Slots are iterated outer to inner in declaration order, so the output order
/// is fully determined by the topology and the order of tests in each group.
#[derive(Debug)]
pub struct Enumerator<'a> {
    topology: Topology,
    filter: ConflictFilter<'a>,
    choices: Vec<SlotChoices<'a>>,
}

impl<'a> Enumerator<'a> {
    /// Prepare the named topology of `library` for enumeration over `feed`.
    pub fn new(library: &'a LibraryDef, name: &str, feed: &'a TestFeed) -> Result<Self, ScreenError> {
        let def = library
            .topology(name)
            .ok_or_else(|| ScreenError::UnknownTopology(name.to_string()))?;
        let topology = Topology::compile(def)?;
        let filter = ConflictFilter::for_topology(library, def)?;
        Self::with_filter(topology, filter, feed)
    }

    pub fn with_filter(
        topology: Topology,
        filter: ConflictFilter<'a>,
        feed: &'a TestFeed,
    ) -> Result<Self, ScreenError> {
        feed.validate()?;

        let mut choices: Vec<SlotChoices<'a>> = Vec::with_capacity(topology.slots().len());
        for slot in topology.slots() {
            let missing = |kind: &str, role: &str| {
                ScreenError::Configuration(format!(
                    "slot '{}' of topology '{}' needs {} '{}', which the feed does not provide",
                    slot.name,
                    topology.name(),
                    kind,
                    role
                ))
            };
            let empty = |kind: &str, role: &str| {
                ScreenError::Configuration(format!(
                    "slot '{}' of topology '{}' is required but {} '{}' is empty",
                    slot.name,
                    topology.name(),
                    kind,
                    role
                ))
            };

            let choice = match &slot.source {
                SlotSource::Group(role) => match feed.group(role) {
                    Some(group) if !group.is_empty() => SlotChoices::Tests(group),
                    _ if slot.is_optional() => {
                        log::debug!(
                            "topology '{}': optional slot '{}' has no tests, branch skipped",
                            topology.name(),
                            slot.name
                        );
                        SlotChoices::Absent
                    }
                    Some(_) => return Err(empty("test group", role)),
                    None => return Err(missing("test group", role)),
                },
                SlotSource::Levels(role) => match feed.levels(role) {
                    Some(levels) if !levels.is_empty() => SlotChoices::Levels(levels),
                    _ if slot.is_optional() => SlotChoices::Absent,
                    Some(_) => return Err(empty("level list", role)),
                    None => return Err(missing("level list", role)),
                },
                SlotSource::Scenario => SlotChoices::Scenario,
                SlotSource::AlternateOf(primary) => {
                    let index = topology
                        .slots()
                        .iter()
                        .position(|s| &s.name == primary)
                        .ok_or_else(|| missing("slot", primary))?;
                    match choices.get(index) {
                        Some(&SlotChoices::Tests(group)) => SlotChoices::Alternate {
                            primary: index,
                            group,
                        },
                        _ => SlotChoices::Absent,
                    }
                }
            };
            choices.push(choice);
        }

        Ok(Self {
            topology,
            filter,
            choices,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Every admissible candidate, labelled for `mood`, and the count excluded by conflict rules.
    pub fn candidates(&self, mood: Mood) -> (Vec<Candidate<'a>>, usize) {
        let mut out = Vec::new();
        let mut excluded = 0;
        let mut picks = Vec::with_capacity(self.choices.len());
        self.walk(0, &mut picks, mood, &mut out, &mut excluded);
        (out, excluded)
    }

    fn walk(
        &self,
        depth: usize,
        picks: &mut Vec<Pick<'a>>,
        mood: Mood,
        out: &mut Vec<Candidate<'a>>,
        excluded: &mut usize,
    ) {
        let Some(choice) = self.choices.get(depth) else {
            self.emit(picks, mood, out, excluded);
            return;
        };

        let mut descend = |pick: Pick<'a>, picks: &mut Vec<Pick<'a>>| {
            picks.push(pick);
            self.walk(depth + 1, picks, mood, out, excluded);
            picks.pop();
        };

        match *choice {
            SlotChoices::Tests(group) => {
                for (index, test) in group.iter().enumerate() {
                    descend(Pick::Test { index, test }, picks);
                }
            }
            SlotChoices::Levels(levels) => {
                for &level in levels {
                    descend(Pick::Level(level), picks);
                }
            }
            SlotChoices::Scenario => descend(Pick::Scenario, picks),
            SlotChoices::Absent => descend(Pick::Absent, picks),
            SlotChoices::Alternate { primary, group } => match picks.get(primary).copied() {
                Some(Pick::Test {
                    index: start,
                    test: first,
                }) => {
                    // Unordered pairs only; a repeat of the primary drops the branch.
                    for (index, test) in group.iter().enumerate().skip(start) {
                        if test.name == first.name {
                            descend(Pick::Absent, picks);
                        } else {
                            descend(Pick::Test { index, test }, picks);
                        }
                    }
                }
                _ => descend(Pick::Absent, picks),
            },
        }
    }

    fn emit(&self, picks: &[Pick<'a>], mood: Mood, out: &mut Vec<Candidate<'a>>, excluded: &mut usize) {
        let categories: Vec<TestCategory> = picks.iter().filter_map(Pick::category).collect();
        if let Some(rule) = self.filter.violation(&categories) {
            log::trace!(
                "topology '{}': candidate excluded by conflict rule '{}'",
                self.topology.name(),
                rule.name
            );
            *excluded += 1;
            return;
        }

        let mut label = picks
            .iter()
            .filter_map(|p| p.fragment(mood))
            .collect::<Vec<_>>()
            .join("+");
        label.push(' ');
        label.push_str(self.topology.tag());

        out.push(Candidate {
            picks: picks.to_vec(),
            label,
        });
    }

    /// Evaluate every admissible candidate at one bound.
    pub fn run(&self, params: &RunParams) -> Result<ResultSet, ScreenError> {
        params.scenario.validate()?;
        let prevalence = params.scenario.select(params.mood);
        let (candidates, excluded) = self.candidates(params.mood);

        let mut collector = ResultCollector::new();
        for candidate in candidates {
            let inputs = candidate.inputs(params.bound, prevalence);
            let (pair, trace) = if params.trace {
                self.topology.evaluate_traced(&inputs)?
            } else {
                (self.topology.evaluate(&inputs)?, Vec::new())
            };
            let tests = candidate.tests();
            collector.push(Combination {
                label: candidate.label,
                sensitivity: pair.sensitivity,
                specificity: pair.specificity,
                tests,
                trace,
            });
        }

        let (rows, duplicates_removed) = collector.finish();
        log::info!(
            "topology '{}' ({} bound, {} mood): {} rows, {} excluded by conflict rules, {} duplicates removed",
            self.topology.name(),
            params.bound,
            params.mood,
            rows.len(),
            excluded,
            duplicates_removed
        );

        Ok(ResultSet {
            topology: self.topology.name().to_string(),
            tag: self.topology.tag().to_string(),
            bound: params.bound,
            mood: params.mood,
            rows,
            excluded,
            duplicates_removed,
        })
    }

    /// Evaluate every admissible candidate at the lower, mean and upper bound.
    pub fn run_bounds(
        &self,
        mood: Mood,
        scenario: &ScenarioConstants,
    ) -> Result<BoundedResultSet, ScreenError> {
        scenario.validate()?;
        let prevalence = scenario.select(mood);
        let (candidates, excluded) = self.candidates(mood);

        let mut collector = ResultCollector::new();
        for candidate in candidates {
            let mut results = [ProbabilityPair::new(0.0, 0.0); 3];
            for (slot, bound) in results.iter_mut().zip(Bound::ALL) {
                *slot = self.topology.evaluate(&candidate.inputs(bound, prevalence))?;
            }
            let [lower, mean, upper] = results;
            let tests = candidate.tests();
            collector.push(BoundedRow {
                label: candidate.label,
                sensitivity: Estimate::new(lower.sensitivity, mean.sensitivity, upper.sensitivity),
                specificity: Estimate::new(lower.specificity, mean.specificity, upper.specificity),
                tests,
            });
        }

        let (rows, duplicates_removed) = collector.finish();
        log::info!(
            "topology '{}' (all bounds, {} mood): {} rows, {} excluded by conflict rules, {} duplicates removed",
            self.topology.name(),
            mood,
            rows.len(),
            excluded,
            duplicates_removed
        );

        Ok(BoundedResultSet {
            topology: self.topology.name().to_string(),
            tag: self.topology.tag().to_string(),
            mood,
            rows,
            excluded,
            duplicates_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Test;
    use crate::topology::builtin::load_preset;

    fn group(names: &[&str]) -> TestGroup {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Test::point(*n, 0.6 + 0.05 * i as f64, 0.9 + 0.01 * i as f64))
            .collect()
    }

    fn deployment_feed(parasites: &[&str]) -> TestFeed {
        TestFeed::default()
            .with_group("screening", group(&["CATT"]))
            .with_group("node_exam", group(&["LNA"]))
            .with_group("parasitology", group(parasites))
            .with_group("confirmatory", group(&["CSF"]))
    }

    #[test]
    fn test_alternate_enumerates_unordered_pairs() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF", "mAECT", "CTC"]);
        let e = Enumerator::new(&lib, "original", &feed).unwrap();
        let (candidates, excluded) = e.candidates(Mood::Optimistic);
        let labels: Vec<&str> = candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(excluded, 0);
        assert_eq!(
            labels,
            vec![
                "optimistic+CATT+LNA+GBF+CSF ORIG",
                "optimistic+CATT+LNA+GBF+mAECT+CSF ORIG",
                "optimistic+CATT+LNA+GBF+CTC+CSF ORIG",
                "optimistic+CATT+LNA+mAECT+CSF ORIG",
                "optimistic+CATT+LNA+mAECT+CTC+CSF ORIG",
                "optimistic+CATT+LNA+CTC+CSF ORIG",
            ]
        );
    }

    #[test]
    fn test_repeated_name_collapses_and_deduplicates() {
        let lib = load_preset("deployment").unwrap();
        // The same test listed twice: the pair (GBF, GBF) must collapse, and the
        // two single-parasite rows carry the same label.
        let feed = deployment_feed(&["GBF", "GBF"]);
        let e = Enumerator::new(&lib, "original", &feed).unwrap();
        let rs = e.run(&RunParams::default()).unwrap();
        assert_eq!(rs.len(), 1);
        assert_eq!(rs.duplicates_removed, 2);
        assert_eq!(rs.rows[0].label, "optimistic+CATT+LNA+GBF+CSF ORIG");
    }

    #[test]
    fn test_mood_changes_scenario_pair_and_label() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"]);
        let e = Enumerator::new(&lib, "original", &feed).unwrap();
        let opt = e.run(&RunParams::default()).unwrap();
        let pes = e
            .run(&RunParams {
                mood: Mood::Pessimistic,
                ..Default::default()
            })
            .unwrap();
        assert!(opt.rows[0].label.starts_with("optimistic+"));
        assert!(pes.rows[0].label.starts_with("pessimistic+"));
        assert!(opt.rows[0].sensitivity > pes.rows[0].sensitivity);
    }

    #[test]
    fn test_missing_group_is_configuration_error() {
        let lib = load_preset("deployment").unwrap();
        let feed = TestFeed::default().with_group("screening", group(&["CATT"]));
        let err = Enumerator::new(&lib, "original", &feed).unwrap_err();
        assert!(matches!(err, ScreenError::Configuration(_)));
    }

    #[test]
    fn test_empty_required_group_is_configuration_error() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"]).with_group("confirmatory", TestGroup::default());
        let err = Enumerator::new(&lib, "original", &feed).unwrap_err();
        assert!(matches!(err, ScreenError::Configuration(_)));
    }

    #[test]
    fn test_unknown_topology() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"]);
        assert!(matches!(
            Enumerator::new(&lib, "nope", &feed),
            Err(ScreenError::UnknownTopology(_))
        ));
    }

    #[test]
    fn test_invalid_feed_aborts() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"])
            .with_group("screening", TestGroup::new(vec![Test::point("CATT", 0.9, -0.1)]));
        assert!(matches!(
            Enumerator::new(&lib, "original", &feed),
            Err(ScreenError::Validation { .. })
        ));
    }

    #[test]
    fn test_levels_labelled_by_value() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"]).with_levels("followup", vec![0.4, 0.55]);
        let e = Enumerator::new(&lib, "minimobile", &feed).unwrap();
        let rs = e.run(&RunParams::default()).unwrap();
        let labels: Vec<&str> = rs.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "optimistic+CATT+LNA+GBF+0.4 MINI",
                "optimistic+CATT+LNA+GBF+0.55 MINI",
            ]
        );
    }

    #[test]
    fn test_trace_attached_on_request() {
        let lib = load_preset("deployment").unwrap();
        let feed = deployment_feed(&["GBF"]);
        let e = Enumerator::new(&lib, "original", &feed).unwrap();
        let plain = e.run(&RunParams::default()).unwrap();
        assert!(plain.rows[0].trace.is_empty());
        let traced = e
            .run(&RunParams {
                trace: true,
                ..Default::default()
            })
            .unwrap();
        let steps = &traced.rows[0].trace;
        assert!(!steps.is_empty());
        assert_eq!(steps.last().unwrap().result.sensitivity, traced.rows[0].sensitivity);
        assert!(steps
            .iter()
            .any(|s| s.step_type == crate::trace::TraceStepType::Collapse));
    }

    #[test]
    fn test_run_bounds_orders_estimates() {
        let lib = load_preset("deployment").unwrap();
        let ranged = |name: &str| Test {
            name: name.into(),
            category: TestCategory::Other,
            sensitivity: Estimate::new(0.6, 0.7, 0.8),
            specificity: Estimate::new(0.9, 0.95, 0.99),
        };
        let feed = TestFeed::default()
            .with_group("screening", TestGroup::new(vec![ranged("CATT")]))
            .with_group("node_exam", TestGroup::new(vec![ranged("LNA")]))
            .with_group("parasitology", TestGroup::new(vec![ranged("GBF")]))
            .with_group("confirmatory", TestGroup::new(vec![ranged("CSF")]));
        let e = Enumerator::new(&lib, "rural", &feed).unwrap();
        let rs = e
            .run_bounds(Mood::Optimistic, &ScenarioConstants::default())
            .unwrap();
        let row = &rs.rows[0];
        assert!(row.sensitivity.lower <= row.sensitivity.mean);
        assert!(row.sensitivity.mean <= row.sensitivity.upper);

        let mean = e.run(&RunParams::default()).unwrap();
        assert_eq!(mean.rows[0].sensitivity, row.sensitivity.mean);
        assert_eq!(mean.rows[0].specificity, row.specificity.mean);
    }
}
