use crate::model::TestCategory;
use serde::{Deserialize, Serialize};

/// A library of topologies sharing one slot vocabulary and set of conflict rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub conflict_rules: Vec<ConflictRule>,
    pub topologies: Vec<TopologyDef>,
}

impl LibraryDef {
    pub fn topology(&self, name: &str) -> Option<&TopologyDef> {
        self.topologies.iter().find(|t| t.name == name)
    }

    pub fn conflict_rule(&self, name: &str) -> Option<&ConflictRule> {
        self.conflict_rules.iter().find(|r| r.name == name)
    }
}

/// Two test categories that may not appear together in one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger: TestCategory,
    pub excludes: TestCategory,
}

/// One named decision algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDef {
    pub name: String,
    /// Suffix appended to every label produced by this topology.
    pub tag: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The boolean expression in clinical notation, for display only.
    #[serde(default)]
    pub expression: Option<String>,
    pub slots: Vec<SlotDef>,
    pub formula: Formula,
    /// Names of the library conflict rules applied while enumerating.
    #[serde(default)]
    pub conflicts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    pub source: SlotSource,
    /// An optional slot may be bound to an empty group; its branch is then skipped.
    #[serde(default)]
    pub optional: bool,
}

impl SlotDef {
    /// Alternate slots collapse when they repeat their primary, so they are always optional.
    pub fn is_optional(&self) -> bool {
        self.optional || matches!(self.source, SlotSource::AlternateOf(_))
    }
}

/// Where the candidates of a slot come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    /// Every test of the feed group with this role.
    Group(String),
    /// The node prevalence pair of the run's mood.
    Scenario,
    /// Every constant level of the feed level list with this role.
    Levels(String),
    /// A second draw from the group of the named (earlier) slot.
    AlternateOf(String),
}

/// Formula tree over slot names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    Slot(String),
    AndSerial(Box<Formula>, Box<Formula>),
    OrSerial(Box<Formula>, Box<Formula>),
    AndParallel(Box<Formula>, Box<Formula>),
    OrParallel(Box<Formula>, Box<Formula>),
    Attenuate { uptake: f64, of: Box<Formula> },
}

impl Formula {
    pub fn slot(name: &str) -> Formula {
        Formula::Slot(name.to_string())
    }

    pub fn and_serial(a: Formula, b: Formula) -> Formula {
        Formula::AndSerial(Box::new(a), Box::new(b))
    }

    pub fn or_serial(a: Formula, b: Formula) -> Formula {
        Formula::OrSerial(Box::new(a), Box::new(b))
    }

    pub fn and_parallel(a: Formula, b: Formula) -> Formula {
        Formula::AndParallel(Box::new(a), Box::new(b))
    }

    pub fn or_parallel(a: Formula, b: Formula) -> Formula {
        Formula::OrParallel(Box::new(a), Box::new(b))
    }

    pub fn attenuate(uptake: f64, of: Formula) -> Formula {
        Formula::Attenuate {
            uptake,
            of: Box::new(of),
        }
    }

    /// Slot names in the order they are first referenced.
    pub fn referenced_slots(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_slots(&mut out);
        out
    }

    fn collect_slots<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Formula::Slot(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Formula::AndSerial(a, b)
            | Formula::OrSerial(a, b)
            | Formula::AndParallel(a, b)
            | Formula::OrParallel(a, b) => {
                a.collect_slots(out);
                b.collect_slots(out);
            }
            Formula::Attenuate { of, .. } => of.collect_slots(out),
        }
    }
}
