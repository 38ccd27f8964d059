pub mod builtin;
pub mod schema;

use crate::combine::{attenuate, Combinator};
use crate::error::ScreenError;
use crate::model::{is_probability, ProbabilityPair};
use crate::trace::{attenuate_step, collapse_step, combine_step, StepSink, TraceStep};
use schema::{Formula, LibraryDef, SlotDef, SlotSource, TopologyDef};
use std::collections::HashSet;

/// Parse a topology library from a JSON string, labelling errors with `source_name`.
pub fn parse_library(json: &str, source_name: &str) -> Result<LibraryDef, ScreenError> {
    let library: LibraryDef =
        serde_json::from_str(json).map_err(|e| ScreenError::LibraryLoad {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
    validate_library(&library)?;
    Ok(library)
}

/// Validate that a library is well-formed and every topology compiles.
pub fn validate_library(library: &LibraryDef) -> Result<(), ScreenError> {
    if library.name.trim().is_empty() {
        return Err(ScreenError::LibraryInvalid("library name must not be empty".into()));
    }
    if library.topologies.is_empty() {
        return Err(ScreenError::LibraryInvalid("topologies must not be empty".into()));
    }

    let mut rule_names = HashSet::new();
    for rule in &library.conflict_rules {
        if !rule_names.insert(rule.name.as_str()) {
            return Err(ScreenError::LibraryInvalid(format!(
                "duplicate conflict rule '{}'",
                rule.name
            )));
        }
        if rule.trigger == rule.excludes {
            return Err(ScreenError::LibraryInvalid(format!(
                "conflict rule '{}' excludes its own trigger category",
                rule.name
            )));
        }
    }

    let mut names = HashSet::new();
    let mut tags = HashSet::new();
    for def in &library.topologies {
        if !names.insert(def.name.as_str()) {
            return Err(ScreenError::LibraryInvalid(format!(
                "duplicate topology name '{}'",
                def.name
            )));
        }
        if def.tag.trim().is_empty() {
            return Err(ScreenError::LibraryInvalid(format!(
                "topology '{}' has an empty tag",
                def.name
            )));
        }
        if def.tag.contains('+') || def.tag.contains(char::is_whitespace) {
            return Err(ScreenError::LibraryInvalid(format!(
                "topology '{}': tag '{}' may not contain '+' or whitespace",
                def.name, def.tag
            )));
        }
        if !tags.insert(def.tag.as_str()) {
            return Err(ScreenError::LibraryInvalid(format!(
                "topology '{}' reuses tag '{}'",
                def.name, def.tag
            )));
        }
        for conflict in &def.conflicts {
            if !rule_names.contains(conflict.as_str()) {
                return Err(ScreenError::LibraryInvalid(format!(
                    "topology '{}' references unknown conflict rule '{}'",
                    def.name, conflict
                )));
            }
        }
        Topology::compile(def)?;
    }

    Ok(())
}

#[derive(Debug, Clone)]
enum Node {
    Slot(usize),
    Combine(Combinator, Box<Node>, Box<Node>),
    Attenuate(f64, Box<Node>),
}

/// A topology compiled for evaluation: slot names resolved to positions.
#[derive(Debug, Clone)]
pub struct Topology {
    def: TopologyDef,
    root: Node,
}

impl Topology {
    pub fn compile(def: &TopologyDef) -> Result<Self, ScreenError> {
        let invalid = |reason: String| {
            ScreenError::LibraryInvalid(format!("topology '{}': {}", def.name, reason))
        };

        if def.slots.is_empty() {
            return Err(invalid("slots must not be empty".into()));
        }

        for (i, slot) in def.slots.iter().enumerate() {
            if slot.name.trim().is_empty() {
                return Err(invalid("slot name must not be empty".into()));
            }
            if def.slots[..i].iter().any(|s| s.name == slot.name) {
                return Err(invalid(format!("duplicate slot '{}'", slot.name)));
            }
            if let SlotSource::AlternateOf(primary) = &slot.source {
                match def.slots[..i].iter().find(|s| &s.name == primary) {
                    Some(SlotDef {
                        source: SlotSource::Group(_),
                        ..
                    }) => {}
                    Some(_) => {
                        return Err(invalid(format!(
                            "slot '{}' is an alternate of '{}', which is not a group slot",
                            slot.name, primary
                        )))
                    }
                    None => {
                        return Err(invalid(format!(
                            "slot '{}' is an alternate of '{}', which is not declared before it",
                            slot.name, primary
                        )))
                    }
                }
            }
        }

        let referenced = def.formula.referenced_slots();
        for slot in &def.slots {
            if !referenced.contains(&slot.name.as_str()) {
                return Err(invalid(format!("slot '{}' is not used by the formula", slot.name)));
            }
        }

        let root = compile_node(&def.formula, &def.slots).map_err(invalid)?;
        Ok(Self {
            def: def.clone(),
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn tag(&self) -> &str {
        &self.def.tag
    }

    pub fn slots(&self) -> &[SlotDef] {
        &self.def.slots
    }

    /// Render the compiled formula in operator notation, e.g. `CAS(A, COS(CAS(B, C), D))`.
    pub fn render(&self) -> String {
        self.render_node(&self.root)
    }

    fn render_node(&self, node: &Node) -> String {
        match node {
            Node::Slot(i) => self.def.slots[*i].name.clone(),
            Node::Combine(op, a, b) => format!(
                "{}({}, {})",
                op.abbreviation(),
                self.render_node(a),
                self.render_node(b)
            ),
            Node::Attenuate(uptake, of) => format!("ATT({}, {})", self.render_node(of), uptake),
        }
    }

    /// Evaluate with every slot present, one pair per slot in declaration order.
    pub fn evaluate_pairs(&self, inputs: &[ProbabilityPair]) -> Result<ProbabilityPair, ScreenError> {
        let inputs: Vec<Option<ProbabilityPair>> = inputs.iter().copied().map(Some).collect();
        self.evaluate(&inputs)
    }

    /// Evaluate with `None` marking absent optional slots.
    pub fn evaluate(&self, inputs: &[Option<ProbabilityPair>]) -> Result<ProbabilityPair, ScreenError> {
        self.evaluate_with(inputs, &mut ())
    }

    /// Evaluate and record every operator application.
    pub fn evaluate_traced(
        &self,
        inputs: &[Option<ProbabilityPair>],
    ) -> Result<(ProbabilityPair, Vec<TraceStep>), ScreenError> {
        let mut steps = Vec::new();
        let result = self.evaluate_with(inputs, &mut steps)?;
        Ok((result, steps))
    }

    pub(crate) fn evaluate_with<S: StepSink>(
        &self,
        inputs: &[Option<ProbabilityPair>],
        sink: &mut S,
    ) -> Result<ProbabilityPair, ScreenError> {
        if inputs.len() != self.def.slots.len() {
            return Err(ScreenError::Configuration(format!(
                "topology '{}' expects {} inputs, got {}",
                self.def.name,
                self.def.slots.len(),
                inputs.len()
            )));
        }
        for (slot, input) in self.def.slots.iter().zip(inputs) {
            if input.is_none() && !slot.is_optional() {
                return Err(ScreenError::Configuration(format!(
                    "topology '{}': required slot '{}' has no input",
                    self.def.name, slot.name
                )));
            }
        }

        self.eval_node(&self.root, inputs, sink).ok_or_else(|| {
            ScreenError::Configuration(format!(
                "topology '{}': every branch is absent",
                self.def.name
            ))
        })
    }

    fn eval_node<S: StepSink>(
        &self,
        node: &Node,
        inputs: &[Option<ProbabilityPair>],
        sink: &mut S,
    ) -> Option<ProbabilityPair> {
        match node {
            Node::Slot(i) => inputs[*i],
            Node::Combine(op, a, b) => {
                let left = self.eval_node(a, inputs, sink);
                let right = self.eval_node(b, inputs, sink);
                match (left, right) {
                    (Some(l), Some(r)) => {
                        let result = op.apply(l, r);
                        sink.record(|| combine_step(self.render_node(node), result));
                        Some(result)
                    }
                    (Some(kept), None) => {
                        sink.record(|| {
                            collapse_step(
                                self.render_node(node),
                                &self.render_node(b),
                                &self.render_node(a),
                                kept,
                            )
                        });
                        Some(kept)
                    }
                    (None, Some(kept)) => {
                        sink.record(|| {
                            collapse_step(
                                self.render_node(node),
                                &self.render_node(a),
                                &self.render_node(b),
                                kept,
                            )
                        });
                        Some(kept)
                    }
                    (None, None) => None,
                }
            }
            Node::Attenuate(uptake, of) => {
                let result = attenuate(self.eval_node(of, inputs, sink)?, *uptake);
                sink.record(|| attenuate_step(self.render_node(node), result));
                Some(result)
            }
        }
    }
}

fn compile_node(formula: &Formula, slots: &[SlotDef]) -> Result<Node, String> {
    let pair = |op: Combinator, a: &Formula, b: &Formula| -> Result<Node, String> {
        Ok(Node::Combine(
            op,
            Box::new(compile_node(a, slots)?),
            Box::new(compile_node(b, slots)?),
        ))
    };

    match formula {
        Formula::Slot(name) => slots
            .iter()
            .position(|s| &s.name == name)
            .map(Node::Slot)
            .ok_or_else(|| format!("formula references undeclared slot '{name}'")),
        Formula::AndSerial(a, b) => pair(Combinator::AndSerial, a, b),
        Formula::OrSerial(a, b) => pair(Combinator::OrSerial, a, b),
        Formula::AndParallel(a, b) => pair(Combinator::AndParallel, a, b),
        Formula::OrParallel(a, b) => pair(Combinator::OrParallel, a, b),
        Formula::Attenuate { uptake, of } => {
            if !is_probability(*uptake) {
                return Err(format!("attenuation uptake {uptake} is outside [0, 1]"));
            }
            Ok(Node::Attenuate(*uptake, Box::new(compile_node(of, slots)?)))
        }
    }
}
