use crate::model::ProbabilityPair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    Combine,
    Attenuate,
    /// One operand was absent and the other passed through unchanged.
    Collapse,
}

/// One operator application while evaluating a topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    /// Sub-expression this step evaluated, e.g. `CAS(B, C)`.
    pub expression: String,
    pub result: ProbabilityPair,
    pub message: String,
}

/// Receives trace steps during evaluation. `()` discards them.
pub trait StepSink {
    fn record(&mut self, step: impl FnOnce() -> TraceStep);
}

impl StepSink for () {
    fn record(&mut self, _step: impl FnOnce() -> TraceStep) {}
}

impl StepSink for Vec<TraceStep> {
    fn record(&mut self, step: impl FnOnce() -> TraceStep) {
        self.push(step());
    }
}

pub(crate) fn combine_step(expression: String, result: ProbabilityPair) -> TraceStep {
    TraceStep {
        step_type: TraceStepType::Combine,
        message: format!("{expression} = {result}"),
        expression,
        result,
    }
}

pub(crate) fn attenuate_step(expression: String, result: ProbabilityPair) -> TraceStep {
    TraceStep {
        step_type: TraceStepType::Attenuate,
        message: format!("{expression} = {result}"),
        expression,
        result,
    }
}

pub(crate) fn collapse_step(
    expression: String,
    absent: &str,
    kept: &str,
    result: ProbabilityPair,
) -> TraceStep {
    TraceStep {
        step_type: TraceStepType::Collapse,
        message: format!("{expression}: {absent} absent, branch reduces to {kept} = {result}"),
        expression,
        result,
    }
}
