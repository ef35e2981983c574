//! Evaluation output: aggregate outcome plus per-scope results

use bastion_jsonpath::SourceLocation;
use serde::Serialize;

/// Outcome of one predicate check at one resolved location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub passed: bool,
    /// Location of the scope that produced this result, relative to the document root
    pub json_path: String,
    pub source_location: SourceLocation,
}

impl EvaluationResult {
    pub fn new(passed: bool, json_path: impl Into<String>, source_location: SourceLocation) -> Self {
        Self {
            passed,
            json_path: json_path.into(),
            source_location,
        }
    }
}

/// Aggregate outcome of evaluating one expression against one scope
///
/// `results` keeps evaluation order: resource-type order first, then child-expression
/// order, then path fan-out order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub passed: bool,
    pub results: Vec<EvaluationResult>,
}

impl Evaluation {
    pub fn new(passed: bool, results: Vec<EvaluationResult>) -> Self {
        Self { passed, results }
    }

    /// Evaluation of a scoped expression whose resource type matched nothing.
    pub fn not_applicable() -> Self {
        Self::new(true, Vec::new())
    }

    /// Results that passed, in discovery order
    pub fn results_evaluated_true(&self) -> impl Iterator<Item = &EvaluationResult> + '_ {
        self.results.iter().filter(|r| r.passed)
    }

    /// Results that failed, in discovery order
    pub fn results_evaluated_false(&self) -> impl Iterator<Item = &EvaluationResult> + '_ {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
