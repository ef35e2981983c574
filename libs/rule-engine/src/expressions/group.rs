//! Group expressions: conjunction and disjunction over child expressions

use super::{normalize_resource_type, reject_double_scoping, Expression};
use crate::error::Result;
use crate::evaluation::{Evaluation, EvaluationResult};
use bastion_jsonpath::{PathResolver, SourceLocationResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    All,
    Any,
}

impl Combine {
    /// Aggregate of zero children
    fn identity(self) -> bool {
        match self {
            Self::All => true,
            Self::Any => false,
        }
    }

    fn fold(self, acc: bool, next: bool) -> bool {
        match self {
            Self::All => acc && next,
            Self::Any => acc || next,
        }
    }
}

/// Passes when every child passes. Vacuously true without children.
#[derive(Debug)]
pub struct AllOfExpression {
    expressions: Vec<Expression>,
    resource_type: Option<String>,
}

/// Passes when at least one child passes. Vacuously false without children.
#[derive(Debug)]
pub struct AnyOfExpression {
    expressions: Vec<Expression>,
    resource_type: Option<String>,
}

macro_rules! group_expression {
    ($name:ident, $combine:expr) => {
        impl $name {
            /// Build a group. Fails when the group is scoped to a resource type and a
            /// descendant declares a resource type of its own.
            pub fn new(expressions: Vec<Expression>, resource_type: Option<String>) -> Result<Self> {
                let resource_type = normalize_resource_type(resource_type);
                reject_double_scoping(resource_type.as_deref(), &expressions)?;
                Ok(Self {
                    expressions,
                    resource_type,
                })
            }

            pub fn expressions(&self) -> &[Expression] {
                &self.expressions
            }

            pub fn resource_type(&self) -> Option<&str> {
                self.resource_type.as_deref()
            }

            /// Evaluate every child against every scope. No child is skipped, so the
            /// results are complete even once the outcome is decided.
            pub fn evaluate(
                &self,
                scope: &dyn PathResolver,
                locations: Option<&dyn SourceLocationResolver>,
            ) -> Evaluation {
                evaluate_group(
                    $combine,
                    self.resource_type.as_deref(),
                    &self.expressions,
                    scope,
                    locations,
                )
            }
        }
    };
}

group_expression!(AllOfExpression, Combine::All);
group_expression!(AnyOfExpression, Combine::Any);

/// With a resource type, children run once per matching resource and the group passes
/// only when it passes for every resource; without matches it is not applicable.
fn evaluate_group(
    combine: Combine,
    resource_type: Option<&str>,
    expressions: &[Expression],
    scope: &dyn PathResolver,
    locations: Option<&dyn SourceLocationResolver>,
) -> Evaluation {
    let Some(resource_type) = resource_type else {
        return evaluate_children(combine, expressions, scope, locations);
    };

    let resources = scope.resolve_resource_type(resource_type);
    if resources.is_empty() {
        tracing::debug!(resource_type, "no resources in scope");
        return Evaluation::not_applicable();
    }

    let mut passed = true;
    let mut results: Vec<EvaluationResult> = Vec::new();
    for resource in &resources {
        let evaluation = evaluate_children(combine, expressions, resource.as_ref(), locations);
        passed &= evaluation.passed;
        results.extend(evaluation.results);
    }
    Evaluation::new(passed, results)
}

fn evaluate_children(
    combine: Combine,
    expressions: &[Expression],
    scope: &dyn PathResolver,
    locations: Option<&dyn SourceLocationResolver>,
) -> Evaluation {
    let mut passed = combine.identity();
    let mut results = Vec::new();

    for expression in expressions {
        let evaluation = expression.evaluate(scope, locations);
        passed = combine.fold(passed, evaluation.passed);
        results.extend(evaluation.results);
    }

    Evaluation::new(passed, results)
}
