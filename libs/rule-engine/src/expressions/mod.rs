//! Composable rule expressions
//!
//! An [`Expression`] is an immutable tree built once from a rule definition and evaluated
//! against any number of documents:
//!
//! ```text
//! AllOf (resourceType: Microsoft.Web/sites)
//! ├── Leaf  properties.httpsOnly          equals true
//! └── AnyOf
//!     ├── Leaf  properties.siteConfig.minTlsVersion  in ["1.2", "1.3"]
//!     └── Leaf  properties.siteConfig.minTlsVersion  exists false
//! ```
//!
//! Evaluation is a pure recursive walk: leaves resolve their scopes through a
//! [`PathResolver`], apply their operator to every resolved node and annotate each outcome
//! with a source location; groups evaluate every child (no short-circuiting, so reports
//! are complete) and combine the outcomes.

mod group;
mod leaf;

pub use group::{AllOfExpression, AnyOfExpression};
pub use leaf::LeafExpression;

use crate::error::{Error, Result};
use crate::evaluation::Evaluation;
use bastion_jsonpath::{PathResolver, SourceLocationResolver};

/// Properties shared by every expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionCommonProperties {
    /// Narrows evaluation to resources of this type before `path` is resolved
    pub resource_type: Option<String>,
    /// Location to evaluate, relative to the (possibly resource-scoped) document
    pub path: Option<String>,
}

impl ExpressionCommonProperties {
    pub fn new(resource_type: Option<&str>, path: &str) -> Self {
        Self {
            resource_type: resource_type.map(str::to_string),
            path: Some(path.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum Expression {
    Leaf(LeafExpression),
    AllOf(AllOfExpression),
    AnyOf(AnyOfExpression),
}

impl Expression {
    /// Evaluate against `scope`, resolving source locations through `locations` when given.
    ///
    /// Without a location resolver every result reports line 0.
    pub fn evaluate(
        &self,
        scope: &dyn PathResolver,
        locations: Option<&dyn SourceLocationResolver>,
    ) -> Evaluation {
        match self {
            Self::Leaf(leaf) => leaf.evaluate(scope, locations),
            Self::AllOf(all_of) => all_of.evaluate(scope, locations),
            Self::AnyOf(any_of) => any_of.evaluate(scope, locations),
        }
    }

    pub fn resource_type(&self) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => leaf.resource_type(),
            Self::AllOf(all_of) => all_of.resource_type(),
            Self::AnyOf(any_of) => any_of.resource_type(),
        }
    }

    /// First resource type declared by this expression or any descendant, in tree order.
    fn declared_resource_type(&self) -> Option<&str> {
        if let Some(resource_type) = self.resource_type() {
            return Some(resource_type);
        }
        match self {
            Self::Leaf(_) => None,
            Self::AllOf(all_of) => first_declared(all_of.expressions()),
            Self::AnyOf(any_of) => first_declared(any_of.expressions()),
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::AllOf(all_of) => all_of.expressions().iter().map(Self::leaf_count).sum(),
            Self::AnyOf(any_of) => any_of.expressions().iter().map(Self::leaf_count).sum(),
        }
    }
}

impl From<LeafExpression> for Expression {
    fn from(leaf: LeafExpression) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<AllOfExpression> for Expression {
    fn from(all_of: AllOfExpression) -> Self {
        Self::AllOf(all_of)
    }
}

impl From<AnyOfExpression> for Expression {
    fn from(any_of: AnyOfExpression) -> Self {
        Self::AnyOf(any_of)
    }
}

fn first_declared(expressions: &[Expression]) -> Option<&str> {
    expressions.iter().find_map(Expression::declared_resource_type)
}

/// Treat a blank resource type as unscoped.
fn normalize_resource_type(resource_type: Option<String>) -> Option<String> {
    resource_type.filter(|t| !t.trim().is_empty())
}

/// A group scoped to a resource type hands resource scopes to its children; a child that
/// scopes again would look for resources inside a resource.
fn reject_double_scoping(resource_type: Option<&str>, expressions: &[Expression]) -> Result<()> {
    let Some(group_type) = resource_type else {
        return Ok(());
    };
    match first_declared(expressions) {
        Some(child_type) => Err(Error::invalid_argument(format!(
            "expression scoped to resource type '{}' is nested in a group already scoped to '{}'",
            child_type, group_type
        ))),
        None => Ok(()),
    }
}
