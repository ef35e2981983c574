//! Leaf-level predicates
//!
//! An operator decides one boolean from one document node. `None` stands for a path that
//! does not exist in the scope being evaluated. Operators are total: a node of the wrong
//! kind evaluates to `false`, never to an error.

mod comparison;
mod equality;

pub use comparison::Comparison;

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Predicate capability used by leaf expressions
pub trait LeafOperator: fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Evaluate against a node, or against an absent node when `None`.
    fn evaluate(&self, node: Option<&Value>) -> bool;
}

/// Built-in operator family
#[derive(Debug, Clone)]
pub enum Operator {
    /// Node presence. A JSON `null` is present.
    Exists { expected: bool },
    /// Node present, not `null` and not an empty string
    HasValue { expected: bool },
    /// Literal equality
    Equals { value: Value, case_sensitive: bool },
    /// Regular expression match against string nodes
    Regex(Regex),
    /// Equality with any listed literal
    In {
        values: Vec<Value>,
        case_sensitive: bool,
    },
    /// Relational comparison against a number or string
    Compare { comparison: Comparison, value: Value },
    /// Inverts the wrapped operator
    Not(Box<Operator>),
}

impl Operator {
    pub fn exists(expected: bool) -> Self {
        Self::Exists { expected }
    }

    pub fn has_value(expected: bool) -> Self {
        Self::HasValue { expected }
    }

    pub fn equals(value: Value, case_sensitive: bool) -> Self {
        Self::Equals {
            value,
            case_sensitive,
        }
    }

    /// Compile `pattern` once; an invalid pattern is a malformed rule.
    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| Error::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn one_of(values: Vec<Value>, case_sensitive: bool) -> Self {
        Self::In {
            values,
            case_sensitive,
        }
    }

    /// Relational operator; only numbers and strings can be compared.
    pub fn compare(comparison: Comparison, value: Value) -> Result<Self> {
        match value {
            Value::Number(_) | Value::String(_) => Ok(Self::Compare { comparison, value }),
            other => Err(Error::invalid_argument(format!(
                "'{}' expects a number or string, got {}",
                comparison, other
            ))),
        }
    }

    /// Wrap in [`Operator::Not`]. Negating twice unwraps.
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    pub fn evaluate(&self, node: Option<&Value>) -> bool {
        match self {
            Self::Exists { expected } => node.is_some() == *expected,
            Self::HasValue { expected } => node.is_some_and(has_value) == *expected,
            Self::Equals {
                value,
                case_sensitive,
            } => node.is_some_and(|n| equality::values_equal(n, value, *case_sensitive)),
            Self::Regex(regex) => node
                .and_then(Value::as_str)
                .is_some_and(|s| regex.is_match(s)),
            Self::In {
                values,
                case_sensitive,
            } => node.is_some_and(|n| {
                values
                    .iter()
                    .any(|v| equality::values_equal(n, v, *case_sensitive))
            }),
            Self::Compare { comparison, value } => node
                .and_then(|n| comparison::compare_values(n, value))
                .is_some_and(|ordering| comparison.accepts(ordering)),
            Self::Not(inner) => !inner.evaluate(node),
        }
    }
}

fn has_value(node: &Value) -> bool {
    match node {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

impl LeafOperator for Operator {
    fn name(&self) -> &str {
        match self {
            Self::Exists { .. } => "exists",
            Self::HasValue { .. } => "hasValue",
            Self::Equals { .. } => "equals",
            Self::Regex(_) => "regex",
            Self::In { .. } => "in",
            Self::Compare { comparison, .. } => comparison.key(),
            Self::Not(_) => "not",
        }
    }

    fn evaluate(&self, node: Option<&Value>) -> bool {
        Operator::evaluate(self, node)
    }
}
