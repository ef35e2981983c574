//! Rule-definition schema and expression construction
//!
//! ```text
//! Rule := Leaf | { "allOf": [Rule, ...], "resourceType"?: string }
//!              | { "anyOf": [Rule, ...], "resourceType"?: string }
//! Leaf := { "path": string, "resourceType"?: string, <operator>: <value>,
//!           "caseSensitive"?: bool, "negate"?: bool }
//! ```
//!
//! Definitions are deserialized as-is and validated by [`RuleDefinition::build`], so a
//! malformed rule fails before any document is evaluated.

use crate::error::{Error, Result};
use crate::expressions::{
    AllOfExpression, AnyOfExpression, Expression, ExpressionCommonProperties, LeafExpression,
};
use crate::operators::{Comparison, Operator};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    // Groups. `Some(None)` records an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub all_of: Option<Option<Vec<RuleDefinition>>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub any_of: Option<Option<Vec<RuleDefinition>>>,

    // Operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_value: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub equals: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub not_equals: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_or_equals: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_or_equals: Option<Value>,

    // Modifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negate: Option<bool>,
}

/// Distinguish a key given as `null` from an absent key: absent stays `None` through
/// `#[serde(default)]`, anything present (including `null`) becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl RuleDefinition {
    /// Parse a definition from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate the definition and build its expression tree.
    pub fn build(&self) -> Result<Expression> {
        match (&self.all_of, &self.any_of) {
            (Some(_), Some(_)) => Err(Error::invalid_argument(
                "a rule cannot declare both 'allOf' and 'anyOf'",
            )),
            (Some(children), None) => {
                let expressions = self.build_group("allOf", children)?;
                Ok(AllOfExpression::new(expressions, self.resource_type.clone())?.into())
            }
            (None, Some(children)) => {
                let expressions = self.build_group("anyOf", children)?;
                Ok(AnyOfExpression::new(expressions, self.resource_type.clone())?.into())
            }
            (None, None) => self.build_leaf(),
        }
    }

    fn build_group(
        &self,
        key: &str,
        children: &Option<Vec<RuleDefinition>>,
    ) -> Result<Vec<Expression>> {
        let children = children
            .as_ref()
            .ok_or_else(|| Error::invalid_argument(format!("'{}' must be an array", key)))?;

        let operators = self.operator_keys();
        if self.path.is_some() || !operators.is_empty() {
            return Err(Error::invalid_argument(format!(
                "'{}' cannot be combined with 'path' or operators",
                key
            )));
        }

        children.iter().map(RuleDefinition::build).collect()
    }

    fn build_leaf(&self) -> Result<Expression> {
        let operator = self.build_operator()?;
        let common = ExpressionCommonProperties {
            resource_type: self.resource_type.clone(),
            path: self.path.clone(),
        };
        Ok(LeafExpression::new(Box::new(operator), common)?.into())
    }

    fn operator_keys(&self) -> Vec<&'static str> {
        let candidates = [
            ("exists", self.exists.is_some()),
            ("hasValue", self.has_value.is_some()),
            ("equals", self.equals.is_some()),
            ("notEquals", self.not_equals.is_some()),
            ("regex", self.regex.is_some()),
            ("in", self.in_values.is_some()),
            ("less", self.less.is_some()),
            ("lessOrEquals", self.less_or_equals.is_some()),
            ("greater", self.greater.is_some()),
            ("greaterOrEquals", self.greater_or_equals.is_some()),
        ];
        candidates
            .into_iter()
            .filter_map(|(key, set)| set.then_some(key))
            .collect()
    }

    fn build_operator(&self) -> Result<Operator> {
        let keys = self.operator_keys();
        match keys.as_slice() {
            [] => {
                return Err(Error::invalid_argument(
                    "leaf expression requires an operator",
                ))
            }
            [_] => {}
            many => {
                return Err(Error::invalid_argument(format!(
                    "leaf expression declares more than one operator: {}",
                    many.join(", ")
                )))
            }
        }

        let case_sensitive = self.case_sensitive.unwrap_or(false);
        let operator = if let Some(expected) = self.exists {
            Operator::exists(expected)
        } else if let Some(expected) = self.has_value {
            Operator::has_value(expected)
        } else if let Some(value) = &self.equals {
            Operator::equals(value.clone(), case_sensitive)
        } else if let Some(value) = &self.not_equals {
            Operator::equals(value.clone(), case_sensitive).negate()
        } else if let Some(pattern) = &self.regex {
            Operator::regex(pattern)?
        } else if let Some(values) = &self.in_values {
            Operator::one_of(values.clone(), case_sensitive)
        } else if let Some(value) = &self.less {
            Operator::compare(Comparison::Less, value.clone())?
        } else if let Some(value) = &self.less_or_equals {
            Operator::compare(Comparison::LessOrEquals, value.clone())?
        } else if let Some(value) = &self.greater {
            Operator::compare(Comparison::Greater, value.clone())?
        } else if let Some(value) = &self.greater_or_equals {
            Operator::compare(Comparison::GreaterOrEquals, value.clone())?
        } else {
            unreachable!("operator_keys reported exactly one operator")
        };

        Ok(if self.negate.unwrap_or(false) {
            operator.negate()
        } else {
            operator
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_jsonpath::JsonPathResolver;
    use serde_json::json;

    fn build(definition: Value) -> Result<Expression> {
        serde_json::from_value::<RuleDefinition>(definition)?.build()
    }

    #[test]
    fn test_builds_leaf() {
        let expression = build(json!({
            "resourceType": "Microsoft.Web/sites",
            "path": "properties.httpsOnly",
            "equals": true
        }))
        .unwrap();

        match expression {
            Expression::Leaf(leaf) => {
                assert_eq!(leaf.resource_type(), Some("Microsoft.Web/sites"));
                assert_eq!(leaf.path(), "properties.httpsOnly");
                assert_eq!(leaf.operator().name(), "equals");
            }
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn test_builds_nested_groups() {
        let expression = build(json!({
            "resourceType": "Microsoft.Web/sites",
            "allOf": [
                { "path": "properties.httpsOnly", "equals": true },
                { "anyOf": [
                    { "path": "properties.minTlsVersion", "in": ["1.2", "1.3"] },
                    { "path": "properties.minTlsVersion", "exists": false }
                ]}
            ]
        }))
        .unwrap();

        assert!(matches!(expression, Expression::AllOf(_)));
        assert_eq!(expression.resource_type(), Some("Microsoft.Web/sites"));
        assert_eq!(expression.leaf_count(), 3);
    }

    #[test]
    fn test_equals_null_is_an_operator() {
        let expression = build(json!({ "path": "a", "equals": null })).unwrap();
        let doc = json!({ "a": null });
        let evaluation = expression.evaluate(&JsonPathResolver::new(&doc), None);
        assert!(evaluation.passed);
    }

    #[test]
    fn test_not_equals_and_negate() {
        let doc = json!({ "access": "Deny" });
        let root = JsonPathResolver::new(&doc);

        let not_equals = build(json!({ "path": "access", "notEquals": "Allow" })).unwrap();
        assert!(not_equals.evaluate(&root, None).passed);

        let negated_regex = build(json!({ "path": "access", "regex": "^D", "negate": true })).unwrap();
        assert!(!negated_regex.evaluate(&root, None).passed);
    }

    #[test]
    fn test_case_sensitive_modifier() {
        let doc = json!({ "sku": "standard" });
        let root = JsonPathResolver::new(&doc);

        let insensitive = build(json!({ "path": "sku", "equals": "Standard" })).unwrap();
        assert!(insensitive.evaluate(&root, None).passed);

        let sensitive =
            build(json!({ "path": "sku", "equals": "Standard", "caseSensitive": true })).unwrap();
        assert!(!sensitive.evaluate(&root, None).passed);
    }

    #[test]
    fn test_rejects_malformed_definitions() {
        let cases = [
            json!({ "path": "a" }),
            json!({ "exists": true }),
            json!({ "path": "", "exists": true }),
            json!({ "path": "a", "exists": true, "equals": 1 }),
            json!({ "allOf": null }),
            json!({ "anyOf": null, "resourceType": "x" }),
            json!({ "allOf": [], "anyOf": [] }),
            json!({ "allOf": [], "path": "a" }),
            json!({ "allOf": [ { "path": "a" } ] }),
            json!({ "path": "a", "regex": "(" }),
            json!({ "path": "a", "less": [1] }),
            json!({ "resourceType": "t", "anyOf": [ { "resourceType": "u", "path": "a", "exists": true } ] }),
        ];

        for case in cases {
            let error = build(case.clone()).expect_err(&case.to_string());
            assert!(error.is_invalid_argument(), "{}: {}", case, error);
        }
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let error = build(json!({ "path": "a", "exist": true })).unwrap_err();
        assert!(matches!(error, Error::Json(_)));
    }

    #[test]
    fn test_empty_group_is_legal() {
        let expression = build(json!({ "anyOf": [] })).unwrap();
        let doc = json!({});
        assert!(!expression.evaluate(&JsonPathResolver::new(&doc), None).passed);
    }
}
