//! Leaf expression: one path checked by one operator

use super::{normalize_resource_type, ExpressionCommonProperties};
use crate::error::{Error, Result};
use crate::evaluation::{Evaluation, EvaluationResult};
use crate::operators::LeafOperator;
use bastion_jsonpath::{path, JsonPath, PathResolver, SourceLocation, SourceLocationResolver};

#[derive(Debug)]
pub struct LeafExpression {
    operator: Box<dyn LeafOperator>,
    resource_type: Option<String>,
    path: JsonPath,
}

impl LeafExpression {
    /// Build a leaf. Fails when the path is missing, empty or malformed.
    pub fn new(
        operator: Box<dyn LeafOperator>,
        common: ExpressionCommonProperties,
    ) -> Result<Self> {
        let raw = common
            .path
            .ok_or_else(|| Error::invalid_argument("leaf expression requires a path"))?;
        if raw.trim().is_empty() {
            return Err(Error::invalid_argument(
                "leaf expression path must not be empty",
            ));
        }
        let path = JsonPath::parse(&raw)?;

        Ok(Self {
            operator,
            resource_type: normalize_resource_type(common.resource_type),
            path,
        })
    }

    pub fn operator(&self) -> &dyn LeafOperator {
        self.operator.as_ref()
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Evaluate the operator at every location the path reaches.
    ///
    /// The leaf passes only when every result passes. A path that reaches nothing still
    /// yields one result: the operator's verdict on an absent node, reported at the
    /// location the path would have had. A resource type that matches nothing makes the
    /// leaf not applicable (passed, no results).
    pub fn evaluate(
        &self,
        scope: &dyn PathResolver,
        locations: Option<&dyn SourceLocationResolver>,
    ) -> Evaluation {
        let mut results = Vec::new();

        match &self.resource_type {
            Some(resource_type) => {
                let resources = scope.resolve_resource_type(resource_type);
                if resources.is_empty() {
                    tracing::debug!(resource_type = %resource_type, path = %self.path, "no resources in scope");
                    return Evaluation::not_applicable();
                }
                for resource in &resources {
                    self.evaluate_path(resource.as_ref(), locations, &mut results);
                }
            }
            None => self.evaluate_path(scope, locations, &mut results),
        }

        let passed = results.iter().all(|r| r.passed);
        Evaluation::new(passed, results)
    }

    fn evaluate_path(
        &self,
        scope: &dyn PathResolver,
        locations: Option<&dyn SourceLocationResolver>,
        results: &mut Vec<EvaluationResult>,
    ) {
        let resolved = scope.resolve(&self.path);

        if resolved.is_empty() {
            let missing = path::join(scope.path(), self.path.as_str());
            let passed = self.operator.evaluate(None);
            tracing::trace!(path = %missing, operator = self.operator.name(), passed, "evaluated absent path");
            let location = locate(locations, &missing);
            results.push(EvaluationResult::new(passed, missing, location));
            return;
        }

        for target in &resolved {
            let passed = self.operator.evaluate(Some(target.node()));
            tracing::trace!(path = target.path(), operator = self.operator.name(), passed, "evaluated leaf");
            results.push(EvaluationResult::new(
                passed,
                target.path(),
                locate(locations, target.path()),
            ));
        }
    }
}

fn locate(locations: Option<&dyn SourceLocationResolver>, path: &str) -> SourceLocation {
    locations
        .map(|l| l.resolve_source_location(path))
        .unwrap_or_default()
}
