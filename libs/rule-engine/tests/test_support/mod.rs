#![allow(dead_code)]

//! Recording test doubles for the evaluation collaborators

use bastion_jsonpath::{JsonPath, PathResolver, SourceLocation, SourceLocationResolver};
use bastion_rules::{
    Expression, ExpressionCommonProperties, LeafExpression, LeafOperator,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Scripted [`PathResolver`]. Clones share state, so a mock handed out from `resolve`
/// records calls on the same instance the test holds.
#[derive(Clone)]
pub struct MockResolver(Rc<MockState>);

struct MockState {
    path: String,
    node: Value,
    resolves: RefCell<HashMap<String, Vec<MockResolver>>>,
    resolve_any: RefCell<Option<Vec<MockResolver>>>,
    resource_types: RefCell<HashMap<String, Vec<MockResolver>>>,
    resolve_calls: RefCell<Vec<String>>,
    resource_type_calls: RefCell<Vec<String>>,
    node_reads: Cell<usize>,
}

impl MockResolver {
    pub fn new(path: &str, node: Value) -> Self {
        Self(Rc::new(MockState {
            path: path.to_string(),
            node,
            resolves: RefCell::default(),
            resolve_any: RefCell::default(),
            resource_types: RefCell::default(),
            resolve_calls: RefCell::default(),
            resource_type_calls: RefCell::default(),
            node_reads: Cell::new(0),
        }))
    }

    /// `resolve(path)` returns `targets`.
    pub fn on_resolve(&self, path: &str, targets: Vec<MockResolver>) {
        self.0.resolves.borrow_mut().insert(path.to_string(), targets);
    }

    /// `resolve` of any path without its own script returns `targets`.
    pub fn on_any_resolve(&self, targets: Vec<MockResolver>) {
        *self.0.resolve_any.borrow_mut() = Some(targets);
    }

    /// `resolve_resource_type(resource_type)` returns `targets`.
    pub fn on_resource_type(&self, resource_type: &str, targets: Vec<MockResolver>) {
        self.0
            .resource_types
            .borrow_mut()
            .insert(resource_type.to_string(), targets);
    }

    pub fn resolve_calls(&self) -> Vec<String> {
        self.0.resolve_calls.borrow().clone()
    }

    pub fn resource_type_calls(&self) -> Vec<String> {
        self.0.resource_type_calls.borrow().clone()
    }

    pub fn node_reads(&self) -> usize {
        self.0.node_reads.get()
    }
}

impl PathResolver for MockResolver {
    fn path(&self) -> &str {
        &self.0.path
    }

    fn node(&self) -> &Value {
        self.0.node_reads.set(self.0.node_reads.get() + 1);
        &self.0.node
    }

    fn resolve(&self, path: &JsonPath) -> Vec<Box<dyn PathResolver + '_>> {
        self.0.resolve_calls.borrow_mut().push(path.as_str().to_string());
        let targets = self
            .0
            .resolves
            .borrow()
            .get(path.as_str())
            .cloned()
            .or_else(|| self.0.resolve_any.borrow().clone())
            .unwrap_or_default();
        boxed(targets)
    }

    fn resolve_resource_type(&self, resource_type: &str) -> Vec<Box<dyn PathResolver + '_>> {
        self.0
            .resource_type_calls
            .borrow_mut()
            .push(resource_type.to_string());
        let targets = self
            .0
            .resource_types
            .borrow()
            .get(resource_type)
            .cloned()
            .unwrap_or_default();
        boxed(targets)
    }
}

fn boxed<'a>(targets: Vec<MockResolver>) -> Vec<Box<dyn PathResolver + 'a>> {
    targets
        .into_iter()
        .map(|t| Box::new(t) as Box<dyn PathResolver + 'a>)
        .collect()
}

/// Scripted [`SourceLocationResolver`] mapping paths to lines
#[derive(Default)]
pub struct MockLocations {
    lines: HashMap<String, usize>,
    calls: RefCell<Vec<String>>,
}

impl MockLocations {
    pub fn with_line(mut self, path: &str, line: usize) -> Self {
        self.lines.insert(path.to_string(), line);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SourceLocationResolver for MockLocations {
    fn resolve_source_location(&self, path: &str) -> SourceLocation {
        self.calls.borrow_mut().push(path.to_string());
        self.lines
            .get(path)
            .map(|&line| SourceLocation::line(line))
            .unwrap_or_default()
    }
}

/// Operator that returns a fixed verdict and records every node it was given
#[derive(Debug, Clone)]
pub struct FixedOperator {
    verdict: bool,
    calls: Arc<Mutex<Vec<Option<Value>>>>,
}

impl FixedOperator {
    pub fn new(verdict: bool) -> Self {
        Self {
            verdict,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<Option<Value>> {
        self.calls.lock().unwrap().clone()
    }
}

impl LeafOperator for FixedOperator {
    fn name(&self) -> &str {
        "fixed"
    }

    fn evaluate(&self, node: Option<&Value>) -> bool {
        self.calls.lock().unwrap().push(node.cloned());
        self.verdict
    }
}

/// Leaf at `path` whose operator always returns `verdict`
pub fn fixed_leaf(verdict: bool, resource_type: Option<&str>, path: &str) -> Expression {
    LeafExpression::new(
        Box::new(FixedOperator::new(verdict)),
        ExpressionCommonProperties::new(resource_type, path),
    )
    .unwrap()
    .into()
}
