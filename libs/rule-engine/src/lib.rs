//! Rule expression evaluation for infrastructure-as-code templates
//!
//! Rules are declarative checks over a template's JSON. Each rule carries an
//! [`Expression`] tree: leaves apply an operator to the values a path reaches, groups
//! combine their children with `allOf` / `anyOf`. Evaluation yields a pass/fail verdict
//! plus one [`EvaluationResult`] per checked location, each annotated with the source line
//! it came from.
//!
//! ```text
//! RuleSet (JSON/YAML) ──build──► Rule { Expression }
//!                                       │
//! template + text ──► Analyzer ──evaluate──► Report { RuleOutcome { results } }
//! ```
//!
//! ```
//! use bastion_rules::{Analyzer, AnalyzerConfig, RuleSet};
//!
//! let rules = RuleSet::from_json_str(r#"[{
//!     "id": "TA-000004",
//!     "evaluation": {
//!         "resourceType": "Microsoft.Web/sites",
//!         "path": "properties.httpsOnly",
//!         "equals": true
//!     }
//! }]"#)?;
//!
//! let analyzer = Analyzer::from_config(rules, &AnalyzerConfig::default())?;
//! let report = analyzer.analyze_str(r#"{
//!   "resources": [
//!     { "type": "Microsoft.Web/sites", "properties": { "httpsOnly": false } }
//!   ]
//! }"#)?;
//!
//! assert!(!report.passed());
//! # Ok::<(), bastion_rules::Error>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod definition;
pub mod error;
pub mod evaluation;
pub mod expressions;
pub mod operators;
pub mod plan;
pub mod rules;
pub mod template;

pub use analyzer::{Analyzer, Report, RuleOutcome};
pub use config::{AnalyzerConfig, LocationsConfig};
pub use definition::RuleDefinition;
pub use error::{Error, Result};
pub use evaluation::{Evaluation, EvaluationResult};
pub use expressions::{
    AllOfExpression, AnyOfExpression, Expression, ExpressionCommonProperties, LeafExpression,
};
pub use operators::{Comparison, LeafOperator, Operator};
pub use plan::AnalysisPlan;
pub use rules::{Rule, RuleSet, RuleSpec, Severity};
pub use template::parse_template;

pub use bastion_jsonpath::{
    JsonPath, JsonPathResolver, JsonSourceLocationResolver, PathResolver, SourceLocation,
    SourceLocationResolver,
};
