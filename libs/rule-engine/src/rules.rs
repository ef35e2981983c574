//! Rules and rule sets
//!
//! A rule file is a JSON or YAML array of rules:
//!
//! ```json
//! [
//!   {
//!     "id": "TA-000004",
//!     "name": "WebAppsHttpsOnly",
//!     "description": "Web apps should only be accessible over HTTPS",
//!     "recommendation": "Set properties.httpsOnly to true",
//!     "helpUri": "https://example.com/rules/TA-000004",
//!     "severity": 2,
//!     "evaluation": {
//!       "resourceType": "Microsoft.Web/sites",
//!       "path": "properties.httpsOnly",
//!       "equals": true
//!     }
//!   }
//! ]
//! ```

use crate::definition::RuleDefinition;
use crate::error::{Error, Result};
use crate::expressions::Expression;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SeverityRepr", into = "u8")]
pub enum Severity {
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Whether this severity is at least as severe as `threshold`
    pub fn meets(self, threshold: Severity) -> bool {
        self.level() <= threshold.level()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.level()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeverityRepr {
    Level(u8),
    Name(String),
}

impl TryFrom<SeverityRepr> for Severity {
    type Error = String;

    fn try_from(repr: SeverityRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            SeverityRepr::Level(1) => Ok(Self::High),
            SeverityRepr::Level(2) => Ok(Self::Medium),
            SeverityRepr::Level(3) => Ok(Self::Low),
            SeverityRepr::Level(other) => Err(format!("severity must be 1, 2 or 3, got {}", other)),
            SeverityRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "high" => Ok(Self::High),
                "medium" => Ok(Self::Medium),
                "low" => Ok(Self::Low),
                _ => Err(format!("unknown severity '{}'", name)),
            },
        }
    }
}

/// Serialized form of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    pub evaluation: RuleDefinition,
}

/// A rule with its expression tree built
#[derive(Debug)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub recommendation: Option<String>,
    pub help_uri: Option<String>,
    pub severity: Severity,
    expression: Expression,
}

impl Rule {
    pub fn new(spec: RuleSpec) -> Result<Self> {
        if spec.id.trim().is_empty() {
            return Err(Error::invalid_argument("rule id must not be empty"));
        }

        let expression = spec.evaluation.build().map_err(|e| Error::InvalidRule {
            id: spec.id.clone(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: spec.id,
            name: spec.name,
            description: spec.description,
            recommendation: spec.recommendation,
            help_uri: spec.help_uri,
            severity: spec.severity,
            expression,
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build every rule, failing on the first malformed one or a repeated id.
    pub fn from_specs(specs: Vec<RuleSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(specs.len());

        for spec in specs {
            if !seen.insert(spec.id.to_ascii_lowercase()) {
                return Err(Error::DuplicateRule(spec.id));
            }
            rules.push(Rule::new(spec)?);
        }

        tracing::debug!(rules = rules.len(), "built rule set");
        Ok(Self { rules })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_specs(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::from_specs(serde_yaml::from_str(text)?)
    }

    /// Load from a file; `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if is_yaml(path) {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id.eq_ignore_ascii_case(id))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub(crate) fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"[
        {
            "id": "TA-000001",
            "name": "HttpsOnly",
            "severity": 1,
            "evaluation": { "resourceType": "Microsoft.Web/sites", "path": "properties.httpsOnly", "equals": true }
        },
        {
            "id": "TA-000002",
            "severity": "low",
            "evaluation": { "path": "contentVersion", "exists": true }
        }
    ]"#;

    #[test]
    fn test_loads_json_rule_set() {
        let rules = RuleSet::from_json_str(RULES).unwrap();
        assert_eq!(rules.len(), 2);

        let first = rules.get("ta-000001").unwrap();
        assert_eq!(first.name, "HttpsOnly");
        assert_eq!(first.severity, Severity::High);
        assert_eq!(first.expression().resource_type(), Some("Microsoft.Web/sites"));

        assert_eq!(rules.get("TA-000002").unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_loads_yaml_rule_set() {
        let yaml = r#"
- id: TA-000010
  name: NoPublicBlob
  evaluation:
    resourceType: Microsoft.Storage/storageAccounts
    path: properties.allowBlobPublicAccess
    equals: false
"#;
        let rules = RuleSet::from_yaml_str(yaml).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.iter().next().unwrap().severity, Severity::Medium);
    }

    #[test]
    fn test_reports_rule_id_of_malformed_rule() {
        let error = RuleSet::from_json_str(
            r#"[{ "id": "TA-9", "evaluation": { "path": "a" } }]"#,
        )
        .unwrap_err();

        match &error {
            Error::InvalidRule { id, .. } => assert_eq!(id, "TA-9"),
            other => panic!("unexpected error: {}", other),
        }
        assert!(error.is_invalid_argument());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let error = RuleSet::from_json_str(
            r#"[
                { "id": "A", "evaluation": { "path": "a", "exists": true } },
                { "id": "a", "evaluation": { "path": "b", "exists": true } }
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(error, Error::DuplicateRule(id) if id == "a"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High.meets(Severity::Medium));
        assert!(Severity::Medium.meets(Severity::Medium));
        assert!(!Severity::Low.meets(Severity::Medium));
        assert_eq!(serde_json::to_value(Severity::Low).unwrap(), 3);
        assert!(serde_json::from_str::<Severity>("4").is_err());
        assert!(serde_json::from_str::<Severity>("\"critical\"").is_err());
    }

    #[test]
    fn test_yaml_extension_detection() {
        assert!(is_yaml(Path::new("rules.YAML")));
        assert!(is_yaml(Path::new("dir/rules.yml")));
        assert!(!is_yaml(Path::new("rules.json")));
        assert!(!is_yaml(Path::new("rules")));
    }
}
