//! Analyzer configuration
//!
//! ```yaml
//! suppress:
//!   - TA-000017
//! minSeverity: 2
//! includePassed: false
//! locations:
//!   nearestAncestor: true
//! ```

use crate::error::{Error, Result};
use crate::plan::AnalysisPlan;
use crate::rules::{is_yaml, Severity};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Rule ids that are not run (case-insensitive)
    pub suppress: Vec<String>,
    /// Only rules at least this severe are run
    pub min_severity: Severity,
    /// Keep passing results in rule outcomes
    pub include_passed: bool,
    pub locations: LocationsConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            suppress: Vec::new(),
            min_severity: Severity::Low,
            include_passed: false,
            locations: LocationsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationsConfig {
    /// Report the nearest mapped ancestor's line for paths without a mapping of their own
    pub nearest_ancestor: bool,
}

impl AnalyzerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
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

    /// Validate and compile into an execution plan.
    pub fn compile(&self) -> Result<AnalysisPlan> {
        if let Some(blank) = self.suppress.iter().find(|id| id.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "suppressed rule id must not be blank, got '{}'",
                blank
            )));
        }
        Ok(AnalysisPlan::from(self))
    }
}
