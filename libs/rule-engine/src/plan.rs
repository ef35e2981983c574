use crate::config::AnalyzerConfig;
use crate::rules::{Rule, Severity};
use std::collections::HashSet;

/// Compiled analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalysisPlan {
    /// Lowercased ids of rules that are not run
    pub suppressed: HashSet<String>,
    pub min_severity: Severity,
    pub include_passed: bool,
    pub nearest_ancestor: bool,
}

impl AnalysisPlan {
    /// Whether `rule` is run under this plan
    pub fn includes(&self, rule: &Rule) -> bool {
        rule.severity.meets(self.min_severity)
            && !self.suppressed.contains(&rule.id.to_ascii_lowercase())
    }
}

impl Default for AnalysisPlan {
    fn default() -> Self {
        Self::from(&AnalyzerConfig::default())
    }
}

impl From<&AnalyzerConfig> for AnalysisPlan {
    fn from(cfg: &AnalyzerConfig) -> Self {
        Self {
            suppressed: cfg
                .suppress
                .iter()
                .map(|id| id.trim().to_ascii_lowercase())
                .collect(),
            min_severity: cfg.min_severity,
            include_passed: cfg.include_passed,
            nearest_ancestor: cfg.locations.nearest_ancestor,
        }
    }
}
