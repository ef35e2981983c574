use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::evaluation::EvaluationResult;
use crate::plan::AnalysisPlan;
use crate::rules::{Rule, RuleSet, Severity};
use crate::template;
use bastion_jsonpath::{JsonPathResolver, JsonSourceLocationResolver, SourceLocationResolver};
use serde::Serialize;
use serde_json::Value;

/// Reusable analyzer - owns the built rule set and the compiled plan
#[derive(Debug)]
pub struct Analyzer {
    rules: RuleSet,
    plan: AnalysisPlan,
}

impl Analyzer {
    pub fn new(rules: RuleSet, plan: AnalysisPlan) -> Self {
        for id in &plan.suppressed {
            if rules.get(id).is_none() {
                tracing::warn!(rule = %id, "suppressed rule is not in the rule set");
            }
        }
        Self { rules, plan }
    }

    pub fn from_config(rules: RuleSet, config: &AnalyzerConfig) -> Result<Self> {
        let plan = config.compile()?;
        Ok(Self::new(rules, plan))
    }

    /// Run every planned rule against `template`.
    ///
    /// `source` is the text `template` was parsed from; without it every result reports
    /// line 0.
    pub fn analyze(&self, template: &Value, source: Option<&str>) -> Report {
        let locations = source.map(|text| {
            JsonSourceLocationResolver::new(text).with_nearest_ancestor(self.plan.nearest_ancestor)
        });
        AnalysisRun::new(&self.plan, template, locations.as_ref()).execute(&self.rules)
    }

    /// Parse `text` as a template and analyze it with line numbers.
    ///
    /// Comments and trailing commas are accepted; reported lines refer to `text` as given.
    pub fn analyze_str(&self, text: &str) -> Result<Report> {
        let template = template::parse_template(text)?;
        Ok(self.analyze(&template, Some(text)))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn plan(&self) -> &AnalysisPlan {
        &self.plan
    }
}

/// Short-lived analysis of one template
struct AnalysisRun<'a> {
    plan: &'a AnalysisPlan,
    root: JsonPathResolver<'a>,
    locations: Option<&'a JsonSourceLocationResolver>,
}

impl<'a> AnalysisRun<'a> {
    fn new(
        plan: &'a AnalysisPlan,
        template: &'a Value,
        locations: Option<&'a JsonSourceLocationResolver>,
    ) -> Self {
        Self {
            plan,
            root: JsonPathResolver::new(template),
            locations,
        }
    }

    fn execute(self, rules: &RuleSet) -> Report {
        let outcomes = rules
            .iter()
            .filter(|rule| {
                let included = self.plan.includes(rule);
                if !included {
                    tracing::debug!(rule = %rule.id, "skipped by plan");
                }
                included
            })
            .map(|rule| self.run(rule))
            .collect();
        Report { outcomes }
    }

    fn run(&self, rule: &Rule) -> RuleOutcome {
        let locations = self.locations.map(|l| l as &dyn SourceLocationResolver);
        let evaluation = rule.expression().evaluate(&self.root, locations);

        tracing::debug!(
            rule = %rule.id,
            passed = evaluation.passed,
            results = evaluation.results.len(),
            "evaluated rule"
        );

        let results = if self.plan.include_passed {
            evaluation.results
        } else {
            evaluation.results.into_iter().filter(|r| !r.passed).collect()
        };

        RuleOutcome {
            rule_id: rule.id.clone(),
            name: rule.name.clone(),
            severity: rule.severity,
            recommendation: rule.recommendation.clone(),
            help_uri: rule.help_uri.clone(),
            passed: evaluation.passed,
            results,
        }
    }
}

/// Result of one rule against one template
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: String,
    pub name: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_uri: Option<String>,
    pub passed: bool,
    pub results: Vec<EvaluationResult>,
}

impl RuleOutcome {
    /// Failing results, in evaluation order
    pub fn failures(&self) -> impl Iterator<Item = &EvaluationResult> + '_ {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Outcomes of every planned rule, in rule-set order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub outcomes: Vec<RuleOutcome>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleOutcome> + '_ {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn failure_count(&self) -> usize {
        self.failed_rules().count()
    }
}
