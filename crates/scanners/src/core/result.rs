use crate::core::{Category, Evaluation, Resource, Rule, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_id: String,

    pub category: Category,

    pub severity: Severity,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub learn_more_url: Option<String>,

    pub passed: bool,

    pub is_applicable: bool,

    pub recommendation: String,

    #[serde(default)]
    pub evaluation_error: bool,
}

impl RuleResult {
    pub fn from_evaluation(rule: &dyn Rule, evaluation: Evaluation) -> Self {
        let evaluation = evaluation.normalized();
        Self {
            rule_id: rule.id().to_string(),
            category: rule.category(),
            severity: rule.severity(),
            description: rule.description().to_string(),
            learn_more_url: rule.learn_more_url().map(str::to_string),
            passed: evaluation.passed,
            is_applicable: evaluation.applicable,
            recommendation: evaluation.recommendation,
            evaluation_error: false,
        }
    }

    pub fn evaluation_error(rule: &dyn Rule, detail: impl std::fmt::Display) -> Self {
        let detail = detail.to_string();
        let detail = if detail.trim().is_empty() {
            "unknown failure".to_string()
        } else {
            detail
        };

        Self {
            rule_id: rule.id().to_string(),
            category: rule.category(),
            severity: rule.severity(),
            description: rule.description().to_string(),
            learn_more_url: rule.learn_more_url().map(str::to_string),
            passed: false,
            is_applicable: true,
            recommendation: format!("evaluation error: {}", detail),
            evaluation_error: true,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.is_applicable && !self.passed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResult {
    pub subscription_id: String,

    pub resource_group: String,

    pub service_name: String,

    pub service_type: String,

    pub location: String,

    pub rules: Vec<RuleResult>,
}

impl ServiceResult {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        resource: &dyn Resource,
        rules: Vec<RuleResult>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            service_name: resource.name().to_string(),
            service_type: resource.resource_type().to_string(),
            location: resource.location().to_string(),
            rules,
        }
    }

    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleResult> {
        self.rules.iter().filter(|r| r.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.rules.iter().any(RuleResult::is_failure)
    }

    pub fn rule(&self, rule_id: &str) -> Option<&RuleResult> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }
}
