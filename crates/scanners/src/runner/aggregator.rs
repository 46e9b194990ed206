use crate::core::{Category, ScanError, ScanResult, ServiceResult, Severity};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Append-only sink for the service results of a scan run.
///
/// Workers may record concurrently; results keep the order they were recorded in.
#[derive(Debug, Default)]
pub struct ScanAggregator {
    results: Mutex<Vec<ServiceResult>>,
    failures: Mutex<Vec<FailedScope>>,
}

impl ScanAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: ServiceResult) {
        self.results.lock().push(result);
    }

    pub fn extend<I: IntoIterator<Item = ServiceResult>>(&self, results: I) {
        self.results.lock().extend(results);
    }

    pub fn record_failure(&self, service: &str, resource_group: &str, error: &ScanError) {
        self.failures.lock().push(FailedScope {
            service: service.to_string(),
            resource_group: resource_group.to_string(),
            error: error.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }

    pub fn finish(self) -> ScanReport {
        let mut report = ScanReport::new(self.results.into_inner());
        report.failed_scopes = self.failures.into_inner();
        report
    }
}

/// A resource group one service scanner could not list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedScope {
    pub service: String,
    pub resource_group: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCount {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCount {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub resources: usize,
    pub rule_results: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_applicable: usize,
    pub evaluation_errors: usize,
    pub failed_by_severity: SeverityCount,
    pub failed_by_category: BTreeMap<Category, usize>,
}

impl ScanSummary {
    pub fn from_results(results: &[ServiceResult]) -> Self {
        let mut summary = Self {
            resources: results.len(),
            ..Self::default()
        };

        for rule in results.iter().flat_map(|r| &r.rules) {
            summary.rule_results += 1;

            if rule.evaluation_error {
                summary.evaluation_errors += 1;
            }

            if !rule.is_applicable {
                summary.not_applicable += 1;
            } else if rule.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
                summary.failed_by_severity.add(rule.severity);
                *summary.failed_by_category.entry(rule.category).or_insert(0) += 1;
            }
        }

        summary
    }

    /// Share of applicable rule results that passed, in percent.
    pub fn compliance_percentage(&self) -> f64 {
        let applicable = self.passed + self.failed;
        if applicable == 0 {
            return 100.0;
        }
        (self.passed as f64 / applicable as f64) * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ServiceResult>,
    pub summary: ScanSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_scopes: Vec<FailedScope>,
}

impl ScanReport {
    pub fn new(results: Vec<ServiceResult>) -> Self {
        let summary = ScanSummary::from_results(&results);
        Self {
            generated_at: Utc::now(),
            results,
            summary,
            failed_scopes: Vec::new(),
        }
    }

    pub fn results(&self) -> &[ServiceResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_scopes.is_empty()
    }

    pub fn by_subscription(&self) -> BTreeMap<&str, Vec<&ServiceResult>> {
        self.group_by(|r| &r.subscription_id)
    }

    pub fn by_resource_group(&self) -> BTreeMap<&str, Vec<&ServiceResult>> {
        self.group_by(|r| &r.resource_group)
    }

    pub fn by_service_type(&self) -> BTreeMap<&str, Vec<&ServiceResult>> {
        self.group_by(|r| &r.service_type)
    }

    fn group_by<'a, F>(&'a self, key: F) -> BTreeMap<&'a str, Vec<&'a ServiceResult>>
    where
        F: Fn(&'a ServiceResult) -> &'a String,
    {
        let mut groups: BTreeMap<&str, Vec<&ServiceResult>> = BTreeMap::new();
        for result in &self.results {
            groups.entry(key(result).as_str()).or_default().push(result);
        }
        groups
    }

    pub fn to_json(&self) -> ScanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RuleResult;

    fn rule_result(id: &str, severity: Severity, applicable: bool, passed: bool) -> RuleResult {
        RuleResult {
            rule_id: id.to_string(),
            category: Category::Reliability,
            severity,
            description: String::new(),
            learn_more_url: None,
            passed,
            is_applicable: applicable,
            recommendation: String::new(),
            evaluation_error: false,
        }
    }

    fn service(rg: &str, name: &str, rules: Vec<RuleResult>) -> ServiceResult {
        ServiceResult {
            subscription_id: "sub".into(),
            resource_group: rg.into(),
            service_name: name.into(),
            service_type: "Microsoft.Network/virtualWans".into(),
            location: "westeurope".into(),
            rules,
        }
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            service(
                "rg-a",
                "w1",
                vec![
                    rule_result("a", Severity::High, true, true),
                    rule_result("b", Severity::High, false, true),
                    rule_result("c", Severity::Medium, true, false),
                ],
            ),
            service("rg-b", "w2", vec![rule_result("c", Severity::Medium, true, false)]),
        ];

        let summary = ScanSummary::from_results(&results);
        assert_eq!(summary.resources, 2);
        assert_eq!(summary.rule_results, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.not_applicable, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.failed_by_severity.medium, 2);
        assert_eq!(summary.failed_by_severity.total(), 2);
        assert_eq!(summary.failed_by_category.get(&Category::Reliability), Some(&2));
        assert!((summary.compliance_percentage() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregator_keeps_every_record() {
        let aggregator = ScanAggregator::new();
        aggregator.record(service("rg-a", "w1", vec![]));
        aggregator.extend(vec![service("rg-b", "w2", vec![]), service("rg-b", "w2", vec![])]);
        assert_eq!(aggregator.len(), 3);

        let report = aggregator.finish();
        assert_eq!(report.results().len(), 3);
        let groups = report.by_resource_group();
        assert_eq!(groups["rg-a"].len(), 1);
        assert_eq!(groups["rg-b"].len(), 2);
        assert_eq!(report.by_subscription()["sub"].len(), 3);
    }

    #[test]
    fn test_report_json() {
        let report = ScanReport::new(vec![service(
            "rg",
            "w1",
            vec![rule_result("a", Severity::Low, true, true)],
        )]);
        let json = report.to_json().unwrap();
        let parsed: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.results, report.results);
        assert_eq!(parsed.summary, report.summary);
    }

    #[test]
    fn test_failed_scopes_are_reported() {
        let aggregator = ScanAggregator::new();
        aggregator.record(service("rg-a", "w1", vec![]));
        aggregator.record_failure(
            "Virtual WAN",
            "rg-b",
            &ScanError::listing("rg-b", "403 Forbidden"),
        );

        let report = aggregator.finish();
        assert!(!report.is_complete());
        assert_eq!(report.results().len(), 1);
        assert_eq!(report.failed_scopes[0].resource_group, "rg-b");
        assert!(report.failed_scopes[0].error.contains("403"));

        let parsed: ScanReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.failed_scopes, report.failed_scopes);
    }

    #[test]
    fn test_empty_report_is_fully_compliant() {
        let report = ScanAggregator::new().finish();
        assert!(report.is_empty());
        assert!(report.is_complete());
        assert_eq!(report.summary.compliance_percentage(), 100.0);
    }
}
