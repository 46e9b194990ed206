use crate::core::{Resource, Rule, RuleResult, ScanContext};
use crate::runner::RuleRegistry;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Applies a registry of rules to one resource at a time.
///
/// Stateless: one engine may serve any number of workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns one result per rule, in registry order, unless the context is
    /// cancelled, in which case the results gathered so far are returned.
    pub fn evaluate_rules(
        &self,
        rules: &RuleRegistry,
        resource: &dyn Resource,
        context: &ScanContext,
    ) -> Vec<RuleResult> {
        let mut results = Vec::with_capacity(rules.len());

        for rule in rules.iter() {
            if context.is_cancelled() {
                warn!(
                    resource = resource.id(),
                    evaluated = results.len(),
                    total = rules.len(),
                    "Scan cancelled, skipping remaining rules"
                );
                break;
            }

            results.push(self.evaluate_rule(rule.as_ref(), resource, context));
        }

        results
    }

    pub fn evaluate_rule(
        &self,
        rule: &dyn Rule,
        resource: &dyn Resource,
        context: &ScanContext,
    ) -> RuleResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(resource, context)));

        match outcome {
            Ok(Ok(evaluation)) => {
                let result = RuleResult::from_evaluation(rule, evaluation);
                debug!(
                    rule = rule.id(),
                    resource = resource.name(),
                    applicable = result.is_applicable,
                    passed = result.passed,
                    "Rule evaluated"
                );
                result
            }
            Ok(Err(e)) => {
                warn!(rule = rule.id(), resource = resource.name(), "Rule failed: {:#}", e);
                RuleResult::evaluation_error(rule, format!("{:#}", e))
            }
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                warn!(rule = rule.id(), resource = resource.name(), "Rule panicked: {}", detail);
                RuleResult::evaluation_error(rule, format!("rule panicked: {}", detail))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, Evaluation, FnRule, Severity, TypedRule};
    use crate::runner::RuleRegistryBuilder;
    use anyhow::anyhow;

    struct Disk {
        encrypted: Option<bool>,
    }

    impl Resource for Disk {
        fn name(&self) -> &str {
            "disk-1"
        }
        fn resource_type(&self) -> &str {
            "Microsoft.Compute/disks"
        }
        fn location(&self) -> &str {
            "eastus"
        }
        fn id(&self) -> &str {
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/disks/disk-1"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Gateway;

    impl Resource for Gateway {
        fn name(&self) -> &str {
            "gw-1"
        }
        fn resource_type(&self) -> &str {
            "Microsoft.Network/applicationGateways"
        }
        fn location(&self) -> &str {
            "eastus"
        }
        fn id(&self) -> &str {
            "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/applicationGateways/gw-1"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn passing(id: &str) -> FnRule {
        FnRule::new(id, Category::Reliability, Severity::High, "always passes", |_, _| {
            Ok(Evaluation::pass())
        })
    }

    #[test]
    fn test_error_is_recorded_and_batch_continues() {
        let registry = RuleRegistryBuilder::new()
            .with_rule(FnRule::new(
                "err-001",
                Category::Security,
                Severity::High,
                "returns an error",
                |_, _| Err(anyhow!("missing properties")),
            ))
            .with_rule(passing("ok-001"))
            .build()
            .unwrap();

        let results =
            RuleEngine::new().evaluate_rules(&registry, &Gateway, &ScanContext::default());

        assert_eq!(results.len(), 2);
        assert!(!results[0].passed);
        assert!(results[0].is_applicable);
        assert!(results[0].evaluation_error);
        assert!(results[0].recommendation.contains("missing properties"));
        assert!(results[1].passed);
    }

    #[test]
    fn test_panicking_rule_is_isolated() {
        let registry = RuleRegistryBuilder::new()
            .with_rule(TypedRule::<Disk>::new(
                "disk-001",
                Category::Security,
                Severity::High,
                "Disk should be encrypted",
                |disk, _| {
                    let encrypted = disk.encrypted.expect("encryption settings missing");
                    Ok(Evaluation::from_broken(!encrypted, ""))
                },
            ))
            .with_rule(passing("ok-001"))
            .build()
            .unwrap();

        let results = RuleEngine::new().evaluate_rules(
            &registry,
            &Disk { encrypted: None },
            &ScanContext::default(),
        );

        assert_eq!(results.len(), 2);
        assert!(!results[0].passed);
        assert!(results[0].evaluation_error);
        assert!(results[0].recommendation.contains("encryption settings missing"));
        assert!(results[1].passed);
    }

    #[test]
    fn test_typed_rule_on_other_resource_is_vacuous_pass() {
        let registry = RuleRegistryBuilder::new()
            .with_rule(TypedRule::<Disk>::new(
                "disk-001",
                Category::Security,
                Severity::High,
                "Disk should be encrypted",
                |disk, _| Ok(Evaluation::from_broken(disk.encrypted != Some(true), "")),
            ))
            .build()
            .unwrap();

        let results =
            RuleEngine::new().evaluate_rules(&registry, &Gateway, &ScanContext::default());
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_applicable);
        assert!(results[0].passed);
        assert!(!results[0].evaluation_error);
    }

    #[test]
    fn test_cancelled_context_evaluates_nothing() {
        let registry = RuleRegistryBuilder::new()
            .with_rule(passing("a"))
            .with_rule(passing("b"))
            .build()
            .unwrap();
        let context = ScanContext::default();
        context.cancellation().cancel();

        let results = RuleEngine::new().evaluate_rules(&registry, &Gateway, &context);
        assert!(results.is_empty());
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
