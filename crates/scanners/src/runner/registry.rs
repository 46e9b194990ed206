use crate::core::{Category, Rule, ScanConfig, ScanError, ScanResult, Severity};
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered, id-keyed set of rules for one resource type.
///
/// Insertion order is evaluation order.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> ScanResult<()> {
        self.register_arc(Arc::new(rule))
    }

    pub fn register_arc(&mut self, rule: Arc<dyn Rule>) -> ScanResult<()> {
        let id = rule.id().to_string();
        if self.index.contains_key(&id) {
            return Err(ScanError::DuplicateRule(id));
        }
        self.index.insert(id, self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.index.get(id).map(|&pos| self.rules[pos].clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        self.rules.iter()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.id().to_string()).collect()
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.severity() == severity)
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect()
    }

    /// Narrows the registry to the rules the run has enabled, keeping order.
    pub fn filtered(&self, config: &ScanConfig) -> RuleRegistry {
        let mut filtered = RuleRegistry::new();
        for rule in &self.rules {
            if config.is_rule_enabled(rule.as_ref()) {
                filtered.index.insert(rule.id().to_string(), filtered.rules.len());
                filtered.rules.push(rule.clone());
            }
        }
        filtered
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.list_ids())
            .finish()
    }
}

#[derive(Default)]
pub struct RuleRegistryBuilder {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn with_arc_rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Fails on the first duplicated rule id.
    pub fn build(self) -> ScanResult<RuleRegistry> {
        let mut registry = RuleRegistry::new();
        for rule in self.rules {
            registry.register_arc(rule)?;
        }
        Ok(registry)
    }
}
