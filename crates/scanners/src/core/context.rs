use crate::core::error::{ScanError, ScanResult};
use crate::core::{Rule, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub subscription_id: String,
    pub enabled_severities: BTreeSet<Severity>,
    pub excluded_rules: BTreeSet<String>,
    pub excluded_resources: BTreeSet<String>,
    pub parallel_execution: bool,
    pub page_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subscription_id: String::new(),
            enabled_severities: Severity::ALL.into_iter().collect(),
            excluded_rules: BTreeSet::new(),
            excluded_resources: BTreeSet::new(),
            parallel_execution: true,
            page_size: 100,
        }
    }
}

impl ScanConfig {
    pub fn for_subscription(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> ScanResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.page_size == 0 {
            return Err(ScanError::Config("page_size must be greater than zero".into()));
        }
        if self.enabled_severities.is_empty() {
            return Err(ScanError::Config(
                "at least one severity must be enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn is_rule_enabled(&self, rule: &dyn Rule) -> bool {
        self.enabled_severities.contains(&rule.severity())
            && !self.excluded_rules.contains(rule.id())
    }

    /// Resource ids are compared case-insensitively, as ARM treats them.
    pub fn is_resource_excluded(&self, resource_id: &str) -> bool {
        self.excluded_resources
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(resource_id))
    }
}

/// Cooperative cancellation flag shared by every worker of a scan run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct ScanContext {
    config: ScanConfig,
    diagnostic_settings: HashSet<String>,
    cancellation: CancellationToken,
}

impl ScanContext {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            diagnostic_settings: HashSet::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Ids of resources that have at least one diagnostic setting configured.
    pub fn with_diagnostic_settings<I, S>(mut self, resource_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.diagnostic_settings = resource_ids
            .into_iter()
            .map(|id| id.as_ref().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn subscription_id(&self) -> &str {
        &self.config.subscription_id
    }

    pub fn has_diagnostic_settings(&self, resource_id: &str) -> bool {
        self.diagnostic_settings
            .contains(&resource_id.to_ascii_lowercase())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_enables_everything() {
        let config = ScanConfig::default();
        assert_eq!(config.enabled_severities.len(), 3);
        assert!(config.excluded_rules.is_empty());
        assert!(config.parallel_execution);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = ScanConfig::from_json_str(
            r#"{ "subscription_id": "sub-1", "enabled_severities": ["high"], "excluded_rules": ["vwa-006"] }"#,
        )
        .unwrap();

        assert_eq!(config.subscription_id, "sub-1");
        assert!(config.enabled_severities.contains(&Severity::High));
        assert!(!config.enabled_severities.contains(&Severity::Low));
        assert!(config.excluded_rules.contains("vwa-006"));
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_config_rejects_zero_page_size() {
        let err = ScanConfig::from_json_str(r#"{ "page_size": 0 }"#).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_resource_exclusion_ignores_case() {
        let mut config = ScanConfig::default();
        config
            .excluded_resources
            .insert("/subscriptions/S/resourceGroups/RG/providers/Microsoft.Network/virtualWans/W".into());
        assert!(config.is_resource_excluded(
            "/subscriptions/s/resourcegroups/rg/providers/microsoft.network/virtualwans/w"
        ));
    }

    #[test]
    fn test_cancellation_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let context = ScanContext::default().with_cancellation(token.clone());
        assert!(!context.is_cancelled());

        token.cancel();
        assert!(context.is_cancelled());
    }

    #[test]
    fn test_diagnostic_settings_lookup() {
        let context = ScanContext::default().with_diagnostic_settings(["/Subscriptions/S/x"]);
        assert!(context.has_diagnostic_settings("/subscriptions/s/X"));
        assert!(!context.has_diagnostic_settings("/subscriptions/s/y"));
    }
}
