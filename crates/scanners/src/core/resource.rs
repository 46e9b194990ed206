//! Resource capabilities shared by every scanned service type.
//!
//! Rules are written against the [`Resource`] trait. Service-specific rules reach
//! the concrete type through [`Resource::as_any`] and treat a failed downcast as
//! "not applicable".

use crate::core::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;

pub trait Resource: Send + Sync {
    fn name(&self) -> &str;

    fn resource_type(&self) -> &str;

    fn location(&self) -> &str;

    fn id(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn tags(&self) -> Option<&BTreeMap<String, String>> {
        None
    }

    fn parsed_id(&self) -> ScanResult<ResourceId> {
        ResourceId::parse(self.id())
    }
}

/// Parsed ARM resource id:
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider_namespace: String,
    pub resource_type: String,
    pub name: String,
}

impl ResourceId {
    pub fn parse(id: &str) -> ScanResult<Self> {
        let invalid = |reason: &str| ScanError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = id.trim_matches('/').split('/').collect();
        if segments.len() < 8 {
            return Err(invalid("expected at least 8 path segments"));
        }

        if !segments[0].eq_ignore_ascii_case("subscriptions") {
            return Err(invalid("missing 'subscriptions' segment"));
        }
        if !segments[2].eq_ignore_ascii_case("resourcegroups") {
            return Err(invalid("missing 'resourceGroups' segment"));
        }
        if !segments[4].eq_ignore_ascii_case("providers") {
            return Err(invalid("missing 'providers' segment"));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty path segment"));
        }

        // Child resources alternate type/name pairs after the namespace.
        let type_segments: Vec<&str> = segments[6..].iter().step_by(2).copied().collect();
        let name = segments[segments.len() - 1];
        if (segments.len() - 6) % 2 != 0 {
            return Err(invalid("resource type without a name"));
        }

        Ok(Self {
            subscription_id: segments[1].to_string(),
            resource_group: segments[3].to_string(),
            provider_namespace: segments[5].to_string(),
            resource_type: format!("{}/{}", segments[5], type_segments.join("/")),
            name: name.to_string(),
        })
    }
}
