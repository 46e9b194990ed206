//! Virtual WAN scanner.

use crate::core::{
    Category, Evaluation, FnRule, Resource, ScanConfig, ScanContext, ScanResult, ServiceResult,
    Severity, TypedRule,
};
use crate::runner::{
    scan_resource_group, InMemoryPager, ResourcePager, RuleRegistry, RuleRegistryBuilder,
    ServiceScanner,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const VIRTUAL_WAN_TYPE: &str = "Microsoft.Network/virtualWans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualWanSku {
    Basic,
    Standard,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualWanProperties {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sku: Option<VirtualWanSku>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_branch_to_branch_traffic: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_vpn_encryption: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualWan {
    pub id: String,

    pub name: String,

    #[serde(rename = "type", default = "default_virtual_wan_type")]
    pub resource_type: String,

    pub location: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub properties: Option<VirtualWanProperties>,
}

fn default_virtual_wan_type() -> String {
    VIRTUAL_WAN_TYPE.to_string()
}

impl VirtualWan {
    pub fn sku(&self) -> Option<VirtualWanSku> {
        self.properties.as_ref().and_then(|p| p.sku)
    }
}

impl Resource for VirtualWan {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn tags(&self) -> Option<&BTreeMap<String, String>> {
        if self.tags.is_empty() {
            None
        } else {
            Some(&self.tags)
        }
    }
}

pub fn rules() -> ScanResult<RuleRegistry> {
    RuleRegistryBuilder::new()
        .with_rule(
            FnRule::new(
                "vwa-001",
                Category::Operations,
                Severity::Medium,
                "Virtual WAN should have diagnostic settings enabled",
                |resource, context| {
                    Ok(Evaluation::from_broken(
                        !context.has_diagnostic_settings(resource.id()),
                        "",
                    ))
                },
            )
            .with_learn_more_url(
                "https://learn.microsoft.com/azure/virtual-wan/monitor-virtual-wan",
            ),
        )
        .with_rule(
            TypedRule::<VirtualWan>::new(
                "vwa-002",
                Category::Reliability,
                Severity::High,
                "Virtual WAN should have availability zones enabled",
                // Hubs are deployed zone-redundant by the platform.
                |_, _| Ok(Evaluation::pass()),
            )
            .with_learn_more_url(
                "https://learn.microsoft.com/azure/reliability/reliability-virtual-wan",
            ),
        )
        .with_rule(
            TypedRule::<VirtualWan>::new(
                "vwa-003",
                Category::Reliability,
                Severity::High,
                "Virtual WAN should have a SLA",
                |_, _| Ok(Evaluation::pass_with("99.95%")),
            )
            .with_learn_more_url(
                "https://www.microsoft.com/licensing/docs/view/Service-Level-Agreements-SLA-for-Online-Services",
            ),
        )
        .with_rule(TypedRule::<VirtualWan>::new(
            "vwa-004",
            Category::Security,
            Severity::High,
            "Virtual WAN should have private endpoints enabled",
            |_, _| Ok(Evaluation::not_applicable()),
        ))
        .with_rule(
            TypedRule::<VirtualWan>::new(
                "vwa-005",
                Category::Reliability,
                Severity::High,
                "Virtual WAN SKU",
                |wan, _| match wan.sku() {
                    Some(VirtualWanSku::Standard) => Ok(Evaluation::pass_with("Standard")),
                    Some(VirtualWanSku::Basic) => Ok(Evaluation::fail(
                        "Basic: upgrade to Standard for SLA-backed hubs and full mesh routing",
                    )),
                    None => Ok(Evaluation::not_applicable()),
                },
            )
            .with_learn_more_url(
                "https://learn.microsoft.com/azure/virtual-wan/virtual-wan-about#basicstandard",
            ),
        )
        .with_rule(
            FnRule::new(
                "vwa-006",
                Category::Operations,
                Severity::Low,
                "Virtual WAN Name should comply with naming conventions",
                |resource, _| {
                    Ok(Evaluation::from_broken(
                        !resource.name().starts_with("vwa"),
                        "",
                    ))
                },
            )
            .with_learn_more_url(
                "https://learn.microsoft.com/azure/cloud-adoption-framework/ready/azure-best-practices/resource-abbreviations",
            ),
        )
        .with_rule(
            FnRule::new(
                "vwa-007",
                Category::Operations,
                Severity::Low,
                "Virtual WAN should have tags",
                |resource, _| Ok(Evaluation::from_broken(resource.tags().is_none(), "")),
            )
            .with_learn_more_url(
                "https://learn.microsoft.com/azure/azure-resource-manager/management/tag-resources",
            ),
        )
        .build()
}

pub struct VirtualWanScanner {
    rules: RuleRegistry,
    pager: Arc<dyn ResourcePager<VirtualWan>>,
}

impl VirtualWanScanner {
    pub fn new(pager: Arc<dyn ResourcePager<VirtualWan>>) -> ScanResult<Self> {
        Ok(Self {
            rules: rules()?,
            pager,
        })
    }
}

impl ServiceScanner for VirtualWanScanner {
    fn service_name(&self) -> &str {
        "Virtual WAN"
    }

    fn scan(&self, resource_group: &str, context: &ScanContext) -> ScanResult<Vec<ServiceResult>> {
        info!("Scanning {}s in Resource Group {}", self.service_name(), resource_group);
        scan_resource_group::<VirtualWan, _>(
            self.pager.as_ref(),
            &self.rules,
            resource_group,
            context,
        )
    }
}

/// Parses `{ "<resource group>": [ <virtual wan>, ... ] }`, paged by
/// `config.page_size`.
pub fn parse_inventory(raw: &str, config: &ScanConfig) -> ScanResult<InMemoryPager<VirtualWan>> {
    let groups: BTreeMap<String, Vec<VirtualWan>> = serde_json::from_str(raw)?;
    Ok(InMemoryPager::with_groups(groups, config.page_size))
}

pub fn load_inventory(
    path: impl AsRef<Path>,
    config: &ScanConfig,
) -> ScanResult<InMemoryPager<VirtualWan>> {
    let raw = std::fs::read_to_string(path)?;
    parse_inventory(&raw, config)
}
