//! azreview scanners - best-practice rule engine for Azure resources
//!
//! Every service scanner lists the resources of one type in a resource group,
//! evaluates its rule table against each of them through the shared
//! [`RuleEngine`], and wraps the outcomes into uniform [`ServiceResult`] records
//! that a [`ScanAggregator`] folds into a run-wide [`ScanReport`].

pub mod core;
pub mod runner;
pub mod services;

pub use crate::core::{
    CancellationToken, Category, Evaluation, FnRule, Resource, ResourceId, Rule, RuleResult,
    ScanConfig, ScanContext, ScanError, ScanResult, ServiceResult, Severity, TypedRule,
};

pub use crate::runner::{
    scan_all, scan_resource_group, FailedScope, InMemoryPager, Page, ResourcePager, RuleEngine,
    RuleRegistry, RuleRegistryBuilder, ScanAggregator, ScanReport, ScanSummary, ServiceScanner,
};

pub use crate::services::{VirtualWan, VirtualWanScanner, VirtualWanSku};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
