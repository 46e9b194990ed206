//! Rule evaluation and scan orchestration
//!
//! The registry holds a service's rules in evaluation order, the engine applies them
//! to one resource while isolating failing rules, the pipeline drives list →
//! evaluate → wrap for any resource type, and the aggregator folds service results
//! into a run-wide report.

pub mod aggregator;
pub mod engine;
pub mod pipeline;
pub mod registry;

pub use aggregator::{FailedScope, ScanAggregator, ScanReport, ScanSummary, SeverityCount};
pub use engine::RuleEngine;
pub use pipeline::{
    collect_pages, scan_all, scan_resource_group, InMemoryPager, Page, ResourcePager,
    ServiceScanner,
};
pub use registry::{RuleRegistry, RuleRegistryBuilder};
