//! Core abstractions shared by the engine and every service scanner
//!
//! Resources are seen through a narrow capability trait, rules are severity-tagged
//! predicates over those resources, and results are plain serialisable records. The
//! scan context carries the per-run configuration and cancellation signal and is
//! passed explicitly into every call, so parallel evaluation needs no globals.

pub mod context;
pub mod error;
pub mod resource;
pub mod result;
pub mod rule;
pub mod severity;

pub use context::{CancellationToken, ScanConfig, ScanContext};
pub use error::{ScanError, ScanResult};
pub use resource::{Resource, ResourceId};
pub use result::{RuleResult, ServiceResult};
pub use rule::{Evaluation, FnRule, Rule, RuleMetadata, TypedRule};
pub use severity::{Category, Severity};
