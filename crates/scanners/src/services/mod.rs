//! Per-service scanners
//!
//! Each service contributes a resource type, a rule table and a thin
//! [`ServiceScanner`](crate::runner::ServiceScanner) that hands both to the shared
//! pipeline.

pub mod vwan;

pub use vwan::{VirtualWan, VirtualWanScanner, VirtualWanSku};
