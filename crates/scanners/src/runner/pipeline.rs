//! List → evaluate → wrap, written once for every service type.
//!
//! A service scanner only supplies a [`ResourcePager`] for its resource type and
//! the registry of rules for it; [`scan_resource_group`] does the rest.

use crate::core::{Resource, RuleResult, ScanContext, ScanError, ScanResult, ServiceResult};
use crate::runner::{RuleEngine, RuleRegistry, ScanAggregator};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub continuation: Option<String>,
}

impl<R> Page<R> {
    pub fn last(items: Vec<R>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }
}

/// Paged listing of one resource type in a resource group.
pub trait ResourcePager<R>: Send + Sync {
    fn next_page(
        &self,
        resource_group: &str,
        continuation: Option<&str>,
        context: &ScanContext,
    ) -> ScanResult<Page<R>>;
}

/// Drains every page; the first failing page aborts the listing.
pub fn collect_pages<R, P>(
    pager: &P,
    resource_group: &str,
    context: &ScanContext,
) -> ScanResult<Vec<R>>
where
    P: ResourcePager<R> + ?Sized,
{
    let mut items = Vec::new();
    let mut continuation: Option<String> = None;

    loop {
        if context.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let page = pager.next_page(resource_group, continuation.as_deref(), context)?;
        debug!(
            resource_group,
            items = page.items.len(),
            more = page.continuation.is_some(),
            "Fetched page"
        );
        items.extend(page.items);

        match page.continuation {
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    Ok(items)
}

/// Lists a resource group and evaluates every listed resource.
///
/// Cancellation stops evaluation of the remaining resources and yields
/// [`ScanError::Cancelled`] instead of a partial result set.
pub fn scan_resource_group<R, P>(
    pager: &P,
    registry: &RuleRegistry,
    resource_group: &str,
    context: &ScanContext,
) -> ScanResult<Vec<ServiceResult>>
where
    R: Resource,
    P: ResourcePager<R> + ?Sized,
{
    let resources = collect_pages::<R, P>(pager, resource_group, context)?;
    let config = context.config();
    let rules = registry.filtered(config);
    let engine = RuleEngine::new();

    let selected: Vec<&R> = resources
        .iter()
        .filter(|r| !config.is_resource_excluded(r.id()))
        .collect();

    info!(
        resource_group,
        listed = resources.len(),
        scanned = selected.len(),
        rules = rules.len(),
        "Evaluating resources"
    );

    let wrap = |resource: &&R| {
        if context.is_cancelled() {
            return None;
        }
        let outcomes = engine.evaluate_rules(&rules, *resource, context);
        Some(attribute(*resource, resource_group, context, outcomes))
    };

    let results: Vec<ServiceResult> = if config.parallel_execution {
        selected.par_iter().filter_map(wrap).collect()
    } else {
        selected.iter().filter_map(wrap).collect()
    };

    if context.is_cancelled() {
        warn!(
            resource_group,
            evaluated = results.len(),
            scanned = selected.len(),
            "Scan cancelled, discarding partial results"
        );
        return Err(ScanError::Cancelled);
    }

    Ok(results)
}

/// Subscription and resource group come from the ARM id; resources with an
/// unparseable id fall back to the scanned scope.
fn attribute<R: Resource>(
    resource: &R,
    resource_group: &str,
    context: &ScanContext,
    outcomes: Vec<RuleResult>,
) -> ServiceResult {
    match resource.parsed_id() {
        Ok(id) => ServiceResult::new(id.subscription_id, id.resource_group, resource, outcomes),
        Err(err) => {
            warn!(resource = resource.name(), error = %err, "Attributing to scanned scope");
            ServiceResult::new(context.subscription_id(), resource_group, resource, outcomes)
        }
    }
}

/// Per-service adapter: a display name plus the scan of one resource group.
pub trait ServiceScanner: Send + Sync {
    fn service_name(&self) -> &str;

    fn scan(&self, resource_group: &str, context: &ScanContext) -> ScanResult<Vec<ServiceResult>>;
}

/// Runs every scanner over every resource group into `aggregator`.
///
/// A failed listing is recorded against its scanner and resource group and the run
/// moves on. Cancellation ends the run.
pub fn scan_all(
    scanners: &[&dyn ServiceScanner],
    resource_groups: &[&str],
    context: &ScanContext,
    aggregator: &ScanAggregator,
) -> ScanResult<()> {
    for scanner in scanners {
        let service = scanner.service_name();
        for &resource_group in resource_groups {
            match scanner.scan(resource_group, context) {
                Ok(results) => {
                    debug!(service, resource_group, results = results.len(), "Scope scanned");
                    aggregator.extend(results);
                }
                Err(ScanError::Cancelled) => return Err(ScanError::Cancelled),
                Err(err) => {
                    warn!(service, resource_group, error = %err, "Scope failed");
                    aggregator.record_failure(service, resource_group, &err);
                }
            }
        }
    }

    Ok(())
}

/// Pager over resources held in memory, keyed by resource group.
#[derive(Debug, Clone)]
pub struct InMemoryPager<R> {
    groups: BTreeMap<String, Vec<R>>,
    page_size: usize,
}

impl<R: Clone + Send + Sync> InMemoryPager<R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            groups: BTreeMap::new(),
            page_size: page_size.max(1),
        }
    }

    /// Group names that differ only in case are merged, in key order.
    pub fn with_groups(groups: BTreeMap<String, Vec<R>>, page_size: usize) -> Self {
        let mut pager = Self::new(page_size);
        for (resource_group, items) in groups {
            pager
                .groups
                .entry(resource_group.to_ascii_lowercase())
                .or_default()
                .extend(items);
        }
        pager
    }

    pub fn insert(&mut self, resource_group: &str, resource: R) {
        self.groups
            .entry(resource_group.to_ascii_lowercase())
            .or_default()
            .push(resource);
    }

    pub fn resource_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

impl<R: Clone + Send + Sync> ResourcePager<R> for InMemoryPager<R> {
    fn next_page(
        &self,
        resource_group: &str,
        continuation: Option<&str>,
        _context: &ScanContext,
    ) -> ScanResult<Page<R>> {
        let items = match self.groups.get(&resource_group.to_ascii_lowercase()) {
            Some(items) => items,
            None => return Ok(Page::last(Vec::new())),
        };

        let offset = match continuation {
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|&offset| offset <= items.len())
                .ok_or_else(|| {
                    ScanError::listing(
                        resource_group,
                        format!("invalid continuation token '{}'", token),
                    )
                })?,
            None => 0,
        };

        let end = offset.saturating_add(self.page_size).min(items.len());
        let page_items = items[offset..end].to_vec();
        let continuation = (end < items.len()).then(|| end.to_string());

        Ok(Page {
            items: page_items,
            continuation,
        })
    }
}
