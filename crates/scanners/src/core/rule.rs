//! Rule trait and the building blocks scanners declare their checks with.
//!
//! ## Applicability before verdict
//!
//! Every rule first decides whether it applies to the resource in front of it and
//! only then whether the resource passes. A rule inspecting a property the resource
//! variant does not have answers [`Evaluation::not_applicable`] instead of failing
//! or panicking on the missing field. The engine keeps that two-level outcome
//! intact all the way to the report, so "not applicable" never shows up as "passed"
//! in compliance statistics, nor as a failure.
//!
//! ## Declaring rules
//!
//! - [`FnRule`] wraps a closure over the [`Resource`] capabilities and suits checks
//!   that only need name, type, location, id or tags.
//! - [`TypedRule`] wraps a closure over one concrete resource type and reports
//!   "not applicable" for every other type.
//! - [`impl_rule!`](crate::impl_rule) implements [`Rule`] for a unit struct with an
//!   `evaluate_impl` method.

use crate::core::{Category, Resource, ScanContext, Severity};
use anyhow::Result;
use std::marker::PhantomData;

/// Outcome reported by a single rule for a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub applicable: bool,
    pub passed: bool,
    pub recommendation: String,
}

impl Evaluation {
    pub fn pass() -> Self {
        Self {
            applicable: true,
            passed: true,
            recommendation: String::new(),
        }
    }

    pub fn pass_with(note: impl Into<String>) -> Self {
        Self {
            recommendation: note.into(),
            ..Self::pass()
        }
    }

    pub fn fail(recommendation: impl Into<String>) -> Self {
        Self {
            applicable: true,
            passed: false,
            recommendation: recommendation.into(),
        }
    }

    pub fn not_applicable() -> Self {
        Self {
            applicable: false,
            passed: true,
            recommendation: String::new(),
        }
    }

    /// Builds an outcome from a "broken" flag, the way most checks read.
    pub fn from_broken(broken: bool, note: impl Into<String>) -> Self {
        Self {
            applicable: true,
            passed: !broken,
            recommendation: note.into(),
        }
    }

    /// Applicability wins: an inapplicable outcome is always a vacuous pass.
    pub fn normalized(mut self) -> Self {
        if !self.applicable {
            self.passed = true;
        }
        self
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;

    fn category(&self) -> Category;

    fn severity(&self) -> Severity;

    fn description(&self) -> &str {
        "No description provided"
    }

    fn learn_more_url(&self) -> Option<&str> {
        None
    }

    fn evaluate(&self, resource: &dyn Resource, context: &ScanContext) -> Result<Evaluation>;
}

#[derive(Debug, Clone)]
pub struct RuleMetadata {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub description: String,
    pub learn_more_url: Option<String>,
}

impl RuleMetadata {
    pub fn new(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            description: description.into(),
            learn_more_url: None,
        }
    }
}

type EvalFn = Box<dyn Fn(&dyn Resource, &ScanContext) -> Result<Evaluation> + Send + Sync>;

pub struct FnRule {
    metadata: RuleMetadata,
    eval: EvalFn,
}

impl FnRule {
    pub fn new<F>(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        description: impl Into<String>,
        eval: F,
    ) -> Self
    where
        F: Fn(&dyn Resource, &ScanContext) -> Result<Evaluation> + Send + Sync + 'static,
    {
        Self {
            metadata: RuleMetadata::new(id, category, severity, description),
            eval: Box::new(eval),
        }
    }

    pub fn with_learn_more_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.learn_more_url = Some(url.into());
        self
    }
}

impl Rule for FnRule {
    fn id(&self) -> &str {
        &self.metadata.id
    }

    fn category(&self) -> Category {
        self.metadata.category
    }

    fn severity(&self) -> Severity {
        self.metadata.severity
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn learn_more_url(&self) -> Option<&str> {
        self.metadata.learn_more_url.as_deref()
    }

    fn evaluate(&self, resource: &dyn Resource, context: &ScanContext) -> Result<Evaluation> {
        (self.eval)(resource, context)
    }
}

type TypedEvalFn<R> = Box<dyn Fn(&R, &ScanContext) -> Result<Evaluation> + Send + Sync>;

pub struct TypedRule<R> {
    metadata: RuleMetadata,
    eval: TypedEvalFn<R>,
    _resource: PhantomData<fn(&R)>,
}

impl<R: 'static> TypedRule<R> {
    pub fn new<F>(
        id: impl Into<String>,
        category: Category,
        severity: Severity,
        description: impl Into<String>,
        eval: F,
    ) -> Self
    where
        F: Fn(&R, &ScanContext) -> Result<Evaluation> + Send + Sync + 'static,
    {
        Self {
            metadata: RuleMetadata::new(id, category, severity, description),
            eval: Box::new(eval),
            _resource: PhantomData,
        }
    }

    pub fn with_learn_more_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.learn_more_url = Some(url.into());
        self
    }
}

impl<R: 'static> Rule for TypedRule<R> {
    fn id(&self) -> &str {
        &self.metadata.id
    }

    fn category(&self) -> Category {
        self.metadata.category
    }

    fn severity(&self) -> Severity {
        self.metadata.severity
    }

    fn description(&self) -> &str {
        &self.metadata.description
    }

    fn learn_more_url(&self) -> Option<&str> {
        self.metadata.learn_more_url.as_deref()
    }

    fn evaluate(&self, resource: &dyn Resource, context: &ScanContext) -> Result<Evaluation> {
        match resource.as_any().downcast_ref::<R>() {
            Some(typed) => (self.eval)(typed, context),
            None => Ok(Evaluation::not_applicable()),
        }
    }
}

#[macro_export]
macro_rules! impl_rule {
    (
        $rule:ty,
        id: $id:expr,
        category: $category:expr,
        severity: $severity:expr
        $(, description: $description:expr)?
    ) => {
        impl $crate::core::Rule for $rule {
            fn id(&self) -> &str {
                $id
            }

            fn category(&self) -> $crate::core::Category {
                $category
            }

            fn severity(&self) -> $crate::core::Severity {
                $severity
            }

            $(
                fn description(&self) -> &str {
                    $description
                }
            )?

            fn evaluate(
                &self,
                resource: &dyn $crate::core::Resource,
                context: &$crate::core::ScanContext,
            ) -> anyhow::Result<$crate::core::Evaluation> {
                self.evaluate_impl(resource, context)
            }
        }
    };
}
