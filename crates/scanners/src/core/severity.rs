use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];
}

/// Best-practice pillar a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reliability,
    Security,
    Cost,
    Performance,
    Operations,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reliability => write!(f, "Reliability"),
            Self::Security => write!(f, "Security"),
            Self::Cost => write!(f, "Cost"),
            Self::Performance => write!(f, "Performance"),
            Self::Operations => write!(f, "Operations"),
        }
    }
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Reliability,
        Category::Security,
        Category::Cost,
        Category::Performance,
        Category::Operations,
    ];
}
