use thiserror::Error;

pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Rule '{0}' is already registered")]
    DuplicateRule(String),

    #[error("Invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("Failed to list resources in resource group '{resource_group}': {message}")]
    Listing {
        resource_group: String,
        message: String,
    },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    pub fn listing(resource_group: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Listing {
            resource_group: resource_group.into(),
            message: message.to_string(),
        }
    }
}
