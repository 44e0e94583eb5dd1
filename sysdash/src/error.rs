use thiserror::Error;

use crate::types::Category;

/// Failures the dashboard pipeline can observe.
///
/// None of these are fatal: per-category failures are swallowed at the fetch
/// boundary, persistence failures fall back to defaults, and action failures
/// are surfaced as a notice.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{category} request failed: {reason}")]
    Network { category: Category, reason: String },
    #[error("{category} response has unexpected shape: {source}")]
    Parse {
        category: Category,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored settings unusable: {0}")]
    Persistence(String),
    #[error("settings storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("resolving alert {id} failed: {reason}")]
    Action { id: i64, reason: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
