//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{app_state::Permission, PageSnapshot};

/// Response to page creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPageResponse {
    pub edit_link: String,
}

/// A page as returned by a fetch, with the capability of the link used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub page: PageSnapshot,
    pub permissions: Permission,
}

/// Body of timer creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTimer {
    pub duration: f64,
}

/// Body of page settings modification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    pub name: String,
    pub color: String,
}

/// Query of timer rename
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameQuery {
    pub name: String,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: String) -> Self {
        Self { detail }
    }
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
    pub pages: usize,
    pub subscribed_pages: usize,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok(uptime: String, pages: usize, subscribed_pages: usize) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
            pages,
            subscribed_pages,
        }
    }
}
