//! Request/response types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::model::DiffItem;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Server status (always "ok" when healthy)
    pub status: String,
    /// Server version from Cargo.toml
    pub version: String,
}

impl HealthResponse {
    /// Create a healthy response with the current package version
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Request body for the release-notes stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Diff items to classify and narrate
    pub items: Vec<DiffItem>,

    /// Filter preset name; defaults to "conservative"
    #[serde(default)]
    pub policy: Option<String>,
}

impl GenerateRequest {
    /// Preset used when the request does not name one.
    pub const DEFAULT_POLICY: &'static str = "conservative";

    pub fn policy_name(&self) -> &str {
        self.policy.as_deref().unwrap_or(Self::DEFAULT_POLICY)
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code for programmatic handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    /// Create an error response with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
        }
    }

    /// Create an error response with a message and code
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: Some(code.into()),
        }
    }
}
