//! Settings schema definitions.
//!
//! All settings structs use `#[serde(default)]` to allow partial
//! configuration files. Missing fields are filled with defaults.

use serde::{Deserialize, Serialize};

/// Root settings structure.
///
/// Loaded from `~/.relnotes/settings.toml` with environment variable
/// interpolation support. Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelnotesSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Generation provider configuration
    pub generation: GenerationSettings,

    /// HTTP server configuration
    pub server: ServerSettings,

    /// Relevance filter configuration
    pub filter: FilterSettings,

    /// GitHub enrichment configuration
    pub github: GithubSettings,
}

impl Default for RelnotesSettings {
    fn default() -> Self {
        Self {
            version: 1,
            generation: GenerationSettings::default(),
            server: ServerSettings::default(),
            filter: FilterSettings::default(),
            github: GithubSettings::default(),
        }
    }
}

/// Generation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model used for both note channels
    pub model: String,

    /// Maximum tokens per note
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// API key; supports `$VAR` interpolation
    pub api_key: Option<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_string(),
            max_tokens: 512,
            temperature: Some(0.3),
            api_key: None,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Port for `--serve`
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8787 }
    }
}

/// Relevance filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Default preset: "conservative" | "permissive"
    pub default_policy: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            default_policy: "conservative".to_string(),
        }
    }
}

/// GitHub enrichment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    /// Token for the contributors lookup; supports `$VAR` interpolation
    pub token: Option<String>,
}
