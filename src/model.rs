//! Core data types shared across the engine.
//!
//! These mirror the JSON shapes used on the wire; field renames exist only
//! where the wire name differs from idiomatic Rust naming.

use serde::{Deserialize, Serialize};

/// One unit of proposed change: a merged pull request with its description,
/// unified-diff body, and reference URL.
///
/// Owned by the caller and never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffItem {
    /// Consumer-supplied unique identifier (typically the PR number)
    pub id: String,
    /// Title/description of the change
    pub description: String,
    /// Unified-diff text
    pub diff: String,
    /// Reference URL, e.g. `https://github.com/owner/repo/pull/42`
    pub url: String,
}

/// The two independent note kinds tracked per diff item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Developer,
    Marketing,
}

impl Channel {
    /// Wire/display name for this channel.
    pub fn name(&self) -> &'static str {
        match self {
            Channel::Developer => "developer",
            Channel::Marketing => "marketing",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Enrichment payload attached to an item: related issues and top
/// contributors. Produced by an external collaborator and passed through
/// unmodified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolsInfo {
    /// Issue URLs referenced by the change (at most 3)
    #[serde(default)]
    pub related_issues: Vec<String>,
    /// Top contributors of the repository (at most 3, by contributions desc)
    #[serde(default)]
    pub contributors: Vec<Contributor>,
}

impl ToolsInfo {
    pub fn is_empty(&self) -> bool {
        self.related_issues.is_empty() && self.contributors.is_empty()
    }
}

/// One contributor entry inside [`ToolsInfo`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contributor {
    pub name: String,
    pub avatar: String,
    pub contributions: u64,
}
