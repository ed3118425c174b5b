//! Relevance filtering for merged pull requests.
//!
//! Decides which diff items are substantive enough to warrant release notes.
//! Filtering is a pure function over a [`FilterPolicy`]; the same input and
//! policy always produce the same output. The meaningful-change counter is a
//! deliberately cheap line-local heuristic: no hunk or file parsing, just
//! added/removed lines minus the noise classes below.

use crate::model::DiffItem;

/// How strictly the meaningful-change counter treats version noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountingMode {
    /// Count every non-trivial added/removed line.
    Lenient,
    /// Additionally exclude version-number and dependency-manifest-key lines.
    Strict,
}

/// Policy against which items are classified.
///
/// Pattern and label matching is case-insensitive substring matching against
/// the item description. Not mutated after construction.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Minimum number of lines the raw diff must have
    pub min_diff_size: usize,
    /// Minimum number of meaningful changed lines
    pub min_code_changes: usize,
    /// Descriptions containing any of these are rejected outright
    pub exclude_patterns: Vec<String>,
    /// Labels that reject an item after the size checks pass
    pub exclude_labels: Vec<String>,
    /// When non-empty, the description must contain at least one of these
    pub include_labels: Vec<String>,
    /// Counter strictness used by this policy
    pub counting: CountingMode,
    /// Cap on the number of accepted items, in input order
    pub max_results: Option<usize>,
}

/// Number of items the conservative preset keeps per batch.
pub const CONSERVATIVE_MAX_RESULTS: usize = 5;

impl FilterPolicy {
    /// Conservative preset: strict counting, capped result set. The default
    /// for deployments where every accepted item costs two generation jobs.
    pub fn conservative() -> Self {
        Self {
            min_diff_size: 10,
            min_code_changes: 3,
            exclude_patterns: strings(&[
                "typo",
                "readme",
                "changelog",
                "merge branch",
                "revert",
                "bump version",
            ]),
            exclude_labels: strings(&["chore", "ci", "docs", "dependencies"]),
            include_labels: Vec::new(),
            counting: CountingMode::Strict,
            max_results: Some(CONSERVATIVE_MAX_RESULTS),
        }
    }

    /// Permissive preset: lenient counting, uncapped.
    pub fn permissive() -> Self {
        Self {
            min_diff_size: 3,
            min_code_changes: 1,
            exclude_patterns: strings(&["typo", "merge branch"]),
            exclude_labels: Vec::new(),
            include_labels: Vec::new(),
            counting: CountingMode::Lenient,
            max_results: None,
        }
    }

    /// Resolve a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "conservative" => Some(Self::conservative()),
            "permissive" => Some(Self::permissive()),
            _ => None,
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn contains_any(haystack_lower: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|n| haystack_lower.contains(&n.to_lowercase()))
}

/// Classify one item against a policy.
///
/// Rules run in a fixed order and short-circuit on the first failure:
/// exclude pattern, raw diff size, meaningful-change count, exclude label,
/// include label.
pub fn is_relevant(item: &DiffItem, policy: &FilterPolicy) -> bool {
    let description = item.description.to_lowercase();

    if contains_any(&description, &policy.exclude_patterns) {
        return false;
    }
    if item.diff.lines().count() < policy.min_diff_size {
        return false;
    }
    if count_meaningful_changes(&item.diff, policy.counting) < policy.min_code_changes {
        return false;
    }
    if contains_any(&description, &policy.exclude_labels) {
        return false;
    }
    if !policy.include_labels.is_empty() && !contains_any(&description, &policy.include_labels) {
        return false;
    }
    true
}

/// Filter a batch, preserving input order and applying the policy's cap.
pub fn filter_relevant(items: &[DiffItem], policy: &FilterPolicy) -> Vec<DiffItem> {
    let mut kept: Vec<DiffItem> = items
        .iter()
        .filter(|item| is_relevant(item, policy))
        .cloned()
        .collect();
    if let Some(cap) = policy.max_results {
        kept.truncate(cap);
    }
    kept
}

/// Markers that open a single-line or block comment in the languages we see.
const COMMENT_MARKERS: &[&str] = &["//", "/*", "*/", "*", "#", "--", "<!--"];

/// Count added/removed lines that carry an actual code change.
pub fn count_meaningful_changes(diff: &str, mode: CountingMode) -> usize {
    diff.lines()
        .filter(|line| is_meaningful_change(line, mode))
        .count()
}

fn is_meaningful_change(line: &str, mode: CountingMode) -> bool {
    // File headers look like changed lines but are not.
    if line.starts_with("+++") || line.starts_with("---") {
        return false;
    }
    let body = match line.strip_prefix('+').or_else(|| line.strip_prefix('-')) {
        Some(body) => body,
        None => return false,
    };

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return false;
    }
    if COMMENT_MARKERS.iter().any(|m| trimmed.starts_with(m)) {
        return false;
    }
    // A line whose non-whitespace content is just the sign is a pure
    // whitespace change.
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if compact == "+" || compact == "-" {
        return false;
    }
    if mode == CountingMode::Strict && is_version_noise(trimmed) {
        return false;
    }
    true
}

/// Version-bump / dependency-manifest heuristic (case-insensitive).
fn is_version_noise(line: &str) -> bool {
    let lower = line.to_lowercase();

    // `version = "1.2.3"`, `"version": "1.2.3"` and friends.
    let key = lower.trim_start_matches(['"', '\'']);
    if key.starts_with("version") && (lower.contains('=') || lower.contains(':')) {
        return true;
    }

    // Bare version tokens: 1.2.3, v0.4.0-rc.1, "2.0.1",
    lower
        .split(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | ',' | ';' | '(' | ')'))
        .filter(|token| !token.is_empty())
        .any(|token| looks_like_version(token.trim_start_matches(['v', '^', '~'])))
}

fn looks_like_version(token: &str) -> bool {
    let core = token.split(['-', '+']).next().unwrap_or(token);
    let parts: Vec<&str> = core.split('.').collect();
    parts.len() >= 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
