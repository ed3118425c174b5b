//! Prompt construction for the two note channels.

use crate::model::DiffItem;

/// Fixed sentence the marketing channel falls back to when a change has no
/// user-visible effect.
pub const NO_USER_FACING_CHANGES: &str = "This release contains no user-facing changes.";

/// System prompt for the developer-facing note.
pub const DEVELOPER_SYSTEM: &str = r#"You write release notes for developers.

Given a pull request description and its diff, summarize what changed and why
it matters to someone working on or integrating with this codebase.

Rules:
- Ignore comment-only edits, formatting, and other trivial changes.
- Cite the concrete mechanism: name the function, type, or subsystem that
  changed and the rationale for the change.
- One sentence, at most 2-3 lines. No headings, no bullet points."#;

/// System prompt for the end-user-facing note.
pub const MARKETING_SYSTEM: &str = r#"You write release notes for end users.

Given a pull request description and its diff, describe only the user-visible
benefit of the change.

Rules:
- No internal or technical detail: no function names, no file paths, no
  implementation terms.
- One short sentence focused on what the user gains.
- If nothing user-visible changed, answer exactly:
  "This release contains no user-facing changes.""#;

/// Diffs beyond this length are truncated before prompting; the head of a
/// diff carries the interesting hunks often enough for a one-sentence note.
const MAX_DIFF_CHARS: usize = 6000;

/// Format the user prompt for the developer channel.
pub fn developer_prompt(item: &DiffItem) -> String {
    format!(
        "## Pull request\n{}\n\n## Diff\n```diff\n{}\n```\n\nWrite the developer release note.",
        item.description,
        truncate(&item.diff, MAX_DIFF_CHARS)
    )
}

/// Format the user prompt for the marketing channel.
pub fn marketing_prompt(item: &DiffItem) -> String {
    format!(
        "## Pull request\n{}\n\n## Diff\n```diff\n{}\n```\n\nWrite the end-user release note.",
        item.description,
        truncate(&item.diff, MAX_DIFF_CHARS)
    )
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut result: String = s.chars().take(max_len.saturating_sub(1)).collect();
        result.push('…');
        result
    }
}
