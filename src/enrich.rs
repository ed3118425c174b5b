//! Enrichment of accepted items with related issues and contributors.
//!
//! Enrichment is decorative: failures at this boundary are swallowed, logged,
//! and degrade to an empty [`ToolsInfo`]. They must never abort a note
//! stream.

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{Contributor, DiffItem, ToolsInfo};

/// At most this many related issues are attached per item.
const MAX_RELATED_ISSUES: usize = 3;

/// At most this many contributors are attached per item.
const MAX_CONTRIBUTORS: usize = 3;

/// A capability that attaches enrichment to an item.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Returns an empty `ToolsInfo` when enrichment is unavailable.
    async fn enrich(&self, item: &DiffItem) -> ToolsInfo;
}

/// Enricher that always returns an empty record.
pub struct NoopEnricher;

#[async_trait]
impl Enricher for NoopEnricher {
    async fn enrich(&self, _item: &DiffItem) -> ToolsInfo {
        ToolsInfo::default()
    }
}

/// Repository coordinates derived from an item's reference URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RepoCoords {
    owner: String,
    repo: String,
    pr_number: u64,
}

/// Enricher backed by the GitHub REST API.
pub struct GithubEnricher {
    client: reqwest::Client,
    token: Option<String>,
    api_base: String,
}

impl GithubEnricher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: "https://api.github.com".to_string(),
        }
    }

    /// Variant with a custom API base, for tests.
    pub fn with_api_base(token: Option<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            api_base: api_base.into(),
        }
    }

    /// Parse `https://github.com/{owner}/{repo}/pull/{n}`.
    fn repo_coordinates(url: &str) -> Option<RepoCoords> {
        let rest = url
            .strip_prefix("https://github.com/")
            .or_else(|| url.strip_prefix("http://github.com/"))?;
        let mut parts = rest.split('/');
        let owner = parts.next().filter(|s| !s.is_empty())?.to_string();
        let repo = parts.next().filter(|s| !s.is_empty())?.to_string();
        if parts.next()? != "pull" {
            return None;
        }
        let pr_number = parts.next()?.parse().ok()?;
        Some(RepoCoords {
            owner,
            repo,
            pr_number,
        })
    }

    /// Collect `#123`-style issue references from the description, in order,
    /// deduplicated and capped.
    fn related_issues(description: &str, coords: &RepoCoords) -> Vec<String> {
        let mut urls = Vec::new();
        let tokens = description.split(|c: char| {
            c.is_whitespace() || matches!(c, '(' | ')' | ',' | '.' | ';' | ':' | '[' | ']')
        });
        for token in tokens {
            let number = match token.strip_prefix('#') {
                Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                    digits
                }
                _ => continue,
            };
            let url = format!(
                "https://github.com/{}/{}/issues/{number}",
                coords.owner, coords.repo
            );
            if !urls.contains(&url) {
                urls.push(url);
            }
            if urls.len() == MAX_RELATED_ISSUES {
                break;
            }
        }
        urls
    }

    async fn top_contributors(&self, coords: &RepoCoords) -> anyhow::Result<Vec<Contributor>> {
        let url = format!(
            "{}/repos/{}/{}/contributors?per_page={MAX_CONTRIBUTORS}",
            self.api_base, coords.owner, coords.repo
        );
        let mut request = self
            .client
            .get(&url)
            .header("user-agent", "relnotes")
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let entries: Vec<ApiContributor> = response.json().await?;

        let mut contributors: Vec<Contributor> = entries
            .into_iter()
            .map(|c| Contributor {
                name: c.login,
                avatar: c.avatar_url,
                contributions: c.contributions,
            })
            .collect();
        contributors.sort_by(|a, b| b.contributions.cmp(&a.contributions));
        contributors.truncate(MAX_CONTRIBUTORS);
        Ok(contributors)
    }
}

#[derive(Debug, Deserialize)]
struct ApiContributor {
    login: String,
    avatar_url: String,
    contributions: u64,
}

#[async_trait]
impl Enricher for GithubEnricher {
    async fn enrich(&self, item: &DiffItem) -> ToolsInfo {
        let coords = match Self::repo_coordinates(&item.url) {
            Some(coords) => coords,
            None => {
                tracing::debug!("[enrich] No repository coordinates in '{}'", item.url);
                return ToolsInfo::default();
            }
        };
        tracing::debug!(
            "[enrich] {}/{} PR #{}",
            coords.owner,
            coords.repo,
            coords.pr_number
        );

        let related_issues = Self::related_issues(&item.description, &coords);
        let contributors = match self.top_contributors(&coords).await {
            Ok(contributors) => contributors,
            Err(err) => {
                tracing::debug!("[enrich] Contributor lookup failed: {}", err);
                Vec::new()
            }
        };

        ToolsInfo {
            related_issues,
            contributors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords() -> RepoCoords {
        RepoCoords {
            owner: "acme".to_string(),
            repo: "widget".to_string(),
            pr_number: 42,
        }
    }

    #[test]
    fn parses_pull_request_urls() {
        let parsed =
            GithubEnricher::repo_coordinates("https://github.com/acme/widget/pull/42").unwrap();
        assert_eq!(parsed, coords());
    }

    #[test]
    fn rejects_non_pull_urls() {
        assert!(GithubEnricher::repo_coordinates("https://github.com/acme/widget").is_none());
        assert!(
            GithubEnricher::repo_coordinates("https://github.com/acme/widget/issues/42").is_none()
        );
        assert!(GithubEnricher::repo_coordinates("https://gitlab.com/acme/widget/pull/42").is_none());
        assert!(GithubEnricher::repo_coordinates("not a url").is_none());
    }

    #[test]
    fn extracts_issue_references_in_order() {
        let issues =
            GithubEnricher::related_issues("Fixes #12 and closes #9 (see #12).", &coords());
        assert_eq!(
            issues,
            vec![
                "https://github.com/acme/widget/issues/12".to_string(),
                "https://github.com/acme/widget/issues/9".to_string(),
            ]
        );
    }

    #[test]
    fn issue_references_are_capped() {
        let issues =
            GithubEnricher::related_issues("#1 #2 #3 #4 #5", &coords());
        assert_eq!(issues.len(), MAX_RELATED_ISSUES);
    }

    #[test]
    fn non_numeric_hash_tokens_are_ignored() {
        let issues = GithubEnricher::related_issues("#hashtag and #12abc", &coords());
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn noop_enricher_returns_empty() {
        let item = DiffItem {
            id: "1".to_string(),
            description: "Fixes #9".to_string(),
            diff: String::new(),
            url: "https://github.com/acme/widget/pull/1".to_string(),
        };
        assert!(NoopEnricher.enrich(&item).await.is_empty());
    }

    #[tokio::test]
    async fn bad_url_degrades_to_empty_tools() {
        let enricher = GithubEnricher::new(None);
        let item = DiffItem {
            id: "1".to_string(),
            description: "Fixes #9".to_string(),
            diff: String::new(),
            url: "nowhere".to_string(),
        };
        assert!(enricher.enrich(&item).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_api_degrades_to_issue_refs_only() {
        let enricher =
            GithubEnricher::with_api_base(None, "http://127.0.0.1:1/unreachable");
        let item = DiffItem {
            id: "1".to_string(),
            description: "Fixes #9".to_string(),
            diff: String::new(),
            url: "https://github.com/acme/widget/pull/1".to_string(),
        };
        let tools = enricher.enrich(&item).await;
        assert_eq!(tools.related_issues.len(), 1);
        assert!(tools.contributors.is_empty());
    }
}
