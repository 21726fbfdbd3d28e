//! Source-hosting provider adapters
//!
//! Each provider exposes a directory-listing API and a raw-file API with its
//! own wire format. The [`ProviderAdapter`] trait normalizes both into
//! [`RemoteListingItem`]s so the resolver and the materializer never branch
//! on the provider kind themselves.

pub mod github;
pub mod gitlab;

use crate::error::{Result, TemplateError};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub use github::GitHub;
pub use gitlab::GitLab;

/// Supported source-hosting providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::GitHub, ProviderKind::GitLab];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }

    /// Environment variable consulted for a token when the config has none
    pub fn token_env(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "GITHUB_TOKEN",
            ProviderKind::GitLab => "GITLAB_TOKEN",
        }
    }

    /// The adapter implementing this provider's wire protocol
    pub fn adapter(&self) -> &'static dyn ProviderAdapter {
        static GITHUB: GitHub = GitHub;
        static GITLAB: GitLab = GitLab;
        match self {
            ProviderKind::GitHub => &GITHUB,
            ProviderKind::GitLab => &GITLAB,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One configured remote template source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSourceConfig {
    pub provider: ProviderKind,

    /// Owner or namespace
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Branch or ref; the provider default branch is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Root path of the catalog inside the repository
    #[serde(default)]
    pub path: String,

    /// Base API URL, needed for self-hosted instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl TemplateSourceConfig {
    pub fn new(provider: ProviderKind, owner: &str, repo: &str) -> Self {
        Self {
            provider,
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: None,
            path: String::new(),
            api_url: None,
            token: None,
        }
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn with_branch(mut self, branch: &str) -> Self {
        self.branch = Some(branch.to_string());
        self
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = Some(api_url.to_string());
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Configured root path without leading/trailing slashes
    pub fn root(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// Join a root-relative path onto the configured root
    pub fn repo_path(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        match (self.root(), relative) {
            ("", rel) => rel.to_string(),
            (root, "") => root.to_string(),
            (root, rel) => format!("{}/{}", root, rel),
        }
    }

    /// Strip the configured root from a full repository path
    pub fn relative_path<'a>(&self, full: &'a str) -> &'a str {
        strip_root(self.root(), full)
    }

    /// Short provenance label, e.g. `github-owner/repo`
    pub fn label(&self) -> String {
        format!("{}-{}/{}", self.provider, self.owner, self.repo)
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    fn api_base(&self, default: &str) -> Result<Url> {
        let raw = self.api_url.as_deref().unwrap_or(default);
        Url::parse(raw).map_err(|e| TemplateError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Remove `root/` from the front of `full`; paths outside `root` are returned unchanged
pub(crate) fn strip_root<'a>(root: &str, full: &'a str) -> &'a str {
    let full = full.trim_matches('/');
    if root.is_empty() {
        return full;
    }
    match full.strip_prefix(root) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => full,
    }
}

/// Normalized listing entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory
    Tree,
    /// File
    Blob,
}

/// One entry returned by a provider directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListingItem {
    pub name: String,
    /// Full path from the repository root
    pub path: String,
    pub kind: EntryKind,
    /// Next-level listing URL (trees only)
    pub listing_url: Option<Url>,
    /// Raw file URL (blobs only)
    pub download_url: Option<Url>,
}

/// Wire-protocol capability of one source-hosting provider
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Listing URL for a repository path (full path from the repository root)
    fn listing_url(&self, source: &TemplateSourceConfig, repo_path: &str) -> Result<Url>;

    /// Listing URL of the configured root
    fn root_listing_url(&self, source: &TemplateSourceConfig) -> Result<Url> {
        self.listing_url(source, source.root())
    }

    /// Listing URL of a child directory, derived from the listing it appeared in
    fn child_url(&self, source: &TemplateSourceConfig, parent_url: &Url, path: &str)
        -> Result<Url>;

    /// `Authorization` header value for a token
    fn auth_header(&self, token: &str) -> String;

    /// Parse one listing response body
    fn parse_listing(
        &self,
        source: &TemplateSourceConfig,
        request_url: &Url,
        body: &[u8],
    ) -> Result<Vec<RemoteListingItem>>;

    /// URL of the next page of a paginated listing, if any
    fn next_page(&self, _request_url: &Url, _headers: &HeaderMap) -> Option<Url> {
        None
    }

    /// Extract a human-readable message from an error payload
    fn error_message(&self, body: &[u8]) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<serde_json::Value>,
            error: Option<String>,
        }

        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        match (parsed.message, parsed.error) {
            (Some(serde_json::Value::String(message)), _) => Some(message),
            (Some(other), _) => Some(other.to_string()),
            (None, error) => error,
        }
    }
}

/// Append slash-separated path segments to a base URL, keeping its query
pub(crate) fn push_segments<'a, I>(base: &Url, segments: I) -> Result<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TemplateError::InvalidUrl(format!("URL cannot have path segments: {}", base)))?
        .pop_if_empty()
        .extend(segments.into_iter().filter(|s| !s.is_empty()));
    Ok(url)
}

/// Parse a URL string returned by a provider
pub(crate) fn parse_provider_url(provider: ProviderKind, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| TemplateError::Provider {
        provider,
        message: format!("invalid URL '{}' in listing: {}", raw, e),
    })
}
