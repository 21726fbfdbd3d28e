//! GitLab repository tree API
//!
//! Listings come from
//! `GET {api}/projects/{owner%2Frepo}/repository/tree?ref=..&per_page=100&path=..`
//! and do not include follow-up URLs, so both the next listing URL and the
//! raw blob URL are synthesized here.

use super::{
    push_segments, EntryKind, ProviderAdapter, ProviderKind, RemoteListingItem,
    TemplateSourceConfig,
};
use crate::error::{Result, TemplateError};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";

/// Page size requested from the tree API
const PER_PAGE: &str = "100";

#[derive(Debug, Clone, Copy, Default)]
pub struct GitLab;

#[derive(Debug, Deserialize)]
struct TreeItem {
    id: String,
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl GitLab {
    /// `owner/repo`, pushed as a single (percent-encoded) path segment
    fn project_id(source: &TemplateSourceConfig) -> String {
        format!("{}/{}", source.owner, source.repo)
    }

    /// Raw blob URL for a blob id
    pub fn blob_url(&self, source: &TemplateSourceConfig, blob_id: &str) -> Result<Url> {
        let base = source.api_base(DEFAULT_API_URL)?;
        let project = Self::project_id(source);
        let mut url = push_segments(
            &base,
            [
                "projects",
                project.as_str(),
                "repository",
                "blobs",
                blob_id,
                "raw",
            ],
        )?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(branch) = &source.branch {
                query.append_pair("ref", branch);
            }
            query.append_pair("per_page", PER_PAGE);
            if let Some(token) = source.token() {
                query.append_pair("private_token", token);
            }
        }
        Ok(url)
    }
}

/// Replace (or append) one query parameter, leaving every other pair untouched and in order
pub fn replace_query_param(url: &Url, key: &str, value: &str) -> Url {
    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == key {
                replaced = true;
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut next = url.clone();
    {
        let mut query = next.query_pairs_mut();
        query.clear().extend_pairs(pairs);
        if !replaced {
            query.append_pair(key, value);
        }
    }
    next
}

impl ProviderAdapter for GitLab {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn listing_url(&self, source: &TemplateSourceConfig, repo_path: &str) -> Result<Url> {
        let base = source.api_base(DEFAULT_API_URL)?;
        let project = Self::project_id(source);
        let mut url = push_segments(&base, ["projects", project.as_str(), "repository", "tree"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(branch) = &source.branch {
                query.append_pair("ref", branch);
            }
            query.append_pair("per_page", PER_PAGE);
            query.append_pair("path", repo_path);
        }
        Ok(url)
    }

    fn child_url(
        &self,
        _source: &TemplateSourceConfig,
        parent_url: &Url,
        path: &str,
    ) -> Result<Url> {
        let mut url = replace_query_param(parent_url, "path", path);
        // A child listing always starts on its own first page
        if url.query_pairs().any(|(k, _)| k == "page") {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "page")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn auth_header(&self, token: &str) -> String {
        format!("Bearer {}", token)
    }

    fn parse_listing(
        &self,
        source: &TemplateSourceConfig,
        request_url: &Url,
        body: &[u8],
    ) -> Result<Vec<RemoteListingItem>> {
        let items: Vec<TreeItem> =
            serde_json::from_slice(body).map_err(|e| TemplateError::Provider {
                provider: self.kind(),
                message: format!("unexpected listing response from {}: {}", request_url, e),
            })?;

        let mut listing = Vec::with_capacity(items.len());
        for item in items {
            let entry = match item.kind.as_str() {
                "tree" => RemoteListingItem {
                    listing_url: Some(self.child_url(source, request_url, &item.path)?),
                    download_url: None,
                    kind: EntryKind::Tree,
                    name: item.name,
                    path: item.path,
                },
                "blob" => RemoteListingItem {
                    listing_url: None,
                    download_url: Some(self.blob_url(source, &item.id)?),
                    kind: EntryKind::Blob,
                    name: item.name,
                    path: item.path,
                },
                // submodules show up as "commit"
                _ => continue,
            };
            listing.push(entry);
        }

        Ok(listing)
    }

    fn next_page(&self, request_url: &Url, headers: &HeaderMap) -> Option<Url> {
        let next = headers
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())?;
        Some(replace_query_param(request_url, "page", next))
    }
}
