//! GitHub contents API
//!
//! `GET {api}/repos/{owner}/{repo}/contents/{path}[?ref={branch}]` returns a
//! flat JSON array; directories carry their own listing `url` and files a
//! `download_url`.

use super::{
    parse_provider_url, push_segments, EntryKind, ProviderAdapter, ProviderKind,
    RemoteListingItem, TemplateSourceConfig,
};
use crate::error::{Result, TemplateError};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Copy, Default)]
pub struct GitHub;

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

impl ProviderAdapter for GitHub {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn listing_url(&self, source: &TemplateSourceConfig, repo_path: &str) -> Result<Url> {
        let base = source.api_base(DEFAULT_API_URL)?;
        let mut url = push_segments(
            &base,
            ["repos", source.owner.as_str(), source.repo.as_str(), "contents"]
                .into_iter()
                .chain(repo_path.split('/')),
        )?;
        if let Some(branch) = &source.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    fn child_url(
        &self,
        source: &TemplateSourceConfig,
        _parent_url: &Url,
        path: &str,
    ) -> Result<Url> {
        self.listing_url(source, path)
    }

    fn auth_header(&self, token: &str) -> String {
        format!("token {}", token)
    }

    fn parse_listing(
        &self,
        source: &TemplateSourceConfig,
        request_url: &Url,
        body: &[u8],
    ) -> Result<Vec<RemoteListingItem>> {
        let items: Vec<ContentItem> =
            serde_json::from_slice(body).map_err(|e| TemplateError::Provider {
                provider: self.kind(),
                message: format!("unexpected listing response from {}: {}", request_url, e),
            })?;

        let mut listing = Vec::with_capacity(items.len());
        for item in items {
            let entry = match item.kind.as_str() {
                "dir" => {
                    // The API already hands out the next listing URL; fall back to building it
                    let listing_url = match item.url.as_deref() {
                        Some(raw) => parse_provider_url(self.kind(), raw)?,
                        None => self.child_url(source, request_url, &item.path)?,
                    };
                    RemoteListingItem {
                        name: item.name,
                        path: item.path,
                        kind: EntryKind::Tree,
                        listing_url: Some(listing_url),
                        download_url: None,
                    }
                }
                "file" => {
                    let download_url = item
                        .download_url
                        .as_deref()
                        .filter(|raw| !raw.is_empty())
                        .map(|raw| parse_provider_url(self.kind(), raw))
                        .transpose()?;
                    RemoteListingItem {
                        name: item.name,
                        path: item.path,
                        kind: EntryKind::Blob,
                        listing_url: None,
                        download_url,
                    }
                }
                // symlinks and submodules are not part of a template
                _ => continue,
            };
            listing.push(entry);
        }

        Ok(listing)
    }
}
