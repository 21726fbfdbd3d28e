//! Remote catalog resolution
//!
//! A configured source is read as `root/{type}/{template}`: one listing at
//! the root yields the type nodes, one listing per type yields its templates.
//! Second-level listings run concurrently and are awaited as a batch, so a
//! source either resolves completely or fails as a whole. Sources of the same
//! provider are resolved side by side and fail independently.

use super::catalog::{CatalogEntry, Origin};
use super::fetcher::RemoteFetcher;
use crate::error::{Result, TemplateError};
use crate::providers::{EntryKind, ProviderKind, RemoteListingItem, TemplateSourceConfig};
use futures::future::{join_all, try_join_all};
use std::sync::Arc;

/// A source whose resolution failed; its entries are left out of the catalog
#[derive(Debug)]
pub struct SourceFailure {
    pub source: Arc<TemplateSourceConfig>,
    pub error: TemplateError,
}

/// Outcome of resolving every source of one provider
#[derive(Debug)]
pub struct ProviderResolution {
    pub provider: ProviderKind,
    /// Type nodes of all successfully resolved sources, in configuration order
    pub entries: Vec<CatalogEntry>,
    /// Isolated per-source failures, in configuration order
    pub failures: Vec<SourceFailure>,
    /// At least one source of this provider was queried without a token
    pub anonymous: bool,
}

impl ProviderResolution {
    fn empty(provider: ProviderKind) -> Self {
        Self {
            provider,
            entries: Vec::new(),
            failures: Vec::new(),
            anonymous: false,
        }
    }

    /// First failure, surfaced for visibility
    pub fn first_error(&self) -> Option<&TemplateError> {
        self.failures.first().map(|f| &f.error)
    }
}

/// Builds the remote half of the catalog
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    fetcher: RemoteFetcher,
}

impl CatalogResolver {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// Resolve every configured source, provider by provider
    ///
    /// Providers run concurrently; the result keeps [`ProviderKind::ALL`] order.
    pub async fn resolve_all(&self, sources: &[TemplateSourceConfig]) -> Vec<ProviderResolution> {
        join_all(
            ProviderKind::ALL
                .iter()
                .map(|kind| self.resolve_provider(*kind, sources)),
        )
        .await
    }

    /// Resolve the sources of one provider kind
    ///
    /// Never fails as a whole: each source that errors is recorded in
    /// [`ProviderResolution::failures`] while the others still contribute.
    pub async fn resolve_provider(
        &self,
        provider: ProviderKind,
        sources: &[TemplateSourceConfig],
    ) -> ProviderResolution {
        let selected: Vec<Arc<TemplateSourceConfig>> = sources
            .iter()
            .filter(|s| s.provider == provider)
            .cloned()
            .map(Arc::new)
            .collect();

        let mut resolution = ProviderResolution::empty(provider);
        if selected.is_empty() {
            return resolution;
        }

        if selected.iter().any(|s| s.token().is_none()) {
            // Surfaced to the user through `advisories`
            resolution.anonymous = true;
            tracing::debug!(%provider, "no {} token configured, querying anonymously", provider);
        }

        let results = join_all(selected.iter().map(|s| self.resolve_source(s.clone()))).await;

        for (source, result) in selected.into_iter().zip(results) {
            match result {
                Ok(entries) => {
                    tracing::info!(source = %source.label(), types = entries.len(), "resolved template source");
                    resolution.entries.extend(entries);
                }
                Err(error) => {
                    tracing::info!(source = %source.label(), %error, "template source failed");
                    resolution.failures.push(SourceFailure { source, error });
                }
            }
        }

        resolution
    }

    /// Resolve one source into type nodes, all-or-nothing
    pub async fn resolve_source(
        &self,
        source: Arc<TemplateSourceConfig>,
    ) -> Result<Vec<CatalogEntry>> {
        let adapter = source.provider.adapter();
        let root_url = adapter.root_listing_url(&source)?;
        let types: Vec<RemoteListingItem> = self
            .fetcher
            .list(adapter, &source, &root_url)
            .await?
            .into_iter()
            .filter(|item| item.kind == EntryKind::Tree)
            .collect();

        // try_join_all keeps listing order and drops the rest on the first error
        try_join_all(
            types
                .into_iter()
                .map(|item| self.resolve_type(source.clone(), item)),
        )
        .await
    }

    async fn resolve_type(
        &self,
        source: Arc<TemplateSourceConfig>,
        item: RemoteListingItem,
    ) -> Result<CatalogEntry> {
        let adapter = source.provider.adapter();
        let listing_url = self.listing_url_of(&source, &item)?;

        let children = self
            .fetcher
            .list(adapter, &source, &listing_url)
            .await?
            .into_iter()
            .filter(|child| child.kind == EntryKind::Tree)
            .map(|child| -> Result<CatalogEntry> {
                let url = self.listing_url_of(&source, &child)?;
                Ok(CatalogEntry::leaf(
                    child.name,
                    source.relative_path(&child.path).to_string(),
                    Origin::Remote {
                        provider: source.provider,
                        source: source.clone(),
                        listing_url: url,
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogEntry {
            name: item.name,
            path: source.relative_path(&item.path).to_string(),
            origin: Origin::Remote {
                provider: source.provider,
                source: source.clone(),
                listing_url,
            },
            children,
        })
    }

    fn listing_url_of(
        &self,
        source: &TemplateSourceConfig,
        item: &RemoteListingItem,
    ) -> Result<url::Url> {
        match &item.listing_url {
            Some(url) => Ok(url.clone()),
            None => source
                .provider
                .adapter()
                .listing_url(source, &item.path),
        }
    }
}

/// Advisory lines for a set of provider resolutions (anonymous access, failed sources)
///
/// These are the user-facing form of the anonymous and failed-source events,
/// which the resolver itself only logs below the default `warn` level.
pub fn advisories(resolutions: &[ProviderResolution]) -> Vec<String> {
    let mut lines = Vec::new();
    for resolution in resolutions {
        if resolution.anonymous {
            lines.push(format!(
                "No {} token configured: lower rate limits apply and private repositories cannot be read",
                resolution.provider
            ));
        }
        for failure in &resolution.failures {
            lines.push(format!(
                "Skipping templates from {}: {}",
                failure.source.label(),
                failure.error
            ));
        }
    }
    lines
}
