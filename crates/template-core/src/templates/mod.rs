//! Template catalogs and materialization
//!
//! This module provides:
//! - The two-level catalog model (template type -> template)
//! - Local catalog scanning of `{root}/{type}/{template}` directories
//! - Remote catalog resolution through provider listing APIs
//! - Materialization of one template into a new project directory

pub mod catalog;
pub mod copier;
pub mod fetcher;
pub mod local;
pub mod resolver;

use crate::providers::TemplateSourceConfig;
use std::path::PathBuf;

pub use catalog::{Catalog, CatalogEntry, Origin};
pub use copier::{CopyStats, Materializer};
pub use fetcher::{HttpSettings, RemoteFetcher};
pub use local::bundled_root;
pub use resolver::{advisories, CatalogResolver, ProviderResolution, SourceFailure};

/// A catalog together with the per-provider resolution reports it was built from
#[derive(Debug)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub resolutions: Vec<ProviderResolution>,
}

impl CatalogBuild {
    /// Human-readable advisories (anonymous access, skipped sources)
    pub fn advisories(&self) -> Vec<String> {
        advisories(&self.resolutions)
    }
}

/// Build the full catalog: local roots first, then remote sources
///
/// The local scan runs on a blocking thread while remote sources resolve,
/// and the two halves are concatenated once both are done.
pub async fn build_catalog(
    resolver: &CatalogResolver,
    local_roots: &[PathBuf],
    sources: &[TemplateSourceConfig],
) -> CatalogBuild {
    let roots = local_roots.to_vec();
    let local_scan = tokio::task::spawn_blocking(move || local::scan_roots(&roots));
    let (local, resolutions) = tokio::join!(local_scan, resolver.resolve_all(sources));

    let local = local.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "local template scan did not complete");
        Vec::new()
    });

    let catalog = Catalog::assemble(
        std::iter::once(local).chain(resolutions.iter().map(|r| r.entries.clone())),
    );

    CatalogBuild {
        catalog,
        resolutions,
    }
}
