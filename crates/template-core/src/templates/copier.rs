//! Template materialization: produce a template's file tree in a new directory
//!
//! Local templates are copied recursively in one pass. Remote templates are
//! mirrored level by level: every file and subdirectory of a listing is
//! handled concurrently and a level completes only when all of its branches
//! have. Any failure removes the partially written destination.

use super::catalog::{CatalogEntry, Origin};
use super::fetcher::RemoteFetcher;
use crate::error::{Result, TemplateError};
use crate::providers::{EntryKind, RemoteListingItem, TemplateSourceConfig};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::ops::AddAssign;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use url::Url;
use walkdir::WalkDir;

/// Totals of a successful materialization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub bytes: u64,
}

impl AddAssign for CopyStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Materializes catalog entries into fresh directories
#[derive(Debug, Clone)]
pub struct Materializer {
    fetcher: RemoteFetcher,
}

impl Materializer {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// Create `destination` with the full file tree of `entry`
    ///
    /// `destination` must not exist yet. On failure the directory is removed
    /// and the cause is wrapped in [`TemplateError::Materialize`].
    pub async fn materialize(&self, entry: &CatalogEntry, destination: &Path) -> Result<CopyStats> {
        if fs::symlink_metadata(destination).await.is_ok() {
            return Err(TemplateError::DestinationExists(destination.to_path_buf()));
        }

        // create_dir (not _all) so a racing creator is reported instead of clobbered
        if let Err(e) = fs::create_dir(destination).await {
            return Err(match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    TemplateError::DestinationExists(destination.to_path_buf())
                }
                _ => self.wrap(entry, destination, TemplateError::fs(destination, e)),
            });
        }

        let outcome = match &entry.origin {
            Origin::Local(path) => copy_local(path.clone(), destination.to_path_buf()).await,
            Origin::Remote {
                source,
                listing_url,
                ..
            } => {
                let prefix = source.repo_path(&entry.path);
                self.mirror(source, &prefix, listing_url.clone(), destination)
                    .await
            }
        };

        match outcome {
            Ok(stats) => {
                tracing::info!(
                    template = %entry.name,
                    destination = %destination.display(),
                    files = stats.files,
                    bytes = stats.bytes,
                    "template materialized"
                );
                Ok(stats)
            }
            Err(error) => {
                if let Err(e) = fs::remove_dir_all(destination).await {
                    tracing::warn!(
                        destination = %destination.display(),
                        error = %e,
                        "failed to remove partial project directory"
                    );
                }
                Err(self.wrap(entry, destination, error))
            }
        }
    }

    fn wrap(&self, entry: &CatalogEntry, destination: &Path, error: TemplateError) -> TemplateError {
        TemplateError::Materialize {
            template: entry.name.clone(),
            destination: destination.to_path_buf(),
            source: Box::new(error),
        }
    }

    /// Mirror one listing level into `root`, recursing into subdirectories
    fn mirror<'a>(
        &'a self,
        source: &'a TemplateSourceConfig,
        prefix: &'a str,
        url: Url,
        root: &'a Path,
    ) -> BoxFuture<'a, Result<CopyStats>> {
        async move {
            let adapter = source.provider.adapter();
            let items = self.fetcher.list(adapter, source, &url).await?;

            let branches = try_join_all(
                items
                    .into_iter()
                    .map(|item| self.mirror_item(source, prefix, item, root)),
            )
            .await?;

            let mut stats = CopyStats::default();
            for branch in branches {
                stats += branch;
            }
            Ok(stats)
        }
        .boxed()
    }

    async fn mirror_item(
        &self,
        source: &TemplateSourceConfig,
        prefix: &str,
        item: RemoteListingItem,
        root: &Path,
    ) -> Result<CopyStats> {
        let provider = source.provider;
        let target = root.join(relative_target(source, prefix, &item.path)?);

        match item.kind {
            EntryKind::Blob => {
                let url = item.download_url.ok_or_else(|| TemplateError::Provider {
                    provider,
                    message: format!("no download URL for {}", item.path),
                })?;
                let bytes = self
                    .fetcher
                    .download(provider.adapter(), source, &url, &target)
                    .await?;
                Ok(CopyStats { files: 1, bytes })
            }
            EntryKind::Tree => {
                // create-then-populate
                fs::create_dir(&target)
                    .await
                    .map_err(|e| TemplateError::fs(&target, e))?;
                let url = match item.listing_url {
                    Some(url) => url,
                    None => provider.adapter().listing_url(source, &item.path)?,
                };
                self.mirror(source, prefix, url, root).await
            }
        }
    }
}

/// Path of a listing item relative to the template root; rejects anything escaping it
fn relative_target(source: &TemplateSourceConfig, prefix: &str, item_path: &str) -> Result<PathBuf> {
    let full = item_path.trim_matches('/');
    let relative = if prefix.is_empty() {
        Some(full)
    } else {
        full.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('/'))
    };

    let path = relative.map(Path::new).filter(|p| {
        !p.as_os_str().is_empty() && p.components().all(|c| matches!(c, Component::Normal(_)))
    });

    path.map(Path::to_path_buf)
        .ok_or_else(|| TemplateError::Provider {
            provider: source.provider,
            message: format!("listing entry '{}' is outside template '{}'", item_path, prefix),
        })
}

/// Recursive copy of a local template into an existing, empty destination
async fn copy_local(source: PathBuf, destination: PathBuf) -> Result<CopyStats> {
    tokio::task::spawn_blocking(move || copy_tree(&source, &destination))
        .await
        .map_err(|e| TemplateError::fs(Path::new("."), std::io::Error::other(e)))?
}

fn copy_tree(source: &Path, destination: &Path) -> Result<CopyStats> {
    if !source.is_dir() {
        return Err(TemplateError::fs(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "template directory not found"),
        ));
    }

    let mut stats = CopyStats::default();
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            TemplateError::fs(&path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| TemplateError::fs(entry.path(), std::io::Error::other(e)))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| TemplateError::fs(&target, e))?;
        } else {
            let bytes = std::fs::copy(entry.path(), &target)
                .map_err(|e| TemplateError::fs(entry.path(), e))?;
            stats += CopyStats { files: 1, bytes };
        }
    }

    Ok(stats)
}
