//! Local catalog scanning: `{root}/{type}/{template}` directories on disk

use super::catalog::{CatalogEntry, Origin};
use std::fs;
use std::path::{Path, PathBuf};

/// Immediate, non-hidden subdirectories of `path`, in the order the filesystem reports them
///
/// A missing or unreadable directory yields nothing.
pub fn subdirectories(path: &Path) -> Vec<(String, PathBuf)> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable template root");
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            // is_dir follows symlinks, so linked template folders still count
            (!name.starts_with('.') && path.is_dir()).then_some((name, path))
        })
        .collect()
}

/// Scan one local template root into type nodes with their templates
pub fn scan_root(root: &Path) -> Vec<CatalogEntry> {
    let root = absolute(root);
    subdirectories(&root)
        .into_iter()
        .map(|(type_name, type_path)| {
            let children = subdirectories(&type_path)
                .into_iter()
                .map(|(name, path)| {
                    let rel = format!("{}/{}", type_name, name);
                    CatalogEntry::leaf(name, rel, Origin::Local(path))
                })
                .collect();
            CatalogEntry {
                path: type_name.clone(),
                name: type_name,
                origin: Origin::Local(type_path),
                children,
            }
        })
        .collect()
}

/// Scan every configured root, concatenating contributions in configuration order
pub fn scan_roots(roots: &[PathBuf]) -> Vec<CatalogEntry> {
    roots.iter().flat_map(|root| scan_root(root)).collect()
}

/// Name of the template root shipped alongside the binary
pub const BUNDLED_DIR_NAME: &str = "templates";

/// Locate the bundled template root from the path of the running executable
///
/// Looked up, in order: `<bin>/templates` (release archive),
/// `<bin>/../share/template-cli/templates` (system install), then the two
/// directories above `<bin>` (a `target/<profile>` build inside a checkout).
pub fn bundled_root(exe: &Path) -> Option<PathBuf> {
    let bin_dir = exe.parent()?;
    std::iter::once(bin_dir.to_path_buf())
        .chain(std::iter::once(bin_dir.join("../share/template-cli")))
        .chain(bin_dir.ancestors().skip(1).take(2).map(Path::to_path_buf))
        .map(|dir| dir.join(BUNDLED_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
