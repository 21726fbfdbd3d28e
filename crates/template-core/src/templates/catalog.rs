//! Two-level template catalog: template type -> templates

use crate::providers::{ProviderKind, TemplateSourceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Where a catalog entry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Absolute path of the directory on disk
    Local(PathBuf),
    /// Directory in a remote repository, reachable through its listing URL
    Remote {
        provider: ProviderKind,
        source: Arc<TemplateSourceConfig>,
        listing_url: Url,
    },
}

impl Origin {
    pub fn is_local(&self) -> bool {
        matches!(self, Origin::Local(_))
    }

    /// Provenance shown next to a type name
    pub fn label(&self) -> String {
        match self {
            Origin::Local(_) => "local".to_string(),
            Origin::Remote { source, .. } => source.label(),
        }
    }
}

/// A node of the catalog
///
/// Type nodes carry their templates in `children`; template nodes are leaves
/// and hold enough provenance to be materialized on their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Directory name as reported by the source
    pub name: String,
    /// Path relative to the source's configured root
    pub path: String,
    pub origin: Origin,
    pub children: Vec<CatalogEntry>,
}

impl CatalogEntry {
    pub fn leaf(name: String, path: String, origin: Origin) -> Self {
        Self {
            name,
            path,
            origin,
            children: Vec::new(),
        }
    }

    /// Display label, e.g. `web (local)` or `web (github-owner/repo)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.origin.label())
    }

    pub fn find_child(&self, name: &str) -> Option<&CatalogEntry> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// The assembled catalog, local and remote type nodes combined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    types: Vec<CatalogEntry>,
}

impl Catalog {
    /// Concatenate contributions in order, dropping type nodes without templates
    pub fn assemble<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Vec<CatalogEntry>>,
    {
        let types = parts
            .into_iter()
            .flatten()
            .filter(|t| !t.children.is_empty())
            .collect();
        Self { types }
    }

    /// True when no template is available; a valid, terminal state
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> &[CatalogEntry] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// First type node with this name
    pub fn find_type(&self, name: &str) -> Option<&CatalogEntry> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Position of a type by name or by its full label
    pub fn position(&self, name_or_label: &str) -> Option<usize> {
        self.types
            .iter()
            .position(|t| t.name == name_or_label || t.label() == name_or_label)
    }
}
