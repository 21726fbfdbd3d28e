//! Error types shared by the catalog resolver and the materializer

use crate::providers::ProviderKind;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

/// Everything that can go wrong while resolving or materializing templates.
///
/// An empty catalog is not represented here: it is a valid, empty result
/// (see [`crate::templates::Catalog::is_empty`]).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A request exceeded its deadline
    #[error("a timeout happened while talking to {provider}")]
    Timeout { provider: ProviderKind },

    /// Non-2xx status or an error payload from the hosting API
    #[error("{provider} error: {message}")]
    Provider {
        provider: ProviderKind,
        message: String,
    },

    /// Transport failure (DNS, refused connection, TLS)
    #[error("network error while talking to {provider}: {source}")]
    Network {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built from its settings
    #[error("failed to build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A materialization failed; the partial destination has been removed
    #[error("template '{template}' could not be created at {}: {source}", destination.display())]
    Materialize {
        template: String,
        destination: PathBuf,
        #[source]
        source: Box<TemplateError>,
    },
}

impl TemplateError {
    /// Classify a reqwest failure, keeping timeouts distinct from other transport errors
    pub(crate) fn from_reqwest(provider: ProviderKind, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { provider }
        } else {
            Self::Network {
                provider,
                source: err,
            }
        }
    }

    pub(crate) fn fs(path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Materialize { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
