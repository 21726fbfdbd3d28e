//! Template Core - library behind the `template` scaffolding CLI
//!
//! Lets a user pick a template type and a template from a catalog built out
//! of local directories and remote GitHub/GitLab repositories, then
//! materializes the chosen template into a new project directory.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Providers** - GitHub contents API and GitLab repository tree API
//!   adapters behind the [`ProviderAdapter`] trait
//! - **Layer 2: Templates** - local scanning, remote catalog resolution and
//!   materialization, plus explicit [`Config`] loading
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based flows (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based `init`, `list` and `config` flows
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use template_core::templates::{build_catalog, CatalogResolver, HttpSettings, Materializer, RemoteFetcher};
//!
//! let config = template_core::Config::load(&template_core::Config::default_path()?)?;
//! let fetcher = RemoteFetcher::new(&HttpSettings::default())?;
//! let build = build_catalog(
//!     &CatalogResolver::new(fetcher.clone()),
//!     &config.local_roots(None),
//!     &config.remote_sources(),
//! )
//! .await;
//! let web = build.catalog.find_type("web").unwrap();
//! Materializer::new(fetcher)
//!     .materialize(&web.children[0], "my-app".as_ref())
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod providers;
pub mod runtime;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Result, TemplateError};
pub use providers::{
    EntryKind, ProviderAdapter, ProviderKind, RemoteListingItem, TemplateSourceConfig,
};
pub use templates::{
    build_catalog, Catalog, CatalogEntry, CatalogResolver, Materializer, Origin, RemoteFetcher,
};
