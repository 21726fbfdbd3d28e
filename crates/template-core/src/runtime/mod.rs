//! Post-creation steps run in a freshly materialized project
//!
//! This module provides:
//! - Git repository initialization with an optional first commit
//! - Dependency installation through the configured package manager
//! - Opening the project in an editor, or any path with the system handler

pub mod setup;

pub use setup::{
    git_init, install_dependencies, needs_install, open_in_editor, open_path, GitOutcome,
};
