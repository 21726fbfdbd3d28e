//! `config` flow: show, open or reset the configuration file

use crate::config::Config;
use crate::runtime;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

/// What to do with the config file; printing its path always happens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigAction {
    #[default]
    Path,
    /// Open the folder containing the config
    Show,
    /// Open the config file itself
    Open,
    /// Rewrite the defaults
    Reset,
}

pub fn run(path: &Path, action: ConfigAction) -> Result<()> {
    // Make sure there is something to show or open
    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    println!("{}", format!("Config path: {}", path.display()).bright_green());

    match action {
        ConfigAction::Path => Ok(()),
        ConfigAction::Show => {
            let folder = path.parent().unwrap_or(path);
            runtime::open_path(folder)
        }
        ConfigAction::Open => runtime::open_path(path),
        ConfigAction::Reset => {
            Config::reset(path)?;
            println!("{}", "Config reset successful".bright_green());
            Ok(())
        }
    }
}
