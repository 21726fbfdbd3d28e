//! CLI flows using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

mod config;
mod list;
mod prompts;

pub use config::{run as run_config, ConfigAction};
pub use list::{run as run_list, ListArgs};
pub use prompts::{run as run_init, InitArgs, InitOutcome};
