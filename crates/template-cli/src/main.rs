//! Template CLI - create projects from local and remote templates

mod logging;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use template_core::templates::bundled_root;
use template_core::tui::{ConfigAction, InitArgs, InitOutcome, ListArgs};
use template_core::Config;

/// Template root shipped with the CLI, found relative to the running binary
fn bundled_templates() -> Option<PathBuf> {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            tracing::debug!(error = %e, "cannot locate the running executable");
            return None;
        }
    };
    let root = bundled_templates_for(&exe);
    if root.is_none() {
        tracing::debug!(exe = %exe.display(), "no bundled templates next to the executable");
    }
    root
}

fn bundled_templates_for(exe: &Path) -> Option<PathBuf> {
    // Resolve symlinks so a linked binary still finds its install directory
    let exe = exe.canonicalize().unwrap_or_else(|_| exe.to_path_buf());
    bundled_root(&exe)
}

#[derive(Parser, Debug)]
#[command(name = "template")]
#[command(about = "Create projects from local and remote (GitHub/GitLab) templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Init a project from a template
    Init(CliInitArgs),
    /// List template types or names
    List(CliListArgs),
    /// Show, open or reset the config file
    Config(CliConfigArgs),
}

#[derive(ClapArgs, Debug)]
pub struct CliInitArgs {
    /// Project directory to create in the current directory
    pub project_name: Option<String>,

    /// Template type to use
    #[arg(short = 't', long = "template-type")]
    pub template_type: Option<String>,

    /// Template name to use
    #[arg(short = 'n', long = "template-name")]
    pub template_name: Option<String>,

    /// Local template directory to use instead of the configured and bundled ones
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

impl From<CliInitArgs> for InitArgs {
    fn from(args: CliInitArgs) -> Self {
        InitArgs {
            project_name: args.project_name,
            template_type: args.template_type,
            template_name: args.template_name,
            template_dir: args.template_dir,
            bundled_templates: bundled_templates(),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct CliListArgs {
    /// Only list the templates of this type
    pub template_type: Option<String>,

    /// List all templates
    #[arg(short, long)]
    pub all: bool,

    /// Local template directory to use instead of the configured and bundled ones
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,
}

impl From<CliListArgs> for ListArgs {
    fn from(args: CliListArgs) -> Self {
        ListArgs {
            template_type: args.template_type,
            all: args.all,
            template_dir: args.template_dir,
            bundled_templates: bundled_templates(),
        }
    }
}

#[derive(ClapArgs, Debug)]
#[group(multiple = false)]
pub struct CliConfigArgs {
    /// Open the config folder
    #[arg(short, long)]
    pub show: bool,

    /// Open the config file
    #[arg(short, long)]
    pub open: bool,

    /// Reset the config file to its defaults
    #[arg(short, long)]
    pub reset: bool,
}

impl CliConfigArgs {
    fn action(&self) -> ConfigAction {
        if self.show {
            ConfigAction::Show
        } else if self.open {
            ConfigAction::Open
        } else if self.reset {
            ConfigAction::Reset
        } else {
            ConfigAction::Path
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    logging::init(args.verbose, args.quiet)?;

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    tracing::debug!(config = %config_path.display(), command = ?args.command, "starting");

    let result = match args.command {
        Command::Init(init_args) => {
            let config = Config::load(&config_path)?;
            template_core::tui::run_init(&config, init_args.into())
                .await
                .map(|outcome| outcome == InitOutcome::NoTemplates)
        }
        Command::List(list_args) => {
            let config = Config::load(&config_path)?;
            template_core::tui::run_list(&config, list_args.into())
                .await
                .map(|_| false)
        }
        Command::Config(config_args) => {
            template_core::tui::run_config(&config_path, config_args.action()).map(|_| false)
        }
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    if result? {
        std::process::exit(1);
    }
    Ok(())
}
