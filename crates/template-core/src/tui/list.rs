//! `list` flow: print template types and templates

use super::prompts::{load_catalog, local_roots};
use crate::config::Config;
use crate::templates::{Catalog, CatalogEntry, HttpSettings, RemoteFetcher};
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Arguments of the `list` command
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    /// Only list the templates of this type
    pub template_type: Option<String>,

    /// List every type with its templates
    pub all: bool,

    /// Local template root to use instead of the configured and bundled ones
    pub template_dir: Option<PathBuf>,

    /// Template root used when the config lists no local roots
    pub bundled_templates: Option<PathBuf>,
}

/// Run the `list` command
pub async fn run(config: &Config, args: ListArgs) -> Result<()> {
    let roots = local_roots(
        config,
        args.template_dir.as_deref(),
        args.bundled_templates.as_deref(),
    )?;
    let fetcher = RemoteFetcher::new(&HttpSettings::default())?;
    let build = load_catalog(config, fetcher, &roots).await?;

    println!();
    for line in render(&build.catalog, &args) {
        println!("{}", line);
    }
    Ok(())
}

/// Lines printed by `list`, headers dimmed
fn render(catalog: &Catalog, args: &ListArgs) -> Vec<String> {
    if catalog.is_empty() {
        return vec!["No template available".dimmed().to_string()];
    }

    let mut lines = Vec::new();
    if args.all {
        lines.push(format!("{}\n", "All templates".dimmed()));
        for entry in catalog.types() {
            lines.push(entry.label());
            lines.extend(template_lines(entry, "  "));
        }
        return lines;
    }

    match args
        .template_type
        .as_deref()
        .and_then(|name| catalog.find_type(name))
    {
        Some(entry) => {
            lines.push(format!("{}\n", format!("All {} templates", entry.name).dimmed()));
            lines.extend(template_lines(entry, ""));
        }
        None => {
            lines.push(format!("{}\n", "All template types".dimmed()));
            lines.extend(catalog.types().iter().map(CatalogEntry::label));
        }
    }
    lines
}

fn template_lines<'a>(entry: &'a CatalogEntry, prefix: &'a str) -> impl Iterator<Item = String> + 'a {
    entry
        .children
        .iter()
        .map(move |t| format!("{}{}", prefix, t.name))
}
