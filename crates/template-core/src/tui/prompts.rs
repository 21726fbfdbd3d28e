//! Charm-style `init` flow using cliclack

use crate::config::Config;
use crate::runtime::{self, GitOutcome};
use crate::templates::{
    build_catalog, Catalog, CatalogBuild, CatalogEntry, CatalogResolver, Materializer, Origin,
    HttpSettings, RemoteFetcher,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Arguments of the `init` command
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    /// Name of the project directory to create in the current directory
    pub project_name: Option<String>,

    /// Template type to use; prompts when absent or unknown
    pub template_type: Option<String>,

    /// Template name to use; prompts when absent or unknown
    pub template_name: Option<String>,

    /// Local template root to use instead of the configured and bundled ones
    pub template_dir: Option<PathBuf>,

    /// Template root used when the config lists no local roots
    pub bundled_templates: Option<PathBuf>,
}

/// How an `init` run ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    /// The catalog was empty; nothing to choose from
    NoTemplates,
}

/// Run the interactive `init` flow
pub async fn run(config: &Config, args: InitArgs) -> Result<InitOutcome> {
    cliclack::intro("Template CLI")?;

    // Step 1: Project name and destination
    let project_name = match args.project_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => prompt_project_name()?,
    };
    let project_dir = std::env::current_dir()?.join(&project_name);
    if project_dir.exists() {
        anyhow::bail!(
            "This {} project already exists in the current directory",
            project_name
        );
    }

    // Step 2: Catalog
    let fetcher = RemoteFetcher::new(&HttpSettings::default())?;
    let roots = local_roots(
        config,
        args.template_dir.as_deref(),
        args.bundled_templates.as_deref(),
    )?;
    let build = load_catalog(config, fetcher.clone(), &roots).await?;
    let catalog = build.catalog;
    if catalog.is_empty() {
        cliclack::outro("No template available")?;
        return Ok(InitOutcome::NoTemplates);
    }

    // Step 3: Template type, then template
    let template_type = select_type(&catalog, args.template_type.as_deref())?;
    let template = select_template(template_type, args.template_name.as_deref())?;

    // Step 4: Create project
    create_project(&Materializer::new(fetcher), template, &project_dir, &project_name).await?;

    // Step 5: Post-setup
    init_git(config, &project_dir).await?;
    install_dependencies(config, &project_dir).await?;
    open_editor(config, &project_dir).await?;

    cliclack::outro(format!("The {} project init successful", project_name))?;
    Ok(InitOutcome::Created(project_dir))
}

fn prompt_project_name() -> Result<String> {
    let input: String = cliclack::input("Project name")
        .placeholder("my-app")
        .validate(|input: &String| {
            if input.trim().is_empty() {
                Err("Please enter a project name")
            } else if input.contains(['/', '\\']) {
                Err("The project name cannot contain path separators")
            } else {
                Ok(())
            }
        })
        .interact()?;
    Ok(input.trim().to_string())
}

/// Local roots to scan: an explicit `--template-dir` wins over the config
pub(crate) fn local_roots(
    config: &Config,
    template_dir: Option<&Path>,
    bundled: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    match template_dir {
        Some(path) => {
            if !path.is_dir() {
                anyhow::bail!("Template directory not found: {}", path.display());
            }
            Ok(vec![path.to_path_buf()])
        }
        None => Ok(config.local_roots(bundled)),
    }
}

/// Build the catalog behind a spinner and report advisories
pub(crate) async fn load_catalog(
    config: &Config,
    fetcher: RemoteFetcher,
    roots: &[PathBuf],
) -> Result<CatalogBuild> {
    let sources = config.remote_sources();

    let spinner = cliclack::spinner();
    spinner.start("Loading templates...");
    let build = build_catalog(&CatalogResolver::new(fetcher), roots, &sources).await;
    spinner.stop(format!("Found {} template type(s)", build.catalog.len()));

    for advisory in build.advisories() {
        cliclack::log::warning(advisory)?;
    }

    Ok(build)
}

fn select_type<'a>(catalog: &'a Catalog, wanted: Option<&str>) -> Result<&'a CatalogEntry> {
    if let Some(wanted) = wanted {
        if let Some(idx) = catalog.position(wanted) {
            return Ok(&catalog.types()[idx]);
        }
        cliclack::log::warning(format!("Template type '{}' not found", wanted))?;
    }

    let mut select = cliclack::select("Choose template type");
    for (idx, entry) in catalog.types().iter().enumerate() {
        select = select.item(idx, entry.label(), "");
    }
    let selected: usize = select.interact()?;

    catalog
        .types()
        .get(selected)
        .ok_or_else(|| anyhow::anyhow!("Invalid template type selection"))
}

fn select_template<'a>(
    template_type: &'a CatalogEntry,
    wanted: Option<&str>,
) -> Result<&'a CatalogEntry> {
    if let Some(wanted) = wanted {
        if let Some(template) = template_type.find_child(wanted) {
            return Ok(template);
        }
        cliclack::log::warning(format!(
            "Template '{}' not found in {}",
            wanted, template_type.name
        ))?;
    }

    // If only one template, use it automatically
    if let [only] = template_type.children.as_slice() {
        cliclack::log::info(format!("Using template: {}", only.name))?;
        return Ok(only);
    }

    let mut select = cliclack::select(format!("Choose {} template", template_type.name));
    for (idx, entry) in template_type.children.iter().enumerate() {
        select = select.item(idx, &entry.name, &entry.path);
    }
    let selected: usize = select.interact()?;

    template_type
        .children
        .get(selected)
        .ok_or_else(|| anyhow::anyhow!("Invalid template selection"))
}

async fn create_project(
    materializer: &Materializer,
    template: &CatalogEntry,
    project_dir: &Path,
    project_name: &str,
) -> Result<()> {
    let (busy, done) = match &template.origin {
        Origin::Local(_) => ("Copying files".to_string(), "Copy successful".to_string()),
        Origin::Remote { provider, .. } => (
            format!("Downloading files from {}", provider),
            format!("Downloading files from {} successful", provider),
        ),
    };

    let spinner = cliclack::spinner();
    spinner.start(&busy);

    match materializer.materialize(template, project_dir).await {
        Ok(stats) => {
            spinner.stop(format!("{} ({} files)", done, stats.files));
            Ok(())
        }
        Err(e) => {
            spinner.stop(format!("{} failed", busy));
            cliclack::log::error(format!("{}", e))?;
            anyhow::bail!("The {} project init failed", project_name);
        }
    }
}

async fn init_git(config: &Config, project_dir: &Path) -> Result<()> {
    if !config.git.init {
        return Ok(());
    }

    let spinner = cliclack::spinner();
    spinner.start("Git init");
    match runtime::git_init(project_dir, &config.git).await {
        GitOutcome::Skipped => spinner.stop("Git repository already present"),
        GitOutcome::Initialized | GitOutcome::Committed => spinner.stop("Git init successful"),
        GitOutcome::InitFailed(e) => {
            spinner.stop("Git init failed");
            cliclack::log::warning(e)?;
        }
        GitOutcome::CommitFailed(e) => {
            spinner.stop("Git init successful but Git commit failed");
            cliclack::log::warning(e)?;
        }
    }
    Ok(())
}

async fn install_dependencies(config: &Config, project_dir: &Path) -> Result<()> {
    if !runtime::needs_install(project_dir) {
        return Ok(());
    }

    let install = if config.install.auto {
        true
    } else {
        cliclack::confirm("Install dependencies?")
            .initial_value(true)
            .interact()?
    };
    if !install {
        return Ok(());
    }

    if config.install.silent {
        let spinner = cliclack::spinner();
        spinner.start("Installing dependencies");
        match runtime::install_dependencies(project_dir, &config.install).await {
            Ok(()) => {
                spinner.stop("Dependencies installed successfully");
                Ok(())
            }
            Err(e) => {
                spinner.stop("Dependencies install failed");
                Err(e)
            }
        }
    } else {
        cliclack::log::info("Installing dependencies")?;
        runtime::install_dependencies(project_dir, &config.install).await?;
        cliclack::log::success("Dependencies installed successfully")?;
        Ok(())
    }
}

async fn open_editor(config: &Config, project_dir: &Path) -> Result<()> {
    if !config.editor.enable {
        return Ok(());
    }

    let spinner = cliclack::spinner();
    spinner.start(format!("Opening with {}", config.editor.name));
    match runtime::open_in_editor(project_dir, &config.editor).await {
        Ok(()) => spinner.stop(format!("Opening with {} successfully", config.editor.name)),
        Err(e) => {
            spinner.stop(format!("Opening with {} failed", config.editor.name));
            cliclack::log::warning(format!("{}", e))?;
        }
    }
    Ok(())
}
