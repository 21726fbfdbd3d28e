//! Shell-level project setup: git, dependency install, editor

use crate::config::{EditorSettings, GitSettings, InstallSettings};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Timeout for a silent dependency install (10 minutes)
const INSTALL_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for each git invocation
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// What happened to version control in the new project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOutcome {
    /// Disabled in config, or the template already ships a `.git`
    Skipped,
    Initialized,
    Committed,
    /// `git init` itself failed
    InitFailed(String),
    /// Repository created, but the first commit failed
    CommitFailed(String),
}

/// Run a command in `dir` with captured output; the error carries stderr
async fn run_captured(dir: &Path, program: &str, args: &[&str], limit: Duration) -> Result<()> {
    let child = TokioCommand::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start {}", program))?;

    // Dropping the child on timeout kills it
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.with_context(|| format!("Failed to wait for {}", program))?,
        Err(_) => anyhow::bail!(
            "{} {} timed out after {} seconds",
            program,
            args.join(" "),
            limit.as_secs()
        ),
    };

    if output.status.success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} {} exited with code {}: {}",
            program,
            args.join(" "),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }
}

/// Initialize a git repository in `dir` and optionally create the first commit
///
/// Never fails: problems are reported through [`GitOutcome`].
pub async fn git_init(dir: &Path, settings: &GitSettings) -> GitOutcome {
    if !settings.init || dir.join(".git").exists() {
        return GitOutcome::Skipped;
    }

    if let Err(e) = run_captured(dir, "git", &["init"], GIT_TIMEOUT).await {
        tracing::warn!(error = %e, "git init failed");
        return GitOutcome::InitFailed(e.to_string());
    }

    let message = match settings.first_commit.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => message,
        None => return GitOutcome::Initialized,
    };

    let commit = async {
        run_captured(dir, "git", &["add", "."], GIT_TIMEOUT).await?;
        run_captured(dir, "git", &["commit", "-m", message], GIT_TIMEOUT).await
    };
    match commit.await {
        Ok(()) => GitOutcome::Committed,
        Err(e) => {
            tracing::warn!(error = %e, "first commit failed");
            GitOutcome::CommitFailed(e.to_string())
        }
    }
}

/// A project needs an install when it has a `package.json` but no `node_modules`
pub fn needs_install(dir: &Path) -> bool {
    dir.join("package.json").is_file() && !dir.join("node_modules").exists()
}

/// Run `<manager> install` in `dir`
///
/// In silent mode output is captured (and shown only on failure); otherwise
/// the installer inherits the terminal.
pub async fn install_dependencies(dir: &Path, settings: &InstallSettings) -> Result<()> {
    let manager = settings.manager.trim();
    if manager.is_empty() {
        anyhow::bail!("No package manager configured (install.manager)");
    }

    if settings.silent {
        return run_captured(dir, manager, &["install"], INSTALL_TIMEOUT).await;
    }

    let status = TokioCommand::new(manager)
        .arg("install")
        .current_dir(dir)
        .status()
        .await
        .with_context(|| format!("Failed to start {} install", manager))?;

    if status.success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} install failed with exit code: {}",
            manager,
            status.code().unwrap_or(-1)
        )
    }
}

/// Launch the configured editor on `dir`
pub async fn open_in_editor(dir: &Path, settings: &EditorSettings) -> Result<()> {
    let mut parts = settings.command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("No editor command configured (editor.command)"))?;

    let status = TokioCommand::new(program)
        .args(parts)
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .with_context(|| format!("Failed to start {}", settings.name))?;

    if status.success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} exited with code: {}",
            settings.name,
            status.code().unwrap_or(-1)
        )
    }
}

/// Open a file or folder with the system default handler
pub fn open_path(path: &Path) -> Result<()> {
    open::that(path).with_context(|| format!("Failed to open {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_install() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!needs_install(dir.path()));

        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert!(needs_install(dir.path()));

        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        assert!(!needs_install(dir.path()));
    }

    #[tokio::test]
    async fn test_git_init_disabled_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let settings = GitSettings {
            init: false,
            first_commit: None,
        };
        assert_eq!(git_init(dir.path(), &settings).await, GitOutcome::Skipped);
        assert!(!dir.path().join(".git").exists());
    }

    #[tokio::test]
    async fn test_git_init_skips_existing_repository() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(
            git_init(dir.path(), &GitSettings::default()).await,
            GitOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_install_requires_manager() {
        let dir = tempfile::tempdir().unwrap();
        let settings = InstallSettings {
            manager: "  ".to_string(),
            ..InstallSettings::default()
        };
        assert!(install_dependencies(dir.path(), &settings).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_editor_binary_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings {
            enable: true,
            name: "Nope".to_string(),
            command: "definitely-not-an-editor-binary-xyz".to_string(),
        };
        assert!(open_in_editor(dir.path(), &settings).await.is_err());
    }
}
