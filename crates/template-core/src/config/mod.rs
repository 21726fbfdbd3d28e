//! Configuration file handling
//!
//! The configuration lives in a YAML file, created with defaults on first
//! use. It is loaded once and handed explicitly to whatever needs it.

use crate::error::{Result, TemplateError};
use crate::providers::{ProviderKind, TemplateSourceConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "TEMPLATE_CLI_CONFIG";

const CONFIG_DIR_NAME: &str = "template-cli";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub templates: LocalTemplates,

    /// Remote template sources, in display order
    pub sources: Vec<TemplateSourceConfig>,

    /// Per-provider access tokens
    pub tokens: Tokens,

    pub git: GitSettings,

    pub install: InstallSettings,

    pub editor: EditorSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTemplates {
    /// Local template roots, each laid out as `{type}/{template}`
    pub local: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<String>,
}

impl Tokens {
    pub fn get(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::GitHub => self.github.as_deref(),
            ProviderKind::GitLab => self.gitlab.as_deref(),
        }
        .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Run `git init` in new projects
    pub init: bool,
    /// Message of the initial commit; no commit when unset
    pub first_commit: Option<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            init: true,
            first_commit: Some("init".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallSettings {
    /// Install without asking
    pub auto: bool,
    /// Hide installer output behind a spinner
    pub silent: bool,
    /// Package manager binary, e.g. npm, yarn, pnpm
    pub manager: String,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            auto: false,
            silent: false,
            manager: "npm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub enable: bool,
    pub name: String,
    pub command: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            enable: false,
            name: "VS Code".to_string(),
            command: "code".to_string(),
        }
    }
}

impl Config {
    /// Default config file location (`$TEMPLATE_CLI_CONFIG` wins)
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| TemplateError::Config("cannot determine the config directory".into()))
    }

    /// Load the config at `path`, writing the defaults first if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| TemplateError::fs(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            TemplateError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TemplateError::fs(parent, e))?;
        }
        let content = serde_yaml::to_string(self)
            .map_err(|e| TemplateError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| TemplateError::fs(path, e))
    }

    /// Overwrite the file at `path` with the defaults
    pub fn reset(path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Remote sources with tokens filled in from the provider tokens and environment
    pub fn remote_sources(&self) -> Vec<TemplateSourceConfig> {
        self.remote_sources_with(|name| std::env::var(name).ok())
    }

    /// Token precedence: source token, then `tokens.<provider>`, then the environment
    pub fn remote_sources_with<F>(&self, env: F) -> Vec<TemplateSourceConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.sources
            .iter()
            .cloned()
            .map(|mut source| {
                if source.token().is_none() {
                    source.token = self
                        .tokens
                        .get(source.provider)
                        .map(str::to_string)
                        .or_else(|| env(source.provider.token_env()))
                        .filter(|t| !t.is_empty());
                }
                source
            })
            .collect()
    }

    /// Local roots, falling back to `bundled` when none are configured
    pub fn local_roots(&self, bundled: Option<&Path>) -> Vec<PathBuf> {
        if self.templates.local.is_empty() {
            bundled.map(Path::to_path_buf).into_iter().collect()
        } else {
            self.templates.local.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.git.init);
        assert_eq!(config.git.first_commit.as_deref(), Some("init"));
        assert_eq!(config.install.manager, "npm");
        assert!(!config.editor.enable);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.yaml");

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "sources:\n  - provider: gitlab\n    owner: group\n    repo: templates\n    api_url: https://git.example.com/api/v4\ninstall:\n  manager: pnpm\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].provider, ProviderKind::GitLab);
        assert_eq!(config.sources[0].path, "");
        assert_eq!(config.install.manager, "pnpm");
        assert!(!config.install.auto);
        assert!(config.git.init);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "sources: [: nope").unwrap();
        assert!(matches!(Config::load(&path), Err(TemplateError::Config(_))));
    }

    #[test]
    fn test_reset_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = Config::default();
        config.editor.enable = true;
        config.save(&path).unwrap();
        assert!(Config::load(&path).unwrap().editor.enable);

        Config::reset(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_token_precedence() {
        let mut config = Config::default();
        config.sources = vec![
            TemplateSourceConfig::new(ProviderKind::GitHub, "a", "b").with_token("own"),
            TemplateSourceConfig::new(ProviderKind::GitHub, "c", "d"),
            TemplateSourceConfig::new(ProviderKind::GitLab, "e", "f"),
        ];
        config.tokens.github = Some("shared".to_string());

        let env = |name: &str| (name == "GITLAB_TOKEN").then(|| "from-env".to_string());
        let sources = config.remote_sources_with(env);
        assert_eq!(sources[0].token(), Some("own"));
        assert_eq!(sources[1].token(), Some("shared"));
        assert_eq!(sources[2].token(), Some("from-env"));
    }

    #[test]
    fn test_local_roots_fallback() {
        let mut config = Config::default();
        let bundled = PathBuf::from("/opt/templates");
        assert_eq!(config.local_roots(Some(&bundled)), vec![bundled.clone()]);
        assert!(config.local_roots(None).is_empty());

        config.templates.local = vec![PathBuf::from("/home/me/templates")];
        assert_eq!(
            config.local_roots(Some(&bundled)),
            vec![PathBuf::from("/home/me/templates")]
        );
    }
}
