// ABOUTME: Configuration module for the present-plus server
// ABOUTME: Layers defaults, the JSON config file, environment variables and CLI flags

use crate::errors::{PresentError, Result};
use crate::staging::StagingPolicy;
use crate::utils;
use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name of the shared theme repository looked up next to the base path.
pub const SIBLING_REPO_NAME: &str = "present-plus-themes";

/// Global configuration for the server
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// HTTP service address, e.g. `127.0.0.1:4999`
    pub http: String,
    /// Base path for templates and static resources
    pub base: PathBuf,
    /// Root of the served document tree
    pub content: PathBuf,
    /// Theme applied when a document or directory does not pick one
    pub theme: Option<String>,
    /// Shared theme repository
    pub repo: Option<PathBuf>,
    /// Title of directory listings without an override
    pub title: String,
    /// Stage each theme once and reuse the copy across requests
    pub reuse_staging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: "127.0.0.1:4999".to_string(),
            base: PathBuf::from("."),
            content: PathBuf::from("."),
            theme: None,
            repo: None,
            title: "Talks".to_string(),
            reuse_staging: false,
        }
    }
}

impl Config {
    /// Location of the per-user config file, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        if cfg!(windows) {
            Some(home.join("ppconfig.json"))
        } else {
            Some(home.join(".ppconfig"))
        }
    }

    /// Read a JSON config file. Fields missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            PresentError::ConfigError(format!("Unable to parse config file {:?}: {}", path, e))
        })?;
        Ok(config.normalized())
    }

    /// Load configuration: defaults, then the config file (when present),
    /// then `PRESENT_*` environment variables.
    ///
    /// An explicitly requested file must exist; the per-user default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => {
                    info!("Reading config file {:?}", path);
                    Self::from_file(&path)?
                }
                _ => {
                    debug!("No config file found, using default settings");
                    Self::default()
                }
            },
        };
        Ok(config.with_env(|key| env::var(key).ok()))
    }

    /// Override fields from environment-style lookups.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(http) = lookup("PRESENT_HTTP") {
            self.http = http;
        }
        if let Some(base) = lookup("PRESENT_BASE") {
            self.base = PathBuf::from(base);
        }
        if let Some(content) = lookup("PRESENT_CONTENT") {
            self.content = PathBuf::from(content);
        }
        if let Some(theme) = lookup("PRESENT_THEME") {
            self.theme = Some(theme);
        }
        if let Some(repo) = lookup("PRESENT_REPO") {
            self.repo = Some(PathBuf::from(repo));
        }
        if let Some(title) = lookup("PRESENT_TITLE") {
            self.title = title;
        }
        if let Some(reuse) = lookup("PRESENT_REUSE_STAGING") {
            self.reuse_staging = reuse.to_lowercase() == "true";
        }
        self.normalized()
    }

    /// Empty strings mean "unset" in every layer.
    fn normalized(mut self) -> Self {
        self.theme = self.theme.filter(|t| !t.trim().is_empty());
        self.repo = self.repo.filter(|r| !r.as_os_str().is_empty());
        self
    }

    /// Check the paths the server cannot run without, and fill in the
    /// sibling theme repository when none is configured.
    pub fn validate(mut self) -> Result<Self> {
        utils::validate_directory_exists(&self.base)?;
        utils::validate_directory_exists(&self.content)?;

        match &self.repo {
            Some(repo) => {
                if !repo.is_dir() {
                    return Err(PresentError::ConfigError(format!(
                        "Repo directory {:?} does not exist",
                        repo
                    )));
                }
            }
            None => {
                let sibling = self.base.join("..").join(SIBLING_REPO_NAME);
                if sibling.is_dir() {
                    info!("Using theme repository {:?}", sibling);
                    self.repo = utils::get_absolute_path(&sibling).ok();
                }
            }
        }
        Ok(self)
    }

    /// Directory served under `/static/`.
    pub fn static_root(&self) -> PathBuf {
        self.base.join("static")
    }

    /// Built-in themes shipped with the resources.
    pub fn builtin_themes(&self) -> PathBuf {
        self.static_root().join("themes")
    }

    /// Where staged theme copies are written.
    pub fn staging_root(&self) -> PathBuf {
        self.static_root().join("tmp")
    }

    pub fn staging_policy(&self) -> StagingPolicy {
        if self.reuse_staging {
            StagingPolicy::Reuse
        } else {
            StagingPolicy::PerResolution
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ppconfig.json");
        fs::write(&path, r#"{"http": "0.0.0.0:8080", "theme": "corporate"}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.http, "0.0.0.0:8080");
        assert_eq!(config.theme.as_deref(), Some("corporate"));
        assert_eq!(config.title, "Talks");
        assert!(config.repo.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ppconfig.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(PresentError::ConfigError(_))
        ));
    }

    #[test]
    fn env_overrides_and_empty_theme_is_unset() {
        let vars: HashMap<&str, &str> = [
            ("PRESENT_THEME", ""),
            ("PRESENT_TITLE", "Conference"),
            ("PRESENT_REUSE_STAGING", "TRUE"),
        ]
        .into_iter()
        .collect();
        let config = Config {
            theme: Some("old".to_string()),
            ..Config::default()
        }
        .with_env(|key| vars.get(key).map(|v| v.to_string()));

        assert!(config.theme.is_none());
        assert_eq!(config.title, "Conference");
        assert_eq!(config.staging_policy(), StagingPolicy::Reuse);
    }

    #[test]
    fn validate_rejects_missing_repo() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            base: dir.path().to_path_buf(),
            content: dir.path().to_path_buf(),
            repo: Some(dir.path().join("missing")),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(PresentError::ConfigError(_))));
    }

    #[test]
    fn validate_picks_up_sibling_repo() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("present-plus");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(dir.path().join(SIBLING_REPO_NAME)).unwrap();

        let config = Config {
            base: base.clone(),
            content: base,
            ..Config::default()
        }
        .validate()
        .unwrap();
        let repo = config.repo.expect("sibling repo should be used");
        assert!(repo.ends_with(SIBLING_REPO_NAME));
    }
}
