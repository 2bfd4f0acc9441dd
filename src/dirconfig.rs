// ABOUTME: Per-directory listing overrides read from plus-config.json
// ABOUTME: Looked up before a directory is enumerated; absence or bad JSON means no override

use crate::errors::{PresentError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

/// Name of the override file inside a content directory.
pub const DIR_CONFIG_FILE: &str = "plus-config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoryConfig {
    pub title: Option<String>,
    pub theme: Option<String>,
    pub hide_path: bool,
    pub hide_file_name: bool,
}

impl DirectoryConfig {
    /// Read the override file of `dir`, if there is a usable one.
    pub fn load(dir: &Path) -> Option<Self> {
        let path = dir.join(DIR_CONFIG_FILE);
        match Self::from_file(&path) {
            Ok(config) => {
                debug!("Using directory config {:?}", path);
                Some(config)
            }
            Err(PresentError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Error reading directory config file {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: DirectoryConfig = serde_json::from_str(&raw)?;
        Ok(Self {
            title: config.title.filter(|t| !t.is_empty()),
            theme: config.theme.filter(|t| !t.is_empty()),
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn absent_file_is_no_override() {
        let dir = TempDir::new().unwrap();
        assert!(DirectoryConfig::load(dir.path()).is_none());
    }

    #[test]
    fn malformed_file_is_no_override() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DIR_CONFIG_FILE), "{\"title\": ").unwrap();
        assert!(DirectoryConfig::load(dir.path()).is_none());
    }

    #[test]
    fn reads_all_fields_and_blanks_are_unset() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DIR_CONFIG_FILE),
            r#"{"title": "Team talks", "theme": "", "hidePath": true, "hideFileName": true}"#,
        )
        .unwrap();

        let config = DirectoryConfig::load(dir.path()).unwrap();
        assert_eq!(config.title.as_deref(), Some("Team talks"));
        assert!(config.theme.is_none());
        assert!(config.hide_path);
        assert!(config.hide_file_name);
    }
}
