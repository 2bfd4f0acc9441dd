// ABOUTME: Theme lookup and loading for the present-plus server
// ABOUTME: Resolves theme folders across search locations and decodes their descriptors

use crate::errors::Result;
use crate::staging::AssetStager;
use crate::stylesheet;
use crate::utils;
use log::{debug, info, warn};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name searched for in every ancestor of a document.
pub const THEME_COLLECTION: &str = "plus-themes";

/// Descriptor file inside every theme folder.
pub const THEME_DESCRIPTOR: &str = "theme.json";

/// Contents of a theme's `theme.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Theme {
    pub directory_stylesheets: Vec<String>,
    pub article_stylesheets: Vec<String>,
    pub slide_stylesheets: Vec<String>,
    #[serde(deserialize_with = "flag_or_string")]
    pub hide_last_slide: Option<bool>,
    pub closing_message: Option<String>,
}

/// Older descriptors spell the flag as `"true"`/`"false"`.
fn flag_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Flag(flag)) => Ok(Some(flag)),
        Some(Raw::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::custom(format!(
                "hide-last-slide must be true or false, got {:?}",
                other
            ))),
        },
    }
}

impl Theme {
    /// Decode a theme descriptor file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Point relative stylesheet entries at the staged copy of the theme.
    pub fn rebased(self, public_dir: &str) -> Self {
        Self {
            directory_stylesheets: stylesheet::rebase_all(&self.directory_stylesheets, public_dir),
            article_stylesheets: stylesheet::rebase_all(&self.article_stylesheets, public_dir),
            slide_stylesheets: stylesheet::rebase_all(&self.slide_stylesheets, public_dir),
            ..self
        }
    }
}

/// Finds theme folders. First match wins:
/// 1. `plus-themes/<name>` in the start directory or any of its ancestors
/// 2. `<name>` in the shared theme repository
/// 3. `<name>` in the built-in themes folder
pub struct ThemeResolver {
    repo: Option<PathBuf>,
    builtin: PathBuf,
}

impl ThemeResolver {
    pub fn new(builtin: impl Into<PathBuf>) -> Self {
        Self {
            repo: None,
            builtin: builtin.into(),
        }
    }

    pub fn with_repo(mut self, repo: Option<PathBuf>) -> Self {
        self.repo = repo;
        self
    }

    pub fn resolve(&self, start_dir: &Path, name: &str) -> Option<PathBuf> {
        if !utils::is_plain_component(name) {
            warn!("Ignoring invalid theme name {:?}", name);
            return None;
        }

        let start = utils::lexical_absolute_path(start_dir).unwrap_or_else(|e| {
            warn!("{}", e);
            start_dir.to_path_buf()
        });

        let mut looked_in = Vec::new();
        for dir in start.ancestors() {
            let collection = dir.join(THEME_COLLECTION);
            let candidate = collection.join(name);
            looked_in.push(collection);
            if utils::is_dir(&candidate) {
                debug!("Theme {:?} found at {:?}", name, candidate);
                return Some(candidate);
            }
        }

        if let Some(repo) = &self.repo {
            let candidate = repo.join(name);
            looked_in.push(repo.clone());
            if utils::is_dir(&candidate) {
                debug!("Theme {:?} found in repository at {:?}", name, candidate);
                return Some(candidate);
            }
        }

        let candidate = self.builtin.join(name);
        looked_in.push(self.builtin.clone());
        if utils::is_dir(&candidate) {
            debug!("Theme {:?} found in built-in themes at {:?}", name, candidate);
            return Some(candidate);
        }

        let locations: String = looked_in
            .iter()
            .map(|path| format!("\n  {}", path.display()))
            .collect();
        warn!(
            "Theme folder {:?} could not be found at any of the following locations:{}",
            name, locations
        );
        None
    }
}

/// A theme ready to apply: stylesheets already point into the staging directory.
#[derive(Debug, Clone)]
pub struct LoadedTheme {
    pub theme: Theme,
    pub staging_path: String,
    pub source: PathBuf,
}

/// Resolves, stages and decodes themes.
pub struct ThemeLoader {
    resolver: ThemeResolver,
    stager: AssetStager,
}

impl ThemeLoader {
    pub fn new(resolver: ThemeResolver, stager: AssetStager) -> Self {
        Self { resolver, stager }
    }

    pub fn stager(&self) -> &AssetStager {
        &self.stager
    }

    /// Load theme `name` as seen from `dir`. Every failure is logged and
    /// reported as `None`, leaving the caller unthemed.
    pub fn load(&self, dir: &Path, name: &str) -> Option<LoadedTheme> {
        let source = self.resolver.resolve(dir, name)?;

        let staging_path = match self.stager.stage(&source) {
            Ok(path) => path,
            Err(e) => {
                warn!("Error staging theme {:?}: {}", name, e);
                return None;
            }
        };

        let descriptor = source.join(THEME_DESCRIPTOR);
        let theme = match Theme::from_file(&descriptor) {
            Ok(theme) => theme,
            Err(e) => {
                warn!("Error reading theme file {:?}: {}", descriptor, e);
                return None;
            }
        };

        info!("Applying theme {:?} staged at {}", name, staging_path);
        Some(LoadedTheme {
            theme: theme.rebased(&staging_path),
            staging_path,
            source,
        })
    }
}
