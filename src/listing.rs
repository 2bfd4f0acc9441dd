// ABOUTME: Directory listings for the present-plus server
// ABOUTME: Classifies entries, applies per-directory overrides and themes, and renders the index page

use crate::dirconfig::{DirectoryConfig, DIR_CONFIG_FILE};
use crate::document::{DocKind, DocumentParser, ParseMode};
use crate::errors::Result;
use crate::stylesheet;
use crate::templates::TemplateSet;
use crate::theme::{ThemeLoader, THEME_COLLECTION};
use crate::utils;
use log::{debug, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory skipped when listing the root of the content tree.
pub const INTERNAL_ROOT_DIR: &str = "vendor";

/// Support folder of the document parser, never listed.
pub const PARSER_SUPPORT_DIR: &str = "present";

/// Extensions listed under "other" besides the document extensions.
const OTHER_EXTENSIONS: &[&str] = &["pdf", "html", "go"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    /// Forward-slash path relative to the content root.
    pub path: String,
    /// Parsed title; documents only.
    pub title: String,
    pub show_file_name: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub title: String,
    pub stylesheets: Vec<String>,
    /// Empty for the content root or when hidden by the directory config.
    pub path: String,
    pub dirs: Vec<DirEntry>,
    pub slides: Vec<DirEntry>,
    pub articles: Vec<DirEntry>,
    pub other: Vec<DirEntry>,
}

/// Reports whether a subdirectory should appear in a listing.
pub fn show_dir(name: &str) -> bool {
    !(name.starts_with('.')
        || name.starts_with('_')
        || name == PARSER_SUPPORT_DIR
        || name == THEME_COLLECTION)
}

/// Reports whether a non-directory entry should appear under "other".
pub fn show_file(name: &str) -> bool {
    let path = Path::new(name);
    match utils::extension(path) {
        Some(ext) if OTHER_EXTENSIONS.contains(&ext.as_str()) => true,
        _ => DocKind::from_path(path).is_some(),
    }
}

pub struct DirectoryLister {
    content_root: PathBuf,
    default_title: String,
    default_theme: Option<String>,
    themes: Arc<ThemeLoader>,
    parser: Arc<dyn DocumentParser>,
    templates: Arc<TemplateSet>,
}

impl DirectoryLister {
    pub fn new(
        content_root: impl Into<PathBuf>,
        themes: Arc<ThemeLoader>,
        parser: Arc<dyn DocumentParser>,
        templates: Arc<TemplateSet>,
    ) -> Self {
        Self {
            content_root: content_root.into(),
            default_title: "Talks".to_string(),
            default_theme: None,
            themes,
            parser,
            templates,
        }
    }

    /// Listing title and theme used when a directory has no override.
    pub fn with_defaults(mut self, title: &str, theme: Option<String>) -> Self {
        self.default_title = title.to_string();
        self.default_theme = theme;
        self
    }

    /// Render the listing of `dir` into `out`.
    ///
    /// Returns `Ok(false)` without writing anything when `dir` is not a directory.
    pub fn list<W: Write>(&self, dir: &Path, out: &mut W) -> Result<bool> {
        let Some(listing) = self.build(dir)? else {
            return Ok(false);
        };
        let html = self.templates.render_listing(&listing)?;
        out.write_all(html.as_bytes())?;
        Ok(true)
    }

    /// Assemble the listing model for `dir`, or `None` if it is not a directory.
    pub fn build(&self, dir: &Path) -> Result<Option<DirectoryListing>> {
        match fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let rel = utils::to_slash(dir.strip_prefix(&self.content_root).unwrap_or(dir));
        let is_root = rel.is_empty();
        let config = DirectoryConfig::load(dir).unwrap_or_default();

        let mut listing = DirectoryListing {
            title: config
                .title
                .clone()
                .unwrap_or_else(|| self.default_title.clone()),
            path: rel.clone(),
            ..DirectoryListing::default()
        };

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error reading directory {:?}: {}", dir, e);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == DIR_CONFIG_FILE || (is_root && name == INTERNAL_ROOT_DIR) {
                continue;
            }

            let item = DirEntry {
                path: if is_root {
                    name.clone()
                } else {
                    format!("{}/{}", rel, name)
                },
                name,
                title: String::new(),
                show_file_name: true,
            };

            if entry.path().is_dir() {
                if show_dir(&item.name) {
                    listing.dirs.push(item);
                }
                continue;
            }

            match DocKind::from_path(&entry.path()) {
                Some(kind) => {
                    let item = self.with_title(item, &entry.path());
                    match kind {
                        DocKind::Slide => listing.slides.push(item),
                        DocKind::Article => listing.articles.push(item),
                    }
                }
                None if show_file(&item.name) => listing.other.push(item),
                None => debug!("Not listing {:?}", entry.path()),
            }
        }

        if let Some(name) = config.theme.as_ref().or(self.default_theme.as_ref()) {
            if let Some(loaded) = self.themes.load(dir, name) {
                listing.stylesheets =
                    stylesheet::merge(&loaded.theme.directory_stylesheets, &listing.stylesheets);
            }
        }

        if config.hide_path {
            listing.path.clear();
        }
        if config.hide_file_name {
            for item in listing.slides.iter_mut().chain(listing.articles.iter_mut()) {
                item.show_file_name = false;
            }
        }

        for group in [
            &mut listing.dirs,
            &mut listing.slides,
            &mut listing.articles,
            &mut listing.other,
        ] {
            group.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Ok(Some(listing))
    }

    fn with_title(&self, mut item: DirEntry, path: &Path) -> DirEntry {
        match self.parser.parse(path, ParseMode::TitlesOnly) {
            Ok(doc) => item.title = doc.title,
            Err(e) => warn!("{}", e),
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_visibility() {
        assert!(show_dir("demos"));
        assert!(!show_dir(".git"));
        assert!(!show_dir("_drafts"));
        assert!(!show_dir("present"));
        assert!(!show_dir("plus-themes"));
    }

    #[test]
    fn file_visibility() {
        assert!(show_file("handout.pdf"));
        assert!(show_file("demo.go"));
        assert!(show_file("index.HTML"));
        assert!(show_file("intro.slide"));
        assert!(!show_file("notes.txt"));
        assert!(!show_file("Makefile"));
    }
}
