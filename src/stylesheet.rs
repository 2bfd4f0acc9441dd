// ABOUTME: Stylesheet references for documents, themes and listings
// ABOUTME: Classifies rooted/remote/theme-relative entries and merges lists theme-first

use log::debug;

/// A stylesheet entry as written in a theme descriptor or a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetRef {
    pub path: String,
    pub is_remote: bool,
}

impl StylesheetRef {
    /// Create a new StylesheetRef from a path string.
    /// The path can be a server path (`/static/a.css`), a URL, or a path
    /// relative to the folder that declared it.
    pub fn new(path: &str) -> Self {
        let is_remote = path.starts_with("//") || path.contains("://");
        Self {
            path: path.to_string(),
            is_remote,
        }
    }

    /// Remote URLs and server-rooted paths are used as written.
    pub fn is_absolute(&self) -> bool {
        self.is_remote || self.path.starts_with('/')
    }

    /// Point a theme-relative entry into the staged copy of the theme.
    pub fn rebase(&self, public_dir: &str) -> String {
        if self.is_absolute() {
            return self.path.clone();
        }
        let relative = self.path.trim_start_matches("./");
        format!("{}/{}", public_dir.trim_end_matches('/'), relative)
    }
}

/// Rewrite a theme's stylesheet list so relative entries resolve inside
/// the staging directory. Empty entries are dropped.
pub fn rebase_all(entries: &[String], public_dir: &str) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| {
            let keep = !entry.trim().is_empty();
            if !keep {
                debug!("Dropping empty stylesheet entry");
            }
            keep
        })
        .map(|entry| StylesheetRef::new(entry.trim()).rebase(public_dir))
        .collect()
}

/// Theme stylesheets first, then the ones declared by the document or
/// directory itself, so the latter win in the cascade.
pub fn merge(theme: &[String], own: &[String]) -> Vec<String> {
    theme.iter().chain(own.iter()).cloned().collect()
}
