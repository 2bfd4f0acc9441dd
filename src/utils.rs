// ABOUTME: Utility functions for the present-plus server
// ABOUTME: Provides path validation, normalization and content-type helpers

use crate::errors::{PresentError, Result};
use std::path::{Component, Path, PathBuf};

/// Validate that a directory exists
pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(PresentError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(PresentError::ValidationError(format!(
            "Path is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Get the absolute path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        PresentError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// Make `path` absolute against the working directory and drop `.`/`..`
/// lexically. Symlinks are left in place, so the ancestors are the ones the
/// path was reached through.
pub fn lexical_absolute_path(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut absolute = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                absolute.pop();
            }
            other => absolute.push(other.as_os_str()),
        }
    }
    Ok(absolute)
}

/// Reports whether `path` names an existing directory, swallowing errors.
pub fn is_dir(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Render a relative path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// True when `name` is usable as a single directory name: non-empty and
/// free of separators or `.`/`..`.
pub fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

/// Lowercased extension of `path` without the leading dot.
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Determine the content type for a file based on its extension
pub fn content_type(path: &Path) -> &'static str {
    match extension(path).as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        Some("txt") | Some("go") | Some("slide") | Some("article") => {
            "text/plain; charset=utf-8"
        }
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_components() {
        assert!(is_plain_component("corporate"));
        assert!(is_plain_component("dark-mode.v2"));
        assert!(!is_plain_component(""));
        assert!(!is_plain_component(".."));
        assert!(!is_plain_component("."));
        assert!(!is_plain_component("a/b"));
        assert!(!is_plain_component("/abs"));
    }

    #[cfg(unix)]
    #[test]
    fn lexical_absolute_resolves_dots_without_touching_the_filesystem() {
        let path = lexical_absolute_path(Path::new("/srv/talks/./2024/../plus/deck")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/talks/plus/deck"));

        let relative = lexical_absolute_path(Path::new("talks/../docs")).unwrap();
        assert_eq!(relative, std::env::current_dir().unwrap().join("docs"));
    }

    #[test]
    fn to_slash_drops_current_dir_markers() {
        assert_eq!(to_slash(Path::new("./talks/2024")), "talks/2024");
        assert_eq!(to_slash(Path::new(".")), "");
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type(Path::new("a/b.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("deck.pdf")), "application/pdf");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
