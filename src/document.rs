// ABOUTME: Document model and the built-in present-format parser
// ABOUTME: Turns .slide and .article files into structured documents for the templates

use crate::errors::{PresentError, Result};
use crate::utils;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Extension of slide decks.
pub const SLIDE_EXT: &str = "slide";
/// Extension of articles.
pub const ARTICLE_EXT: &str = "article";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Slide,
    Article,
}

impl DocKind {
    /// Kind for a path, by extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match utils::extension(path).as_deref() {
            Some(SLIDE_EXT) => Some(DocKind::Slide),
            Some(ARTICLE_EXT) => Some(DocKind::Article),
            _ => None,
        }
    }
}

/// Reports whether `path` names a renderable document.
pub fn is_doc(path: &Path) -> bool {
    DocKind::from_path(path).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Full,
    /// Stop once the title is known; used for directory listings.
    TitlesOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// Markdown source of the section body.
    pub body: String,
}

/// A parsed presentation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doc {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub kind: DocKind,
    pub theme: Option<String>,
    pub article_stylesheets: Vec<String>,
    pub slide_stylesheets: Vec<String>,
    pub hide_last_slide: Option<bool>,
    pub closing_message: Option<String>,
    pub sections: Vec<Section>,
}

impl Doc {
    pub fn new(title: &str, kind: DocKind) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            authors: Vec::new(),
            kind,
            theme: None,
            article_stylesheets: Vec::new(),
            slide_stylesheets: Vec::new(),
            hide_last_slide: None,
            closing_message: None,
            sections: Vec::new(),
        }
    }

    /// The stylesheets that apply to this document's own kind.
    pub fn own_stylesheets(&self) -> &[String] {
        match self.kind {
            DocKind::Slide => &self.slide_stylesheets,
            DocKind::Article => &self.article_stylesheets,
        }
    }
}

/// Turns a document file into a [`Doc`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, path: &Path, mode: ParseMode) -> Result<Doc>;
}

/// Parser for the present format:
///
/// ```text
/// Title
/// Optional subtitle
/// Theme: corporate
/// SlideStylesheet: local.css
/// Author Name
///
/// * First section
/// Markdown body
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct PresentParser;

impl DocumentParser for PresentParser {
    fn parse(&self, path: &Path, mode: ParseMode) -> Result<Doc> {
        let kind = DocKind::from_path(path).ok_or_else(|| {
            PresentError::ValidationError(format!("Not a document: {:?}", path))
        })?;
        let source = match mode {
            ParseMode::Full => fs::read_to_string(path)?,
            ParseMode::TitlesOnly => read_title_lines(path)?,
        };
        parse_source(&source, path, kind, mode)
    }
}

/// Read up to and including the title line. Bytes that are not UTF-8 are
/// replaced rather than failing the read.
fn read_title_lines(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut text = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let decoded = String::from_utf8_lossy(&line);
        text.push_str(&decoded);
        if !decoded.trim().is_empty() && !decoded.starts_with("//") {
            break;
        }
    }
    Ok(text)
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> PresentError {
    PresentError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Parse document text. `path` is only used for error messages.
pub fn parse_source(source: &str, path: &Path, kind: DocKind, mode: ParseMode) -> Result<Doc> {
    let mut lines = source.lines().enumerate().peekable();

    // Leading blank lines and comments are not part of the title.
    while let Some((_, line)) = lines.peek() {
        if line.trim().is_empty() || line.starts_with("//") {
            lines.next();
        } else {
            break;
        }
    }
    let title = match lines.next() {
        Some((_, line)) if !line.trim_start().starts_with("* ") => line.trim().to_string(),
        Some((n, _)) => return Err(parse_error(path, n + 1, "missing title")),
        None => return Err(parse_error(path, 1, "missing title")),
    };

    let mut doc = Doc::new(&title, kind);
    if mode == ParseMode::TitlesOnly {
        return Ok(doc);
    }

    let mut subtitle_allowed = true;
    let mut current: Option<Section> = None;
    for (n, line) in lines {
        if let Some(heading) = line.strip_prefix("* ") {
            if let Some(section) = current.take() {
                doc.sections.push(finish_section(section));
            }
            current = Some(Section {
                title: heading.trim().to_string(),
                body: String::new(),
            });
            continue;
        }

        if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            subtitle_allowed = false;
            continue;
        }
        if !apply_header(&mut doc, trimmed).map_err(|msg| parse_error(path, n + 1, msg))? {
            if subtitle_allowed && doc.subtitle.is_none() {
                doc.subtitle = Some(trimmed.to_string());
            } else {
                doc.authors.push(trimmed.to_string());
            }
        }
        subtitle_allowed = false;
    }
    if let Some(section) = current.take() {
        doc.sections.push(finish_section(section));
    }

    Ok(doc)
}

fn finish_section(mut section: Section) -> Section {
    section.body = section.body.trim_matches('\n').to_string();
    section
}

/// Apply a `Key: value` header line. Returns `Ok(false)` when the line is not
/// a recognised header.
fn apply_header(doc: &mut Doc, line: &str) -> std::result::Result<bool, String> {
    let Some((key, value)) = line.split_once(':') else {
        return Ok(false);
    };
    let value = value.trim();
    match key.trim().to_ascii_lowercase().as_str() {
        "theme" => doc.theme = Some(value.to_string()).filter(|v| !v.is_empty()),
        "slidestylesheet" => doc.slide_stylesheets.push(value.to_string()),
        "articlestylesheet" => doc.article_stylesheets.push(value.to_string()),
        "hidelastslide" => {
            doc.hide_last_slide = match value.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                other => return Err(format!("HideLastSlide must be true or false, got {:?}", other)),
            }
        }
        "closingmessage" => {
            doc.closing_message = Some(value.to_string()).filter(|v| !v.is_empty())
        }
        _ => return Ok(false),
    }
    Ok(true)
}
