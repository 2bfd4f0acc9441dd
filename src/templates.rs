// ABOUTME: Built-in HTML templates for documents and directory listings
// ABOUTME: Renders slide decks, articles and listings with maud and comrak

use crate::document::{Doc, ARTICLE_EXT, SLIDE_EXT};
use crate::errors::{PresentError, Result};
use crate::listing::{DirEntry, DirectoryListing};
use crate::utils;
use comrak::{markdown_to_html, ComrakOptions};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::collections::HashMap;
use std::path::Path;

/// Closing slide text when neither the document nor its theme sets one.
pub const DEFAULT_CLOSING_MESSAGE: &str = "Thank You";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTemplate {
    Slides,
    Article,
}

/// Document templates keyed by file extension, plus the listing template.
pub struct TemplateSet {
    documents: HashMap<String, DocumentTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let mut documents = HashMap::new();
        documents.insert(SLIDE_EXT.to_string(), DocumentTemplate::Slides);
        documents.insert(ARTICLE_EXT.to_string(), DocumentTemplate::Article);
        Self { documents }
    }
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template registered for the extension of `path`.
    pub fn for_path(&self, path: &Path) -> Option<DocumentTemplate> {
        utils::extension(path).and_then(|ext| self.documents.get(&ext).copied())
    }

    pub fn render_document(&self, path: &Path, doc: &Doc) -> Result<String> {
        let template = self
            .for_path(path)
            .ok_or_else(|| PresentError::MissingTemplate(path.to_path_buf()))?;
        let markup = match template {
            DocumentTemplate::Slides => slides(doc),
            DocumentTemplate::Article => article(doc),
        };
        Ok(markup.into_string())
    }

    pub fn render_listing(&self, listing: &DirectoryListing) -> Result<String> {
        Ok(directory(listing).into_string())
    }
}

/// Characters escaped inside one path segment of a link.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Server-rooted link to a forward-slash content path.
fn href(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .fold(String::new(), |mut link, segment| {
            link.push('/');
            link.push_str(&segment);
            link
        })
}

fn markdown(body: &str) -> PreEscaped<String> {
    let mut options = ComrakOptions::default();
    options.render.unsafe_ = true; // Allow raw HTML
    options.extension.table = true;
    options.extension.strikethrough = true;
    PreEscaped(markdown_to_html(body, &options))
}

fn head(title: &str, base_css: &str, stylesheets: &[String]) -> Markup {
    html! {
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            title { (title) }
            link rel="stylesheet" href=(base_css);
            @for href in stylesheets {
                link rel="stylesheet" href=(href);
            }
        }
    }
}

fn byline(doc: &Doc) -> Markup {
    html! {
        @for author in &doc.authors {
            p.author { (author) }
        }
    }
}

fn slides(doc: &Doc) -> Markup {
    let hide_last = doc.hide_last_slide.unwrap_or(false);
    let closing = doc
        .closing_message
        .as_deref()
        .unwrap_or(DEFAULT_CLOSING_MESSAGE);
    html! {
        (DOCTYPE)
        html lang="en" {
            (head(&doc.title, "/static/slides.css", &doc.slide_stylesheets))
            body {
                section.slides {
                    article.title {
                        h1 { (doc.title) }
                        @if let Some(subtitle) = &doc.subtitle {
                            h3 { (subtitle) }
                        }
                        (byline(doc))
                    }
                    @for section in &doc.sections {
                        article {
                            @if !section.title.is_empty() {
                                h3 { (section.title) }
                            }
                            (markdown(&section.body))
                        }
                    }
                    @if !hide_last {
                        article.closing {
                            h3 { (closing) }
                            (byline(doc))
                        }
                    }
                }
                script src="/static/slides.js" {}
            }
        }
    }
}

fn article(doc: &Doc) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            (head(&doc.title, "/static/article.css", &doc.article_stylesheets))
            body {
                div.wrap {
                    h1 { (doc.title) }
                    @if let Some(subtitle) = &doc.subtitle {
                        h2.subtitle { (subtitle) }
                    }
                    (byline(doc))
                    @for section in &doc.sections {
                        h2 { (section.title) }
                        (markdown(&section.body))
                    }
                }
            }
        }
    }
}

fn documents(heading: &str, entries: &[DirEntry]) -> Markup {
    html! {
        @if !entries.is_empty() {
            h4 { (heading) }
            dl {
                @for entry in entries {
                    dd {
                        a href=(href(&entry.path)) {
                            @if entry.title.is_empty() { (entry.name) } @else { (entry.title) }
                        }
                        @if entry.show_file_name && !entry.title.is_empty() {
                            ": " (entry.name)
                        }
                    }
                }
            }
        }
    }
}

fn directory(listing: &DirectoryListing) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            (head(&listing.title, "/static/dir.css", &listing.stylesheets))
            body {
                div #topbar {
                    div.container { (listing.title) }
                }
                div #page {
                    div.container {
                        @if !listing.path.is_empty() {
                            h1 { "/" (listing.path) }
                        }
                        @if !listing.dirs.is_empty() {
                            h4 { "Sub-directories:" }
                            dl {
                                @for entry in &listing.dirs {
                                    dd { a href=(href(&entry.path)) { (entry.name) } }
                                }
                            }
                        }
                        (documents("Slide decks:", &listing.slides))
                        (documents("Articles:", &listing.articles))
                        @if !listing.other.is_empty() {
                            h4 { "Files:" }
                            dl {
                                @for entry in &listing.other {
                                    dd { a href=(href(&entry.path)) { (entry.name) } }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
