// ABOUTME: Document rendering for the present-plus server
// ABOUTME: Parses a document, overlays its theme and executes the template for its extension

use crate::document::{Doc, DocumentParser, ParseMode};
use crate::errors::Result;
use crate::stylesheet;
use crate::templates::TemplateSet;
use crate::theme::{Theme, ThemeLoader};
use log::{debug, info};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub struct DocumentRenderer {
    default_theme: Option<String>,
    themes: Arc<ThemeLoader>,
    parser: Arc<dyn DocumentParser>,
    templates: Arc<TemplateSet>,
}

impl DocumentRenderer {
    pub fn new(
        themes: Arc<ThemeLoader>,
        parser: Arc<dyn DocumentParser>,
        templates: Arc<TemplateSet>,
    ) -> Self {
        Self {
            default_theme: None,
            themes,
            parser,
            templates,
        }
    }

    /// Theme applied to documents that neither name a theme nor style themselves.
    pub fn with_default_theme(mut self, theme: Option<String>) -> Self {
        self.default_theme = theme;
        self
    }

    pub fn themes(&self) -> &ThemeLoader {
        &self.themes
    }

    /// Render the document at `path` into `out`. Parse and template errors
    /// are returned; a theme that cannot be loaded only leaves the document unthemed.
    pub fn render<W: Write>(&self, path: &Path, out: &mut W) -> Result<()> {
        let doc = self.prepare(path)?;
        let html = self.templates.render_document(path, &doc)?;
        out.write_all(html.as_bytes())?;
        Ok(())
    }

    /// Parse `path` and merge its effective theme into the document model.
    pub fn prepare(&self, path: &Path) -> Result<Doc> {
        info!("Rendering {:?}", path);
        let mut doc = self.parser.parse(path, ParseMode::Full)?;

        if doc.theme.is_none() && doc.own_stylesheets().is_empty() {
            doc.theme = self.default_theme.clone();
        }

        if let Some(name) = doc.theme.clone() {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            match self.themes.load(dir, &name) {
                Some(loaded) => apply_theme(&mut doc, &loaded.theme),
                None => debug!("Rendering {:?} without theme {:?}", path, name),
            }
        }

        Ok(doc)
    }
}

/// Theme stylesheets go first; flags and messages only fill what the
/// document left unset.
pub fn apply_theme(doc: &mut Doc, theme: &Theme) {
    doc.article_stylesheets = stylesheet::merge(&theme.article_stylesheets, &doc.article_stylesheets);
    doc.slide_stylesheets = stylesheet::merge(&theme.slide_stylesheets, &doc.slide_stylesheets);
    if doc.hide_last_slide.is_none() {
        doc.hide_last_slide = theme.hide_last_slide;
    }
    if doc.closing_message.is_none() {
        doc.closing_message = theme.closing_message.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocKind;

    #[test]
    fn document_values_win_over_theme() {
        let mut doc = Doc::new("Deck", DocKind::Slide);
        doc.slide_stylesheets = vec!["mine.css".into()];
        doc.hide_last_slide = Some(false);
        doc.closing_message = Some("Cheers".into());

        let theme = Theme {
            slide_stylesheets: vec!["/static/tmp/3/a.css".into(), "/static/tmp/3/b.css".into()],
            article_stylesheets: vec!["/static/tmp/3/article.css".into()],
            hide_last_slide: Some(true),
            closing_message: Some("Thanks!".into()),
            ..Theme::default()
        };
        apply_theme(&mut doc, &theme);

        assert_eq!(
            doc.slide_stylesheets,
            vec!["/static/tmp/3/a.css", "/static/tmp/3/b.css", "mine.css"]
        );
        assert_eq!(doc.article_stylesheets, vec!["/static/tmp/3/article.css"]);
        assert_eq!(doc.hide_last_slide, Some(false));
        assert_eq!(doc.closing_message.as_deref(), Some("Cheers"));
    }

    #[test]
    fn theme_fills_unset_values() {
        let mut doc = Doc::new("Deck", DocKind::Slide);
        let theme = Theme {
            hide_last_slide: Some(true),
            closing_message: Some("Thanks!".into()),
            ..Theme::default()
        };
        apply_theme(&mut doc, &theme);
        assert_eq!(doc.hide_last_slide, Some(true));
        assert_eq!(doc.closing_message.as_deref(), Some("Thanks!"));
    }
}
