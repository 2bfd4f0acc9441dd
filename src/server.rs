// ABOUTME: HTTP front end of the present-plus server
// ABOUTME: Routes request paths to document rendering, directory listings or static files

use crate::config::Config;
use crate::document::{self, DocumentParser, PresentParser};
use crate::errors::{PresentError, Result};
use crate::listing::DirectoryLister;
use crate::render::DocumentRenderer;
use crate::staging::AssetStager;
use crate::templates::TemplateSet;
use crate::theme::{ThemeLoader, ThemeResolver};
use crate::utils;
use log::{debug, error, info};
use percent_encoding::percent_decode_str;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use url::Url;

/// URL prefix of the resource tree, and of staged themes below it.
pub const STATIC_PREFIX: &str = "static";
pub const STAGING_PUBLIC_PATH: &str = "/static/tmp";

/// A fully buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: message.as_bytes().to_vec(),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }
}

/// Turn the path of a request URL into a path relative to a served root.
///
/// Dot segments are resolved, percent escapes decoded, and anything that
/// would leave the root is rejected.
pub fn request_path(url: &str) -> Result<PathBuf> {
    if !url.starts_with('/') {
        return Err(PresentError::InvalidRequestPath(url.to_string()));
    }
    let parsed = Url::parse(&format!("http://localhost{}", url))
        .map_err(|e| PresentError::InvalidRequestPath(format!("{}: {}", url, e)))?;

    let mut rel = PathBuf::new();
    for segment in parsed.path_segments().into_iter().flatten() {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|e| PresentError::InvalidRequestPath(format!("{}: {}", url, e)))?;
        if decoded.is_empty() {
            continue;
        }
        if !utils::is_plain_component(&decoded) {
            return Err(PresentError::InvalidRequestPath(url.to_string()));
        }
        rel.push(&*decoded);
    }
    Ok(rel)
}

pub struct Dispatcher {
    content_root: PathBuf,
    static_root: PathBuf,
    renderer: DocumentRenderer,
    lister: DirectoryLister,
}

impl Dispatcher {
    pub fn new(
        content_root: impl Into<PathBuf>,
        static_root: impl Into<PathBuf>,
        renderer: DocumentRenderer,
        lister: DirectoryLister,
    ) -> Self {
        Self {
            content_root: content_root.into(),
            static_root: static_root.into(),
            renderer,
            lister,
        }
    }

    /// Wire up the theme loader, parser and templates described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let stager = AssetStager::new(config.staging_root(), STAGING_PUBLIC_PATH)
            .with_policy(config.staging_policy());
        let resolver = ThemeResolver::new(config.builtin_themes()).with_repo(config.repo.clone());
        let themes = Arc::new(ThemeLoader::new(resolver, stager));
        let parser: Arc<dyn DocumentParser> = Arc::new(PresentParser);
        let templates = Arc::new(TemplateSet::new());

        let renderer = DocumentRenderer::new(
            Arc::clone(&themes),
            Arc::clone(&parser),
            Arc::clone(&templates),
        )
        .with_default_theme(config.theme.clone());
        let lister = DirectoryLister::new(&config.content, themes, parser, templates)
            .with_defaults(&config.title, config.theme.clone());

        Self::new(&config.content, config.static_root(), renderer, lister)
    }

    /// Drop theme copies staged by earlier runs.
    pub fn reset_staging(&self) -> Result<()> {
        self.renderer.themes().stager().reset()
    }

    /// Answer a GET for `url`.
    pub fn handle(&self, url: &str) -> Reply {
        let rel = match request_path(url) {
            Ok(rel) => rel,
            Err(e) => {
                debug!("{}", e);
                return Reply::not_found();
            }
        };
        if rel.as_path() == Path::new("favicon.ico") {
            return Reply::not_found();
        }
        if let Ok(rest) = rel.strip_prefix(STATIC_PREFIX) {
            return serve_file(&self.static_root.join(rest));
        }

        let target = self.content_root.join(&rel);
        if document::is_doc(&target) && target.is_file() {
            let mut body = Vec::new();
            return match self.renderer.render(&target, &mut body) {
                Ok(()) => Reply::html(body),
                Err(e) => {
                    error!("Failed to render {:?}: {}", target, e);
                    Reply::text(500, &e.to_string())
                }
            };
        }

        let mut body = Vec::new();
        match self.lister.list(&target, &mut body) {
            Ok(true) => return Reply::html(body),
            Ok(false) => {}
            Err(e) => {
                error!("Failed to list {:?}: {}", target, e);
                return Reply::text(500, &e.to_string());
            }
        }

        serve_file(&target)
    }
}

fn serve_file(path: &Path) -> Reply {
    if !path.is_file() {
        return Reply::not_found();
    }
    match fs::read(path) {
        Ok(body) => Reply {
            status: 200,
            content_type: utils::content_type(path),
            body,
        },
        Err(e) => {
            error!("Failed to read file {:?}: {}", path, e);
            Reply::text(500, &format!("Failed to read file: {}", e))
        }
    }
}

/// Bind the HTTP listener.
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr)
        .map_err(|e| PresentError::ServerError(format!("Failed to start HTTP server on {}: {}", addr, e)))
}

/// Serve requests until the listener shuts down, one thread per request.
pub fn serve(server: Server, dispatcher: Arc<Dispatcher>) {
    match server.server_addr().to_ip() {
        Some(addr) => info!("Open your web browser and visit http://{}", addr),
        None => info!("Listening on {:?}", server.server_addr()),
    }

    for request in server.incoming_requests() {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || respond(&dispatcher, request));
    }
}

fn respond(dispatcher: &Dispatcher, request: Request) {
    let reply = match request.method() {
        Method::Get | Method::Head => dispatcher.handle(request.url()),
        _ => Reply::text(405, "405 Method Not Allowed"),
    };
    debug!("{} {} -> {}", request.method(), request.url(), reply.status);

    let mut response = Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        error!("Failed to send response: {}", e);
    }
}
