use present::server::{self, Dispatcher};
use present::Config;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).expect("Failed to write fixture");
}

/// Content tree plus a resource base with one built-in theme.
fn fixture() -> (TempDir, Config) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let content = tmp.path().join("content");
    let base = tmp.path().join("base");

    write(&content.join("talks/a.slide"), "Intro\n\n* Hello\nWorld\n");
    write(&content.join("talks/b.article"), "Deep Dive\n\n* Part one\ntext\n");
    write(&content.join("talks/handout.pdf"), "%PDF-1.4");
    write(
        &content.join("talks/themed.slide"),
        "Themed\nTheme: corporate\n\n* One\n",
    );
    write(&content.join("talks/broken.slide"), "Broken\nHideLastSlide: never\n");
    write(
        &content.join("plus-themes/corporate/theme.json"),
        r#"{"slide-stylesheets": ["corporate.css"]}"#,
    );
    write(
        &content.join("plus-themes/corporate/corporate.css"),
        "h1 { color: teal; }",
    );
    write(&base.join("static/slides.css"), "body { margin: 0; }");
    write(&tmp.path().join("secret.txt"), "top secret");

    let config = Config {
        base,
        content,
        ..Config::default()
    };
    (tmp, config)
}

fn body(reply: &present::Reply) -> String {
    String::from_utf8(reply.body.clone()).unwrap()
}

#[test]
fn test_favicon_is_not_found() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);
    assert_eq!(dispatcher.handle("/favicon.ico").status, 404);
}

#[test]
fn test_directory_listing() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);

    let reply = dispatcher.handle("/talks");
    assert_eq!(reply.status, 200);
    assert!(reply.content_type.starts_with("text/html"));
    let html = body(&reply);
    assert!(html.contains("Intro"));
    assert!(html.contains("Deep Dive"));
    assert!(html.contains("href=\"/talks/handout.pdf\""));
    assert!(html.find("a.slide").unwrap() < html.find("themed.slide").unwrap());

    let root = body(&dispatcher.handle("/"));
    assert!(root.contains("href=\"/talks\""));
    assert!(!root.contains("plus-themes"));
}

#[test]
fn test_document_render_with_staged_theme() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);

    let reply = dispatcher.handle("/talks/themed.slide");
    assert_eq!(reply.status, 200);
    let html = body(&reply);
    assert!(html.contains("<title>Themed</title>"));
    assert!(html.contains("/static/tmp/0/corporate.css"));

    let css = dispatcher.handle("/static/tmp/0/corporate.css");
    assert_eq!(css.status, 200);
    assert_eq!(css.content_type, "text/css; charset=utf-8");
    assert_eq!(body(&css), "h1 { color: teal; }");
}

#[test]
fn test_static_resources_and_files() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);

    let css = dispatcher.handle("/static/slides.css");
    assert_eq!(css.status, 200);
    assert_eq!(body(&css), "body { margin: 0; }");

    let pdf = dispatcher.handle("/talks/handout.pdf");
    assert_eq!(pdf.status, 200);
    assert_eq!(pdf.content_type, "application/pdf");

    assert_eq!(dispatcher.handle("/talks/missing.slide").status, 404);
    assert_eq!(dispatcher.handle("/nothing-here").status, 404);
}

#[test]
fn test_listing_links_resolve_for_reserved_characters() {
    let (_tmp, config) = fixture();
    write(&config.content.join("talks/notes #1?.pdf"), "%PDF-1.4 notes");
    let dispatcher = Dispatcher::from_config(&config);

    let listing = body(&dispatcher.handle("/talks"));
    let link = "/talks/notes%20%231%3F.pdf";
    assert!(listing.contains(&format!("href=\"{}\"", link)));

    let reply = dispatcher.handle(link);
    assert_eq!(reply.status, 200);
    assert_eq!(body(&reply), "%PDF-1.4 notes");
}

#[test]
fn test_paths_cannot_escape_the_content_root() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);

    assert_eq!(dispatcher.handle("/../secret.txt").status, 404);
    assert_eq!(dispatcher.handle("/%2e%2e/secret.txt").status, 404);
    assert_eq!(dispatcher.handle("/talks%2F..%2F..%2Fsecret.txt").status, 404);
}

#[test]
fn test_parse_error_is_a_server_error() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);

    let reply = dispatcher.handle("/talks/broken.slide");
    assert_eq!(reply.status, 500);
    assert!(body(&reply).contains("HideLastSlide"));
}

#[test]
fn test_reset_staging_clears_previous_copies() {
    let (_tmp, config) = fixture();
    let dispatcher = Dispatcher::from_config(&config);
    dispatcher.handle("/talks/themed.slide");
    let staged: PathBuf = config.staging_root().join("0");
    assert!(staged.is_dir());

    dispatcher.reset_staging().unwrap();
    assert!(!config.staging_root().exists());
}

fn http(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).expect("Failed to connect");
    stream.write_all(request.as_bytes()).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_live_server_answers_requests() {
    let (_tmp, config) = fixture();
    let listener = server::bind("127.0.0.1:0").unwrap();
    let addr = listener.server_addr().to_ip().expect("tcp listener");
    let dispatcher = Arc::new(Dispatcher::from_config(&config));
    thread::spawn(move || server::serve(listener, dispatcher));

    let response = http(
        addr,
        "GET /talks/a.slide HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("<title>Intro</title>"));

    let response = http(
        addr,
        "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 405"), "{}", response);
}
