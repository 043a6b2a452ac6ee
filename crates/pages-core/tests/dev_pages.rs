//! Dev server with the pages plugins, driven over HTTP.

use pages_core::bundler::HostConfig;
use pages_core::dev::{DevServer, HmrPayload};
use pages_core::{pages, PagesConfig};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use tokio::net::TcpListener;

fn project() -> TempDir {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pages_core=debug")
        .with_test_writer()
        .try_init();

    let dir = tempdir().unwrap();
    let pages_dir = dir.path().join("src/pages");
    fs::create_dir_all(pages_dir.join("blog")).unwrap();
    fs::write(pages_dir.join("index.html"), "home").unwrap();
    fs::write(pages_dir.join("about.html"), "about").unwrap();
    fs::write(pages_dir.join("blog/post.html"), "post").unwrap();
    fs::write(dir.path().join("src/main.js"), "main").unwrap();
    fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    dir
}

async fn spawn(root: &Path, config: PagesConfig) -> SocketAddr {
    let server = DevServer::new(HostConfig::new(root), pages(config)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_on(listener));
    addr
}

async fn get(addr: SocketAddr, path: &str) -> (reqwest::StatusCode, String) {
    let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn test_pages_are_served_at_site_root() {
    let dir = project();
    let addr = spawn(dir.path(), PagesConfig::default()).await;

    assert_eq!(get(addr, "/about.html").await.1, "about");
    assert_eq!(get(addr, "/blog/post.html?draft=1").await.1, "post");
    assert_eq!(get(addr, "/").await.1, "home");
}

#[tokio::test]
async fn test_other_files_pass_through() {
    let dir = project();
    let addr = spawn(dir.path(), PagesConfig::default()).await;

    assert_eq!(get(addr, "/src/main.js").await.1, "main");
    assert_eq!(get(addr, "/src/pages/about.html").await.1, "about");
    assert_eq!(get(addr, "/missing.html").await.0, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_is_not_proxied() {
    let dir = project();
    let addr = spawn(dir.path(), PagesConfig::default()).await;

    let (status, body) = get(addr, "/..%2f..%2fsecret.txt").await;
    assert_ne!(body, "secret");
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_directory_is_served() {
    let dir = project();
    fs::create_dir_all(dir.path().join("custom")).unwrap();
    fs::write(dir.path().join("custom/page.html"), "custom").unwrap();
    let addr = spawn(dir.path(), PagesConfig::new("custom")).await;

    assert_eq!(get(addr, "/page.html").await.1, "custom");
    assert_eq!(get(addr, "/about.html").await.0, reqwest::StatusCode::NOT_FOUND);
}

#[test]
fn test_page_change_sends_full_reload() {
    let dir = project();
    let server = DevServer::new(HostConfig::new(dir.path()), pages(PagesConfig::default())).unwrap();
    let mut rx = server.hmr().subscribe();

    server.handle_file_change(&[
        dir.path().join("src/main.js"),
        dir.path().join("src/pages/blog/post.html"),
    ]);

    assert_eq!(rx.try_recv().unwrap(), HmrPayload::full_reload("/blog/post.html"));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_middleware_mode_reloads_everything() {
    let dir = project();
    let mut config = HostConfig::new(dir.path());
    config.server.middleware_mode = true;
    let server = DevServer::new(config, pages(PagesConfig::default())).unwrap();
    let mut rx = server.hmr().subscribe();

    server.handle_file_change(&[PathBuf::from(dir.path()).join("src/pages/index.html")]);

    assert_eq!(rx.try_recv().unwrap(), HmrPayload::full_reload("*"));
}
