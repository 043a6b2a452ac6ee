//! Minimal dev server host: static files, plugin middleware, HMR socket.
//!
//! ```text
//! Browser requests GET /about.html
//!   → plugin rewriters (first rewrite wins, query kept)
//!   → static file from the project root
//!
//! File changes
//!   → handle_hot_update hooks
//!   → HMR payloads on /__hmr
//! ```

use super::hmr::{HmrChannel, HmrPayload};
use crate::bundler::{
    ConfigEnv, HostConfig, HotUpdateContext, Plugin, PluginContainer, ResolvedConfig,
    ServerContext, ServerMiddleware,
};
use crate::error::Error;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::Uri,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;

/// WebSocket route carrying HMR payloads.
pub const HMR_ROUTE: &str = "/__hmr";

/// A configured dev server.
pub struct DevServer {
    plugins: PluginContainer,
    config: ResolvedConfig,
    hmr: HmrChannel,
    middlewares: Arc<Vec<ServerMiddleware>>,
}

impl DevServer {
    /// Run the serve-time hooks of `plugins` against `config`.
    pub fn new(mut config: HostConfig, plugins: Vec<Box<dyn Plugin>>) -> Result<Self, Error> {
        let env = ConfigEnv::serve();
        let plugins = PluginContainer::for_env(plugins, &env);

        plugins.call_config(&mut config, &env)?;
        let config = config.resolve(env);
        plugins.call_config_resolved(&config)?;

        let hmr = HmrChannel::default();
        let mut server = ServerContext::new(config.clone(), hmr.clone());
        plugins.call_configure_server(&mut server)?;

        tracing::debug!(
            plugins = ?plugins.names(),
            middlewares = server.middlewares.len(),
            "dev server configured"
        );

        Ok(Self {
            plugins,
            config,
            hmr,
            middlewares: Arc::new(server.middlewares),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    #[must_use]
    pub fn hmr(&self) -> &HmrChannel {
        &self.hmr
    }

    /// Build the axum router. Embed it when running in middleware mode.
    pub fn router(&self) -> Router {
        Router::new()
            .route(HMR_ROUTE, get(hmr_websocket))
            .fallback_service(ServeDir::new(&self.config.root))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.middlewares),
                rewrite_request,
            ))
            .with_state(self.hmr.clone())
    }

    /// Dispatch `handle_hot_update` for each changed file.
    ///
    /// Hook failures are logged and forwarded to clients as error payloads.
    pub fn handle_file_change(&self, changed: &[PathBuf]) {
        let timestamp = now_ms();

        for file in changed {
            let ctx = HotUpdateContext {
                file: file.clone(),
                timestamp,
                hmr: &self.hmr,
            };

            match self.plugins.call_handle_hot_update(&ctx) {
                Ok(Some(modules)) => {
                    tracing::debug!(file = %file.display(), ?modules, "hot update handled by plugin");
                }
                Ok(None) => {
                    tracing::trace!(file = %file.display(), "no plugin claimed hot update");
                }
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "hot update failed");
                    self.hmr.send(HmrPayload::Error {
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    /// Bind the configured `server.host` and `server.port`.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let server = &self.config.server;
        Ok(TcpListener::bind((server.host.as_str(), server.port)).await?)
    }

    /// Bind the configured address and serve until the process stops.
    pub async fn serve(self) -> Result<(), Error> {
        let listener = self.bind().await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), Error> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, root = %self.config.root.display(), "dev server listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Apply registered rewriters to the request path.
async fn rewrite_request(
    State(middlewares): State<Arc<Vec<ServerMiddleware>>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    for middleware in middlewares.iter() {
        let Some(target) = (middleware.handler)(path.clone()).await else {
            continue;
        };

        let target = match req.uri().query() {
            Some(query) => format!("{target}?{query}"),
            None => target,
        };
        match target.parse::<Uri>() {
            Ok(uri) => {
                tracing::debug!(middleware = %middleware.name, from = %path, to = %uri, "rewrote request");
                *req.uri_mut() = uri;
            }
            Err(err) => {
                tracing::warn!(middleware = %middleware.name, target = %target, error = %err, "invalid rewrite target");
            }
        }
        break;
    }

    next.run(req).await
}

/// Handle WebSocket connections for HMR.
async fn hmr_websocket(ws: WebSocketUpgrade, State(hmr): State<HmrChannel>) -> Response {
    ws.on_upgrade(|socket| handle_hmr_socket(socket, hmr))
}

/// Forward HMR payloads to one client until either side goes away.
async fn handle_hmr_socket(mut socket: WebSocket, hmr: HmrChannel) {
    let mut rx = hmr.subscribe();

    if socket
        .send(Message::Text(HmrPayload::Connected.to_json()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(payload) => {
                    if socket.send(Message::Text(payload.to_json())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "hmr client lagging");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

fn now_ms() -> u64 {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{HookResult, RewriteFuture};
    use std::fs;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct Rename {
        from: &'static str,
        to: &'static str,
    }

    impl Plugin for Rename {
        fn name(&self) -> &str {
            "rename"
        }

        fn configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
            let (from, to) = (self.from, self.to);
            server.use_middleware(self.name(), move |path: String| -> RewriteFuture {
                Box::pin(async move { (path == from).then(|| to.to_string()) })
            });
            Ok(())
        }
    }

    struct CountUpdates(Arc<AtomicUsize>);

    impl Plugin for CountUpdates {
        fn name(&self) -> &str {
            "count"
        }

        fn handle_hot_update(&self, ctx: &HotUpdateContext<'_>) -> HookResult<Option<Vec<String>>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            ctx.hmr.send(HmrPayload::FullReload { path: None });
            Ok(None)
        }
    }

    async fn spawn(server: DevServer) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve_on(listener));
        addr
    }

    #[tokio::test]
    async fn test_serves_root_and_applies_rewrites() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real.html"), "real").unwrap();
        fs::write(dir.path().join("plain.txt"), "plain").unwrap();

        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Rename {
            from: "/alias.html",
            to: "/real.html",
        })];
        let server = DevServer::new(HostConfig::new(dir.path()), plugins).unwrap();
        let addr = spawn(server).await;

        let body = reqwest::get(format!("http://{addr}/alias.html?v=1"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "real");

        let body = reqwest::get(format!("http://{addr}/plain.txt"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "plain");

        let status = reqwest::get(format!("http://{addr}/missing.html"))
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_binds_configured_address() {
        let dir = tempdir().unwrap();
        let mut config = HostConfig::new(dir.path());
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        let server = DevServer::new(config, Vec::new()).unwrap();

        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_io_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempdir().unwrap();
        let mut config = HostConfig::new(dir.path());
        config.server.host = "127.0.0.1".to_string();
        config.server.port = taken.local_addr().unwrap().port();
        let server = DevServer::new(config, Vec::new()).unwrap();

        let err = server.bind().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_now_ms_is_past_epoch() {
        assert!(now_ms() > 0);
    }

    #[test]
    fn test_file_change_dispatches_hook() {
        let count = Arc::new(AtomicUsize::new(0));
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(CountUpdates(Arc::clone(&count)))];
        let server = DevServer::new(HostConfig::new("/project"), plugins).unwrap();
        let mut rx = server.hmr().subscribe();

        server.handle_file_change(&[
            PathBuf::from("/project/a.html"),
            PathBuf::from("/project/b.html"),
        ]);

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(rx.try_recv().unwrap(), HmrPayload::FullReload { path: None });
    }
}
