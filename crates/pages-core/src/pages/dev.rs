//! Serve-time adapter: proxies requests into the pages directory and turns
//! page edits into full reloads.

use super::paths::{request_target, PagesDir};
use super::DEV_PLUGIN_NAME;
use crate::bundler::{
    Command, ConfigEnv, HookResult, HotUpdateContext, Plugin, PluginEnforce, PluginError,
    ResolvedConfig, RewriteFuture, ServerContext,
};
use crate::config::PagesConfig;
use crate::dev::hmr::{HmrPayload, WILDCARD_PATH};
use crate::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// What the dev adapter keeps from the resolved host config.
#[derive(Debug, Clone)]
struct DevContext {
    root: PathBuf,
    middleware_mode: bool,
}

/// Dev adapter. Applies to `serve`, never to preview.
#[derive(Debug)]
pub struct PagesDevPlugin {
    config: Arc<PagesConfig>,
    pages: PagesDir,
    resolved: OnceLock<DevContext>,
}

impl PagesDevPlugin {
    #[must_use]
    pub fn new(config: Arc<PagesConfig>) -> Self {
        let pages = PagesDir::new(&config.dir);
        Self {
            config,
            pages,
            resolved: OnceLock::new(),
        }
    }

    fn context(&self, hook: &'static str) -> HookResult<&DevContext> {
        self.resolved.get().ok_or_else(|| {
            PluginError::new(
                DEV_PLUGIN_NAME,
                hook,
                Error::NotResolved {
                    plugin: DEV_PLUGIN_NAME,
                },
            )
        })
    }

    /// Reload payload for a changed file, or `None` if it is not a page.
    fn reload_for(&self, ctx: &DevContext, file: &Path) -> Option<HmrPayload> {
        let logical = self.pages.logical_for_file(&ctx.root, file)?;
        if !self.config.reload.matches(file, &self.config.page_extension) {
            return None;
        }

        let path = if ctx.middleware_mode {
            WILDCARD_PATH.to_string()
        } else {
            logical
        };
        Some(HmrPayload::full_reload(path))
    }
}

/// Rewrite target for `request_path` if it names an existing entry under the
/// pages directory.
///
/// Access failures of any kind mean "not found": the request passes through.
pub async fn proxy_request(root: &Path, pages: &PagesDir, request_path: &str) -> Option<String> {
    let Some(candidate) = pages.physical_for_request(request_path) else {
        tracing::debug!(path = %request_path, "request resolves outside pages dir, skipping");
        return None;
    };

    match tokio::fs::metadata(root.join(&candidate)).await {
        Ok(_) => Some(request_target(&candidate, request_path)),
        Err(err) => {
            tracing::debug!(
                page = %candidate.display(),
                error = %err,
                "unable to access page, skipping"
            );
            None
        }
    }
}

impl Plugin for PagesDevPlugin {
    fn name(&self) -> &str {
        DEV_PLUGIN_NAME
    }

    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Pre
    }

    fn apply(&self, env: &ConfigEnv) -> bool {
        env.command == Command::Serve && !env.is_preview
    }

    fn config_resolved(&self, config: &ResolvedConfig) -> HookResult<()> {
        let ctx = DevContext {
            root: config.root.clone(),
            middleware_mode: config.server.middleware_mode,
        };
        if self.resolved.set(ctx).is_err() {
            tracing::debug!(plugin = DEV_PLUGIN_NAME, "config already resolved, keeping first");
        }
        Ok(())
    }

    fn configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        let root = Arc::new(self.context("configure_server")?.root.clone());
        let pages = Arc::new(self.pages.clone());

        server.use_middleware(DEV_PLUGIN_NAME, move |path: String| -> RewriteFuture {
            let root = Arc::clone(&root);
            let pages = Arc::clone(&pages);
            Box::pin(async move { proxy_request(&root, &pages, &path).await })
        });
        Ok(())
    }

    fn handle_hot_update(&self, ctx: &HotUpdateContext<'_>) -> HookResult<Option<Vec<String>>> {
        let dev = self.context("handle_hot_update")?;

        if let Some(payload) = self.reload_for(dev, &ctx.file) {
            tracing::info!(file = %ctx.file.display(), payload = %payload.to_json(), "page changed, full reload");
            ctx.hmr.send(payload);
        }

        // Host default handling still applies.
        Ok(None)
    }
}
