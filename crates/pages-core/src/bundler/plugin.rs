//! Plugin system shared by the dev server and the build driver.
//!
//! Provides a Vite-compatible plugin interface with hooks at the lifecycle
//! points the pages plugins need.
//!
//! ## Example
//!
//! ```ignore
//! use pages_core::bundler::{HookResult, OutputBundle, Plugin};
//!
//! struct Lowercase;
//!
//! impl Plugin for Lowercase {
//!     fn name(&self) -> &str { "lowercase" }
//!
//!     fn generate_bundle(&self, bundle: &mut OutputBundle) -> HookResult<()> {
//!         for name in bundle.file_names() {
//!             let lower = name.to_lowercase();
//!             bundle.rename(&name, lower).map_err(|e| self.error("generate_bundle", e))?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use super::input::InputOption;
use super::output::OutputBundle;
use crate::dev::hmr::HmrChannel;
use crate::error::Error;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook.
#[derive(Debug, thiserror::Error)]
#[error("[{plugin}] {hook}: {source}")]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Underlying error.
    #[source]
    pub source: Error,
}

impl PluginError {
    /// Attribute an error to a plugin hook.
    pub fn new(plugin: impl Into<String>, hook: &'static str, source: Error) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            source,
        }
    }
}

/// Host command the plugins run under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Development server.
    Serve,
    /// Production build.
    Build,
}

/// Environment passed to `apply` and `config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigEnv {
    pub command: Command,
    /// Serving a finished build rather than sources.
    pub is_preview: bool,
}

impl ConfigEnv {
    #[must_use]
    pub fn serve() -> Self {
        Self {
            command: Command::Serve,
            is_preview: false,
        }
    }

    #[must_use]
    pub fn preview() -> Self {
        Self {
            command: Command::Serve,
            is_preview: true,
        }
    }

    #[must_use]
    pub fn build() -> Self {
        Self {
            command: Command::Build,
            is_preview: false,
        }
    }
}

/// Plugin enforcement ordering.
///
/// Controls where a plugin runs relative to others in the pipeline.
/// Mirrors Vite's `enforce` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PluginEnforce {
    /// Runs before normal plugins.
    Pre,
    /// Default ordering (no enforcement).
    #[default]
    Normal,
    /// Runs after normal plugins.
    Post,
}

/// Dev server options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Dev server port.
    pub port: u16,
    /// Dev server host.
    pub host: String,
    /// Embedded in another server: no page navigation of its own.
    pub middleware_mode: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "localhost".to_string(),
            middleware_mode: false,
        }
    }
}

/// Build options.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Bundle entry inputs, in whatever shape the user gave them.
    pub input: Option<InputOption>,
    /// Output directory, relative to the root.
    pub out_dir: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            input: None,
            out_dir: PathBuf::from("dist"),
        }
    }
}

/// Host configuration before resolution.
///
/// Passed mutably to the `config` hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Root directory of the project.
    pub root: PathBuf,
    pub server: ServerOptions,
    pub build: BuildOptions,
}

impl HostConfig {
    /// Create a config rooted at `root` with default options.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            server: ServerOptions::default(),
            build: BuildOptions::default(),
        }
    }

    /// Freeze the config for the given command.
    #[must_use]
    pub fn resolve(self, env: ConfigEnv) -> ResolvedConfig {
        ResolvedConfig {
            root: self.root,
            command: env.command,
            server: self.server,
            build: self.build,
        }
    }
}

/// Host configuration after every `config` hook ran. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub command: Command,
    pub server: ServerOptions,
    pub build: BuildOptions,
}

/// Future returned by a request rewriter.
pub type RewriteFuture = BoxFuture<'static, Option<String>>;

/// A request rewriter registered by a plugin.
///
/// Receives the request path (no query) and returns the new path, or `None`
/// to pass the request through unchanged.
#[derive(Clone)]
pub struct ServerMiddleware {
    /// Name for debugging.
    pub name: String,
    /// The handler function.
    pub handler: Arc<dyn Fn(String) -> RewriteFuture + Send + Sync>,
}

impl std::fmt::Debug for ServerMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Context for the dev server, passed to the `configure_server` hook.
#[derive(Debug)]
pub struct ServerContext {
    /// Resolved configuration.
    pub config: ResolvedConfig,
    /// Hot reload channel to connected clients.
    pub hmr: HmrChannel,
    /// Registered rewriters, run in order before static serving.
    pub middlewares: Vec<ServerMiddleware>,
}

impl ServerContext {
    /// Create a new server context.
    pub fn new(config: ResolvedConfig, hmr: HmrChannel) -> Self {
        Self {
            config,
            hmr,
            middlewares: Vec::new(),
        }
    }

    /// Register a request rewriter.
    pub fn use_middleware<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(String) -> RewriteFuture + Send + Sync + 'static,
    {
        self.middlewares.push(ServerMiddleware {
            name: name.into(),
            handler: Arc::new(handler),
        });
    }
}

/// Context for hot update events.
///
/// Passed to the `handle_hot_update` hook when a file changes.
#[derive(Debug, Clone)]
pub struct HotUpdateContext<'a> {
    /// The file that changed (absolute path).
    pub file: PathBuf,
    /// Timestamp of the update.
    pub timestamp: u64,
    /// Channel to connected clients.
    pub hmr: &'a HmrChannel,
}

/// The main plugin trait.
///
/// All hooks have default implementations that do nothing, so you only need
/// to implement the ones you care about.
///
/// Lifecycle, in call order:
///
/// - `apply` decides whether the plugin takes part in this command
/// - `config` mutates the host config before resolution
/// - `config_resolved` reads the final config
/// - `configure_server` registers dev server middleware (serve only)
/// - `handle_hot_update` reacts to file changes (serve only)
/// - `generate_bundle` rewrites the output bundle (build only)
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Plugin ordering: `Pre`, `Normal` (default), or `Post`.
    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Normal
    }

    /// Whether the plugin takes part under this environment.
    fn apply(&self, _env: &ConfigEnv) -> bool {
        true
    }

    /// Modify the host config before it is resolved.
    fn config(&self, _config: &mut HostConfig, _env: &ConfigEnv) -> HookResult<()> {
        Ok(())
    }

    /// Called after config is resolved (read-only).
    ///
    /// Plugins can store the final config for later use.
    fn config_resolved(&self, _config: &ResolvedConfig) -> HookResult<()> {
        Ok(())
    }

    /// Configure the dev server.
    fn configure_server(&self, _server: &mut ServerContext) -> HookResult<()> {
        Ok(())
    }

    /// Handle a file change during dev.
    ///
    /// Return `Some(modules)` to override the affected modules list,
    /// or `None` to let the host's default handling apply.
    fn handle_hot_update(&self, _ctx: &HotUpdateContext<'_>) -> HookResult<Option<Vec<String>>> {
        Ok(None)
    }

    /// Rewrite the output bundle after bundling.
    fn generate_bundle(&self, _bundle: &mut OutputBundle) -> HookResult<()> {
        Ok(())
    }

    /// Attribute `source` to this plugin's `hook`.
    fn error(&self, hook: &'static str, source: Error) -> PluginError {
        PluginError::new(self.name(), hook, source)
    }
}

/// A container for managing multiple plugins.
///
/// Plugins are sorted by their `enforce()` ordering: `Pre` → `Normal` → `Post`.
/// Within the same enforcement level, insertion order is preserved.
#[derive(Default)]
pub struct PluginContainer {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginContainer {
    /// Create an empty plugin container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a container holding only the plugins that apply under `env`.
    #[must_use]
    pub fn for_env(plugins: Vec<Box<dyn Plugin>>, env: &ConfigEnv) -> Self {
        let mut container = Self::new();
        for plugin in plugins {
            if plugin.apply(env) {
                container.add(plugin);
            }
        }
        container
    }

    /// Add a plugin. Plugins are kept sorted by enforce order.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        let enforce = plugin.enforce();
        let at = self.plugins.partition_point(|p| p.enforce() <= enforce);
        self.plugins.insert(at, plugin);
    }

    /// Plugin names in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Call `config` on all plugins, letting each mutate the config.
    pub fn call_config(&self, config: &mut HostConfig, env: &ConfigEnv) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.config(config, env)?;
        }
        Ok(())
    }

    /// Call `config_resolved` on all plugins.
    pub fn call_config_resolved(&self, config: &ResolvedConfig) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.config_resolved(config)?;
        }
        Ok(())
    }

    /// Call `configure_server` on all plugins.
    pub fn call_configure_server(&self, server: &mut ServerContext) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.configure_server(server)?;
        }
        Ok(())
    }

    /// Call `handle_hot_update` on all plugins.
    /// Returns the first non-None result, or None if no plugin handled it.
    pub fn call_handle_hot_update(
        &self,
        ctx: &HotUpdateContext<'_>,
    ) -> HookResult<Option<Vec<String>>> {
        for plugin in &self.plugins {
            if let Some(modules) = plugin.handle_hot_update(ctx)? {
                return Ok(Some(modules));
            }
        }
        Ok(None)
    }

    /// Call `generate_bundle` on all plugins, in order.
    pub fn call_generate_bundle(&self, bundle: &mut OutputBundle) -> HookResult<()> {
        for plugin in &self.plugins {
            plugin.generate_bundle(bundle)?;
        }
        Ok(())
    }
}
