//! Build driver and the host side of the plugin contract.
//!
//! ## Usage
//!
//! ```ignore
//! use pages_core::bundler::{build, HostConfig};
//! use pages_core::{pages, PagesConfig};
//!
//! let output = build(HostConfig::new("."), pages(PagesConfig::default()))?;
//! output.write(Path::new("dist"))?;
//! ```
//!
//! ## Pipeline
//!
//! 1. **Config** - `config` hooks mutate the host config (entries are added here)
//! 2. **Resolve** - config is frozen, `config_resolved` hooks see it
//! 3. **Emit** - every input becomes an artifact named by its path under the root
//! 4. **Generate** - `generate_bundle` hooks rewrite the bundle

mod input;
mod output;
mod plugin;

pub use input::InputOption;
pub use output::{OutputArtifact, OutputAsset, OutputBundle, OutputChunk};
pub use plugin::{
    BuildOptions, Command, ConfigEnv, HookResult, HostConfig, HotUpdateContext, Plugin,
    PluginContainer, PluginEnforce, PluginError, ResolvedConfig, RewriteFuture, ServerContext,
    ServerMiddleware, ServerOptions,
};

use crate::error::Error;
use pages_util::path::{normalize, to_slash};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Result of a build.
#[derive(Debug)]
pub struct BuildOutput {
    /// Resolved configuration the build ran with.
    pub config: ResolvedConfig,
    /// Final bundle after every `generate_bundle` hook.
    pub bundle: OutputBundle,
}

impl BuildOutput {
    /// Final output file names, sorted.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.bundle.file_names()
    }

    /// Write every artifact under `out_dir`, returning the written paths.
    pub fn write(&self, out_dir: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut written = Vec::with_capacity(self.bundle.len());
        for artifact in self.bundle.iter() {
            let path = out_dir.join(artifact.file_name());
            pages_util::fs::atomic_write(&path, artifact.contents())?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Run a production build of `config` with `plugins`.
pub fn build(mut config: HostConfig, plugins: Vec<Box<dyn Plugin>>) -> Result<BuildOutput, Error> {
    let env = ConfigEnv::build();
    let container = PluginContainer::for_env(plugins, &env);

    container.call_config(&mut config, &env)?;
    let resolved = config.resolve(env);
    container.call_config_resolved(&resolved)?;

    let inputs = InputOption::normalize(resolved.build.input.clone())?;
    let mut bundle = emit(&resolved.root, &inputs)?;
    tracing::debug!(artifacts = bundle.len(), "emitted bundle");

    container.call_generate_bundle(&mut bundle)?;

    Ok(BuildOutput {
        config: resolved,
        bundle,
    })
}

/// Turn each input into an asset named by its path relative to `root`.
///
/// An input listed twice is emitted once. Two different files that map to
/// the same name are an `OutputConflict`.
fn emit(root: &Path, inputs: &[String]) -> Result<OutputBundle, Error> {
    let root = normalize(root);
    let mut bundle = OutputBundle::new();
    let mut sources: HashMap<String, PathBuf> = HashMap::with_capacity(inputs.len());

    for input in inputs {
        let path = normalize(&root.join(input));
        if sources.values().any(|source| *source == path) {
            continue;
        }
        let source = std::fs::read(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::MissingInput { path: path.clone() },
            _ => Error::Io(err),
        })?;

        let file_name = match path.strip_prefix(&root) {
            Ok(relative) => to_slash(relative),
            // Outside the root: keep only the file name
            Err(_) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        if let Some(existing) = sources.get(&file_name) {
            return Err(Error::OutputConflict {
                from: path.display().to_string(),
                to: existing.display().to_string(),
            });
        }

        sources.insert(file_name.clone(), path);
        bundle.insert(OutputArtifact::Asset(OutputAsset::new(file_name, source)));
    }

    Ok(bundle)
}
