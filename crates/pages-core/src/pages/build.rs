//! Build-time adapter: every file in the pages directory becomes an entry,
//! and emitted pages lose the pages directory prefix.

use super::paths::PagesDir;
use super::BUILD_PLUGIN_NAME;
use crate::bundler::{
    Command, ConfigEnv, HookResult, HostConfig, InputOption, OutputBundle, Plugin,
    PluginEnforce, PluginError, ResolvedConfig,
};
use crate::config::{FilePolicy, PagesConfig};
use crate::error::Error;
use pages_util::path::normalize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Entry used when nothing else was found.
pub const DEFAULT_ENTRY: &str = "index.html";

/// Build adapter. Applies to `build` only.
#[derive(Debug)]
pub struct PagesBuildPlugin {
    config: Arc<PagesConfig>,
    pages: PagesDir,
    /// Project root, captured once from the resolved config.
    root: OnceLock<PathBuf>,
}

impl PagesBuildPlugin {
    #[must_use]
    pub fn new(config: Arc<PagesConfig>) -> Self {
        let pages = PagesDir::new(&config.dir);
        Self {
            config,
            pages,
            root: OnceLock::new(),
        }
    }
}

/// Append every file under `pages_dir` accepted by `policy` to `inputs`.
///
/// Inputs are compared as paths resolved against `root`, so a file already
/// listed (relative or absolute) is not added twice. If `inputs` ends up
/// empty, `pages_dir/index.html` is added. An unreadable directory
/// contributes nothing.
pub fn discover_entries(
    root: &Path,
    pages_dir: &Path,
    policy: FilePolicy,
    page_extension: &str,
    inputs: &mut Vec<String>,
) {
    let files = pages_util::fs::list_files(pages_dir).unwrap_or_else(|err| {
        tracing::warn!(dir = %pages_dir.display(), error = %err, "unable to read pages dir");
        Vec::new()
    });

    let mut seen: HashSet<PathBuf> = inputs
        .iter()
        .map(|input| normalize(&root.join(input)))
        .collect();
    for file in files {
        if !policy.matches(&file, page_extension) {
            continue;
        }
        if seen.insert(normalize(&root.join(&file))) {
            let entry = file.to_string_lossy().into_owned();
            tracing::debug!(entry = %entry, "discovered page entry");
            inputs.push(entry);
        }
    }

    if inputs.is_empty() {
        let fallback = pages_dir.join(DEFAULT_ENTRY);
        tracing::debug!(entry = %fallback.display(), "no entries found, using default");
        inputs.push(fallback.to_string_lossy().into_owned());
    }
}

/// Strip the pages directory prefix from every output under it.
///
/// Returns how many outputs were renamed. A destination that matches any
/// other output name from before the rewrite is an `OutputConflict`.
pub fn rewrite_outputs(root: &Path, pages: &PagesDir, bundle: &mut OutputBundle) -> Result<usize, Error> {
    let before = bundle.file_names();
    let existing: HashSet<&str> = before.iter().map(String::as_str).collect();
    let mut renamed = 0;

    for from in &before {
        let Some(to) = pages.strip_output(root, from) else {
            continue;
        };
        // Pages dir is the root itself
        if to == *from {
            continue;
        }

        if existing.contains(to.as_str()) {
            return Err(Error::OutputConflict {
                from: from.clone(),
                to,
            });
        }

        tracing::debug!(from = %from, to = %to, "rewrite output path");
        bundle.rename(from, to)?;
        renamed += 1;
    }

    Ok(renamed)
}

impl Plugin for PagesBuildPlugin {
    fn name(&self) -> &str {
        BUILD_PLUGIN_NAME
    }

    fn enforce(&self) -> PluginEnforce {
        PluginEnforce::Post
    }

    fn apply(&self, env: &ConfigEnv) -> bool {
        env.command == Command::Build
    }

    fn config(&self, config: &mut HostConfig, _env: &ConfigEnv) -> HookResult<()> {
        let mut inputs = InputOption::normalize(config.build.input.take())
            .map_err(|err| self.error("config", err))?;

        let pages_dir = config.root.join(self.pages.as_path());
        discover_entries(
            &config.root,
            &pages_dir,
            self.config.entries,
            &self.config.page_extension,
            &mut inputs,
        );

        config.build.input = Some(InputOption::Multiple(inputs));
        Ok(())
    }

    fn config_resolved(&self, config: &ResolvedConfig) -> HookResult<()> {
        if self.root.set(config.root.clone()).is_err() {
            tracing::debug!(plugin = BUILD_PLUGIN_NAME, "config already resolved, keeping first");
        }
        Ok(())
    }

    fn generate_bundle(&self, bundle: &mut OutputBundle) -> HookResult<()> {
        let root = self.root.get().ok_or_else(|| {
            PluginError::new(
                BUILD_PLUGIN_NAME,
                "generate_bundle",
                Error::NotResolved {
                    plugin: BUILD_PLUGIN_NAME,
                },
            )
        })?;

        let renamed = rewrite_outputs(root, &self.pages, bundle)
            .map_err(|err| self.error("generate_bundle", err))?;
        tracing::debug!(renamed, "pages outputs rewritten");
        Ok(())
    }
}
