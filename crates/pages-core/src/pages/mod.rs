//! Multi-page support: a directory of HTML files served and built as pages.
//!
//! [`pages`] returns two plugins sharing one [`PagesConfig`]:
//!
//! - `pages:dev` proxies `/about.html` to `src/pages/about.html` when that
//!   file exists, and sends a full reload when a page changes.
//! - `pages:build` adds every file in the pages directory as an entry and
//!   emits `src/pages/about.html` as `about.html`.

pub mod build;
pub mod dev;
pub mod paths;

pub use build::{discover_entries, rewrite_outputs, PagesBuildPlugin, DEFAULT_ENTRY};
pub use dev::{proxy_request, PagesDevPlugin};
pub use paths::PagesDir;

use crate::bundler::Plugin;
use crate::config::PagesConfig;
use std::sync::Arc;

/// Name of the serve-time plugin.
pub const DEV_PLUGIN_NAME: &str = "pages:dev";

/// Name of the build-time plugin.
pub const BUILD_PLUGIN_NAME: &str = "pages:build";

/// Create the dev and build plugins for `config`.
#[must_use]
pub fn pages(config: PagesConfig) -> Vec<Box<dyn Plugin>> {
    let config = Arc::new(config);
    vec![
        Box::new(PagesDevPlugin::new(Arc::clone(&config))),
        Box::new(PagesBuildPlugin::new(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_both_plugins() {
        let plugins = pages(PagesConfig::default());
        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec![DEV_PLUGIN_NAME, BUILD_PLUGIN_NAME]);
    }
}
