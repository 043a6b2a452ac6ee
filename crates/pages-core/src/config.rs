use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default pages directory, relative to the project root.
pub const DEFAULT_PAGES_DIR: &str = "src/pages";

/// Default page file extension.
pub const DEFAULT_PAGE_EXTENSION: &str = "html";

/// Configuration for the pages plugins.
///
/// Every field is optional when deserializing; missing fields take their
/// defaults, unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PagesConfig {
    /// Pages directory, relative to the project root.
    pub dir: PathBuf,

    /// Which files under `dir` become build entries.
    pub entries: FilePolicy,

    /// Which changed files under `dir` trigger a full reload.
    pub reload: FilePolicy,

    /// Extension identifying a page file (without the dot).
    pub page_extension: String,
}

/// Which files under the pages directory a step considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilePolicy {
    /// Every regular file.
    #[default]
    All,
    /// Only files with the page extension.
    Pages,
}

impl FilePolicy {
    /// Whether `path` passes this policy for the given page extension.
    #[must_use]
    pub fn matches(&self, path: &Path, page_extension: &str) -> bool {
        match self {
            Self::All => true,
            Self::Pages => pages_util::path::has_extension(path, page_extension),
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_PAGES_DIR),
            entries: FilePolicy::default(),
            reload: FilePolicy::default(),
            page_extension: DEFAULT_PAGE_EXTENSION.to_string(),
        }
    }
}

impl PagesConfig {
    /// Create a config for the given pages directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the entry discovery policy.
    #[must_use]
    pub fn with_entries(mut self, entries: FilePolicy) -> Self {
        self.entries = entries;
        self
    }

    /// Set the hot reload policy.
    #[must_use]
    pub fn with_reload(mut self, reload: FilePolicy) -> Self {
        self.reload = reload;
        self
    }

    /// Set the page extension.
    #[must_use]
    pub fn with_page_extension(mut self, ext: impl Into<String>) -> Self {
        self.page_extension = ext.into();
        self
    }

    /// Parse a (possibly partial) config from JSON.
    pub fn from_json_str(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Load a (possibly partial) config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&source).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
