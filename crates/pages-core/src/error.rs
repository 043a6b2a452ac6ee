use crate::bundler::PluginError;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pages operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to convert build input to a list: unsupported value {found}")]
    UnsupportedInput { found: String },

    #[error("Conflicting inputs, \"{from}\" would override \"{to}\"")]
    OutputConflict { from: String, to: String },

    #[error("Build input not found: {path}")]
    MissingInput { path: PathBuf },

    #[error("Plugin {plugin} used before the host configuration was resolved")]
    NotResolved { plugin: &'static str },

    #[error(transparent)]
    Plugin(Box<PluginError>),
}

impl From<PluginError> for Error {
    fn from(err: PluginError) -> Self {
        Self::Plugin(Box::new(err))
    }
}

impl Error {
    /// The error behind a plugin hook failure, or `self` otherwise.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Plugin(err) => err.source.root_cause(),
            other => other,
        }
    }
}
