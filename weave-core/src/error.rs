//! Error types for weave-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading a site (manifest, runtime, views).
#[derive(Debug, Error)]
pub enum SiteError {
    /// Underlying I/O failure, with the path that was being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The site has no `views/` directory.
    #[error("views directory not found at {path}")]
    ViewsDirNotFound { path: PathBuf },

    /// No theme view with this name is registered.
    #[error("theme '{name}' not found")]
    ThemeNotFound { name: String },

    /// A manifest entry names a scheme/name pair that is not usable.
    #[error("invalid view entry '{name}': {reason}")]
    InvalidView { name: String, reason: String },
}

/// Convenience constructor for [`SiteError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SiteError {
    SiteError::Io {
        path: path.into(),
        source,
    }
}
