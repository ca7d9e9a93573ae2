//! Error types for weave-renderer.

use std::path::PathBuf;

use thiserror::Error;

use weave_core::SiteError;

/// All errors that can abort a document render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required include target (theme, page) is missing.
    #[error("include target not found: {path}")]
    NotFound { path: PathBuf },

    /// The resource collaborator has no view for this reference.
    #[error("unknown view reference {reference}")]
    Resolution { reference: String },

    /// The data binder cannot determine a data source for a view.
    #[error("data binding misconfigured: {0}")]
    Configuration(String),

    /// Token expansion did not reach a fixed point within the configured bound.
    #[error("render loop exceeded {limit} iterations; a template probably includes itself")]
    LoopLimitExceeded { limit: usize },

    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading site templates.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Site loading error surfaced through the renderer.
    #[error("site error: {0}")]
    Site(#[from] SiteError),
}

/// Convenience constructor for [`RenderError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}
