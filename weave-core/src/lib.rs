//! Weave core library — domain types, site configuration, resource map, errors.
//!
//! Public API surface:
//! - [`types`] — view schemes, view extensions, runtime context
//! - [`config`] — `weave.yaml` manifest and `runtime.yaml` loading
//! - [`resource`] — [`ResourceResolver`] trait and the file-backed [`ResourceMap`]
//! - [`error`] — [`SiteError`]

pub mod config;
pub mod error;
pub mod resource;
pub mod types;

pub use config::{RenderConfig, SiteManifest, ViewEntry};
pub use error::SiteError;
pub use resource::{ResourceMap, ResourceResolver};
pub use types::{
    Parameters, PrimaryData, Route, Row, RuntimeContext, ViewExtension, ViewScheme,
};
