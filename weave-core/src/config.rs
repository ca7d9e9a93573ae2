//! Site manifest and runtime context loading.
//!
//! # Site layout
//!
//! ```text
//! <site>/
//!   weave.yaml            (optional manifest — theme, render limits, view metadata)
//!   runtime.yaml          (optional default runtime context)
//!   views/
//!     theme/<name>.tera
//!     page/<name>.tera
//!     template/<name>/{custom,header,body,footer}.tera
//!     wrap/<name>/{header,body,footer}.tera
//! ```
//!
//! Missing optional files load as defaults; malformed ones are reported as
//! [`SiteError::Parse`] with the offending path. Unknown keys are rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, SiteError};
use crate::types::{Parameters, RuntimeContext, ViewScheme};

pub const MANIFEST_FILE: &str = "weave.yaml";
pub const RUNTIME_FILE: &str = "runtime.yaml";
pub const VIEWS_DIR: &str = "views";

/// Default circuit-breaker bound on parse cycles per render.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<site>/weave.yaml` — pure, no I/O.
pub fn manifest_path_at(site: &Path) -> PathBuf {
    site.join(MANIFEST_FILE)
}

/// `<site>/runtime.yaml` — pure, no I/O.
pub fn runtime_path_at(site: &Path) -> PathBuf {
    site.join(RUNTIME_FILE)
}

/// `<site>/views/` — pure, no I/O.
pub fn views_dir_at(site: &Path) -> PathBuf {
    site.join(VIEWS_DIR)
}

// ---------------------------------------------------------------------------
// 2. Manifest types
// ---------------------------------------------------------------------------

/// Render loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum parse cycles (both passes together) before the render aborts.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Token kinds/names deferred to the head pass.
    #[serde(default = "default_head_tokens")]
    pub head_tokens: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_iterations: default_max_iterations(),
            head_tokens: default_head_tokens(),
        }
    }
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_head_tokens() -> Vec<String> {
    vec!["head".to_string(), "defer".to_string()]
}

/// View metadata declared in the manifest.
///
/// Entries add views discovery cannot see (custom include paths) or attach
/// parameters such as `model_name` / `model_type` to discovered ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewEntry {
    pub scheme: ViewScheme,
    pub name: String,
    /// Defaults to the conventional location under `views/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_path: Option<PathBuf>,
    #[serde(default)]
    pub parameters: Parameters,
}

/// Root of `weave.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteManifest {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub views: Vec<ViewEntry>,
}

impl Default for SiteManifest {
    fn default() -> Self {
        SiteManifest {
            theme: default_theme(),
            render: RenderConfig::default(),
            views: Vec::new(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load `<site>/weave.yaml`, falling back to [`SiteManifest::default`] when absent.
pub fn load_manifest_at(site: &Path) -> Result<SiteManifest, SiteError> {
    let path = manifest_path_at(site);
    if !path.exists() {
        return Ok(SiteManifest::default());
    }
    load_yaml(&path)
}

/// Load a runtime context from an explicit file. The file must exist.
pub fn load_runtime_file(path: &Path) -> Result<RuntimeContext, SiteError> {
    load_yaml(path)
}

/// Load `<site>/runtime.yaml`, falling back to an empty context when absent.
pub fn load_runtime_at(site: &Path) -> Result<RuntimeContext, SiteError> {
    let path = runtime_path_at(site);
    if !path.exists() {
        return Ok(RuntimeContext::default());
    }
    load_yaml(&path)
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SiteError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| SiteError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
