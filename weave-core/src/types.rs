//! Domain types shared by the resource map and the renderer.
//!
//! Loosely-shaped data (rows, parameters, registries) is carried as
//! `serde_json` values; everything the engine itself interprets is typed.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One element of a bound result set.
pub type Row = Map<String, Value>;

/// Parameters a view renders with.
pub type Parameters = Map<String, Value>;

// ---------------------------------------------------------------------------
// Scheme
// ---------------------------------------------------------------------------

/// The rendering strategy category of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewScheme {
    /// Outermost document template; executed the same way as a page.
    Theme,
    Page,
    Template,
    Wrap,
}

impl ViewScheme {
    /// All schemes in a stable order.
    pub fn all() -> &'static [ViewScheme] {
        &[
            ViewScheme::Theme,
            ViewScheme::Page,
            ViewScheme::Template,
            ViewScheme::Wrap,
        ]
    }

    /// Capitalised form used inside resource references (`Page`, `Wrap`, ...).
    pub fn title(&self) -> &'static str {
        match self {
            ViewScheme::Theme => "Theme",
            ViewScheme::Page => "Page",
            ViewScheme::Template => "Template",
            ViewScheme::Wrap => "Wrap",
        }
    }

    /// Directory under the views root holding views of this scheme.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ViewScheme::Theme => "theme",
            ViewScheme::Page => "page",
            ViewScheme::Template => "template",
            ViewScheme::Wrap => "wrap",
        }
    }

    /// Theme and page views are single files; templates and wraps are directories.
    pub fn is_single_file(&self) -> bool {
        matches!(self, ViewScheme::Theme | ViewScheme::Page)
    }
}

impl fmt::Display for ViewScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ViewScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "theme" => Ok(ViewScheme::Theme),
            "page" => Ok(ViewScheme::Page),
            "template" => Ok(ViewScheme::Template),
            "wrap" => Ok(ViewScheme::Wrap),
            other => Err(format!(
                "unknown view scheme '{other}'; expected: theme, page, template, wrap"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ViewExtension
// ---------------------------------------------------------------------------

/// Metadata for a resolvable view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewExtension {
    pub scheme: ViewScheme,
    /// Lowercased view name.
    pub name: String,
    /// Relative to the views root: a file for theme/page views, a directory
    /// for template/wrap views.
    pub include_path: PathBuf,
    #[serde(default)]
    pub parameters: Parameters,
}

impl ViewExtension {
    pub fn new(scheme: ViewScheme, name: impl Into<String>, include_path: impl Into<PathBuf>) -> Self {
        ViewExtension {
            scheme,
            name: name.into().to_lowercase(),
            include_path: include_path.into(),
            parameters: Parameters::new(),
        }
    }

    /// Builder-style parameter insertion.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// `parameters.model_name` when it is a string.
    pub fn model_name(&self) -> Option<&str> {
        self.parameters.get("model_name").and_then(Value::as_str)
    }

    /// `parameters.model_type` when it is a string.
    pub fn model_type(&self) -> Option<&str> {
        self.parameters.get("model_type").and_then(Value::as_str)
    }
}

// ---------------------------------------------------------------------------
// Runtime context
// ---------------------------------------------------------------------------

/// Names of the views the current request routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub wrap: String,
}

impl Default for Route {
    fn default() -> Self {
        Route {
            theme: default_theme(),
            page: String::new(),
            template: String::new(),
            wrap: String::new(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

/// The request's primary result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryData {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub model_registry: Value,
}

/// Ambient per-request state consulted during binding and event dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeContext {
    #[serde(default)]
    pub route: Route,
    #[serde(default)]
    pub primary: PrimaryData,
    /// Named runtime fields (`model_type: runtime_data`).
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Outputs of earlier plugins (`model_type: plugin_data` and precomputed sets).
    #[serde(default)]
    pub plugin_data: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
