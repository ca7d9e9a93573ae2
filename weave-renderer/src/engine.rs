//! Template execution — the [`TemplateExecutor`] capability and its Tera
//! implementation, [`TemplateEngine`].
//!
//! # Template names
//!
//! Every include target is addressed by its path relative to the views root,
//! normalised to lowercase with `/` separators:
//!
//! | View                     | Template name(s)                              |
//! |--------------------------|-----------------------------------------------|
//! | theme `default`          | `theme/default.tera`                          |
//! | page `home`              | `page/home.tera`                              |
//! | template `articles`      | `template/articles/{custom,header,body,footer}.tera` |
//! | wrap `div`               | `wrap/div/{header,body,footer}.tera`          |
//!
//! Built-in wraps are embedded in the binary; site files with the same name
//! override them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tera::Tera;
use weave_core::resource::VIEW_FILE_EXTENSION;
use weave_core::ViewScheme;

use crate::context::ExecutionContext;
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("wrap/none/body.tera", include_str!("templates/wrap/none/body.tera")),
    ("wrap/div/header.tera", include_str!("templates/wrap/div/header.tera")),
    ("wrap/div/body.tera", include_str!("templates/wrap/div/body.tera")),
    ("wrap/div/footer.tera", include_str!("templates/wrap/div/footer.tera")),
    (
        "wrap/section/header.tera",
        include_str!("templates/wrap/section/header.tera"),
    ),
    (
        "wrap/section/body.tera",
        include_str!("templates/wrap/section/body.tera"),
    ),
    (
        "wrap/section/footer.tera",
        include_str!("templates/wrap/section/footer.tera"),
    ),
];

/// Region files inside a template or wrap view directory.
pub const CUSTOM_FILE: &str = "custom.tera";
pub const HEADER_FILE: &str = "header.tera";
pub const BODY_FILE: &str = "body.tera";
pub const FOOTER_FILE: &str = "footer.tera";

// ---------------------------------------------------------------------------
// Executor capability
// ---------------------------------------------------------------------------

/// Turns an include target plus a context into text.
pub trait TemplateExecutor {
    /// Whether `template` (relative to the views root) can be executed.
    fn exists(&self, template: &Path) -> bool;

    /// Execute `template`, returning its output.
    fn execute(&self, template: &Path, ctx: &ExecutionContext<'_>) -> Result<String, RenderError>;
}

impl<E: TemplateExecutor + ?Sized> TemplateExecutor for &E {
    fn exists(&self, template: &Path) -> bool {
        (**self).exists(template)
    }

    fn execute(&self, template: &Path, ctx: &ExecutionContext<'_>) -> Result<String, RenderError> {
        (**self).execute(template, ctx)
    }
}

// ---------------------------------------------------------------------------
// Views tree loading
// ---------------------------------------------------------------------------

/// Files a template or wrap view directory may contribute.
const REGION_FILES: &[&str] = &[CUSTOM_FILE, HEADER_FILE, BODY_FILE, FOOTER_FILE];

/// Lowercased, `/`-separated template name for a relative path.
pub fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_lowercase()
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let mut paths = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .map(|entry| entry.map(|e| e.path()).map_err(|e| io_err(dir, e)))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

/// Read the include targets of every view under `views_dir`.
///
/// Only the scheme directories are visited: `theme/` and `page/` contribute
/// their `.tera` files, `template/<name>/` and `wrap/<name>/` contribute their
/// region files. Anything else under the views root is not a view and is
/// never parsed.
fn load_views_tree(views_dir: &Path) -> Result<BTreeMap<String, String>, RenderError> {
    let mut targets = Vec::new();
    for scheme in ViewScheme::all() {
        let scheme_dir = views_dir.join(scheme.dir_name());
        if !scheme_dir.is_dir() {
            continue;
        }
        for entry in sorted_entries(&scheme_dir)? {
            if scheme.is_single_file() {
                let is_view = entry.is_file()
                    && entry.extension().and_then(|s| s.to_str()) == Some(VIEW_FILE_EXTENSION);
                if is_view {
                    targets.push(entry);
                }
            } else if entry.is_dir() {
                targets.extend(
                    REGION_FILES
                        .iter()
                        .map(|region| entry.join(region))
                        .filter(|path| path.is_file()),
                );
            }
        }
    }

    let mut templates = BTreeMap::new();
    for path in targets {
        let rel = path.strip_prefix(views_dir).unwrap_or(path.as_path());
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.insert(normalize_template_name(rel), contents);
    }
    tracing::debug!(dir = %views_dir.display(), count = templates.len(), "loaded view templates");
    Ok(templates)
}

/// Embedded wraps first, then site templates; a site file replaces an
/// embedded one with the same name.
fn build_tera(site: BTreeMap<String, String>) -> Result<Tera, RenderError> {
    let layered: BTreeMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (normalize_template_name(Path::new(name)), (*content).to_string()))
        .chain(
            site.into_iter()
                .map(|(name, content)| (normalize_template_name(Path::new(&name)), content)),
        )
        .collect();

    let mut tera = Tera::default();
    tera.add_raw_templates(layered)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based executor holding embedded wraps plus a site's view tree.
///
/// All templates are parsed once at construction; syntax errors surface
/// there rather than mid-render.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load embedded templates plus the views tree under `views_dir`.
    pub fn new(views_dir: Option<&Path>) -> Result<Self, RenderError> {
        let site = match views_dir {
            Some(dir) if dir.is_dir() => load_views_tree(dir)?,
            _ => BTreeMap::new(),
        };
        Ok(TemplateEngine {
            tera: build_tera(site)?,
        })
    }

    /// Build from in-memory `(name, content)` pairs on top of the embedded templates.
    pub fn from_raw<I, N, C>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let site = templates
            .into_iter()
            .map(|(n, c)| (n.into(), c.into()))
            .collect();
        Ok(TemplateEngine {
            tera: build_tera(site)?,
        })
    }

    /// Sorted names of every loaded template.
    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

impl TemplateExecutor for TemplateEngine {
    fn exists(&self, template: &Path) -> bool {
        let name = normalize_template_name(template);
        self.tera.get_template_names().any(|n| n == name)
    }

    fn execute(&self, template: &Path, ctx: &ExecutionContext<'_>) -> Result<String, RenderError> {
        let name = normalize_template_name(template);
        if !self.exists(template) {
            return Err(RenderError::NotFound {
                path: template.to_path_buf(),
            });
        }
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(&name, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
