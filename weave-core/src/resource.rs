//! Resource collaborator — maps symbolic view references to [`ViewExtension`]s.
//!
//! # Reference format
//!
//! ```text
//! {Scheme}:///App//View//{Scheme}//{Name}
//! Template:///App//View//Template//Articles
//! ```
//!
//! `Name` is the view name with its first character upper-cased.
//!
//! # Sources
//!
//! A [`ResourceMap`] for a site is assembled in three layers, later layers
//! overriding earlier ones:
//!
//! 1. built-in wraps ([`BUILTIN_WRAPS`]),
//! 2. views discovered under `<site>/views/`,
//! 3. entries declared in `weave.yaml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{self, SiteManifest, ViewEntry};
use crate::error::{io_err, SiteError};
use crate::types::{ViewExtension, ViewScheme};

/// Extension of include files under the views tree.
pub const VIEW_FILE_EXTENSION: &str = "tera";

/// Wrap views that are always resolvable; their templates ship with the renderer.
pub const BUILTIN_WRAPS: &[&str] = &["none", "div", "section"];

// ---------------------------------------------------------------------------
// Resolver trait
// ---------------------------------------------------------------------------

/// Lookup capability consumed by the view resolver.
pub trait ResourceResolver {
    /// Returns `None` when the reference is unknown.
    fn get(&self, reference: &str) -> Option<ViewExtension>;
}

impl<R: ResourceResolver + ?Sized> ResourceResolver for &R {
    fn get(&self, reference: &str) -> Option<ViewExtension> {
        (**self).get(reference)
    }
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the reference key for a scheme/name pair.
pub fn reference(scheme: ViewScheme, name: &str) -> String {
    let scheme = scheme.title();
    format!("{scheme}:///App//View//{scheme}//{}", capitalize(name))
}

/// Conventional include path for a view: `page/<name>.tera`, `template/<name>`, ...
pub fn default_include_path(scheme: ViewScheme, name: &str) -> PathBuf {
    let dir = PathBuf::from(scheme.dir_name());
    if scheme.is_single_file() {
        dir.join(format!("{name}.{VIEW_FILE_EXTENSION}"))
    } else {
        dir.join(name)
    }
}

// ---------------------------------------------------------------------------
// ResourceMap
// ---------------------------------------------------------------------------

/// In-memory resource collaborator keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    views: BTreeMap<String, ViewExtension>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding only the built-in wraps.
    pub fn with_builtins() -> Self {
        let mut map = Self::new();
        for name in BUILTIN_WRAPS {
            map.insert(ViewExtension::new(
                ViewScheme::Wrap,
                *name,
                default_include_path(ViewScheme::Wrap, name),
            ));
        }
        map
    }

    /// Assemble the full map for a site: built-ins, discovered views, manifest entries.
    pub fn for_site(site: &Path, manifest: &SiteManifest) -> Result<Self, SiteError> {
        let views_dir = config::views_dir_at(site);
        if !views_dir.is_dir() {
            return Err(SiteError::ViewsDirNotFound { path: views_dir });
        }
        let mut map = Self::with_builtins();
        map.discover_at(&views_dir)?;
        map.apply_manifest(&manifest.views)?;
        Ok(map)
    }

    /// Insert or replace a view; returns the previous entry for the same reference.
    pub fn insert(&mut self, view: ViewExtension) -> Option<ViewExtension> {
        self.views.insert(reference(view.scheme, &view.name), view)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// All views ordered by reference.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ViewExtension)> {
        self.views.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a theme by name.
    pub fn theme(&self, name: &str) -> Result<ViewExtension, SiteError> {
        self.get(&reference(ViewScheme::Theme, &name.to_lowercase()))
            .ok_or_else(|| SiteError::ThemeNotFound {
                name: name.to_string(),
            })
    }

    /// Register every view found under `views_dir`.
    ///
    /// Theme and page views are `<scheme>/<name>.tera` files; template and wrap
    /// views are `<scheme>/<name>/` directories. Anything else is ignored.
    pub fn discover_at(&mut self, views_dir: &Path) -> Result<usize, SiteError> {
        let mut found = 0;
        for scheme in ViewScheme::all() {
            let dir = views_dir.join(scheme.dir_name());
            if !dir.is_dir() {
                continue;
            }
            let mut entries: Vec<_> = std::fs::read_dir(&dir)
                .map_err(|e| io_err(&dir, e))?
                .filter_map(|e| e.ok())
                .collect();
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let path = entry.path();
                let Some(name) = discovered_name(*scheme, &path) else {
                    continue;
                };
                self.insert(ViewExtension::new(
                    *scheme,
                    name.clone(),
                    default_include_path(*scheme, &name),
                ));
                found += 1;
            }
        }
        Ok(found)
    }

    /// Merge manifest entries: parameters of an existing view are extended
    /// (entry wins per key); unknown views are added.
    pub fn apply_manifest(&mut self, entries: &[ViewEntry]) -> Result<(), SiteError> {
        for entry in entries {
            let name = entry.name.trim().to_lowercase();
            if name.is_empty() || name.contains('/') || name.contains('\\') {
                return Err(SiteError::InvalidView {
                    name: entry.name.clone(),
                    reason: "name must be non-empty and contain no path separators".to_string(),
                });
            }
            let key = reference(entry.scheme, &name);
            let view = self.views.entry(key).or_insert_with(|| {
                ViewExtension::new(entry.scheme, name.clone(), default_include_path(entry.scheme, &name))
            });
            if let Some(path) = &entry.include_path {
                view.include_path = path.clone();
            }
            for (k, v) in &entry.parameters {
                view.parameters.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

impl ResourceResolver for ResourceMap {
    fn get(&self, reference: &str) -> Option<ViewExtension> {
        self.views.get(reference).cloned()
    }
}

fn discovered_name(scheme: ViewScheme, path: &Path) -> Option<String> {
    if scheme.is_single_file() {
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some(VIEW_FILE_EXTENSION) {
            return None;
        }
        path.file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
    } else if path.is_dir() {
        path.file_name()
            .map(|s| s.to_string_lossy().to_lowercase())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_format() {
        assert_eq!(
            reference(ViewScheme::Template, "articles"),
            "Template:///App//View//Template//Articles"
        );
        assert_eq!(
            reference(ViewScheme::Wrap, "div"),
            "Wrap:///App//View//Wrap//Div"
        );
    }

    #[test]
    fn capitalize_only_touches_first_char() {
        assert_eq!(capitalize("article_list"), "Article_list");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
    }

    #[test]
    fn default_include_paths() {
        assert_eq!(
            default_include_path(ViewScheme::Page, "home"),
            PathBuf::from("page/home.tera")
        );
        assert_eq!(
            default_include_path(ViewScheme::Template, "list"),
            PathBuf::from("template/list")
        );
    }

    #[test]
    fn builtins_are_resolvable() {
        let map = ResourceMap::with_builtins();
        for name in BUILTIN_WRAPS {
            let view = map.get(&reference(ViewScheme::Wrap, name)).expect("builtin wrap");
            assert_eq!(view.scheme, ViewScheme::Wrap);
        }
        assert!(map.get(&reference(ViewScheme::Template, "none")).is_none());
    }

    #[test]
    fn manifest_entry_rejects_path_names() {
        let mut map = ResourceMap::new();
        let entry = ViewEntry {
            scheme: ViewScheme::Page,
            name: "../etc".to_string(),
            include_path: None,
            parameters: Default::default(),
        };
        let err = map.apply_manifest(&[entry]).unwrap_err();
        assert!(matches!(err, SiteError::InvalidView { .. }));
    }
}
