//! View resolver — maps tokens to [`ViewExtension`]s through the resource collaborator.
//!
//! Only `page` and `wrap` kinds keep their own scheme; every other kind
//! (including the default `template`, and deferred kinds such as `head`)
//! resolves under `Template`.

use weave_core::{
    resource::{self, ResourceResolver},
    ViewExtension, ViewScheme,
};

use crate::context::RenderContext;
use crate::error::RenderError;
use crate::token::Token;

/// Wrap target that selects the route's wrap.
pub const DEFAULT_WRAP: &str = "default";

/// Scheme a token kind resolves under.
pub fn scheme_for_kind(kind: &str) -> ViewScheme {
    match resource::capitalize(kind).as_str() {
        "Page" => ViewScheme::Page,
        "Wrap" => ViewScheme::Wrap,
        _ => ViewScheme::Template,
    }
}

/// Resolver over a resource collaborator.
pub struct ViewResolver<R> {
    resources: R,
}

impl<R: ResourceResolver> ViewResolver<R> {
    pub fn new(resources: R) -> Self {
        ViewResolver { resources }
    }

    /// Look up `scheme`/`name` directly.
    pub fn lookup(&self, scheme: ViewScheme, name: &str) -> Result<ViewExtension, RenderError> {
        let reference = resource::reference(scheme, &name.to_lowercase());
        self.resources
            .get(&reference)
            .ok_or(RenderError::Resolution { reference })
    }

    /// Resolve the view a token refers to.
    pub fn resolve(&self, token: &Token) -> Result<ViewExtension, RenderError> {
        self.lookup(scheme_for_kind(&token.kind), &token.name)
    }

    /// Resolve a token, consulting the route views seeded in `ctx` first:
    /// an unnamed page or template token means the route's page or template.
    pub fn resolve_seeded(&self, token: &Token, ctx: &RenderContext) -> Result<ViewExtension, RenderError> {
        let scheme = scheme_for_kind(&token.kind);
        if token.name.is_empty() {
            if let Some(view) = ctx.seeded(scheme) {
                return Ok(view.clone());
            }
        }
        self.lookup(scheme, &token.name)
    }

    /// Resolve a token's wrap target; `default` means the route's wrap.
    pub fn resolve_wrap(&self, target: &str, ctx: &RenderContext) -> Result<ViewExtension, RenderError> {
        if target.eq_ignore_ascii_case(DEFAULT_WRAP) {
            if let Some(view) = ctx.seeded(ViewScheme::Wrap) {
                return Ok(view.clone());
            }
        }
        self.lookup(ViewScheme::Wrap, target)
    }

    /// Resolve a theme (document root) by name.
    pub fn resolve_theme(&self, name: &str) -> Result<ViewExtension, RenderError> {
        self.lookup(ViewScheme::Theme, name)
    }
}
