//! # weave-renderer
//!
//! Recursive template composition: a theme is rendered, its `<include ... />`
//! placeholders are resolved to views, each view is bound to data and
//! rendered, and the output is substituted back until no placeholders remain.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use weave_core::{ResourceMap, RuntimeContext, SiteManifest};
//! use weave_renderer::{Renderer, TemplateEngine};
//!
//! fn render_site(site: &Path) -> Result<String, weave_renderer::RenderError> {
//!     let manifest = SiteManifest::default();
//!     let resources = ResourceMap::for_site(site, &manifest)?;
//!     let engine = TemplateEngine::new(Some(&site.join("views")))?;
//!     let mut renderer = Renderer::without_events(resources, engine)
//!         .with_config(manifest.render.clone());
//!     renderer.render_route(RuntimeContext::default())
//! }
//! ```

pub mod binder;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod render_loop;
pub mod resolver;
pub mod token;
pub mod view;

pub use binder::{bind, BoundData};
pub use context::{ExecutionContext, RenderContext};
pub use engine::{TemplateEngine, TemplateExecutor};
pub use error::RenderError;
pub use events::{
    EventDispatcher, EventOutcome, FnDispatcher, NoopDispatcher, RenderEvent, RenderEventOptions,
    TracingDispatcher,
};
pub use render_loop::Renderer;
pub use resolver::ViewResolver;
pub use token::Token;
