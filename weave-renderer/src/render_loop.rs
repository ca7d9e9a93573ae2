//! Render loop controller — drives a document from its theme to a tag-free page.
//!
//! ```text
//! seed route views ─▶ onBeforeParse ─▶ theme
//!      ─▶ body pass (head tokens deferred)
//!      ─▶ onBeforeParseHead ─▶ head pass (nothing deferred)
//!      ─▶ onAfterRender
//! ```
//!
//! Each pass re-parses the page until no tokens remain. Rendered views may
//! themselves contain tokens, so a pass can take several cycles; cycles are
//! counted across both passes and capped by [`RenderConfig::max_iterations`].

use std::collections::BTreeSet;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use weave_core::{resource::ResourceResolver, RenderConfig, Row, RuntimeContext, ViewExtension, ViewScheme};

use crate::binder;
use crate::context::RenderContext;
use crate::engine::TemplateExecutor;
use crate::error::RenderError;
use crate::events::{EventDispatcher, NoopDispatcher, RenderEvent};
use crate::resolver::ViewResolver;
use crate::token::{self, Token};
use crate::view;

/// Composes documents from views.
///
/// A `Renderer` carries no per-document state; every [`Renderer::render`]
/// call builds a fresh [`RenderContext`].
pub struct Renderer<R, E, D = NoopDispatcher> {
    resolver: ViewResolver<R>,
    executor: E,
    events: D,
    config: RenderConfig,
}

impl<R, E> Renderer<R, E, NoopDispatcher>
where
    R: ResourceResolver,
    E: TemplateExecutor,
{
    /// Renderer without event listeners.
    pub fn without_events(resources: R, executor: E) -> Self {
        Renderer::new(resources, executor, NoopDispatcher)
    }
}

impl<R, E, D> Renderer<R, E, D>
where
    R: ResourceResolver,
    E: TemplateExecutor,
    D: EventDispatcher,
{
    pub fn new(resources: R, executor: E, events: D) -> Self {
        Renderer {
            resolver: ViewResolver::new(resources),
            executor,
            events,
            config: RenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn events(&self) -> &D {
        &self.events
    }

    pub fn into_events(self) -> D {
        self.events
    }

    /// Resolve the theme named by `runtime.route.theme` and render it.
    pub fn render_route(&mut self, runtime: RuntimeContext) -> Result<String, RenderError> {
        let theme = self.resolver.resolve_theme(&runtime.route.theme)?;
        self.render(&theme, runtime)
    }

    /// Render `document_root` and every view it transitively includes.
    pub fn render(
        &mut self,
        document_root: &ViewExtension,
        runtime: RuntimeContext,
    ) -> Result<String, RenderError> {
        let mut ctx = RenderContext::new(runtime, token::exclusion_set(&self.config.head_tokens));
        self.seed(&mut ctx);

        self.fire_page(RenderEvent::OnBeforeParse, &mut ctx);

        let mut row = Row::new();
        row.insert("page_name".to_string(), json!(ctx.runtime.route.page));
        ctx.rendered_page = view::render_page(document_root, &ctx, &self.executor, &row)?;
        info!(theme = %document_root.name, "rendered document root");

        let deferred = ctx.exclude_tokens.clone();
        self.pass(&mut ctx, &deferred)?;
        info!(iterations = ctx.iterations, "body pass complete");

        self.fire_page(RenderEvent::OnBeforeParseHead, &mut ctx);

        self.pass(&mut ctx, &BTreeSet::new())?;
        info!(iterations = ctx.iterations, "head pass complete");

        self.fire_page(RenderEvent::OnAfterRender, &mut ctx);
        Ok(ctx.rendered_page)
    }

    /// Pre-resolve the route's page, template and wrap so unnamed tokens can find them.
    fn seed(&self, ctx: &mut RenderContext) {
        let route = &ctx.runtime.route;
        let wanted = [
            (ViewScheme::Page, route.page.clone()),
            (ViewScheme::Template, route.template.clone()),
            (ViewScheme::Wrap, route.wrap.clone()),
        ];
        for (scheme, name) in wanted {
            if name.trim().is_empty() {
                continue;
            }
            match self.resolver.lookup(scheme, &name) {
                Ok(view) => {
                    ctx.seeded.insert(scheme, view);
                }
                Err(err) => debug!(scheme = %scheme, name = %name, "route view skipped: {err}"),
            }
        }
    }

    fn fire_page(&mut self, event: RenderEvent, ctx: &mut RenderContext) {
        let outcome = self.events.dispatch(event, &ctx.page_options());
        ctx.apply(event, outcome);
    }

    fn pass(&mut self, ctx: &mut RenderContext, exclude: &BTreeSet<String>) -> Result<(), RenderError> {
        loop {
            let tokens = token::parse(&ctx.rendered_page, exclude);
            if tokens.is_empty() {
                return Ok(());
            }
            debug!(count = tokens.len(), "parsed tokens");

            for token in &tokens {
                // An identical tag earlier in this cycle already filled every copy.
                if !ctx.rendered_page.contains(&token.raw_match) {
                    debug!(tag = %token.raw_match, "tag already substituted");
                    continue;
                }
                self.render_token(ctx, token)?;
            }

            ctx.iterations += 1;
            if ctx.iterations > self.config.max_iterations {
                return Err(RenderError::LoopLimitExceeded {
                    limit: self.config.max_iterations,
                });
            }
        }
    }

    fn render_token(&mut self, ctx: &mut RenderContext, token: &Token) -> Result<(), RenderError> {
        let target = self.resolver.resolve_seeded(token, ctx)?;
        debug!(kind = %token.kind, name = %token.name, view = %target.name, "resolved token");

        let bound = binder::bind(&target, &ctx.runtime)?;
        let mut parameters = bound.parameters;
        for (key, value) in &token.attributes {
            parameters.insert(key.clone(), Value::String(value.clone()));
        }
        ctx.begin_view(bound.rows, parameters, bound.model_registry);

        let rows = Value::Array(ctx.rows.iter().cloned().map(Value::Object).collect());
        let outcome = self
            .events
            .dispatch(RenderEvent::OnBeforeRenderView, &ctx.view_options(Some(&rows)));
        if let Some(Value::Array(items)) = ctx.apply(RenderEvent::OnBeforeRenderView, outcome) {
            ctx.rows = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect();
        }

        let mut output = view::render(&target, ctx, &self.executor, &mut self.events)?;
        if !token.wrap.is_empty() {
            let wrap = self.resolver.resolve_wrap(&token.wrap, ctx)?;
            output = view::render_wrap(&wrap, ctx, &self.executor, &output)?;
        }
        ctx.rendered_view = output;

        let outcome = self
            .events
            .dispatch(RenderEvent::OnAfterRenderView, &ctx.view_options(None));
        ctx.apply(RenderEvent::OnAfterRenderView, outcome);

        if ctx.rendered_page.contains(&token.raw_match) {
            ctx.rendered_page = ctx.rendered_page.replace(&token.raw_match, &ctx.rendered_view);
            debug!(tag = %token.raw_match, bytes = ctx.rendered_view.len(), "substituted token");
        } else {
            warn!(tag = %token.raw_match, "token no longer present in page; output dropped");
        }
        Ok(())
    }
}
