//! Render context — the mutable state threaded through one document render.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use weave_core::{Parameters, Row, RuntimeContext, ViewExtension, ViewScheme};

use crate::events::{EventOutcome, RenderEvent, RenderEventOptions};

/// State of one top-level render.
///
/// Created by [`crate::Renderer::render`] and dropped when it returns; never
/// shared between renders.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Current document text.
    pub rendered_page: String,
    /// Output of the view currently being rendered.
    pub rendered_view: String,
    pub runtime: RuntimeContext,
    /// Rows bound to the current view.
    pub rows: Vec<Row>,
    pub parameters: Parameters,
    pub model_registry: Value,
    /// Token kinds/names deferred to the head pass.
    pub exclude_tokens: BTreeSet<String>,
    /// Parse cycles completed so far, across both passes.
    pub iterations: usize,
    /// Route views resolved up front, keyed by scheme.
    pub(crate) seeded: BTreeMap<ViewScheme, ViewExtension>,
}

impl RenderContext {
    pub fn new(runtime: RuntimeContext, exclude_tokens: BTreeSet<String>) -> Self {
        RenderContext {
            rendered_page: String::new(),
            rendered_view: String::new(),
            runtime,
            rows: Vec::new(),
            parameters: Parameters::new(),
            model_registry: Value::Null,
            exclude_tokens,
            iterations: 0,
            seeded: BTreeMap::new(),
        }
    }

    /// The route view seeded for `scheme`, if any.
    pub fn seeded(&self, scheme: ViewScheme) -> Option<&ViewExtension> {
        self.seeded.get(&scheme)
    }

    /// Reset per-view state before a token is rendered.
    pub fn begin_view(&mut self, rows: Vec<Row>, parameters: Parameters, model_registry: Value) {
        self.rows = rows;
        self.parameters = parameters;
        self.model_registry = model_registry;
        self.rendered_view.clear();
    }

    /// Options for page-level events.
    pub fn page_options(&self) -> RenderEventOptions<'_> {
        RenderEventOptions {
            rendered_page: Some(self.rendered_page.as_str()),
            ..RenderEventOptions::new(&self.runtime)
        }
    }

    /// Options for view-level events; `query_results` is supplied by the caller.
    pub fn view_options<'a>(&'a self, query_results: Option<&'a Value>) -> RenderEventOptions<'a> {
        RenderEventOptions {
            runtime_data: &self.runtime,
            parameters: Some(&self.parameters),
            query: None,
            model_registry: Some(&self.model_registry),
            query_results,
            rendered_view: Some(self.rendered_view.as_str()),
            rendered_page: Some(self.rendered_page.as_str()),
        }
    }

    /// Merge a dispatcher's sparse outcome back into the context.
    ///
    /// `query_results` is returned rather than applied: only the template loop
    /// knows which row it replaces.
    pub fn apply(&mut self, event: RenderEvent, outcome: EventOutcome) -> Option<Value> {
        if outcome.is_unchanged() {
            return None;
        }
        tracing::debug!(event = event.as_str(), "applying event outcome");
        let EventOutcome {
            runtime_data,
            parameters,
            model_registry,
            query_results,
            rendered_view,
            rendered_page,
        } = outcome;
        if let Some(runtime) = runtime_data {
            self.runtime = runtime;
        }
        if let Some(parameters) = parameters {
            self.parameters = parameters;
        }
        if let Some(registry) = model_registry {
            self.model_registry = registry;
        }
        if let Some(view) = rendered_view {
            self.rendered_view = view;
        }
        if let Some(page) = rendered_page {
            self.rendered_page = page;
        }
        query_results
    }
}

/// Payload handed to a template executor.
///
/// Tera templates see `row`, `rows`, `parameters`, `model_registry` and
/// `runtime` as top-level variables.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExecutionContext<'a> {
    pub row: &'a Row,
    pub rows: &'a [Row],
    pub parameters: &'a Parameters,
    pub model_registry: &'a Value,
    pub runtime: &'a RuntimeContext,
}

impl<'a> ExecutionContext<'a> {
    /// Context exposing one row of the current view.
    pub fn for_row(ctx: &'a RenderContext, row: &'a Row) -> Self {
        ExecutionContext {
            row,
            rows: &ctx.rows,
            parameters: &ctx.parameters,
            model_registry: &ctx.model_registry,
            runtime: &ctx.runtime,
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, crate::RenderError> {
        tera::Context::from_serialize(self).map_err(crate::RenderError::from)
    }
}
