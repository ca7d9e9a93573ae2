//! Lifecycle events fired by the render loop and the view renderer.
//!
//! Application code implements [`EventDispatcher`] to observe or mutate
//! render state at fixed extension points. Every dispatch receives the full
//! [`RenderEventOptions`] payload and answers with a sparse [`EventOutcome`];
//! fields left `None` keep their current value.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use weave_core::{Parameters, Row, RuntimeContext};

/// Extension points, in the order a render reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderEvent {
    OnBeforeParse,
    OnBeforeRenderView,
    OnBeforeRenderViewHead,
    OnBeforeRenderViewItem,
    OnBeforeRenderViewFooter,
    OnAfterRenderView,
    OnBeforeParseHead,
    OnAfterRender,
}

impl RenderEvent {
    /// Event name as application plugins know it.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderEvent::OnBeforeParse => "onBeforeParse",
            RenderEvent::OnBeforeRenderView => "onBeforeRenderView",
            RenderEvent::OnBeforeRenderViewHead => "onBeforeRenderViewHead",
            RenderEvent::OnBeforeRenderViewItem => "onBeforeRenderViewItem",
            RenderEvent::OnBeforeRenderViewFooter => "onBeforeRenderViewFooter",
            RenderEvent::OnAfterRenderView => "onAfterRenderView",
            RenderEvent::OnBeforeParseHead => "onBeforeParseHead",
            RenderEvent::OnAfterRender => "onAfterRender",
        }
    }
}

impl fmt::Display for RenderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of render state handed to a dispatcher.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RenderEventOptions<'a> {
    pub runtime_data: &'a RuntimeContext,
    pub parameters: Option<&'a Parameters>,
    /// Reserved; the engine never issues queries itself.
    pub query: Option<&'a Value>,
    pub model_registry: Option<&'a Value>,
    /// The current row inside a template loop, or the whole row set otherwise.
    pub query_results: Option<&'a Value>,
    pub rendered_view: Option<&'a str>,
    pub rendered_page: Option<&'a str>,
}

impl<'a> RenderEventOptions<'a> {
    /// Options carrying only the runtime context.
    pub fn new(runtime_data: &'a RuntimeContext) -> Self {
        RenderEventOptions {
            runtime_data,
            parameters: None,
            query: None,
            model_registry: None,
            query_results: None,
            rendered_view: None,
            rendered_page: None,
        }
    }
}

/// Sparse changes returned by a dispatcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOutcome {
    pub runtime_data: Option<RuntimeContext>,
    pub parameters: Option<Parameters>,
    pub model_registry: Option<Value>,
    /// Replaces the current row (template loop) when it is an object.
    pub query_results: Option<Value>,
    pub rendered_view: Option<String>,
    pub rendered_page: Option<String>,
}

impl EventOutcome {
    /// No changes.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }

    /// The replacement row, if `query_results` holds an object.
    pub fn row(&self) -> Option<&Row> {
        self.query_results.as_ref().and_then(Value::as_object)
    }
}

/// Synchronous event sink held by the renderer.
pub trait EventDispatcher {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome;
}

impl<D: EventDispatcher + ?Sized> EventDispatcher for &mut D {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        (**self).dispatch(event, options)
    }
}

impl<D: EventDispatcher + ?Sized> EventDispatcher for Box<D> {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        (**self).dispatch(event, options)
    }
}

/// Dispatcher that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl EventDispatcher for NoopDispatcher {
    fn dispatch(&mut self, _event: RenderEvent, _options: &RenderEventOptions<'_>) -> EventOutcome {
        EventOutcome::unchanged()
    }
}

/// Adapts a closure into an [`EventDispatcher`].
pub struct FnDispatcher<F>(pub F);

impl<F> EventDispatcher for FnDispatcher<F>
where
    F: FnMut(RenderEvent, &RenderEventOptions<'_>) -> EventOutcome,
{
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        (self.0)(event, options)
    }
}

/// Dispatcher that emits a `tracing` event per dispatch and changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl EventDispatcher for TracingDispatcher {
    fn dispatch(&mut self, event: RenderEvent, options: &RenderEventOptions<'_>) -> EventOutcome {
        tracing::trace!(
            event = event.as_str(),
            view_len = options.rendered_view.map_or(0, str::len),
            page_len = options.rendered_page.map_or(0, str::len),
            "render event"
        );
        EventOutcome::unchanged()
    }
}
