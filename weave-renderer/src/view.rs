//! View renderer — the Page / Template / Wrap state machine.
//!
//! # Template regions
//!
//! ```text
//! custom.tera present?  ── yes ──▶ execute it once with every row visible
//!        │ no
//!        ▼
//! for each row:
//!   decorate row (row_count, even_or_odd, total_rows, last_row, first)
//!   first row  → onBeforeRenderViewHead   → header.tera
//!   every row  → onBeforeRenderViewItem   → body.tera
//!   last row   → onBeforeRenderViewFooter → footer.tera
//! ```
//!
//! Missing region files contribute nothing, but a template or wrap directory
//! with none of them is [`RenderError::NotFound`]. Page and Wrap views fire
//! no events.

use std::path::Path;

use serde_json::{json, Value};

use weave_core::{Row, ViewExtension, ViewScheme};

use crate::context::{ExecutionContext, RenderContext};
use crate::engine::{TemplateExecutor, BODY_FILE, CUSTOM_FILE, FOOTER_FILE, HEADER_FILE};
use crate::error::RenderError;
use crate::events::{EventDispatcher, RenderEvent};

/// Render `view` with the state in `ctx`, selecting the strategy by scheme.
///
/// Wrap views wrap the current `ctx.rendered_view`.
pub fn render<E, D>(
    view: &ViewExtension,
    ctx: &mut RenderContext,
    executor: &E,
    events: &mut D,
) -> Result<String, RenderError>
where
    E: TemplateExecutor + ?Sized,
    D: EventDispatcher + ?Sized,
{
    match view.scheme {
        ViewScheme::Theme | ViewScheme::Page => {
            let row = ctx.rows.first().cloned().unwrap_or_default();
            render_page(view, ctx, executor, &row)
        }
        ViewScheme::Template => render_template(view, ctx, executor, events),
        ViewScheme::Wrap => {
            let content = ctx.rendered_view.clone();
            render_wrap(view, ctx, executor, &content)
        }
    }
}

/// Execute a single-file view. The include target must exist.
pub fn render_page<E>(
    view: &ViewExtension,
    ctx: &RenderContext,
    executor: &E,
    row: &Row,
) -> Result<String, RenderError>
where
    E: TemplateExecutor + ?Sized,
{
    if !executor.exists(&view.include_path) {
        return Err(RenderError::NotFound {
            path: view.include_path.clone(),
        });
    }
    executor.execute(&view.include_path, &ExecutionContext::for_row(ctx, row))
}

/// Row-iterating template rendering; the result is also left in `ctx.rendered_view`.
pub fn render_template<E, D>(
    view: &ViewExtension,
    ctx: &mut RenderContext,
    executor: &E,
    events: &mut D,
) -> Result<String, RenderError>
where
    E: TemplateExecutor + ?Sized,
    D: EventDispatcher + ?Sized,
{
    let dir = view.include_path.as_path();
    require_regions(view, executor, &[CUSTOM_FILE, HEADER_FILE, BODY_FILE, FOOTER_FILE])?;

    let custom = dir.join(CUSTOM_FILE);
    if executor.exists(&custom) {
        let first = ctx.rows.first().cloned().unwrap_or_default();
        let output = executor.execute(&custom, &ExecutionContext::for_row(ctx, &first))?;
        ctx.rendered_view = output.clone();
        return Ok(output);
    }

    ctx.rendered_view.clear();
    if ctx.rows.is_empty() {
        return Ok(String::new());
    }

    let total_rows = ctx.rows.len();
    let rows = ctx.rows.clone();
    let mut even_or_odd = "odd";

    for (index, mut row) in rows.into_iter().enumerate() {
        let row_count = index + 1;
        let first = index == 0;
        let last_row = row_count == total_rows;

        for (key, value) in [
            ("row_count", json!(row_count)),
            ("even_or_odd", json!(even_or_odd)),
            ("total_rows", json!(total_rows)),
            ("last_row", json!(last_row)),
            ("first", json!(first)),
        ] {
            row.insert(key.to_string(), value.clone());
            ctx.parameters.insert(key.to_string(), value);
        }

        if first {
            fire(RenderEvent::OnBeforeRenderViewHead, ctx, events, &mut row);
            append_region(&dir.join(HEADER_FILE), ctx, executor, &row)?;
        }

        fire(RenderEvent::OnBeforeRenderViewItem, ctx, events, &mut row);
        append_region(&dir.join(BODY_FILE), ctx, executor, &row)?;

        if last_row {
            fire(RenderEvent::OnBeforeRenderViewFooter, ctx, events, &mut row);
            append_region(&dir.join(FOOTER_FILE), ctx, executor, &row)?;
        }

        if let Some(slot) = ctx.rows.get_mut(index) {
            *slot = row;
        }
        even_or_odd = if even_or_odd == "odd" { "even" } else { "odd" };
    }

    tracing::debug!(view = %view.name, rows = total_rows, "rendered template view");
    Ok(ctx.rendered_view.clone())
}

/// Surround `content` with a wrap view's header/body/footer.
///
/// The wrap sees a single synthetic row `{title, subtitle, content}` and the
/// wrap view's own parameters.
pub fn render_wrap<E>(
    view: &ViewExtension,
    ctx: &RenderContext,
    executor: &E,
    content: &str,
) -> Result<String, RenderError>
where
    E: TemplateExecutor + ?Sized,
{
    require_regions(view, executor, &[HEADER_FILE, BODY_FILE, FOOTER_FILE])?;

    let mut row = Row::new();
    row.insert("title".to_string(), json!(""));
    row.insert("subtitle".to_string(), json!(""));
    row.insert("content".to_string(), json!(content));

    let exec_ctx = ExecutionContext {
        row: &row,
        rows: std::slice::from_ref(&row),
        parameters: &view.parameters,
        model_registry: &Value::Null,
        runtime: &ctx.runtime,
    };

    let dir = view.include_path.as_path();
    let mut output = String::new();
    for file in [HEADER_FILE, BODY_FILE, FOOTER_FILE] {
        let path = dir.join(file);
        if executor.exists(&path) {
            output.push_str(&executor.execute(&path, &exec_ctx)?);
        }
    }
    Ok(output)
}

fn fire<D>(event: RenderEvent, ctx: &mut RenderContext, events: &mut D, row: &mut Row)
where
    D: EventDispatcher + ?Sized,
{
    let current = Value::Object(row.clone());
    let outcome = events.dispatch(event, &ctx.view_options(Some(&current)));
    if let Some(replacement) = outcome.row() {
        *row = replacement.clone();
    }
    ctx.apply(event, outcome);
}

/// A directory view needs at least one region file; an empty or mistyped
/// include directory is reported instead of rendering nothing.
fn require_regions<E>(view: &ViewExtension, executor: &E, regions: &[&str]) -> Result<(), RenderError>
where
    E: TemplateExecutor + ?Sized,
{
    let dir = view.include_path.as_path();
    if regions.iter().any(|region| executor.exists(&dir.join(region))) {
        return Ok(());
    }
    Err(RenderError::NotFound {
        path: view.include_path.clone(),
    })
}

fn append_region<E>(
    path: &Path,
    ctx: &mut RenderContext,
    executor: &E,
    row: &Row,
) -> Result<(), RenderError>
where
    E: TemplateExecutor + ?Sized,
{
    if !executor.exists(path) {
        return Ok(());
    }
    let output = executor.execute(path, &ExecutionContext::for_row(ctx, row))?;
    ctx.rendered_view.push_str(&output);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
