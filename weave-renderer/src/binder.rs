//! Data binder — decides which rows, model registry and parameters a view renders with.
//!
//! Policy precedence:
//! 1. theme/page/wrap views take no data
//! 2. `model_name: primary` reads the runtime's primary result set
//! 3. missing or blank `model_name` binds nothing (the view sources its own data)
//! 4. `model_type: runtime_data` reads `runtime.data[model_name]`
//! 5. `model_type: plugin_data` reads `runtime.plugin_data[model_name]`
//! 6. anything else reads the precomputed `runtime.plugin_data[model_name].{data, model_registry}`

use serde_json::Value;

use weave_core::{Parameters, Row, RuntimeContext, ViewExtension, ViewScheme};

use crate::error::RenderError;

/// Name of the primary result set.
pub const PRIMARY_MODEL: &str = "primary";
pub const MODEL_TYPE_RUNTIME: &str = "runtime_data";
pub const MODEL_TYPE_PLUGIN: &str = "plugin_data";

/// Key under which rows may carry parameters for the view.
const PARAMETERS_KEY: &str = "parameters";

/// Result of binding a view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundData {
    pub rows: Vec<Row>,
    pub model_registry: Value,
    pub parameters: Parameters,
}

/// Bind data for `view` from `runtime`.
pub fn bind(view: &ViewExtension, runtime: &RuntimeContext) -> Result<BoundData, RenderError> {
    let mut bound = BoundData {
        parameters: view.parameters.clone(),
        ..BoundData::default()
    };

    if !matches!(view.scheme, ViewScheme::Template) {
        return Ok(bound);
    }

    let model_name = view.model_name().map(str::trim).unwrap_or_default();
    let (data, registry) = if model_name == PRIMARY_MODEL {
        (
            runtime.primary.data.clone(),
            runtime.primary.model_registry.clone(),
        )
    } else if model_name.is_empty() {
        return Ok(bound);
    } else {
        match view.model_type().map(str::trim) {
            Some(MODEL_TYPE_RUNTIME) => (
                lookup(&runtime.data, model_name, MODEL_TYPE_RUNTIME, view)?,
                Value::Null,
            ),
            Some(MODEL_TYPE_PLUGIN) => (
                lookup(&runtime.plugin_data, model_name, MODEL_TYPE_PLUGIN, view)?,
                Value::Null,
            ),
            _ => precomputed(runtime, model_name, view)?,
        }
    };

    let (rows, extracted) = rows_from(data);
    for (key, value) in extracted {
        bound.parameters.insert(key, value);
    }
    bound.rows = rows;
    bound.model_registry = registry;
    tracing::debug!(
        view = %view.name,
        model = model_name,
        rows = bound.rows.len(),
        "bound view data"
    );
    Ok(bound)
}

fn lookup(
    source: &serde_json::Map<String, Value>,
    model_name: &str,
    namespace: &str,
    view: &ViewExtension,
) -> Result<Value, RenderError> {
    source.get(model_name).cloned().ok_or_else(|| {
        RenderError::Configuration(format!(
            "view '{}' reads {namespace}.{model_name}, which the runtime does not provide",
            view.name
        ))
    })
}

fn precomputed(
    runtime: &RuntimeContext,
    model_name: &str,
    view: &ViewExtension,
) -> Result<(Value, Value), RenderError> {
    let entry = runtime
        .plugin_data
        .get(model_name)
        .and_then(Value::as_object)
        .filter(|entry| entry.contains_key("data"))
        .ok_or_else(|| {
            RenderError::Configuration(format!(
                "view '{}' expects precomputed plugin_data.{model_name}.data; \
                 set model_type or populate it from an earlier event",
                view.name
            ))
        })?;
    Ok((
        entry.get("data").cloned().unwrap_or(Value::Null),
        entry.get("model_registry").cloned().unwrap_or(Value::Null),
    ))
}

/// Split a data value into rows, pulling nested `parameters` objects out.
///
/// Arrays yield one row per element, null yields none, anything else a single
/// row. Non-object elements become `{"value": element}`.
fn rows_from(data: Value) -> (Vec<Row>, Parameters) {
    let items = match data {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut parameters = Parameters::new();
    let rows = items
        .into_iter()
        .map(|item| {
            let mut row = match item {
                Value::Object(map) => map,
                other => {
                    let mut row = Row::new();
                    row.insert("value".to_string(), other);
                    row
                }
            };
            if let Some(Value::Object(extracted)) = row.remove(PARAMETERS_KEY) {
                parameters.extend(extracted);
            }
            row
        })
        .collect();
    (rows, parameters)
}
