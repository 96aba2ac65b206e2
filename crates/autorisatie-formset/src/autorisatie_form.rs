#![allow(non_snake_case)]

use formset_core::NodeId;
use formset_ui::{composable, Attributes, Element, HiddenInput};
use serde_json::Value;

use crate::rows::RowData;

pub const AUTORISATIE_FORM_CLASS: &str = "autorisatie-form";

/// Default sub-form for one row.
///
/// Renders a hidden input per supplied field, named `{prefix}-{index}-{key}`;
/// blank rows render an empty container.
#[composable]
pub fn AutorisatieForm(prefix: &str, index: usize, data: Option<&RowData>) -> NodeId {
    let attributes = Attributes::new()
        .class(AUTORISATIE_FORM_CLASS)
        .set("data-index", index.to_string());
    Element("div", attributes, || {
        for (key, value) in data.into_iter().flatten() {
            HiddenInput(&format!("{prefix}-{index}-{key}"), &field_value(value));
        }
    })
}

/// Form value of a JSON field: strings verbatim, null empty, anything else as JSON.
pub fn field_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
