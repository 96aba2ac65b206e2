#![allow(non_snake_case)]

use formset_core::NodeId;
use formset_ui::{composable, ActivationEvent, Div, Link, Text};

pub const DEFAULT_ADD_ROW_CLASS: &str = "add-row";

/// `<div class="{class}"><a href="#">{label}</a></div>`.
///
/// Activating the link never navigates; `on_add` receives the event after the
/// default has been suppressed.
#[composable]
pub fn AddRow<F>(class: Option<&str>, label: &str, mut on_add: F) -> NodeId
where
    F: FnMut(&ActivationEvent) + 'static,
{
    Div(class.unwrap_or(DEFAULT_ADD_ROW_CLASS), || {
        Link(
            "#",
            move |event| {
                event.prevent_default();
                on_add(event);
            },
            || {
                Text(label);
            },
        );
    })
}
