//! Element widgets

#![allow(non_snake_case)]

use formset_core::NodeId;

use super::nodes::{compose_node, Attributes, ElementNode};
use super::text::Text;
use crate::composable;
use crate::event::ClickHandler;

pub(crate) fn emit_element(
    tag: &str,
    attributes: Attributes,
    on_click: Option<ClickHandler>,
) -> NodeId {
    let id = compose_node(|| ElementNode::new(tag, attributes.clone()));
    if let Err(err) = formset_core::with_node_mut(id, |node: &mut ElementNode| {
        if node.tag != tag {
            node.tag = tag.to_string();
        }
        node.attributes = attributes;
        node.on_click = on_click;
    }) {
        debug_assert!(false, "failed to update element node: {err}");
    }
    id
}

#[composable]
pub fn Element(tag: &str, attributes: Attributes, content: impl FnOnce()) -> NodeId {
    let id = emit_element(tag, attributes, None);
    formset_core::push_parent(id);
    content();
    formset_core::pop_parent();
    id
}

#[composable]
pub fn Div(class: &str, content: impl FnOnce()) -> NodeId {
    Element("div", Attributes::new().class(class), content)
}

/// `<hN>` with a text child; `level` is clamped to 1..=6.
#[composable]
pub fn Heading(level: u8, class: &str, text: &str) -> NodeId {
    let tag = format!("h{}", level.clamp(1, 6));
    Element(&tag, Attributes::new().class(class), || {
        Text(text);
    })
}

#[composable]
pub fn HiddenInput(name: &str, value: &str) -> NodeId {
    let attributes = Attributes::new()
        .set("type", "hidden")
        .set("name", name)
        .set("value", value);
    Element("input", attributes, || {})
}
