#![allow(non_snake_case)]

use formset_core::NodeId;

use super::nodes::{compose_node, TextNode};
use crate::composable;

#[composable]
pub fn Text(value: &str) -> NodeId {
    let id = compose_node(|| TextNode {
        text: value.to_string(),
    });
    if let Err(err) = formset_core::with_node_mut(id, |node: &mut TextNode| {
        if node.text != value {
            node.text = value.to_string();
        }
    }) {
        debug_assert!(false, "failed to update Text node: {err}");
    }
    id
}
