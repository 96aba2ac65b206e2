#![allow(non_snake_case)]

use formset_core::NodeId;

use super::nodes::{compose_node, FragmentNode};
use crate::composable;

#[composable]
pub fn Fragment(content: impl FnOnce()) -> NodeId {
    let id = compose_node(FragmentNode::default);
    formset_core::push_parent(id);
    content();
    formset_core::pop_parent();
    id
}
