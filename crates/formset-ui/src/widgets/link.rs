//! Anchor widget with an activation handler

#![allow(non_snake_case)]

use std::cell::RefCell;
use std::rc::Rc;

use formset_core::NodeId;

use super::element::emit_element;
use super::nodes::Attributes;
use crate::composable;
use crate::event::{ActivationEvent, ClickHandler};

#[composable]
pub fn Link<F>(href: &str, on_click: F, content: impl FnOnce()) -> NodeId
where
    F: FnMut(&ActivationEvent) + 'static,
{
    let handler: ClickHandler = Rc::new(RefCell::new(on_click));
    let id = emit_element("a", Attributes::new().set("href", href), Some(handler));
    formset_core::push_parent(id);
    content();
    formset_core::pop_parent();
    id
}
