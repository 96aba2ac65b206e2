//! Node types for markup widgets

use std::fmt;

use formset_core::{Node, NodeId};
use indexmap::{IndexMap, IndexSet};

use crate::event::ClickHandler;

pub(crate) fn compose_node<N: Node + 'static>(init: impl FnOnce() -> N) -> NodeId {
    formset_core::with_current_composer(|composer| composer.emit_node(init))
}

/// Element attributes in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: IndexMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.set("class", class)
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the whitespace separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

fn move_in_set(children: &mut IndexSet<NodeId>, from: usize, to: usize) {
    if from == to || from >= children.len() {
        return;
    }
    let mut ordered: Vec<NodeId> = children.iter().copied().collect();
    let child = ordered.remove(from);
    let target = to.min(ordered.len());
    ordered.insert(target, child);
    children.clear();
    children.extend(ordered);
}

#[derive(Default)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Attributes,
    pub children: IndexSet<NodeId>,
    pub on_click: Option<ClickHandler>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            children: IndexSet::new(),
            on_click: None,
        }
    }
}

impl fmt::Debug for ElementNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementNode")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("children", &self.children)
            .field("clickable", &self.on_click.is_some())
            .finish()
    }
}

impl Node for ElementNode {
    fn insert_child(&mut self, child: NodeId) {
        self.children.insert(child);
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.shift_remove(&child);
    }

    fn move_child(&mut self, from: usize, to: usize) {
        move_in_set(&mut self.children, from, to);
    }

    fn children(&self) -> Vec<NodeId> {
        self.children.iter().copied().collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
}

impl Node for TextNode {}

/// Groups children without producing an element of its own.
#[derive(Clone, Debug, Default)]
pub struct FragmentNode {
    pub children: IndexSet<NodeId>,
}

impl Node for FragmentNode {
    fn insert_child(&mut self, child: NodeId) {
        self.children.insert(child);
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.shift_remove(&child);
    }

    fn move_child(&mut self, from: usize, to: usize) {
        move_in_set(&mut self.children, from, to);
    }

    fn children(&self) -> Vec<NodeId> {
        self.children.iter().copied().collect()
    }
}
