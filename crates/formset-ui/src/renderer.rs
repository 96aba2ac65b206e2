use formset_core::{AsAny, MemoryApplier, NodeError, NodeId};

use crate::widgets::nodes::{Attributes, ElementNode, FragmentNode, TextNode};

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// Snapshot of the composed markup tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderedNode {
    Element {
        id: NodeId,
        tag: String,
        attributes: Attributes,
        children: Vec<RenderedNode>,
    },
    Text {
        id: NodeId,
        text: String,
    },
    Fragment {
        id: NodeId,
        children: Vec<RenderedNode>,
    },
}

impl RenderedNode {
    pub fn id(&self) -> NodeId {
        match self {
            RenderedNode::Element { id, .. }
            | RenderedNode::Text { id, .. }
            | RenderedNode::Fragment { id, .. } => *id,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            RenderedNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn children(&self) -> &[RenderedNode] {
        match self {
            RenderedNode::Element { children, .. } | RenderedNode::Fragment { children, .. } => {
                children
            }
            RenderedNode::Text { .. } => &[],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            RenderedNode::Element { attributes, .. } => attributes.get(name),
            _ => None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        match self {
            RenderedNode::Element { attributes, .. } => attributes.has_class(class),
            _ => false,
        }
    }

    /// Depth-first, document order.
    pub fn find_all(&self, predicate: impl Fn(&RenderedNode) -> bool) -> Vec<&RenderedNode> {
        let mut found = Vec::new();
        self.collect(&predicate, &mut found);
        found
    }

    fn collect<'a>(
        &'a self,
        predicate: &dyn Fn(&RenderedNode) -> bool,
        found: &mut Vec<&'a RenderedNode>,
    ) {
        if predicate(self) {
            found.push(self);
        }
        for child in self.children() {
            child.collect(predicate, found);
        }
    }

    pub fn find_by_class(&self, class: &str) -> Vec<&RenderedNode> {
        self.find_all(|node| node.has_class(class))
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<&RenderedNode> {
        self.find_all(|node| node.tag() == Some(tag))
    }

    /// Value of the first `<input>` whose `name` matches.
    pub fn input_value(&self, name: &str) -> Option<&str> {
        self.find_all(|node| node.tag() == Some("input") && node.attribute("name") == Some(name))
            .into_iter()
            .next()
            .and_then(|node| node.attribute("value"))
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            RenderedNode::Text { text, .. } => out.push_str(text),
            _ => {
                for child in self.children() {
                    child.push_text(out);
                }
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            RenderedNode::Text { text, .. } => escape_into(out, text, false),
            RenderedNode::Fragment { children, .. } => {
                for child in children {
                    child.write_html(out);
                }
            }
            RenderedNode::Element {
                tag,
                attributes,
                children,
                ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes.iter() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(out: &mut String, value: &str, attribute: bool) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Walks the applier from a root node and snapshots the markup tree.
pub struct HtmlRenderer<'a> {
    applier: &'a MemoryApplier,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(applier: &'a MemoryApplier) -> Self {
        Self { applier }
    }

    pub fn render(&self, root: NodeId) -> Result<RenderedNode, NodeError> {
        let node = self.applier.get(root)?;
        let any = node.as_any();
        log::trace!("render node #{root} ({})", node.type_name());
        if let Some(element) = any.downcast_ref::<ElementNode>() {
            let children = self.render_children(element.children.iter().copied())?;
            return Ok(RenderedNode::Element {
                id: root,
                tag: element.tag.clone(),
                attributes: element.attributes.clone(),
                children,
            });
        }
        if let Some(text) = any.downcast_ref::<TextNode>() {
            return Ok(RenderedNode::Text {
                id: root,
                text: text.text.clone(),
            });
        }
        if let Some(fragment) = any.downcast_ref::<FragmentNode>() {
            let children = self.render_children(fragment.children.iter().copied())?;
            return Ok(RenderedNode::Fragment { id: root, children });
        }
        Err(NodeError::TypeMismatch {
            id: root,
            expected: "markup node",
        })
    }

    pub fn render_html(&self, root: NodeId) -> Result<String, NodeError> {
        Ok(self.render(root)?.to_html())
    }

    fn render_children(
        &self,
        children: impl Iterator<Item = NodeId>,
    ) -> Result<Vec<RenderedNode>, NodeError> {
        children.map(|child| self.render(child)).collect()
    }
}
