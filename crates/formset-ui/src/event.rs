use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formset_core::{MemoryApplier, NodeError, NodeId};

use crate::widgets::nodes::ElementNode;

pub type ClickHandler = Rc<RefCell<dyn FnMut(&ActivationEvent)>>;

/// Activation delivered to a click handler.
#[derive(Debug)]
pub struct ActivationEvent {
    target: NodeId,
    default_prevented: Cell<bool>,
}

impl ActivationEvent {
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            default_prevented: Cell::new(false),
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Suppress the default action (following the link).
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationOutcome {
    pub target: NodeId,
    pub default_prevented: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClickError {
    #[error("node {id} has no click handler")]
    NotClickable { id: NodeId },
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Invoke the click handler attached to `id`.
///
/// The handler is cloned out of the applier before it runs, so it is free to
/// write state that schedules a recomposition of the same tree.
pub fn dispatch_click(
    applier: &mut MemoryApplier,
    id: NodeId,
) -> Result<ActivationOutcome, ClickError> {
    let handler = match applier.with_node(id, |node: &mut ElementNode| node.on_click.clone()) {
        Ok(handler) => handler.ok_or(ClickError::NotClickable { id })?,
        Err(NodeError::TypeMismatch { .. }) => return Err(ClickError::NotClickable { id }),
        Err(err) => return Err(err.into()),
    };
    let event = ActivationEvent::new(id);
    log::debug!("dispatching click to node #{id}");
    (&mut *handler.borrow_mut())(&event);
    Ok(ActivationOutcome {
        target: id,
        default_prevented: event.default_prevented(),
    })
}
