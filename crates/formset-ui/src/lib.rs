//! Markup primitives built on top of the formset composition runtime.
//!
//! Composables in [`widgets`] emit element, text and fragment nodes into a
//! [`MemoryApplier`](formset_core::MemoryApplier); [`HtmlRenderer`] walks the
//! resulting tree and serialises it, and [`dispatch_click`] delivers
//! activations to the handlers attached by [`widgets::Link`].

pub use formset_core::{Composition, Key, NodeId};
pub use formset_macros::composable;

mod event;
mod renderer;
pub mod widgets;

pub use event::{dispatch_click, ActivationEvent, ActivationOutcome, ClickError, ClickHandler};
pub use renderer::{HtmlRenderer, RenderedNode};
pub use widgets::nodes::{Attributes, ElementNode, FragmentNode, TextNode};
pub use widgets::{Div, Element, Fragment, Heading, HiddenInput, Link, Text};

/// Composition backed by the in-memory applier, as used by hosts and tests.
pub type MarkupComposition = Composition<formset_core::MemoryApplier>;

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod renderer_tests;

#[cfg(test)]
#[path = "tests/widgets_tests.rs"]
mod widgets_tests;
