use formset_core::{location_key, Composition, Key, MemoryApplier, NodeError, NodeId, RuntimeHandle};
use formset_runtime_std::StdRuntime;
use formset_ui::{dispatch_click, ActivationOutcome, ClickError, HtmlRenderer, RenderedNode};

/// Headless harness for exercising compositions in tests.
///
/// Owns an in-memory applier on a [`StdRuntime`] and exposes helpers for
/// driving recomposition, rendering markup and delivering clicks.
pub struct ComposeTestRule {
    composition: Composition<MemoryApplier>,
    runtime: StdRuntime,
    root_key: Key,
    has_content: bool,
}

impl ComposeTestRule {
    pub fn new() -> Self {
        let runtime = StdRuntime::new();
        Self {
            composition: Composition::with_runtime(MemoryApplier::new(), runtime.runtime()),
            runtime,
            root_key: location_key(file!(), line!(), column!()),
            has_content: false,
        }
    }

    /// Install the provided content into the composition and perform an
    /// initial render.
    pub fn set_content(&mut self, content: impl FnMut() + 'static) -> Result<(), NodeError> {
        self.has_content = true;
        self.composition.render(self.root_key, content)
    }

    /// Force a recomposition using the currently installed content.
    pub fn recomposition(&mut self) -> Result<(), NodeError> {
        self.composition.recompose()
    }

    /// Process invalidated scopes until the composition is idle.
    pub fn pump_until_idle(&mut self) -> Result<(), NodeError> {
        while self.composition.should_render() {
            self.runtime.take_frame_request();
            if self.runtime_handle().has_invalid_scopes() {
                self.composition.process_invalid_scopes()?;
            } else {
                self.composition.recompose()?;
            }
        }
        Ok(())
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.composition.runtime_handle()
    }

    /// Returns whether a state write requested a frame since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.runtime.take_frame_request()
    }

    pub fn applier_mut(&mut self) -> &mut MemoryApplier {
        self.composition.applier_mut()
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.composition.root()
    }

    pub fn composition(&mut self) -> &mut Composition<MemoryApplier> {
        &mut self.composition
    }

    /// Snapshot of the current markup tree, `None` before anything was emitted.
    pub fn rendered(&self) -> Result<Option<RenderedNode>, NodeError> {
        self.root_id()
            .map(|root| HtmlRenderer::new(self.composition.applier()).render(root))
            .transpose()
    }

    pub fn markup(&self) -> Result<String, NodeError> {
        Ok(self
            .rendered()?
            .map(|tree| tree.to_html())
            .unwrap_or_default())
    }

    /// Deliver a click to `id`, then recompose whatever the handler invalidated.
    pub fn click(&mut self, id: NodeId) -> Result<ActivationOutcome, ClickError> {
        let outcome = dispatch_click(self.composition.applier_mut(), id)?;
        self.pump_until_idle()?;
        Ok(outcome)
    }

    /// Ids of all elements carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Result<Vec<NodeId>, NodeError> {
        Ok(self
            .rendered()?
            .map(|tree| tree.find_by_class(class).iter().map(|node| node.id()).collect())
            .unwrap_or_default())
    }
}

impl Default for ComposeTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `ComposeTestRule`.
pub fn run_test_composition<R>(f: impl FnOnce(&mut ComposeTestRule) -> R) -> R {
    let mut rule = ComposeTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formset_core::{useState, with_current_composer, with_node_mut, MutableState, Node};
    use formset_ui::{Div, Link, Text};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct TestNode {
        value: i32,
    }

    impl Node for TestNode {}

    #[test]
    fn compose_test_rule_reports_content_and_root() {
        run_test_composition(|rule| {
            assert!(!rule.has_content());
            assert!(rule.root_id().is_none());
            assert_eq!(rule.markup().expect("empty markup"), "");

            let runtime = rule.runtime_handle();
            let state = MutableState::with_runtime(0, runtime.clone());
            let recompositions = Rc::new(Cell::new(0));

            rule.set_content({
                let state = state.clone();
                let recompositions = Rc::clone(&recompositions);
                move || {
                    recompositions.set(recompositions.get() + 1);
                    let id = with_current_composer(|composer| composer.emit_node(TestNode::default));
                    let value = state.value();
                    with_node_mut(id, |node: &mut TestNode| {
                        node.value = value;
                    })
                    .expect("update node value");
                }
            })
            .expect("install content");

            assert!(rule.has_content());
            assert_eq!(recompositions.get(), 1);

            let root = rule.root_id().expect("root id available");
            state.set_value(5);
            assert!(rule.take_frame_request());
            rule.pump_until_idle().expect("process invalidation");

            assert_eq!(recompositions.get(), 2);
            let updated = rule
                .applier_mut()
                .with_node(root, |node: &mut TestNode| node.value)
                .expect("read updated node");
            assert_eq!(updated, 5);
        });
    }

    #[test]
    fn click_recomposes_and_markup_follows() {
        thread_local! {
            static LINK: Cell<Option<NodeId>> = const { Cell::new(None) };
            static COUNT: RefCell<Option<MutableState<u32>>> = const { RefCell::new(None) };
        }

        let mut rule = ComposeTestRule::new();
        rule.set_content(|| {
            Div("counter", || {
                let count = useState(|| 0u32);
                COUNT.with(|slot| *slot.borrow_mut() = Some(count.clone()));
                Text(&count.value().to_string());
                let link = Link(
                    "#",
                    move |event| {
                        event.prevent_default();
                        count.update(|value| *value += 1);
                    },
                    || {
                        Text("+");
                    },
                );
                LINK.with(|slot| slot.set(Some(link)));
            });
        })
        .expect("install content");

        assert_eq!(
            rule.markup().expect("markup"),
            r##"<div class="counter">0<a href="#">+</a></div>"##
        );
        let link = LINK.with(|slot| slot.get()).expect("link");
        let outcome = rule.click(link).expect("click");
        assert!(outcome.default_prevented);
        assert_eq!(
            rule.markup().expect("markup"),
            r##"<div class="counter">1<a href="#">+</a></div>"##
        );
        assert_eq!(rule.find_by_class("counter").expect("query").len(), 1);
        let count = COUNT.with(|slot| slot.borrow().clone()).expect("count");
        assert_eq!(count.value(), 1);
    }
}
