use super::*;
use crate as formset_core;
use formset_macros::composable;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct TestDummyNode;

impl Node for TestDummyNode {}

#[derive(Default)]
struct TestParentNode {
    children: Vec<NodeId>,
    mounted: bool,
    updates: usize,
}

impl Node for TestParentNode {
    fn mount(&mut self) {
        self.mounted = true;
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn insert_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }

    fn move_child(&mut self, from: usize, to: usize) {
        if from < self.children.len() {
            let child = self.children.remove(from);
            let to = to.min(self.children.len());
            self.children.insert(to, child);
        }
    }

    fn children(&self) -> Vec<NodeId> {
        self.children.clone()
    }
}

#[derive(Default)]
struct TestScheduler {
    frames: AtomicUsize,
}

impl RuntimeScheduler for TestScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

fn runtime_handle() -> (RuntimeHandle, Runtime) {
    let runtime = Runtime::new(Arc::new(TestScheduler::default()));
    (runtime.handle(), runtime)
}

fn compose_test_node<N: Node + 'static>(init: impl FnOnce() -> N) -> NodeId {
    formset_core::with_current_composer(|composer| composer.emit_node(init))
}

thread_local! {
    static INVOCATIONS: Cell<usize> = const { Cell::new(0) };
    static CAPTURED_STATE: RefCell<Option<MutableState<usize>>> = const { RefCell::new(None) };
}

#[test]
fn with_current_composer_is_available_inside_group() {
    let (handle, _runtime) = runtime_handle();
    let mut slots = SlotTable::new();
    let mut applier = MemoryApplier::new();
    let composer = Composer::new(&mut slots, &mut applier, handle);

    composer.install(|composer| {
        composer.with_group(0, |_| {
            formset_core::with_current_composer(|current| {
                current.emit_node(|| TestDummyNode);
            });
        });
    });
    assert!(!is_composing());
}

#[test]
fn remember_returns_same_value_across_passes() {
    let (handle, _runtime) = runtime_handle();
    let mut slots = SlotTable::new();
    let mut applier = MemoryApplier::new();
    let mut first: Option<Owned<usize>> = None;

    for _ in 0..2 {
        slots.reset();
        let composer = Composer::new(&mut slots, &mut applier, handle.clone());
        let owned = composer.install(|composer| {
            composer.with_group(7, |composer| composer.remember(|| 41usize))
        });
        owned.update(|value| *value += 1);
        if let Some(previous) = first.as_ref() {
            assert!(previous.ptr_eq(&owned));
        } else {
            first = Some(owned);
        }
    }

    let value = first.map(|owned| owned.with(|value| *value));
    assert_eq!(value, Some(43));
}

#[test]
fn mismatched_group_key_discards_remembered_values() {
    let (handle, _runtime) = runtime_handle();
    let mut slots = SlotTable::new();
    let mut applier = MemoryApplier::new();

    let composer = Composer::new(&mut slots, &mut applier, handle.clone());
    let first = composer.install(|composer| composer.with_group(1, |c| c.remember(|| 1u8)));
    drop(composer);

    slots.reset();
    let composer = Composer::new(&mut slots, &mut applier, handle);
    let second = composer.install(|composer| composer.with_group(2, |c| c.remember(|| 2u8)));

    assert!(!first.ptr_eq(&second));
    assert_eq!(second.with(|v| *v), 2);
}

#[test]
fn slot_table_trims_after_shorter_pass() {
    let mut slots = SlotTable::new();
    slots.start(1);
    slots.remember(|| 1u32);
    slots.remember(|| 2u32);
    slots.end();
    let full = slots.len();

    slots.reset();
    slots.start(1);
    slots.remember(|| 1u32);
    slots.end();
    slots.trim_to_cursor();

    assert!(slots.len() < full);
    assert!(!slots.is_empty());
}

#[test]
fn emit_node_reuses_node_of_same_type() {
    let mut composition = Composition::new(MemoryApplier::new());
    composition
        .render(0, || {
            compose_test_node(TestParentNode::default);
        })
        .expect("render");
    let first_root = composition.root();
    composition.recompose().expect("recompose");

    assert_eq!(composition.root(), first_root);
    let root = first_root.expect("root");
    let (mounted, updates) = composition
        .applier_mut()
        .with_node(root, |node: &mut TestParentNode| (node.mounted, node.updates))
        .expect("parent node");
    assert!(mounted);
    assert_eq!(updates, 1);
}

#[test]
fn pop_parent_inserts_and_removes_children() {
    let count = Rc::new(Cell::new(3usize));
    let content_count = Rc::clone(&count);
    let mut composition = Composition::new(MemoryApplier::new());
    composition
        .render(0, move || {
            let parent = compose_test_node(TestParentNode::default);
            push_parent(parent);
            for index in 0..content_count.get() {
                with_key(&index, || {
                    compose_test_node(|| TestDummyNode);
                });
            }
            pop_parent();
        })
        .expect("render");

    let root = composition.root().expect("root");
    let children = composition
        .applier_mut()
        .with_node(root, |node: &mut TestParentNode| node.children.len())
        .expect("parent");
    assert_eq!(children, 3);
    let before = composition.applier().len();

    count.set(1);
    composition.recompose().expect("recompose");
    let children = composition
        .applier_mut()
        .with_node(root, |node: &mut TestParentNode| node.children.len())
        .expect("parent");
    assert_eq!(children, 1);
    assert_eq!(composition.applier().len(), before - 2);
}

#[composable]
fn counting_content() {
    INVOCATIONS.with(|calls| calls.set(calls.get() + 1));
    let state = useState(|| 0usize);
    let _ = state.value();
    CAPTURED_STATE.with(|slot| *slot.borrow_mut() = Some(state.clone()));
    compose_test_node(|| TestDummyNode);
}

#[test]
fn state_write_invalidates_and_recomposes() {
    INVOCATIONS.with(|calls| calls.set(0));
    let scheduler = Arc::new(TestScheduler::default());
    let runtime = Runtime::new(scheduler.clone());
    let mut composition = Composition::with_runtime(MemoryApplier::new(), runtime);
    composition.render(1, counting_content).expect("render");
    assert!(!composition.should_render());
    assert_eq!(INVOCATIONS.with(|c| c.get()), 1);

    let state = CAPTURED_STATE
        .with(|slot| slot.borrow().clone())
        .expect("state captured");
    state.update(|value| *value += 1);

    assert!(composition.should_render());
    assert_eq!(scheduler.frames.load(Ordering::SeqCst), 1);

    composition.process_invalid_scopes().expect("recompose");
    assert!(!composition.should_render());
    assert_eq!(INVOCATIONS.with(|c| c.get()), 2);

    let again = CAPTURED_STATE
        .with(|slot| slot.borrow().clone())
        .expect("state captured");
    assert_eq!(again, state);
    assert_eq!(again.value(), 1);
}

#[test]
fn state_read_outside_composition_does_not_subscribe() {
    let (handle, _runtime) = runtime_handle();
    let state = MutableState::with_runtime(5i32, handle.clone());
    assert_eq!(state.get(), 5);
    state.set(6);
    assert!(!handle.has_invalid_scopes());
    assert_eq!(state.as_state().value(), 6);
}

#[test]
fn memory_applier_reports_missing_and_mismatched_nodes() {
    let mut applier = MemoryApplier::new();
    let id = applier.create(Box::new(TestDummyNode));

    assert_eq!(
        applier.with_node(id + 1, |_: &mut TestDummyNode| ()),
        Err(NodeError::Missing { id: id + 1 })
    );
    assert!(matches!(
        applier.with_node(id, |_: &mut TestParentNode| ()),
        Err(NodeError::TypeMismatch { .. })
    ));

    applier.remove(id).expect("remove");
    assert!(applier.is_empty());
    assert!(applier.dump_tree(Some(id)).contains("missing"));
}

#[test]
fn location_keys_differ_by_position() {
    assert_ne!(location_key("a.rs", 1, 1), location_key("a.rs", 1, 2));
    assert_eq!(location_key("a.rs", 3, 4), location_key("a.rs", 3, 4));
    assert_eq!(hash_key(&5usize), hash_key(&5usize));
}

#[test]
fn shrinking_group_keeps_following_sibling_state() {
    let mut slots = SlotTable::new();

    slots.start(1);
    slots.start(10);
    slots.remember(|| 1u32);
    slots.remember(|| 2u32);
    slots.end();
    slots.start(20);
    let sibling = slots.remember(|| String::from("kept"));
    slots.end();
    slots.end();

    slots.reset();
    slots.start(1);
    slots.start(10);
    slots.remember(|| 1u32);
    slots.end();
    slots.start(20);
    let again = slots.remember(|| String::from("fresh"));
    slots.end();
    slots.end();
    slots.trim_to_cursor();

    assert!(sibling.ptr_eq(&again));
    assert_eq!(again.with(|value| value.clone()), "kept");
}

#[test]
fn free_remember_and_state_survive_recomposition() {
    let captured: Rc<RefCell<Vec<(Owned<u8>, MutableState<i32>)>>> = Rc::default();
    let mut composition = Composition::new(MemoryApplier::new());
    let content = {
        let captured = captured.clone();
        move || {
            let marker = remember(|| 5u8);
            let state = remember(|| mutableStateOf(3i32)).with(|state| state.clone());
            captured.borrow_mut().push((marker, state));
        }
    };

    composition.render(9, content).expect("render");
    composition.recompose().expect("recompose");

    let passes = captured.borrow();
    assert_eq!(passes.len(), 2);
    assert!(passes[0].0.ptr_eq(&passes[1].0));
    assert_eq!(passes[0].1, passes[1].1);
    assert_eq!(passes[1].1.value(), 3);
}

#[test]
fn group_added_inside_parent_keeps_following_sibling() {
    let mut slots = SlotTable::new();

    slots.start(1);
    slots.start(10);
    slots.start(100);
    slots.remember(|| 0usize);
    slots.end();
    slots.end();
    slots.start(20);
    let sibling = slots.remember(|| String::from("kept"));
    slots.end();
    slots.end();
    let before = slots.len();

    slots.reset();
    slots.start(1);
    slots.start(10);
    for key in [100, 101] {
        slots.start(key);
        slots.remember(|| 0usize);
        slots.end();
    }
    slots.end();
    slots.start(20);
    let again = slots.remember(|| String::from("fresh"));
    slots.end();
    slots.end();
    slots.trim_to_cursor();

    assert!(sibling.ptr_eq(&again));
    assert_eq!(slots.len(), before + 2);
}

#[test]
fn memory_applier_reuses_removed_ids() {
    let mut applier = MemoryApplier::new();
    let first = applier.create(Box::new(TestDummyNode));
    let second = applier.create(Box::new(TestDummyNode));
    applier.remove(first).expect("remove");

    let third = applier.create(Box::new(TestDummyNode));
    assert_eq!(third, first);
    assert_ne!(third, second);
    assert_eq!(applier.capacity(), 2);
    assert_eq!(applier.len(), 2);
}
