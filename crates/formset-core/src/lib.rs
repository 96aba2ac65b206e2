#![doc = r"Core runtime pieces for the formset composition runtime."]

extern crate self as formset_core;

pub mod collections;
pub mod hash;
pub mod owned;
pub mod platform;
pub mod runtime;

pub use owned::Owned;
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use collections::map::HashSet;

pub type Key = u64;
pub type NodeId = usize;

pub(crate) type ScopeId = usize;

static NEXT_SCOPE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_scope_id() -> ScopeId {
    NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) struct RecomposeScopeInner {
    id: ScopeId,
    runtime: RuntimeHandle,
    invalid: Cell<bool>,
    enqueued: Cell<bool>,
}

/// Handle to the group that read a piece of state.
///
/// Writing to a [`MutableState`] invalidates every scope that read it during
/// the last composition pass; the runtime queues the scope until the host
/// calls [`Composition::process_invalid_scopes`].
#[derive(Clone)]
pub struct RecomposeScope {
    inner: Rc<RecomposeScopeInner>,
}

impl RecomposeScope {
    fn new(runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(RecomposeScopeInner {
                id: next_scope_id(),
                runtime,
                invalid: Cell::new(false),
                enqueued: Cell::new(false),
            }),
        }
    }

    fn id(&self) -> ScopeId {
        self.inner.id
    }

    fn invalidate(&self) {
        self.inner.invalid.set(true);
        if !self.inner.enqueued.replace(true) {
            self.inner
                .runtime
                .register_invalid_scope(self.inner.id, Rc::downgrade(&self.inner));
        }
    }

    fn mark_recomposed(&self) {
        self.inner.invalid.set(false);
        if self.inner.enqueued.replace(false) {
            self.inner.runtime.mark_scope_recomposed(self.inner.id);
        }
    }

    fn downgrade(&self) -> Weak<RecomposeScopeInner> {
        Rc::downgrade(&self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    Missing { id: NodeId },
    TypeMismatch { id: NodeId, expected: &'static str },
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Missing { id } => write!(f, "node {id} missing"),
            NodeError::TypeMismatch { id, expected } => {
                write!(f, "node {id} type mismatch; expected {expected}")
            }
        }
    }
}

impl std::error::Error for NodeError {}

thread_local! {
    static CURRENT_COMPOSER: RefCell<Vec<*const ()>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` against the composer driving the current composition pass.
///
/// Panics when called outside of a composition; composables are only
/// meaningful while a [`Composition`] is rendering.
pub fn with_current_composer<R>(f: impl FnOnce(&Composer<'_>) -> R) -> R {
    with_current_composer_opt(f).expect("no composer installed")
}

fn with_current_composer_opt<R>(f: impl FnOnce(&Composer<'_>) -> R) -> Option<R> {
    let ptr = CURRENT_COMPOSER.with(|stack| stack.borrow().last().copied())?;
    // SAFETY: the pointer is pushed by `Composer::install` and popped before the
    // composer it points to goes out of scope. Only shared references are handed
    // out; all composer state lives behind `RefCell`/`Cell`.
    let composer = unsafe { &*(ptr as *const Composer<'static>) };
    Some(f(composer))
}

pub fn is_composing() -> bool {
    CURRENT_COMPOSER.with(|stack| !stack.borrow().is_empty())
}

pub fn with_key<K: Hash>(key: &K, content: impl FnOnce()) {
    with_current_composer(|composer| composer.with_key(key, |_| content()));
}

pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Owned<T> {
    with_current_composer(|composer| composer.remember(init))
}

#[allow(non_snake_case)]
pub fn mutableStateOf<T: 'static>(initial: T) -> MutableState<T> {
    with_current_composer(|composer| composer.mutable_state_of(initial))
}

#[allow(non_snake_case)]
pub fn useState<T: 'static>(init: impl FnOnce() -> T) -> MutableState<T> {
    with_current_composer(|composer| composer.use_state(init))
}

pub fn with_node_mut<N: Node + 'static, R>(
    id: NodeId,
    f: impl FnOnce(&mut N) -> R,
) -> Result<R, NodeError> {
    with_current_composer(|composer| composer.with_node_mut(id, f))
}

pub fn push_parent(id: NodeId) {
    with_current_composer(|composer| composer.push_parent(id));
}

pub fn pop_parent() {
    with_current_composer(|composer| composer.pop_parent());
}

struct GroupEntry {
    key: Key,
    len: usize,
}

struct OpenGroup {
    index: usize,
    start_slot: usize,
    stale_end: usize,
}

/// Positional storage for one composition.
///
/// Every pass walks the table from the start. A group, remembered value or
/// node is reused only when the slot under the cursor has the same shape;
/// otherwise the rest of the enclosing group is discarded and rebuilt, while
/// the siblings after that group keep their slots. Slots a reused group no
/// longer produces are dropped when the group ends.
#[derive(Default)]
pub struct SlotTable {
    slots: Vec<Slot>,
    groups: Vec<GroupEntry>,
    cursor: usize,
    group_stack: Vec<OpenGroup>,
}

enum Slot {
    Group { index: usize },
    Value(Box<dyn Any>),
    Node(NodeId),
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, key: Key) -> usize {
        let start_slot = self.cursor;
        if let Some(Slot::Group { index }) = self.slots.get(start_slot) {
            let index = *index;
            if self.groups[index].key == key {
                self.cursor += 1;
                self.group_stack.push(OpenGroup {
                    index,
                    start_slot,
                    stale_end: start_slot + self.groups[index].len,
                });
                return index;
            }
        }
        let index = self.groups.len();
        self.groups.push(GroupEntry { key, len: 0 });
        self.place(Slot::Group { index });
        self.group_stack.push(OpenGroup {
            index,
            start_slot,
            stale_end: start_slot,
        });
        index
    }

    pub fn end(&mut self) {
        let Some(open) = self.group_stack.pop() else {
            return;
        };
        let stale_end = open.stale_end.min(self.slots.len());
        if self.cursor < stale_end {
            let removed = stale_end - self.cursor;
            self.slots.drain(self.cursor..stale_end);
            for outer in &mut self.group_stack {
                outer.stale_end = outer.stale_end.saturating_sub(removed);
            }
        }
        if let Some(entry) = self.groups.get_mut(open.index) {
            entry.len = self.cursor - open.start_slot;
        }
    }

    /// Returns the value remembered under the cursor when it has type `T`.
    pub fn remembered<T: 'static>(&mut self) -> Option<Owned<T>> {
        if let Some(Slot::Value(value)) = self.slots.get(self.cursor) {
            if let Some(existing) = value.downcast_ref::<Owned<T>>() {
                let existing = existing.clone();
                self.cursor += 1;
                return Some(existing);
            }
        }
        None
    }

    pub fn insert_remembered<T: 'static>(&mut self, owned: Owned<T>) {
        self.place(Slot::Value(Box::new(owned)));
    }

    pub fn remember<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Owned<T> {
        if let Some(existing) = self.remembered() {
            return existing;
        }
        let owned = Owned::new(init());
        self.insert_remembered(owned.clone());
        owned
    }

    pub fn record_node(&mut self, id: NodeId) {
        self.place(Slot::Node(id));
    }

    pub fn peek_node(&self) -> Option<NodeId> {
        match self.slots.get(self.cursor) {
            Some(Slot::Node(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn read_node(&mut self) -> Option<NodeId> {
        let id = self.peek_node()?;
        self.cursor += 1;
        Some(id)
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.group_stack.clear();
    }

    pub fn trim_to_cursor(&mut self) {
        self.slots.truncate(self.cursor);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Writes `slot` at the cursor. Whatever the innermost open group still had
    /// from the last pass is discarded; slots after that group shift along.
    fn place(&mut self, slot: Slot) {
        let limit = self
            .group_stack
            .last()
            .map_or(self.slots.len(), |open| open.stale_end)
            .min(self.slots.len());
        if self.cursor < limit {
            let removed = limit - self.cursor;
            self.slots.drain(self.cursor..limit);
            for open in &mut self.group_stack {
                open.stale_end = open.stale_end.saturating_sub(removed);
            }
        }
        self.slots.insert(self.cursor, slot);
        for open in &mut self.group_stack {
            if open.stale_end >= self.cursor {
                open.stale_end += 1;
            }
        }
        self.cursor += 1;
    }
}

/// Object-safe access to `Any` for node trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

pub trait Node: AsAny {
    fn mount(&mut self) {}
    fn update(&mut self) {}
    fn unmount(&mut self) {}
    fn insert_child(&mut self, _child: NodeId) {}
    fn remove_child(&mut self, _child: NodeId) {}
    fn move_child(&mut self, _from: usize, _to: usize) {}
    fn children(&self) -> Vec<NodeId> {
        Vec::new()
    }
}

pub trait Applier {
    fn create(&mut self, node: Box<dyn Node>) -> NodeId;
    fn get_mut(&mut self, id: NodeId) -> Result<&mut dyn Node, NodeError>;
    fn remove(&mut self, id: NodeId) -> Result<(), NodeError>;
}

pub(crate) type Command = Box<dyn FnMut(&mut dyn Applier) -> Result<(), NodeError> + 'static>;

/// Node storage indexed by [`NodeId`]. Ids of removed nodes are handed out
/// again by later `create` calls.
#[derive(Default)]
pub struct MemoryApplier {
    nodes: Vec<Option<Box<dyn Node>>>,
    free: Vec<NodeId>,
}

impl MemoryApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of id slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn with_node<N: Node + 'static, R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut N) -> R,
    ) -> Result<R, NodeError> {
        let node = self.get_mut(id)?;
        let typed = node
            .as_any_mut()
            .downcast_mut::<N>()
            .ok_or(NodeError::TypeMismatch {
                id,
                expected: std::any::type_name::<N>(),
            })?;
        Ok(f(typed))
    }

    pub fn get(&self, id: NodeId) -> Result<&dyn Node, NodeError> {
        self.nodes
            .get(id)
            .and_then(|slot| slot.as_deref())
            .ok_or(NodeError::Missing { id })
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        match root {
            Some(root_id) => self.dump_node(&mut output, root_id, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.get(id) {
            Ok(node) => {
                output.push_str(&format!("{indent}[{id}] {}\n", node.type_name()));
                for child_id in node.children() {
                    self.dump_node(output, child_id, depth + 1);
                }
            }
            Err(_) => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }
}

impl Applier for MemoryApplier {
    fn create(&mut self, node: Box<dyn Node>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut dyn Node, NodeError> {
        match self.nodes.get_mut(id) {
            Some(Some(node)) => Ok(node.as_mut()),
            _ => Err(NodeError::Missing { id }),
        }
    }

    fn remove(&mut self, id: NodeId) -> Result<(), NodeError> {
        let children = self.get(id)?.children();
        for child_id in children {
            // a child may already be gone when its subtree was replaced first
            let _ = self.remove(child_id);
        }
        if let Some(slot) = self.nodes.get_mut(id) {
            if slot.take().is_some() {
                self.free.push(id);
            }
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
struct ParentChildren {
    children: Vec<NodeId>,
}

struct ParentFrame {
    id: NodeId,
    remembered: Owned<ParentChildren>,
    previous: Vec<NodeId>,
    new_children: Vec<NodeId>,
}

/// Drives a single composition pass.
///
/// All methods take `&self`: composables reach the composer again through
/// [`with_current_composer`] while an outer call is still on the stack, so
/// state is kept behind cells and every borrow is released before user code runs.
pub struct Composer<'a> {
    slots: RefCell<&'a mut SlotTable>,
    applier: RefCell<&'a mut dyn Applier>,
    runtime: RuntimeHandle,
    parent_stack: RefCell<Vec<ParentFrame>>,
    root: Cell<Option<NodeId>>,
    commands: RefCell<Vec<Command>>,
    scope_stack: RefCell<Vec<RecomposeScope>>,
}

impl<'a> Composer<'a> {
    pub fn new(
        slots: &'a mut SlotTable,
        applier: &'a mut dyn Applier,
        runtime: RuntimeHandle,
    ) -> Self {
        Self {
            slots: RefCell::new(slots),
            applier: RefCell::new(applier),
            runtime,
            parent_stack: RefCell::new(Vec::new()),
            root: Cell::new(None),
            commands: RefCell::new(Vec::new()),
            scope_stack: RefCell::new(Vec::new()),
        }
    }

    pub fn install<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        CURRENT_COMPOSER.with(|stack| stack.borrow_mut().push(self as *const Self as *const ()));
        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                CURRENT_COMPOSER.with(|stack| {
                    stack.borrow_mut().pop();
                });
            }
        }
        let _guard = Guard;
        f(self)
    }

    pub fn with_group<R>(&self, key: Key, f: impl FnOnce(&Self) -> R) -> R {
        self.slots.borrow_mut().start(key);
        let runtime = self.runtime.clone();
        let scope = self
            .remember(move || RecomposeScope::new(runtime))
            .with(|scope| scope.clone());
        self.scope_stack.borrow_mut().push(scope.clone());
        let result = f(self);
        self.scope_stack.borrow_mut().pop();
        scope.mark_recomposed();
        self.slots.borrow_mut().end();
        result
    }

    pub fn with_key<K: Hash, R>(&self, key: &K, f: impl FnOnce(&Self) -> R) -> R {
        self.with_group(hash_key(key), f)
    }

    pub fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Owned<T> {
        let existing = self.slots.borrow_mut().remembered::<T>();
        if let Some(existing) = existing {
            return existing;
        }
        // `init` may itself reach for the composer, so the slot borrow is released first.
        let owned = Owned::new(init());
        self.slots.borrow_mut().insert_remembered(owned.clone());
        owned
    }

    pub fn mutable_state_of<T: 'static>(&self, initial: T) -> MutableState<T> {
        MutableState::with_runtime(initial, self.runtime.clone())
    }

    pub fn use_state<T: 'static>(&self, init: impl FnOnce() -> T) -> MutableState<T> {
        let runtime = self.runtime.clone();
        self.remember(move || MutableState::with_runtime(init(), runtime))
            .with(|state| state.clone())
    }

    pub fn current_recompose_scope(&self) -> Option<RecomposeScope> {
        self.scope_stack.borrow().last().cloned()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.get()
    }

    pub fn emit_node<N: Node + 'static>(&self, init: impl FnOnce() -> N) -> NodeId {
        let candidate = self.slots.borrow().peek_node();
        let reusable = candidate.filter(|&id| {
            self.applier
                .borrow_mut()
                .get_mut(id)
                .map(|node| node.as_any_mut().is::<N>())
                .unwrap_or(false)
        });
        if let Some(id) = reusable {
            self.slots.borrow_mut().read_node();
            self.commands
                .borrow_mut()
                .push(Box::new(move |applier: &mut dyn Applier| {
                    let node = applier.get_mut(id)?;
                    let typed =
                        node.as_any_mut()
                            .downcast_mut::<N>()
                            .ok_or(NodeError::TypeMismatch {
                                id,
                                expected: std::any::type_name::<N>(),
                            })?;
                    typed.update();
                    Ok(())
                }));
            self.attach_to_parent(id);
            return id;
        }
        let node = init();
        let id = self.applier.borrow_mut().create(Box::new(node));
        self.slots.borrow_mut().record_node(id);
        self.commands
            .borrow_mut()
            .push(Box::new(move |applier: &mut dyn Applier| {
                applier.get_mut(id)?.mount();
                Ok(())
            }));
        self.attach_to_parent(id);
        id
    }

    fn attach_to_parent(&self, id: NodeId) {
        let mut parents = self.parent_stack.borrow_mut();
        match parents.last_mut() {
            Some(frame) => frame.new_children.push(id),
            None => self.root.set(Some(id)),
        }
    }

    pub fn with_node_mut<N: Node + 'static, R>(
        &self,
        id: NodeId,
        f: impl FnOnce(&mut N) -> R,
    ) -> Result<R, NodeError> {
        let mut applier = self.applier.borrow_mut();
        let node = applier.get_mut(id)?;
        let typed = node
            .as_any_mut()
            .downcast_mut::<N>()
            .ok_or(NodeError::TypeMismatch {
                id,
                expected: std::any::type_name::<N>(),
            })?;
        Ok(f(typed))
    }

    pub fn push_parent(&self, id: NodeId) {
        let remembered = self.remember(ParentChildren::default);
        let previous = remembered.with(|entry| entry.children.clone());
        self.parent_stack.borrow_mut().push(ParentFrame {
            id,
            remembered,
            previous,
            new_children: Vec::new(),
        });
    }

    pub fn pop_parent(&self) {
        let Some(frame) = self.parent_stack.borrow_mut().pop() else {
            return;
        };
        let ParentFrame {
            id,
            remembered,
            previous,
            new_children,
        } = frame;
        log::trace!("pop_parent: node #{id} previous={previous:?} new={new_children:?}");
        if previous != new_children {
            let mut commands = self.commands.borrow_mut();
            let mut current = previous;
            let desired: HashSet<NodeId> = new_children.iter().copied().collect();

            for index in (0..current.len()).rev() {
                let child = current[index];
                if !desired.contains(&child) {
                    current.remove(index);
                    commands.push(Box::new(move |applier: &mut dyn Applier| {
                        applier.get_mut(id)?.remove_child(child);
                        applier.get_mut(child)?.unmount();
                        applier.remove(child)
                    }));
                }
            }

            for (target_index, &child) in new_children.iter().enumerate() {
                match current.iter().position(|&c| c == child) {
                    Some(current_index) if current_index == target_index => {}
                    Some(current_index) => {
                        current.remove(current_index);
                        let to_index = target_index.min(current.len());
                        current.insert(to_index, child);
                        commands.push(Box::new(move |applier: &mut dyn Applier| {
                            applier.get_mut(id)?.move_child(current_index, to_index);
                            Ok(())
                        }));
                    }
                    None => {
                        let insert_index = target_index.min(current.len());
                        let appended_index = current.len();
                        current.insert(insert_index, child);
                        commands.push(Box::new(move |applier: &mut dyn Applier| {
                            applier.get_mut(id)?.insert_child(child);
                            Ok(())
                        }));
                        if insert_index != appended_index {
                            commands.push(Box::new(move |applier: &mut dyn Applier| {
                                applier.get_mut(id)?.move_child(appended_index, insert_index);
                                Ok(())
                            }));
                        }
                    }
                }
            }
        }
        remembered.update(|entry| entry.children = new_children);
    }

    pub(crate) fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}

struct MutableStateInner<T> {
    value: RefCell<T>,
    watchers: RefCell<Vec<Weak<RecomposeScopeInner>>>,
    _runtime: RuntimeHandle,
}

/// Read-only view of a [`MutableState`].
pub struct State<T> {
    inner: Rc<MutableStateInner<T>>,
}

/// Observable value; reads during composition subscribe the reading group.
pub struct MutableState<T> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for State<T> {}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for MutableState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for MutableState<T> {}

impl<T> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> MutableState<T> {
    pub fn with_runtime(value: T, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(MutableStateInner {
                value: RefCell::new(value),
                watchers: RefCell::new(Vec::new()),
                _runtime: runtime,
            }),
        }
    }

    pub fn as_state(&self) -> State<T> {
        State {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.as_state().with(f)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value)
        };
        self.notify_watchers();
        result
    }

    pub fn replace(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify_watchers();
    }

    pub fn set_value(&self, value: T) {
        self.replace(value);
    }

    pub fn set(&self, value: T) {
        self.replace(value);
    }

    fn notify_watchers(&self) {
        let watchers: Vec<RecomposeScope> = {
            let mut watchers = self.inner.watchers.borrow_mut();
            watchers.retain(|w| w.strong_count() > 0);
            watchers
                .iter()
                .filter_map(|w| w.upgrade())
                .map(|inner| RecomposeScope { inner })
                .collect()
        };

        for watcher in watchers {
            watcher.invalidate();
        }
    }
}

impl<T: Clone> MutableState<T> {
    pub fn value(&self) -> T {
        self.as_state().value()
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl<T> State<T> {
    fn subscribe_current_scope(&self) {
        if let Some(Some(scope)) =
            with_current_composer_opt(|composer| composer.current_recompose_scope())
        {
            let mut watchers = self.inner.watchers.borrow_mut();
            watchers.retain(|w| w.strong_count() > 0);
            let id = scope.id();
            let already_registered = watchers
                .iter()
                .any(|w| w.upgrade().map(|inner| inner.id == id).unwrap_or(false));
            if !already_registered {
                watchers.push(scope.downgrade());
            }
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.subscribe_current_scope();
        let value = self.inner.value.borrow();
        f(&value)
    }
}

impl<T: Clone> State<T> {
    pub fn value(&self) -> T {
        self.with(|value| value.clone())
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

/// A mounted tree of composables together with the nodes it produced.
///
/// The root content passed to [`Composition::render`] is kept so that state
/// invalidations can be answered by composing again from the root; the slot
/// table carries remembered state across those passes.
pub struct Composition<A: Applier> {
    slots: SlotTable,
    applier: A,
    runtime: Runtime,
    root: Option<NodeId>,
    root_key: Key,
    content: Option<Box<dyn FnMut()>>,
}

impl<A: Applier> Composition<A> {
    pub fn new(applier: A) -> Self {
        Self::with_runtime(applier, Runtime::default())
    }

    pub fn with_runtime(applier: A, runtime: Runtime) -> Self {
        Self {
            slots: SlotTable::new(),
            applier,
            runtime,
            root: None,
            root_key: 0,
            content: None,
        }
    }

    pub fn render(&mut self, key: Key, content: impl FnMut() + 'static) -> Result<(), NodeError> {
        self.root_key = key;
        self.content = Some(Box::new(content));
        self.recompose()
    }

    /// Compose the installed content again, whether or not anything changed.
    pub fn recompose(&mut self) -> Result<(), NodeError> {
        self.compose_root()?;
        if !self.runtime.has_invalid_scopes() {
            self.runtime.set_needs_frame(false);
        }
        Ok(())
    }

    pub fn should_render(&self) -> bool {
        self.runtime.needs_frame() || self.runtime.has_invalid_scopes()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn applier_mut(&mut self) -> &mut A {
        &mut self.applier
    }

    pub fn applier(&self) -> &A {
        &self.applier
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn process_invalid_scopes(&mut self) -> Result<(), NodeError> {
        let handle = self.runtime.handle();
        loop {
            let pending = handle.take_invalidated_scopes();
            if pending.is_empty() {
                break;
            }
            let mut scopes = Vec::new();
            for (id, weak) in pending {
                match weak.upgrade() {
                    Some(inner) => scopes.push(RecomposeScope { inner }),
                    None => handle.mark_scope_recomposed(id),
                }
            }
            if scopes.is_empty() {
                continue;
            }
            log::debug!("recomposing after {} invalidated scope(s)", scopes.len());
            self.compose_root()?;
            for scope in scopes {
                scope.mark_recomposed();
            }
        }
        if !self.runtime.has_invalid_scopes() {
            self.runtime.set_needs_frame(false);
        }
        Ok(())
    }

    fn compose_root(&mut self) -> Result<(), NodeError> {
        let Some(content) = self.content.as_mut() else {
            return Ok(());
        };
        let key = self.root_key;
        let previous_root = self.root;
        self.slots.reset();
        let (root, commands) = {
            let composer = Composer::new(&mut self.slots, &mut self.applier, self.runtime.handle());
            composer.install(|composer| {
                composer.with_group(key, |_| content());
                (composer.root(), composer.take_commands())
            })
        };
        for mut command in commands {
            command(&mut self.applier)?;
        }
        self.slots.trim_to_cursor();
        if let Some(previous) = previous_root.filter(|&previous| Some(previous) != root) {
            log::debug!("root replaced: #{previous} -> {root:?}");
            if self.applier.get_mut(previous).is_ok() {
                self.applier.get_mut(previous)?.unmount();
                self.applier.remove(previous)?;
            }
        }
        self.root = root;
        Ok(())
    }
}

pub fn location_key(file: &str, line: u32, column: u32) -> Key {
    hash::hash_one(&(file, line, column))
}

pub fn hash_key<K: Hash + ?Sized>(key: &K) -> Key {
    hash::hash_one(key)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
