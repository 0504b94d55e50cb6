//! Component definitions, render context and instance handles.
//!
//! A component is a Rust type implementing [`Component`]. Its props and
//! state are explicit typed schemas; its lifecycle is one trait whose hooks
//! are all optional (no-ops by default).
//!
//! # Example
//!
//! ```ignore
//! struct Todo;
//!
//! #[derive(Clone, PartialEq, Default)]
//! struct TodoProps { title: String }
//!
//! #[derive(Clone, Default)]
//! struct TodoState { done: bool }
//!
//! impl Component for Todo {
//!     const NAME: &'static str = "Todo";
//!     type Props = TodoProps;
//!     type State = TodoState;
//!
//!     fn render(cx: &Context<'_, Self>) -> Element {
//!         let handle = cx.handle();
//!         Element::tag("li")
//!             .class(if cx.state().done { "done" } else { "" })
//!             .on(EventType::Click, move |_| handle.set_state(|s| s.done = !s.done))
//!             .child(cx.props().title.clone())
//!     }
//! }
//! ```
//!
//! Shared behavior between components is plain composition: factor it into
//! functions and call them from the hooks that need it.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{Error, HookResult, Result};
use crate::state::queue::{Change, UpdateQueue};
use crate::types::InstanceId;
use super::element::Element;

// =============================================================================
// Component Trait
// =============================================================================

/// Blueprint for component instances.
///
/// Only [`Component::render`] is required. Every lifecycle hook defaults to
/// a no-op (and `should_update` to `true`).
pub trait Component: Sized + 'static {
    /// Name used to register and resolve the definition.
    const NAME: &'static str;

    /// Props schema. Supplied by the parent (or the root caller).
    type Props: Clone + PartialEq + Default + 'static;

    /// State schema. Owned by the instance.
    type State: Clone + Default + 'static;

    /// Props an element starts from when built with
    /// [`Element::component_with`].
    fn default_props() -> Self::Props {
        Self::Props::default()
    }

    /// Initial state for a freshly mounted instance.
    fn initial_state(_props: &Self::Props) -> Self::State {
        Self::State::default()
    }

    /// Describe the subtree for the current props and state.
    ///
    /// Must be pure and must describe exactly one root.
    fn render(cx: &Context<'_, Self>) -> Element;

    /// Before the first render. State updates queued here are merged into
    /// the first render.
    fn will_mount(_cx: &Context<'_, Self>) -> HookResult {
        Ok(())
    }

    /// After the whole tree of this pass has been mounted.
    fn did_mount(_cx: &Context<'_, Self>) -> HookResult {
        Ok(())
    }

    /// The parent re-rendered this instance with new props. State updates
    /// queued here join the current update.
    fn will_receive_props(_cx: &Context<'_, Self>, _next_props: &Self::Props) -> HookResult {
        Ok(())
    }

    /// Return `false` to skip re-rendering. Props and state are committed
    /// either way.
    fn should_update(
        _cx: &Context<'_, Self>,
        _next_props: &Self::Props,
        _next_state: &Self::State,
    ) -> bool {
        true
    }

    /// Right before a re-render.
    fn will_update(
        _cx: &Context<'_, Self>,
        _next_props: &Self::Props,
        _next_state: &Self::State,
    ) -> HookResult {
        Ok(())
    }

    /// After the pass that re-rendered this instance committed.
    fn did_update(
        _cx: &Context<'_, Self>,
        _prev_props: &Self::Props,
        _prev_state: &Self::State,
    ) -> HookResult {
        Ok(())
    }

    /// Right before the instance is torn down.
    fn will_unmount(_cx: &Context<'_, Self>) -> HookResult {
        Ok(())
    }
}

// =============================================================================
// Context
// =============================================================================

/// What a component sees during render and lifecycle hooks.
pub struct Context<'a, C: Component> {
    id: InstanceId,
    props: &'a C::Props,
    state: &'a C::State,
    children: &'a [Element],
    queue: &'a Rc<RefCell<UpdateQueue>>,
}

impl<'a, C: Component> Context<'a, C> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn props(&self) -> &'a C::Props {
        self.props
    }

    pub fn state(&self) -> &'a C::State {
        self.state
    }

    /// Children passed by the parent element.
    pub fn children(&self) -> &'a [Element] {
        self.children
    }

    /// Handle for scheduling updates on this instance (e.g. from listeners).
    pub fn handle(&self) -> Handle<C> {
        Handle::new(self.id, self.queue.clone())
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Typed handle to a mounted instance.
///
/// Updates are queued, never applied immediately: they take effect at the
/// next flush (end of the current dispatch, render or explicit
/// [`Runtime::flush`](crate::Runtime::flush)). Updates on an unmounted
/// instance are dropped.
pub struct Handle<C: Component> {
    id: InstanceId,
    queue: Rc<RefCell<UpdateQueue>>,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component> Clone for Handle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            queue: self.queue.clone(),
            _component: PhantomData,
        }
    }
}

impl<C: Component> std::fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("component", &C::NAME)
            .field("id", &self.id)
            .finish()
    }
}

impl<C: Component> Handle<C> {
    pub(crate) fn new(id: InstanceId, queue: Rc<RefCell<UpdateQueue>>) -> Self {
        Self {
            id,
            queue,
            _component: PhantomData,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether the instance is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.queue.borrow().is_live(self.id)
    }

    /// Queue a shallow merge into state. The closure assigns the fields it
    /// changes; multiple merges apply in call order.
    pub fn set_state(&self, update: impl FnOnce(&mut C::State) + 'static) {
        self.enqueue(Change::MergeState(typed_patch::<C::State>(update)));
    }

    /// Like [`Handle::set_state`], running `callback` once the update is
    /// committed.
    pub fn set_state_then(
        &self,
        update: impl FnOnce(&mut C::State) + 'static,
        callback: impl FnOnce() + 'static,
    ) {
        self.enqueue_then(Change::MergeState(typed_patch::<C::State>(update)), callback);
    }

    /// Queue a replacement of the whole state.
    pub fn replace_state(&self, next: C::State) {
        self.enqueue(Change::ReplaceState(Box::new(next)));
    }

    pub fn replace_state_then(&self, next: C::State, callback: impl FnOnce() + 'static) {
        self.enqueue_then(Change::ReplaceState(Box::new(next)), callback);
    }

    /// Queue a shallow merge into props. Only valid on root instances; the
    /// flush fails with [`Error::PropsOnChild`] otherwise.
    pub fn set_props(&self, update: impl FnOnce(&mut C::Props) + 'static) {
        self.enqueue(Change::MergeProps(typed_patch::<C::Props>(update)));
    }

    pub fn set_props_then(
        &self,
        update: impl FnOnce(&mut C::Props) + 'static,
        callback: impl FnOnce() + 'static,
    ) {
        self.enqueue_then(Change::MergeProps(typed_patch::<C::Props>(update)), callback);
    }

    /// Queue a replacement of the whole props value. Roots only.
    pub fn replace_props(&self, next: C::Props) {
        self.enqueue(Change::ReplaceProps(Box::new(next)));
    }

    pub fn replace_props_then(&self, next: C::Props, callback: impl FnOnce() + 'static) {
        self.enqueue_then(Change::ReplaceProps(Box::new(next)), callback);
    }

    /// Queue a re-render that bypasses `should_update`.
    pub fn force_update(&self) {
        self.enqueue(Change::Force);
    }

    /// Like [`Handle::force_update`], running `callback` once the re-render
    /// is committed.
    pub fn force_update_then(&self, callback: impl FnOnce() + 'static) {
        self.enqueue_then(Change::Force, callback);
    }

    fn enqueue_then(&self, change: Change, callback: impl FnOnce() + 'static) {
        if self.enqueue(change) {
            self.queue.borrow_mut().push_callback(self.id, Box::new(callback));
        }
    }

    fn enqueue(&self, change: Change) -> bool {
        let mut queue = self.queue.borrow_mut();
        if !queue.is_live(self.id) {
            tracing::warn!(
                component = C::NAME,
                instance = %self.id,
                "update queued on an unmounted instance, ignoring"
            );
            return false;
        }
        tracing::trace!(component = C::NAME, instance = %self.id, ?change, "update queued");
        queue.enqueue(self.id, change);
        true
    }
}

fn typed_patch<T: 'static>(update: impl FnOnce(&mut T) + 'static) -> crate::state::queue::Patch {
    Box::new(move |value: &mut dyn Any| {
        if let Some(value) = value.downcast_mut::<T>() {
            update(value);
        }
    })
}

// =============================================================================
// Type-erased Definition
// =============================================================================

/// Borrowed view of an instance, passed through the type-erased vtable.
pub(crate) struct Scope<'a> {
    pub(crate) id: InstanceId,
    pub(crate) props: &'a dyn Any,
    pub(crate) state: &'a dyn Any,
    pub(crate) children: &'a [Element],
    pub(crate) queue: &'a Rc<RefCell<UpdateQueue>>,
}

/// Object-safe face of a [`Component`], stored in the definition registry.
pub(crate) trait AnyComponent {
    fn name(&self) -> &'static str;
    fn component_type(&self) -> TypeId;
    fn initial_state(&self, props: &dyn Any) -> Result<Box<dyn Any>>;
    fn clone_state(&self, state: &dyn Any) -> Result<Box<dyn Any>>;
    fn clone_props(&self, props: &dyn Any) -> Result<Box<dyn Any>>;
    fn render(&self, scope: &Scope<'_>) -> Result<Element>;
    fn will_mount(&self, scope: &Scope<'_>) -> Result<()>;
    fn did_mount(&self, scope: &Scope<'_>) -> Result<()>;
    fn will_receive_props(&self, scope: &Scope<'_>, next_props: &dyn Any) -> Result<()>;
    fn should_update(&self, scope: &Scope<'_>, next_props: &dyn Any, next_state: &dyn Any) -> Result<bool>;
    fn will_update(&self, scope: &Scope<'_>, next_props: &dyn Any, next_state: &dyn Any) -> Result<()>;
    fn did_update(&self, scope: &Scope<'_>, prev_props: &dyn Any, prev_state: &dyn Any) -> Result<()>;
    fn will_unmount(&self, scope: &Scope<'_>) -> Result<()>;
}

/// Vtable for component `C`.
pub(crate) struct Definition<C>(PhantomData<fn() -> C>);

impl<C: Component> Definition<C> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }

    fn mismatch() -> Error {
        Error::UnknownComponent {
            name: C::NAME.to_string(),
        }
    }

    fn props(value: &dyn Any) -> Result<&C::Props> {
        value.downcast_ref::<C::Props>().ok_or_else(Self::mismatch)
    }

    fn state(value: &dyn Any) -> Result<&C::State> {
        value.downcast_ref::<C::State>().ok_or_else(Self::mismatch)
    }

    fn context<'a>(scope: &Scope<'a>) -> Result<Context<'a, C>> {
        Ok(Context {
            id: scope.id,
            props: Self::props(scope.props)?,
            state: Self::state(scope.state)?,
            children: scope.children,
            queue: scope.queue,
        })
    }

    fn hook(hook: &'static str, result: HookResult) -> Result<()> {
        result.map_err(|source| Error::Hook {
            component: C::NAME,
            hook,
            source,
        })
    }
}

impl<C: Component> AnyComponent for Definition<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn initial_state(&self, props: &dyn Any) -> Result<Box<dyn Any>> {
        Ok(Box::new(C::initial_state(Self::props(props)?)))
    }

    fn clone_state(&self, state: &dyn Any) -> Result<Box<dyn Any>> {
        Ok(Box::new(Self::state(state)?.clone()))
    }

    fn clone_props(&self, props: &dyn Any) -> Result<Box<dyn Any>> {
        Ok(Box::new(Self::props(props)?.clone()))
    }

    fn render(&self, scope: &Scope<'_>) -> Result<Element> {
        Ok(C::render(&Self::context(scope)?))
    }

    fn will_mount(&self, scope: &Scope<'_>) -> Result<()> {
        Self::hook("will_mount", C::will_mount(&Self::context(scope)?))
    }

    fn did_mount(&self, scope: &Scope<'_>) -> Result<()> {
        Self::hook("did_mount", C::did_mount(&Self::context(scope)?))
    }

    fn will_receive_props(&self, scope: &Scope<'_>, next_props: &dyn Any) -> Result<()> {
        let cx = Self::context(scope)?;
        Self::hook("will_receive_props", C::will_receive_props(&cx, Self::props(next_props)?))
    }

    fn should_update(&self, scope: &Scope<'_>, next_props: &dyn Any, next_state: &dyn Any) -> Result<bool> {
        let cx = Self::context(scope)?;
        Ok(C::should_update(&cx, Self::props(next_props)?, Self::state(next_state)?))
    }

    fn will_update(&self, scope: &Scope<'_>, next_props: &dyn Any, next_state: &dyn Any) -> Result<()> {
        let cx = Self::context(scope)?;
        Self::hook(
            "will_update",
            C::will_update(&cx, Self::props(next_props)?, Self::state(next_state)?),
        )
    }

    fn did_update(&self, scope: &Scope<'_>, prev_props: &dyn Any, prev_state: &dyn Any) -> Result<()> {
        let cx = Self::context(scope)?;
        Self::hook(
            "did_update",
            C::did_update(&cx, Self::props(prev_props)?, Self::state(prev_state)?),
        )
    }

    fn will_unmount(&self, scope: &Scope<'_>) -> Result<()> {
        Self::hook("will_unmount", C::will_unmount(&Self::context(scope)?))
    }
}
