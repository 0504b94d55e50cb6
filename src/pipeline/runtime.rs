//! Runtime - Owns definitions, instances, the native tree and the update
//! queue.
//!
//! One runtime per UI thread. Nothing here is `Send`: handles, listeners and
//! lifecycle hooks all run on the thread that owns the runtime.
//!
//! # Example
//!
//! ```ignore
//! use spark_vtree::{Element, Runtime};
//!
//! let mut runtime = Runtime::new();
//! runtime.define::<App>();
//! let container = runtime.create_container();
//! runtime.render(Element::component::<App>(AppProps::default()), container)?;
//!
//! println!("{}", runtime.native().outline(container.node()));
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use spark_signals::{signal, Signal};

use crate::config::RuntimeConfig;
use crate::engine::registry::{Definitions, Instances};
use crate::engine::NativeTree;
use crate::error::Result;
use crate::primitives::component::{AnyComponent, Scope};
use crate::primitives::{Component, Handle};
use crate::state::queue::UpdateQueue;
use crate::state::SyntheticEvent;
use crate::types::{ContainerId, InstanceId, NodeId};
use super::tree::Mounted;

// =============================================================================
// Deferred hooks
// =============================================================================

/// Post-commit hooks, run after the pass that produced them.
pub(crate) enum Deferred {
    DidMount(InstanceId),
    DidUpdate {
        id: InstanceId,
        prev_props: Rc<dyn Any>,
        prev_state: Box<dyn Any>,
    },
}

// =============================================================================
// Runtime
// =============================================================================

pub struct Runtime {
    pub(crate) config: RuntimeConfig,
    pub(crate) definitions: Definitions,
    pub(crate) instances: Instances,
    pub(crate) native: NativeTree,
    /// Mounted tree per live container. `None` while a pass has it checked out.
    pub(crate) roots: HashMap<ContainerId, Option<Mounted>>,
    pub(crate) queue: Rc<RefCell<UpdateQueue>>,
    pub(crate) deferred: Vec<Deferred>,
    commits: Signal<u64>,
    pub(crate) last_event: Signal<Option<SyntheticEvent>>,
    epoch: Instant,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            definitions: Definitions::default(),
            instances: Instances::default(),
            native: NativeTree::new(),
            roots: HashMap::new(),
            queue: Rc::new(RefCell::new(UpdateQueue::new())),
            deferred: Vec::new(),
            commits: signal(0),
            last_event: signal(None),
            epoch: Instant::now(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Definitions and containers
    // -------------------------------------------------------------------------

    /// Register component `C` under [`Component::NAME`].
    ///
    /// Returns false if the name was already registered; the first
    /// definition is kept.
    pub fn define<C: Component>(&mut self) -> bool {
        self.definitions.define::<C>()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.is_defined(name)
    }

    /// Create an empty container to render into.
    pub fn create_container(&mut self) -> ContainerId {
        let container = self.native.create_container();
        tracing::debug!(%container, "container created");
        container
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// The native tree, read-only.
    pub fn native(&self) -> &NativeTree {
        &self.native
    }

    /// Root instance mounted in `container`, if any.
    pub fn root_instance(&self, container: ContainerId) -> Option<InstanceId> {
        self.roots.get(&container)?.as_ref()?.instance()
    }

    /// Native node at the top of `container`'s mounted tree.
    pub fn root_node(&self, container: ContainerId) -> Option<NodeId> {
        self.roots
            .get(&container)?
            .as_ref()
            .map(Mounted::native_node)
    }

    pub fn is_mounted(&self, id: InstanceId) -> bool {
        self.instances.contains(id)
    }

    /// Number of mounted instances across all containers.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Native node an instance currently renders to.
    pub fn find_native_node(&self, id: InstanceId) -> Option<NodeId> {
        let container = self.instances.get(id).ok()?.container;
        self.roots
            .get(&container)?
            .as_ref()?
            .find_rendered(id)
            .map(Mounted::native_node)
    }

    /// Typed handle to a mounted `C` instance.
    pub fn handle<C: Component>(&self, id: InstanceId) -> Option<Handle<C>> {
        let instance = self.instances.get(id).ok()?;
        (instance.def.component_type() == TypeId::of::<C>())
            .then(|| Handle::new(id, self.queue.clone()))
    }

    /// Committed props of a mounted `C` instance.
    pub fn props<C: Component>(&self, id: InstanceId) -> Option<&C::Props> {
        self.instances.get(id).ok()?.props.downcast_ref::<C::Props>()
    }

    /// Committed state of a mounted `C` instance.
    pub fn state<C: Component>(&self, id: InstanceId) -> Option<&C::State> {
        self.instances.get(id).ok()?.state.downcast_ref::<C::State>()
    }

    /// Counter bumped once per committed pass. Readable reactively.
    pub fn commits(&self) -> Signal<u64> {
        self.commits.clone()
    }

    /// Last event dispatched through this runtime.
    pub fn last_event(&self) -> Option<SyntheticEvent> {
        self.last_event.get()
    }

    /// Reactive view of [`Runtime::last_event`].
    pub fn last_event_signal(&self) -> Signal<Option<SyntheticEvent>> {
        self.last_event.clone()
    }

    // -------------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------------

    /// Run `f` with flushing suspended; the queued updates flush once when
    /// the outermost batch closes.
    pub fn batched_updates<R>(&mut self, f: impl FnOnce(&mut Runtime) -> Result<R>) -> Result<R> {
        self.queue.borrow_mut().begin_batch();
        let result = f(self);
        let outermost = self.queue.borrow_mut().end_batch();
        let value = result?;
        if outermost {
            self.flush()?;
        }
        Ok(value)
    }

    /// Whether a batch (dispatch or [`Runtime::batched_updates`]) is open.
    pub fn in_batch(&self) -> bool {
        self.queue.borrow().in_batch()
    }

    /// Flush now unless a batch will flush later.
    pub(crate) fn flush_unless_batched(&mut self) -> Result<usize> {
        if self.in_batch() {
            return Ok(0);
        }
        self.flush()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Call into an instance's definition with a scope over its record.
    pub(crate) fn with_scope<R>(
        &self,
        id: InstanceId,
        f: impl FnOnce(&dyn AnyComponent, &Scope<'_>) -> Result<R>,
    ) -> Result<R> {
        let instance = self.instances.get(id)?;
        let scope = instance.scope(&self.queue);
        f(instance.def.as_ref(), &scope)
    }

    pub(crate) fn bump_commits(&mut self) {
        self.commits.set(self.commits.get() + 1);
    }

    /// Milliseconds since the runtime was created.
    pub(crate) fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
