//! Mount API - Rendering into containers and tearing roots down.
//!
//! Rendering into an empty container mounts a fresh tree. Rendering into a
//! container that already holds a tree reconciles against it, so repeated
//! renders of the same root keep instance identity and state.
//!
//! # Example
//!
//! ```ignore
//! let container = runtime.create_container();
//! let root = runtime.render(Element::component::<App>(props), container)?;
//!
//! // Re-render with new props: same instance, will_receive_props runs
//! runtime.render(Element::component::<App>(next_props), container)?;
//!
//! // Tear down: will_unmount runs parent-first
//! assert!(runtime.unmount(container)?);
//! ```

use crate::error::{Error, Result};
use crate::engine::NativeKind;
use crate::primitives::{Component, Element, Handle};
use crate::types::{ContainerId, InstanceId, NodeId};
use super::reconcile::MountCx;
use super::runtime::Runtime;

// =============================================================================
// Root Handle
// =============================================================================

/// What a successful render left in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootHandle {
    pub container: ContainerId,
    /// Top-level instance, if the root element is a component.
    pub instance: Option<InstanceId>,
    /// Native node at the top of the mounted tree.
    pub node: NodeId,
}

impl Runtime {
    /// Render `element` into `container`.
    ///
    /// Mounts on first use, reconciles afterwards. Post-commit hooks and any
    /// updates they schedule run before this returns (unless called inside a
    /// batch). On failure nothing from the failed subtree stays mounted.
    pub fn render(&mut self, element: Element, container: ContainerId) -> Result<RootHandle> {
        self.render_with(element, container, || {})
    }

    /// Like [`Runtime::render`], running `callback` once the render and the
    /// flush it triggers have completed.
    pub fn render_with(
        &mut self,
        element: Element,
        container: ContainerId,
        callback: impl FnOnce() + 'static,
    ) -> Result<RootHandle> {
        self.ensure_container(container)?;
        let element = element.into_single_root()?;

        self.queue.borrow_mut().begin_batch();
        let result = self.render_root(element, container);
        let outermost = self.queue.borrow_mut().end_batch();
        if let Err(err) = result {
            self.abandon_pass();
            return Err(err);
        }

        self.commit_pass()?;
        if outermost {
            self.flush()?;
        }
        callback();
        self.root_handle(container)
    }

    fn render_root(&mut self, element: Element, container: ContainerId) -> Result<()> {
        let cx = MountCx::root(container);
        match self.roots.get_mut(&container).and_then(Option::take) {
            Some(mut tree) => {
                tracing::debug!(%container, root = %element.kind_name(), "reconciling root");
                let result = self.reconcile(&mut tree, element, cx);
                self.roots.insert(container, Some(tree));
                result
            }
            None => {
                tracing::debug!(%container, root = %element.kind_name(), "mounting root");
                let tree = self.mount(element, cx)?;
                self.native.append_child(container.node(), tree.native_node());
                self.roots.insert(container, Some(tree));
                Ok(())
            }
        }
    }

    fn root_handle(&self, container: ContainerId) -> Result<RootHandle> {
        let node = self
            .root_node(container)
            .ok_or(Error::UnknownContainer(container))?;
        Ok(RootHandle {
            container,
            instance: self.root_instance(container),
            node,
        })
    }

    /// Tear down whatever is mounted in `container`.
    ///
    /// Returns false (running no hooks) when the container is empty. The
    /// container itself stays usable.
    pub fn unmount(&mut self, container: ContainerId) -> Result<bool> {
        self.ensure_container(container)?;
        let Some(tree) = self.roots.remove(&container).flatten() else {
            return Ok(false);
        };
        tracing::debug!(%container, "unmounting root");
        self.teardown(tree)?;
        Ok(true)
    }

    /// Unmount `container` and release its native node.
    pub fn release_container(&mut self, container: ContainerId) -> Result<()> {
        let result = self.unmount(container);
        self.native.release(container.node());
        result.map(|_| ())
    }

    // -------------------------------------------------------------------------
    // Root props
    // -------------------------------------------------------------------------

    /// Merge into the props of the `C` instance at the root of `container`.
    pub fn set_props<C: Component>(
        &mut self,
        container: ContainerId,
        update: impl FnOnce(&mut C::Props) + 'static,
    ) -> Result<()> {
        self.root_component::<C>(container)?.set_props(update);
        self.flush_unless_batched().map(|_| ())
    }

    /// Replace the props of the `C` instance at the root of `container`.
    pub fn replace_props<C: Component>(&mut self, container: ContainerId, props: C::Props) -> Result<()> {
        self.root_component::<C>(container)?.replace_props(props);
        self.flush_unless_batched().map(|_| ())
    }

    fn root_component<C: Component>(&self, container: ContainerId) -> Result<Handle<C>> {
        self.ensure_container(container)?;
        self.root_instance(container)
            .and_then(|id| self.handle::<C>(id))
            .ok_or(Error::NotRootComponent {
                container,
                expected: C::NAME,
            })
    }

    fn ensure_container(&self, container: ContainerId) -> Result<()> {
        match self.native.kind(container.node()) {
            Some(NativeKind::Container) => Ok(()),
            _ => Err(Error::UnknownContainer(container)),
        }
    }
}
