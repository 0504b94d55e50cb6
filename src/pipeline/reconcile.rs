//! Reconciler - Mount, diff and tear down element trees.
//!
//! Given the mounted tree at a position and a fresh element, decide what to
//! keep, what to update in place and what to replace:
//!
//! - Same kind at the same position (same tag, text, or same definition):
//!   the native node and instance are kept and updated in place
//! - Different kind: the old subtree is unmounted, then the new one is
//!   mounted and swapped in
//! - Children: keyed children match by key, unkeyed ones by position among
//!   the unkeyed; unmatched old children are torn down
//!
//! Component updates follow one protocol whether they come from a parent
//! re-render or from queued state changes: `will_receive_props` (parent
//! only), apply queued changes in order, `should_update` (skipped when
//! forced), `will_update`, commit, render, reconcile, then `did_update`
//! after the pass commits.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::primitives::children::flatten;
use crate::primitives::{ComponentElement, Element, HostElement};
use crate::state::queue::Change;
use crate::types::{AttrValue, ContainerId, InstanceId, Key, NodeId};
use crate::engine::registry::Instance;
use super::runtime::{Deferred, Runtime};
use super::tree::Mounted;

/// Where in the component tree a subtree is being mounted.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MountCx {
    pub(crate) container: ContainerId,
    /// Instance whose render produced the elements (owner of host nodes,
    /// parent of component instances).
    pub(crate) owner: Option<InstanceId>,
    pub(crate) depth: usize,
}

impl MountCx {
    pub(crate) fn root(container: ContainerId) -> Self {
        Self {
            container,
            owner: None,
            depth: 0,
        }
    }

    fn inside(self, id: InstanceId, depth: usize) -> Self {
        Self {
            container: self.container,
            owner: Some(id),
            depth: depth + 1,
        }
    }
}

/// Props and state an update will commit.
struct Next {
    props: Rc<dyn Any>,
    state: Box<dyn Any>,
    forced: bool,
}

fn same_kind(current: &Mounted, element: &Element) -> bool {
    match (current, element) {
        (Mounted::Host { tag, .. }, Element::Host(next)) => *tag == next.tag,
        (Mounted::Text { .. }, Element::Text(_)) => true,
        (Mounted::Component { .. }, Element::Component(next)) => current.same_component(next),
        _ => false,
    }
}

impl Runtime {
    // =========================================================================
    // Mount
    // =========================================================================

    /// Build a fresh native subtree (and instances) for `element`.
    ///
    /// On failure everything created for this subtree is discarded without
    /// running hooks.
    pub(crate) fn mount(&mut self, element: Element, cx: MountCx) -> Result<Mounted> {
        match element {
            Element::Host(host) => self.mount_host(host, cx),
            Element::Text(text) => {
                let node = self.native.create_text(&text, cx.owner);
                Ok(Mounted::Text { node, text })
            }
            Element::Component(component) => self.mount_component(component, cx),
            list @ (Element::Fragment(_) | Element::Empty) => {
                let single = list.into_single_root()?;
                self.mount(single, cx)
            }
        }
    }

    fn mount_host(&mut self, host: HostElement, cx: MountCx) -> Result<Mounted> {
        let HostElement {
            tag,
            key,
            attributes,
            listeners,
            children,
        } = host;

        let node = self.native.create_element(&tag, cx.owner);
        for (name, value) in &attributes {
            self.native.set_attribute(node, name, value.clone());
        }
        self.native.set_listeners(node, listeners, cx.owner);

        let mut mounted = Vec::new();
        for child in flatten(children) {
            match self.mount(child, cx) {
                Ok(child) => mounted.push(child),
                Err(err) => {
                    for child in mounted {
                        self.discard(child);
                    }
                    self.native.release(node);
                    return Err(err);
                }
            }
        }
        self.native
            .set_children(node, mounted.iter().map(Mounted::native_node).collect());

        Ok(Mounted::Host {
            node,
            tag,
            key,
            attributes,
            children: mounted,
        })
    }

    fn mount_component(&mut self, element: ComponentElement, cx: MountCx) -> Result<Mounted> {
        let def = self.definitions.resolve(&element)?;
        let ComponentElement {
            name,
            type_id,
            props,
            key,
            children,
            ..
        } = element;

        let state = def.initial_state(props.as_ref())?;
        let id = self.instances.allocate_id();
        self.instances.insert(Instance {
            id,
            def,
            props,
            state,
            children,
            container: cx.container,
            parent: cx.owner,
            depth: cx.depth,
        });
        self.queue.borrow_mut().mark_live(id);
        tracing::trace!(instance = %id, depth = cx.depth, "instance created");

        match self.mount_instance(id, cx) {
            Ok(rendered) => Ok(Mounted::Component {
                id,
                name,
                type_id,
                key,
                rendered: Box::new(rendered),
            }),
            Err(err) => {
                self.forget_instance(id);
                Err(err)
            }
        }
    }

    fn mount_instance(&mut self, id: InstanceId, cx: MountCx) -> Result<Mounted> {
        self.with_scope(id, |def, scope| def.will_mount(scope))?;

        // Updates queued in will_mount land in the first render
        if self.queue.borrow().has_pending(id) {
            let next = self.next_values(id, None)?;
            let instance = self.instances.get_mut(id)?;
            instance.props = next.props;
            instance.state = next.state;
        }

        let element = self.render_instance(id)?;
        let rendered = self.mount(element, cx.inside(id, cx.depth))?;
        self.deferred.push(Deferred::DidMount(id));
        Ok(rendered)
    }

    fn render_instance(&self, id: InstanceId) -> Result<Element> {
        let element = self.with_scope(id, |def, scope| def.render(scope))?;
        element.into_single_root()
    }

    // =========================================================================
    // Reconcile
    // =========================================================================

    /// Bring the mounted subtree at `current` in line with `element`.
    pub(crate) fn reconcile(
        &mut self,
        current: &mut Mounted,
        element: Element,
        cx: MountCx,
    ) -> Result<()> {
        let element = element.into_single_root()?;
        if !same_kind(current, &element) {
            return self.replace(current, element, cx);
        }

        match element {
            Element::Text(next) => {
                if let Mounted::Text { node, text } = current {
                    if *text != next {
                        self.native.set_text(*node, &next);
                        *text = next;
                    }
                }
                Ok(())
            }
            Element::Host(next) => {
                if let Mounted::Host {
                    node,
                    key,
                    attributes,
                    children,
                    ..
                } = current
                {
                    self.update_host(*node, key, attributes, children, next, cx)?;
                }
                Ok(())
            }
            Element::Component(next) => {
                if let Mounted::Component { id, key, rendered, .. } = current {
                    key.clone_from(&next.key);
                    self.update_component(*id, rendered, Some(next))?;
                }
                Ok(())
            }
            Element::Fragment(_) | Element::Empty => Ok(()),
        }
    }

    /// Unmount `current`, then mount `element` in its place.
    ///
    /// The old native nodes stay attached until the new subtree is ready to
    /// swap in. If the mount fails they stay where they are, detached from
    /// their (already unmounted) instances.
    fn replace(&mut self, current: &mut Mounted, element: Element, cx: MountCx) -> Result<()> {
        tracing::trace!(next = %element.kind_name(), "replacing subtree");
        let outgoing = current.instances();
        let unmount_error = self.run_will_unmount(&outgoing);
        for id in outgoing {
            self.forget_instance(id);
        }

        let old_node = current.native_node();
        match self.mount(element, cx) {
            Ok(fresh) => {
                self.native.replace_child(old_node, fresh.native_node());
                self.native.release(old_node);
                *current = fresh;
                unmount_error.map_or(Ok(()), Err)
            }
            Err(err) => {
                let placeholder = Mounted::Text {
                    node: old_node,
                    text: String::new(),
                };
                let old = std::mem::replace(current, placeholder);
                *current = old.without_instances();
                Err(unmount_error.unwrap_or(err))
            }
        }
    }

    fn update_host(
        &mut self,
        node: NodeId,
        key: &mut Option<Key>,
        attributes: &mut BTreeMap<String, AttrValue>,
        children: &mut Vec<Mounted>,
        next: HostElement,
        cx: MountCx,
    ) -> Result<()> {
        let HostElement {
            key: next_key,
            attributes: next_attributes,
            listeners,
            children: next_children,
            ..
        } = next;

        for name in attributes.keys() {
            if !next_attributes.contains_key(name) {
                self.native.remove_attribute(node, name);
            }
        }
        for (name, value) in &next_attributes {
            if attributes.get(name) != Some(value) {
                self.native.set_attribute(node, name, value.clone());
            }
        }
        *attributes = next_attributes;
        *key = next_key;

        // Closures are fresh every render; always rebind
        self.native.set_listeners(node, listeners, cx.owner);

        self.reconcile_children(node, children, next_children, cx)
    }

    fn reconcile_children(
        &mut self,
        parent: NodeId,
        current: &mut Vec<Mounted>,
        next: Vec<Element>,
        cx: MountCx,
    ) -> Result<()> {
        let next = flatten(next);
        let mut slots: Vec<Option<Mounted>> = std::mem::take(current).into_iter().map(Some).collect();

        let mut keyed: HashMap<Key, usize> = HashMap::new();
        let mut unkeyed: VecDeque<usize> = VecDeque::new();
        for (index, slot) in slots.iter().enumerate() {
            match slot.as_ref().and_then(Mounted::key) {
                Some(key) => {
                    keyed.entry(key.clone()).or_insert(index);
                }
                None => unkeyed.push_back(index),
            }
        }

        let mut seen: HashSet<Key> = HashSet::new();
        let mut result = Vec::with_capacity(next.len());
        let mut failure = None;

        for element in next {
            let matched = match element.key_ref() {
                Some(key) if !seen.insert(key.clone()) => {
                    if self.config.warn_on_duplicate_keys {
                        tracing::warn!(%key, "duplicate key among siblings, mounting separately");
                    }
                    None
                }
                Some(key) => keyed.remove(key),
                None => unkeyed.pop_front(),
            };

            let outcome = match matched.and_then(|index| slots[index].take()) {
                Some(mut mounted) => {
                    let outcome = self.reconcile(&mut mounted, element, cx);
                    result.push(mounted);
                    outcome
                }
                None => self.mount(element, cx).map(|mounted| result.push(mounted)),
            };
            if let Err(err) = outcome {
                failure = Some(err);
                break;
            }
        }

        let leftovers = slots.into_iter().flatten();
        let mut teardown_error = None;
        if failure.is_some() {
            // Keep what was there so the tree stays consistent
            result.extend(leftovers);
        } else {
            for old in leftovers {
                if let Err(err) = self.teardown(old) {
                    teardown_error.get_or_insert(err);
                }
            }
        }

        self.native
            .set_children(parent, result.iter().map(Mounted::native_node).collect());
        *current = result;

        match failure.or(teardown_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Component update
    // =========================================================================

    /// Run the update protocol on instance `id`, whose rendered subtree is
    /// `rendered`. `incoming` is the new element when a parent re-rendered.
    pub(crate) fn update_component(
        &mut self,
        id: InstanceId,
        rendered: &mut Mounted,
        incoming: Option<ComponentElement>,
    ) -> Result<()> {
        let (incoming_props, incoming_children) = match incoming {
            Some(element) => {
                self.with_scope(id, |def, scope| {
                    def.will_receive_props(scope, element.props.as_ref())
                })?;
                (Some(element.props), Some(element.children))
            }
            None => (None, None),
        };

        let next = self.next_values(id, incoming_props)?;
        let update = next.forced
            || self.with_scope(id, |def, scope| {
                def.should_update(scope, next.props.as_ref(), next.state.as_ref())
            })?;

        if !update {
            let instance = self.instances.get_mut(id)?;
            instance.props = next.props;
            instance.state = next.state;
            if let Some(children) = incoming_children {
                instance.children = children;
            }
            tracing::trace!(instance = %id, "update skipped by should_update");
            return Ok(());
        }

        self.with_scope(id, |def, scope| {
            def.will_update(scope, next.props.as_ref(), next.state.as_ref())
        })?;

        let instance = self.instances.get_mut(id)?;
        let prev_props = std::mem::replace(&mut instance.props, next.props);
        let prev_state = std::mem::replace(&mut instance.state, next.state);
        if let Some(children) = incoming_children {
            instance.children = children;
        }
        let cx = MountCx {
            container: instance.container,
            owner: instance.parent,
            depth: instance.depth,
        };

        let element = self.render_instance(id)?;
        self.reconcile(rendered, element, cx.inside(id, cx.depth))?;
        self.deferred.push(Deferred::DidUpdate {
            id,
            prev_props,
            prev_state,
        });
        tracing::trace!(instance = %id, "instance updated");
        Ok(())
    }

    /// Apply the queued changes for `id`, in call order, to copies of its
    /// props and state.
    fn next_values(&mut self, id: InstanceId, incoming_props: Option<Rc<dyn Any>>) -> Result<Next> {
        let changes = self.queue.borrow_mut().take(id);
        let instance = self.instances.get(id)?;
        let def = instance.def.clone();

        let mut props = incoming_props.unwrap_or_else(|| instance.props.clone());
        let mut state = def.clone_state(instance.state.as_ref())?;
        let mut forced = false;

        if !instance.is_root() && changes.iter().any(Change::touches_props) {
            return Err(Error::PropsOnChild {
                component: instance.name(),
            });
        }

        for change in changes {
            match change {
                Change::MergeState(patch) => patch(state.as_mut()),
                Change::ReplaceState(next) => state = next,
                Change::MergeProps(patch) => {
                    let mut copy = def.clone_props(props.as_ref())?;
                    patch(copy.as_mut());
                    props = Rc::from(copy);
                }
                Change::ReplaceProps(next) => props = Rc::from(next),
                Change::Force => forced = true,
            }
        }

        Ok(Next {
            props,
            state,
            forced,
        })
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Unmount a subtree: `will_unmount` parent-first, then release every
    /// instance and native node. Teardown always completes; the first hook
    /// error is returned afterwards.
    pub(crate) fn teardown(&mut self, mounted: Mounted) -> Result<()> {
        let node = mounted.native_node();
        let first_error = self.run_will_unmount(&mounted.instances());
        self.drop_instances(&mounted);
        self.native.release(node);
        first_error.map_or(Ok(()), Err)
    }

    /// `will_unmount` on each instance in order. Every hook runs; the first
    /// error is returned.
    fn run_will_unmount(&self, ids: &[InstanceId]) -> Option<Error> {
        let mut first_error = None;
        for &id in ids {
            if let Err(err) = self.with_scope(id, |def, scope| def.will_unmount(scope)) {
                first_error.get_or_insert(err);
            }
        }
        first_error
    }

    /// Tear down a subtree whose mount did not complete. No hooks run.
    pub(crate) fn discard(&mut self, mounted: Mounted) {
        self.drop_instances(&mounted);
        self.native.release(mounted.native_node());
    }

    fn drop_instances(&mut self, mounted: &Mounted) {
        for id in mounted.instances() {
            self.forget_instance(id);
        }
    }

    pub(crate) fn forget_instance(&mut self, id: InstanceId) {
        if self.instances.remove(id).is_some() {
            let dropped = self.queue.borrow_mut().mark_dead(id);
            tracing::trace!(instance = %id, dropped, "instance released");
        }
    }
}
