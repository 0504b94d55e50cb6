//! Native Tree - The in-memory host node arena.
//!
//! Stands in for the platform's node tree. Nodes live in a slot arena:
//! - Free index pool for O(1) reuse, with a generation per slot
//! - Parent pointers plus ordered child lists
//! - Recursive release (children first)
//!
//! Only the runtime mutates the tree. Everything public here is read-only
//! inspection, used by embedders and tests to look at what was rendered.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::primitives::Listener;
use crate::state::EventType;
use crate::types::{AttrValue, ContainerId, InstanceId, NodeId};

// =============================================================================
// Nodes
// =============================================================================

/// What a native node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeKind {
    /// Embedder-provided root. Holds at most one mounted tree.
    Container,
    /// Host tag.
    Element(String),
    /// Text leaf.
    Text(String),
}

pub(crate) struct NativeNode {
    kind: NativeKind,
    attributes: BTreeMap<String, AttrValue>,
    listeners: BTreeMap<EventType, Listener>,
    /// Instance whose render produced this node.
    owner: Option<InstanceId>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NativeNode {
    fn new(kind: NativeKind, owner: Option<InstanceId>) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            listeners: BTreeMap::new(),
            owner,
            parent: None,
            children: Vec::new(),
        }
    }
}

// =============================================================================
// Tree
// =============================================================================

#[derive(Default)]
struct Slot {
    generation: u32,
    node: Option<NativeNode>,
}

#[derive(Default)]
pub struct NativeTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    allocated: usize,
}

impl NativeTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, node: NativeNode) -> NodeId {
        self.allocated += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(self.slots.len() - 1, 0)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
    }

    fn node(&self, id: NodeId) -> Option<&NativeNode> {
        self.slot(id).and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NativeNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    pub(crate) fn create_container(&mut self) -> ContainerId {
        ContainerId(self.allocate(NativeNode::new(NativeKind::Container, None)))
    }

    pub(crate) fn create_element(&mut self, tag: &str, owner: Option<InstanceId>) -> NodeId {
        self.allocate(NativeNode::new(NativeKind::Element(tag.to_string()), owner))
    }

    pub(crate) fn create_text(&mut self, content: &str, owner: Option<InstanceId>) -> NodeId {
        self.allocate(NativeNode::new(NativeKind::Text(content.to_string()), owner))
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub(crate) fn set_text(&mut self, id: NodeId, content: &str) {
        if let Some(node) = self.node_mut(id) {
            if let NativeKind::Text(text) = &mut node.kind {
                content.clone_into(text);
            }
        }
    }

    pub(crate) fn set_attribute(&mut self, id: NodeId, name: &str, value: AttrValue) {
        if let Some(node) = self.node_mut(id) {
            node.attributes.insert(name.to_string(), value);
        }
    }

    pub(crate) fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attributes.remove(name);
        }
    }

    /// Replace every listener bound on a node.
    pub(crate) fn set_listeners(
        &mut self,
        id: NodeId,
        listeners: BTreeMap<EventType, Listener>,
        owner: Option<InstanceId>,
    ) {
        if let Some(node) = self.node_mut(id) {
            node.listeners = listeners;
            node.owner = owner;
        }
    }

    /// Listener for `event_type` on a node, with the instance that bound it.
    pub(crate) fn listener(
        &self,
        id: NodeId,
        event_type: EventType,
    ) -> Option<(Listener, Option<InstanceId>)> {
        let node = self.node(id)?;
        node.listeners
            .get(&event_type)
            .map(|listener| (listener.clone(), node.owner))
    }

    /// Append `child` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Put `replacement` where `current` sits in its parent's child list.
    /// `current` ends up detached.
    pub(crate) fn replace_child(&mut self, current: NodeId, replacement: NodeId) {
        let Some(parent) = self.parent(current) else {
            return;
        };
        self.detach(replacement);
        if let Some(node) = self.node_mut(parent) {
            for child in node.children.iter_mut() {
                if *child == current {
                    *child = replacement;
                }
            }
        }
        if let Some(node) = self.node_mut(replacement) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(current) {
            node.parent = None;
        }
    }

    /// Reset the ordered child list of `parent`.
    ///
    /// Previous children missing from `children` are detached (not released).
    pub(crate) fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        let previous = match self.node_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for old in previous {
            if !children.contains(&old) {
                if let Some(node) = self.node_mut(old) {
                    node.parent = None;
                }
            }
        }
        for &child in &children {
            let elsewhere = self.parent(child).filter(|p| *p != parent);
            if elsewhere.is_some() {
                self.detach(child);
            }
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(parent);
            }
        }
        if let Some(node) = self.node_mut(parent) {
            node.children = children;
        }
    }

    /// Remove a node from its parent's child list.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Release a node and its whole subtree back to the pool.
    pub(crate) fn release(&mut self, id: NodeId) {
        self.detach(id);
        self.release_subtree(id);
    }

    fn release_subtree(&mut self, id: NodeId) {
        let Some(slot) = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
        else {
            return;
        };
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        for child in node.children {
            self.release_subtree(child);
        }
        self.allocated -= 1;
        self.free.push(id.index);

        // Everything gone: indices start over from the bottom
        if self.allocated == 0 {
            self.free = (0..self.slots.len()).rev().collect();
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.allocated
    }

    pub fn is_empty(&self) -> bool {
        self.allocated == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NativeKind> {
        self.node(id).map(|node| &node.kind)
    }

    /// Tag of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NativeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.node(id)?.attributes.get(name)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&BTreeMap<String, AttrValue>> {
        self.node(id).map(|node| &node.attributes)
    }

    pub fn has_listener(&self, id: NodeId, event_type: EventType) -> bool {
        self.node(id)
            .is_some_and(|node| node.listeners.contains_key(&event_type))
    }

    pub fn owner(&self, id: NodeId) -> Option<InstanceId> {
        self.node(id)?.owner
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// `id` followed by each of its ancestors, nearest first.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.contains(id).then_some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.parent(node);
        }
        path
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NativeKind::Text(text)) => out.push_str(text),
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Element nodes under (and including) `root` whose tag matches,
    /// in document order.
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.walk(root, &mut |id| {
            if self.tag(id) == Some(tag) {
                found.push(id);
            }
        });
        found
    }

    fn walk(&self, id: NodeId, f: &mut impl FnMut(NodeId)) {
        if !self.contains(id) {
            return;
        }
        f(id);
        for &child in self.children(id) {
            self.walk(child, f);
        }
    }

    /// Markup-like rendering of a subtree, e.g. `<li class="done">b</li>`.
    ///
    /// Containers render only their children. Attributes print in name
    /// order; `false` booleans are omitted and `true` ones print bare.
    pub fn outline(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_outline(id, &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.kind {
            NativeKind::Text(text) => out.push_str(text),
            NativeKind::Container => {
                for &child in &node.children {
                    self.write_outline(child, out);
                }
            }
            NativeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    match value {
                        AttrValue::Bool(false) => {}
                        AttrValue::Bool(true) => {
                            let _ = write!(out, " {name}");
                        }
                        other => {
                            let _ = write!(out, " {name}=\"{other}\"");
                        }
                    }
                }
                out.push('>');
                for &child in &node.children {
                    self.write_outline(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (NativeTree, ContainerId, NodeId) {
        let mut tree = NativeTree::new();
        let container = tree.create_container();
        let ul = tree.create_element("ul", None);
        let a = tree.create_element("li", None);
        let b = tree.create_element("li", None);
        let ta = tree.create_text("a", None);
        let tb = tree.create_text("b", None);
        tree.set_children(a, vec![ta]);
        tree.set_children(b, vec![tb]);
        tree.set_children(ul, vec![a, b]);
        tree.append_child(container.node(), ul);
        (tree, container, ul)
    }

    #[test]
    fn test_outline_and_text() {
        let (mut tree, container, ul) = sample();
        let items = tree.find_by_tag(ul, "li");
        tree.set_attribute(items[1], "class", AttrValue::from("done"));
        tree.set_attribute(items[1], "hidden", AttrValue::Bool(false));

        assert_eq!(
            tree.outline(container.node()),
            "<ul><li>a</li><li class=\"done\">b</li></ul>"
        );
        assert_eq!(tree.text_content(ul), "ab");
    }

    #[test]
    fn test_path_to_root() {
        let (tree, container, ul) = sample();
        let li = tree.children(ul)[0];
        let text = tree.children(li)[0];
        assert_eq!(tree.path_to_root(text), vec![text, li, ul, container.node()]);
    }

    #[test]
    fn test_set_children_reorders_and_detaches() {
        let (mut tree, _, ul) = sample();
        let [a, b] = [tree.children(ul)[0], tree.children(ul)[1]];
        tree.set_children(ul, vec![b]);
        assert_eq!(tree.children(ul), &[b]);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), Some(ul));
    }

    #[test]
    fn test_replace_child() {
        let (mut tree, _, ul) = sample();
        let a = tree.children(ul)[0];
        let p = tree.create_element("p", None);
        tree.replace_child(a, p);
        assert_eq!(tree.children(ul)[0], p);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_release_is_recursive_and_reuses_slots() {
        let (mut tree, container, ul) = sample();
        assert_eq!(tree.len(), 6);
        tree.release(ul);
        assert_eq!(tree.len(), 1);
        assert!(tree.children(container.node()).is_empty());

        let reused = tree.create_text("x", None);
        assert!(reused.index() < 6);
        assert_eq!(reused.generation(), 1);

        tree.release(reused);
        tree.release(container.node());
        assert!(tree.is_empty());
        assert_eq!(tree.create_container().node().index(), 0);
    }

    #[test]
    fn test_stale_id_does_not_reach_reused_slot() {
        let (mut tree, _, ul) = sample();
        let li = tree.children(ul)[0];
        tree.release(li);

        let fresh = tree.create_element("p", None);
        assert_eq!(fresh.index(), li.index());
        assert!(!tree.contains(li));
        assert_eq!(tree.tag(li), None);
        assert_eq!(tree.tag(fresh), Some("p"));

        // Writes through the stale id are ignored
        tree.set_attribute(li, "class", AttrValue::from("x"));
        assert_eq!(tree.attribute(fresh, "class"), None);
    }
}
