//! Mounted tree - What is currently on screen, per container.
//!
//! Mirrors the last committed element tree, with every position linked to
//! the native node (and component instance) it produced. Each mounted
//! position maps to exactly one native node: a component maps to the node
//! of whatever it rendered.

use std::any::TypeId;
use std::collections::BTreeMap;

use crate::primitives::ComponentElement;

use crate::types::{AttrValue, InstanceId, Key, NodeId};

pub(crate) enum Mounted {
    Host {
        node: NodeId,
        tag: String,
        key: Option<Key>,
        attributes: BTreeMap<String, AttrValue>,
        children: Vec<Mounted>,
    },
    Text {
        node: NodeId,
        text: String,
    },
    Component {
        id: InstanceId,
        /// Definition the instance was created from.
        name: &'static str,
        type_id: TypeId,
        key: Option<Key>,
        rendered: Box<Mounted>,
    },
}

impl Mounted {
    /// Native node this position renders to.
    pub(crate) fn native_node(&self) -> NodeId {
        match self {
            Mounted::Host { node, .. } | Mounted::Text { node, .. } => *node,
            Mounted::Component { rendered, .. } => rendered.native_node(),
        }
    }

    pub(crate) fn key(&self) -> Option<&Key> {
        match self {
            Mounted::Host { key, .. } | Mounted::Component { key, .. } => key.as_ref(),
            Mounted::Text { .. } => None,
        }
    }

    /// Whether `element` refers to the same definition as the instance
    /// mounted here.
    pub(crate) fn same_component(&self, element: &ComponentElement) -> bool {
        match self {
            Mounted::Component { name, type_id, .. } => {
                *name == element.name && *type_id == element.type_id
            }
            _ => false,
        }
    }

    /// Outermost instance at this position, if a component is mounted here.
    pub(crate) fn instance(&self) -> Option<InstanceId> {
        match self {
            Mounted::Component { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Subtree rendered by instance `id`.
    pub(crate) fn find_rendered(&self, target: InstanceId) -> Option<&Mounted> {
        match self {
            Mounted::Component { id, rendered, .. } => {
                if *id == target {
                    Some(rendered.as_ref())
                } else {
                    rendered.find_rendered(target)
                }
            }
            Mounted::Host { children, .. } => {
                children.iter().find_map(|child| child.find_rendered(target))
            }
            Mounted::Text { .. } => None,
        }
    }

    /// Mutable subtree rendered by instance `id`.
    pub(crate) fn find_rendered_mut(&mut self, target: InstanceId) -> Option<&mut Mounted> {
        match self {
            Mounted::Component { id, rendered, .. } => {
                if *id == target {
                    Some(rendered.as_mut())
                } else {
                    rendered.find_rendered_mut(target)
                }
            }
            Mounted::Host { children, .. } => children
                .iter_mut()
                .find_map(|child| child.find_rendered_mut(target)),
            Mounted::Text { .. } => None,
        }
    }

    /// The same native subtree with every component position collapsed
    /// into what it rendered.
    pub(crate) fn without_instances(self) -> Mounted {
        match self {
            Mounted::Component { rendered, .. } => rendered.without_instances(),
            Mounted::Host {
                node,
                tag,
                key,
                attributes,
                children,
            } => Mounted::Host {
                node,
                tag,
                key,
                attributes,
                children: children.into_iter().map(Mounted::without_instances).collect(),
            },
            text @ Mounted::Text { .. } => text,
        }
    }

    /// Every instance in the subtree, parents before children.
    pub(crate) fn instances(&self) -> Vec<InstanceId> {
        let mut out = Vec::new();
        self.collect_instances(&mut out);
        out
    }

    fn collect_instances(&self, out: &mut Vec<InstanceId>) {
        match self {
            Mounted::Component { id, rendered, .. } => {
                out.push(*id);
                rendered.collect_instances(out);
            }
            Mounted::Host { children, .. } => {
                for child in children {
                    child.collect_instances(out);
                }
            }
            Mounted::Text { .. } => {}
        }
    }
}
