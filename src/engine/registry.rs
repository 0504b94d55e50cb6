//! Component Registry - Definitions by name and live instance records.
//!
//! Two tables:
//! - Definitions: name → type-erased vtable, registered once per runtime
//! - Instances: monotonic id → record (props, state, children, position)
//!
//! Instance ids are never reused; a remount always yields a fresh id.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::primitives::component::{AnyComponent, Definition, Scope};
use crate::primitives::{Component, ComponentElement, Element};
use crate::state::queue::UpdateQueue;
use crate::types::{ContainerId, InstanceId};

// =============================================================================
// Definitions
// =============================================================================

#[derive(Default)]
pub(crate) struct Definitions {
    by_name: HashMap<&'static str, Rc<dyn AnyComponent>>,
}

impl Definitions {
    /// Register `C`. Returns false if the name was already taken (the first
    /// registration stays in place).
    pub(crate) fn define<C: Component>(&mut self) -> bool {
        if let Some(existing) = self.by_name.get(C::NAME) {
            if existing.component_type() != TypeId::of::<C>() {
                tracing::warn!(
                    component = C::NAME,
                    "a different component is already defined under this name"
                );
            }
            return false;
        }
        self.by_name.insert(C::NAME, Rc::new(Definition::<C>::new()));
        tracing::debug!(component = C::NAME, "component defined");
        true
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Definition referenced by an element. The name must be registered and
    /// bound to the same Rust type.
    pub(crate) fn resolve(&self, element: &ComponentElement) -> Result<Rc<dyn AnyComponent>> {
        match self.by_name.get(element.name) {
            Some(def) if def.component_type() == element.type_id => Ok(def.clone()),
            _ => Err(Error::UnknownComponent {
                name: element.name.to_string(),
            }),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}

// =============================================================================
// Instances
// =============================================================================

/// A mounted component instance.
pub(crate) struct Instance {
    pub(crate) id: InstanceId,
    pub(crate) def: Rc<dyn AnyComponent>,
    pub(crate) props: Rc<dyn Any>,
    pub(crate) state: Box<dyn Any>,
    /// Children passed by the parent element.
    pub(crate) children: Vec<Element>,
    pub(crate) container: ContainerId,
    /// Owning component instance, `None` for roots.
    pub(crate) parent: Option<InstanceId>,
    /// Component depth from the root (root = 0).
    pub(crate) depth: usize,
}

impl Instance {
    pub(crate) fn scope<'a>(&'a self, queue: &'a Rc<RefCell<UpdateQueue>>) -> Scope<'a> {
        Scope {
            id: self.id,
            props: self.props.as_ref(),
            state: self.state.as_ref(),
            children: &self.children,
            queue,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        self.def.name()
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Default)]
pub(crate) struct Instances {
    records: HashMap<InstanceId, Instance>,
    next_id: u64,
}

impl Instances {
    /// Next instance id. Ids are monotonic and never reused.
    pub(crate) fn allocate_id(&mut self) -> InstanceId {
        self.next_id += 1;
        InstanceId(self.next_id)
    }

    pub(crate) fn insert(&mut self, instance: Instance) {
        self.records.insert(instance.id, instance);
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<Instance> {
        self.records.remove(&id)
    }

    pub(crate) fn get(&self, id: InstanceId) -> Result<&Instance> {
        self.records.get(&id).ok_or(Error::UnknownInstance(id))
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Result<&mut Instance> {
        self.records.get_mut(&id).ok_or(Error::UnknownInstance(id))
    }

    pub(crate) fn contains(&self, id: InstanceId) -> bool {
        self.records.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Context;

    struct Alpha;
    struct Impostor;

    impl Component for Alpha {
        const NAME: &'static str = "Alpha";
        type Props = ();
        type State = ();

        fn render(_cx: &Context<'_, Self>) -> Element {
            Element::tag("a")
        }
    }

    impl Component for Impostor {
        const NAME: &'static str = "Alpha";
        type Props = ();
        type State = ();

        fn render(_cx: &Context<'_, Self>) -> Element {
            Element::tag("b")
        }
    }

    fn component_element(element: Element) -> ComponentElement {
        match element {
            Element::Component(component) => component,
            other => panic!("not a component element: {other:?}"),
        }
    }

    #[test]
    fn test_define_once() {
        let mut defs = Definitions::default();
        assert!(defs.define::<Alpha>());
        assert!(!defs.define::<Alpha>());
        assert!(!defs.define::<Impostor>());
        assert_eq!(defs.len(), 1);
        assert!(defs.is_defined("Alpha"));
    }

    #[test]
    fn test_resolve_checks_type() {
        let mut defs = Definitions::default();
        let alpha = component_element(Element::component::<Alpha>(()));
        let impostor = component_element(Element::component::<Impostor>(()));

        assert!(matches!(defs.resolve(&alpha), Err(Error::UnknownComponent { .. })));
        defs.define::<Alpha>();
        assert_eq!(defs.resolve(&alpha).unwrap().name(), "Alpha");
        assert!(matches!(defs.resolve(&impostor), Err(Error::UnknownComponent { .. })));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut instances = Instances::default();
        let a = instances.allocate_id();
        let b = instances.allocate_id();
        assert_ne!(a, b);
        assert!(b > a);
        assert!(matches!(instances.get(a), Err(Error::UnknownInstance(id)) if id == a));
    }
}
