//! Element descriptions - What to render.
//!
//! An [`Element`] is an immutable, cheap-to-clone value produced fresh on
//! every render. It is either a host tag (attributes, listeners, children),
//! a text leaf, a reference to a component definition with typed props, or
//! one of the two list helpers ([`Element::Fragment`], [`Element::Empty`])
//! that only make sense as children.
//!
//! # Example
//!
//! ```ignore
//! use spark_vtree::{Element, EventType};
//!
//! let item = Element::tag("li")
//!     .class(if done { "done" } else { "" })
//!     .on(EventType::Click, move |_| handle.set_state(|s| s.done = !s.done))
//!     .child(title);
//! ```

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{HookResult, Result, Error};
use crate::primitives::Component;
use crate::state::{EventType, SyntheticEvent};
use crate::types::{AttrValue, Key};

// =============================================================================
// Listener
// =============================================================================

/// Event listener bound on a host element.
///
/// Rc so the same listener can live in the description and in the native
/// tree without copying the closure.
pub type Listener = Rc<dyn Fn(&mut SyntheticEvent) -> HookResult>;

// =============================================================================
// Host Element
// =============================================================================

/// A primitive tag with attributes, listeners and children.
#[derive(Clone)]
pub struct HostElement {
    pub(crate) tag: String,
    pub(crate) key: Option<Key>,
    pub(crate) attributes: BTreeMap<String, AttrValue>,
    pub(crate) listeners: BTreeMap<EventType, Listener>,
    pub(crate) children: Vec<Element>,
}

impl HostElement {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_listener(&self, event_type: EventType) -> bool {
        self.listeners.contains_key(&event_type)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }
}

impl PartialEq for HostElement {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.key == other.key
            && self.attributes == other.attributes
            && self.children == other.children
            && self.listeners.len() == other.listeners.len()
            && self
                .listeners
                .iter()
                .zip(other.listeners.iter())
                .all(|((ta, la), (tb, lb))| ta == tb && Rc::ptr_eq(la, lb))
    }
}

impl fmt::Debug for HostElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostElement")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("attributes", &self.attributes)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

// =============================================================================
// Component Element
// =============================================================================

/// A reference to a component definition, by name, with typed props.
#[derive(Clone)]
pub struct ComponentElement {
    pub(crate) name: &'static str,
    pub(crate) type_id: TypeId,
    pub(crate) props: Rc<dyn Any>,
    pub(crate) props_eq: fn(&dyn Any, &dyn Any) -> bool,
    pub(crate) key: Option<Key>,
    pub(crate) children: Vec<Element>,
}

impl ComponentElement {
    /// Name of the referenced definition.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Typed props, if this element references `C`.
    pub fn props<C: Component>(&self) -> Option<&C::Props> {
        if self.type_id != TypeId::of::<C>() {
            return None;
        }
        self.props.downcast_ref::<C::Props>()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Whether both elements reference the same definition.
    pub(crate) fn same_component(&self, other: &ComponentElement) -> bool {
        self.name == other.name && self.type_id == other.type_id
    }
}

fn props_eq<C: Component>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<C::Props>(), b.downcast_ref::<C::Props>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl PartialEq for ComponentElement {
    fn eq(&self, other: &Self) -> bool {
        self.same_component(other)
            && self.key == other.key
            && (self.props_eq)(self.props.as_ref(), other.props.as_ref())
            && self.children == other.children
    }
}

impl fmt::Debug for ComponentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentElement")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Element
// =============================================================================

/// Immutable description of what to render at one position.
#[derive(Clone, PartialEq, Debug)]
pub enum Element {
    /// Primitive tag.
    Host(HostElement),
    /// Text leaf.
    Text(String),
    /// Component reference.
    Component(ComponentElement),
    /// Several siblings, flattened into the parent's children.
    Fragment(Vec<Element>),
    /// Nothing. Dropped from children lists.
    Empty,
}

impl Element {
    /// A primitive tag with no attributes or children.
    pub fn tag(tag: impl Into<String>) -> Self {
        Element::Host(HostElement {
            tag: tag.into(),
            key: None,
            attributes: BTreeMap::new(),
            listeners: BTreeMap::new(),
            children: Vec::new(),
        })
    }

    /// A text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Element::Text(content.into())
    }

    /// A reference to component `C` with explicit props.
    pub fn component<C: Component>(props: C::Props) -> Self {
        Element::Component(ComponentElement {
            name: C::NAME,
            type_id: TypeId::of::<C>(),
            props: Rc::new(props),
            props_eq: props_eq::<C>,
            key: None,
            children: Vec::new(),
        })
    }

    /// A reference to component `C`, starting from its default props.
    pub fn component_with<C: Component>(configure: impl FnOnce(&mut C::Props)) -> Self {
        let mut props = C::default_props();
        configure(&mut props);
        Self::component::<C>(props)
    }

    /// Several siblings at once.
    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        Element::Fragment(children.into_iter().collect())
    }

    /// Nothing.
    pub fn empty() -> Self {
        Element::Empty
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Set the sibling key. Only host and component elements carry keys;
    /// on other variants this is a no-op.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        match &mut self {
            Element::Host(host) => host.key = Some(key.into()),
            Element::Component(component) => component.key = Some(key.into()),
            _ => {}
        }
        self
    }

    /// Set an attribute on a host element.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        if let Element::Host(host) = &mut self {
            host.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Set the `class` attribute.
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", AttrValue::Str(class.into()))
    }

    /// Bind an infallible listener on a host element.
    pub fn on<F>(self, event_type: EventType, listener: F) -> Self
    where
        F: Fn(&mut SyntheticEvent) + 'static,
    {
        self.try_on(event_type, move |event| {
            listener(event);
            Ok(())
        })
    }

    /// Bind a fallible listener. Errors propagate out of dispatch.
    pub fn try_on<F>(mut self, event_type: EventType, listener: F) -> Self
    where
        F: Fn(&mut SyntheticEvent) -> HookResult + 'static,
    {
        if let Element::Host(host) = &mut self {
            host.listeners.insert(event_type, Rc::new(listener));
        }
        self
    }

    /// Append one child to a host or component element.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child.into());
        }
        self
    }

    /// Append several children to a host or component element.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        if let Some(list) = self.children_mut() {
            list.extend(children.into_iter().map(Into::into));
        }
        self
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Element>> {
        match self {
            Element::Host(host) => Some(&mut host.children),
            Element::Component(component) => Some(&mut component.children),
            Element::Fragment(children) => Some(children),
            Element::Text(_) | Element::Empty => None,
        }
    }

    // -------------------------------------------------------------------------
    // Cloning with overrides
    // -------------------------------------------------------------------------

    /// Copy of a host element with `attributes` merged in shallowly.
    /// Key, listeners and children are kept. Other variants are returned as-is.
    pub fn cloned_with_attrs<K, V>(&self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttrValue>,
    {
        let mut cloned = self.clone();
        if let Element::Host(host) = &mut cloned {
            for (name, value) in attributes {
                host.attributes.insert(name.into(), value.into());
            }
        }
        cloned
    }

    /// Copy of a `C` element with new props. Key and children are kept.
    /// Returns `None` if this element does not reference `C`.
    pub fn cloned_with_props<C: Component>(&self, props: C::Props) -> Option<Self> {
        let Element::Component(component) = self else {
            return None;
        };
        if component.type_id != TypeId::of::<C>() {
            return None;
        }
        let mut cloned = component.clone();
        cloned.props = Rc::new(props);
        Some(Element::Component(cloned))
    }

    /// Copy with children replaced. Key and props/attributes are kept.
    pub fn cloned_with_children(&self, children: impl IntoIterator<Item = Element>) -> Self {
        let mut cloned = self.clone();
        if let Some(list) = cloned.children_mut() {
            *list = children.into_iter().collect();
        }
        cloned
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Explicit sibling key, if any.
    pub fn key_ref(&self) -> Option<&Key> {
        match self {
            Element::Host(host) => host.key.as_ref(),
            Element::Component(component) => component.key.as_ref(),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&HostElement> {
        match self {
            Element::Host(host) => Some(host),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&ComponentElement> {
        match self {
            Element::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Element::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Short description used in logs and errors.
    pub fn kind_name(&self) -> String {
        match self {
            Element::Host(host) => format!("<{}>", host.tag),
            Element::Text(_) => "#text".to_string(),
            Element::Component(component) => component.name.to_string(),
            Element::Fragment(children) => format!("fragment({})", children.len()),
            Element::Empty => "empty".to_string(),
        }
    }

    /// Resolve to exactly one renderable root.
    ///
    /// Fragments are flattened; a single survivor is unwrapped. Zero or
    /// several survivors is an invalid tree.
    pub(crate) fn into_single_root(self) -> Result<Element> {
        match self {
            Element::Fragment(_) | Element::Empty => {
                let mut flat = super::children::flatten(vec![self]);
                match flat.len() {
                    1 => Ok(flat.remove(0)),
                    0 => Err(Error::invalid_tree("render produced no element")),
                    n => Err(Error::invalid_tree(format!(
                        "render produced {n} top-level elements, expected exactly one"
                    ))),
                }
            }
            single => Ok(single),
        }
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::Text(value)
    }
}

impl From<&String> for Element {
    fn from(value: &String) -> Self {
        Element::Text(value.clone())
    }
}

impl From<HostElement> for Element {
    fn from(value: HostElement) -> Self {
        Element::Host(value)
    }
}

impl From<ComponentElement> for Element {
    fn from(value: ComponentElement) -> Self {
        Element::Component(value)
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Element::Empty, Into::into)
    }
}

impl<T: Into<Element>> From<Vec<T>> for Element {
    fn from(value: Vec<T>) -> Self {
        Element::Fragment(value.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::Context;

    struct Label;

    #[derive(Clone, PartialEq, Default, Debug)]
    struct LabelProps {
        text: String,
    }

    impl Component for Label {
        const NAME: &'static str = "Label";
        type Props = LabelProps;
        type State = ();

        fn default_props() -> LabelProps {
            LabelProps {
                text: "untitled".into(),
            }
        }

        fn render(cx: &Context<'_, Self>) -> Element {
            Element::text(cx.props().text.clone())
        }
    }

    #[test]
    fn test_builders() {
        let el = Element::tag("div")
            .key("root")
            .class("container")
            .attr("hidden", false)
            .child("hello")
            .children(vec!["a", "b"]);

        let host = el.as_host().unwrap();
        assert_eq!(host.tag(), "div");
        assert_eq!(el.key_ref(), Some(&Key::from("root")));
        assert_eq!(host.attribute("class"), Some(&AttrValue::from("container")));
        assert_eq!(host.children().len(), 3);
    }

    #[test]
    fn test_structural_equality() {
        let a = Element::tag("ul").child(Element::component::<Label>(LabelProps { text: "x".into() }));
        let b = Element::tag("ul").child(Element::component::<Label>(LabelProps { text: "x".into() }));
        let c = Element::tag("ul").child(Element::component::<Label>(LabelProps { text: "y".into() }));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_listeners_compare_by_identity() {
        let a = Element::tag("button").on(EventType::Click, |_| {});
        let b = Element::tag("button").on(EventType::Click, |_| {});
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
        assert!(a.as_host().unwrap().has_listener(EventType::Click));
    }

    #[test]
    fn test_component_with_defaults() {
        let el = Element::component_with::<Label>(|_| {});
        assert_eq!(el.as_component().unwrap().props::<Label>().unwrap().text, "untitled");

        let el = Element::component_with::<Label>(|p| p.text = "set".into());
        assert_eq!(el.as_component().unwrap().props::<Label>().unwrap().text, "set");
    }

    #[test]
    fn test_key_ignored_on_text() {
        assert_eq!(Element::text("x").key("k").key_ref(), None);
    }

    #[test]
    fn test_single_root() {
        assert!(Element::tag("a").into_single_root().is_ok());
        assert!(Element::fragment([Element::tag("a")]).into_single_root().is_ok());
        assert!(matches!(
            Element::Empty.into_single_root(),
            Err(Error::InvalidTree { .. })
        ));
        assert!(matches!(
            Element::fragment([Element::tag("a"), Element::tag("b")]).into_single_root(),
            Err(Error::InvalidTree { .. })
        ));
    }

    #[test]
    fn test_clone_overrides() {
        let original = Element::tag("li").key(1).class("item").child("a");
        let merged = original.cloned_with_attrs([("class", "item done"), ("title", "t")]);
        let host = merged.as_host().unwrap();
        assert_eq!(host.attribute("class"), Some(&AttrValue::from("item done")));
        assert_eq!(host.attribute("title"), Some(&AttrValue::from("t")));
        assert_eq!(merged.key_ref(), Some(&Key::Int(1)));

        let replaced = original.cloned_with_children([Element::text("b")]);
        assert_eq!(replaced.as_host().unwrap().children(), &[Element::text("b")]);

        let label = Element::component::<Label>(LabelProps::default()).key("l");
        let relabeled = label
            .cloned_with_props::<Label>(LabelProps { text: "new".into() })
            .unwrap();
        assert_eq!(relabeled.key_ref(), Some(&Key::from("l")));
        assert!(original.cloned_with_props::<Label>(LabelProps::default()).is_none());
    }
}
