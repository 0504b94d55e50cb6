//! Core types - Identifiers, keys and attribute values.
//!
//! These are the small value types shared by every layer of the engine:
//! - [`NodeId`] / [`ContainerId`] - slots in the native node tree
//! - [`InstanceId`] - live component instances (never reused)
//! - [`Key`] - explicit sibling identity for reconciliation
//! - [`AttrValue`] - inert attribute data applied to native nodes

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Slot of a node in the native tree, tagged with the slot's generation.
///
/// Slots are recycled after a node is released; the generation moves on
/// each time, so an id kept past its node's release never resolves to the
/// node that reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Raw slot index.
    pub fn index(self) -> usize {
        self.index
    }

    /// How many times the slot had been released before this node.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "n{}", self.index)
        } else {
            write!(f, "n{}v{}", self.index, self.generation)
        }
    }
}

/// Opaque handle to a container node owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) NodeId);

impl ContainerId {
    /// The native node backing this container.
    pub fn node(self) -> NodeId {
        self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container({})", self.0)
    }
}

/// Identity of a mounted component instance.
///
/// Generated from a monotonic counter: a remounted component always gets a
/// new id, so ids double as "is this the same instance" checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

// =============================================================================
// Keys
// =============================================================================

/// Explicit identity of an element among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Str(String),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s}"),
            Key::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// A value applied to a native node attribute.
///
/// The engine never interprets attributes; they are carried to the native
/// tree as-is and diffed by equality.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Inline style declarations, kept sorted for stable output.
    Style(BTreeMap<String, String>),
}

impl AttrValue {
    /// String payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean attribute.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Build a style attribute from `(property, value)` pairs.
    pub fn style<K, V>(declarations: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        AttrValue::Style(
            declarations
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Style(decls) => {
                let mut first = true;
                for (prop, value) in decls {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{prop}: {value};")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from("a"), Key::Str("a".to_string()));
        assert_eq!(Key::from(3usize), Key::Int(3));
        assert_eq!(Key::from(-1i32).to_string(), "-1");
    }

    #[test]
    fn test_style_display_is_sorted() {
        let style = AttrValue::style([("margin", "0"), ("color", "red")]);
        assert_eq!(style.to_string(), "color: red; margin: 0;");
    }

    #[test]
    fn test_attr_accessors() {
        assert_eq!(AttrValue::from("done").as_str(), Some("done"));
        assert_eq!(AttrValue::from(true).as_bool(), Some(true));
        assert_eq!(AttrValue::from(1).as_str(), None);
    }
}
