//! Primitives - Component building blocks.
//!
//! - [`element`] - Immutable element descriptions (host tags, text, components)
//! - [`component`] - The [`Component`] trait, render context and handles
//! - [`children`] - Helpers over opaque children lists
//!
//! # Architecture
//!
//! Rendering is a pure function from props and state to an [`Element`]:
//!
//! ```ignore
//! fn render(cx: &Context<'_, Self>) -> Element {
//!     Element::tag("ul").children(cx.props().items.iter().map(|item| {
//!         Element::component::<Todo>(TodoProps { title: item.clone() }).key(item.as_str())
//!     }))
//! }
//! ```
//!
//! The runtime turns elements into native nodes and instances; the same
//! element tree rendered twice produces the same native tree.

pub mod children;
pub mod component;
pub mod element;

pub use component::{Component, Context, Handle};
pub use element::{ComponentElement, Element, HostElement, Listener};
