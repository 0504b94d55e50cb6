//! Engine - Native node arena and component registry.
//!
//! The engine holds the data the runtime works on:
//! - Native: host node arena (tags, text, attributes, listeners, parent links)
//! - Registry: component definitions by name, live instance records
//!
//! # Architecture
//!
//! Instances are not objects holding their own subtree. They are records
//! keyed by id; the mounted tree links ids to native nodes:
//!
//! ```text
//! i1 App      → n1 <div>
//! i2 TodoList →   n3 <ul>
//! i3 Todo     →     n4 <li>
//! i4 Todo     →     n6 <li>
//! ```

pub mod native;
pub(crate) mod registry;

pub use native::{NativeKind, NativeTree};
