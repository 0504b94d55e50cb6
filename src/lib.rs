//! # spark-vtree
//!
//! Declarative component trees for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! observable runtime counters.
//!
//! ## Architecture
//!
//! Components are types implementing [`Component`]. A render is a pure
//! function from props and state to an [`Element`] description; the
//! [`Runtime`] turns descriptions into a native node tree and keeps it in
//! sync as state changes:
//!
//! ```text
//! Element tree → mount / reconcile → native tree
//!        ↑                               │
//!   flush passes ← update queue ← dispatch(event)
//! ```
//!
//! State changes are never applied immediately. Handles queue them, and the
//! runtime flushes once per batch (one dispatch, one render, one
//! [`Runtime::batched_updates`] call), re-rendering each dirty instance at
//! most once per pass.
//!
//! ## Modules
//!
//! - [`types`] - Identifiers, keys, attribute values
//! - [`engine`] - Native node arena, component registry
//! - [`primitives`] - Elements, the component trait, children helpers
//! - [`pipeline`] - Runtime: mount, reconcile, flush
//! - [`state`] - Events, dispatch, update queue
//!
//! ## Example
//!
//! ```ignore
//! use spark_vtree::{Component, Context, Element, EventType, NativeEvent, Runtime};
//!
//! struct Toggle;
//!
//! impl Component for Toggle {
//!     const NAME: &'static str = "Toggle";
//!     type Props = ();
//!     type State = bool;
//!
//!     fn render(cx: &Context<'_, Self>) -> Element {
//!         let handle = cx.handle();
//!         Element::tag("button")
//!             .on(EventType::Click, move |_| handle.set_state(|on| *on = !*on))
//!             .child(if *cx.state() { "on" } else { "off" })
//!     }
//! }
//!
//! let mut runtime = Runtime::new();
//! runtime.define::<Toggle>();
//! let container = runtime.create_container();
//! let root = runtime.render(Element::component::<Toggle>(()), container)?;
//! runtime.dispatch(NativeEvent::click(), root.node)?;
//! assert_eq!(runtime.native().outline(container.node()), "<button>on</button>");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod primitives;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{RuntimeConfig, DEFAULT_MAX_FLUSH_PASSES};

pub use error::{BoxError, Error, HookResult, Result};

pub use engine::{NativeKind, NativeTree};

pub use pipeline::{RootHandle, Runtime};

pub use primitives::{
    children, Component, ComponentElement, Context, Element, Handle, HostElement, Listener,
};

pub use state::{
    DispatchOutcome, EventCategory, EventDetail, EventFlags, EventPhase, EventType,
    KeyboardDetail, Modifiers, MouseDetail, NativeEvent, SyntheticEvent, WheelDetail,
};
