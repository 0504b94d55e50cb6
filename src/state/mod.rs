//! State Module - Events, the update queue and dispatch.
//!
//! - **Event** - Event types, modifier flags, native and synthetic events
//! - **Queue** - Pending state/props changes, dirty tracking, batching
//! - **Dispatch** - Bubbling native events through bound listeners

pub mod event;
pub(crate) mod queue;
mod dispatch;

pub use event::*;
pub use dispatch::DispatchOutcome;
