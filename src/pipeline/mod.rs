//! Pipeline - From element trees to committed native trees.
//!
//! # Pipeline Architecture
//!
//! ```text
//! render(element) ─┐
//! handle updates ──┼→ update queue → flush passes → reconcile → commit → hooks
//! dispatch(event) ─┘
//! ```
//!
//! ## Data Flow
//!
//! 1. **mount** - Fresh subtrees: instances created, native nodes built
//! 2. **reconcile** - Existing subtrees: kept, updated in place, or replaced
//! 3. **flush** - Dirty instances re-rendered shallowest first, in passes
//!
//! ## Key Design Principles
//!
//! - **Renders are pure**: hooks and listeners only queue updates
//! - **One flush per batch**: any number of updates in a dispatch or batch
//!   produce at most one re-render per instance
//! - **Identity by position and key**: same kind at the same position keeps
//!   its instance and state

mod flush;
pub mod mount;
mod reconcile;
pub mod runtime;
mod tree;

pub use mount::RootHandle;
pub use runtime::Runtime;
