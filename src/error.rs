//! Error types surfaced by mounting, reconciliation and dispatch.

use thiserror::Error;

use crate::state::EventType;
use crate::types::{ContainerId, InstanceId, NodeId};

/// Error type returned by lifecycle hooks and event listeners.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a fallible lifecycle hook or listener.
pub type HookResult = std::result::Result<(), BoxError>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the tree engine.
///
/// All operations are synchronous and either succeed or fail outright.
/// Nothing is retried and state already committed before a failure stays
/// committed.
#[derive(Debug, Error)]
pub enum Error {
    /// A render produced zero or several top-level descriptions.
    #[error("invalid tree: {reason}")]
    InvalidTree { reason: String },

    /// An element references a component that is not defined in the runtime.
    #[error("unknown component `{name}`")]
    UnknownComponent { name: String },

    /// The container handle does not name a live container.
    #[error("unknown container {0}")]
    UnknownContainer(ContainerId),

    /// The native node does not exist (released or never allocated).
    #[error("unknown native node {0}")]
    UnknownNode(NodeId),

    /// The instance is not (or no longer) mounted.
    #[error("unknown instance {0}")]
    UnknownInstance(InstanceId),

    /// A props update was queued for an instance that has a parent.
    #[error("props can only be set on a root instance, `{component}` is mounted under a parent")]
    PropsOnChild { component: &'static str },

    /// A typed root operation targeted a root of another component type.
    #[error("root of {container} is not a `{expected}` component")]
    NotRootComponent {
        container: ContainerId,
        expected: &'static str,
    },

    /// A lifecycle hook returned an error.
    #[error("`{component}::{hook}` failed: {source}")]
    Hook {
        component: &'static str,
        hook: &'static str,
        #[source]
        source: BoxError,
    },

    /// An event listener returned an error.
    #[error("`{event}` listener failed: {source}")]
    Handler {
        event: EventType,
        #[source]
        source: BoxError,
    },

    /// Updates scheduled from post-commit hooks kept re-dirtying the tree.
    #[error("updates did not settle after {passes} flush passes")]
    UpdateLoop { passes: usize },
}

impl Error {
    pub(crate) fn invalid_tree(reason: impl Into<String>) -> Self {
        Error::InvalidTree {
            reason: reason.into(),
        }
    }
}
