//! Update Queue - Pending state/props changes and flush scheduling
//!
//! Handles write here; the runtime drains it at the next flush point.
//!
//! - Changes are kept per instance, in call order
//! - An instance is marked dirty once, however many changes it receives
//! - Callbacks registered with an update become ready when the update's
//!   changes are taken, and run after that pass commits

use std::any::Any;
use std::collections::{HashMap, HashSet};

use crate::types::InstanceId;

// =============================================================================
// Changes
// =============================================================================

/// Type-erased mutation of an instance's state or props.
pub(crate) type Patch = Box<dyn FnOnce(&mut dyn Any)>;

/// One queued change, applied in call order at flush time.
pub(crate) enum Change {
    /// Shallow merge into state (closure assigns the fields it cares about).
    MergeState(Patch),
    /// Replace the whole state.
    ReplaceState(Box<dyn Any>),
    /// Shallow merge into props. Roots only.
    MergeProps(Patch),
    /// Replace the whole props value. Roots only.
    ReplaceProps(Box<dyn Any>),
    /// Re-render even if `should_update` would veto.
    Force,
}

impl Change {
    pub(crate) fn touches_props(&self) -> bool {
        matches!(self, Change::MergeProps(_) | Change::ReplaceProps(_))
    }
}

impl std::fmt::Debug for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Change::MergeState(_) => "MergeState",
            Change::ReplaceState(_) => "ReplaceState",
            Change::MergeProps(_) => "MergeProps",
            Change::ReplaceProps(_) => "ReplaceProps",
            Change::Force => "Force",
        };
        f.write_str(name)
    }
}

/// Callback run once an update has been committed.
pub(crate) type Callback = Box<dyn FnOnce()>;

// =============================================================================
// Queue
// =============================================================================

#[derive(Default)]
pub(crate) struct UpdateQueue {
    pending: HashMap<InstanceId, Vec<Change>>,
    /// Dirty instances in the order they were first scheduled.
    dirty: Vec<InstanceId>,
    /// Callbacks whose updates have not been taken yet.
    callbacks: Vec<(InstanceId, Callback)>,
    /// Callbacks whose updates were applied in the current pass.
    ready: Vec<Callback>,
    batch_depth: usize,
    /// Instances currently mounted. Handles consult this before queueing.
    live: HashSet<InstanceId>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a change for an instance.
    pub(crate) fn enqueue(&mut self, id: InstanceId, change: Change) {
        let changes = self.pending.entry(id).or_default();
        if changes.is_empty() && !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
        changes.push(change);
    }

    /// Queue a callback for the changes already queued on `id`.
    pub(crate) fn push_callback(&mut self, id: InstanceId, callback: Callback) {
        self.callbacks.push((id, callback));
    }

    /// Remove and return every pending change for an instance. Callbacks
    /// registered with those changes become ready.
    pub(crate) fn take(&mut self, id: InstanceId) -> Vec<Change> {
        let (mine, rest) = std::mem::take(&mut self.callbacks)
            .into_iter()
            .partition::<Vec<_>, _>(|(owner, _)| *owner == id);
        self.callbacks = rest;
        self.ready.extend(mine.into_iter().map(|(_, callback)| callback));
        self.pending.remove(&id).unwrap_or_default()
    }

    pub(crate) fn has_pending(&self, id: InstanceId) -> bool {
        self.pending.get(&id).is_some_and(|changes| !changes.is_empty())
    }

    /// Drain the dirty list, keeping only instances that still have changes.
    pub(crate) fn take_dirty(&mut self) -> Vec<InstanceId> {
        let dirty = std::mem::take(&mut self.dirty);
        dirty.into_iter().filter(|id| self.has_pending(*id)).collect()
    }

    /// Drain the callbacks made ready since the last commit.
    pub(crate) fn take_ready(&mut self) -> Vec<Callback> {
        std::mem::take(&mut self.ready)
    }

    /// Drop ready callbacks of a pass that failed.
    pub(crate) fn clear_ready(&mut self) -> usize {
        std::mem::take(&mut self.ready).len()
    }

    /// Drop everything queued for an instance that is going away.
    ///
    /// Returns how many changes were dropped.
    pub(crate) fn discard(&mut self, id: InstanceId) -> usize {
        self.dirty.retain(|dirty| *dirty != id);
        self.callbacks.retain(|(owner, _)| *owner != id);
        self.pending.remove(&id).map_or(0, |changes| changes.len())
    }

    pub(crate) fn mark_live(&mut self, id: InstanceId) {
        self.live.insert(id);
    }

    /// Forget a torn-down instance and everything queued for it.
    pub(crate) fn mark_dead(&mut self, id: InstanceId) -> usize {
        self.live.remove(&id);
        self.discard(id)
    }

    pub(crate) fn is_live(&self, id: InstanceId) -> bool {
        self.live.contains(&id)
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.pending.values().all(Vec::is_empty)
    }

    // -------------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------------

    pub(crate) fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Close a batch. Returns true when the outermost batch closed.
    pub(crate) fn end_batch(&mut self) -> bool {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        self.batch_depth == 0
    }

    pub(crate) fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge() -> Change {
        Change::MergeState(Box::new(|_| {}))
    }

    #[test]
    fn test_dirty_marked_once() {
        let mut queue = UpdateQueue::new();
        let a = InstanceId(1);
        let b = InstanceId(2);

        queue.enqueue(a, merge());
        queue.enqueue(b, merge());
        queue.enqueue(a, Change::Force);

        assert_eq!(queue.take_dirty(), vec![a, b]);
        assert_eq!(queue.take(a).len(), 2);
        assert!(queue.has_pending(b));
    }

    #[test]
    fn test_callbacks_ready_only_when_their_changes_are_taken() {
        let mut queue = UpdateQueue::new();
        let a = InstanceId(1);
        let b = InstanceId(2);
        queue.enqueue(a, merge());
        queue.push_callback(a, Box::new(|| {}));
        queue.enqueue(b, merge());
        queue.push_callback(b, Box::new(|| {}));

        assert!(queue.take_ready().is_empty());
        queue.take(b);
        assert_eq!(queue.take_ready().len(), 1);
        assert!(queue.take_ready().is_empty());

        queue.take(a);
        assert_eq!(queue.clear_ready(), 1);
        assert!(queue.take_ready().is_empty());
    }

    #[test]
    fn test_taken_instances_leave_dirty_list() {
        let mut queue = UpdateQueue::new();
        let a = InstanceId(1);
        queue.enqueue(a, merge());
        queue.take(a);
        assert!(queue.take_dirty().is_empty());
        assert!(queue.is_idle());
    }

    #[test]
    fn test_discard_drops_changes_and_callbacks() {
        let mut queue = UpdateQueue::new();
        let a = InstanceId(7);
        queue.enqueue(a, merge());
        queue.push_callback(a, Box::new(|| {}));
        queue.push_callback(InstanceId(8), Box::new(|| {}));

        assert_eq!(queue.discard(a), 1);
        assert!(queue.take_dirty().is_empty());
        queue.take(InstanceId(8));
        assert_eq!(queue.take_ready().len(), 1);
    }

    #[test]
    fn test_liveness() {
        let mut queue = UpdateQueue::new();
        let a = InstanceId(3);
        queue.mark_live(a);
        queue.enqueue(a, merge());
        assert!(queue.is_live(a));

        assert_eq!(queue.mark_dead(a), 1);
        assert!(!queue.is_live(a));
        assert!(queue.is_idle());
    }

    #[test]
    fn test_nested_batches() {
        let mut queue = UpdateQueue::new();
        queue.begin_batch();
        queue.begin_batch();
        assert!(!queue.end_batch());
        assert!(queue.in_batch());
        assert!(queue.end_batch());
        assert!(!queue.in_batch());
    }
}
