//! Flush - Apply queued updates in passes.
//!
//! A pass takes the dirty instances, shallowest first, and runs the update
//! protocol on each one that still has changes (an ancestor's re-render may
//! already have consumed them). Once the pass commits:
//!
//! 1. `did_mount` / `did_update` hooks run, children before parents
//! 2. the commit counter is bumped
//! 3. callbacks registered with the updates applied in the pass run
//!
//! Hooks that queue more updates cause another pass, up to
//! [`RuntimeConfig::max_flush_passes`](crate::RuntimeConfig).

use crate::error::{Error, Result};
use crate::types::{ContainerId, InstanceId};
use super::runtime::{Deferred, Runtime};

impl Runtime {
    /// Apply every queued update. Returns the number of passes run.
    ///
    /// Called automatically at the end of dispatch, render and
    /// [`Runtime::batched_updates`]; call it directly after updating through
    /// handles outside of those.
    pub fn flush(&mut self) -> Result<usize> {
        let mut passes = 0;

        loop {
            let dirty = self.queue.borrow_mut().take_dirty();
            if dirty.is_empty() {
                break;
            }
            if passes == self.config.max_flush_passes {
                tracing::warn!(passes, "updates keep scheduling updates, giving up");
                return Err(Error::UpdateLoop { passes });
            }
            passes += 1;

            if let Err(err) = self.run_pass(dirty) {
                self.abandon_pass();
                return Err(err);
            }
            self.commit_pass()?;
        }

        if passes > 0 {
            tracing::debug!(passes, "flush settled");
        }
        Ok(passes)
    }

    fn run_pass(&mut self, dirty: Vec<InstanceId>) -> Result<()> {
        let mut order: Vec<(usize, InstanceId, ContainerId)> = dirty
            .into_iter()
            .filter_map(|id| {
                let instance = self.instances.get(id).ok()?;
                Some((instance.depth, id, instance.container))
            })
            .collect();
        order.sort_by_key(|(depth, id, _)| (*depth, *id));
        tracing::trace!(dirty = order.len(), "update pass");

        for (_, id, container) in order {
            // Consumed by an ancestor's re-render, or unmounted by one
            if !self.queue.borrow().has_pending(id) || !self.instances.contains(id) {
                continue;
            }
            let Some(mut tree) = self.roots.get_mut(&container).and_then(Option::take) else {
                continue;
            };
            let result = match tree.find_rendered_mut(id) {
                Some(rendered) => self.update_component(id, rendered, None),
                None => Ok(()),
            };
            self.roots.insert(container, Some(tree));
            result?;
        }
        Ok(())
    }

    /// Finish a pass: post-commit hooks, commit counter, callbacks.
    pub(crate) fn commit_pass(&mut self) -> Result<()> {
        let callbacks = self.queue.borrow_mut().take_ready();
        for deferred in std::mem::take(&mut self.deferred) {
            self.run_deferred(deferred)?;
        }
        self.bump_commits();
        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    /// Drop post-commit work of a pass that failed.
    pub(crate) fn abandon_pass(&mut self) {
        let hooks = self.deferred.len();
        self.deferred.clear();
        let callbacks = self.queue.borrow_mut().clear_ready();
        if hooks + callbacks > 0 {
            tracing::debug!(hooks, callbacks, "pass failed, dropping post-commit work");
        }
    }

    fn run_deferred(&mut self, deferred: Deferred) -> Result<()> {
        match deferred {
            Deferred::DidMount(id) if self.instances.contains(id) => {
                self.with_scope(id, |def, scope| def.did_mount(scope))
            }
            Deferred::DidUpdate {
                id,
                prev_props,
                prev_state,
            } if self.instances.contains(id) => self.with_scope(id, |def, scope| {
                def.did_update(scope, prev_props.as_ref(), prev_state.as_ref())
            }),
            // Unmounted later in the same pass
            _ => Ok(()),
        }
    }
}
