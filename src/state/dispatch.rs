//! Event Dispatch - Route native events to bound listeners.
//!
//! A native event fired on a node becomes one [`SyntheticEvent`] that walks
//! from the target up through its ancestors to the container:
//!
//! - At each node with a listener for the type, the listener runs with
//!   `current_target` and `owner` set for that node
//! - Bubbling stops once a listener calls `stop_propagation`, or right after
//!   the target for types that do not bubble
//! - State updates queued by listeners are batched and flushed once, after
//!   the walk
//!
//! A listener error ends the walk. Updates queued before it still flush;
//! the error is then returned.

use crate::error::{Error, Result};
use crate::pipeline::Runtime;
use crate::types::NodeId;
use super::event::{EventPhase, NativeEvent, SyntheticEvent};

/// What happened during one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Listeners invoked.
    pub handled: usize,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    /// Flush passes run after the walk.
    pub passes: usize,
}

impl Runtime {
    /// Deliver `native` to `target` and bubble it.
    pub fn dispatch(&mut self, native: NativeEvent, target: NodeId) -> Result<DispatchOutcome> {
        if !self.native.contains(target) {
            return Err(Error::UnknownNode(target));
        }

        let event_type = native.event_type;
        let mut event = SyntheticEvent::from_native(native, target, self.now());
        let path = self.native.path_to_root(target);
        tracing::trace!(event = %event_type, %target, depth = path.len(), "dispatching");

        self.queue.borrow_mut().begin_batch();
        let mut handled = 0;
        let mut failure = None;

        for (position, node) in path.into_iter().enumerate() {
            if position > 0 && (!event.bubbles() || event.propagation_stopped()) {
                break;
            }
            let Some((listener, owner)) = self.native.listener(node, event_type) else {
                continue;
            };
            event.current_target = node;
            event.owner = owner;
            event.phase = if position == 0 {
                EventPhase::AtTarget
            } else {
                EventPhase::Bubbling
            };
            handled += 1;
            tracing::trace!(event = %event_type, %node, phase = ?event.phase, "listener");
            if let Err(source) = listener(&mut event) {
                tracing::debug!(event = %event_type, node = %node, "listener failed");
                failure = Some(Error::Handler { event: event_type, source });
                break;
            }
        }

        event.phase = EventPhase::None;
        event.current_target = target;
        let outcome = DispatchOutcome {
            handled,
            default_prevented: event.default_prevented(),
            propagation_stopped: event.propagation_stopped(),
            passes: 0,
        };
        self.last_event.set(Some(event));

        let outermost = self.queue.borrow_mut().end_batch();
        let flushed = if outermost { self.flush() } else { Ok(0) };

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(DispatchOutcome {
            passes: flushed?,
            ..outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::primitives::Element;
    use crate::state::EventType;

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn recorder(log: &Rc<RefCell<Vec<String>>>, name: &'static str) -> impl Fn(&mut SyntheticEvent) + 'static {
        let log = log.clone();
        move |event| log.borrow_mut().push(format!("{name}:{:?}", event.phase))
    }

    #[test]
    fn test_bubbles_target_first() {
        let seen = log();
        let mut runtime = Runtime::new();
        let container = runtime.create_container();
        let root = Element::tag("div")
            .on(EventType::Click, recorder(&seen, "div"))
            .child(Element::tag("span").on(EventType::Click, recorder(&seen, "span")).child("x"));
        runtime.render(root, container).unwrap();

        let span = runtime.native().find_by_tag(container.node(), "span")[0];
        let text = runtime.native().children(span)[0];
        let outcome = runtime.dispatch(NativeEvent::click(), text).unwrap();

        assert_eq!(outcome.handled, 2);
        assert_eq!(*seen.borrow(), vec!["span:Bubbling", "div:Bubbling"]);
        assert_eq!(runtime.last_event().unwrap().target, text);
    }

    #[test]
    fn test_stop_propagation_and_prevent_default() {
        let seen = log();
        let mut runtime = Runtime::new();
        let container = runtime.create_container();
        let outer = recorder(&seen, "outer");
        let root = Element::tag("form").on(EventType::Submit, outer).child(
            Element::tag("button").on(EventType::Submit, |event| {
                event.prevent_default();
                event.stop_propagation();
            }),
        );
        runtime.render(root, container).unwrap();

        let button = runtime.native().find_by_tag(container.node(), "button")[0];
        let outcome = runtime
            .dispatch(NativeEvent::new(EventType::Submit), button)
            .unwrap();

        assert!(seen.borrow().is_empty());
        assert!(outcome.default_prevented);
        assert!(outcome.propagation_stopped);
    }

    #[test]
    fn test_non_bubbling_type_stays_on_target() {
        let seen = log();
        let mut runtime = Runtime::new();
        let container = runtime.create_container();
        let root = Element::tag("div")
            .on(EventType::MouseEnter, recorder(&seen, "div"))
            .child(Element::tag("p").on(EventType::MouseEnter, recorder(&seen, "p")));
        runtime.render(root, container).unwrap();

        let p = runtime.native().find_by_tag(container.node(), "p")[0];
        runtime.dispatch(NativeEvent::new(EventType::MouseEnter), p).unwrap();
        assert_eq!(*seen.borrow(), vec!["p:AtTarget"]);
    }

    #[test]
    fn test_listener_error_is_returned() {
        let mut runtime = Runtime::new();
        let container = runtime.create_container();
        let root = Element::tag("button").try_on(EventType::Click, |_| Err("boom".into()));
        let handle = runtime.render(root, container).unwrap();

        let err = runtime.dispatch(NativeEvent::click(), handle.node).unwrap_err();
        assert!(matches!(err, Error::Handler { event: EventType::Click, .. }));
    }

    #[test]
    fn test_unknown_target() {
        let mut runtime = Runtime::new();
        assert!(matches!(
            runtime.dispatch(NativeEvent::click(), NodeId::new(42, 0)),
            Err(Error::UnknownNode(_))
        ));
    }
}
