//! Synchronous notification bus
//!
//! Notifications are delivered on the mutating thread, before and after
//! every structural change. Nodes notify their own subscribers first and
//! bubble action notifications up to the model, which notifies its
//! observers. A panicking subscriber is caught at the dispatch boundary
//! and logged; it must not destabilize the model.
//!
//! Action notifications fire while the mutation (and, during undo/redo,
//! the engine replay) is in flight: handlers may read the tree but must
//! not mutate it, and should defer step-counter queries to `StepChange`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::action::Action;

/// One delivery on the notification bus.
#[derive(Debug)]
pub enum Notification<'a> {
    /// Fired before an action's mutation is applied.
    ActionAboutToTrigger(&'a Action),
    /// Fired after an action's mutation is applied.
    ActionTriggered(&'a Action),
    /// Fired after a commit, undo or redo moved the step counter.
    StepChange,
    /// Fired before the model clears all state.
    AboutToReset,
}

impl Notification<'_> {
    /// Action notifications bubble from the node up to the model.
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            Notification::ActionAboutToTrigger(_) | Notification::ActionTriggered(_)
        )
    }

    /// The action carried by an action notification.
    pub fn action(&self) -> Option<&Action> {
        match self {
            Notification::ActionAboutToTrigger(a) | Notification::ActionTriggered(a) => Some(a),
            _ => None,
        }
    }
}

/// Receiver interface for nodes and models.
pub trait Subscriber {
    fn notified(&self, notification: &Notification<'_>);
}

/// Deliver to a snapshot of subscribers, swallowing panics per receiver.
pub(crate) fn dispatch(subscribers: &[Rc<dyn Subscriber>], notification: &Notification<'_>) {
    for subscriber in subscribers {
        let result = catch_unwind(AssertUnwindSafe(|| subscriber.notified(notification)));
        if result.is_err() {
            log::warn!("notification subscriber panicked; continuing dispatch");
        }
    }
}
