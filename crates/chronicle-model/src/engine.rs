//! Storage engine interface
//!
//! The engine owns the committed action log and the step counters. The
//! in-memory implementation in [`crate::memory`] is the reference;
//! alternative backends (a filesystem log with checkpoints, a database)
//! conform to the same contract.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::model::Model;

/// Opaque per-step annotation attached at commit time.
pub type StepMessage = BTreeMap<String, String>;

/// Action log backend driven by a [`Model`].
///
/// Counter semantics: `minimum() <= current() <= maximum()`; steps in
/// `(minimum, current]` are undoable, steps in `(current, maximum]` are
/// redoable.
pub trait StorageEngine {
    /// Bind the engine to its model. Called once from `Model::new`.
    fn setup(&mut self, model: &Model) {
        let _ = model;
    }

    /// A transaction is about to open.
    fn prepare(&mut self) {}

    /// The open transaction was rolled back without committing.
    fn abort(&mut self) {}

    /// Take ownership of one committed step. Committing while redo
    /// history exists discards that history first.
    fn commit(&mut self, actions: Vec<Action>, message: StepMessage);

    /// Step once backward (`undo = true`) or forward, replaying the
    /// step's actions. Out-of-range requests are no-ops.
    fn execute(&mut self, undo: bool);

    /// Drop the whole log and reset counters.
    fn reset(&mut self);

    /// Lowest step still reachable via undo.
    fn minimum(&self) -> usize;

    /// Highest committed step.
    fn maximum(&self) -> usize;

    /// Current step position.
    fn current(&self) -> usize;

    /// Annotation of the given step; empty when out of range.
    fn step_message(&self, step: usize) -> StepMessage;
}
