//! In-memory storage engine

use crate::action::Action;
use crate::engine::{StepMessage, StorageEngine};
use crate::model::{Model, WeakModel};

const DEFAULT_MAX_STEPS: usize = 100;
const MIN_MAX_STEPS: usize = 4;

struct Step {
    actions: Vec<Action>,
    message: StepMessage,
}

/// Reference engine: keeps every committed step in a vector.
///
/// Retention: once more than `2 * max_steps` steps sit in the past, the
/// oldest `max_steps` are dropped in one batch and the step floor
/// advances, so at least `max_steps` steps always stay undoable.
pub struct MemoryEngine {
    max_steps: usize,
    min_step: usize,
    /// Index into `stack`; steps `[0, current)` are in the past.
    current: usize,
    stack: Vec<Step>,
    model: Option<WeakModel>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            min_step: 0,
            current: 0,
            stack: Vec::new(),
            model: None,
        }
    }

    pub fn with_max_steps(steps: usize) -> Self {
        let mut engine = Self::new();
        engine.set_max_steps(steps);
        engine
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Configure the retention window. Rejected (and logged) once the
    /// engine is bound to a model, or when `steps` is below the minimum
    /// of four.
    pub fn set_max_steps(&mut self, steps: usize) {
        if self.model.is_some() {
            log::warn!("max_steps change ignored: engine already attached to a model");
            return;
        }
        if steps < MIN_MAX_STEPS {
            log::warn!("max_steps {} ignored: minimum is {}", steps, MIN_MAX_STEPS);
            return;
        }
        self.max_steps = steps;
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemoryEngine {
    fn setup(&mut self, model: &Model) {
        self.model = Some(model.downgrade());
    }

    fn commit(&mut self, actions: Vec<Action>, message: StepMessage) {
        // Committing after undo discards the redo tail.
        if self.current < self.stack.len() {
            self.stack.truncate(self.current);
        }

        self.stack.push(Step { actions, message });
        self.current += 1;

        // Trim the oldest steps in one batch once the stack doubles the
        // retention window.
        if self.current > 2 * self.max_steps {
            self.stack.drain(..self.max_steps);
            self.min_step += self.max_steps;
            self.current -= self.max_steps;
        }
    }

    fn execute(&mut self, undo: bool) {
        if undo {
            if self.current == 0 {
                return;
            }
            let step = &self.stack[self.current - 1];
            for action in step.actions.iter().rev() {
                action.execute(true);
            }
            self.current -= 1;
        } else {
            if self.current == self.stack.len() {
                return;
            }
            let step = &self.stack[self.current];
            for action in step.actions.iter() {
                action.execute(false);
            }
            self.current += 1;
        }
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.min_step = 0;
        self.current = 0;
    }

    fn minimum(&self) -> usize {
        self.min_step
    }

    fn maximum(&self) -> usize {
        self.min_step + self.stack.len()
    }

    fn current(&self) -> usize {
        self.min_step + self.current
    }

    fn step_message(&self, step: usize) -> StepMessage {
        let index = match (step).checked_sub(self.min_step + 1) {
            Some(index) if index < self.stack.len() => index,
            _ => return StepMessage::new(),
        };
        self.stack[index].message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> StepMessage {
        let mut m = StepMessage::new();
        m.insert("name".to_string(), text.to_string());
        m
    }

    #[test]
    fn test_counters_track_commits() {
        let mut engine = MemoryEngine::new();
        assert_eq!((engine.minimum(), engine.current(), engine.maximum()), (0, 0, 0));

        engine.commit(Vec::new(), message("one"));
        engine.commit(Vec::new(), message("two"));
        assert_eq!((engine.minimum(), engine.current(), engine.maximum()), (0, 2, 2));
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut engine = MemoryEngine::new();
        for i in 0..5 {
            engine.commit(Vec::new(), message(&i.to_string()));
        }
        engine.execute(true);
        engine.execute(true);
        assert_eq!(engine.current(), 3);

        engine.commit(Vec::new(), message("new"));
        assert_eq!(engine.maximum(), 4);
        assert_eq!(engine.step_message(4), message("new"));
    }

    #[test]
    fn test_retention_trims_oldest_steps() {
        let mut engine = MemoryEngine::with_max_steps(4);
        for i in 0..9 {
            engine.commit(Vec::new(), message(&i.to_string()));
        }
        // The 9th commit crossed 2 * max_steps: 4 steps trimmed.
        assert_eq!(engine.minimum(), 4);
        assert_eq!(engine.current(), 9);
        assert_eq!(engine.maximum(), 9);
        assert_eq!(engine.step_message(4), StepMessage::new());
        assert_eq!(engine.step_message(5), message("4"));
    }

    #[test]
    fn test_max_steps_minimum_enforced() {
        let mut engine = MemoryEngine::new();
        engine.set_max_steps(3);
        assert_eq!(engine.max_steps(), DEFAULT_MAX_STEPS);
        engine.set_max_steps(10);
        assert_eq!(engine.max_steps(), 10);
    }

    #[test]
    fn test_execute_out_of_range_is_a_no_op() {
        let mut engine = MemoryEngine::new();
        engine.execute(true);
        engine.execute(false);
        assert_eq!(engine.current(), 0);

        engine.commit(Vec::new(), StepMessage::new());
        engine.execute(false);
        assert_eq!(engine.current(), 1);
    }

    #[test]
    fn test_step_message_out_of_range_is_empty() {
        let mut engine = MemoryEngine::new();
        engine.commit(Vec::new(), message("only"));
        assert_eq!(engine.step_message(1), message("only"));
        assert_eq!(engine.step_message(0), StepMessage::new());
        assert_eq!(engine.step_message(2), StepMessage::new());
    }
}
