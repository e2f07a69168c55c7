//! Model: transaction state machine and undo/redo driver

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::action::Action;
use crate::engine::{StepMessage, StorageEngine};
use crate::index::IdIndex;
use crate::node::{Node, NodeState};
use crate::notification::{self, Notification, Subscriber};

/// State of a model's transaction machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Idle,
    Transaction,
    Undo,
    Redo,
}

/// State shared between the model handle, its nodes and its engine.
pub(crate) struct ModelShared {
    pub(crate) state: Cell<ModelState>,
    /// Action lock: set while one node applies a mutation, so a
    /// notification handler cannot re-enter.
    pub(crate) locked: Cell<bool>,
    /// Set during `reset`, so dropped nodes skip individual id removal.
    pub(crate) clearing: Cell<bool>,
    pub(crate) root: RefCell<Option<Node>>,
    pub(crate) tx_actions: RefCell<Vec<Action>>,
    pub(crate) index: RefCell<IdIndex>,
    pub(crate) engine: RefCell<Box<dyn StorageEngine>>,
    pub(crate) observers: RefCell<Vec<Rc<dyn Subscriber>>>,
}

/// The document model: owns the root, drives transactions, and replays
/// committed actions for undo and redo.
///
/// A model and its node graph form one single-threaded mutual-exclusion
/// domain. Handles are cheap clones of the same model.
pub struct Model {
    shared: Rc<ModelShared>,
}

/// Non-owning model handle for engines and long-lived observers.
#[derive(Clone)]
pub struct WeakModel {
    shared: Weak<ModelShared>,
}

impl WeakModel {
    pub fn upgrade(&self) -> Option<Model> {
        self.shared.upgrade().map(Model::from_shared)
    }
}

impl Clone for Model {
    fn clone(&self) -> Self {
        Model {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Model {
    /// Create a model backed by `engine`. The engine's `setup` hook runs
    /// before the model is returned.
    pub fn new(engine: Box<dyn StorageEngine>) -> Model {
        let model = Model {
            shared: Rc::new(ModelShared {
                state: Cell::new(ModelState::Idle),
                locked: Cell::new(false),
                clearing: Cell::new(false),
                root: RefCell::new(None),
                tx_actions: RefCell::new(Vec::new()),
                index: RefCell::new(IdIndex::new()),
                engine: RefCell::new(engine),
                observers: RefCell::new(Vec::new()),
            }),
        };
        model.shared.engine.borrow_mut().setup(&model);
        model
    }

    pub(crate) fn from_shared(shared: Rc<ModelShared>) -> Model {
        Model { shared }
    }

    pub fn downgrade(&self) -> WeakModel {
        WeakModel {
            shared: Rc::downgrade(&self.shared),
        }
    }

    // ========== State queries ==========

    pub fn state(&self) -> ModelState {
        self.shared.state.get()
    }

    pub fn in_transaction(&self) -> bool {
        self.state() == ModelState::Transaction
    }

    pub fn is_step_changing(&self) -> bool {
        matches!(self.state(), ModelState::Undo | ModelState::Redo)
    }

    /// The model accepts structural change while a transaction is open
    /// and no node holds the action lock.
    pub fn is_writable(&self) -> bool {
        self.in_transaction() && !self.shared.locked.get()
    }

    pub fn root(&self) -> Option<Node> {
        self.shared.root.borrow().clone()
    }

    /// Look up a node by its stable id.
    pub fn node(&self, id: u64) -> Option<Node> {
        self.shared.index.borrow().get(id)
    }

    /// Number of live entries in the id index.
    pub fn indexed_len(&self) -> usize {
        self.shared.index.borrow().len()
    }

    // ========== Transactions ==========

    /// Enter the transaction state. The model must be idle.
    pub fn begin_transaction(&self) {
        assert_eq!(
            self.state(),
            ModelState::Idle,
            "begin_transaction while not idle"
        );
        self.shared.state.set(ModelState::Transaction);
        self.shared.engine.borrow_mut().prepare();
    }

    /// Roll the open transaction back: every buffered action is executed
    /// in reverse with `undo = true`, then discarded.
    pub fn abort_transaction(&self) {
        assert_eq!(
            self.state(),
            ModelState::Transaction,
            "abort_transaction without an open transaction"
        );
        let actions: Vec<Action> = self.shared.tx_actions.borrow_mut().drain(..).collect();
        for action in actions.iter().rev() {
            match action {
                // An uncommitted root change may reference nodes that were
                // never associated with the model; route it through the
                // shared state directly.
                Action::RootChange { old_root, .. } => {
                    set_root_in_tx(&self.shared, old_root.clone());
                }
                action => action.execute(true),
            }
        }
        drop(actions);
        self.shared.engine.borrow_mut().abort();
        self.shared.state.set(ModelState::Idle);
        log::trace!("transaction aborted");
    }

    /// Commit the open transaction. Newly inserted subtrees are
    /// associated with the model and receive their ids here; the action
    /// buffer then moves to the storage engine as one step. An empty
    /// buffer writes no step.
    pub fn commit_transaction(&self, message: StepMessage) {
        assert_eq!(
            self.state(),
            ModelState::Transaction,
            "commit_transaction without an open transaction"
        );
        if self.shared.tx_actions.borrow().is_empty() {
            self.shared.state.set(ModelState::Idle);
            return;
        }

        let actions: Vec<Action> = self.shared.tx_actions.borrow_mut().drain(..).collect();

        // Assign ids to every subtree the transaction brought in.
        let mut inserted = Vec::new();
        for action in &actions {
            action.query_nodes(true, &mut |node| inserted.push(node.clone()));
        }
        for node in &inserted {
            node.propagate(&mut |n| n.attach_to_model(&self.shared));
        }

        log::trace!("commit: {} actions", actions.len());
        self.shared.engine.borrow_mut().commit(actions, message);
        self.shared.state.set(ModelState::Idle);
        self.notify(&Notification::StepChange);
    }

    // ========== Undo / redo ==========

    pub fn undo(&self) {
        assert_eq!(self.state(), ModelState::Idle, "undo while not idle");
        self.shared.state.set(ModelState::Undo);
        self.shared.engine.borrow_mut().execute(true);
        self.shared.state.set(ModelState::Idle);
        self.notify(&Notification::StepChange);
    }

    pub fn redo(&self) {
        assert_eq!(self.state(), ModelState::Idle, "redo while not idle");
        self.shared.state.set(ModelState::Redo);
        self.shared.engine.borrow_mut().execute(false);
        self.shared.state.set(ModelState::Idle);
        self.notify(&Notification::StepChange);
    }

    pub fn can_undo(&self) -> bool {
        self.current_step() > self.minimum_step()
    }

    pub fn can_redo(&self) -> bool {
        self.current_step() < self.maximum_step()
    }

    pub fn minimum_step(&self) -> usize {
        self.shared.engine.borrow().minimum()
    }

    pub fn maximum_step(&self) -> usize {
        self.shared.engine.borrow().maximum()
    }

    pub fn current_step(&self) -> usize {
        self.shared.engine.borrow().current()
    }

    pub fn step_message(&self, step: usize) -> StepMessage {
        self.shared.engine.borrow().step_message(step)
    }

    // ========== Root and reset ==========

    /// Replace the root node. Allowed only while writable; the new root
    /// must be free. Recorded as a root-change action.
    pub fn set_root(&self, node: Option<Node>) {
        assert!(self.is_writable(), "set_root while not writable");
        if let Some(node) = &node {
            assert!(node.is_free(), "set_root with a non-free node");
        } else if self.root().is_none() {
            return;
        }
        let action = set_root_in_tx(&self.shared, node);
        self.shared.tx_actions.borrow_mut().push(action);
    }

    /// Clear the model: root, id index and the engine's step log.
    pub fn reset(&self) {
        assert_eq!(self.state(), ModelState::Idle, "reset while not idle");
        self.notify(&Notification::AboutToReset);

        self.shared.clearing.set(true);
        let old_root = self.shared.root.borrow_mut().take();
        drop(old_root);
        self.shared.engine.borrow_mut().reset();
        self.shared.index.borrow_mut().clear();
        self.shared.clearing.set(false);
        log::trace!("model reset");
    }

    // ========== Observers ==========

    pub fn subscribe(&self, observer: Rc<dyn Subscriber>) {
        self.shared.observers.borrow_mut().push(observer);
    }

    pub fn unsubscribe(&self, observer: &Rc<dyn Subscriber>) {
        self.shared
            .observers
            .borrow_mut()
            .retain(|o| !Rc::ptr_eq(o, observer));
    }

    fn notify(&self, notification: &Notification<'_>) {
        notify_observers(&self.shared, notification);
    }
}

/// Deliver a notification to the model's observers.
pub(crate) fn notify_observers(shared: &ModelShared, notification: &Notification<'_>) {
    let observers = shared.observers.borrow().clone();
    notification::dispatch(&observers, notification);
}

/// Append a recorded action to the owning model's transaction buffer.
///
/// Free trees have no model and therefore no buffer: the record is
/// dropped and the mutation stands on its own. User-defined node kinds
/// use this to land their custom actions in the log.
pub fn push_action(node: &Node, action: Action) {
    if let Some(shared) = node.model_shared() {
        assert_eq!(
            shared.state.get(),
            ModelState::Transaction,
            "structural change outside a transaction"
        );
        shared.tx_actions.borrow_mut().push(action);
    }
}

/// Swap the root under the action lock with pre/post notification,
/// toggling old/new root state. Shared by `set_root` and root-change
/// replay.
pub(crate) fn set_root_in_tx(shared: &Rc<ModelShared>, node: Option<Node>) -> Action {
    shared.locked.set(true);

    let old_root = shared.root.borrow().clone();
    let action = Action::RootChange {
        old_root: old_root.clone(),
        new_root: node.clone(),
    };

    notify_observers(shared, &Notification::ActionAboutToTrigger(&action));

    if let Some(old) = &old_root {
        old.set_state(NodeState::Detached);
    }
    if let Some(new) = &node {
        new.set_state(NodeState::Active);
    }
    *shared.root.borrow_mut() = node;

    notify_observers(shared, &Notification::ActionTriggered(&action));

    shared.locked.set(false);
    action
}
