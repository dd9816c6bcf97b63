//! Commit notifications.
//!
//! Observers learn about finished commits two ways: plain listeners
//! registered with [`CommitNotifier::subscribe`], and a reactive commit
//! counter that spark-signals effects can track.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::commit::CommitStats;
use crate::types::Cleanup;

type Listener = Rc<dyn Fn(&CommitStats)>;

/// Fan-out for "an update was committed".
pub struct CommitNotifier {
    commits: Signal<u64>,
    listeners: Rc<RefCell<Vec<(u64, Listener)>>>,
    next_id: Cell<u64>,
}

impl CommitNotifier {
    pub fn new() -> Self {
        Self {
            commits: signal(0),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Reactive counter bumped once per commit.
    pub fn signal(&self) -> Signal<u64> {
        self.commits.clone()
    }

    /// Register a listener. Calling the returned cleanup unregisters it.
    pub fn subscribe(&self, listener: impl Fn(&CommitStats) + 'static) -> Cleanup {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));

        let listeners = Rc::downgrade(&self.listeners);
        Box::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn notify(&self, stats: &CommitStats) {
        self.commits.set(self.commits.get() + 1);
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(stats);
        }
    }
}

impl Default for CommitNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommitNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitNotifier")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}
