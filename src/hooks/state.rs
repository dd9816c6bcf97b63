//! State cell hook.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{RenderContext, Updater};
use crate::error::Result;

type Pending<T> = Box<dyn FnOnce(&T) -> T>;

struct StateCell<T> {
    value: T,
    queue: Vec<Pending<T>>,
}

/// Setter returned by [`RenderContext::use_state`].
///
/// Updates are queued on the cell and applied, in enqueue order, the next
/// time the owning component reads the state.
pub struct StateSetter<T> {
    cell: Rc<RefCell<StateCell<T>>>,
    updater: Updater,
}

impl<T: 'static> StateSetter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Derive the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.cell.borrow_mut().queue.push(Box::new(f));
        self.updater.schedule();
    }

    /// Number of updates waiting for the next render.
    pub fn pending(&self) -> usize {
        self.cell.borrow().queue.len()
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            updater: self.updater.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("fiber", &self.updater.fiber())
            .field("pending", &self.cell.borrow().queue.len())
            .finish()
    }
}

impl RenderContext {
    /// Persistent value plus a setter that schedules a re-render.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, StateSetter<T>)> {
        let slot = self.use_hook("use_state", || {
            RefCell::new(StateCell {
                value: init(),
                queue: Vec::new(),
            })
        })?;

        // Updaters may call the setter; no borrow is held while they run.
        let (mut value, queue) = {
            let mut cell = slot.state.borrow_mut();
            let queue = std::mem::take(&mut cell.queue);
            (cell.value.clone(), queue)
        };
        for pending in queue {
            value = pending(&value);
        }
        slot.state.borrow_mut().value = value.clone();

        let setter = StateSetter {
            cell: slot.state,
            updater: self.updater()?,
        };
        Ok((value, setter))
    }
}
