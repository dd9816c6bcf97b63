//! Deferred effect hook.

use std::cell::RefCell;
use std::rc::Rc;

use super::RenderContext;
use crate::error::Result;
use crate::types::Cleanup;

/// Whether an effect must re-run given its previous and next dependencies.
///
/// Missing lists always require a run; otherwise any change in length or in
/// any element does.
pub fn deps_require_change<D: PartialEq>(previous: Option<&[D]>, next: Option<&[D]>) -> bool {
    match (previous, next) {
        (Some(previous), Some(next)) => previous != next,
        _ => true,
    }
}

struct EffectState<D> {
    deps: RefCell<Option<Vec<D>>>,
}

impl RenderContext {
    /// Run `body` after commit when `deps` changed since the last committed run.
    ///
    /// The previous cleanup fires right before the new body. `None` deps run
    /// the effect after every commit of this node.
    pub fn use_effect<D, F>(&mut self, deps: Option<&[D]>, body: F) -> Result<()>
    where
        D: PartialEq + Clone + 'static,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let slot = self.use_hook("use_effect", || EffectState::<D> {
            deps: RefCell::new(None),
        })?;

        let changed = deps_require_change(slot.state.deps.borrow().as_deref(), deps);
        if !changed {
            return Ok(());
        }

        let state = slot.state.clone();
        let next = deps.map(<[D]>::to_vec);
        let cleanup = Rc::clone(&slot.binding.cleanup);
        self.queue_effect(Box::new(move || {
            *state.deps.borrow_mut() = next;
            let previous = cleanup.borrow_mut().take();
            if let Some(previous) = previous {
                previous();
            }
            let installed = body();
            *cleanup.borrow_mut() = installed;
        }));
        Ok(())
    }
}
