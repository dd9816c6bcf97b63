//! Hook binding - per-node state matched across renders by call order.
//!
//! A component does not reach for an ambient "current node". The scheduler
//! builds a [`RenderContext`] for each render step and hands it to the
//! component; every stateful call goes through it:
//!
//! ```ignore
//! fn counter(ctx: &mut RenderContext, _props: &Props) -> Result<Vec<Element>> {
//!     let (count, set_count) = ctx.use_state(|| 0)?;
//!     ctx.use_effect(Some(&[count]), move || {
//!         log::info!("count is now {count}");
//!         None
//!     })?;
//!     Ok(vec![Element::text(count.to_string())])
//! }
//! ```
//!
//! Slot `i` of a render must carry the same hook name as slot `i` of the
//! previous render; anything else is a [`ReconcileError::HookOrder`].

mod effect;
mod reference;
mod state;

pub use effect::deps_require_change;
pub use state::StateSetter;

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::engine::FiberId;
use crate::error::{ReconcileError, Result};
use crate::types::{Cleanup, Effect};

// =============================================================================
// Hook Binding
// =============================================================================

/// One persisted call site.
#[derive(Clone)]
pub struct HookBinding {
    pub(crate) name: &'static str,
    pub(crate) payload: Rc<dyn Any>,
    pub(crate) cleanup: Rc<RefCell<Option<Cleanup>>>,
}

impl HookBinding {
    fn new(name: &'static str, payload: Rc<dyn Any>) -> Self {
        Self {
            name,
            payload,
            cleanup: Rc::new(RefCell::new(None)),
        }
    }

    /// Name the slot was installed under.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether an effect cleanup is waiting to run.
    pub fn has_cleanup(&self) -> bool {
        self.cleanup.borrow().is_some()
    }

    /// Run and clear the stored cleanup, if any.
    pub(crate) fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

impl fmt::Debug for HookBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookBinding")
            .field("name", &self.name)
            .field("cleanup", &self.has_cleanup())
            .finish_non_exhaustive()
    }
}

/// Typed view of a slot returned by [`RenderContext::use_hook`].
pub struct HookSlot<T> {
    pub state: Rc<T>,
    pub binding: HookBinding,
    /// True on the render that installed the slot.
    pub is_new: bool,
}

// =============================================================================
// Update Requests
// =============================================================================

/// Shared inbox of fibers that asked to be re-rendered.
///
/// Setters only record the request; the scheduler drains the inbox before
/// its next unit of work.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequests(Rc<RefCell<VecDeque<FiberId>>>);

impl UpdateRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, fiber: FiberId) {
        self.0.borrow_mut().push_back(fiber);
    }

    pub fn pop(&self) -> Option<FiberId> {
        self.0.borrow_mut().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

/// Handle that schedules a re-render of one fiber.
#[derive(Debug, Clone)]
pub struct Updater {
    fiber: FiberId,
    requests: UpdateRequests,
}

impl Updater {
    pub(crate) fn external(fiber: FiberId, requests: UpdateRequests) -> Self {
        Self { fiber, requests }
    }

    pub fn fiber(&self) -> FiberId {
        self.fiber
    }

    /// Request a re-render of the fiber this updater belongs to.
    pub fn schedule(&self) {
        self.requests.push(self.fiber);
    }
}

// =============================================================================
// Render Context
// =============================================================================

/// Explicit state threaded through one render step of one node.
pub struct RenderContext {
    fiber: Option<FiberId>,
    previous: Vec<HookBinding>,
    hooks: Vec<HookBinding>,
    index: usize,
    effects: Vec<Effect>,
    requests: UpdateRequests,
}

impl RenderContext {
    pub(crate) fn new(
        fiber: FiberId,
        previous: Vec<HookBinding>,
        requests: UpdateRequests,
    ) -> Self {
        Self {
            fiber: Some(fiber),
            previous,
            hooks: Vec::new(),
            index: 0,
            effects: Vec::new(),
            requests,
        }
    }

    /// Context with no node behind it.
    ///
    /// Calling a component with it outside the scheduler is allowed, but any
    /// stateful call fails with [`ReconcileError::MissingContext`].
    pub fn detached() -> Self {
        Self {
            fiber: None,
            previous: Vec::new(),
            hooks: Vec::new(),
            index: 0,
            effects: Vec::new(),
            requests: UpdateRequests::new(),
        }
    }

    /// Fiber being rendered, if any.
    pub fn fiber(&self) -> Option<FiberId> {
        self.fiber
    }

    /// Number of hook slots claimed so far in this render.
    pub fn hook_index(&self) -> usize {
        self.index
    }

    /// Claim the next slot, installing `init()` on first render.
    pub fn use_hook<T: 'static>(
        &mut self,
        name: &'static str,
        init: impl FnOnce() -> T,
    ) -> Result<HookSlot<T>> {
        if self.fiber.is_none() {
            return Err(ReconcileError::MissingContext { hook: name });
        }
        let index = self.index;
        self.index += 1;

        let slot = match self.previous.get(index) {
            Some(binding) => {
                if binding.name != name {
                    return Err(ReconcileError::HookOrder {
                        index,
                        expected: binding.name,
                        found: name,
                    });
                }
                let state = binding
                    .payload
                    .clone()
                    .downcast::<T>()
                    .map_err(|_| ReconcileError::HookType { index, name })?;
                HookSlot {
                    state,
                    binding: binding.clone(),
                    is_new: false,
                }
            }
            None => {
                let state = Rc::new(init());
                let binding = HookBinding::new(name, state.clone());
                HookSlot {
                    state,
                    binding,
                    is_new: true,
                }
            }
        };
        self.hooks.push(slot.binding.clone());
        Ok(slot)
    }

    /// Handle that re-renders the current node when scheduled.
    pub fn updater(&self) -> Result<Updater> {
        let fiber = self
            .fiber
            .ok_or(ReconcileError::MissingContext { hook: "updater" })?;
        Ok(Updater {
            fiber,
            requests: self.requests.clone(),
        })
    }

    /// Queue a side effect for the node's pending-effects batch.
    pub(crate) fn queue_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Hand the bindings and effects collected by this render to the caller.
    ///
    /// Slots the previous render had but this one never reached are dropped;
    /// their cleanups are queued ahead of this render's effects.
    pub(crate) fn finish(mut self) -> (Vec<HookBinding>, Vec<Effect>) {
        if !self.previous.is_empty() && self.hooks.len() != self.previous.len() {
            log::warn!(
                "fiber {:?} called {} hooks, previous render called {}",
                self.fiber,
                self.hooks.len(),
                self.previous.len()
            );
        }
        let dropped = self.previous.get(self.hooks.len()..).unwrap_or_default().to_vec();
        if !dropped.is_empty() {
            self.effects.insert(
                0,
                Box::new(move || {
                    for hook in &dropped {
                        hook.run_cleanup();
                    }
                }),
            );
        }
        (self.hooks, self.effects)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("fiber", &self.fiber)
            .field("index", &self.index)
            .field("previous", &self.previous.len())
            .field("effects", &self.effects.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn fiber_id() -> FiberId {
        let mut ids: SlotMap<FiberId, ()> = SlotMap::with_key();
        ids.insert(())
    }

    #[test]
    fn test_use_hook_installs_then_reads_back() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();

        let mut ctx = RenderContext::new(fiber, Vec::new(), requests.clone());
        let slot = ctx.use_hook("counter", || 5u32).unwrap();
        assert!(slot.is_new);
        let (hooks, _) = ctx.finish();

        let mut ctx = RenderContext::new(fiber, hooks.clone(), requests);
        let slot = ctx.use_hook("counter", || 0u32).unwrap();
        assert!(!slot.is_new);
        assert_eq!(*slot.state, 5);
        assert!(Rc::ptr_eq(&slot.binding.payload, &hooks[0].payload));
    }

    #[test]
    fn test_hook_names_stable_across_renders() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();
        let render = |previous: Vec<HookBinding>| {
            let mut ctx = RenderContext::new(fiber, previous, requests.clone());
            ctx.use_hook("a", || 1i32).unwrap();
            ctx.use_hook("b", || "x").unwrap();
            ctx.use_hook("c", || 2.0f64).unwrap();
            ctx.finish().0
        };

        let first = render(Vec::new());
        let second = render(first.clone());
        let names = |hooks: &[HookBinding]| hooks.iter().map(HookBinding::name).collect::<Vec<_>>();
        assert_eq!(names(&first), vec!["a", "b", "c"]);
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_hook_order_violation() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();

        let mut ctx = RenderContext::new(fiber, Vec::new(), requests.clone());
        ctx.use_hook("first", || 1i32).unwrap();
        ctx.use_hook("second", || 2i32).unwrap();
        let (hooks, _) = ctx.finish();

        let mut ctx = RenderContext::new(fiber, hooks, requests);
        let err = ctx.use_hook("second", || 2i32).err().unwrap();
        assert_eq!(
            err,
            ReconcileError::HookOrder {
                index: 0,
                expected: "first",
                found: "second",
            }
        );
    }

    #[test]
    fn test_dropped_slots_queue_their_cleanups() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();
        let ran = Rc::new(RefCell::new(Vec::new()));

        let mut ctx = RenderContext::new(fiber, Vec::new(), requests.clone());
        ctx.use_hook("kept", || 0i32).unwrap();
        let dropped = ctx.use_hook("dropped", || 0i32).unwrap();
        let log = ran.clone();
        let cleanup: Cleanup = Box::new(move || log.borrow_mut().push("dropped"));
        *dropped.binding.cleanup.borrow_mut() = Some(cleanup);
        let (hooks, effects) = ctx.finish();
        assert!(effects.is_empty());

        let mut ctx = RenderContext::new(fiber, hooks.clone(), requests);
        ctx.use_hook("kept", || 0i32).unwrap();
        let (kept, effects) = ctx.finish();
        assert_eq!(kept.len(), 1);
        assert_eq!(effects.len(), 1);
        assert!(ran.borrow().is_empty());

        for effect in effects {
            effect();
        }
        assert_eq!(*ran.borrow(), vec!["dropped"]);
        assert!(!hooks[1].has_cleanup());
    }

    #[test]
    fn test_hook_type_mismatch() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();

        let mut ctx = RenderContext::new(fiber, Vec::new(), requests.clone());
        ctx.use_hook("slot", || 1i32).unwrap();
        let (hooks, _) = ctx.finish();

        let mut ctx = RenderContext::new(fiber, hooks, requests);
        let err = ctx.use_hook("slot", || "text").err().unwrap();
        assert_eq!(err, ReconcileError::HookType { index: 0, name: "slot" });
    }

    #[test]
    fn test_detached_context() {
        let mut ctx = RenderContext::detached();
        assert_eq!(
            ctx.use_hook("use_state", || 0).err(),
            Some(ReconcileError::MissingContext { hook: "use_state" })
        );
        assert!(ctx.updater().is_err());
    }

    #[test]
    fn test_updater_pushes_request() {
        let fiber = fiber_id();
        let requests = UpdateRequests::new();
        let ctx = RenderContext::new(fiber, Vec::new(), requests.clone());

        let updater = ctx.updater().unwrap();
        updater.schedule();
        updater.clone().schedule();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests.pop(), Some(fiber));
    }
}
