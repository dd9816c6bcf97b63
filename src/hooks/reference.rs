//! Mutable reference hook.

use std::cell::RefCell;
use std::rc::Rc;

use super::RenderContext;
use crate::error::Result;

impl RenderContext {
    /// Cell that persists across renders. Writing to it does not re-render.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>> {
        let slot = self.use_hook("use_ref", || RefCell::new(init()))?;
        Ok(slot.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FiberId;
    use crate::hooks::UpdateRequests;
    use slotmap::SlotMap;

    #[test]
    fn test_ref_persists_without_requests() {
        let mut ids: SlotMap<FiberId, ()> = SlotMap::with_key();
        let fiber = ids.insert(());
        let requests = UpdateRequests::new();

        let mut ctx = RenderContext::new(fiber, Vec::new(), requests.clone());
        let cell = ctx.use_ref(Vec::<u8>::new).unwrap();
        cell.borrow_mut().push(1);
        let (hooks, _) = ctx.finish();

        let mut ctx = RenderContext::new(fiber, hooks, requests.clone());
        let cell = ctx.use_ref(Vec::<u8>::new).unwrap();
        assert_eq!(*cell.borrow(), vec![1]);
        assert!(requests.is_empty());
    }
}
