//! Work loop - unit steps, time slicing, commit and abort.

use std::cell::RefCell;
use std::rc::Rc;

use super::deadline::{Deadline, FrameDeadline, IdleHost};
use super::{Phase, Scheduler};
use crate::commit::{commit_root, CommitStats, EffectBatch};
use crate::element::{Element, NodeKind};
use crate::engine::FiberId;
use crate::error::Result;
use crate::hooks::{HookBinding, RenderContext};
use crate::reconciler::reconcile_children;
use crate::renderer::OutputTarget;
use crate::types::{EffectTag, Effect};

/// Outcome of one [`Scheduler::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A unit was processed; this one is next.
    Continue(FiberId),
    /// The last unit was processed and the pass was committed.
    Committed(CommitStats),
    /// Nothing to do.
    Idle,
}

impl<O: OutputTarget> Scheduler<O> {
    // =========================================================================
    // Driving
    // =========================================================================

    /// Process exactly one unit of work, committing if it was the last one.
    ///
    /// A render error aborts the pass, rolls the tree back and is returned.
    pub fn step(&mut self) -> Result<Step> {
        self.drain_requests();
        let Some(unit) = self.next_unit else {
            return Ok(Step::Idle);
        };
        self.phase = Phase::Rendering;

        let next = match self.perform_unit_of_work(unit) {
            Ok(next) => next,
            Err(err) => {
                log::warn!("render of {unit:?} failed, aborting pass {}: {err}", self.pass);
                self.abort_pass();
                return Err(err);
            }
        };

        self.next_unit = match next {
            Some(next) => Some(next),
            None => {
                self.cursor += 1;
                self.trees.get(self.cursor).copied()
            }
        };

        match self.next_unit {
            Some(next) => Ok(Step::Continue(next)),
            None => Ok(Step::Committed(self.commit())),
        }
    }

    /// Run units until the slice runs low or there is nothing left.
    ///
    /// Returns whether work remains.
    pub fn tick(&mut self, deadline: &dyn Deadline) -> Result<bool> {
        loop {
            if self.step()? == Step::Idle {
                return Ok(false);
            }
            if deadline.time_remaining() < self.config.yield_threshold {
                return Ok(!self.is_idle());
            }
        }
    }

    /// Run slices of `frame_budget` until idle.
    pub fn run_until_idle(&mut self) -> Result<()> {
        while self.tick(&FrameDeadline::new(self.config.frame_budget))? {}
        Ok(())
    }

    /// Let `host` grant slices until idle.
    pub fn run(&mut self, host: &mut impl IdleHost) -> Result<()> {
        while !self.is_idle() {
            let deadline = host
                .wait_for_idle()
                .unwrap_or_else(|| Box::new(FrameDeadline::new(self.config.frame_budget)));
            if !self.tick(deadline.as_ref())? {
                break;
            }
        }
        Ok(())
    }

    fn drain_requests(&mut self) {
        while let Some(id) = self.requests.pop() {
            if self.queue_update(id).is_err() {
                log::warn!("dropping update request for {id:?}");
            }
        }
    }

    // =========================================================================
    // Unit of Work
    // =========================================================================

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>> {
        self.tree.begin_work(id, self.pass);
        let fiber = &self.tree[id];
        let kind = fiber.kind.clone();
        let props = fiber.props.clone();
        log::trace!("unit {id:?} ({})", kind.name());

        let elements: Vec<Element> = match &kind {
            NodeKind::Root | NodeKind::Host(_) | NodeKind::Text | NodeKind::Fragment => {
                props.children.clone()
            }
            NodeKind::Function(component) => {
                let mut ctx = RenderContext::new(id, self.hook_source(id), self.requests.clone());
                let elements = (component.render)(&mut ctx, &props)?;
                let (hooks, effects) = ctx.finish();
                self.tree[id].hooks = hooks;
                self.record_effects(id, effects);
                elements
            }
            NodeKind::Class(component) => {
                let fiber = &self.tree[id];
                let mounting = fiber.effect_tag == EffectTag::Placement;
                let committed = fiber.previous().and_then(|previous| previous.instance.clone());
                let instance = match committed {
                    Some(instance) => instance,
                    None => match &fiber.instance {
                        Some(instance) => instance.clone(),
                        None => Rc::new(RefCell::new((component.create)(&props))),
                    },
                };

                let mut ctx = RenderContext::new(id, self.hook_source(id), self.requests.clone());
                let elements = instance.borrow_mut().render(&mut ctx, &props)?;
                let (hooks, mut effects) = ctx.finish();

                let lifecycle = instance.clone();
                let hook: Effect = if mounting {
                    Box::new(move || lifecycle.borrow_mut().did_mount())
                } else {
                    Box::new(move || lifecycle.borrow_mut().did_update())
                };
                effects.push(hook);
                let fiber = &mut self.tree[id];
                fiber.hooks = hooks;
                fiber.instance = Some(instance);
                self.record_effects(id, effects);
                elements
            }
        };

        self.tree[id].rendered = self.pass;
        reconcile_children(&mut self.tree, id, &elements, self.pass, &mut self.deletions);
        Ok(self.next_after(id))
    }

    /// Bindings a render of `id` reads its hook slots from.
    fn hook_source(&self, id: FiberId) -> Vec<HookBinding> {
        let fiber = &self.tree[id];
        match fiber.previous() {
            Some(previous) => previous.hooks.clone(),
            None => fiber.hooks.clone(),
        }
    }

    /// Replace whatever an earlier render of `id` in this pass queued.
    fn record_effects(&mut self, id: FiberId, effects: Vec<Effect>) {
        self.pending_effects.retain(|batch| batch.fiber != id);
        if !effects.is_empty() {
            self.pending_effects.push(EffectBatch { fiber: id, effects });
        }
    }

    /// Depth-first successor of `id`, bounded by the active tree's root.
    fn next_after(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self.tree[id].child {
            return Some(child);
        }
        let tree_root = self.trees.get(self.cursor).copied();
        let mut current = id;
        loop {
            if Some(current) == tree_root {
                return None;
            }
            let fiber = &self.tree[current];
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            current = fiber.parent?;
        }
    }

    // =========================================================================
    // Commit / Abort
    // =========================================================================

    fn commit(&mut self) -> CommitStats {
        self.phase = Phase::Committing;
        let roots = std::mem::take(&mut self.trees);
        let deletions = std::mem::take(&mut self.deletions);
        let batches = std::mem::take(&mut self.pending_effects);
        self.cursor = 0;
        self.next_unit = None;

        let stats = commit_root(&mut self.tree, &mut self.output, &roots, deletions, batches);
        log::debug!("committed pass {}: {stats:?}", self.pass);

        self.pass += 1;
        self.phase = Phase::Idle;
        self.notifier.notify(&stats);

        for id in std::mem::take(&mut self.deferred) {
            if self.queue_update(id).is_err() {
                log::warn!("deferred update for {id:?} no longer applies");
            }
        }
        stats
    }

    /// Throw away the in-flight pass and restore the committed tree.
    fn abort_pass(&mut self) {
        for root in std::mem::take(&mut self.trees) {
            self.tree.rollback(root, self.pass);
        }
        for id in std::mem::take(&mut self.deletions) {
            if let Some(fiber) = self.tree.get_mut(id) {
                fiber.effect_tag = EffectTag::None;
            }
        }
        self.pending_effects.clear();
        self.deferred.clear();
        self.next_unit = None;
        self.cursor = 0;
        self.pass += 1;
        self.phase = Phase::Idle;
    }
}
