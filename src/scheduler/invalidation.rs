//! Update invalidation - merging a re-render request into in-flight work.

use super::Scheduler;
use crate::engine::FiberId;
use crate::error::{ReconcileError, Result};
use crate::renderer::OutputTarget;
use crate::types::EffectTag;

/// Which merge rule a request hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Scheduler was idle; the target starts a new pass.
    Started,
    /// Target is the unit about to be processed.
    AlreadyCurrent,
    /// Target is the active tree's root; the tree restarts from it.
    Restarted,
    /// A finished tree containing the target moved to the back of the queue.
    Requeued,
    /// In-flight work below the target was abandoned; the cursor jumped up.
    Jumped,
    /// The target will be reached by work already queued.
    Covered,
    /// Target was already rendered in this pass; re-queued after commit.
    Deferred,
    /// Target replaced `replaced` queued roots below it.
    Superseded { replaced: usize },
    /// Target queued as an independent tree.
    Appended,
    /// Target is being deleted in this pass.
    Ignored,
}

impl<O: OutputTarget> Scheduler<O> {
    /// Merge a re-render request for `id` into the scheduling state.
    pub fn queue_update(&mut self, id: FiberId) -> Result<UpdateDecision> {
        if !self.tree.is_alive(id) {
            log::warn!("update requested for unknown fiber {id:?}");
            return Err(ReconcileError::UnknownFiber(id));
        }
        let decision = self.merge_update(id);
        log::debug!(
            "queue_update {id:?} ({}): {decision:?}, trees={:?} cursor={}",
            self.tree[id].kind.name(),
            self.trees,
            self.cursor
        );
        Ok(decision)
    }

    fn merge_update(&mut self, id: FiberId) -> UpdateDecision {
        if self.tree[id].effect_tag == EffectTag::Deletion {
            return UpdateDecision::Ignored;
        }

        let Some(current) = self.next_unit else {
            self.tree.begin_work(id, self.pass);
            self.trees.clear();
            self.trees.push(id);
            self.cursor = 0;
            self.next_unit = Some(id);
            return UpdateDecision::Started;
        };

        if current == id {
            return UpdateDecision::AlreadyCurrent;
        }

        if let Some(index) = self.trees.iter().position(|root| *root == id) {
            return self.merge_queued_root(index, id);
        }

        if let Some(index) = self.trees.iter().position(|root| self.tree.contains(*root, id)) {
            return self.merge_descendant(index, id, current);
        }

        let covered: Vec<usize> = self
            .trees
            .iter()
            .enumerate()
            .filter(|(_, root)| self.tree.contains(id, **root))
            .map(|(index, _)| index)
            .collect();
        if !covered.is_empty() {
            return self.merge_ancestor(&covered, id);
        }

        self.tree.begin_work(id, self.pass);
        self.trees.push(id);
        UpdateDecision::Appended
    }

    /// Target is itself a queued root.
    fn merge_queued_root(&mut self, index: usize, id: FiberId) -> UpdateDecision {
        if index == self.cursor {
            self.next_unit = Some(id);
            UpdateDecision::Restarted
        } else if index < self.cursor {
            self.requeue(index);
            UpdateDecision::Requeued
        } else {
            UpdateDecision::Covered
        }
    }

    /// Target lies below the queued root at `index`.
    fn merge_descendant(&mut self, index: usize, id: FiberId, current: FiberId) -> UpdateDecision {
        if index < self.cursor {
            self.requeue(index);
            return UpdateDecision::Requeued;
        }
        if index > self.cursor {
            return UpdateDecision::Covered;
        }

        if self.tree.contains(id, current) {
            // Work below the target is stale.
            self.next_unit = Some(id);
            return UpdateDecision::Jumped;
        }
        if self.tree.contains(current, id) || self.tree[id].rendered != self.pass {
            return UpdateDecision::Covered;
        }
        if !self.deferred.contains(&id) {
            self.deferred.push(id);
        }
        UpdateDecision::Deferred
    }

    /// Target is an ancestor of every root listed in `covered` (ascending).
    fn merge_ancestor(&mut self, covered: &[usize], id: FiberId) -> UpdateDecision {
        self.tree.begin_work(id, self.pass);
        let active = covered.contains(&self.cursor);
        for index in covered.iter().rev() {
            self.trees.remove(*index);
            if *index < self.cursor {
                self.cursor -= 1;
            }
        }

        if active {
            self.trees.insert(self.cursor, id);
            self.next_unit = Some(id);
        } else {
            self.trees.push(id);
        }
        UpdateDecision::Superseded {
            replaced: covered.len(),
        }
    }

    /// Move the finished tree at `index` to the back of the queue.
    fn requeue(&mut self, index: usize) {
        let root = self.trees.remove(index);
        self.cursor -= 1;
        self.trees.push(root);
    }
}
