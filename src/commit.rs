//! Commit applier - apply a finished render pass to the output target.
//!
//! Runs synchronously and is never interrupted:
//!
//! 1. Deletions, in the order they were recorded: detach the top outputs of
//!    the deleted subtree, then clear references, run hook cleanups and
//!    `will_unmount`, child before parent, and free the subtree.
//! 2. Each finished tree, pre-order: create and attach placements, patch
//!    updated host nodes, re-anchor moved nodes, bind references.
//! 3. Pending effect batches, newest first, which puts every child's
//!    effects before its parent's.

use crate::element::NodeKind;
use crate::engine::{FiberId, FiberTree};
use crate::renderer::OutputTarget;
use crate::types::{EffectTag, Effect, FiberFlags};

/// Effects queued by one fiber's render.
pub(crate) struct EffectBatch {
    pub fiber: FiberId,
    pub effects: Vec<Effect>,
}

/// What a commit did, handed to commit listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Subtrees removed.
    pub deletions: usize,
    /// Output nodes created and attached.
    pub placements: usize,
    /// Output nodes whose attributes were patched.
    pub updates: usize,
    /// Nodes re-anchored after a keyed reorder.
    pub moves: usize,
    /// Effects fired.
    pub effects: usize,
}

impl CommitStats {
    /// Whether the commit touched the output at all.
    pub fn mutated_output(&self) -> bool {
        self.deletions + self.placements + self.updates + self.moves > 0
    }
}

pub(crate) fn commit_root<O: OutputTarget + ?Sized>(
    tree: &mut FiberTree,
    output: &mut O,
    roots: &[FiberId],
    deletions: Vec<FiberId>,
    batches: Vec<EffectBatch>,
) -> CommitStats {
    let mut stats = CommitStats::default();

    for id in deletions {
        if tree.is_alive(id) {
            commit_deletion(tree, output, id);
            stats.deletions += 1;
        }
    }

    for root in roots {
        if !tree.is_alive(*root) {
            continue;
        }
        for id in tree.preorder(*root) {
            commit_work(tree, output, id, &mut stats);
        }
    }

    for batch in batches.into_iter().rev() {
        if !tree.is_alive(batch.fiber) {
            log::trace!("dropping effects of unmounted fiber {:?}", batch.fiber);
            continue;
        }
        for effect in batch.effects {
            effect();
            stats.effects += 1;
        }
    }

    stats
}

fn commit_work<O: OutputTarget + ?Sized>(
    tree: &mut FiberTree,
    output: &mut O,
    id: FiberId,
    stats: &mut CommitStats,
) {
    let fiber = &tree[id];
    let tag = fiber.effect_tag;
    let moved = fiber.flags.contains(FiberFlags::MOVED);

    match tag {
        EffectTag::Placement => {
            if let Some(output_tag) = fiber.kind.output_tag() {
                let attributes = fiber.props.attributes.clone();
                let handle = output.create_output(output_tag, &attributes);
                let fiber = &mut tree[id];
                fiber.output = Some(handle);
                fiber.applied = Some(attributes);
                if let Some(parent) = tree.host_parent_output(id) {
                    let anchor = tree.insertion_anchor(id);
                    output.attach_output(parent, handle, anchor);
                }
                stats.placements += 1;
            }
        }
        EffectTag::Update => {
            if let (true, Some(handle)) = (fiber.kind.is_host(), fiber.output) {
                let next = &fiber.props.attributes;
                let changed = fiber.applied.as_ref() != Some(next);
                if changed {
                    let next = next.clone();
                    let previous = fiber.applied.clone().unwrap_or_default();
                    output.patch_output(handle, &previous, &next);
                    tree[id].applied = Some(next);
                    stats.updates += 1;
                }
            }
            if moved {
                if let Some(parent) = tree.host_parent_output(id) {
                    let anchor = tree.insertion_anchor(id);
                    for handle in tree.top_outputs(id) {
                        output.attach_output(parent, handle, anchor);
                    }
                    stats.moves += 1;
                }
            }
        }
        EffectTag::None | EffectTag::Deletion => {}
    }

    let fiber = &tree[id];
    if fiber.flags.contains(FiberFlags::REF) {
        if let (Some(node_ref), Some(handle)) = (&fiber.props.node_ref, fiber.output) {
            node_ref.bind(handle);
        }
    }
    tree.settle(id);
}

fn commit_deletion<O: OutputTarget + ?Sized>(tree: &mut FiberTree, output: &mut O, id: FiberId) {
    if let Some(parent) = tree.host_parent_output(id) {
        for handle in tree.top_outputs(id) {
            output.detach_output(parent, handle);
        }
    }

    for node in tree.child_first_order(id) {
        let fiber = &tree[node];
        if let Some(node_ref) = &fiber.props.node_ref {
            node_ref.clear();
        }
        for hook in &fiber.hooks {
            hook.run_cleanup();
        }
        if let (NodeKind::Class(_), Some(instance)) = (&fiber.kind, &fiber.instance) {
            instance.borrow_mut().will_unmount();
        }
    }

    let freed = tree.free_subtree(id);
    log::trace!("freed {freed} fibers under {id:?}");
}
