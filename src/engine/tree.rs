//! Fiber arena - stable ids, linked tree pointers, pass snapshots.
//!
//! All fibers live in one [`SlotMap`]. Tree links (`parent`, `child`,
//! `sibling`) are plain ids, never ownership, so the structure can be
//! rewired in place without reference cycles. Ids are generational: a
//! request naming a fiber that has since been freed is detected instead of
//! silently hitting a reused slot.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use super::fiber::{Fiber, FiberVersion};
use super::FiberId;
use crate::element::NodeKind;
use crate::types::{EffectTag, FiberFlags, OutputHandle};

// =============================================================================
// Fiber Tree
// =============================================================================

/// Arena owning every fiber of one application instance.
#[derive(Debug, Default)]
pub struct FiberTree {
    nodes: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.nodes.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.nodes.get_mut(id)
    }

    /// Whether `id` still names a live fiber.
    pub fn is_alive(&self, id: FiberId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Current child chain of `id`, first to last.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut children = Vec::new();
        let mut next = self.nodes.get(id).and_then(|fiber| fiber.child);
        while let Some(child) = next {
            children.push(child);
            next = self.nodes.get(child).and_then(|fiber| fiber.sibling);
        }
        children
    }

    /// Whether `node` is `ancestor` or lies somewhere below it.
    pub fn contains(&self, ancestor: FiberId, node: FiberId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|fiber| fiber.parent);
        }
        false
    }

    /// Depth-first, left-to-right, pre-order walk of the subtree at `root`.
    pub fn preorder(&self, root: FiberId) -> Vec<FiberId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.nodes.contains_key(id) {
                continue;
            }
            order.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        order
    }

    /// Subtree at `root` with every node listed after all of its descendants.
    pub fn child_first_order(&self, root: FiberId) -> Vec<FiberId> {
        let mut order = self.preorder(root);
        order.reverse();
        order
    }

    /// Output handle of the nearest ancestor that owns one.
    pub fn host_parent_output(&self, id: FiberId) -> Option<OutputHandle> {
        let mut current = self.nodes.get(id)?.parent;
        while let Some(parent) = current {
            let fiber = self.nodes.get(parent)?;
            if fiber.kind.is_host() || matches!(fiber.kind, NodeKind::Root) {
                if let Some(output) = fiber.output {
                    return Some(output);
                }
            }
            current = fiber.parent;
        }
        None
    }

    /// Topmost output handles inside the subtree at `id`, in document order.
    ///
    /// For a host node that is its own handle; for components and fragments
    /// it is the first host layer underneath.
    pub fn top_outputs(&self, id: FiberId) -> Vec<OutputHandle> {
        let mut outputs = Vec::new();
        self.collect_top_outputs(id, &mut outputs);
        outputs
    }

    fn collect_top_outputs(&self, id: FiberId, outputs: &mut Vec<OutputHandle>) {
        let Some(fiber) = self.nodes.get(id) else { return };
        if let Some(output) = fiber.output {
            outputs.push(output);
            return;
        }
        for child in self.children(id) {
            self.collect_top_outputs(child, outputs);
        }
    }

    /// First output that is already in place after `id` within its host parent.
    ///
    /// Siblings that are themselves being placed or moved are skipped: they
    /// get attached later in the same commit walk.
    pub fn insertion_anchor(&self, id: FiberId) -> Option<OutputHandle> {
        let mut current = id;
        loop {
            let mut next = self.nodes.get(current)?.sibling;
            while let Some(sibling) = next {
                let fiber = self.nodes.get(sibling)?;
                let settled = fiber.effect_tag != EffectTag::Placement
                    && !fiber.flags.contains(FiberFlags::MOVED);
                if settled {
                    if let Some(output) = self.top_outputs(sibling).first() {
                        return Some(*output);
                    }
                }
                next = fiber.sibling;
            }
            let parent = self.nodes.get(current)?.parent?;
            let parent_fiber = self.nodes.get(parent)?;
            if parent_fiber.kind.is_host() || matches!(parent_fiber.kind, NodeKind::Root) {
                return None;
            }
            current = parent;
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Rewrite the child chain of `parent` to exactly `children`, in order.
    pub(crate) fn relink_children(&mut self, parent: FiberId, children: &[FiberId]) {
        for (index, child) in children.iter().enumerate() {
            if let Some(fiber) = self.nodes.get_mut(*child) {
                fiber.parent = Some(parent);
                fiber.sibling = children.get(index + 1).copied();
            }
        }
        if let Some(fiber) = self.nodes.get_mut(parent) {
            fiber.child = children.first().copied();
        }
    }

    /// Capture the committed state of `id` the first time it is touched in `pass`.
    ///
    /// Later calls in the same pass leave the snapshot alone, so a restarted
    /// subtree still diffs against what is actually on screen.
    pub(crate) fn begin_work(&mut self, id: FiberId, pass: u64) {
        match self.nodes.get(id) {
            Some(fiber) if fiber.pass != pass => {}
            _ => return,
        }
        let children = self.children(id);
        let fiber = &mut self.nodes[id];
        fiber.previous = Some(Rc::new(FiberVersion {
            props: fiber.props.clone(),
            hooks: fiber.hooks.clone(),
            instance: fiber.instance.clone(),
            children,
        }));
        fiber.pass = pass;
    }

    /// Drop the subtree at `id` from the arena. The caller unlinks it.
    pub(crate) fn free_subtree(&mut self, id: FiberId) -> usize {
        let doomed = self.preorder(id);
        for node in &doomed {
            self.nodes.remove(*node);
        }
        doomed.len()
    }

    /// Undo everything `pass` did to the subtree at `id`.
    ///
    /// Snapshotted nodes get their props, hooks, instance and child chain
    /// back; nodes created during the pass are freed; tags are cleared.
    pub(crate) fn rollback(&mut self, id: FiberId, pass: u64) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(fiber) = self.nodes.get_mut(node) else { continue };
            fiber.effect_tag = EffectTag::None;
            fiber.flags = FiberFlags::empty();
            let previous = match fiber.previous.take() {
                Some(previous) if fiber.pass == pass => previous,
                _ => {
                    stack.extend(self.children(node));
                    continue;
                }
            };
            fiber.props = previous.props.clone();
            fiber.hooks = previous.hooks.clone();
            fiber.instance = previous.instance.clone();
            fiber.pass = 0;

            for child in self.children(node) {
                if !previous.children.contains(&child) {
                    self.free_subtree(child);
                }
            }
            self.relink_children(node, &previous.children);
            stack.extend(previous.children.iter().copied());
        }
    }

    /// Forget per-pass bookkeeping once the subtree at `id` is committed.
    pub(crate) fn settle(&mut self, id: FiberId) {
        if let Some(fiber) = self.nodes.get_mut(id) {
            fiber.effect_tag = EffectTag::None;
            fiber.flags = FiberFlags::empty();
            fiber.previous = None;
        }
    }
}

impl Index<FiberId> for FiberTree {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.nodes[id]
    }
}

impl IndexMut<FiberId> for FiberTree {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.nodes[id]
    }
}

// =============================================================================
// Tests
// =============================================================================
