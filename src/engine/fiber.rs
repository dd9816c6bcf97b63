//! Fiber - one position in the persistent rendered tree.
//!
//! A fiber keeps its [`FiberId`](super::FiberId) for as long as it stays
//! mounted: an update rewrites the same arena slot instead of allocating a
//! new node, so ids captured by state setters stay valid across renders.
//! The state a render reads from is the [`FiberVersion`] snapshot captured
//! when the node is first touched in a pass.

use std::rc::Rc;

use super::FiberId;
use crate::element::{Element, Instance, NodeKind, Props};
use crate::hooks::HookBinding;
use crate::types::{Attributes, EffectTag, FiberFlags, Key, OutputHandle};

/// Immutable snapshot of a committed fiber, read during the next render.
#[derive(Clone)]
pub struct FiberVersion {
    pub props: Rc<Props>,
    pub hooks: Vec<HookBinding>,
    pub instance: Option<Instance>,
    pub children: Vec<FiberId>,
}

impl std::fmt::Debug for FiberVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiberVersion")
            .field("props", &self.props)
            .field("hooks", &self.hooks)
            .field("instance", &self.instance.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// A node of the fiber tree.
pub struct Fiber {
    pub(crate) kind: NodeKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
    pub(crate) output: Option<OutputHandle>,
    /// Attributes last pushed to the output target.
    pub(crate) applied: Option<Attributes>,
    pub(crate) hooks: Vec<HookBinding>,
    pub(crate) instance: Option<Instance>,
    pub(crate) effect_tag: EffectTag,
    pub(crate) flags: FiberFlags,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) previous: Option<Rc<FiberVersion>>,
    /// Pass in which the node was created or snapshotted.
    pub(crate) pass: u64,
    /// Pass in which the node was last rendered.
    pub(crate) rendered: u64,
}

impl Fiber {
    /// Container fiber wrapping the output target's root handle.
    pub(crate) fn root(container: OutputHandle) -> Self {
        let mut fiber = Self::blank(NodeKind::Root, None, Rc::new(Props::default()));
        fiber.output = Some(container);
        fiber
    }

    /// Fresh fiber for a description with no reusable predecessor.
    pub(crate) fn placement(element: Element, parent: FiberId, pass: u64) -> Self {
        let mut fiber = Self::blank(element.kind, element.key, element.props);
        fiber.parent = Some(parent);
        fiber.pass = pass;
        fiber.effect_tag = EffectTag::Placement;
        if fiber.props.node_ref.is_some() {
            fiber.flags |= FiberFlags::REF;
        }
        fiber
    }

    fn blank(kind: NodeKind, key: Option<Key>, props: Rc<Props>) -> Self {
        Self {
            kind,
            key,
            props,
            output: None,
            applied: None,
            hooks: Vec::new(),
            instance: None,
            effect_tag: EffectTag::None,
            flags: FiberFlags::empty(),
            parent: None,
            child: None,
            sibling: None,
            previous: None,
            pass: 0,
            rendered: 0,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn output(&self) -> Option<OutputHandle> {
        self.output
    }

    pub fn hooks(&self) -> &[HookBinding] {
        &self.hooks
    }

    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    pub fn flags(&self) -> FiberFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Snapshot of the committed state this node is being re-rendered from.
    pub fn previous(&self) -> Option<&FiberVersion> {
        self.previous.as_deref()
    }
}

impl std::fmt::Debug for Fiber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("output", &self.output)
            .field("effect_tag", &self.effect_tag)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("child", &self.child)
            .field("sibling", &self.sibling)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}
