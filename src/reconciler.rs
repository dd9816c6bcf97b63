//! Reconciler - diff a node's new child descriptions against its children.
//!
//! Matching rules, per new description in order:
//! - keyed: the old child with the same key, if it has the same kind
//! - unkeyed: the old child at the same position, if it is unkeyed and of
//!   the same kind
//!
//! A match keeps its arena slot (and so its output handle and hook slots)
//! and is tagged `Update`; everything else becomes a fresh `Placement`.
//! Old children left unmatched are tagged `Deletion` and handed to the
//! scheduler's deletion list, never linked into the new chain.
//!
//! A matched child whose old position is before the last stably placed one
//! has been reordered and is flagged `MOVED`, so commit re-anchors its output.

use std::collections::HashMap;

use crate::element::Element;
use crate::engine::{Fiber, FiberId, FiberTree};
use crate::types::{EffectTag, FiberFlags, Key};

/// Reconcile `parent`'s children with `elements`, returning the new first child.
pub fn reconcile_children(
    tree: &mut FiberTree,
    parent: FiberId,
    elements: &[Element],
    pass: u64,
    deletions: &mut Vec<FiberId>,
) -> Option<FiberId> {
    let old = tree.children(parent);
    let mut keyed: HashMap<Key, usize> = HashMap::new();
    for (index, id) in old.iter().enumerate() {
        if let Some(key) = &tree[*id].key {
            keyed.insert(key.clone(), index);
        }
    }

    let mut used = vec![false; old.len()];
    let mut chain = Vec::with_capacity(elements.len());
    let mut last_placed = 0;

    for (position, element) in elements.iter().enumerate() {
        let candidate = match &element.key {
            Some(key) => keyed.get(key).copied(),
            None => (position < old.len() && tree[old[position]].key.is_none()).then_some(position),
        };
        let matched = candidate.filter(|index| {
            !used[*index] && tree[old[*index]].kind.same_kind(&element.kind)
        });

        let id = match matched {
            Some(index) => {
                used[index] = true;
                let id = old[index];
                tree.begin_work(id, pass);
                let fiber = &mut tree[id];
                fiber.props = element.props.clone();
                fiber.flags = FiberFlags::empty();
                if fiber.props.node_ref.is_some() {
                    fiber.flags |= FiberFlags::REF;
                }
                if fiber.effect_tag != EffectTag::Placement {
                    fiber.effect_tag = EffectTag::Update;
                    if index < last_placed {
                        fiber.flags |= FiberFlags::MOVED;
                    } else {
                        last_placed = index;
                    }
                }
                id
            }
            None => tree.insert(Fiber::placement(element.clone(), parent, pass)),
        };
        chain.push(id);
    }

    for (index, id) in old.into_iter().enumerate() {
        if used[index] {
            continue;
        }
        if tree[id].effect_tag == EffectTag::Placement {
            // Never committed: nothing to detach or clean up.
            tree.free_subtree(id);
        } else {
            tree[id].effect_tag = EffectTag::Deletion;
            deletions.push(id);
        }
    }

    tree.relink_children(parent, &chain);
    chain.first().copied()
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::OutputHandle;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_keys()(keys in prop::sample::subsequence((0u32..16).collect::<Vec<_>>(), 0..=16)
            .prop_shuffle()) -> Vec<u32> {
            keys
        }
    }

    fn elements(keys: &[u32]) -> Vec<Element> {
        keys.iter()
            .map(|key| Element::host("item").key(key.to_string()))
            .collect()
    }

    proptest! {
        /// Every surviving key keeps its fiber and output, every dropped key
        /// is deleted, every new key is placed.
        #[test]
        fn invariant_keyed_tags(old_keys in arb_keys(), new_keys in arb_keys()) {
            let mut tree = FiberTree::new();
            let root = tree.insert(Fiber::root(OutputHandle(0)));
            let mut deletions = Vec::new();
            reconcile_children(&mut tree, root, &elements(&old_keys), 1, &mut deletions);

            let mut by_key = HashMap::new();
            for (id, key) in tree.children(root).into_iter().zip(&old_keys) {
                tree.settle(id);
                tree[id].output = Some(OutputHandle(u64::from(*key) + 1));
                by_key.insert(*key, id);
            }

            reconcile_children(&mut tree, root, &elements(&new_keys), 2, &mut deletions);
            let chain = tree.children(root);
            prop_assert_eq!(chain.len(), new_keys.len());

            for (id, key) in chain.iter().zip(&new_keys) {
                match by_key.get(key) {
                    Some(old) => {
                        prop_assert_eq!(id, old);
                        prop_assert_eq!(tree[*id].effect_tag, EffectTag::Update);
                        prop_assert_eq!(tree[*id].output, Some(OutputHandle(u64::from(*key) + 1)));
                    }
                    None => prop_assert_eq!(tree[*id].effect_tag, EffectTag::Placement),
                }
            }
            for (key, id) in &by_key {
                if !new_keys.contains(key) {
                    prop_assert_eq!(tree[*id].effect_tag, EffectTag::Deletion);
                    prop_assert!(deletions.contains(id));
                    prop_assert!(!chain.contains(id));
                }
            }
        }

        /// Reconciling the same list twice places and deletes nothing.
        #[test]
        fn invariant_noop_reconcile(keys in arb_keys()) {
            let mut tree = FiberTree::new();
            let root = tree.insert(Fiber::root(OutputHandle(0)));
            let mut deletions = Vec::new();
            reconcile_children(&mut tree, root, &elements(&keys), 1, &mut deletions);
            for id in tree.children(root) {
                tree.settle(id);
            }

            reconcile_children(&mut tree, root, &elements(&keys), 2, &mut deletions);
            prop_assert!(deletions.is_empty());
            for id in tree.children(root) {
                prop_assert_eq!(tree[id].effect_tag, EffectTag::Update);
                prop_assert!(!tree[id].flags.contains(FiberFlags::MOVED));
            }
        }
    }
}
