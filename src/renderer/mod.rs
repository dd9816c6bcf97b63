//! Output target boundary.
//!
//! The scheduler never renders anything itself. At commit it drives an
//! [`OutputTarget`] through four primitives:
//!
//! ```text
//! create_output(tag, attributes)        → OutputHandle
//! patch_output(handle, previous, next)  → apply attribute changes
//! attach_output(parent, child, before)  → insert (or move) child
//! detach_output(parent, child)          → remove child
//! ```
//!
//! [`MemoryRenderer`] is the in-memory reference implementation used by the
//! tests and demos.

mod memory;

pub use memory::{MemoryNode, MemoryRenderer, OutputOp};

use crate::types::{AttrValue, Attributes, OutputHandle};

/// Whatever turns committed fibers into real output.
pub trait OutputTarget {
    /// Create a detached node.
    fn create_output(&mut self, tag: &str, attributes: &Attributes) -> OutputHandle;

    /// Bring `handle` from `previous` to `next` attributes.
    fn patch_output(&mut self, handle: OutputHandle, previous: &Attributes, next: &Attributes);

    /// Insert `child` under `parent`, before `before` or at the end.
    ///
    /// A child that is already attached is moved.
    fn attach_output(
        &mut self,
        parent: OutputHandle,
        child: OutputHandle,
        before: Option<OutputHandle>,
    );

    /// Remove `child` from `parent`.
    fn detach_output(&mut self, parent: OutputHandle, child: OutputHandle);
}

// =============================================================================
// Attribute Diff
// =============================================================================

/// One attribute-level change between two attribute maps.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeChange<'a> {
    Set(&'a str, &'a AttrValue),
    Remove(&'a str),
}

/// Changes turning `previous` into `next`: removals first, then sets.
pub fn diff_attributes<'a>(
    previous: &'a Attributes,
    next: &'a Attributes,
) -> Vec<AttributeChange<'a>> {
    let mut changes: Vec<_> = previous
        .keys()
        .filter(|name| !next.contains_key(*name))
        .map(|name| AttributeChange::Remove(name))
        .collect();

    for (name, value) in next {
        if previous.get(name) != Some(value) {
            changes.push(AttributeChange::Set(name, value));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Callback;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_diff_attributes() {
        let previous = attrs(&[("class", "a".into()), ("id", "x".into()), ("hidden", true.into())]);
        let next = attrs(&[("class", "b".into()), ("id", "x".into()), ("title", "t".into())]);

        let changes = diff_attributes(&previous, &next);
        assert_eq!(
            changes,
            vec![
                AttributeChange::Remove("hidden"),
                AttributeChange::Set("class", &AttrValue::from("b")),
                AttributeChange::Set("title", &AttrValue::from("t")),
            ]
        );
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let handler = Callback::new(|| {});
        let previous = attrs(&[("onclick", handler.clone().into()), ("n", 1.into())]);
        let next = attrs(&[("onclick", handler.into()), ("n", 1.into())]);
        assert!(diff_attributes(&previous, &next).is_empty());
    }

    #[test]
    fn test_diff_new_callback_is_change() {
        let previous = attrs(&[("onclick", Callback::new(|| {}).into())]);
        let next = attrs(&[("onclick", Callback::new(|| {}).into())]);
        assert_eq!(diff_attributes(&previous, &next).len(), 1);
    }
}
