//! Core types for spark-fiber.
//!
//! These types flow between the description model, the fiber arena, the
//! commit applier and the output target. They define what the output target
//! understands: opaque handles and attribute maps.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Output Handle
// =============================================================================

/// Opaque reference to a node rendered by the output target.
///
/// The core never looks inside a handle. It only passes handles back to the
/// [`OutputTarget`](crate::renderer::OutputTarget) that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputHandle(pub u64);

impl fmt::Display for OutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Identity Key
// =============================================================================

/// Identity key used to match children across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Rc<str>);

impl Key {
    /// Create a key from anything string-like.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self::new(value.to_string())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Event listener or other callable attribute.
///
/// Two callbacks are equal only if they are the same allocation, so a
/// listener recreated on every render is reported as changed.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn()>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.0)()
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0))
    }
}

/// A single attribute value on a host element.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Callback(Callback),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Callback> for AttrValue {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Callback(_) => f.write_str("[callback]"),
        }
    }
}

/// Ordered attribute map. Ordering keeps diffs and serialized output stable.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Attribute carrying the content of text nodes.
pub const TEXT_VALUE_ATTR: &str = "nodeValue";

/// Tag passed to the output target when creating text nodes.
pub const TEXT_TAG: &str = "#text";

// =============================================================================
// Effect Tags
// =============================================================================

/// Mutation a fiber requires at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTag {
    /// Nothing to apply to this node itself.
    #[default]
    None,
    /// Freshly created; its output must be created and attached.
    Placement,
    /// Existing output must be diffed and patched.
    Update,
    /// Output must be detached and the subtree dropped.
    Deletion,
}

bitflags::bitflags! {
    /// Auxiliary per-fiber markers, cleared at commit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FiberFlags: u8 {
        /// Matched by key out of order; output must be re-anchored.
        const MOVED = 1 << 0;
        /// Carries a live-binding reference to bind at commit.
        const REF = 1 << 1;
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Cleanup function returned by effects and subscriptions.
pub type Cleanup = Box<dyn FnOnce()>;

/// A queued side effect, fired during commit.
pub type Effect = Box<dyn FnOnce()>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_identity() {
        let a = Callback::new(|| {});
        let b = a.clone();
        let c = Callback::new(|| {});

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(AttrValue::Callback(a.clone()), AttrValue::Callback(b));
        assert_ne!(AttrValue::Callback(a), AttrValue::Callback(c));
    }

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from("a"), Key::new("a"));
        assert_eq!(Key::from(3usize).as_str(), "3");
        assert_eq!(Key::from(String::from("row")).to_string(), "row");
    }

    #[test]
    fn test_fiber_flags() {
        let mut flags = FiberFlags::empty();
        flags |= FiberFlags::MOVED;
        assert!(flags.contains(FiberFlags::MOVED));
        assert!(!flags.contains(FiberFlags::REF));
        assert_eq!(EffectTag::default(), EffectTag::None);
    }
}
