//! Description model - what the scheduler reconciles against.
//!
//! An [`Element`] describes one node of the desired tree: its [`NodeKind`],
//! an optional identity [`Key`] and its [`Props`] (attributes plus ordered
//! child descriptions). Elements are immutable once built; props sit behind
//! an `Rc` so fibers can hold on to them without copying.
//!
//! # Kinds
//!
//! ```text
//! Host(tag)      → output created by the output target, children from props
//! Text           → host leaf whose content is the `nodeValue` attribute
//! Fragment       → pass-through, children from props
//! Function(fn)   → fn(ctx, props) returns the children
//! Class(factory) → persistent Component instance renders the children
//! Root           → container fiber created by `Scheduler::render`
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::hooks::RenderContext;
use crate::types::{AttrValue, Attributes, Key, OutputHandle, TEXT_TAG, TEXT_VALUE_ATTR};

// =============================================================================
// Components
// =============================================================================

/// Signature of a function component.
pub type ComponentFn = fn(&mut RenderContext, &Props) -> Result<Vec<Element>>;

/// A function component: a named render function.
#[derive(Clone, Copy)]
pub struct FunctionComponent {
    pub name: &'static str,
    pub render: ComponentFn,
}

/// Stateful component whose instance lives as long as its fiber.
///
/// Lifecycle callbacks fire during commit: `did_mount` / `did_update` are
/// queued as effects, `will_unmount` runs while the subtree is deleted.
pub trait Component {
    /// Produce the child descriptions for the current props.
    fn render(&mut self, ctx: &mut RenderContext, props: &Props) -> Result<Vec<Element>>;

    fn did_mount(&mut self) {}

    fn did_update(&mut self) {}

    fn will_unmount(&mut self) {}
}

/// Shared handle to a live class instance.
pub type Instance = Rc<RefCell<Box<dyn Component>>>;

/// Factory creating a class instance from its first props.
pub type ComponentFactory = fn(&Props) -> Box<dyn Component>;

/// A class component: a named instance factory.
#[derive(Clone, Copy)]
pub struct ClassComponent {
    pub name: &'static str,
    pub create: ComponentFactory,
}

// =============================================================================
// Node Kind
// =============================================================================

/// Closed set of node kinds the scheduler knows how to process.
#[derive(Clone)]
pub enum NodeKind {
    Root,
    Host(Rc<str>),
    Text,
    Fragment,
    Function(FunctionComponent),
    Class(ClassComponent),
}

impl NodeKind {
    /// Whether two kinds describe the same thing, so the old node can be reused.
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Root, Self::Root) => true,
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Text, Self::Text) => true,
            (Self::Fragment, Self::Fragment) => true,
            (Self::Function(a), Self::Function(b)) => {
                a.name == b.name && a.render as usize == b.render as usize
            }
            (Self::Class(a), Self::Class(b)) => {
                a.name == b.name && a.create as usize == b.create as usize
            }
            _ => false,
        }
    }

    /// Whether nodes of this kind own an output handle.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_) | Self::Text)
    }

    /// Tag handed to the output target, for host kinds.
    pub fn output_tag(&self) -> Option<&str> {
        match self {
            Self::Host(tag) => Some(&**tag),
            Self::Text => Some(TEXT_TAG),
            _ => None,
        }
    }

    /// Human readable name, used in logs and errors.
    pub fn name(&self) -> &str {
        match self {
            Self::Root => "#root",
            Self::Host(tag) => &**tag,
            Self::Text => TEXT_TAG,
            Self::Fragment => "#fragment",
            Self::Function(component) => component.name,
            Self::Class(component) => component.name,
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Host(tag) => write!(f, "Host({tag})"),
            Self::Text => f.write_str("Text"),
            Self::Fragment => f.write_str("Fragment"),
            Self::Function(component) => write!(f, "Function({})", component.name),
            Self::Class(component) => write!(f, "Class({})", component.name),
        }
    }
}

// =============================================================================
// Live-binding Reference
// =============================================================================

/// Reference bound to a host node's output handle while it is mounted.
#[derive(Clone, Default)]
pub struct NodeRef(Rc<Cell<Option<OutputHandle>>>);

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bound handle, if the node is mounted.
    pub fn get(&self) -> Option<OutputHandle> {
        self.0.get()
    }

    pub(crate) fn bind(&self, handle: OutputHandle) {
        self.0.set(Some(handle));
    }

    pub(crate) fn clear(&self) {
        self.0.set(None);
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.0.get()).finish()
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attributes plus ordered child descriptions.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub attributes: Attributes,
    pub children: Vec<Element>,
    pub node_ref: Option<NodeRef>,
}

impl Props {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Text attribute lookup.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(AttrValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Numeric attribute lookup.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.attributes.get(name) {
            Some(AttrValue::Number(number)) => Some(*number),
            _ => None,
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// Description of one node in the desired tree.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) kind: NodeKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
}

impl Element {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            key: None,
            props: Rc::new(Props::default()),
        }
    }

    /// Host element with the given tag.
    pub fn host(tag: &str) -> Self {
        Self::new(NodeKind::Host(Rc::from(tag)))
    }

    /// Text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).attr(TEXT_VALUE_ATTR, AttrValue::Text(content.into()))
    }

    /// Fragment grouping children without an output node of its own.
    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        Self::new(NodeKind::Fragment).children(children)
    }

    /// Function component.
    pub fn component(name: &'static str, render: ComponentFn) -> Self {
        Self::new(NodeKind::Function(FunctionComponent { name, render }))
    }

    /// Class component.
    pub fn class(name: &'static str, create: ComponentFactory) -> Self {
        Self::new(NodeKind::Class(ClassComponent { name, create }))
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        Rc::make_mut(&mut self.props)
            .attributes
            .insert(name.to_string(), value.into());
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        Rc::make_mut(&mut self.props).children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        Rc::make_mut(&mut self.props).children.extend(children);
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn node_ref(mut self, node_ref: &NodeRef) -> Self {
        Rc::make_mut(&mut self.props).node_ref = Some(node_ref.clone());
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn get_key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

// =============================================================================
// Tests
// =============================================================================
