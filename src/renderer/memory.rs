//! In-memory output target.
//!
//! Keeps a plain node tree keyed by [`OutputHandle`] and records every
//! primitive call, so tests can assert on both the final tree and the exact
//! sequence of mutations a commit produced.

use std::collections::HashMap;
use std::fmt::Write;

use super::{diff_attributes, AttributeChange, OutputTarget};
use crate::types::{AttrValue, Attributes, OutputHandle, TEXT_TAG, TEXT_VALUE_ATTR};

/// Primitive call recorded by [`MemoryRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputOp {
    Create { handle: OutputHandle, tag: String },
    Patch { handle: OutputHandle, changes: usize },
    Attach { parent: OutputHandle, child: OutputHandle, before: Option<OutputHandle> },
    Detach { parent: OutputHandle, child: OutputHandle },
}

/// A node of the in-memory tree.
#[derive(Debug, Clone)]
pub struct MemoryNode {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<OutputHandle>,
    pub parent: Option<OutputHandle>,
}

/// Reference output target holding the rendered tree in memory.
#[derive(Debug)]
pub struct MemoryRenderer {
    nodes: HashMap<OutputHandle, MemoryNode>,
    container: OutputHandle,
    next_handle: u64,
    ops: Vec<OutputOp>,
}

impl MemoryRenderer {
    /// Create a renderer with an empty container node.
    pub fn new() -> Self {
        let container = OutputHandle(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            container,
            MemoryNode {
                tag: "#container".to_string(),
                attributes: Attributes::new(),
                children: Vec::new(),
                parent: None,
            },
        );
        Self {
            nodes,
            container,
            next_handle: 1,
            ops: Vec::new(),
        }
    }

    /// Handle of the container node to mount into.
    pub fn container(&self) -> OutputHandle {
        self.container
    }

    pub fn node(&self, handle: OutputHandle) -> Option<&MemoryNode> {
        self.nodes.get(&handle)
    }

    /// Number of live nodes, container excluded.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Recorded primitive calls, oldest first.
    pub fn ops(&self) -> &[OutputOp] {
        &self.ops
    }

    /// Drain the recorded calls.
    pub fn take_ops(&mut self) -> Vec<OutputOp> {
        std::mem::take(&mut self.ops)
    }

    /// Invoke the callback attribute `name` of `handle`.
    ///
    /// Returns false when the node has no such callback.
    pub fn dispatch(&self, handle: OutputHandle, name: &str) -> bool {
        let callback = match self.nodes.get(&handle).and_then(|node| node.attributes.get(name)) {
            Some(AttrValue::Callback(callback)) => callback.clone(),
            _ => return false,
        };
        callback.call();
        true
    }

    /// First node in document order whose tag is `tag`.
    pub fn find(&self, tag: &str) -> Option<OutputHandle> {
        let mut stack = vec![self.container];
        while let Some(handle) = stack.pop() {
            let node = self.nodes.get(&handle)?;
            if node.tag == tag {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Serialize everything under the container.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        if let Some(node) = self.nodes.get(&self.container) {
            for child in &node.children {
                self.write_markup(*child, &mut out);
            }
        }
        out
    }

    /// Serialize the subtree at `handle`.
    pub fn to_markup(&self, handle: OutputHandle) -> String {
        let mut out = String::new();
        self.write_markup(handle, &mut out);
        out
    }

    fn write_markup(&self, handle: OutputHandle, out: &mut String) {
        let Some(node) = self.nodes.get(&handle) else { return };
        if node.tag == TEXT_TAG {
            if let Some(value) = node.attributes.get(TEXT_VALUE_ATTR) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attributes {
            if !matches!(value, AttrValue::Callback(_)) {
                let _ = write!(out, " {name}=\"{value}\"");
            }
        }
        out.push('>');
        for child in &node.children {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn unlink(&mut self, child: OutputHandle) {
        let Some(parent) = self.nodes.get(&child).and_then(|node| node.parent) else { return };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|handle| *handle != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
    }

    fn drop_subtree(&mut self, handle: OutputHandle) {
        if let Some(node) = self.nodes.remove(&handle) {
            for child in node.children {
                self.drop_subtree(child);
            }
        }
    }
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTarget for MemoryRenderer {
    fn create_output(&mut self, tag: &str, attributes: &Attributes) -> OutputHandle {
        let handle = OutputHandle(self.next_handle);
        self.next_handle += 1;
        self.nodes.insert(
            handle,
            MemoryNode {
                tag: tag.to_string(),
                attributes: attributes.clone(),
                children: Vec::new(),
                parent: None,
            },
        );
        self.ops.push(OutputOp::Create {
            handle,
            tag: tag.to_string(),
        });
        handle
    }

    fn patch_output(&mut self, handle: OutputHandle, previous: &Attributes, next: &Attributes) {
        let changes = diff_attributes(previous, next);
        let count = changes.len();
        if let Some(node) = self.nodes.get_mut(&handle) {
            for change in changes {
                match change {
                    AttributeChange::Set(name, value) => {
                        node.attributes.insert(name.to_string(), value.clone());
                    }
                    AttributeChange::Remove(name) => {
                        node.attributes.remove(name);
                    }
                }
            }
        }
        self.ops.push(OutputOp::Patch { handle, changes: count });
    }

    fn attach_output(
        &mut self,
        parent: OutputHandle,
        child: OutputHandle,
        before: Option<OutputHandle>,
    ) {
        self.unlink(child);
        if let Some(node) = self.nodes.get_mut(&parent) {
            let index = before
                .and_then(|anchor| node.children.iter().position(|handle| *handle == anchor))
                .unwrap_or(node.children.len());
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.ops.push(OutputOp::Attach { parent, child, before });
    }

    fn detach_output(&mut self, parent: OutputHandle, child: OutputHandle) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|handle| *handle != child);
        }
        self.drop_subtree(child);
        self.ops.push(OutputOp::Detach { parent, child });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Callback;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_build_and_serialize() {
        let mut out = MemoryRenderer::new();
        let root = out.container();
        let mut attrs = Attributes::new();
        attrs.insert("class".into(), "list".into());
        let ul = out.create_output("ul", &attrs);
        let li = out.create_output("li", &Attributes::new());
        let mut text = Attributes::new();
        text.insert(TEXT_VALUE_ATTR.into(), "one".into());
        let one = out.create_output(TEXT_TAG, &text);

        out.attach_output(li, one, None);
        out.attach_output(ul, li, None);
        out.attach_output(root, ul, None);

        assert_eq!(out.markup(), "<ul class=\"list\"><li>one</li></ul>");
        assert_eq!(out.node_count(), 3);
        assert_eq!(out.find("li"), Some(li));
    }

    #[test]
    fn test_attach_before_and_move() {
        let mut out = MemoryRenderer::new();
        let root = out.container();
        let a = out.create_output("a", &Attributes::new());
        let b = out.create_output("b", &Attributes::new());
        let c = out.create_output("c", &Attributes::new());
        out.attach_output(root, a, None);
        out.attach_output(root, c, None);
        out.attach_output(root, b, Some(c));
        assert_eq!(out.markup(), "<a></a><b></b><c></c>");

        out.attach_output(root, c, Some(a));
        assert_eq!(out.markup(), "<c></c><a></a><b></b>");
        assert_eq!(out.node(root).unwrap().children.len(), 3);
    }

    #[test]
    fn test_patch_and_detach() {
        let mut out = MemoryRenderer::new();
        let root = out.container();
        let mut before = Attributes::new();
        before.insert("id".into(), "x".into());
        let div = out.create_output("div", &before);
        let span = out.create_output("span", &Attributes::new());
        out.attach_output(div, span, None);
        out.attach_output(root, div, None);

        let mut after = Attributes::new();
        after.insert("id".into(), "y".into());
        out.patch_output(div, &before, &after);
        assert_eq!(out.markup(), "<div id=\"y\"><span></span></div>");

        out.detach_output(root, div);
        assert_eq!(out.markup(), "");
        assert_eq!(out.node_count(), 0);
        assert_eq!(
            out.ops().last(),
            Some(&OutputOp::Detach { parent: root, child: div })
        );
    }

    #[test]
    fn test_dispatch() {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let mut attrs = Attributes::new();
        let onclick = Callback::new(move || counter.set(counter.get() + 1));
        attrs.insert("onclick".into(), onclick.into());

        let mut out = MemoryRenderer::new();
        let button = out.create_output("button", &attrs);
        assert!(out.dispatch(button, "onclick"));
        assert!(!out.dispatch(button, "onhover"));
        assert_eq!(clicks.get(), 1);
        assert_eq!(out.to_markup(button), "<button></button>");
    }
}
