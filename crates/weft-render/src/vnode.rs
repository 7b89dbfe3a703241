#![forbid(unsafe_code)]

//! Virtual nodes.
//!
//! A [`VNode`] is a plain owned tree: tag, classes, style and attribute
//! maps, optional text, optional node id, optional unique flag, optional
//! child-component placeholder, and ordered children.
//!
//! Every node gets a [`NodeKey`] from a process-wide counter when it is
//! created. Keys survive moves between siblings and `Clone` (snapshots keep
//! keys), so a renderer can match nodes across commits.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_core::{ComponentId, PathNode};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a node for the node's whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl NodeKey {
    fn fresh() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

/// One node of a virtual tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
    key: NodeKey,
    pub tag: String,
    pub cls: Vec<String>,
    pub style: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub id: Option<String>,
    /// Unique within one tree; used for structural lookup.
    pub flag: Option<String>,
    /// When set, this node stands in for the root of another component.
    pub component_ref: Option<ComponentId>,
    pub children: Vec<VNode>,
}

impl VNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            key: NodeKey::fresh(),
            tag: tag.into(),
            cls: Vec::new(),
            style: BTreeMap::new(),
            attrs: BTreeMap::new(),
            text: None,
            id: None,
            flag: None,
            component_ref: None,
            children: Vec::new(),
        }
    }

    /// Placeholder that embeds another component's tree.
    pub fn placeholder(component: ComponentId) -> Self {
        let mut node = Self::new("weft-component");
        node.component_ref = Some(component);
        node
    }

    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    // -- builder ------------------------------------------------------------

    #[must_use]
    pub fn class(mut self, cls: impl Into<String>) -> Self {
        self.add_class(cls);
        self
    }

    #[must_use]
    pub fn classes<S: Into<String>>(mut self, cls: impl IntoIterator<Item = S>) -> Self {
        for c in cls {
            self.add_class(c);
        }
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    // -- classes ------------------------------------------------------------

    #[must_use]
    pub fn has_class(&self, cls: &str) -> bool {
        self.cls.iter().any(|c| c == cls)
    }

    pub fn add_class(&mut self, cls: impl Into<String>) {
        let cls = cls.into();
        if !self.has_class(&cls) {
            self.cls.push(cls);
        }
    }

    pub fn remove_class(&mut self, cls: &str) {
        self.cls.retain(|c| c != cls);
    }

    pub fn set_class(&mut self, cls: &str, on: bool) {
        if on {
            self.add_class(cls);
        } else {
            self.remove_class(cls);
        }
    }

    // -- traversal ----------------------------------------------------------

    /// Depth-first pre-order visit of this node and its descendants.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a VNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }

    /// Flags present in this subtree, in pre-order.
    #[must_use]
    pub fn flags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if let Some(flag) = n.flag.as_deref() {
                out.push(flag);
            }
        });
        out
    }

    /// Components embedded below this node through placeholders.
    #[must_use]
    pub fn embedded_components(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if let Some(id) = n.component_ref {
                out.push(id);
            }
        });
        out
    }

    /// Describe this node as a hop on an event path.
    #[must_use]
    pub fn to_path_node(&self, component: ComponentId) -> PathNode {
        PathNode {
            tag: self.tag.clone(),
            id: self.id.clone(),
            cls: self.cls.clone(),
            flag: self.flag.clone(),
            component: Some(component),
        }
    }
}

/// Depth-first search for the first node carrying `flag`.
#[must_use]
pub fn find_by_flag<'a>(root: &'a VNode, flag: &str) -> Option<&'a VNode> {
    if root.flag.as_deref() == Some(flag) {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_by_flag(c, flag))
}

/// Mutable variant of [`find_by_flag`].
pub fn find_by_flag_mut<'a>(root: &'a mut VNode, flag: &str) -> Option<&'a mut VNode> {
    if root.flag.as_deref() == Some(flag) {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|c| find_by_flag_mut(c, flag))
}

/// Depth-first search by node key.
#[must_use]
pub fn find_by_key(root: &VNode, key: NodeKey) -> Option<&VNode> {
    if root.key == key {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_by_key(c, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VNode {
        VNode::new("div").flag("root").with_children([
            VNode::new("div")
                .flag("header")
                .child(VNode::new("span").flag("title")),
            VNode::new("div").flag("body"),
        ])
    }

    #[test]
    fn keys_are_unique_and_survive_clone() {
        let a = VNode::new("div");
        let b = VNode::new("div");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.clone().key(), a.key());
    }

    #[test]
    fn find_by_flag_is_depth_first() {
        let tree = sample();
        assert_eq!(find_by_flag(&tree, "title").map(|n| n.tag.as_str()), Some("span"));
        assert!(find_by_flag(&tree, "missing").is_none());
        assert_eq!(tree.flags(), vec!["root", "header", "title", "body"]);
    }

    #[test]
    fn find_by_flag_mut_edits_in_place() {
        let mut tree = sample();
        if let Some(body) = find_by_flag_mut(&mut tree, "body") {
            body.add_class("active");
        }
        assert!(find_by_flag(&tree, "body").is_some_and(|n| n.has_class("active")));
    }

    #[test]
    fn class_helpers_do_not_duplicate() {
        let mut n = VNode::new("div").class("a").class("a");
        assert_eq!(n.cls, vec!["a"]);
        n.set_class("b", true);
        n.set_class("a", false);
        assert_eq!(n.cls, vec!["b"]);
    }

    #[test]
    fn placeholders_are_reported() {
        let id = ComponentId::from_raw(9);
        let tree = VNode::new("div").child(VNode::placeholder(id));
        assert_eq!(tree.embedded_components(), vec![id]);
        assert_eq!(tree.subtree_len(), 2);
    }
}
