#![forbid(unsafe_code)]

//! Owned virtual tree with a lazily rebuilt flag index and a mutation log.
//!
//! # Design
//!
//! [`VirtualTree`] owns one root [`VNode`]. Nodes are addressed by
//! [`Target`]: the root, or the node carrying a flag. A side index maps each
//! flag to the child-index path of its node; it is dropped on every
//! structural mutation and rebuilt on the next lookup, so callers never hold
//! raw indices.
//!
//! Mutations only edit the tree and append to a [`TreeMutation`] log. They
//! never schedule anything: the owning component decides when to request a
//! commit, and the scheduler drains the log into a patch batch.
//!
//! # Invariants
//!
//! 1. At most one node per tree carries a given flag. Mutations that would
//!    introduce a duplicate fail with [`Error::DuplicateFlag`] and leave the
//!    tree untouched.
//! 2. The root node (and its key) never changes for the life of the tree.
//! 3. Moving siblings around never changes a surviving node's key.
//!
//! # Performance
//!
//! | Operation          | Complexity                       |
//! |--------------------|----------------------------------|
//! | `find` (warm)      | O(depth)                         |
//! | `find` (cold)      | O(N) index rebuild, then O(depth) |
//! | `splice_children`  | O(N) duplicate check + O(children) |

use crate::vnode::{NodeKey, VNode};
use ahash::AHashMap;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use weft_core::{Error, Result};

type NodePath = SmallVec<[usize; 8]>;

/// Address of a node inside a [`VirtualTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Root,
    Flag(&'a str),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(flag: &'a str) -> Self {
        Self::Flag(flag)
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("<root>"),
            Self::Flag(flag) => f.write_str(flag),
        }
    }
}

/// One entry of the mutation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMutation {
    ReplaceChildren {
        target: String,
        removed: usize,
        inserted: Vec<NodeKey>,
    },
    Splice {
        target: String,
        start: usize,
        removed: usize,
        inserted: Vec<NodeKey>,
    },
    /// In-place edit of a node's own fields or descendants.
    Update { target: String, key: NodeKey },
}

/// A component's virtual tree.
pub struct VirtualTree {
    root: VNode,
    index: RefCell<Option<AHashMap<String, NodePath>>>,
    log: Vec<TreeMutation>,
}

impl VirtualTree {
    /// Wrap `root`. Fails if the initial tree already repeats a flag.
    pub fn new(root: VNode) -> Result<Self> {
        let tree = Self {
            root,
            index: RefCell::new(None),
            log: Vec::new(),
        };
        if let Some(dup) = first_duplicate(tree.root.flags()) {
            return Err(Error::DuplicateFlag(dup.to_owned()));
        }
        Ok(tree)
    }

    #[must_use]
    pub fn root(&self) -> &VNode {
        &self.root
    }

    #[must_use]
    pub fn root_key(&self) -> NodeKey {
        self.root.key()
    }

    /// Look up a node by flag.
    #[must_use]
    pub fn find(&self, flag: &str) -> Option<&VNode> {
        let path = self.path_of(flag)?;
        Some(follow(&self.root, &path))
    }

    #[must_use]
    pub fn contains_flag(&self, flag: &str) -> bool {
        self.path_of(flag).is_some()
    }

    /// Resolve a target, failing with [`Error::MissingFlag`].
    pub fn get(&self, target: Target<'_>) -> Result<&VNode> {
        match target {
            Target::Root => Ok(&self.root),
            Target::Flag(flag) => self
                .find(flag)
                .ok_or_else(|| Error::MissingFlag(flag.to_owned())),
        }
    }

    fn path_of(&self, flag: &str) -> Option<NodePath> {
        let mut index = self.index.borrow_mut();
        let index = index.get_or_insert_with(|| {
            let mut map = AHashMap::new();
            let mut path = NodePath::new();
            build_index(&self.root, &mut path, &mut map);
            tracing::trace!(target: "weft.tree", flags = map.len(), "flag index rebuilt");
            map
        });
        index.get(flag).cloned()
    }

    fn node_mut(&mut self, target: Target<'_>) -> Result<&mut VNode> {
        match target {
            Target::Root => Ok(&mut self.root),
            Target::Flag(flag) => {
                let path = self
                    .path_of(flag)
                    .ok_or_else(|| Error::MissingFlag(flag.to_owned()))?;
                Ok(follow_mut(&mut self.root, &path))
            }
        }
    }

    fn invalidate(&self) {
        self.index.borrow_mut().take();
    }

    /// Flags outside `target`'s children in `range`, checked against the
    /// flags of `incoming`.
    fn check_incoming(
        &self,
        target: Target<'_>,
        range: std::ops::Range<usize>,
        incoming: &[VNode],
    ) -> Result<()> {
        let node = self.get(target)?;
        let mut outgoing: Vec<&str> = Vec::new();
        for child in &node.children[range] {
            outgoing.extend(child.flags());
        }
        let mut remaining: AHashMap<&str, usize> = AHashMap::new();
        for flag in self.root.flags() {
            *remaining.entry(flag).or_default() += 1;
        }
        for flag in outgoing {
            if let Some(n) = remaining.get_mut(flag) {
                *n -= 1;
            }
        }
        for item in incoming {
            for flag in item.flags() {
                let n = remaining.entry(flag).or_default();
                if *n > 0 {
                    return Err(Error::DuplicateFlag(flag.to_owned()));
                }
                *n += 1;
            }
        }
        Ok(())
    }

    /// Replace every child of `target`.
    pub fn replace_children<'t>(
        &mut self,
        target: impl Into<Target<'t>>,
        children: Vec<VNode>,
    ) -> Result<Vec<VNode>> {
        let target = target.into();
        let len = self.get(target)?.children.len();
        self.check_incoming(target, 0..len, &children)?;

        let inserted = children.iter().map(VNode::key).collect();
        let node = self.node_mut(target)?;
        let removed = std::mem::replace(&mut node.children, children);
        self.invalidate();
        tracing::trace!(
            target: "weft.tree",
            node = %target,
            removed = removed.len(),
            "children replaced"
        );
        self.log.push(TreeMutation::ReplaceChildren {
            target: target.to_string(),
            removed: removed.len(),
            inserted,
        });
        Ok(removed)
    }

    /// Remove `delete_count` children of `target` starting at `start`, insert
    /// `items` in their place, and return the removed children.
    pub fn splice_children<'t>(
        &mut self,
        target: impl Into<Target<'t>>,
        start: usize,
        delete_count: usize,
        items: Vec<VNode>,
    ) -> Result<Vec<VNode>> {
        let target = target.into();
        let len = self.get(target)?.children.len();
        let end = start.saturating_add(delete_count);
        if start > len || end > len {
            return Err(Error::SpliceOutOfRange { start, end, len });
        }
        self.check_incoming(target, start..end, &items)?;

        let inserted = items.iter().map(VNode::key).collect();
        let node = self.node_mut(target)?;
        let removed: Vec<VNode> = node.children.splice(start..end, items).collect();
        self.invalidate();
        tracing::trace!(
            target: "weft.tree",
            node = %target,
            start,
            removed = removed.len(),
            "children spliced"
        );
        self.log.push(TreeMutation::Splice {
            target: target.to_string(),
            start,
            removed: removed.len(),
            inserted,
        });
        Ok(removed)
    }

    /// Append `items` to `target`'s children.
    pub fn push_children<'t>(
        &mut self,
        target: impl Into<Target<'t>>,
        items: Vec<VNode>,
    ) -> Result<()> {
        let target = target.into();
        let len = self.get(target)?.children.len();
        self.splice_children(target, len, 0, items).map(drop)
    }

    /// Edit `target` in place.
    ///
    /// The edit may touch descendants too. If it leaves a duplicate flag
    /// behind, the node is restored and the edit fails with
    /// [`Error::DuplicateFlag`].
    pub fn update<'t, R>(
        &mut self,
        target: impl Into<Target<'t>>,
        edit: impl FnOnce(&mut VNode) -> R,
    ) -> Result<R> {
        let target = target.into();
        let path = match target {
            Target::Root => NodePath::new(),
            Target::Flag(flag) => self
                .path_of(flag)
                .ok_or_else(|| Error::MissingFlag(flag.to_owned()))?,
        };
        let node = follow_mut(&mut self.root, &path);
        let before = node.clone();
        let out = edit(node);
        let key = node.key();

        if let Some(dup) = first_duplicate(self.root.flags()) {
            let dup = dup.to_owned();
            *follow_mut(&mut self.root, &path) = before;
            tracing::debug!(target: "weft.tree", node = %target, flag = %dup, "edit rejected, node restored");
            return Err(Error::DuplicateFlag(dup));
        }
        self.invalidate();
        self.log.push(TreeMutation::Update {
            target: target.to_string(),
            key,
        });
        Ok(out)
    }

    /// True when mutations were logged since the last [`take_mutations`].
    ///
    /// [`take_mutations`]: Self::take_mutations
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.log.is_empty()
    }

    #[must_use]
    pub fn pending(&self) -> &[TreeMutation] {
        &self.log
    }

    /// Drain the mutation log.
    pub fn take_mutations(&mut self) -> Vec<TreeMutation> {
        std::mem::take(&mut self.log)
    }
}

impl fmt::Debug for VirtualTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualTree")
            .field("root", &self.root.key())
            .field("nodes", &self.root.subtree_len())
            .field("pending", &self.log.len())
            .finish()
    }
}

fn build_index(node: &VNode, path: &mut NodePath, map: &mut AHashMap<String, NodePath>) {
    if let Some(flag) = &node.flag {
        map.entry(flag.clone()).or_insert_with(|| path.clone());
    }
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        build_index(child, path, map);
        path.pop();
    }
}

fn follow<'a>(mut node: &'a VNode, path: &[usize]) -> &'a VNode {
    for &i in path {
        node = &node.children[i];
    }
    node
}

fn follow_mut<'a>(mut node: &'a mut VNode, path: &[usize]) -> &'a mut VNode {
    for &i in path {
        node = &mut node.children[i];
    }
    node
}

fn first_duplicate(flags: Vec<&str>) -> Option<&str> {
    let mut seen = ahash::AHashSet::with_capacity(flags.len());
    flags.into_iter().find(|f| !seen.insert(*f))
}
