//! Property-based invariant tests for the virtual tree.
//!
//! 1. A flagged node keeps its key across arbitrary sibling splices.
//! 2. Flags stay unique after any accepted mutation sequence.
//! 3. A rejected mutation leaves the tree unchanged.
//! 4. The root key never changes.

use proptest::prelude::*;
use weft_render::{Target, VNode, VirtualTree};

// ── Strategies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    /// Splice plain nodes next to the flagged node.
    Splice { start: usize, delete: usize, insert: usize },
    /// Try to insert a node carrying an existing flag.
    InsertDuplicate { start: usize },
    /// Insert a freshly flagged node.
    InsertFlagged { start: usize, n: u32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..12, 0usize..4, 0usize..4)
            .prop_map(|(start, delete, insert)| Op::Splice { start, delete, insert }),
        1 => (0usize..12).prop_map(|start| Op::InsertDuplicate { start }),
        1 => (0usize..12, 0u32..1000).prop_map(|(start, n)| Op::InsertFlagged { start, n }),
    ]
}

fn fresh_tree() -> VirtualTree {
    VirtualTree::new(
        VNode::new("div").with_children([
            VNode::new("div").text("a"),
            VNode::new("div").flag("anchor"),
            VNode::new("div").text("b"),
        ]),
    )
    .unwrap()
}

fn assert_unique_flags(tree: &VirtualTree) -> Result<(), TestCaseError> {
    let mut flags = tree.root().flags();
    let len = flags.len();
    flags.sort_unstable();
    flags.dedup();
    prop_assert_eq!(flags.len(), len, "duplicate flag in tree");
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1-4. Identity and uniqueness under sibling splices
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn flagged_node_identity_survives_splices(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let mut tree = fresh_tree();
        let root_key = tree.root_key();
        let anchor_key = tree.find("anchor").unwrap().key();

        for op in ops {
            let len = tree.root().children.len();
            let anchor_pos = tree
                .root()
                .children
                .iter()
                .position(|c| c.flag.as_deref() == Some("anchor"))
                .unwrap();

            match op {
                Op::Splice { start, delete, insert } => {
                    let start = start.min(len);
                    // Never delete the anchor itself.
                    let delete = if start <= anchor_pos && anchor_pos < start + delete {
                        anchor_pos - start
                    } else {
                        delete.min(len - start)
                    };
                    let items = (0..insert).map(|_| VNode::new("div")).collect();
                    tree.splice_children(Target::Root, start, delete, items).unwrap();
                }
                Op::InsertDuplicate { start } => {
                    let before = tree.root().clone();
                    let result = tree.splice_children(
                        Target::Root,
                        start.min(len),
                        0,
                        vec![VNode::new("div").flag("anchor")],
                    );
                    prop_assert!(result.is_err());
                    prop_assert_eq!(tree.root(), &before);
                }
                Op::InsertFlagged { start, n } => {
                    let flag = format!("extra-{n}");
                    let existed = tree.contains_flag(&flag);
                    let node = VNode::new("div").flag(flag.clone());
                    let result = tree.splice_children(Target::Root, start.min(len), 0, vec![node]);
                    prop_assert_eq!(result.is_ok(), !existed);
                }
            }

            prop_assert_eq!(tree.find("anchor").map(VNode::key), Some(anchor_key));
            prop_assert_eq!(tree.root_key(), root_key);
            assert_unique_flags(&tree)?;
        }
    }
}
