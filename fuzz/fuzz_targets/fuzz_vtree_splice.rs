#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use weft_core::Error;
use weft_render::{Target, VNode, VirtualTree};

#[derive(Debug, Arbitrary)]
enum Op {
    Splice { start: u8, delete: u8, insert: u8 },
    InsertFlagged { start: u8, flag: u8 },
    Replace { count: u8 },
    Toggle { flag: u8 },
}

fn flag_name(n: u8) -> String {
    format!("f{}", n % 16)
}

fuzz_target!(|ops: Vec<Op>| {
    let Ok(mut tree) = VirtualTree::new(VNode::new("div").child(VNode::new("div").flag("anchor")))
    else {
        return;
    };
    let root_key = tree.root_key();

    for op in ops.into_iter().take(64) {
        let before = tree.root().subtree_len();
        let result = match op {
            Op::Splice { start, delete, insert } => {
                let items = (0..insert % 4).map(|_| VNode::new("span")).collect();
                tree.splice_children(Target::Root, start as usize % 8, delete as usize % 4, items)
                    .map(drop)
            }
            Op::InsertFlagged { start, flag } => tree
                .splice_children(
                    Target::Root,
                    start as usize % 8,
                    0,
                    vec![VNode::new("div").flag(flag_name(flag))],
                )
                .map(drop),
            Op::Replace { count } => {
                let items = (0..count % 4).map(|_| VNode::new("p")).collect();
                tree.replace_children("anchor", items).map(drop)
            }
            Op::Toggle { flag } => {
                let name = flag_name(flag);
                tree.update(Target::Flag(&name), |node| node.set_class("on", true))
            }
        };

        match result {
            Ok(()) => {}
            Err(Error::DuplicateFlag(_)) | Err(Error::SpliceOutOfRange { .. }) => {
                assert_eq!(tree.root().subtree_len(), before, "rejected op changed the tree");
            }
            Err(Error::MissingFlag(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }

        let mut flags = tree.root().flags();
        let len = flags.len();
        flags.sort_unstable();
        flags.dedup();
        assert_eq!(flags.len(), len, "duplicate flag in tree");
        assert_eq!(tree.root_key(), root_key);
    }
});
