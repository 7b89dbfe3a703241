#![forbid(unsafe_code)]

//! Patch batches handed to the renderer.

use crate::tree::{TreeMutation, VirtualTree};
use crate::vnode::VNode;
use weft_core::ComponentId;

/// Mutations accumulated for one instance since its last commit, plus a
/// snapshot of the tree at the checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchBatch {
    pub instance: ComponentId,
    /// Per-instance commit number, starting at 1.
    pub sequence: u64,
    pub mutations: Vec<TreeMutation>,
    pub snapshot: VNode,
}

impl PatchBatch {
    /// Close the current batch of `tree`: drain its log and snapshot it.
    pub fn checkpoint(instance: ComponentId, sequence: u64, tree: &mut VirtualTree) -> Self {
        Self {
            instance,
            sequence,
            mutations: tree.take_mutations(),
            snapshot: tree.root().clone(),
        }
    }

    /// A batch with no logged mutations (a bare re-render request).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Renderer acknowledgment of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitAck {
    pub instance: ComponentId,
    pub sequence: u64,
}

impl From<&PatchBatch> for CommitAck {
    fn from(batch: &PatchBatch) -> Self {
        Self {
            instance: batch.instance,
            sequence: batch.sequence,
        }
    }
}
