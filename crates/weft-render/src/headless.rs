#![forbid(unsafe_code)]

//! In-memory renderer for tests and embedding.
//!
//! [`HeadlessRenderer`] acknowledges commits without drawing anything. It
//! records every acknowledged batch, answers measurements from a table,
//! tracks scroll offsets, and can be told to fail or hold commits.
//!
//! Handles are cheap to clone and share state, so a test can keep one
//! handle while the runtime owns another.
//!
//! Scroll offsets are not clamped to the content size.

use crate::batch::{CommitAck, PatchBatch};
use crate::renderer::{Axis, Measurement, Renderer};
use ahash::AHashMap;
use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use weft_core::RendererError;

type HeldCommit = (PatchBatch, oneshot::Sender<Result<CommitAck, RendererError>>);

#[derive(Default)]
struct HeadlessState {
    commits: Vec<PatchBatch>,
    metrics: AHashMap<String, Measurement>,
    offsets: AHashMap<String, (f64, f64)>,
    scrolls: Vec<(String, Axis, f64)>,
    fail_next: VecDeque<String>,
    hold: bool,
    held: VecDeque<HeldCommit>,
}

/// Renderer that keeps everything in memory.
#[derive(Clone, Default)]
pub struct HeadlessRenderer {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `measure(node_id)` with `m`. Scroll offsets are layered on top.
    pub fn set_metrics(&self, node_id: impl Into<String>, m: Measurement) {
        self.state.borrow_mut().metrics.insert(node_id.into(), m);
    }

    /// Fail the next commit with `message`. Calls queue up.
    pub fn fail_next_commit(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_next.push_back(message.into());
    }

    /// While holding, commits stay pending until released.
    pub fn hold_commits(&self, hold: bool) {
        self.state.borrow_mut().hold = hold;
    }

    #[must_use]
    pub fn held_count(&self) -> usize {
        self.state.borrow().held.len()
    }

    /// Acknowledge the oldest held commit. Returns false if none was held.
    pub fn release_next(&self) -> bool {
        let next = self.state.borrow_mut().held.pop_front();
        match next {
            Some((batch, tx)) => {
                let result = self.acknowledge(batch);
                // The waiting commit future may have been dropped.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Acknowledge every held commit, oldest first.
    pub fn release_all(&self) -> usize {
        let mut n = 0;
        while self.release_next() {
            n += 1;
        }
        n
    }

    /// Acknowledged batches, oldest first.
    #[must_use]
    pub fn commits(&self) -> Vec<PatchBatch> {
        self.state.borrow().commits.clone()
    }

    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.state.borrow().commits.len()
    }

    /// Acknowledged batches for one instance.
    #[must_use]
    pub fn commits_for(&self, instance: weft_core::ComponentId) -> Vec<PatchBatch> {
        self.state
            .borrow()
            .commits
            .iter()
            .filter(|b| b.instance == instance)
            .cloned()
            .collect()
    }

    /// Current `(left, top)` scroll offset of a node.
    #[must_use]
    pub fn scroll_offset(&self, node_id: &str) -> (f64, f64) {
        self.state
            .borrow()
            .offsets
            .get(node_id)
            .copied()
            .unwrap_or_default()
    }

    /// Every `scroll_by` call, in order.
    #[must_use]
    pub fn scroll_log(&self) -> Vec<(String, Axis, f64)> {
        self.state.borrow().scrolls.clone()
    }

    fn acknowledge(&self, batch: PatchBatch) -> Result<CommitAck, RendererError> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.fail_next.pop_front() {
            tracing::debug!(
                target: "weft.patch",
                instance = %batch.instance,
                sequence = batch.sequence,
                "headless renderer failing commit"
            );
            return Err(RendererError::new(message));
        }
        let ack = CommitAck::from(&batch);
        state.commits.push(batch);
        Ok(ack)
    }
}

impl Renderer for HeadlessRenderer {
    fn commit(&self, batch: PatchBatch) -> LocalBoxFuture<'static, Result<CommitAck, RendererError>> {
        let hold = self.state.borrow().hold;
        if !hold {
            return future::ready(self.acknowledge(batch)).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        self.state.borrow_mut().held.push_back((batch, tx));
        async move {
            rx.await
                .unwrap_or_else(|_| Err(RendererError::new("held commit was dropped")))
        }
        .boxed_local()
    }

    fn measure(&self, node_id: &str) -> LocalBoxFuture<'static, Result<Measurement, RendererError>> {
        let state = self.state.borrow();
        let result = match state.metrics.get(node_id) {
            Some(m) => {
                let (left, top) = state.offsets.get(node_id).copied().unwrap_or_default();
                Ok(Measurement {
                    scroll_left: m.scroll_left + left,
                    scroll_top: m.scroll_top + top,
                    ..*m
                })
            }
            None => Err(RendererError::new(format!("no metrics for node `{node_id}`"))),
        };
        future::ready(result).boxed_local()
    }

    fn scroll_by(
        &self,
        node_id: &str,
        axis: Axis,
        amount: f64,
    ) -> LocalBoxFuture<'static, Result<(), RendererError>> {
        let mut state = self.state.borrow_mut();
        let offset = state.offsets.entry(node_id.to_owned()).or_default();
        match axis {
            Axis::X => offset.0 += amount,
            Axis::Y => offset.1 += amount,
        }
        state.scrolls.push((node_id.to_owned(), axis, amount));
        future::ready(Ok(())).boxed_local()
    }
}

impl std::fmt::Debug for HeadlessRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HeadlessRenderer")
            .field("commits", &state.commits.len())
            .field("held", &state.held.len())
            .field("hold", &state.hold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::VirtualTree;
    use crate::vnode::VNode;
    use futures::executor::block_on;
    use weft_core::ComponentId;

    fn batch(seq: u64) -> PatchBatch {
        let mut tree = VirtualTree::new(VNode::new("div")).unwrap();
        PatchBatch::checkpoint(ComponentId::from_raw(1), seq, &mut tree)
    }

    #[test]
    fn commits_are_recorded() {
        let r = HeadlessRenderer::new();
        let ack = block_on(r.commit(batch(1))).unwrap();
        assert_eq!(ack.sequence, 1);
        assert_eq!(r.commit_count(), 1);
    }

    #[test]
    fn failing_commit_is_not_recorded() {
        let r = HeadlessRenderer::new();
        r.fail_next_commit("boom");
        let err = block_on(r.commit(batch(1))).unwrap_err();
        assert_eq!(err.message, "boom");
        assert_eq!(r.commit_count(), 0);
        assert!(block_on(r.commit(batch(2))).is_ok());
    }

    #[test]
    fn held_commits_wait_for_release() {
        let r = HeadlessRenderer::new();
        r.hold_commits(true);
        let mut fut = r.commit(batch(1));
        assert!((&mut fut).now_or_never().is_none());
        assert_eq!(r.held_count(), 1);
        assert!(r.release_next());
        assert_eq!(block_on(fut).unwrap().sequence, 1);
    }

    #[test]
    fn measurements_include_scroll() {
        let r = HeadlessRenderer::new();
        r.set_metrics("cols", Measurement::sized(700.0, 300.0));
        block_on(r.scroll_by("cols", Axis::X, 100.0)).unwrap();
        let m = block_on(r.measure("cols")).unwrap();
        assert_eq!(m.scroll_left, 100.0);
        assert_eq!(m.client_width, 700.0);
        assert!(block_on(r.measure("other")).is_err());
    }
}
