#![forbid(unsafe_code)]

//! Batched, per-instance patch commits.
//!
//! # Design
//!
//! Each instance has a slot driven through
//!
//! ```text
//! idle --request--> dirty --turn--> committing --ack--> idle
//!                                       |  ^
//!                              request  |  | ack, re-dirtied
//!                                       v  |
//!                                    (redirty)
//! ```
//!
//! [`PatchScheduler::request_update`] never does work itself. The first
//! request on an idle slot spawns a commit task on the cooperative
//! executor; every request before that task runs joins the same batch.
//! Waiters are oneshot senders, and each request hands back an
//! [`UpdateFuture`] over the matching receiver.
//!
//! # Invariants
//!
//! 1. At most one commit per instance is in flight. Commit N+1 is taken
//!    only after commit N is acknowledged.
//! 2. A request made while a commit is in flight lands in the next batch.
//! 3. Every waiter of a batch receives that batch's result, including a
//!    [`PatchCommitError`] on renderer failure. The tree is not rolled back.
//!
//! # Failure Modes
//!
//! - **Instance destroyed while dirty**: pending waiters receive
//!   [`DestroyedInstanceError`]; the commit task finds no slot and exits.
//! - **Executor gone**: the request fails with [`Error::ExecutorShutdown`].

use crate::executor::spawn_on;
use ahash::AHashMap;
use futures::channel::oneshot;
use futures::executor::LocalSpawner;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tracing::Instrument;
use web_time::Instant;
use weft_core::{
    ComponentId, DestroyedInstanceError, Error, PatchCommitError, Result,
};
use weft_render::{CommitAck, PatchBatch, Renderer};

// ---------------------------------------------------------------------------
// Monotonic counters
// ---------------------------------------------------------------------------

static COMMITS_TOTAL: AtomicU64 = AtomicU64::new(0);
static COMMIT_FAILURES_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Total commits acknowledged by a renderer (monotonic counter).
#[must_use]
pub fn commits_total() -> u64 {
    COMMITS_TOTAL.load(Ordering::Relaxed)
}

/// Total commits that failed (monotonic counter).
#[must_use]
pub fn commit_failures_total() -> u64 {
    COMMIT_FAILURES_TOTAL.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Produces the batch for an instance at its checkpoint.
pub trait PatchSource {
    fn checkpoint(&self, instance: ComponentId, sequence: u64) -> Result<PatchBatch>;
}

type Waiter = oneshot::Sender<Result<CommitAck>>;

/// Scheduler state of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Dirty,
    Committing { redirty: bool },
}

#[derive(Debug)]
struct Slot {
    phase: Phase,
    sequence: u64,
    waiters: Vec<Waiter>,
    next_waiters: Vec<Waiter>,
}

impl Slot {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            sequence: 0,
            waiters: Vec::new(),
            next_waiters: Vec::new(),
        }
    }
}

struct SchedulerInner {
    slots: RefCell<AHashMap<ComponentId, Slot>>,
    spawner: LocalSpawner,
    source: Weak<dyn PatchSource>,
    renderer: Rc<dyn Renderer>,
    slow_commit_ms: u64,
}

/// Coalesces update requests into ordered per-instance commits.
#[derive(Clone)]
pub struct PatchScheduler {
    inner: Rc<SchedulerInner>,
}

impl PatchScheduler {
    pub fn new(
        spawner: LocalSpawner,
        source: Weak<dyn PatchSource>,
        renderer: Rc<dyn Renderer>,
        slow_commit_ms: u64,
    ) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                slots: RefCell::new(AHashMap::new()),
                spawner,
                source,
                renderer,
                slow_commit_ms,
            }),
        }
    }

    /// Mark `instance` dirty and wait for the commit that includes the
    /// current mutations.
    pub fn request_update(&self, instance: ComponentId) -> Result<UpdateFuture> {
        let (tx, rx) = oneshot::channel();
        let spawn = {
            let mut slots = self.inner.slots.borrow_mut();
            let slot = slots.entry(instance).or_insert_with(Slot::new);
            match slot.phase {
                Phase::Idle => {
                    slot.phase = Phase::Dirty;
                    slot.waiters.push(tx);
                    true
                }
                Phase::Dirty => {
                    slot.waiters.push(tx);
                    false
                }
                Phase::Committing { .. } => {
                    slot.phase = Phase::Committing { redirty: true };
                    slot.next_waiters.push(tx);
                    false
                }
            }
        };

        if spawn {
            tracing::trace!(target: "weft.patch", %instance, "instance dirty, commit scheduled");
            let inner = Rc::clone(&self.inner);
            if let Err(err) = spawn_on(&self.inner.spawner, drive(inner, instance)) {
                self.inner.slots.borrow_mut().remove(&instance);
                return Err(err);
            }
        }
        Ok(UpdateFuture { receiver: rx })
    }

    /// Current phase of `instance`.
    #[must_use]
    pub fn phase(&self, instance: ComponentId) -> Phase {
        self.inner
            .slots
            .borrow()
            .get(&instance)
            .map_or(Phase::Idle, |s| s.phase)
    }

    /// Number of acknowledged-or-failed commits for `instance`.
    #[must_use]
    pub fn sequence(&self, instance: ComponentId) -> u64 {
        self.inner
            .slots
            .borrow()
            .get(&instance)
            .map_or(0, |s| s.sequence)
    }

    /// Drop the slot of a destroyed instance, failing its pending waiters.
    ///
    /// Waiters of an in-flight commit still receive that commit's result.
    pub fn cancel(&self, instance: ComponentId) {
        let slot = self.inner.slots.borrow_mut().remove(&instance);
        let Some(slot) = slot else { return };
        let in_flight = matches!(slot.phase, Phase::Committing { .. });
        let pending = slot.waiters.into_iter().chain(slot.next_waiters);
        let mut failed = 0usize;
        for tx in pending {
            let err = DestroyedInstanceError::new(instance, "request_update");
            let _ = tx.send(Err(err.into()));
            failed += 1;
        }
        tracing::debug!(
            target: "weft.patch",
            %instance,
            failed,
            in_flight,
            "scheduler slot cancelled"
        );
    }
}

impl std::fmt::Debug for PatchScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatchScheduler")
            .field("slots", &self.inner.slots.borrow().len())
            .finish()
    }
}

/// Commit loop for one instance; runs until its slot returns to idle.
async fn drive(inner: Rc<SchedulerInner>, instance: ComponentId) {
    loop {
        let (sequence, waiters) = {
            let mut slots = inner.slots.borrow_mut();
            let Some(slot) = slots.get_mut(&instance) else {
                return;
            };
            slot.phase = Phase::Committing { redirty: false };
            slot.sequence += 1;
            (slot.sequence, std::mem::take(&mut slot.waiters))
        };

        let span = tracing::debug_span!(
            "weft.commit",
            %instance,
            sequence,
            waiters = waiters.len(),
        );
        let result = commit_once(&inner, instance, sequence).instrument(span).await;

        for tx in waiters {
            let _ = tx.send(result.clone().map_err(Error::from));
        }

        let mut slots = inner.slots.borrow_mut();
        let Some(slot) = slots.get_mut(&instance) else {
            return;
        };
        match slot.phase {
            Phase::Committing { redirty: true } => {
                slot.phase = Phase::Dirty;
                slot.waiters = std::mem::take(&mut slot.next_waiters);
            }
            _ => {
                slot.phase = Phase::Idle;
                return;
            }
        }
    }
}

/// Checkpoint `instance` and hand the batch to the renderer.
async fn commit_once(
    inner: &SchedulerInner,
    instance: ComponentId,
    sequence: u64,
) -> Result<CommitAck, PatchCommitError> {
    let start = Instant::now();
    let batch = match inner.source.upgrade() {
        Some(source) => source.checkpoint(instance, sequence),
        None => Err(Error::RuntimeGone),
    };
    let result = match batch {
        Ok(batch) => {
            let mutations = batch.mutations.len();
            tracing::debug!(target: "weft.patch", %instance, sequence, mutations, "commit started");
            inner.renderer.commit(batch).await.map_err(|e| PatchCommitError {
                instance,
                sequence,
                message: e.message,
            })
        }
        Err(err) => Err(PatchCommitError {
            instance,
            sequence,
            message: err.to_string(),
        }),
    };

    let duration_us = start.elapsed().as_micros() as u64;
    match &result {
        Ok(_) => {
            COMMITS_TOTAL.fetch_add(1, Ordering::Relaxed);
            if duration_us / 1000 >= inner.slow_commit_ms {
                tracing::warn!(target: "weft.patch", %instance, sequence, duration_us, "slow commit");
            } else {
                tracing::debug!(target: "weft.patch", %instance, sequence, duration_us, "commit acknowledged");
            }
        }
        Err(err) => {
            COMMIT_FAILURES_TOTAL.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(target: "weft.patch", %instance, sequence, duration_us, error = %err, "commit failed");
        }
    }
    result
}

/// Resolves once the batch holding the caller's mutations is acknowledged.
#[derive(Debug)]
#[must_use = "the update is committed regardless; await it to observe the result"]
pub struct UpdateFuture {
    receiver: oneshot::Receiver<Result<CommitAck>>,
}

impl UpdateFuture {
    /// Take the result if the commit has finished.
    pub fn try_take(&mut self) -> Option<Result<CommitAck>> {
        match self.receiver.try_recv() {
            Ok(result) => result,
            Err(_) => Some(Err(Error::ExecutorShutdown)),
        }
    }
}

impl Future for UpdateFuture {
    type Output = Result<CommitAck>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(Error::ExecutorShutdown)))
    }
}
