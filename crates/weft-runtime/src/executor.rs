#![forbid(unsafe_code)]

//! Cooperative single-threaded executor.
//!
//! Everything asynchronous in weft (patch commits, renderer measurements,
//! mount-time scrolling) runs as a local task on one [`Executor`]. Nothing
//! is polled until the embedder gives the executor a turn with
//! [`Executor::run_until_stalled`], which is what makes "the next
//! scheduling turn" a well-defined point.

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use weft_core::{Error, Result};

/// Foreground executor backed by a [`LocalPool`].
pub struct Executor {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl Executor {
    #[must_use]
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
        }
    }

    /// A cloneable spawner for code that cannot borrow the executor.
    #[must_use]
    pub fn spawner(&self) -> LocalSpawner {
        self.spawner.clone()
    }

    /// Spawn `future`; its output is delivered through the returned [`Task`].
    pub fn spawn<R: 'static>(&self, future: impl Future<Output = R> + 'static) -> Result<Task<R>> {
        spawn_on(&self.spawner, future)
    }

    /// Poll every ready task until none can make progress.
    ///
    /// Fails with [`Error::Busy`] when called from inside a running task.
    pub fn run_until_stalled(&self) -> Result<()> {
        let mut pool = self.pool.try_borrow_mut().map_err(|_| Error::Busy {
            instance: "executor".into(),
            operation: "run_until_stalled".into(),
        })?;
        pool.run_until_stalled();
        Ok(())
    }

    /// Drive the pool until `future` completes.
    ///
    /// Blocks the thread if `future` waits on something no task will
    /// produce, e.g. a held commit nobody releases.
    pub fn run_until<F: Future>(&self, future: F) -> Result<F::Output> {
        let mut pool = self.pool.try_borrow_mut().map_err(|_| Error::Busy {
            instance: "executor".into(),
            operation: "run_until".into(),
        })?;
        Ok(pool.run_until(future))
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

/// Spawn onto `spawner`, wiring the output through a oneshot channel.
pub fn spawn_on<R: 'static>(
    spawner: &LocalSpawner,
    future: impl Future<Output = R> + 'static,
) -> Result<Task<R>> {
    let (sender, receiver) = oneshot::channel();
    spawner
        .spawn_local(async move {
            let result = future.await;
            let _ = sender.send(result);
        })
        .map_err(|_| Error::ExecutorShutdown)?;
    Ok(Task { receiver })
}

/// Handle to a spawned task's output.
///
/// Awaiting it yields `Err(Error::ExecutorShutdown)` if the task was dropped
/// before finishing. Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct Task<R> {
    receiver: oneshot::Receiver<R>,
}

impl<R> Task<R> {
    /// Take the output if the task has finished.
    pub fn try_take(&mut self) -> Option<R> {
        self.receiver.try_recv().ok().flatten()
    }
}

impl<R> Future for Task<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|r| r.map_err(|_| Error::ExecutorShutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_wait_for_a_turn() {
        let executor = Executor::new();
        let mut task = executor.spawn(async { 11 }).unwrap();
        assert_eq!(task.try_take(), None);
        executor.run_until_stalled().unwrap();
        assert_eq!(task.try_take(), Some(11));
    }

    #[test]
    fn run_until_drives_spawned_work() {
        let executor = Executor::new();
        let task = executor.spawn(async { 2 + 3 }).unwrap();
        assert_eq!(executor.run_until(task).unwrap().unwrap(), 5);
    }
}
