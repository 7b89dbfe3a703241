//! Patch scheduling: coalescing, ordering and failure delivery.

mod common;

use common::{journal, panel, Panel};
use weft_core::config::Configurable;
use weft_core::Error;
use weft_runtime::{CreateOptions, Phase, Runtime, RuntimeConfig};

#[test]
fn requests_before_a_turn_share_one_commit() {
    let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(&rt, "p", &j, CreateOptions::new());

    let mut futures: Vec<_> = (0..5).map(|_| rt.request_update(id).unwrap()).collect();
    assert_eq!(rt.update_phase(id), Phase::Dirty);
    rt.run_until_stalled().unwrap();

    assert_eq!(renderer.commit_count(), 1);
    for f in &mut futures {
        let ack = f.try_take().unwrap().unwrap();
        assert_eq!(ack.sequence, 1);
        assert_eq!(ack.instance, id);
    }
    assert_eq!(rt.update_phase(id), Phase::Idle);
}

#[test]
fn request_during_commit_lands_in_next_batch() {
    let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(&rt, "p", &j, CreateOptions::new());
    renderer.hold_commits(true);

    let mut first = rt.request_update(id).unwrap();
    rt.run_until_stalled().unwrap();
    assert_eq!(rt.update_phase(id), Phase::Committing { redirty: false });
    assert_eq!(renderer.held_count(), 1);

    rt.with_component_mut(id, |p: &mut Panel| p.set_config("title", "second"))
        .unwrap()
        .unwrap();
    let mut second = rt.request_update(id).unwrap();
    assert_eq!(rt.update_phase(id), Phase::Committing { redirty: true });

    // Commit 2 is not taken while commit 1 is unacknowledged.
    rt.run_until_stalled().unwrap();
    assert_eq!(renderer.held_count(), 1);
    assert!(second.try_take().is_none());

    assert!(renderer.release_next());
    rt.run_until_stalled().unwrap();
    assert_eq!(first.try_take().unwrap().unwrap().sequence, 1);
    assert!(second.try_take().is_none());
    assert_eq!(renderer.held_count(), 1);

    assert_eq!(renderer.release_all(), 1);
    rt.run_until_stalled().unwrap();
    assert_eq!(second.try_take().unwrap().unwrap().sequence, 2);
    assert_eq!(renderer.commit_count(), 2);
    assert_eq!(rt.scheduler().sequence(id), 2);

    let batches = renderer.commits_for(id);
    assert!(!batches[1].mutations.is_empty());
}

#[test]
fn commit_failure_reaches_every_waiter() {
    let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(&rt, "p", &j, CreateOptions::new());
    renderer.fail_next_commit("renderer offline");

    let mut futures: Vec<_> = (0..3).map(|_| rt.request_update(id).unwrap()).collect();
    rt.run_until_stalled().unwrap();
    for f in &mut futures {
        match f.try_take().unwrap() {
            Err(Error::PatchCommit(err)) => {
                assert_eq!(err.instance, id);
                assert_eq!(err.message, "renderer offline");
            }
            other => panic!("expected a commit error, got {other:?}"),
        }
    }
    assert_eq!(renderer.commit_count(), 0);

    let mut retry = rt.request_update(id).unwrap();
    rt.run_until_stalled().unwrap();
    assert_eq!(retry.try_take().unwrap().unwrap().sequence, 2);
}

#[test]
fn destroy_fails_pending_updates() {
    let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(&rt, "p", &j, CreateOptions::new());

    let mut pending = rt.request_update(id).unwrap();
    rt.destroy(id).unwrap();
    let err = pending.try_take().unwrap().unwrap_err();
    assert!(err.is_destroyed());

    rt.run_until_stalled().unwrap();
    assert_eq!(renderer.commit_count(), 0);
    assert!(rt.request_update(id).unwrap_err().is_destroyed());
}

#[test]
fn mount_waits_for_first_commit() {
    let (rt, renderer) = Runtime::headless(RuntimeConfig::default());
    let j = journal();
    let id = panel(&rt, "p", &j, CreateOptions::new());

    let mut mounted = rt
        .spawn({
            let rt = rt.clone();
            async move { rt.mount(id).await }
        })
        .unwrap();
    renderer.hold_commits(true);
    rt.run_until_stalled().unwrap();
    assert!(mounted.try_take().is_none());
    assert!(!j.borrow().iter().any(|e| e.starts_with("p:mounted")));

    renderer.release_all();
    rt.run_until_stalled().unwrap();
    mounted.try_take().unwrap().unwrap();
    assert!(j.borrow().contains(&"p:mounted:true".to_owned()));
}
