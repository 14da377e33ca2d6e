//! Test: debounce, last-write-wins and teardown through a session
//!
//! All tests run on paused time, so sleeps advance the clock instantly.

use crate::helpers::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use toolpipe::execution::{ExecutionEngine, PipelineSession, ReactiveScheduler, SchedulerError};

const DEBOUNCE: Duration = Duration::from_millis(300);

async fn session_with(transforms: &[&str]) -> (PipelineSession, Recorder) {
    let (engine, recorder) = test_engine();
    let session = PipelineSession::new(Arc::new(engine), DEBOUNCE);
    for id in transforms {
        session.add_node(id, None).await.unwrap().unwrap();
    }
    (session, recorder)
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_runs_once() {
    let (session, recorder) = session_with(&["recorder", "uppercase"]).await;

    for text in ["h", "he", "hel", "hell", "hello"] {
        session.set_input(text).await.unwrap();
        wait(50).await;
    }
    wait(400).await;

    assert_eq!(recorder.inputs(), vec!["hello"]);
    let latest = session.latest().unwrap();
    assert_eq!(latest.trace.final_output, "HELLO");
}

#[tokio::test(start_paused = true)]
async fn test_nothing_publishes_inside_window() {
    let (session, recorder) = session_with(&["recorder"]).await;

    session.set_input("quiet").await.unwrap();
    wait(250).await;

    assert!(session.latest().is_none());
    assert!(recorder.inputs().is_empty());

    wait(100).await;
    assert_eq!(session.latest().unwrap().trace.final_output, "quiet");
}

#[tokio::test(start_paused = true)]
async fn test_slow_older_run_never_overwrites_newer() {
    let (session, _) = session_with(&["slow-upper"]).await;
    let mut rx = session.subscribe().unwrap();

    // A starts running and blocks inside the transform
    session.set_input("slow a").await.unwrap();
    wait(350).await;
    assert!(session.latest().is_none());

    // B starts later and finishes first
    session.set_input("fast b").await.unwrap();
    wait(350).await;
    let newer = session.latest().unwrap();
    assert_eq!(newer.trace.final_output, "FAST B");

    // A completes well after B; its trace is discarded
    rx.borrow_and_update();
    wait(10_000).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(session.latest().unwrap(), newer);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_discards_in_flight_run() {
    let (session, _) = session_with(&["slow-upper"]).await;

    session.set_input("slow run").await.unwrap();
    wait(350).await;

    session.teardown().await;
    wait(10_000).await;

    assert!(session.latest().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_pending_debounce() {
    let (session, recorder) = session_with(&["recorder"]).await;

    session.set_input("never").await.unwrap();
    session.teardown().await;
    wait(1_000).await;

    assert!(recorder.inputs().is_empty());
    assert!(session.latest().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_session_rejects_use_after_teardown() {
    let (session, _) = session_with(&["uppercase"]).await;
    session.teardown().await;

    assert_eq!(session.set_input("x").await, Err(SchedulerError::TornDown));
    assert_eq!(session.add_node("uppercase", None).await, Err(SchedulerError::TornDown));
    assert!(session.snapshot().await.is_err());
    assert!(session.subscribe().is_err());
    assert!(session.flush().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_flush_publishes_without_waiting() {
    let (session, _) = session_with(&["base64-encode"]).await;

    session.set_input("hello").await.unwrap();
    let published = session.flush().await.unwrap().unwrap();

    assert_eq!(published.trace.final_output, "aGVsbG8=");
    assert_eq!(session.latest().unwrap(), published);

    // the debounced run for the same edit is now stale
    wait(1_000).await;
    assert_eq!(session.latest().unwrap(), published);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_run_is_cancelled() {
    let (session, recorder) = session_with(&["slow-upper", "recorder"]).await;

    session.set_input("slow first").await.unwrap();
    wait(350).await;

    session.set_input("second").await.unwrap();
    wait(10_000).await;

    // the first run never got past its slow node
    assert_eq!(recorder.inputs(), vec!["SECOND"]);
    assert_eq!(session.latest().unwrap().trace.final_output, "SECOND");
}

#[tokio::test(start_paused = true)]
async fn test_structural_edit_during_run_does_not_leak_into_it() {
    let (engine, recorder) = test_engine();
    let (model, ids) = chain(&engine, "slow first", &["slow-upper", "recorder"]);
    let model = Arc::new(RwLock::new(model));
    let scheduler = ReactiveScheduler::new(Arc::new(engine), model.clone(), DEBOUNCE);

    scheduler.notify_changed().unwrap();
    wait(350).await;

    // the run is inside the slow node and holds no lock on the model
    let mut editing = tokio::time::timeout(Duration::from_millis(10), model.write())
        .await
        .expect("model locked by the running chain");
    assert!(editing.remove_node(&ids[1]));
    drop(editing);

    wait(10_000).await;

    let published = scheduler.latest().unwrap();
    assert_eq!(published.trace.results.len(), 2);
    assert_eq!(published.trace.results[1].node_id, ids[1]);
    assert_eq!(recorder.inputs(), vec!["SLOW FIRST"]);
    assert_eq!(model.read().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_running_transform() {
    let recorder = Recorder::default();
    let spinner = Spinner::default();
    let engine = ExecutionEngine::new(test_registry_with(&recorder, &spinner));
    let session = PipelineSession::new(Arc::new(engine), DEBOUNCE);
    session.add_node("spinner", None).await.unwrap().unwrap();

    session.set_input("spin").await.unwrap();
    wait(350).await;
    assert!(spinner.ticks() > 0);

    session.teardown().await;
    drop(session);
    tokio::task::yield_now().await;

    let ticks = spinner.ticks();
    wait(10_000).await;
    assert_eq!(spinner.ticks(), ticks);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_input_publishes_again() {
    let (session, _) = session_with(&["uppercase"]).await;
    let mut rx = session.subscribe().unwrap();

    session.set_input("same").await.unwrap();
    wait(400).await;
    let first = rx.borrow_and_update().clone().unwrap();

    session.set_input("same").await.unwrap();
    wait(400).await;
    assert!(rx.has_changed().unwrap());
    let second = rx.borrow_and_update().clone().unwrap();

    assert!(second.generation > first.generation);
    assert_eq!(second.trace.final_output, first.trace.final_output);
}
