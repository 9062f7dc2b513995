//! BDD step definitions for log tailing

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use racs_dashboard::log_tail::{lock, new_tail_handle, FetchRequest, LogChunk};
use racs_dashboard::session::PollingSession;

use super::{offsets, unescape};
use crate::world::{DashboardWorld, ScriptedSource};

/// The outstanding request, or a freshly ticked one
fn next_request(world: &mut DashboardWorld) -> FetchRequest {
    if let Some(request) = world.held.take() {
        return request;
    }
    let request = world.tail.tick().expect("tail issued no request");
    world.requests.push(request.clone());
    request
}

#[given(expr = "a log tail bound to task {string}")]
fn tail_bound(world: &mut DashboardWorld, task: String) {
    let request = world.tail.bind(task);
    world.requests.push(request.clone());
    world.held = Some(request);
}

#[given(expr = "the server answers {string}")]
#[when(expr = "the server answers {string}")]
fn server_answers(world: &mut DashboardWorld, body: String) {
    let request = next_request(world);
    world
        .tail
        .complete(request.seq, Ok::<_, String>(LogChunk::new(unescape(&body))));
}

#[given("a request is in flight")]
fn request_in_flight(world: &mut DashboardWorld) {
    let request = next_request(world);
    world.held = Some(request);
}

#[when("the tail is unbound")]
fn tail_unbound(world: &mut DashboardWorld) {
    world.tail.unbind();
}

#[when(expr = "the in-flight request returns {string}")]
fn in_flight_returns(world: &mut DashboardWorld, body: String) {
    let request = world.held.take().expect("no request in flight");
    world
        .tail
        .complete(request.seq, Ok::<_, String>(LogChunk::new(unescape(&body))));
}

#[when(expr = "the tail is bound to task {string}")]
fn tail_rebound(world: &mut DashboardWorld, task: String) {
    tail_bound(world, task);
}

#[then(expr = "the log text is {string}")]
fn log_text(world: &mut DashboardWorld, text: String) {
    assert_eq!(world.tail.text(), unescape(&text));
}

#[then(expr = "the offset is {int}")]
fn offset_is(world: &mut DashboardWorld, offset: u64) {
    assert_eq!(world.tail.offset(), offset);
}

#[then(expr = "requests were made at offsets {string}")]
fn requests_at(world: &mut DashboardWorld, list: String) {
    let seen: Vec<u64> = world.requests.iter().map(|r| r.offset).collect();
    assert_eq!(seen, offsets(&list));
}

#[then(expr = "the tail is {string}")]
fn tail_state(world: &mut DashboardWorld, state: String) {
    assert_eq!(world.tail.state().to_string(), state);
}

#[then("a tick issues no request")]
fn tick_issues_nothing(world: &mut DashboardWorld) {
    assert!(world.tail.tick().is_none());
}

#[given(expr = "a log source answering {string}, {string}")]
fn source_answering(world: &mut DashboardWorld, first: String, second: String) {
    let first = unescape(&first);
    let second = unescape(&second);
    world.source = Some(Arc::new(ScriptedSource::new(&[&first, &second])));
}

#[when(expr = "a polling session tails task {string} every {int} ms")]
async fn session_tails(world: &mut DashboardWorld, task: String, interval_ms: u64) {
    let source = Arc::clone(world.source.as_ref().expect("no log source"));
    let tail = new_tail_handle();
    world.session = Some(PollingSession::start(
        Arc::clone(&tail),
        &task,
        source,
        Duration::from_millis(interval_ms),
    ));
    world.tail_handle = Some(tail);
}

#[when(expr = "the source has been asked {int} times")]
async fn source_asked(world: &mut DashboardWorld, times: usize) {
    let source = world.source.as_ref().expect("no log source");
    for _ in 0..400 {
        if source.request_count() >= times {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(source.request_count() >= times, "source was not polled");
}

#[when("the session is stopped")]
fn session_stopped(world: &mut DashboardWorld) {
    world.session.take().expect("no session").stop();
}

#[then(expr = "the session log is {string}")]
fn session_log(world: &mut DashboardWorld, text: String) {
    let tail = world.tail_handle.as_ref().expect("no session tail");
    assert_eq!(lock(tail).text(), unescape(&text));
}

#[then(expr = "the source saw offsets {string}")]
fn source_saw(world: &mut DashboardWorld, list: String) {
    let expected = offsets(&list);
    let source = world.source.as_ref().expect("no log source");
    let seen: Vec<u64> = source
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|(_, offset)| *offset)
        .collect();
    assert_eq!(&seen[..expected.len()], expected.as_slice());
}
