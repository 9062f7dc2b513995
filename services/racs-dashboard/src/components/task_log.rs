//! Live task log

use std::sync::Arc;

use crate::cell::TextCell;
use crate::components::state_tag;
use crate::dom::Dom;
use crate::hyperscript::{h, Child};
use crate::log_tail::{lock, TailHandle};

/// Log view of the task `tail` is bound to. The state tag and the `pre`
/// body re-read the tail on every text refresh.
pub fn view<D: Dom>(dom: &D, tail: &TailHandle) -> crate::Result<D::Node> {
    let state = {
        let tail = Arc::clone(tail);
        TextCell::new(move || lock(&tail).task_state().unwrap_or_default().to_string())
    };
    let log = {
        let tail = Arc::clone(tail);
        Child::producer(move || lock(&tail).text().to_string())
    };

    let title = lock(tail)
        .subject()
        .map(|id| format!("Task {}", id))
        .unwrap_or_default();

    h(
        dom,
        "div.task",
        vec![
            Child::node(h(
                dom,
                "p.title.is-5",
                vec![title.into(), " ".into(), Child::node(state_tag::live(dom, state)?)],
            )?),
            Child::node(h(dom, "pre", vec![log])?),
        ],
    )
}
