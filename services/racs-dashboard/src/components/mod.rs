//! Dashboard views
//!
//! Views are plain functions from data to a freshly built subtree. They do
//! no I/O: user interaction is turned into [`Action`]s pushed onto a shared
//! [`ActionQueue`], which the owner of the page drains.

pub mod project_create;
pub mod project_table;
pub mod project_upload;
pub mod sidebar;
pub mod state_tag;
pub mod task_log;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::dom::{listener, Dom, DomEvent};
use crate::hyperscript::{h, m, Child};
use crate::log_tail::TailHandle;
use crate::model::{Project, ProjectForm, Stage};
use crate::routes::Route;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Build { id: u64, stage: Stage },
    CreateProject(ProjectForm),
    /// Upload the file at `path` to project `id`, stored as `name`
    Upload { id: u64, name: String, path: String },
    Navigate(Route),
}

/// Actions raised by view event handlers, oldest first
pub type ActionQueue = Rc<RefCell<VecDeque<Action>>>;

pub fn new_action_queue() -> ActionQueue {
    Rc::new(RefCell::new(VecDeque::new()))
}

pub(crate) fn push(actions: &ActionQueue, action: Action) {
    tracing::debug!("Queued {:?}", action);
    actions.borrow_mut().push_back(action);
}

/// In-page link that also queues a navigation when clicked
pub fn link<D: Dom>(
    dom: &D,
    route: Route,
    children: Vec<Child<D::Node>>,
    actions: &ActionQueue,
) -> crate::Result<D::Node> {
    let href = format!("#!{}", route);
    let queue = Rc::clone(actions);
    let on_click = listener(move |_: &DomEvent| push(&queue, Action::Navigate(route.clone())));
    m(dom, "a", &[("href", href.as_str())], children, &[("click", on_click)])
}

/// Full page for `route`: sidebar on the left, the route's view on the right
pub fn page<D: Dom>(
    dom: &D,
    route: &Route,
    projects: &[Project],
    tail: &TailHandle,
    actions: &ActionQueue,
) -> crate::Result<D::Node> {
    let content = match route {
        Route::Projects => project_table::view(dom, projects, actions)?,
        Route::ProjectCreate => project_create::view(dom, actions)?,
        Route::ProjectUpload { id } => project_upload::view(dom, *id, actions)?,
        Route::Task { .. } => task_log::view(dom, tail)?,
    };

    h(
        dom,
        "div.columns",
        vec![
            Child::node(h(
                dom,
                "div.column.is-narrow",
                vec![Child::node(sidebar::view(dom, actions)?)],
            )?),
            Child::node(h(dom, "div.column", vec![Child::node(content)])?),
        ],
    )
}
