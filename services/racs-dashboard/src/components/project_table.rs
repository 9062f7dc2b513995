//! Project overview table

use std::rc::Rc;

use crate::components::{link, push, state_tag, Action, ActionQueue};
use crate::dom::{listener, Dom, DomEvent};
use crate::hyperscript::{h, m, Child};
use crate::model::{Project, Stage, Task};
use crate::routes::Route;

const COLUMNS: [&str; 6] = ["Id", "Name", "State", "Tasks", "Version", "Actions"];

/// Table of all projects with their recent tasks and build controls
pub fn view<D: Dom>(
    dom: &D,
    projects: &[Project],
    actions: &ActionQueue,
) -> crate::Result<D::Node> {
    let header = COLUMNS
        .iter()
        .map(|title| h(dom, "th", vec![(*title).into()]).map(Child::node))
        .collect::<crate::Result<Vec<_>>>()?;

    let rows = projects
        .iter()
        .map(|project| row(dom, project, actions).map(Child::node))
        .collect::<crate::Result<Vec<_>>>()?;

    h(
        dom,
        "table.table.is-fullwidth",
        vec![
            Child::node(h(dom, "thead", vec![Child::node(h(dom, "tr", header)?)])?),
            Child::node(h(dom, "tbody", rows)?),
        ],
    )
}

fn cell<D: Dom>(dom: &D, children: Vec<Child<D::Node>>) -> crate::Result<Child<D::Node>> {
    h(dom, "td", children).map(Child::node)
}

fn row<D: Dom>(dom: &D, project: &Project, actions: &ActionQueue) -> crate::Result<D::Node> {
    let tasks = project
        .tasks
        .iter()
        .map(|task| task_row(dom, task, actions).map(Child::node))
        .collect::<crate::Result<Vec<_>>>()?;

    let upload = link(
        dom,
        Route::ProjectUpload { id: project.id },
        vec!["Upload".into()],
        actions,
    )?;

    h(
        dom,
        "tr",
        vec![
            cell(dom, vec![project.id.to_string().into()])?,
            cell(dom, vec![project.name.as_str().into()])?,
            cell(dom, vec![Child::node(state_tag::view(dom, &project.state)?)])?,
            cell(dom, vec![Child::node(h(dom, "table.table.is-narrow", tasks)?)])?,
            cell(dom, vec![project.version.to_string().into()])?,
            cell(dom, vec![Child::node(upload)])?,
            cell(dom, vec![Child::node(stage_select(dom, project.id, actions)?)])?,
        ],
    )
}

fn task_row<D: Dom>(dom: &D, task: &Task, actions: &ActionQueue) -> crate::Result<D::Node> {
    let id = task.id.to_string();
    let target = link(
        dom,
        Route::Task { id: id.clone() },
        vec![id.into()],
        actions,
    )?;

    h(
        dom,
        "tr",
        vec![
            cell(dom, vec![Child::node(target)])?,
            cell(dom, vec![task.kind.as_str().into()])?,
            cell(dom, vec![Child::node(state_tag::view(dom, &task.state)?)])?,
            cell(dom, vec![task.time.as_str().into()])?,
        ],
    )
}

/// Select whose change event starts a build of project `id` at the chosen
/// stage, then returns to the blank first option so the same stage can be
/// chosen again. The blank option does nothing.
fn stage_select<D: Dom>(dom: &D, id: u64, actions: &ActionQueue) -> crate::Result<D::Node> {
    let mut options = vec![Child::node(m(dom, "option", &[("value", "")], vec![], &[])?)];
    for stage in Stage::ALL {
        options.push(Child::node(m(
            dom,
            "option",
            &[("value", stage.as_str())],
            vec![stage.label().into()],
            &[],
        )?));
    }

    let select = m(dom, "select", &[], options, &[])?;

    let queue = Rc::clone(actions);
    let target = (dom.clone(), select.clone());
    let on_change = listener(move |e: &DomEvent| {
        let Some(value) = e.value.as_deref().filter(|v| !v.is_empty()) else {
            return;
        };
        match value.parse::<Stage>() {
            Ok(stage) => push(&queue, Action::Build { id, stage }),
            Err(err) => tracing::warn!("Ignoring build request for project {}: {}", id, err),
        }
        let (dom, select) = &target;
        if let Err(err) = dom.set_attribute(select, "value", "") {
            tracing::warn!("Failed to reset stage select: {}", err);
        }
    });
    dom.add_event_listener(&select, "change", &on_change)?;

    h(dom, "div.select.is-small", vec![Child::node(select)])
}
