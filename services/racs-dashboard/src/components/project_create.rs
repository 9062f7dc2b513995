//! Project creation form

use std::rc::Rc;

use crate::components::{push, Action, ActionQueue};
use crate::dom::{listener, Dom, DomEvent};
use crate::hyperscript::{h, m, Child};
use crate::model::ProjectForm;

const FIELDS: [(&str, &str, &str); 4] = [
    ("Name", "name", "my-service"),
    ("URL", "url", "https://git.example.org/my-service.git"),
    ("Branch", "branch", "master"),
    ("Labels", "labels", ""),
];

pub fn view<D: Dom>(dom: &D, actions: &ActionQueue) -> crate::Result<D::Node> {
    let mut children = Vec::with_capacity(FIELDS.len() + 1);
    for (label, name, placeholder) in FIELDS {
        let input = m(
            dom,
            "input.input",
            &[("name", name), ("placeholder", placeholder)],
            vec![],
            &[],
        )?;
        children.push(Child::node(h(
            dom,
            "div.field",
            vec![
                Child::node(h(dom, "label.label", vec![label.into()])?),
                Child::node(h(dom, "div.control", vec![Child::node(input)])?),
            ],
        )?));
    }
    children.push(Child::node(submit_button(dom, "Create")?));

    let queue = Rc::clone(actions);
    let on_submit = listener(move |e: &DomEvent| {
        let form = ProjectForm::from_fields(&e.form);
        if form.name.is_empty() || form.url.is_empty() {
            tracing::warn!("Project name and URL are required");
            return;
        }
        push(&queue, Action::CreateProject(form));
    });

    m(dom, "form", &[], children, &[("submit", on_submit)])
}

pub(crate) fn submit_button<D: Dom>(dom: &D, label: &str) -> crate::Result<D::Node> {
    let button = m(
        dom,
        "button.button.is-link",
        &[("type", "submit")],
        vec![label.into()],
        &[],
    )?;
    h(
        dom,
        "div.field",
        vec![Child::node(h(dom, "div.control", vec![Child::node(button)])?)],
    )
}
