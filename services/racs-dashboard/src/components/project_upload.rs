//! Artifact upload form

use std::rc::Rc;

use crate::components::project_create::submit_button;
use crate::components::{push, Action, ActionQueue};
use crate::dom::{listener, Dom, DomEvent};
use crate::hyperscript::{h, m, Child};

/// Last component of a path as reported by a file input
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Upload form for project `id`. Choosing a file copies its name into the
/// filename label and the (editable) target name input.
pub fn view<D: Dom>(dom: &D, id: u64, actions: &ActionQueue) -> crate::Result<D::Node> {
    let id_value = id.to_string();
    let hidden = m(
        dom,
        "input",
        &[("type", "hidden"), ("name", "id"), ("value", id_value.as_str())],
        vec![],
        &[],
    )?;

    let filename = h(dom, "span.file-name", vec![Child::Empty])?;
    let upload_name = m(dom, "input.input", &[("name", "name")], vec![], &[])?;

    let on_file = {
        let dom = dom.clone();
        let filename = filename.clone();
        let upload_name = upload_name.clone();
        listener(move |e: &DomEvent| {
            let chosen = file_name(e.value.as_deref().unwrap_or_default());
            let shown = dom
                .first_child(&filename)
                .map_or(Ok(()), |text| dom.set_text(&text, chosen));
            let named = shown.and_then(|()| dom.set_attribute(&upload_name, "value", chosen));
            if let Err(err) = named {
                tracing::warn!("Failed to show chosen file: {}", err);
            }
        })
    };
    let file_input = m(
        dom,
        "input.file-input",
        &[("type", "file"), ("name", "file")],
        vec![],
        &[("change", on_file)],
    )?;

    let cta = h(
        dom,
        "span.file-cta",
        vec![
            Child::node(h(
                dom,
                "span.file-icon",
                vec![Child::node(h(dom, "i.fas.fa-upload", vec![])?)],
            )?),
            Child::node(h(dom, "span.file-label", vec!["Choose a file…".into()])?),
        ],
    )?;
    let chooser = h(
        dom,
        "div.field",
        vec![Child::node(h(
            dom,
            "div.file.has-name",
            vec![Child::node(h(
                dom,
                "label.file-label",
                vec![Child::node(file_input), Child::node(cta), Child::node(filename)],
            )?)],
        )?)],
    )?;
    let name_field = h(
        dom,
        "div.field",
        vec![
            Child::node(h(dom, "label.label", vec!["Name".into()])?),
            Child::node(h(dom, "div.control", vec![Child::node(upload_name)])?),
        ],
    )?;

    let queue = Rc::clone(actions);
    let on_submit = listener(move |e: &DomEvent| {
        let path = e.field("file").unwrap_or_default();
        if path.is_empty() {
            tracing::warn!("No file chosen for upload to project {}", id);
            return;
        }
        let name = match e.field("name") {
            Some(name) if !name.is_empty() => name,
            _ => file_name(path),
        };
        push(
            &queue,
            Action::Upload {
                id,
                name: name.to_string(),
                path: path.to_string(),
            },
        );
    });

    m(
        dom,
        "form",
        &[],
        vec![
            Child::node(hidden),
            Child::node(chooser),
            Child::node(name_field),
            Child::node(submit_button(dom, "Upload")?),
        ],
        &[("submit", on_submit)],
    )
}
