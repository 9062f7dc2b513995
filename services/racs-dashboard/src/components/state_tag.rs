//! Colored tag for a project or task state

use crate::cell::{self, TextCell};
use crate::dom::Dom;
use crate::hyperscript::{h, Child};
use crate::model::{is_error_state, is_success_state};

/// Bulma color modifier for a state name
pub fn color_class(state: &str) -> &'static str {
    if is_success_state(state) {
        "is-success"
    } else if is_error_state(state) {
        "is-danger"
    } else if state.is_empty() || state == "NONE" {
        "is-light"
    } else {
        "is-info"
    }
}

/// Tag showing `state`, green for success, red for errors, blue while busy
pub fn view<D: Dom>(dom: &D, state: &str) -> crate::Result<D::Node> {
    let tag = h(dom, "span.tag", vec![state.into()])?;
    dom.add_class(&tag, color_class(state))?;
    Ok(tag)
}

/// Tag whose text and color follow `cell` on every refresh
pub fn live<D: Dom>(dom: &D, cell: TextCell) -> crate::Result<D::Node> {
    let tag = h(dom, "span.tag", vec![Child::from(cell.clone())])?;
    let color = TextCell::new(move || color_class(&cell.read()).to_string());
    cell::bind_class(dom, &tag, color)?;
    Ok(tag)
}
