//! Navigation menu

use crate::components::{link, ActionQueue};
use crate::dom::Dom;
use crate::hyperscript::{h, Child};
use crate::routes::Route;

pub fn view<D: Dom>(dom: &D, actions: &ActionQueue) -> crate::Result<D::Node> {
    let list = link(dom, Route::Projects, vec!["List".into()], actions)?;
    let create = link(dom, Route::ProjectCreate, vec!["Create".into()], actions)?;

    h(
        dom,
        "aside.menu",
        vec![
            Child::node(h(dom, "p.menu-label", vec!["Projects".into()])?),
            Child::node(h(
                dom,
                "ul.menu-list",
                vec![
                    Child::node(h(dom, "li", vec![Child::node(list)])?),
                    Child::node(h(dom, "li", vec![Child::node(create)])?),
                ],
            )?),
        ],
    )
}
