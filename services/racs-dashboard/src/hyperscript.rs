//! Hyperscript builder
//!
//! [`m`] turns a tag specification, attributes, children and event handlers
//! into a live node of the host document:
//!
//! ```
//! use racs_dashboard::dom::{Dom, MemoryDom};
//! use racs_dashboard::hyperscript::{h, m, Child};
//!
//! let dom = MemoryDom::new();
//! let label = h(&dom, "span.tag", vec!["stable".into()]).unwrap();
//! let row = m(
//!     &dom,
//!     "td.is-narrow",
//!     &[("title", "branch")],
//!     vec![Child::node(label), Child::producer(|| "main".to_string())],
//!     &[],
//! )
//! .unwrap();
//!
//! assert_eq!(dom.classes(&row), vec!["is-narrow"]);
//! assert_eq!(dom.text_content(&row), "stablemain");
//! ```

use crate::cell::TextCell;
use crate::dom::{Dom, Listener};

/// Parsed `name(.class)*` tag specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpec<'a> {
    pub name: &'a str,
    pub classes: Vec<&'a str>,
}

impl<'a> TagSpec<'a> {
    /// Split on `.`: the first segment names the element, the rest are
    /// classes in source order. Segments are not validated here.
    pub fn parse(spec: &'a str) -> Self {
        let mut segments = spec.split('.');
        let name = segments.next().unwrap_or_default();
        Self {
            name,
            classes: segments.collect(),
        }
    }
}

/// One entry of a child list
pub enum Child<N> {
    /// Materializes as an empty text node
    Empty,
    /// Static text
    Text(String),
    /// Text derived from a producer and kept bound to it
    Producer(TextCell),
    /// An existing node, re-parented under the new element
    Node(N),
}

impl<N> Child<N> {
    pub fn node(node: N) -> Self {
        Child::Node(node)
    }

    pub fn producer(f: impl Fn() -> String + 'static) -> Self {
        Child::Producer(TextCell::new(f))
    }
}

impl<N> From<&str> for Child<N> {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl<N> From<String> for Child<N> {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl<N> From<Option<String>> for Child<N> {
    fn from(text: Option<String>) -> Self {
        text.map_or(Child::Empty, Child::Text)
    }
}

impl<N> From<TextCell> for Child<N> {
    fn from(cell: TextCell) -> Self {
        Child::Producer(cell)
    }
}

/// Build one element.
///
/// Host errors (invalid element name, invalid class token, rejected
/// attribute, hierarchy violations) are returned as-is.
pub fn m<D: Dom>(
    dom: &D,
    tag: &str,
    attributes: &[(&str, &str)],
    children: Vec<Child<D::Node>>,
    events: &[(&str, Listener)],
) -> crate::Result<D::Node> {
    let spec = TagSpec::parse(tag);
    let element = dom.create_element(spec.name)?;
    for class in &spec.classes {
        dom.add_class(&element, class)?;
    }

    for (name, value) in attributes {
        dom.set_attribute(&element, name, value)?;
    }

    for child in children {
        let node = match child {
            Child::Empty => dom.create_text_node(""),
            Child::Text(text) => dom.create_text_node(&text),
            Child::Producer(cell) => {
                let node = dom.create_text_node(&cell.read());
                dom.bind_text(&node, cell);
                node
            }
            Child::Node(node) => node,
        };
        dom.append_child(&element, &node)?;
    }

    for (event, listener) in events {
        dom.add_event_listener(&element, event, listener)?;
    }

    Ok(element)
}

/// [`m`] without attributes or events
pub fn h<D: Dom>(dom: &D, tag: &str, children: Vec<Child<D::Node>>) -> crate::Result<D::Node> {
    m(dom, tag, &[], children, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{listener, DomEvent, MemoryDom};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn parse_splits_name_and_classes() {
        let spec = TagSpec::parse("button.button.is-link");
        assert_eq!(spec.name, "button");
        assert_eq!(spec.classes, vec!["button", "is-link"]);

        let bare = TagSpec::parse("pre");
        assert_eq!(bare.name, "pre");
        assert!(bare.classes.is_empty());
    }

    #[test]
    fn parse_keeps_empty_segments() {
        let spec = TagSpec::parse("div..x");
        assert_eq!(spec.classes, vec!["", "x"]);
        assert_eq!(TagSpec::parse("").name, "");
    }

    #[test]
    fn builds_element_with_ordered_classes() {
        let dom = MemoryDom::new();
        let el = h(&dom, "div.column.is-narrow", vec![]).unwrap();

        assert_eq!(dom.tag_name(&el).as_deref(), Some("div"));
        assert_eq!(dom.classes(&el), vec!["column", "is-narrow"]);
    }

    #[test]
    fn sets_attributes_literally() {
        let dom = MemoryDom::new();
        let input = m(
            &dom,
            "input.input",
            &[("name", "url"), ("placeholder", "<git url>")],
            vec![],
            &[],
        )
        .unwrap();

        assert_eq!(dom.attribute(&input, "name").as_deref(), Some("url"));
        assert_eq!(
            dom.attribute(&input, "placeholder").as_deref(),
            Some("<git url>")
        );
    }

    #[test]
    fn materializes_every_child_kind_in_order() {
        let dom = MemoryDom::new();
        let span = h(&dom, "span", vec!["inner".into()]).unwrap();
        let el = h(
            &dom,
            "p",
            vec![
                Child::Empty,
                "static".into(),
                Child::producer(|| "live".to_string()),
                Child::node(span),
                Child::from(None::<String>),
            ],
        )
        .unwrap();

        let children = dom.child_nodes(&el);
        assert_eq!(children.len(), 5);
        assert_eq!(dom.text_content(&children[0]), "");
        assert_eq!(dom.text_content(&children[1]), "static");
        assert_eq!(dom.text_content(&children[2]), "live");
        assert_eq!(children[3], span);
        assert_eq!(dom.text_content(&children[4]), "");
        assert!(dom.text_cell(&children[2]).is_some());
        assert!(dom.text_cell(&children[1]).is_none());
    }

    #[test]
    fn producer_runs_once_at_construction() {
        let dom = MemoryDom::new();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let el = h(
            &dom,
            "pre",
            vec![Child::producer(move || {
                counter.set(counter.get() + 1);
                "log".to_string()
            })],
        )
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(dom.text_content(&el), "log");
    }

    #[test]
    fn node_child_is_reparented() {
        let dom = MemoryDom::new();
        let shared = h(&dom, "i.fas", vec![]).unwrap();
        let first = h(&dom, "span", vec![Child::node(shared)]).unwrap();
        let second = h(&dom, "span", vec![Child::node(shared)]).unwrap();

        assert!(dom.child_nodes(&first).is_empty());
        assert_eq!(dom.child_nodes(&second), vec![shared]);
    }

    #[test]
    fn attaches_event_handlers() {
        let dom = MemoryDom::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let on_change = listener(move |e: &DomEvent| {
            sink.borrow_mut().push(e.value.clone().unwrap_or_default())
        });

        let select = m(&dom, "select", &[], vec![], &[("change", on_change)]).unwrap();
        dom.change(&select, "build").unwrap();

        assert_eq!(*seen.borrow(), vec!["build".to_string()]);
    }

    #[test]
    fn repeated_handler_reference_is_deduplicated() {
        let dom = MemoryDom::new();
        let on_click = listener(|_| {});
        let el = m(
            &dom,
            "button",
            &[],
            vec![],
            &[("click", on_click.clone()), ("click", on_click)],
        )
        .unwrap();

        assert_eq!(dom.listener_count(&el, "click"), 1);
    }

    #[test]
    fn invalid_tags_surface_host_errors() {
        let dom = MemoryDom::new();
        assert!(h(&dom, "", vec![]).is_err());
        assert!(h(&dom, "9lives", vec![]).is_err());
        assert!(h(&dom, "div.", vec![]).is_err());
    }
}
