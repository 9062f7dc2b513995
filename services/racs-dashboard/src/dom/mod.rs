//! Host DOM abstraction
//!
//! The builder and views only talk to a [`Dom`] implementation. Two hosts
//! exist: [`MemoryDom`], an arena document used natively and in tests, and
//! `web::WebDom` which forwards to `web-sys` in the browser.

mod ext;
mod memory;

pub use ext::{DomExt, TRANSITION_END_EVENTS};
pub use memory::{MemoryDom, NodeId};

use std::fmt;
use std::rc::Rc;

use crate::cell::TextCell;

/// Event delivered to a [`Listener`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: String,
    /// Current value of the event target for `change`/`input` events
    pub value: Option<String>,
    /// Named form fields for `submit` events
    pub form: Vec<(String, String)>,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = form;
        self
    }

    /// Look up a submitted form field by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Event handler. Identity (`Rc::ptr_eq`) is what hosts deduplicate on.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// Wrap a closure as a [`Listener`]
pub fn listener(f: impl Fn(&DomEvent) + 'static) -> Listener {
    Rc::new(f)
}

/// Primitive operations a host document must provide
///
/// Every fallible primitive reports host failures as
/// [`DashboardError::Dom`](crate::DashboardError::Dom); callers propagate them
/// unchanged.
pub trait Dom: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn create_element(&self, tag: &str) -> crate::Result<Self::Node>;
    fn create_text_node(&self, text: &str) -> Self::Node;

    /// Lower-cased element name, `None` for text nodes
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> crate::Result<()>;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn add_class(&self, node: &Self::Node, class: &str) -> crate::Result<()>;
    fn remove_class(&self, node: &Self::Node, class: &str) -> crate::Result<()>;
    /// Returns whether the class is present afterwards
    fn toggle_class(&self, node: &Self::Node, class: &str) -> crate::Result<bool>;
    fn classes(&self, node: &Self::Node) -> Vec<String>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Append `child`, detaching it from any previous parent first
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> crate::Result<()>;
    /// Insert `child` before `reference`, or append when `reference` is `None`
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> crate::Result<()>;
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> crate::Result<()>;
    fn replace_child(
        &self,
        parent: &Self::Node,
        new_child: &Self::Node,
        old_child: &Self::Node,
    ) -> crate::Result<()>;

    /// Concatenated text of the node and its descendants
    fn text_content(&self, node: &Self::Node) -> String;
    /// Overwrite the data of a text node
    fn set_text(&self, node: &Self::Node, text: &str) -> crate::Result<()>;

    fn add_event_listener(
        &self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()>;
    fn remove_event_listener(
        &self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()>;

    /// Attach a text cell to a text node so a refresh pass can re-derive it
    fn bind_text(&self, node: &Self::Node, cell: TextCell);
    fn text_cell(&self, node: &Self::Node) -> Option<TextCell>;

    /// Attach a class cell to an element; see [`crate::cell::bind_class`]
    fn bind_class(&self, node: &Self::Node, cell: TextCell);
    fn class_cell(&self, node: &Self::Node) -> Option<TextCell>;
}
