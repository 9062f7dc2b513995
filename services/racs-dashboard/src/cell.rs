//! Text cells: text nodes that re-derive their content on demand
//!
//! A [`TextCell`] wraps a zero-argument producer. Nothing re-runs it
//! automatically; a render pass calls [`refresh`] to re-poll every cell under
//! a root and rewrite only the nodes whose value changed. A cell bound to an
//! element with [`bind_class`] drives one of its classes instead of text.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dom::Dom;

/// Attribute recording the class a class cell last applied to its element
pub const BOUND_CLASS_ATTRIBUTE: &str = "data-bound-class";

struct Inner {
    producer: Box<dyn Fn() -> String>,
    last: RefCell<String>,
}

/// A text-producing cell bound to one or more text nodes
#[derive(Clone)]
pub struct TextCell {
    inner: Rc<Inner>,
}

impl fmt::Debug for TextCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextCell")
            .field("last", &*self.inner.last.borrow())
            .finish()
    }
}

impl TextCell {
    /// Wrap a producer. It is not invoked until the cell is first read.
    pub fn new(producer: impl Fn() -> String + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                producer: Box::new(producer),
                last: RefCell::new(String::new()),
            }),
        }
    }

    /// Invoke the producer and remember its value
    pub fn read(&self) -> String {
        let value = (self.inner.producer)();
        *self.inner.last.borrow_mut() = value.clone();
        value
    }

    /// Last value produced, without invoking the producer
    pub fn last(&self) -> String {
        self.inner.last.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &TextCell) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Apply `cell`'s current value as a class of `element` and keep it bound
/// so [`refresh`] swaps the class when the value changes. An empty value
/// applies no class.
pub fn bind_class<D: Dom>(dom: &D, element: &D::Node, cell: TextCell) -> crate::Result<()> {
    apply_class(dom, element, &cell.read())?;
    dom.bind_class(element, cell);
    Ok(())
}

/// Returns whether the element's class changed
fn apply_class<D: Dom>(dom: &D, element: &D::Node, class: &str) -> crate::Result<bool> {
    let applied = dom
        .attribute(element, BOUND_CLASS_ATTRIBUTE)
        .unwrap_or_default();
    if applied == class {
        return Ok(false);
    }
    if !applied.is_empty() {
        dom.remove_class(element, &applied)?;
    }
    if !class.is_empty() {
        dom.add_class(element, class)?;
    }
    dom.set_attribute(element, BOUND_CLASS_ATTRIBUTE, class)?;
    Ok(true)
}

/// Re-poll every cell bound below `root` (inclusive) and update the nodes
/// whose text or bound class no longer matches. Each node is compared
/// against its own content, so a cell may back any number of nodes. Returns
/// the number of nodes rewritten.
pub fn refresh<D: Dom>(dom: &D, root: &D::Node) -> crate::Result<usize> {
    let mut updated = 0;
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if let Some(cell) = dom.text_cell(&node) {
            let text = cell.read();
            if dom.text_content(&node) != text {
                dom.set_text(&node, &text)?;
                updated += 1;
            }
        }
        if let Some(cell) = dom.class_cell(&node) {
            if apply_class(dom, &node, &cell.read())? {
                updated += 1;
            }
        }
        stack.extend(dom.child_nodes(&node));
    }
    if updated > 0 {
        tracing::trace!("Refreshed {} bound text node(s)", updated);
    }
    Ok(updated)
}
