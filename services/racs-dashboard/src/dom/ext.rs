//! Lifecycle helpers available on every host document

use std::cell::RefCell;
use std::rc::Rc;

use super::{Dom, DomEvent, Listener};

/// Standard and WebKit-prefixed transition-end notifications
pub const TRANSITION_END_EVENTS: [&str; 2] = ["webkitTransitionEnd", "transitionend"];

/// Convenience operations built from [`Dom`] primitives
pub trait DomExt: Dom {
    /// Detach `node` from its parent, if it has one
    fn remove_self(&self, node: &Self::Node) -> crate::Result<()> {
        match self.parent(node) {
            Some(parent) => self.remove_child(&parent, node),
            None => Ok(()),
        }
    }

    /// Put `other` where `node` currently is; no-op for detached nodes
    fn replace_with(&self, node: &Self::Node, other: &Self::Node) -> crate::Result<()> {
        match self.parent(node) {
            Some(parent) => self.replace_child(&parent, other, node),
            None => Ok(()),
        }
    }

    fn remove_children(&self, node: &Self::Node) -> crate::Result<()> {
        while let Some(child) = self.first_child(node) {
            self.remove_child(node, &child)?;
        }
        Ok(())
    }

    fn prepend_child(&self, node: &Self::Node, child: &Self::Node) -> crate::Result<()> {
        let first = self.first_child(node);
        self.insert_before(node, child, first.as_ref())
    }

    /// Insert `child` directly after `after`, which must be a child of `node`
    fn insert_after(
        &self,
        node: &Self::Node,
        child: &Self::Node,
        after: &Self::Node,
    ) -> crate::Result<()> {
        if self.parent(after).as_ref() != Some(node) {
            return Err(crate::DashboardError::Dom(
                "NotFoundError: sibling is not a child of node".to_string(),
            ));
        }
        let next = self.next_sibling(after);
        self.insert_before(node, child, next.as_ref())
    }

    /// Detach `node` once its running CSS transition ends.
    ///
    /// Both notification names are watched. The first one to fire removes
    /// the node and unregisters both listeners; later notifications find
    /// nothing to do. Until then the pending listener keeps `node` alive.
    fn remove_after_transition(&self, node: &Self::Node) -> crate::Result<()> {
        let slot: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));

        let dom = self.clone();
        let target = node.clone();
        let pending = Rc::clone(&slot);
        let on_end: Listener = Rc::new(move |_: &DomEvent| {
            let Some(me) = pending.borrow_mut().take() else {
                return;
            };
            for event in TRANSITION_END_EVENTS {
                if let Err(e) = dom.remove_event_listener(&target, event, &me) {
                    tracing::warn!("Failed to drop {} listener: {}", event, e);
                }
            }
            if let Err(e) = dom.remove_self(&target) {
                tracing::warn!("Failed to remove node after transition: {}", e);
            }
        });

        for event in TRANSITION_END_EVENTS {
            self.add_event_listener(node, event, &on_end)?;
        }
        *slot.borrow_mut() = Some(on_end);
        Ok(())
    }
}

impl<D: Dom> DomExt for D {}
