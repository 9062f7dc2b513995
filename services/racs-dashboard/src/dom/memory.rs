//! In-memory document (arena-based allocation)

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{Dom, DomEvent, Listener};
use crate::cell::TextCell;
use crate::DashboardError;

/// Handle to a node owned by a [`MemoryDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

enum NodeKind {
    Element(ElementData),
    Text { data: String, cell: Option<TextCell> },
}

struct ElementData {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    listeners: Vec<(String, Listener)>,
    class_cell: Option<TextCell>,
}

struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn node(&self, id: NodeId) -> crate::Result<&NodeData> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| DashboardError::Dom(format!("NotFoundError: no node {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> crate::Result<&mut NodeData> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| DashboardError::Dom(format!("NotFoundError: no node {}", id.0)))
    }

    fn element_mut(&mut self, id: NodeId) -> crate::Result<&mut ElementData> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text { .. } => Err(DashboardError::Dom(format!(
                "node {} is not an element",
                id.0
            ))),
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(node.0).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, child: NodeId) -> crate::Result<()> {
        if let Some(parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(parent)?.children.retain(|c| *c != child);
        }
        Ok(())
    }

    /// Checks shared by append/insert/replace before anything is mutated
    fn check_insert(&self, parent: NodeId, child: NodeId) -> crate::Result<()> {
        if matches!(self.node(parent)?.kind, NodeKind::Text { .. }) {
            return Err(DashboardError::Dom(
                "HierarchyRequestError: text nodes cannot have children".to_string(),
            ));
        }
        self.node(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DashboardError::Dom(
                "HierarchyRequestError: node would become its own ancestor".to_string(),
            ));
        }
        Ok(())
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.kind {
            NodeKind::Text { data, .. } => out.push_str(data),
            NodeKind::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

/// Arena document with browser-like tree semantics
///
/// Cloning yields another handle to the same document. Nodes are never freed;
/// a removed subtree simply has no parent.
#[derive(Clone, Default)]
pub struct MemoryDom {
    arena: Rc<RefCell<Arena>>,
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.arena.borrow().nodes.len())
            .finish()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created in this document
    pub fn len(&self) -> usize {
        self.arena.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners registered on `node` for `event`
    pub fn listener_count(&self, node: &NodeId, event: &str) -> usize {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => element
                .listeners
                .iter()
                .filter(|(name, _)| name == event)
                .count(),
            _ => 0,
        }
    }

    /// Deliver `event` to the listeners registered on `node` for its kind.
    ///
    /// Listeners are snapshotted first so a handler may add or remove
    /// listeners or restructure the tree while the event is in flight.
    pub fn dispatch(&self, node: &NodeId, event: &DomEvent) -> usize {
        let listeners: Vec<Listener> = {
            let arena = self.arena.borrow();
            match arena.nodes.get(node.0).map(|n| &n.kind) {
                Some(NodeKind::Element(element)) => element
                    .listeners
                    .iter()
                    .filter(|(name, _)| *name == event.kind)
                    .map(|(_, l)| Rc::clone(l))
                    .collect(),
                _ => Vec::new(),
            }
        };
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    /// Set the `value` attribute of a form control and fire `change` on it
    pub fn change(&self, node: &NodeId, value: &str) -> crate::Result<usize> {
        self.set_attribute(node, "value", value)?;
        Ok(self.dispatch(node, &DomEvent::new("change").with_value(value)))
    }

    /// Fire `submit` on a form, carrying every named `input`/`select` below it
    pub fn submit(&self, form: &NodeId) -> usize {
        let mut fields = Vec::new();
        self.collect_fields(form, &mut fields);
        self.dispatch(form, &DomEvent::new("submit").with_form(fields))
    }

    fn collect_fields(&self, node: &NodeId, out: &mut Vec<(String, String)>) {
        if matches!(self.tag_name(node).as_deref(), Some("input" | "select")) {
            if let Some(name) = self.attribute(node, "name") {
                out.push((name, self.attribute(node, "value").unwrap_or_default()));
            }
        }
        for child in self.child_nodes(node) {
            self.collect_fields(&child, out);
        }
    }

    fn push(&self, kind: NodeKind) -> NodeId {
        let mut arena = self.arena.borrow_mut();
        let id = NodeId(arena.nodes.len());
        arena.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }
}

fn is_valid_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        }
        _ => false,
    }
}

fn check_token(class: &str) -> crate::Result<()> {
    if class.is_empty() {
        return Err(DashboardError::Dom(
            "SyntaxError: class token is empty".to_string(),
        ));
    }
    if class.chars().any(char::is_whitespace) {
        return Err(DashboardError::Dom(format!(
            "InvalidCharacterError: class token {:?} contains whitespace",
            class
        )));
    }
    Ok(())
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> crate::Result<NodeId> {
        if !is_valid_element_name(tag) {
            return Err(DashboardError::Dom(format!(
                "InvalidCharacterError: {:?} is not a valid element name",
                tag
            )));
        }
        Ok(self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attributes: Vec::new(),
            listeners: Vec::new(),
            class_cell: None,
        })))
    }

    fn create_text_node(&self, text: &str) -> NodeId {
        self.push(NodeKind::Text {
            data: text.to_string(),
            cell: None,
        })
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => Some(element.tag.clone()),
            _ => None,
        }
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> crate::Result<()> {
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '=') {
            return Err(DashboardError::Dom(format!(
                "InvalidCharacterError: {:?} is not a valid attribute name",
                name
            )));
        }
        let mut arena = self.arena.borrow_mut();
        let element = arena.element_mut(*node)?;
        match element.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => element
                .attributes
                .push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => element
                .attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn add_class(&self, node: &NodeId, class: &str) -> crate::Result<()> {
        check_token(class)?;
        let mut arena = self.arena.borrow_mut();
        let element = arena.element_mut(*node)?;
        if !element.classes.iter().any(|c| c == class) {
            element.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> crate::Result<()> {
        check_token(class)?;
        let mut arena = self.arena.borrow_mut();
        arena.element_mut(*node)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn toggle_class(&self, node: &NodeId, class: &str) -> crate::Result<bool> {
        check_token(class)?;
        let mut arena = self.arena.borrow_mut();
        let element = arena.element_mut(*node)?;
        if element.classes.iter().any(|c| c == class) {
            element.classes.retain(|c| c != class);
            Ok(false)
        } else {
            element.classes.push(class.to_string());
            Ok(true)
        }
    }

    fn classes(&self, node: &NodeId) -> Vec<String> {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => element.classes.clone(),
            _ => Vec::new(),
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.arena.borrow().nodes.get(node.0).and_then(|n| n.parent)
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.arena
            .borrow()
            .nodes
            .get(node.0)
            .and_then(|n| n.children.first().copied())
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let arena = self.arena.borrow();
        let parent = arena.nodes.get(node.0)?.parent?;
        let siblings = &arena.nodes.get(parent.0)?.children;
        let index = siblings.iter().position(|c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.arena
            .borrow()
            .nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> crate::Result<()> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> crate::Result<()> {
        let mut arena = self.arena.borrow_mut();
        arena.check_insert(*parent, *child)?;
        if let Some(reference) = reference {
            if arena.node(*reference)?.parent != Some(*parent) {
                return Err(DashboardError::Dom(
                    "NotFoundError: reference node is not a child of parent".to_string(),
                ));
            }
        }

        // Inserting a node before itself means inserting before its next sibling.
        let reference = match reference {
            Some(r) if r == child => {
                let siblings = &arena.node(*parent)?.children;
                siblings
                    .iter()
                    .position(|c| c == child)
                    .and_then(|i| siblings.get(i + 1).copied())
            }
            other => other.copied(),
        };

        arena.detach(*child)?;
        let children = &mut arena.node_mut(*parent)?.children;
        let index = reference
            .and_then(|r| children.iter().position(|c| *c == r))
            .unwrap_or(children.len());
        children.insert(index, *child);
        arena.node_mut(*child)?.parent = Some(*parent);
        Ok(())
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> crate::Result<()> {
        let mut arena = self.arena.borrow_mut();
        if arena.node(*child)?.parent != Some(*parent) {
            return Err(DashboardError::Dom(
                "NotFoundError: node is not a child of parent".to_string(),
            ));
        }
        arena.detach(*child)
    }

    fn replace_child(
        &self,
        parent: &NodeId,
        new_child: &NodeId,
        old_child: &NodeId,
    ) -> crate::Result<()> {
        let mut arena = self.arena.borrow_mut();
        if arena.node(*old_child)?.parent != Some(*parent) {
            return Err(DashboardError::Dom(
                "NotFoundError: replaced node is not a child of parent".to_string(),
            ));
        }
        if new_child == old_child {
            return Ok(());
        }
        arena.check_insert(*parent, *new_child)?;

        arena.detach(*new_child)?;
        let children = &mut arena.node_mut(*parent)?.children;
        let index = children
            .iter()
            .position(|c| c == old_child)
            .ok_or_else(|| DashboardError::Dom("NotFoundError: lost old child".to_string()))?;
        children[index] = *new_child;
        arena.node_mut(*new_child)?.parent = Some(*parent);
        arena.node_mut(*old_child)?.parent = None;
        Ok(())
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().collect_text(*node, &mut out);
        out
    }

    fn set_text(&self, node: &NodeId, text: &str) -> crate::Result<()> {
        let mut arena = self.arena.borrow_mut();
        match &mut arena.node_mut(*node)?.kind {
            NodeKind::Text { data, .. } => {
                *data = text.to_string();
                Ok(())
            }
            NodeKind::Element(_) => Err(DashboardError::Dom(format!(
                "node {} is not a text node",
                node.0
            ))),
        }
    }

    fn add_event_listener(
        &self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()> {
        let mut arena = self.arena.borrow_mut();
        let element = arena.element_mut(*node)?;
        let duplicate = element
            .listeners
            .iter()
            .any(|(name, l)| name == event && Rc::ptr_eq(l, listener));
        if !duplicate {
            element
                .listeners
                .push((event.to_string(), Rc::clone(listener)));
        }
        Ok(())
    }

    fn remove_event_listener(
        &self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> crate::Result<()> {
        // Pull the listener out before dropping it: it may own the last
        // handle to this document.
        let removed: Vec<(String, Listener)> = {
            let mut arena = self.arena.borrow_mut();
            let element = arena.element_mut(*node)?;
            let (removed, kept) = std::mem::take(&mut element.listeners)
                .into_iter()
                .partition(|(name, l)| name == event && Rc::ptr_eq(l, listener));
            element.listeners = kept;
            removed
        };
        drop(removed);
        Ok(())
    }

    fn bind_text(&self, node: &NodeId, cell: TextCell) {
        let mut arena = self.arena.borrow_mut();
        if let Some(NodeKind::Text { cell: slot, .. }) =
            arena.nodes.get_mut(node.0).map(|n| &mut n.kind)
        {
            *slot = Some(cell);
        }
    }

    fn text_cell(&self, node: &NodeId) -> Option<TextCell> {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Text { cell, .. }) => cell.clone(),
            _ => None,
        }
    }

    fn bind_class(&self, node: &NodeId, cell: TextCell) {
        let mut arena = self.arena.borrow_mut();
        if let Ok(element) = arena.element_mut(*node) {
            element.class_cell = Some(cell);
        }
    }

    fn class_cell(&self, node: &NodeId) -> Option<TextCell> {
        let arena = self.arena.borrow();
        match arena.nodes.get(node.0).map(|n| &n.kind) {
            Some(NodeKind::Element(element)) => element.class_cell.clone(),
            _ => None,
        }
    }
}
