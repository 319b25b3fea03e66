// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal element tree implementing [`Host`].
//!
//! [`Tree`] is a generational arena of [`Element`]s under a document root. It
//! keeps, per node, the registry's [`ElementId`] and a subscription list in
//! registration order, which is all [`EventHandler`](crate::EventHandler)
//! needs. It is used as the test fixture of this crate and is small enough to
//! serve as a starting point for a real host.
//!
//! ```
//! use understory_listener::tree::{Element, Tree};
//!
//! let mut tree = Tree::new();
//! let list = tree.insert(Some(tree.document()), Element::new("ul").with_id("menu"));
//! let item = tree.insert(Some(list), Element::new("li").with_class("active"));
//!
//! assert_eq!(tree.parent_of(item), Some(list));
//! assert_eq!(tree.query(tree.document(), ".active"), vec![item]);
//!
//! assert_eq!(tree.remove(list), vec![list, item]);
//! assert!(!tree.is_alive(item));
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use smallvec::SmallVec;
use tracing::debug;

use crate::EventHandler;
use crate::event::Phase;
use crate::host::{ElementId, Host, HostError, ListenerId};
use crate::selector::Selector;

/// Identifier for a node in the tree (generational).
///
/// A removed node's slot may be reused; the generation tells the old handle
/// apart so it reads as not alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Tag, id, classes and attributes of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: Box<str>,
    id: Option<Box<str>>,
    classes: SmallVec<[Box<str>; 2]>,
    attributes: Vec<(Box<str>, Box<str>)>,
}

impl Element {
    /// An element with tag name `tag` and nothing else.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: SmallVec::new(),
            attributes: Vec::new(),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Tag name as given.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The id, if set.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether the element has `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| &**c == class)
    }

    /// Classes in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| &**c)
    }

    /// Value of attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| &**v)
    }

    fn add_class(&mut self, class: &str) {
        if !class.is_empty() && !self.has_class(class) {
            self.classes.push(class.into());
        }
    }

    fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| &**c != class);
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, v)) => *v = value.into(),
            None => self.attributes.push((name.into(), value.into())),
        }
    }
}

#[derive(Clone, Debug)]
struct Subscription {
    kind: Box<str>,
    listener: ListenerId,
    capture: bool,
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
    element_id: Option<ElementId>,
    subscriptions: Vec<Subscription>,
}

/// Element tree with a document root.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    document: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree holding only the document root (`#document`).
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            document: NodeId(0, 1),
        };
        tree.document = tree.insert(None, Element::new("#document"));
        tree
    }

    /// The document root.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Insert `element` as the last child of `parent`, or detached if `None`.
    ///
    /// A stale `parent` also yields a detached node.
    pub fn insert(&mut self, parent: Option<NodeId>, element: Element) -> NodeId {
        let node = |generation| Node {
            generation,
            parent: None,
            children: Vec::new(),
            element,
            element_id: None,
            subscriptions: Vec::new(),
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(node(generation)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "arena slots are addressed with 32-bit indices"
        )]
        let id = NodeId(idx as u32, generation);
        if let Some(p) = parent {
            self.link_parent(id, p);
        }
        id
    }

    /// Remove `id` and its subtree. Returns the removed nodes in pre-order.
    ///
    /// The document root cannot be removed. Listeners registered on the removed
    /// nodes stay in the handler's registry; once a tree is owned by an
    /// [`EventHandler`], remove through [`EventHandler::remove_element`] instead.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.document || !self.is_alive(id) {
            return Vec::new();
        }
        if let Some(parent) = self.parent_of(id) {
            self.unlink_parent(id, parent);
        }
        let removed = self.subtree(id);
        for &n in &removed {
            self.nodes[n.idx()] = None;
            self.free_list.push(n.idx());
        }
        removed
    }

    /// `id` and its descendants in pre-order; empty for stale ids.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if self.is_alive(id) {
            stack.push(id);
        }
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children_of(n).iter().rev().copied());
        }
        out
    }

    /// Move `id` under `new_parent` (or detach it with `None`).
    ///
    /// Returns `false` and changes nothing if either node is stale, if `id`
    /// is the document, or if `new_parent` lies inside `id`'s subtree.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if id == self.document || !self.is_alive(id) {
            return false;
        }
        if let Some(p) = new_parent
            && (!self.is_alive(p) || self.contains(id, p))
        {
            return false;
        }
        if let Some(parent) = self.parent_of(id) {
            self.unlink_parent(id, parent);
        }
        if let Some(p) = new_parent {
            self.link_parent(id, p);
        }
        true
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The parent of a live node, or `None` for roots and stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Get the children of a node, or empty slice if node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// The element data of a live node.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    /// Add `class` to a live node.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(n) = self.node_mut(id) {
            n.element.add_class(class);
        }
    }

    /// Remove `class` from a live node.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(n) = self.node_mut(id) {
            n.element.remove_class(class);
        }
    }

    /// Set an attribute on a live node.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(id) {
            n.element.set_attribute(name, value);
        }
    }

    /// Nodes of `root`'s subtree (inclusive) matching `selector`, in pre-order.
    ///
    /// An unparseable selector matches nothing.
    pub fn query(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.subtree(root)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|e| selector.matches(e)))
            .collect()
    }

    /// Number of host subscriptions on `id`, of every type.
    pub fn subscription_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |n| n.subscriptions.len())
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let Some(p) = self.node_mut(parent) else {
            return;
        };
        p.children.push(id);
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }
}

impl EventHandler<Tree> {
    /// Remove `node` and its subtree from the tree, discarding their listeners first.
    ///
    /// Returns the removed nodes in pre-order, like [`Tree::remove`].
    pub fn remove_element(&mut self, node: NodeId) -> Vec<NodeId> {
        if node == self.host().document() {
            return Vec::new();
        }
        for n in self.host().subtree(node) {
            self.discard(n);
        }
        self.host_mut().remove(node)
    }
}

impl Host for Tree {
    type Node = NodeId;

    fn is_alive(&self, node: NodeId) -> bool {
        Self::is_alive(self, node)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        Self::parent_of(self, node)
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        match Selector::parse(selector) {
            Ok(selector) => selector.matches(element),
            Err(err) => {
                debug!(selector, %err, "selector matches nothing");
                false
            }
        }
    }

    fn element_id(&self, node: NodeId) -> Option<ElementId> {
        self.node(node)?.element_id
    }

    fn set_element_id(&mut self, node: NodeId, id: Option<ElementId>) -> Result<(), HostError> {
        let n = self.node_mut(node).ok_or(HostError::StaleNode)?;
        n.element_id = id;
        Ok(())
    }

    fn subscribe(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: ListenerId,
        capture: bool,
    ) -> Result<(), HostError> {
        let n = self.node_mut(node).ok_or(HostError::StaleNode)?;
        if n.subscriptions.iter().any(|s| s.listener == listener) {
            return Err(HostError::AlreadySubscribed(listener));
        }
        n.subscriptions.push(Subscription {
            kind: kind.into(),
            listener,
            capture,
        });
        Ok(())
    }

    fn unsubscribe(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: ListenerId,
    ) -> Result<(), HostError> {
        let n = self.node_mut(node).ok_or(HostError::StaleNode)?;
        let idx = n
            .subscriptions
            .iter()
            .position(|s| s.listener == listener && &*s.kind == kind)
            .ok_or(HostError::NotSubscribed(listener))?;
        n.subscriptions.remove(idx);
        Ok(())
    }

    fn subscriptions(&self, node: NodeId, kind: &str, phase: Phase) -> Vec<ListenerId> {
        let Some(n) = self.node(node) else {
            return Vec::new();
        };
        let of = |capture: bool| {
            n.subscriptions
                .iter()
                .filter(move |s| s.capture == capture && &*s.kind == kind)
                .map(|s| s.listener)
        };
        match phase {
            Phase::Capture => of(true).collect(),
            Phase::Bubble => of(false).collect(),
            Phase::Target => of(true).chain(of(false)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn insert_links_children_in_order() {
        let mut tree = Tree::new();
        let doc = tree.document();
        let a = tree.insert(Some(doc), Element::new("div"));
        let b = tree.insert(Some(doc), Element::new("div"));
        assert_eq!(tree.children_of(doc), &[a, b]);
        assert_eq!(tree.parent_of(a), Some(doc));
        assert_eq!(tree.parent_of(doc), None);
    }

    #[test]
    fn removed_slots_are_reused_with_a_new_generation() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.document()), Element::new("p"));
        assert_eq!(tree.remove(a), vec![a]);
        let b = tree.insert(Some(tree.document()), Element::new("p"));
        assert_eq!(a.idx(), b.idx());
        assert_ne!(a, b);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(b));
        assert_eq!(tree.children_of(tree.document()), &[b]);
    }

    #[test]
    fn remove_returns_subtree_in_pre_order() {
        let mut tree = Tree::new();
        let root = tree.insert(Some(tree.document()), Element::new("ul"));
        let x = tree.insert(Some(root), Element::new("li"));
        let x1 = tree.insert(Some(x), Element::new("a"));
        let y = tree.insert(Some(root), Element::new("li"));
        assert_eq!(tree.subtree(root), vec![root, x, x1, y]);
        assert_eq!(tree.remove(root), vec![root, x, x1, y]);
        assert!(tree.children_of(tree.document()).is_empty());
        assert!(tree.remove(tree.document()).is_empty());
    }

    #[test]
    fn reparent_refuses_cycles() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.document()), Element::new("div"));
        let b = tree.insert(Some(a), Element::new("div"));
        assert!(!tree.reparent(a, Some(b)));
        assert!(!tree.reparent(a, Some(a)));
        assert_eq!(tree.parent_of(b), Some(a));

        assert!(tree.reparent(b, Some(tree.document())));
        assert_eq!(tree.parent_of(b), Some(tree.document()));
        assert!(tree.children_of(a).is_empty());
    }

    #[test]
    fn class_and_attribute_edits_affect_matching() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.document()), Element::new("div"));
        assert!(!Host::matches(&tree, a, ".open"));
        tree.add_class(a, "open");
        tree.add_class(a, "open");
        assert!(Host::matches(&tree, a, ".open"));
        assert_eq!(tree.element(a).unwrap().classes().count(), 1);
        tree.remove_class(a, "open");
        assert!(!Host::matches(&tree, a, ".open"));

        tree.set_attribute(a, "role", "tab");
        tree.set_attribute(a, "role", "tabpanel");
        assert!(Host::matches(&tree, a, r#"[role="tabpanel"]"#));
        assert!(!Host::matches(&tree, a, "div p"));
    }

    #[test]
    fn subscriptions_are_split_by_phase() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.document()), Element::new("div"));
        let (l0, l1, l2) = (ListenerId(0), ListenerId(1), ListenerId(2));
        tree.subscribe(a, "click", l0, false).unwrap();
        tree.subscribe(a, "click", l1, true).unwrap();
        tree.subscribe(a, "keyup", l2, false).unwrap();
        assert_eq!(
            tree.subscribe(a, "click", l0, false),
            Err(HostError::AlreadySubscribed(l0))
        );

        assert_eq!(tree.subscriptions(a, "click", Phase::Capture), vec![l1]);
        assert_eq!(tree.subscriptions(a, "click", Phase::Bubble), vec![l0]);
        assert_eq!(tree.subscriptions(a, "click", Phase::Target), vec![l1, l0]);

        assert_eq!(
            tree.unsubscribe(a, "keyup", l0),
            Err(HostError::NotSubscribed(l0))
        );
        tree.unsubscribe(a, "click", l0).unwrap();
        assert_eq!(tree.subscription_count(a), 2);
    }

    #[test]
    fn stale_nodes_are_rejected() {
        let mut tree = Tree::new();
        let a = tree.insert(Some(tree.document()), Element::new("div"));
        tree.remove(a);
        assert_eq!(
            tree.subscribe(a, "click", ListenerId(0), false),
            Err(HostError::StaleNode)
        );
        assert_eq!(
            tree.set_element_id(a, Some(ElementId(0))),
            Err(HostError::StaleNode)
        );
        assert!(tree.subscriptions(a, "click", Phase::Target).is_empty());
        assert!(!Host::matches(&tree, a, "*"));
    }
}
