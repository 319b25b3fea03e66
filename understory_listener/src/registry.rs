// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener bookkeeping.
//!
//! Records are grouped per [`ElementId`] and then per event type, in
//! registration order. The per-element type map doubles as the index of types
//! currently registered on that element, which namespace-only removal scans.
//!
//! The registry is pure bookkeeping: removals hand the removed records back so
//! the caller can drop the matching host subscriptions.

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::host::{ElementId, ListenerId};
use crate::name::Namespaces;

/// One registered listener.
#[derive(Clone, Debug)]
pub(crate) struct ListenerRecord<C> {
    pub(crate) uid: ListenerId,
    /// The caller's callback; removal by callback compares identity.
    pub(crate) callback: C,
    /// Type the host subscription was made for (aliases already resolved).
    pub(crate) kind: Rc<str>,
    pub(crate) namespaces: Namespaces,
    /// Present for delegated listeners.
    pub(crate) selector: Option<Rc<str>>,
    pub(crate) once: bool,
    /// The boundary type the caller registered (`mouseenter`) when `kind` is
    /// the type it rides on.
    pub(crate) alias: Option<Rc<str>>,
}

#[derive(Debug)]
struct ElementListeners<C> {
    by_kind: HashMap<Rc<str>, Vec<ListenerRecord<C>>>,
}

impl<C> Default for ElementListeners<C> {
    fn default() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }
}

impl<C> ElementListeners<C> {
    fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

#[derive(Debug)]
pub(crate) struct Registry<C> {
    elements: HashMap<ElementId, ElementListeners<C>>,
    next_element: u64,
    next_listener: u64,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
            next_element: 0,
            next_listener: 0,
        }
    }
}

impl<C> Registry<C> {
    pub(crate) fn allocate_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    pub(crate) fn allocate_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Append `record` after the element's existing records of the same type.
    pub(crate) fn insert(&mut self, element: ElementId, record: ListenerRecord<C>) {
        self.elements
            .entry(element)
            .or_default()
            .by_kind
            .entry(record.kind.clone())
            .or_default()
            .push(record);
    }

    pub(crate) fn get(
        &self,
        element: ElementId,
        kind: &str,
        uid: ListenerId,
    ) -> Option<&ListenerRecord<C>> {
        self.elements
            .get(&element)?
            .by_kind
            .get(kind)?
            .iter()
            .find(|r| r.uid == uid)
    }

    /// Remove one record by uid, keeping the order of the rest.
    pub(crate) fn take(
        &mut self,
        element: ElementId,
        kind: &str,
        uid: ListenerId,
    ) -> Option<ListenerRecord<C>> {
        let records = self.elements.get_mut(&element)?.by_kind.get_mut(kind)?;
        let idx = records.iter().position(|r| r.uid == uid)?;
        let record = records.remove(idx);
        self.prune(element);
        Some(record)
    }

    /// Remove every record of `element` accepted by `predicate`.
    ///
    /// With `kind` set only that type is scanned; otherwise all types are.
    pub(crate) fn take_matching(
        &mut self,
        element: ElementId,
        kind: Option<&str>,
        mut predicate: impl FnMut(&ListenerRecord<C>) -> bool,
    ) -> Vec<ListenerRecord<C>> {
        let mut removed = Vec::new();
        let Some(listeners) = self.elements.get_mut(&element) else {
            return removed;
        };
        for (k, records) in &mut listeners.by_kind {
            if kind.is_some_and(|kind| kind != &**k) {
                continue;
            }
            let (gone, kept): (Vec<_>, Vec<_>) =
                core::mem::take(records).into_iter().partition(&mut predicate);
            *records = kept;
            removed.extend(gone);
        }
        self.prune(element);
        removed
    }

    /// Remove every record of `element`.
    pub(crate) fn take_element(&mut self, element: ElementId) -> Vec<ListenerRecord<C>> {
        self.elements
            .remove(&element)
            .map(|listeners| listeners.by_kind.into_values().flatten().collect())
            .unwrap_or_default()
    }

    /// Number of records on `element`.
    pub(crate) fn count(&self, element: ElementId) -> usize {
        self.elements.get(&element).map_or(0, ElementListeners::len)
    }

    /// Number of records overall.
    pub(crate) fn len(&self) -> usize {
        self.elements.values().map(ElementListeners::len).sum()
    }

    // Empty type buckets and elements are dropped so discarded elements leave nothing behind.
    fn prune(&mut self, element: ElementId) {
        let Some(listeners) = self.elements.get_mut(&element) else {
            return;
        };
        listeners.by_kind.retain(|_, records| !records.is_empty());
        if listeners.by_kind.is_empty() {
            self.elements.remove(&element);
        }
    }

    #[cfg(test)]
    pub(crate) fn kinds(&self, element: ElementId) -> Vec<Rc<str>> {
        let mut kinds: Vec<_> = self
            .elements
            .get(&element)
            .map(|l| l.by_kind.keys().cloned().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn record(reg: &mut Registry<u8>, kind: &str, ns: &[&str], tag: u8) -> ListenerRecord<u8> {
        ListenerRecord {
            uid: reg.allocate_listener(),
            callback: tag,
            kind: Rc::from(kind),
            namespaces: Namespaces::from_tags(ns.iter().copied()),
            selector: None,
            once: false,
            alias: None,
        }
    }

    #[test]
    fn listener_ids_are_unique_and_increasing() {
        let mut reg: Registry<u8> = Registry::default();
        let a = reg.allocate_listener();
        let b = reg.allocate_listener();
        assert!(b > a);
        assert_ne!(reg.allocate_element(), reg.allocate_element());
    }

    #[test]
    fn records_keep_insertion_order_per_type() {
        let mut reg: Registry<u8> = Registry::default();
        let el = reg.allocate_element();
        for tag in 0..3 {
            let r = record(&mut reg, "click", &[], tag);
            reg.insert(el, r);
        }
        let middle = reg.elements[&el].by_kind["click"][1].uid;
        let taken = reg.take(el, "click", middle).unwrap();
        assert_eq!(taken.callback, 1);
        let order: Vec<u8> = reg.elements[&el].by_kind["click"]
            .iter()
            .map(|r| r.callback)
            .collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn take_matching_scans_one_or_all_types() {
        let mut reg: Registry<u8> = Registry::default();
        let el = reg.allocate_element();
        let a = record(&mut reg, "foobar", &["ns"], 1);
        let b = record(&mut reg, "foofoo", &["ns"], 2);
        let c = record(&mut reg, "foofoo", &["other"], 3);
        reg.insert(el, a);
        reg.insert(el, b);
        reg.insert(el, c);

        let removed = reg.take_matching(el, Some("foobar"), |_| true);
        assert_eq!(removed.len(), 1);
        assert_eq!(reg.kinds(el), vec![Rc::from("foofoo")]);

        let ns = Namespaces::from_tags(["ns"]);
        let removed = reg.take_matching(el, None, |r| r.namespaces.is_superset(&ns));
        assert_eq!(removed.iter().map(|r| r.callback).collect::<Vec<_>>(), vec![2]);
        assert_eq!(reg.count(el), 1);
    }

    #[test]
    fn emptied_elements_are_pruned() {
        let mut reg: Registry<u8> = Registry::default();
        let el = reg.allocate_element();
        let r = record(&mut reg, "click", &[], 0);
        let uid = r.uid;
        reg.insert(el, r);
        assert_eq!(reg.len(), 1);
        assert!(reg.take(el, "click", uid).is_some());
        assert_eq!(reg.len(), 0);
        assert!(reg.elements.is_empty());
        assert!(reg.take(el, "click", uid).is_none());
    }

    #[test]
    fn take_element_drains_every_type() {
        let mut reg: Registry<u8> = Registry::default();
        let el = reg.allocate_element();
        let other = reg.allocate_element();
        for (kind, tag) in [("a", 1), ("b", 2), ("b", 3)] {
            let r = record(&mut reg, kind, &[], tag);
            reg.insert(el, r);
        }
        let r = record(&mut reg, "a", &[], 9);
        reg.insert(other, r);

        let mut drained: Vec<u8> = reg.take_element(el).into_iter().map(|r| r.callback).collect();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2, 3]);
        assert_eq!(reg.count(el), 0);
        assert_eq!(reg.count(other), 1);
        assert!(reg.take_element(el).is_empty());
    }
}
