// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The seam between the listener registry and the element tree it serves.
//!
//! The host owns the tree and its native subscription lists. The registry
//! never stores elements as map keys; instead it asks the host to remember a
//! small [`ElementId`] on each element that has listeners, and it hands the
//! host one [`ListenerId`] per wrapped handler.
//!
//! Every record in the registry corresponds to exactly one host subscription.
//! [`HostError::NotSubscribed`] on removal therefore means the two have
//! drifted apart, which is a bug in the registry rather than in the caller.

use alloc::vec::Vec;
use core::fmt::Debug;

use crate::event::Phase;

/// Identity of a wrapped handler (the record's `uid`).
///
/// Assigned from a monotonic counter and never reused by a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Raw value, for logging and host-side storage.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Registry-assigned identity of an element that has (or had) listeners.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) u64);

impl ElementId {
    /// Raw value, for logging and host-side storage.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Failures reported by a [`Host`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The node handle does not refer to a live element.
    #[error("node is not a live element")]
    StaleNode,
    /// The listener is not subscribed on that element for that type.
    #[error("listener {} is not subscribed", .0.get())]
    NotSubscribed(ListenerId),
    /// The listener is already subscribed on that element.
    #[error("listener {} is already subscribed", .0.get())]
    AlreadySubscribed(ListenerId),
}

/// Platform capabilities consumed by [`EventHandler`](crate::EventHandler).
///
/// ## Contract
///
/// - `subscriptions` returns listener ids in subscription order. For
///   [`Phase::Capture`] only capture subscriptions, for [`Phase::Bubble`]
///   only non-capture ones, and for [`Phase::Target`] capture subscriptions
///   followed by non-capture ones.
/// - `parent_of` describes an acyclic tree.
/// - `element_id`/`set_element_id` store one optional [`ElementId`] per element.
pub trait Host {
    /// Handle to an element. Cheap to copy, compared by identity.
    type Node: Copy + Eq + Debug;

    /// Whether `node` refers to a live element.
    fn is_alive(&self, node: Self::Node) -> bool;

    /// The parent of `node`, if any.
    fn parent_of(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whether `node` matches `selector`. Unparseable selectors match nothing.
    fn matches(&self, node: Self::Node, selector: &str) -> bool;

    /// The id previously stored with [`Host::set_element_id`].
    fn element_id(&self, node: Self::Node) -> Option<ElementId>;

    /// Store or clear the registry id of `node`.
    fn set_element_id(&mut self, node: Self::Node, id: Option<ElementId>)
    -> Result<(), HostError>;

    /// Subscribe `listener` to events of type `kind` at `node`.
    fn subscribe(
        &mut self,
        node: Self::Node,
        kind: &str,
        listener: ListenerId,
        capture: bool,
    ) -> Result<(), HostError>;

    /// Remove the subscription of `listener` for `kind` at `node`.
    fn unsubscribe(
        &mut self,
        node: Self::Node,
        kind: &str,
        listener: ListenerId,
    ) -> Result<(), HostError>;

    /// Snapshot of the listeners to run at `node` for `kind` during `phase`.
    fn subscriptions(&self, node: Self::Node, kind: &str, phase: Phase) -> Vec<ListenerId>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent_of(n);
        }
        false
    }
}
