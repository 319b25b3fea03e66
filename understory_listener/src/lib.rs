// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Listener: a `no_std` listener registry for element trees.
//!
//! ## Overview
//!
//! [`EventHandler`] sits between UI components and the host's native event
//! subscriptions. Components register callbacks under event names such as
//! `click`, `show.bs.modal` or `.bs`, optionally delegated to descendants that
//! match a selector, and later remove them by type, namespace, selector or
//! callback identity.
//!
//! The host is abstracted by the [`Host`] trait: parent lookup, selector
//! matching, a per-element id slot and a per-element subscription list. The
//! [`tree`] module provides a complete reference host.
//!
//! ## Event names
//!
//! `type.ns1.ns2` names a type plus an unordered set of namespace tags; see
//! [`name`]. Namespaces scope removal and, for custom events, delivery.
//!
//! ## Propagation
//!
//! Events travel capture → target → bubble along the root→target path
//! ([`propagation`]). Delegated listeners are captured at their element and run
//! before the target's own listeners; direct listeners run at target and
//! bubble. [`Event::stop_propagation`], [`Event::stop_immediate_propagation`]
//! and [`Event::prevent_default`] behave as in the DOM.
//!
//! ## Native and custom events
//!
//! [`Config`] lists the types the host fires natively. Triggering one of them
//! dispatches a plain event that reaches every listener of the type; any
//! other type is custom and carries its namespaces. `mouseenter` and
//! `mouseleave` are emulated on `mouseover` and `mouseout`.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use understory_listener::tree::{Element, Tree};
//! use understory_listener::{Callback, EventHandler};
//!
//! type Cb = Callback<Tree>;
//!
//! let mut tree = Tree::new();
//! let menu = tree.insert(Some(tree.document()), Element::new("ul"));
//! let item = tree.insert(Some(menu), Element::new("li").with_class("item"));
//! let mut handler = EventHandler::new(tree);
//!
//! let opened = Rc::new(Cell::new(0));
//! let o = opened.clone();
//! handler.on_delegated(
//!     menu,
//!     "click.menu",
//!     ".item",
//!     Cb::new(move |_, event| {
//!         assert_eq!(event.delegate_target(), Some(item));
//!         o.set(o.get() + 1);
//!     }),
//! );
//! handler.one(menu, "shown.menu", Cb::new(|_, event| event.prevent_default()));
//!
//! handler.trigger(item, "click");
//! assert_eq!(opened.get(), 1);
//! assert!(handler.trigger(item, "shown"));
//! assert!(!handler.trigger(item, "shown"));
//!
//! // Tear down everything the component registered.
//! handler.off(menu, ".menu", None);
//! assert!(handler.is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod config;
pub mod event;
mod handler;
pub mod host;
pub mod name;
pub mod propagation;
mod registry;
pub mod selector;
pub mod tree;

pub use config::Config;
pub use event::{Event, EventFlags, EventInit, Phase};
pub use handler::{Callback, EventHandler};
pub use host::{ElementId, Host, HostError, ListenerId};
pub use name::{EventName, Namespaces};
