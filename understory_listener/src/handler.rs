// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The listener API: `on`, `one`, `off`, `trigger`.
//!
//! ## Wrapped handlers
//!
//! Each registration becomes a record with a fresh [`ListenerId`]. The host is
//! subscribed with that id, never with the caller's [`Callback`], so the two
//! identities stay separate: the host finds records by id during dispatch, and
//! `off` finds records by callback identity.
//!
//! When the host reports a listener id at a propagation step, the handler
//! runs the wrapped logic for that record:
//!
//! 1. skip it if the record is gone (removed earlier in this dispatch);
//! 2. skip it unless its namespaces admit the event's (see
//!    [`Namespaces::admits`](crate::name::Namespaces::admits));
//! 3. for delegated records, resolve the nearest ancestor-or-self of the
//!    target that matches the selector, up to the element; skip if none does;
//! 4. for boundary aliases (`mouseenter`), skip if the related target is inside
//!    the bound element;
//! 5. for one-shot records, remove the record and its subscription;
//! 6. bind [`Event::delegate_target`] and call the callback.
//!
//! Listener ids are snapshotted per node before any callback runs, and records
//! are looked up again before each call, so callbacks may register, remove or
//! trigger re-entrantly.
//!
//! ## Invalid input
//!
//! Every operation is a silent no-op (logged at `debug`) for elements the host
//! reports as not alive and for event names that do not parse as required.

use alloc::rc::Rc;
use core::fmt;

use tracing::{debug, trace};

use crate::config::Config;
use crate::event::{Event, EventInit};
use crate::host::{ElementId, Host, HostError, ListenerId};
use crate::name::EventName;
use crate::propagation::{self, Dispatch, Outcome};
use crate::registry::{ListenerRecord, Registry};

type Handler<H> = dyn Fn(&mut EventHandler<H>, &mut Event<<H as Host>::Node>);

/// A caller-supplied event callback.
///
/// Clones share identity; [`EventHandler::off`] removes the records whose
/// callback is the same allocation as the one passed in.
///
/// ```
/// use understory_listener::Callback;
/// use understory_listener::tree::Tree;
///
/// let a = Callback::<Tree>::new(|_, _| {});
/// let b = Callback::<Tree>::new(|_, _| {});
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
pub struct Callback<H: Host>(Rc<Handler<H>>);

impl<H: Host> Callback<H> {
    /// Wrap a closure.
    ///
    /// The closure gets the handler back so it can register, remove or
    /// trigger listeners while the event is being dispatched.
    pub fn new(f: impl Fn(&mut EventHandler<H>, &mut Event<H::Node>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    fn call(&self, handler: &mut EventHandler<H>, event: &mut Event<H::Node>) {
        (self.0)(handler, event);
    }
}

impl<H: Host> Clone for Callback<H> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<H: Host> PartialEq for Callback<H> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<H: Host> Eq for Callback<H> {}

impl<H: Host> fmt::Debug for Callback<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Listener registry bound to a [`Host`].
///
/// ## Usage
///
/// - Register with [`on`](Self::on) / [`one`](Self::one), or their
///   `_delegated` variants to listen for descendants matching a selector.
/// - Remove with [`off`](Self::off) / [`off_delegated`](Self::off_delegated).
/// - Fire custom or native events with [`trigger`](Self::trigger); feed
///   host-originated events (real input) through [`dispatch`](Self::dispatch).
/// - Call [`discard`](Self::discard) before the host drops an element.
pub struct EventHandler<H: Host> {
    host: H,
    config: Config,
    registry: Registry<Callback<H>>,
}

impl<H: Host> fmt::Debug for EventHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("config", &self.config)
            .field("listeners", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> EventHandler<H> {
    /// Create a handler with the default [`Config`].
    pub fn new(host: H) -> Self {
        Self::with_config(host, Config::default())
    }

    /// Create a handler with explicit event tables.
    pub fn with_config(host: H, config: Config) -> Self {
        Self {
            host,
            config,
            registry: Registry::default(),
        }
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably (for tree edits).
    ///
    /// Edits must keep the subscriptions made by this handler intact. Removing
    /// an element without calling [`discard`](Self::discard) on it and on every
    /// descendant first leaves their records in the registry, unreachable and
    /// still counted by [`len`](Self::len).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the host back.
    pub fn into_host(self) -> H {
        self.host
    }

    /// The event tables.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of registered listeners across all elements.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners registered on `element`.
    pub fn listener_count(&self, element: H::Node) -> usize {
        self.host
            .element_id(element)
            .map_or(0, |id| self.registry.count(id))
    }

    /// Listen for `event` (`type` or `type.ns...`) on `element`.
    pub fn on(&mut self, element: H::Node, event: &str, callback: Callback<H>) {
        self.add_handler(element, event, None, callback, false);
    }

    /// Listen for `event` on descendants of `element` (and `element` itself)
    /// matching `selector`, including ones inserted later.
    ///
    /// The callback sees the matching node as [`Event::delegate_target`].
    pub fn on_delegated(
        &mut self,
        element: H::Node,
        event: &str,
        selector: &str,
        callback: Callback<H>,
    ) {
        self.add_handler(element, event, Some(selector), callback, false);
    }

    /// Like [`on`](Self::on), but the listener removes itself before its first call.
    pub fn one(&mut self, element: H::Node, event: &str, callback: Callback<H>) {
        self.add_handler(element, event, None, callback, true);
    }

    /// Like [`on_delegated`](Self::on_delegated), but the listener removes
    /// itself before its first call.
    pub fn one_delegated(
        &mut self,
        element: H::Node,
        event: &str,
        selector: &str,
        callback: Callback<H>,
    ) {
        self.add_handler(element, event, Some(selector), callback, true);
    }

    /// Remove listeners from `element`.
    ///
    /// - `.ns`: every listener carrying the namespaces, whatever its type.
    /// - `type`: every listener of that type.
    /// - `type.ns`: listeners of that type admitted by the namespaces.
    ///
    /// With `callback`, only listeners registered with that callback are removed.
    pub fn off(&mut self, element: H::Node, event: &str, callback: Option<&Callback<H>>) {
        self.remove_handlers(element, event, None, callback);
    }

    /// Like [`off`](Self::off), restricted to listeners delegated with `selector`.
    pub fn off_delegated(
        &mut self,
        element: H::Node,
        event: &str,
        selector: &str,
        callback: Option<&Callback<H>>,
    ) {
        self.remove_handlers(element, event, Some(selector), callback);
    }

    /// Fire `event` at `element` and report whether a handler prevented the
    /// default action.
    ///
    /// Native types are fired as plain events and reach every listener of the
    /// type. Custom types carry their namespaces, which narrow delivery.
    pub fn trigger(&mut self, element: H::Node, event: &str) -> bool {
        self.trigger_with(element, event, EventInit::default())
    }

    /// [`trigger`](Self::trigger) with a payload, related target or bubbling override.
    pub fn trigger_with(
        &mut self,
        element: H::Node,
        event: &str,
        init: EventInit<H::Node>,
    ) -> bool {
        if !self.host.is_alive(element) {
            debug!(?element, event, "trigger ignored: element is not alive");
            return false;
        }
        let Some(EventName::Typed { kind, namespaces }) = EventName::parse(event) else {
            debug!(event, "trigger ignored: not a typed event name");
            return false;
        };
        let resolved = self.config.resolve(kind);
        let native = self.config.is_native(resolved.kind);
        let mut synthetic = Event::new(resolved.kind, element)
            .with_bubbles(init.bubbles)
            .with_related_target(init.related_target)
            .with_shared_detail(init.detail);
        if resolved.boundary {
            synthetic = synthetic.with_alias(kind);
        }
        if !native {
            synthetic = synthetic.with_namespaces(namespaces);
        }
        trace!(?element, kind = resolved.kind, native, alias = resolved.boundary, "trigger");
        self.dispatch(synthetic).is_default_prevented()
    }

    /// Propagate `event` from the root to its target and back.
    ///
    /// This is the entry point for events the host originates itself, such as
    /// real pointer input. Returns the event so its flags can be inspected.
    pub fn dispatch(&mut self, mut event: Event<H::Node>) -> Event<H::Node> {
        let target = event.target();
        if !self.host.is_alive(target) {
            debug!(?target, kind = event.kind(), "dispatch ignored: target is not alive");
            return event;
        }
        let path = propagation::path(&self.host, target);
        let seq = propagation::sequence(&path, event.bubbles());
        let stop = propagation::run(&seq, &mut event, |d, e| self.deliver(d, e));
        if let Some(stop) = stop {
            trace!(node = ?stop.node, phase = ?stop.phase, "propagation stopped");
        }
        event.finish();
        event
    }

    /// Drop every listener of `element` and forget its registry id.
    ///
    /// Hosts call this before an element is destroyed, while it is still alive.
    pub fn discard(&mut self, element: H::Node) {
        let Some(element_id) = self.host.element_id(element) else {
            return;
        };
        let removed = self.registry.take_element(element_id);
        trace!(?element, count = removed.len(), "discard");
        for record in &removed {
            self.unsubscribe(element, record);
        }
        if let Err(err) = self.host.set_element_id(element, None) {
            debug!(?element, %err, "could not clear element id");
        }
    }

    fn add_handler(
        &mut self,
        element: H::Node,
        event: &str,
        selector: Option<&str>,
        callback: Callback<H>,
        once: bool,
    ) {
        if !self.host.is_alive(element) {
            debug!(?element, event, "listener ignored: element is not alive");
            return;
        }
        let Some(EventName::Typed { kind, namespaces }) = EventName::parse(event) else {
            debug!(event, "listener ignored: not a typed event name");
            return;
        };
        if selector.is_some_and(|s| s.trim().is_empty()) {
            debug!(event, "listener ignored: empty selector");
            return;
        }
        let (kind, alias) = {
            let resolved = self.config.resolve(kind);
            let alias = resolved.boundary.then(|| Rc::<str>::from(kind));
            (Rc::<str>::from(resolved.kind), alias)
        };
        let Some(element_id) = self.element_id_for(element) else {
            return;
        };
        let uid = self.registry.allocate_listener();
        // Delegated listeners see the event on its way down, ahead of the target's own.
        let capture = selector.is_some();
        if let Err(err) = self.host.subscribe(element, &kind, uid, capture) {
            debug!(?element, kind = &*kind, %err, "listener ignored: host refused subscription");
            return;
        }
        trace!(
            ?element,
            kind = &*kind,
            alias = alias.as_deref(),
            uid = uid.get(),
            %namespaces,
            selector,
            once,
            "on"
        );
        self.registry.insert(
            element_id,
            ListenerRecord {
                uid,
                callback,
                kind,
                namespaces,
                selector: selector.map(Rc::from),
                once,
                alias,
            },
        );
    }

    fn remove_handlers(
        &mut self,
        element: H::Node,
        event: &str,
        selector: Option<&str>,
        callback: Option<&Callback<H>>,
    ) {
        if !self.host.is_alive(element) {
            debug!(?element, event, "off ignored: element is not alive");
            return;
        }
        let Some(name) = EventName::parse(event) else {
            debug!(event, "off ignored: invalid event name");
            return;
        };
        let Some(element_id) = self.host.element_id(element) else {
            return;
        };
        let narrowed = |r: &ListenerRecord<Callback<H>>| {
            selector.is_none_or(|s| r.selector.as_deref() == Some(s))
                && callback.is_none_or(|c| r.callback == *c)
        };
        let removed = match name {
            EventName::NamespaceOnly(namespaces) => {
                self.registry.take_matching(element_id, None, |r| {
                    !r.namespaces.is_empty() && r.namespaces.is_superset(&namespaces) && narrowed(r)
                })
            }
            EventName::Typed { kind, namespaces } => {
                // `mouseenter` and a plain `mouseover` share a bucket but not an identity.
                let resolved = self.config.resolve(kind);
                let alias = resolved.boundary.then_some(kind);
                self.registry.take_matching(element_id, Some(resolved.kind), |r| {
                    r.alias.as_deref() == alias && r.namespaces.admits(&namespaces) && narrowed(r)
                })
            }
        };
        trace!(?element, event, count = removed.len(), "off");
        for record in &removed {
            self.unsubscribe(element, record);
        }
    }

    fn element_id_for(&mut self, element: H::Node) -> Option<ElementId> {
        if let Some(id) = self.host.element_id(element) {
            return Some(id);
        }
        let id = self.registry.allocate_element();
        match self.host.set_element_id(element, Some(id)) {
            Ok(()) => Some(id),
            Err(err) => {
                debug!(?element, %err, "listener ignored: could not tag element");
                None
            }
        }
    }

    fn unsubscribe(&mut self, element: H::Node, record: &ListenerRecord<Callback<H>>) {
        if let Err(err) = self.host.unsubscribe(element, &record.kind, record.uid) {
            debug_assert!(
                !matches!(err, HostError::NotSubscribed(_)),
                "registry and host subscriptions diverged: {err}"
            );
            debug!(?element, uid = record.uid.get(), %err, "unsubscribe failed");
        }
    }

    fn deliver(&mut self, step: &Dispatch<H::Node>, event: &mut Event<H::Node>) -> Outcome {
        event.enter(step.phase, step.node);
        let listeners = self.host.subscriptions(step.node, event.kind(), step.phase);
        for listener in listeners {
            self.invoke(step.node, listener, event);
            if event.is_immediate_propagation_stopped() {
                break;
            }
        }
        if event.is_propagation_stopped() {
            Outcome::Stop
        } else {
            Outcome::Continue
        }
    }

    fn invoke(&mut self, node: H::Node, listener: ListenerId, event: &mut Event<H::Node>) {
        let Some(element_id) = self.host.element_id(node) else {
            return;
        };
        let (callback, selector, once, boundary) = {
            // Gone if an earlier callback in this dispatch removed it.
            let Some(record) = self.registry.get(element_id, event.kind(), listener) else {
                return;
            };
            if !record.namespaces.admits(event.namespaces()) {
                return;
            }
            if event.alias().is_some() && record.alias.as_deref() != event.alias() {
                return;
            }
            (
                record.callback.clone(),
                record.selector.clone(),
                record.once,
                record.alias.is_some(),
            )
        };
        let context = match selector {
            Some(selector) => match self.delegate_target(node, event.target(), &selector) {
                Some(found) => found,
                None => return,
            },
            None => node,
        };
        if boundary
            && event
                .related_target()
                .is_some_and(|related| self.host.contains(context, related))
        {
            return;
        }
        if once && let Some(record) = self.registry.take(element_id, event.kind(), listener) {
            self.unsubscribe(node, &record);
        }
        trace!(?node, uid = listener.get(), kind = event.kind(), "invoke");
        event.bind(context);
        callback.call(self, event);
    }

    /// Nearest ancestor-or-self of `target`, up to and including `root`, matching `selector`.
    fn delegate_target(&self, root: H::Node, target: H::Node, selector: &str) -> Option<H::Node> {
        let mut cur = Some(target);
        while let Some(node) = cur {
            if self.host.matches(node, selector) {
                return Some(node);
            }
            if node == root {
                return None;
            }
            cur = self.host.parent_of(node);
        }
        None
    }
}
