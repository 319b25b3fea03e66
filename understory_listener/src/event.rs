// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event objects carried through propagation.
//!
//! An [`Event`] is created for one dispatch, either by the host (a real user
//! click) via [`EventHandler::dispatch`](crate::EventHandler::dispatch) or by
//! [`EventHandler::trigger`](crate::EventHandler::trigger). Handlers read the
//! targets and payload and write the cancelation flags:
//!
//! ```
//! use understory_listener::event::{Event, Phase};
//!
//! let mut event = Event::new("submit", 7_u32).with_detail("form-1");
//! assert_eq!(event.target(), 7);
//! assert_eq!(event.detail::<&str>(), Some(&"form-1"));
//! assert_eq!(event.phase(), None);
//!
//! event.prevent_default();
//! assert!(event.is_default_prevented());
//!
//! // Non-cancelable events ignore `prevent_default`.
//! let mut scroll = Event::new("scroll", 7_u32).with_cancelable(false);
//! scroll.prevent_default();
//! assert!(!scroll.is_default_prevented());
//! ```

use alloc::rc::Rc;
use core::any::Any;
use core::fmt;

use crate::name::Namespaces;

/// Propagation phase of a dispatch step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root toward the target's parent.
    Capture,
    /// At the target itself.
    Target,
    /// The target's parent back toward the root.
    Bubble,
}

bitflags::bitflags! {
    /// Behaviour and cancelation state of an [`Event`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// The event runs a bubble phase after the target.
        const BUBBLES = 0b0000_0001;
        /// Handlers may prevent the default action.
        const CANCELABLE = 0b0000_0010;
        /// A handler prevented the default action.
        const DEFAULT_PREVENTED = 0b0000_0100;
        /// No further nodes receive the event.
        const PROPAGATION_STOPPED = 0b0000_1000;
        /// No further listeners, even on the current node, receive the event.
        const IMMEDIATE_PROPAGATION_STOPPED = 0b0001_0000;
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::BUBBLES | Self::CANCELABLE
    }
}

/// An event travelling through the element tree.
pub struct Event<N> {
    kind: Rc<str>,
    alias: Option<Rc<str>>,
    namespaces: Namespaces,
    target: N,
    current_target: Option<N>,
    delegate_target: Option<N>,
    related_target: Option<N>,
    phase: Option<Phase>,
    flags: EventFlags,
    detail: Option<Rc<dyn Any>>,
}

impl<N: Copy> Event<N> {
    /// Create a bubbling, cancelable event of type `kind` aimed at `target`.
    pub fn new(kind: &str, target: N) -> Self {
        Self {
            kind: Rc::from(kind),
            alias: None,
            namespaces: Namespaces::new(),
            target,
            current_target: None,
            delegate_target: None,
            related_target: None,
            phase: None,
            flags: EventFlags::default(),
            detail: None,
        }
    }

    /// Restrict delivery to listeners admitted by `namespaces`.
    ///
    /// See [`Namespaces::admits`].
    pub fn with_namespaces(mut self, namespaces: Namespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    /// Set the secondary target (the node being left or entered for pointer
    /// transitions).
    pub fn with_related_target(mut self, related: Option<N>) -> Self {
        self.related_target = related;
        self
    }

    /// Attach a payload.
    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// Attach an already shared payload.
    pub fn with_shared_detail(mut self, detail: Option<Rc<dyn Any>>) -> Self {
        self.detail = detail;
        self
    }

    /// Choose whether the event bubbles.
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.flags.set(EventFlags::BUBBLES, bubbles);
        self
    }

    /// Choose whether the default action can be prevented.
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.flags.set(EventFlags::CANCELABLE, cancelable);
        self
    }

    /// The event type, without namespaces.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The boundary type the event was triggered as, when [`kind`](Self::kind)
    /// is the type it rides on (`mouseenter` for `mouseover`).
    ///
    /// Such an event only reaches listeners registered for that boundary type.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Namespaces carried by a triggered custom event.
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> N {
        self.target
    }

    /// The node whose listeners are running, while dispatching.
    pub fn current_target(&self) -> Option<N> {
        self.current_target
    }

    /// The node the running handler is bound to.
    ///
    /// For a direct listener this is the element it was registered on; for a
    /// delegated listener it is the nearest ancestor-or-self of the target
    /// that matched the selector.
    pub fn delegate_target(&self) -> Option<N> {
        self.delegate_target
    }

    /// The secondary target, if any.
    pub fn related_target(&self) -> Option<N> {
        self.related_target
    }

    /// The current phase, while dispatching.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Behaviour and cancelation flags.
    pub fn flags(&self) -> EventFlags {
        self.flags
    }

    /// Whether the event has a bubble phase.
    pub fn bubbles(&self) -> bool {
        self.flags.contains(EventFlags::BUBBLES)
    }

    /// Whether the default action can be prevented.
    pub fn cancelable(&self) -> bool {
        self.flags.contains(EventFlags::CANCELABLE)
    }

    /// The payload, if it is a `T`.
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_deref()?.downcast_ref::<T>()
    }

    /// Request that the default action be skipped. Ignored unless cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable() {
            self.flags.insert(EventFlags::DEFAULT_PREVENTED);
        }
    }

    /// Whether a handler prevented the default action.
    pub fn is_default_prevented(&self) -> bool {
        self.flags.contains(EventFlags::DEFAULT_PREVENTED)
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&mut self) {
        self.flags.insert(EventFlags::PROPAGATION_STOPPED);
    }

    /// Whether propagation was stopped.
    pub fn is_propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::PROPAGATION_STOPPED)
    }

    /// Stop now: skip the remaining listeners of the current node as well.
    pub fn stop_immediate_propagation(&mut self) {
        self.flags.insert(
            EventFlags::PROPAGATION_STOPPED | EventFlags::IMMEDIATE_PROPAGATION_STOPPED,
        );
    }

    /// Whether immediate propagation was stopped.
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.flags.contains(EventFlags::IMMEDIATE_PROPAGATION_STOPPED)
    }

    pub(crate) fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(Rc::from(alias));
        self
    }

    pub(crate) fn enter(&mut self, phase: Phase, node: N) {
        self.phase = Some(phase);
        self.current_target = Some(node);
        self.delegate_target = None;
    }

    pub(crate) fn bind(&mut self, context: N) {
        self.delegate_target = Some(context);
    }

    pub(crate) fn finish(&mut self) {
        self.phase = None;
        self.current_target = None;
        self.delegate_target = None;
    }
}

impl<N: fmt::Debug> fmt::Debug for Event<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("alias", &self.alias)
            .field("namespaces", &self.namespaces)
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("delegate_target", &self.delegate_target)
            .field("related_target", &self.related_target)
            .field("phase", &self.phase)
            .field("flags", &self.flags)
            .field("has_detail", &self.detail.is_some())
            .finish()
    }
}

/// Options for [`EventHandler::trigger_with`](crate::EventHandler::trigger_with).
pub struct EventInit<N> {
    /// Payload handed to handlers through [`Event::detail`].
    pub detail: Option<Rc<dyn Any>>,
    /// Secondary target, see [`Event::related_target`].
    pub related_target: Option<N>,
    /// Whether the event bubbles. Defaults to `true`.
    pub bubbles: bool,
}

impl<N> Default for EventInit<N> {
    fn default() -> Self {
        Self {
            detail: None,
            related_target: None,
            bubbles: true,
        }
    }
}

impl<N> EventInit<N> {
    /// Attach a payload.
    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// Set the related target.
    pub fn with_related_target(mut self, related: N) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Dispatch without a bubble phase.
    pub fn non_bubbling(mut self) -> Self {
        self.bubbles = false;
        self
    }
}

impl<N: fmt::Debug> fmt::Debug for EventInit<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventInit")
            .field("has_detail", &self.detail.is_some())
            .field("related_target", &self.related_target)
            .field("bubbles", &self.bubbles)
            .finish()
    }
}
