// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event type tables: which types the host fires natively, and which
//! enter/leave types are emulated on top of a native one.

use alloc::borrow::Cow;
use alloc::collections::{BTreeMap, BTreeSet};

/// Types a browser-like host fires on its own.
const NATIVE_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "mouseup",
    "mousedown",
    "contextmenu",
    "mousewheel",
    "DOMMouseScroll",
    "mouseover",
    "mouseout",
    "mousemove",
    "selectstart",
    "selectend",
    "keydown",
    "keypress",
    "keyup",
    "orientationchange",
    "touchstart",
    "touchmove",
    "touchend",
    "touchcancel",
    "pointerdown",
    "pointermove",
    "pointerup",
    "pointerleave",
    "pointercancel",
    "gesturestart",
    "gesturechange",
    "gestureend",
    "focus",
    "blur",
    "change",
    "reset",
    "select",
    "submit",
    "focusin",
    "focusout",
    "load",
    "unload",
    "beforeunload",
    "resize",
    "move",
    "DOMContentLoaded",
    "readystatechange",
    "error",
    "abort",
    "scroll",
];

/// Non-bubbling boundary types and the bubbling type they ride on.
const BOUNDARY_ALIASES: &[(&str, &str)] =
    &[("mouseenter", "mouseover"), ("mouseleave", "mouseout")];

/// Event type configuration for an [`EventHandler`](crate::EventHandler).
///
/// The default tables describe a DOM host. Types outside the native set are
/// custom: [`trigger`](crate::EventHandler::trigger) synthesizes them and
/// carries their namespaces through dispatch.
///
/// ```
/// use understory_listener::Config;
///
/// let config = Config::default().with_native_event("toggle");
/// assert!(config.is_native("click"));
/// assert!(config.is_native("toggle"));
/// assert!(!config.is_native("show"));
///
/// let resolved = config.resolve("mouseenter");
/// assert_eq!(resolved.kind, "mouseover");
/// assert!(resolved.boundary);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    native: BTreeSet<Cow<'static, str>>,
    aliases: BTreeMap<Cow<'static, str>, Cow<'static, str>>,
}

/// An event type after alias resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolved<'a> {
    /// The type listeners are subscribed under.
    pub kind: &'a str,
    /// Whether the requested type was a boundary alias (enter/leave emulation).
    pub boundary: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self::empty();
        config
            .native
            .extend(NATIVE_EVENTS.iter().map(|&kind| Cow::Borrowed(kind)));
        for &(from, to) in BOUNDARY_ALIASES {
            config = config.with_boundary_alias(from, to);
        }
        config
    }
}

impl Config {
    /// A configuration with no native types and no aliases: every type is custom.
    pub fn empty() -> Self {
        Self {
            native: BTreeSet::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Mark `kind` as fired natively by the host.
    pub fn with_native_event(mut self, kind: impl Into<Cow<'static, str>>) -> Self {
        self.native.insert(kind.into());
        self
    }

    /// Emulate the boundary type `from` (for example `mouseenter`) on top of
    /// the bubbling type `to` (for example `mouseover`).
    ///
    /// Listeners registered for `from` subscribe to `to` and only run when the
    /// event's related target lies outside the element they are bound to.
    pub fn with_boundary_alias(
        mut self,
        from: impl Into<Cow<'static, str>>,
        to: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    /// Whether the host fires `kind` natively.
    pub fn is_native(&self, kind: &str) -> bool {
        self.native.contains(kind)
    }

    /// Resolve boundary aliases.
    pub fn resolve<'a>(&'a self, kind: &'a str) -> Resolved<'a> {
        match self.aliases.get(kind) {
            Some(to) => Resolved {
                kind: to,
                boundary: true,
            },
            None => Resolved {
                kind,
                boundary: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_cover_dom_events() {
        let config = Config::default();
        for kind in ["click", "keydown", "focusin", "DOMContentLoaded", "scroll"] {
            assert!(config.is_native(kind), "{kind} should be native");
        }
        for kind in ["bs", "foobar", "show", "mouseenter"] {
            assert!(!config.is_native(kind), "{kind} should be custom");
        }
    }

    #[test]
    fn unaliased_types_resolve_to_themselves() {
        let config = Config::default();
        assert_eq!(
            config.resolve("click"),
            Resolved {
                kind: "click",
                boundary: false
            }
        );
        assert_eq!(config.resolve("mouseleave").kind, "mouseout");
    }

    #[test]
    fn empty_config_treats_everything_as_custom() {
        let config = Config::empty();
        assert!(!config.is_native("click"));
        assert!(!config.resolve("mouseenter").boundary);
    }

    #[test]
    fn builder_accepts_owned_names() {
        let name = alloc::string::String::from("toggle");
        let config = Config::empty().with_native_event(name);
        assert!(config.is_native("toggle"));
    }
}
