// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delegated toggles, one-shot handlers and namespace teardown over the
//! reference tree.
//!
//! A collapsible panel listens for clicks on any `[data-toggle="collapse"]`
//! descendant, including buttons added after registration. Its `shown`
//! notification is consumed once, and the whole component is torn down with a
//! single namespace-only `off`.
//!
//! Run:
//! - `cargo run -p understory_demos --example listener_toggles`
//! - `RUST_LOG=understory_listener=trace cargo run -p understory_demos --example listener_toggles`

use std::cell::Cell;
use std::rc::Rc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_listener::tree::{Element, NodeId, Tree};
use understory_listener::{Callback, EventHandler, EventInit};

type Cb = Callback<Tree>;

fn is_open(handler: &EventHandler<Tree>, panel: NodeId) -> bool {
    handler.host().element(panel).is_some_and(|e| e.has_class("show"))
}

fn toggle(handler: &mut EventHandler<Tree>, panel: NodeId) {
    let open = is_open(handler, panel);
    let next = if open { "hide.collapse" } else { "show.collapse" };
    if handler.trigger(panel, next) {
        info!(next, "transition vetoed");
        return;
    }
    if open {
        handler.host_mut().remove_class(panel, "show");
        handler.trigger(panel, "hidden.collapse");
    } else {
        handler.host_mut().add_class(panel, "show");
        handler.trigger_with(
            panel,
            "shown.collapse",
            EventInit::default().with_detail("panel"),
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // document > div#accordion > (button[data-toggle] , div.collapse#body)
    let mut tree = Tree::new();
    let accordion = tree.insert(
        Some(tree.document()),
        Element::new("div").with_id("accordion"),
    );
    let button = tree.insert(
        Some(accordion),
        Element::new("button").with_attribute("data-toggle", "collapse"),
    );
    let body = tree.insert(
        Some(accordion),
        Element::new("div").with_id("body").with_class("collapse"),
    );
    let mut handler = EventHandler::new(tree);

    handler.on_delegated(
        accordion,
        "click.collapse",
        r#"[data-toggle="collapse"]"#,
        Cb::new(move |handler, event| {
            info!(trigger = ?event.delegate_target(), "toggle requested");
            event.prevent_default();
            toggle(handler, body);
        }),
    );

    let shown = Rc::new(Cell::new(0));
    let s = shown.clone();
    handler.one(
        body,
        "shown.collapse.first",
        Cb::new(move |_, event| {
            s.set(s.get() + 1);
            info!(detail = ?event.detail::<&str>(), "first reveal");
        }),
    );
    handler.on(
        body,
        "hide.collapse",
        Cb::new(|handler, event| {
            // Pinned panels stay open.
            let pinned = handler
                .host()
                .element(event.target())
                .is_some_and(|e| e.attribute("data-pinned").is_some());
            if pinned {
                event.prevent_default();
            }
        }),
    );

    handler.trigger(button, "click");
    handler.trigger(button, "click");
    handler.trigger(button, "click");
    let open = is_open(&handler, body);
    info!(reveals = shown.get(), open, "after three clicks");

    handler.host_mut().set_attribute(body, "data-pinned", "");
    handler.trigger(button, "click");

    // A button added later is picked up by the delegated listener.
    let late = handler.host_mut().insert(
        Some(accordion),
        Element::new("a").with_attribute("data-toggle", "collapse"),
    );
    handler.trigger(late, "click");

    info!(listeners = handler.len(), "before teardown");
    handler.off(accordion, ".collapse", None);
    handler.off(body, ".collapse", None);
    info!(listeners = handler.len(), "after teardown");

    // A component that skipped its own teardown is cleaned up with its elements.
    handler.on(button, "focus", Cb::new(|_, _| {}));
    let removed = handler.remove_element(accordion);
    debug_assert!(handler.is_empty(), "removed elements keep no listeners");
    info!(
        removed = removed.len(),
        listeners = handler.len(),
        "accordion removed"
    );
}
