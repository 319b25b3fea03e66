// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation order: capture → target → bubble.
//!
//! [`path`] reconstructs the root→target path through [`Host::parent_of`],
//! [`sequence`] expands it into dispatch steps, and [`run`] walks the steps
//! and honors [`Outcome::Stop`].
//!
//! ```
//! use understory_listener::event::Phase;
//! use understory_listener::propagation::{self, Dispatch, Outcome};
//!
//! let seq = propagation::sequence(&[1_u32, 2, 3], true);
//! assert_eq!(seq, vec![
//!     Dispatch::capture(1), Dispatch::capture(2),
//!     Dispatch::target(3),
//!     Dispatch::bubble(2), Dispatch::bubble(1),
//! ]);
//!
//! let mut seen = Vec::new();
//! let stopped = propagation::run(&seq, &mut seen, |d, seen| {
//!     seen.push(d.node);
//!     if d.phase == Phase::Target { Outcome::Stop } else { Outcome::Continue }
//! });
//! assert_eq!(stopped, Some(&Dispatch::target(3)));
//! assert_eq!(seen, vec![1, 2, 3]);
//! ```

use alloc::vec::Vec;

use crate::event::Phase;
use crate::host::Host;

/// One step of a propagation sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<N> {
    /// Phase of this step.
    pub phase: Phase,
    /// Node whose listeners run in this step.
    pub node: N,
}

impl<N> Dispatch<N> {
    /// A capture step.
    pub const fn capture(node: N) -> Self {
        Self {
            phase: Phase::Capture,
            node,
        }
    }

    /// The target step.
    pub const fn target(node: N) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble step.
    pub const fn bubble(node: N) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }
}

/// Whether propagation continues after a step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Visit the next step.
    Continue,
    /// Abort; no later step runs.
    Stop,
}

/// Root→target path of `target`, inclusive at both ends.
pub fn path<H: Host + ?Sized>(host: &H, target: H::Node) -> Vec<H::Node> {
    let mut out = Vec::new();
    let mut cur = target;
    // Collect to root; the host guarantees acyclic ancestry.
    loop {
        out.push(cur);
        match host.parent_of(cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out.reverse();
    out
}

/// Expand a root→target path into dispatch steps.
///
/// Ancestors get a capture step (root first) and, when `bubbles`, a bubble
/// step (parent first). The last node gets the single target step. An empty
/// path yields no steps.
pub fn sequence<N: Copy>(path: &[N], bubbles: bool) -> Vec<Dispatch<N>> {
    let Some((&target, ancestors)) = path.split_last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(ancestors.len() * 2 + 1);
    out.extend(ancestors.iter().map(|&n| Dispatch::capture(n)));
    out.push(Dispatch::target(target));
    if bubbles {
        out.extend(ancestors.iter().rev().map(|&n| Dispatch::bubble(n)));
    }
    out
}

/// Run `handler` over `seq` in order.
///
/// Returns the step at which a handler returned [`Outcome::Stop`], or `None`
/// if every step was visited.
pub fn run<'a, N, E>(
    seq: &'a [Dispatch<N>],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch<N>, &mut E) -> Outcome,
) -> Option<&'a Dispatch<N>> {
    for d in seq {
        match handler(d, event) {
            Outcome::Continue => {}
            Outcome::Stop => return Some(d),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ElementId, HostError, ListenerId};
    use alloc::vec;

    struct Chain;

    // 1 <- 2 <- 3
    impl Host for Chain {
        type Node = u32;

        fn is_alive(&self, _: u32) -> bool {
            true
        }

        fn parent_of(&self, node: u32) -> Option<u32> {
            (node > 1 && node <= 3).then(|| node - 1)
        }

        fn matches(&self, _: u32, _: &str) -> bool {
            false
        }

        fn element_id(&self, _: u32) -> Option<ElementId> {
            None
        }

        fn set_element_id(&mut self, _: u32, _: Option<ElementId>) -> Result<(), HostError> {
            Ok(())
        }

        fn subscribe(&mut self, _: u32, _: &str, _: ListenerId, _: bool) -> Result<(), HostError> {
            Ok(())
        }

        fn unsubscribe(&mut self, _: u32, _: &str, _: ListenerId) -> Result<(), HostError> {
            Ok(())
        }

        fn subscriptions(&self, _: u32, _: &str, _: Phase) -> Vec<ListenerId> {
            Vec::new()
        }
    }

    #[test]
    fn path_runs_root_to_target() {
        assert_eq!(path(&Chain, 3), vec![1, 2, 3]);
        assert_eq!(path(&Chain, 1), vec![1]);
    }

    #[test]
    fn non_bubbling_sequence_has_no_bubble_steps() {
        let seq = sequence(&[1_u32, 2, 3], false);
        assert_eq!(
            seq,
            vec![Dispatch::capture(1), Dispatch::capture(2), Dispatch::target(3)]
        );
    }

    #[test]
    fn singleton_and_empty_paths() {
        assert_eq!(sequence(&[7_u32], true), vec![Dispatch::target(7)]);
        assert!(sequence::<u32>(&[], true).is_empty());
    }

    #[test]
    fn run_visits_everything_without_stop() {
        let seq = sequence(&path(&Chain, 3), true);
        let mut seen: Vec<(Phase, u32)> = Vec::new();
        let stopped = run(&seq, &mut seen, |d, seen| {
            seen.push((d.phase, d.node));
            Outcome::Continue
        });
        assert!(stopped.is_none());
        assert_eq!(
            seen,
            vec![
                (Phase::Capture, 1),
                (Phase::Capture, 2),
                (Phase::Target, 3),
                (Phase::Bubble, 2),
                (Phase::Bubble, 1),
            ]
        );
    }

    #[test]
    fn stop_in_capture_skips_target_and_bubble() {
        let seq = sequence(&[1_u32, 2, 3], true);
        let mut seen: Vec<(Phase, u32)> = Vec::new();
        let stopped = run(&seq, &mut seen, |d, seen| {
            seen.push((d.phase, d.node));
            if d.phase == Phase::Capture && d.node == 1 {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        assert_eq!(stopped, Some(&Dispatch::capture(1)));
        assert_eq!(seen, vec![(Phase::Capture, 1)]);
    }

    #[test]
    fn stop_in_bubble_skips_remaining_ancestors() {
        let seq = sequence(&[1_u32, 2, 3], true);
        let mut seen: Vec<(Phase, u32)> = Vec::new();
        let stopped = run(&seq, &mut seen, |d, seen| {
            seen.push((d.phase, d.node));
            if d.phase == Phase::Bubble {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        assert_eq!(stopped, Some(&Dispatch::bubble(2)));
        assert_eq!(seen.last(), Some(&(Phase::Bubble, 2)));
        assert_eq!(seen.len(), 4);
    }
}
