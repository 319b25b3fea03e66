// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event name parsing.
//!
//! Callers address listeners with strings of three shapes:
//!
//! - `type`: a plain event type, for example `click`.
//! - `type.ns1.ns2`: a type with namespace tags. Tags are unordered and
//!   de-duplicated, so `click.a.b` and `click.b.a.a` name the same set.
//! - `.ns1.ns2`: namespace-only. Only valid for removal, where it selects
//!   listeners of every type that carry the tags.
//!
//! ```
//! use understory_listener::name::{EventName, Namespaces};
//!
//! let parsed = EventName::parse("show.bs.modal").unwrap();
//! assert_eq!(parsed.kind(), Some("show"));
//! assert_eq!(parsed.namespaces(), &Namespaces::from_tags(["modal", "bs"]));
//!
//! assert!(matches!(EventName::parse(".bs"), Some(EventName::NamespaceOnly(_))));
//! assert!(EventName::parse("").is_none());
//! ```

use alloc::boxed::Box;
use core::fmt;

use smallvec::SmallVec;

/// Sorted, de-duplicated set of namespace tags.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespaces(SmallVec<[Box<str>; 2]>);

impl Namespaces {
    /// The empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from tags; empty tags are skipped.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tags: SmallVec<[Box<str>; 2]> = tags
            .into_iter()
            .filter(|tag| !tag.is_empty())
            .map(Box::from)
            .collect();
        tags.sort_unstable();
        tags.dedup();
        Self(tags)
    }

    /// Whether the set has no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|tag| &**tag)
    }

    /// Whether `tag` is in the set.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.binary_search_by(|t| (**t).cmp(tag)).is_ok()
    }

    /// Whether every tag of `other` is also in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.iter().all(|tag| self.contains(tag))
    }

    /// Whether a listener carrying `self` is selected by a request carrying `requested`.
    ///
    /// A request without namespaces selects every listener, and a listener
    /// without namespaces is selected by every request. Otherwise the
    /// listener's tags must include all requested tags.
    ///
    /// ```
    /// use understory_listener::name::Namespaces;
    ///
    /// let listener = Namespaces::from_tags(["bs", "modal"]);
    /// assert!(listener.admits(&Namespaces::new()));
    /// assert!(listener.admits(&Namespaces::from_tags(["bs"])));
    /// assert!(!listener.admits(&Namespaces::from_tags(["tooltip"])));
    /// assert!(Namespaces::new().admits(&Namespaces::from_tags(["tooltip"])));
    /// ```
    pub fn admits(&self, requested: &Self) -> bool {
        requested.is_empty() || self.is_empty() || self.is_superset(requested)
    }
}

impl fmt::Debug for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Namespaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tag in self.iter() {
            write!(f, ".{tag}")?;
        }
        Ok(())
    }
}

/// A parsed event name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventName<'a> {
    /// `type` or `type.ns...`.
    Typed {
        /// The event type with namespaces stripped.
        kind: &'a str,
        /// Namespace tags, possibly empty.
        namespaces: Namespaces,
    },
    /// `.ns...`: namespace tags without a type.
    NamespaceOnly(Namespaces),
}

impl<'a> EventName<'a> {
    /// Parse a raw event name.
    ///
    /// Returns `None` for names that cannot address anything: empty strings,
    /// names containing whitespace, and `.` runs without any tag.
    pub fn parse(raw: &'a str) -> Option<Self> {
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return None;
        }
        let (kind, rest) = raw.split_once('.').unwrap_or((raw, ""));
        let namespaces = Namespaces::from_tags(rest.split('.'));
        if !kind.is_empty() {
            return Some(Self::Typed { kind, namespaces });
        }
        if namespaces.is_empty() {
            None
        } else {
            Some(Self::NamespaceOnly(namespaces))
        }
    }

    /// The event type, or `None` for namespace-only names.
    pub fn kind(&self) -> Option<&'a str> {
        match self {
            Self::Typed { kind, .. } => Some(kind),
            Self::NamespaceOnly(_) => None,
        }
    }

    /// The namespace tags.
    pub fn namespaces(&self) -> &Namespaces {
        match self {
            Self::Typed { namespaces, .. } | Self::NamespaceOnly(namespaces) => namespaces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    #[test]
    fn plain_type_has_no_namespaces() {
        let parsed = EventName::parse("click").unwrap();
        assert_eq!(parsed.kind(), Some("click"));
        assert!(parsed.namespaces().is_empty());
    }

    #[test]
    fn namespaces_are_sorted_and_deduplicated() {
        let parsed = EventName::parse("click.b.a.b").unwrap();
        assert_eq!(parsed.kind(), Some("click"));
        assert_eq!(parsed.namespaces().iter().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(parsed, EventName::parse("click.a.b").unwrap());
    }

    #[test]
    fn empty_segments_are_ignored() {
        let parsed = EventName::parse("click..a.").unwrap();
        assert_eq!(parsed.namespaces().iter().collect::<Vec<_>>(), ["a"]);
        let bare = EventName::parse("click.").unwrap();
        assert!(bare.namespaces().is_empty());
    }

    #[test]
    fn leading_dot_is_namespace_only() {
        let parsed = EventName::parse(".bs.modal").unwrap();
        assert_eq!(parsed.kind(), None);
        assert_eq!(
            parsed,
            EventName::NamespaceOnly(Namespaces::from_tags(["modal", "bs"]))
        );
    }

    #[test]
    fn unusable_names_are_rejected() {
        for raw in ["", " ", ".", "..", "click me", " click", "click.\tns"] {
            assert!(EventName::parse(raw).is_none(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn superset_and_admission() {
        let ab = Namespaces::from_tags(["a", "b"]);
        let a = Namespaces::from_tags(["a"]);
        let c = Namespaces::from_tags(["c"]);
        assert!(ab.is_superset(&a));
        assert!(!a.is_superset(&ab));
        assert!(ab.admits(&a));
        assert!(!a.admits(&ab));
        assert!(!ab.admits(&c));
        assert!(Namespaces::new().admits(&c));
    }

    #[test]
    fn display_round_trips_suffix() {
        let ns = Namespaces::from_tags(["modal", "bs"]);
        assert_eq!(ns.to_string(), ".bs.modal");
        assert_eq!(Namespaces::new().to_string(), "");
    }
}
