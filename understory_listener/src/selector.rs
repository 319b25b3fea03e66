// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small selector language for delegated listeners on [`Tree`](crate::tree::Tree).
//!
//! A selector is a comma-separated list of compound selectors. Each compound is
//! made of an optional type (`button`) or universal (`*`) part followed by any
//! number of `#id`, `.class`, `[attr]` and `[attr="value"]` parts, and matches
//! an element that satisfies all of them.
//!
//! Combinators (descendant, `>`, `+`, `~`) are not supported and are rejected
//! with [`SelectorError::Combinator`].
//!
//! ```
//! use understory_listener::selector::Selector;
//! use understory_listener::tree::Element;
//!
//! let toggle = Selector::parse(r#"button.toggle, [data-toggle="collapse"]"#).unwrap();
//! assert!(toggle.matches(&Element::new("BUTTON").with_class("toggle")));
//! assert!(toggle.matches(&Element::new("a").with_attribute("data-toggle", "collapse")));
//! assert!(!toggle.matches(&Element::new("button")));
//!
//! assert!(Selector::parse("ul > li").is_err());
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::tree::Element;

/// Reasons a selector string is rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector, or one entry of a list, is empty.
    #[error("empty selector")]
    Empty,
    /// A combinator was found; only compound selectors are supported.
    #[error("combinators are not supported (at byte {0})")]
    Combinator(usize),
    /// An attribute selector is missing its closing `]` or quote.
    #[error("unterminated attribute selector (at byte {0})")]
    Unterminated(usize),
    /// A character that cannot start or continue a selector part.
    #[error("unexpected {ch:?} (at byte {at})")]
    Unexpected {
        /// The offending character.
        ch: char,
        /// Byte offset in the source string.
        at: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Tag(Box<str>),
    Id(Box<str>),
    Class(Box<str>),
    Attribute {
        name: Box<str>,
        value: Option<Box<str>>,
    },
}

impl Part {
    fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Tag(tag) => element.tag().eq_ignore_ascii_case(tag),
            Self::Id(id) => element.id() == Some(&**id),
            Self::Class(class) => element.has_class(class),
            Self::Attribute { name, value } => match (element.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == &**expected,
                (found, None) => found.is_some(),
                (None, Some(_)) => false,
            },
        }
    }
}

/// One compound selector; `*` is the empty compound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    parts: SmallVec<[Part; 2]>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        self.parts.iter().all(|part| part.matches(element))
    }
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    /// Parse `source`.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser { source, pos: 0 };
        let mut alternatives = Vec::new();
        loop {
            parser.skip_whitespace();
            alternatives.push(parser.compound()?);
            parser.skip_whitespace();
            match parser.peek() {
                None => break,
                Some(',') => parser.pos += 1,
                Some('>' | '+' | '~') => return Err(SelectorError::Combinator(parser.pos)),
                Some(_) if parser.followed_whitespace() => {
                    return Err(SelectorError::Combinator(parser.pos));
                }
                Some(ch) => {
                    return Err(SelectorError::Unexpected { ch, at: parser.pos });
                }
            }
        }
        Ok(Self { alternatives })
    }

    /// Whether `element` matches any entry of the list.
    pub fn matches(&self, element: &Element) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn followed_whitespace(&self) -> bool {
        self.source[..self.pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn ident(&mut self) -> Result<&'a str, SelectorError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(match self.peek() {
                Some(ch) => SelectorError::Unexpected { ch, at: self.pos },
                None => SelectorError::Empty,
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                any = true;
            }
            Some(c) if c.is_alphanumeric() => {
                compound.parts.push(Part::Tag(self.ident()?.into()));
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.parts.push(Part::Id(self.ident()?.into()));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.parts.push(Part::Class(self.ident()?.into()));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.parts.push(self.attribute()?);
                }
                _ => break,
            }
        }
        if compound.parts.is_empty() && !any {
            return Err(match self.peek() {
                None | Some(',') => SelectorError::Empty,
                Some('>' | '+' | '~') => SelectorError::Combinator(self.pos),
                Some(ch) => SelectorError::Unexpected { ch, at: self.pos },
            });
        }
        Ok(compound)
    }

    // After the opening `[`.
    fn attribute(&mut self) -> Result<Part, SelectorError> {
        let start = self.pos;
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();
        let value = match self.peek() {
            Some('=') => {
                self.pos += 1;
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        let body = &self.rest()[1..];
                        let end = body
                            .find(quote)
                            .ok_or(SelectorError::Unterminated(start))?;
                        self.pos += end + 2;
                        &body[..end]
                    }
                    _ => self.ident()?,
                };
                self.skip_whitespace();
                Some(value)
            }
            _ => None,
        };
        if self.peek() != Some(']') {
            return Err(SelectorError::Unterminated(start));
        }
        self.pos += 1;
        Ok(Part::Attribute {
            name: name.into(),
            value: value.map(Into::into),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Element {
        Element::new("button")
            .with_id("go")
            .with_class("btn")
            .with_class("primary")
            .with_attribute("data-toggle", "modal")
    }

    #[test]
    fn simple_parts() {
        let el = button();
        for source in [
            "*",
            "button",
            "BUTTON",
            "#go",
            ".btn",
            ".primary.btn",
            "[data-toggle]",
            "[data-toggle=modal]",
            r#"[data-toggle="modal"]"#,
            "[ data-toggle = 'modal' ]",
            "button#go.btn[data-toggle]",
        ] {
            let selector = Selector::parse(source).unwrap();
            assert!(selector.matches(&el), "{source} should match");
        }
    }

    #[test]
    fn mismatches() {
        let el = button();
        for source in ["a", "#stop", ".btn.secondary", "[href]", r#"[data-toggle="tab"]"#] {
            let selector = Selector::parse(source).unwrap();
            assert!(!selector.matches(&el), "{source} should not match");
        }
    }

    #[test]
    fn lists_match_any_entry() {
        let selector = Selector::parse("a, .primary ,#none").unwrap();
        assert!(selector.matches(&button()));
        assert!(selector.matches(&Element::new("a")));
        assert!(!selector.matches(&Element::new("div")));
    }

    #[test]
    fn rejects_combinators_and_garbage() {
        assert_eq!(Selector::parse("div p"), Err(SelectorError::Combinator(4)));
        assert_eq!(Selector::parse("div>p"), Err(SelectorError::Combinator(3)));
        assert_eq!(Selector::parse("> p"), Err(SelectorError::Combinator(0)));
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("a,"), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("a,,b"), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("[x"), Err(SelectorError::Unterminated(1)));
        assert_eq!(Selector::parse(r#"[x="y]"#), Err(SelectorError::Unterminated(1)));
        assert_eq!(
            Selector::parse("a!"),
            Err(SelectorError::Unexpected { ch: '!', at: 1 })
        );
        assert_eq!(
            Selector::parse(".!"),
            Err(SelectorError::Unexpected { ch: '!', at: 1 })
        );
    }
}
