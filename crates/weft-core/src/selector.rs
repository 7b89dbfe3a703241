#![forbid(unsafe_code)]

//! Delegation selectors.
//!
//! A small subset of CSS: compound selectors made of an optional tag, an
//! optional `#id` and any number of `.class` parts, joined into alternatives
//! with `,`. That covers delegated listeners such as
//! `".neo-c-w-column"` or `"div.event, div.header"`.

use crate::error::{Error, Result};
use crate::event::PathNode;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(src: &str) -> Option<Self> {
        let mut out = Self::default();
        let mut rest = src;

        let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
        if tag_end > 0 {
            let tag = &rest[..tag_end];
            if !is_ident(tag) {
                return None;
            }
            out.tag = Some(tag.to_owned());
        }
        rest = &rest[tag_end..];

        while let Some(sigil) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let part = &body[..end];
            if !is_ident(part) {
                return None;
            }
            match sigil {
                '.' => out.classes.push(part.to_owned()),
                '#' if out.id.is_none() => out.id = Some(part.to_owned()),
                _ => return None,
            }
            rest = &body[end..];
        }

        if out.tag.is_none() && out.id.is_none() && out.classes.is_empty() {
            return None;
        }
        Some(out)
    }

    fn matches(&self, node: &PathNode) -> bool {
        self.tag.as_deref().is_none_or(|t| t == node.tag)
            && self
                .id
                .as_deref()
                .is_none_or(|id| node.id.as_deref() == Some(id))
            && self.classes.iter().all(|c| node.has_class(c))
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for cls in &self.classes {
            write!(f, ".{cls}")?;
        }
        Ok(())
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A parsed delegation selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

impl Selector {
    pub fn parse(src: &str) -> Result<Self> {
        let alternatives = src
            .split(',')
            .map(|part| Compound::parse(part.trim()))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidSelector(src.to_owned()))?;
        Ok(Self { alternatives })
    }

    #[must_use]
    pub fn matches(&self, node: &PathNode) -> bool {
        self.alternatives.iter().any(|c| c.matches(node))
    }

    /// Index of the first node on `path` that matches.
    #[must_use]
    pub fn first_match(&self, path: &[PathNode]) -> Option<usize> {
        path.iter().position(|n| self.matches(n))
    }
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.alternatives.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_matching() {
        let sel = Selector::parse("div.event.selected").unwrap();
        let node = PathNode::new("div")
            .with_class("event")
            .with_class("selected");
        assert!(sel.matches(&node));
        assert!(!sel.matches(&PathNode::new("div").with_class("event")));
    }

    #[test]
    fn alternatives_and_ids() {
        let sel: Selector = "#header, .neo-c-w-column".parse().unwrap();
        assert!(sel.matches(&PathNode::new("div").with_id("header")));
        assert!(sel.matches(&PathNode::new("span").with_class("neo-c-w-column")));
        assert_eq!(sel.to_string(), "#header, .neo-c-w-column");
    }

    #[test]
    fn first_match_walks_outwards() {
        let sel = Selector::parse(".column").unwrap();
        let path = vec![
            PathNode::new("span"),
            PathNode::new("div").with_class("column"),
            PathNode::new("div").with_class("column"),
        ];
        assert_eq!(sel.first_match(&path), Some(1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div > span").is_err());
        assert!(Selector::parse("#a#b").is_err());
        assert!(Selector::parse("a,").is_err());
    }
}
