//! Cross-section resolver.
//!
//! A [`SectionIndex`] is built once per load cycle from the ordered list of
//! loaded sections. It answers two questions:
//!
//! - [`SectionIndex::find_all`]: every section of a `(kind, typename)` pair,
//!   in load order (possibly none).
//! - [`SectionIndex::find_exactly`]: the single section matching
//!   `(kind, typename, name)`, or a [`ReferenceError`].

use std::collections::HashMap;

use crate::error::ReferenceError;
use crate::types::{Section, SectionKind};

/// Tagged outcome of an "exactly one" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a Section),
    NotFound,
    Ambiguous(usize),
}

/// Index over every section of one load cycle.
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    sections: Vec<Section>,
    by_kind: HashMap<SectionKind, Vec<usize>>,
    by_name: HashMap<(SectionKind, String), Vec<usize>>,
}

impl SectionIndex {
    pub fn new(sections: Vec<Section>) -> Self {
        let mut by_kind: HashMap<SectionKind, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<(SectionKind, String), Vec<usize>> = HashMap::new();
        for (i, section) in sections.iter().enumerate() {
            by_kind.entry(section.kind()).or_default().push(i);
            by_name
                .entry((section.kind(), section.name().to_string()))
                .or_default()
                .push(i);
        }
        Self {
            sections,
            by_kind,
            by_name,
        }
    }

    /// All sections, in load order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every section of `kind`, in load order.
    pub fn of_kind(&self, kind: SectionKind) -> Vec<&Section> {
        self.by_kind
            .get(&kind)
            .map(|ids| ids.iter().map(|&i| &self.sections[i]).collect())
            .unwrap_or_default()
    }

    /// Every section whose `(kind, typename)` matches, in load order.
    ///
    /// Unknown pairs simply have no sections.
    pub fn find_all(&self, kind: &str, typename: &str) -> Vec<&Section> {
        match SectionKind::from_pair(kind, typename) {
            Some(k) => self.of_kind(k),
            None => Vec::new(),
        }
    }

    /// Tagged lookup of the section named `name` of `kind`.
    pub fn lookup(&self, kind: SectionKind, name: &str) -> Lookup<'_> {
        match self.by_name.get(&(kind, name.to_string())).map(Vec::as_slice) {
            None | Some([]) => Lookup::NotFound,
            Some([only]) => Lookup::Found(&self.sections[*only]),
            Some(many) => Lookup::Ambiguous(many.len()),
        }
    }

    /// The unique section matching `(kind, typename, name)`.
    pub fn find_exactly(
        &self,
        kind: &str,
        typename: &str,
        name: &str,
    ) -> Result<&Section, ReferenceError> {
        let lookup = match SectionKind::from_pair(kind, typename) {
            Some(k) => self.lookup(k, name),
            None => Lookup::NotFound,
        };
        match lookup {
            Lookup::Found(section) => Ok(section),
            Lookup::NotFound => Err(ReferenceError::NotFound {
                kind: kind.to_string(),
                typename: typename.to_string(),
                name: name.to_string(),
            }),
            Lookup::Ambiguous(count) => Err(ReferenceError::Ambiguous {
                kind: kind.to_string(),
                typename: typename.to_string(),
                name: name.to_string(),
                count,
            }),
        }
    }

    /// [`find_exactly`](Self::find_exactly) keyed by [`SectionKind`].
    pub fn expect_one(&self, kind: SectionKind, name: &str) -> Result<&Section, ReferenceError> {
        self.find_exactly(kind.kind(), kind.typename(), name)
    }
}

impl FromIterator<Section> for SectionIndex {
    fn from_iter<I: IntoIterator<Item = Section>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
