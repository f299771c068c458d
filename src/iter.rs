//! Lazy, restartable views over an element's children and attributes.
//!
//! Iterators re-evaluate their position against the live document on every
//! step, so mutations made between `next()` calls are visible. An iterable
//! can be iterated any number of times; each `iter()` starts from the
//! current first match.

use crate::arena_dom::{AttrKey, ElementData};
use crate::dom::{XmlAttribute, XmlElement};

#[derive(Clone)]
struct NameFilter {
    namespace: Option<String>,
    local: String,
}

impl NameFilter {
    fn matches(&self, elem: &ElementData) -> bool {
        elem.name.namespace == self.namespace && elem.name.local == self.local
    }
}

/// A re-iterable view over the child elements of one element. Non-element
/// children (text, processing instructions) are always skipped.
pub struct ElementIterable {
    parent: XmlElement,
    filter: Option<NameFilter>,
}

impl ElementIterable {
    pub(crate) fn all(parent: XmlElement) -> Self {
        ElementIterable {
            parent,
            filter: None,
        }
    }

    pub(crate) fn named(parent: XmlElement, namespace: Option<String>, local: String) -> Self {
        ElementIterable {
            parent,
            filter: Some(NameFilter { namespace, local }),
        }
    }

    pub fn iter(&self) -> ElementIter {
        ElementIter {
            parent: self.parent.clone(),
            filter: self.filter.clone(),
            index: 0,
        }
    }
}

impl IntoIterator for &ElementIterable {
    type Item = XmlElement;
    type IntoIter = ElementIter;

    fn into_iter(self) -> ElementIter {
        self.iter()
    }
}

pub struct ElementIter {
    parent: XmlElement,
    filter: Option<NameFilter>,
    index: usize,
}

impl Iterator for ElementIter {
    type Item = XmlElement;

    fn next(&mut self) -> Option<XmlElement> {
        let doc = self.parent.doc();
        loop {
            // positional lookup against the live child list
            let matched = {
                let d = doc.borrow();
                let child = d.children(self.parent.id()).nth(self.index)?;
                match d.get(child).element() {
                    Some(elem)
                        if self
                            .filter
                            .as_ref()
                            .is_none_or(|filter| filter.matches(elem)) =>
                    {
                        Some(child)
                    }
                    _ => None,
                }
            };
            self.index += 1;
            if let Some(id) = matched {
                return Some(XmlElement::from_parts(
                    self.parent.format().clone(),
                    doc,
                    id,
                ));
            }
        }
    }
}

enum AttrFilter {
    All,
    InNamespace(Option<String>),
}

impl AttrFilter {
    fn matches(&self, key: &AttrKey) -> bool {
        match self {
            AttrFilter::All => true,
            AttrFilter::InNamespace(ns) => key.namespace == *ns,
        }
    }
}

/// A re-iterable view over the attributes of one element, in document
/// order. Namespace declarations count as attributes, like in the DOM.
pub struct AttributeIterable {
    owner: XmlElement,
    filter: AttrFilter,
}

impl AttributeIterable {
    pub(crate) fn all(owner: XmlElement) -> Self {
        AttributeIterable {
            owner,
            filter: AttrFilter::All,
        }
    }

    pub(crate) fn in_namespace(owner: XmlElement, namespace: Option<String>) -> Self {
        AttributeIterable {
            owner,
            filter: AttrFilter::InNamespace(namespace),
        }
    }

    pub fn iter(&self) -> AttributeIter {
        AttributeIter {
            owner: self.owner.clone(),
            filter: match &self.filter {
                AttrFilter::All => AttrFilter::All,
                AttrFilter::InNamespace(ns) => AttrFilter::InNamespace(ns.clone()),
            },
            index: 0,
        }
    }
}

impl IntoIterator for &AttributeIterable {
    type Item = XmlAttribute;
    type IntoIter = AttributeIter;

    fn into_iter(self) -> AttributeIter {
        self.iter()
    }
}

pub struct AttributeIter {
    owner: XmlElement,
    filter: AttrFilter,
    index: usize,
}

impl Iterator for AttributeIter {
    type Item = XmlAttribute;

    fn next(&mut self) -> Option<XmlAttribute> {
        let doc = self.owner.doc();
        loop {
            let matched = {
                let d = doc.borrow();
                let elem = d.get(self.owner.id()).element()?;
                let (key, _) = elem.attrs.get_index(self.index)?;
                if self.filter.matches(key) {
                    Some(key.clone())
                } else {
                    None
                }
            };
            self.index += 1;
            if let Some(key) = matched {
                return Some(XmlAttribute::new(self.owner.clone(), key));
            }
        }
    }
}
