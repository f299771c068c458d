//! Element and attribute handles.
//!
//! A handle names a node: it holds the owning document and the node's
//! arena id, never the node data itself. Cloning a handle is cheap and the
//! clone stays aimed at the same node through any mutation, including
//! cross-document adoption (the clones share one target cell, which
//! adoption rewrites in place).
//!
//! Handles compare by identity: same document, same node. Two handles on
//! structurally equal but distinct nodes are not equal.

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::rc::Rc;
use std::sync::Arc;

use indextree::NodeId;

use crate::arena_dom::{AttrKey, AttrValue, Document, XML_NAMESPACE, XMLNS_NAMESPACE};
use crate::error::{Error, Result};
use crate::format::XmlDataFormat;
use crate::iter::{AttributeIterable, ElementIterable};
use crate::query::XPathQuery;
use crate::serialize::{self, is_ncname};

/// Where a handle points. Shared (via `Rc`) between a handle and its
/// clones so retargeting on adoption reaches all of them.
#[derive(Debug)]
pub(crate) struct Target {
    pub(crate) doc: Rc<RefCell<Document>>,
    pub(crate) id: NodeId,
}

/// Handle on an element node.
#[derive(Clone)]
pub struct XmlElement {
    format: Arc<XmlDataFormat>,
    target: Rc<RefCell<Target>>,
}

impl XmlElement {
    pub(crate) fn from_parts(
        format: Arc<XmlDataFormat>,
        doc: Rc<RefCell<Document>>,
        id: NodeId,
    ) -> Self {
        XmlElement {
            format,
            target: Rc::new(RefCell::new(Target { doc, id })),
        }
    }

    pub(crate) fn format(&self) -> &Arc<XmlDataFormat> {
        &self.format
    }

    pub(crate) fn doc(&self) -> Rc<RefCell<Document>> {
        self.target.borrow().doc.clone()
    }

    pub(crate) fn id(&self) -> NodeId {
        self.target.borrow().id
    }

    // --- names ---

    /// Local name.
    pub fn name(&self) -> String {
        let doc = self.doc();
        let d = doc.borrow();
        d.get(self.id())
            .element()
            .map(|e| e.name.local.clone())
            .unwrap_or_default()
    }

    /// Namespace URI, `None` for the null namespace.
    pub fn namespace(&self) -> Option<String> {
        let doc = self.doc();
        let d = doc.borrow();
        d.get(self.id()).element().and_then(|e| e.name.namespace.clone())
    }

    /// Prefix the element was written with.
    pub fn prefix(&self) -> Option<String> {
        let doc = self.doc();
        let d = doc.borrow();
        d.get(self.id()).element().and_then(|e| e.name.prefix.clone())
    }

    pub fn has_namespace(&self, namespace: Option<&str>) -> bool {
        self.namespace().as_deref() == namespace
    }

    pub fn has_prefix(&self, prefix: Option<&str>) -> bool {
        self.prefix().as_deref() == prefix
    }

    // --- attributes ---

    /// Attribute in the null namespace.
    pub fn attr(&self, name: &str) -> Result<XmlAttribute> {
        self.attr_ns(None, name)
    }

    /// Attribute with the given namespace and local name.
    pub fn attr_ns(&self, namespace: Option<&str>, name: &str) -> Result<XmlAttribute> {
        let key = AttrKey {
            namespace: namespace.map(str::to_string),
            local: name.to_string(),
        };
        if !self.contains_attr(&key) {
            return Err(Error::AttributeNotFound {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
            });
        }
        Ok(XmlAttribute::new(self.clone(), key))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.has_attr_ns(None, name)
    }

    pub fn has_attr_ns(&self, namespace: Option<&str>, name: &str) -> bool {
        self.contains_attr(&AttrKey {
            namespace: namespace.map(str::to_string),
            local: name.to_string(),
        })
    }

    fn contains_attr(&self, key: &AttrKey) -> bool {
        let doc = self.doc();
        let d = doc.borrow();
        d.get(self.id())
            .element()
            .is_some_and(|e| e.attrs.contains_key(key))
    }

    /// Set an unprefixed attribute in the null namespace.
    pub fn set_attr(&self, name: &str, value: &str) -> Result<()> {
        if !is_ncname(name) {
            return Err(Error::AttributeSetFailed {
                name: name.to_string(),
                reason: "not a valid attribute name".to_string(),
            });
        }
        self.insert_attr(
            AttrKey::local(name),
            AttrValue {
                prefix: None,
                value: value.to_string(),
            },
        );
        Ok(())
    }

    /// Set a namespaced attribute. `qualified_name` is `local` or
    /// `prefix:local`; the reserved `xml` and `xmlns` prefixes are only
    /// accepted together with their fixed namespaces.
    pub fn set_attr_ns(
        &self,
        namespace: Option<&str>,
        qualified_name: &str,
        value: &str,
    ) -> Result<()> {
        let (prefix, local) = match qualified_name.split_once(':') {
            Some((p, l)) => (Some(p), l),
            None => (None, qualified_name),
        };
        if !is_ncname(local) || prefix.is_some_and(|p| !is_ncname(p)) {
            return Err(Error::AttributeSetFailed {
                name: qualified_name.to_string(),
                reason: "not a valid qualified name".to_string(),
            });
        }
        if prefix.is_some() && namespace.is_none() {
            return Err(Error::AttributeSetFailed {
                name: qualified_name.to_string(),
                reason: "a prefixed attribute needs a namespace".to_string(),
            });
        }
        if prefix == Some("xml") && namespace != Some(XML_NAMESPACE) {
            return Err(Error::AttributeSetFailed {
                name: qualified_name.to_string(),
                reason: format!("the 'xml' prefix is reserved for {XML_NAMESPACE}"),
            });
        }
        if (prefix == Some("xmlns") || qualified_name == "xmlns")
            && namespace != Some(XMLNS_NAMESPACE)
        {
            return Err(Error::AttributeSetFailed {
                name: qualified_name.to_string(),
                reason: format!("the 'xmlns' prefix is reserved for {XMLNS_NAMESPACE}"),
            });
        }
        self.insert_attr(
            AttrKey {
                namespace: namespace.map(str::to_string),
                local: local.to_string(),
            },
            AttrValue {
                prefix: prefix.map(str::to_string),
                value: value.to_string(),
            },
        );
        Ok(())
    }

    fn insert_attr(&self, key: AttrKey, value: AttrValue) {
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        let id = self.id();
        if let Some(elem) = d.get_mut(id).element_mut() {
            elem.attrs.insert(key, value);
        }
    }

    /// Remove an attribute in the null namespace. Removing an attribute
    /// that is not there is not an error.
    pub fn remove_attr(&self, name: &str) {
        self.remove_attr_ns(None, name);
    }

    /// Remove a namespaced attribute, idempotently.
    pub fn remove_attr_ns(&self, namespace: Option<&str>, name: &str) {
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        let id = self.id();
        if let Some(elem) = d.get_mut(id).element_mut() {
            elem.attrs.shift_remove(&AttrKey {
                namespace: namespace.map(str::to_string),
                local: name.to_string(),
            });
        }
    }

    /// All attributes, in document order. Namespace declarations included.
    pub fn attrs(&self) -> AttributeIterable {
        AttributeIterable::all(self.clone())
    }

    /// Attributes in the given namespace.
    pub fn attrs_ns(&self, namespace: Option<&str>) -> AttributeIterable {
        AttributeIterable::in_namespace(self.clone(), namespace.map(str::to_string))
    }

    /// Local names of all attributes, in document order.
    pub fn attr_names(&self) -> Vec<String> {
        self.attrs().iter().map(|a| a.name()).collect()
    }

    pub fn attr_names_ns(&self, namespace: Option<&str>) -> Vec<String> {
        self.attrs_ns(namespace).iter().map(|a| a.name()).collect()
    }

    // --- content ---

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let doc = self.doc();
        let d = doc.borrow();
        d.string_value(self.id())
    }

    /// Drop all children and replace them with a single text node
    /// (no node at all for the empty string).
    pub fn set_text_content(&self, text: &str) {
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        let id = self.id();
        let children: Vec<NodeId> = id.children(&d.arena).collect();
        for child in children {
            child.detach(&mut d.arena);
        }
        if !text.is_empty() {
            let node = d.new_text(text);
            id.append(node, &mut d.arena);
        }
    }

    // --- navigation ---

    /// Lazy view over all child elements.
    pub fn child_elements(&self) -> ElementIterable {
        ElementIterable::all(self.clone())
    }

    /// Child elements with this element's own namespace and the given
    /// local name. Fails when there are none.
    pub fn child_elements_named(&self, name: &str) -> Result<Vec<XmlElement>> {
        let ns = self.namespace();
        self.child_elements_ns(ns.as_deref(), name)
    }

    /// Child elements with the given namespace and local name. Fails when
    /// there are none.
    pub fn child_elements_ns(
        &self,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Vec<XmlElement>> {
        let found: Vec<XmlElement> = ElementIterable::named(
            self.clone(),
            namespace.map(str::to_string),
            name.to_string(),
        )
        .iter()
        .collect();
        if found.is_empty() {
            return Err(Error::ChildElementNotFound {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
            });
        }
        Ok(found)
    }

    /// The single child element with this element's own namespace and the
    /// given local name.
    pub fn child_element(&self, name: &str) -> Result<XmlElement> {
        let ns = self.namespace();
        self.child_element_ns(ns.as_deref(), name)
    }

    /// The single child element with the given namespace and local name.
    /// Zero matches and more than one match are both errors.
    pub fn child_element_ns(&self, namespace: Option<&str>, name: &str) -> Result<XmlElement> {
        let mut iter = ElementIterable::named(
            self.clone(),
            namespace.map(str::to_string),
            name.to_string(),
        )
        .iter();
        let first = iter.next().ok_or_else(|| Error::ChildElementNotFound {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
        })?;
        if iter.next().is_some() {
            return Err(Error::MultipleChildElementsFound {
                namespace: namespace.map(str::to_string),
                name: name.to_string(),
            });
        }
        Ok(first)
    }

    // --- mutation ---

    /// Append child elements, adopting each from its own document first.
    /// Not transactional: children appended before a failure stay appended.
    pub fn append(&self, children: &[&XmlElement]) -> Result<()> {
        for child in children {
            self.adopt(child)?;
            let doc = self.doc();
            let mut d = doc.borrow_mut();
            self.id()
                .checked_append(child.id(), &mut d.arena)
                .map_err(|_| Error::AppendFailed)?;
        }
        Ok(())
    }

    pub fn append_child(&self, child: &XmlElement) -> Result<()> {
        self.append(&[child])
    }

    /// Insert `child` directly before `reference`, which must be an
    /// existing child of this element.
    pub fn append_before(&self, child: &XmlElement, reference: &XmlElement) -> Result<()> {
        self.ensure_child(reference)?;
        self.adopt(child)?;
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        reference
            .id()
            .checked_insert_before(child.id(), &mut d.arena)
            .map_err(|_| Error::AppendFailed)
    }

    /// Insert `child` directly after `reference`, which must be an
    /// existing child of this element.
    pub fn append_after(&self, child: &XmlElement, reference: &XmlElement) -> Result<()> {
        self.ensure_child(reference)?;
        self.adopt(child)?;
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        reference
            .id()
            .checked_insert_after(child.id(), &mut d.arena)
            .map_err(|_| Error::AppendFailed)
    }

    /// Detach child elements. Not transactional. The detached nodes stay
    /// alive; their handles still work and they can be re-appended.
    pub fn remove(&self, children: &[&XmlElement]) -> Result<()> {
        for child in children {
            self.ensure_child(child)?;
            let doc = self.doc();
            let mut d = doc.borrow_mut();
            child.id().detach(&mut d.arena);
        }
        Ok(())
    }

    pub fn remove_child(&self, child: &XmlElement) -> Result<()> {
        self.remove(&[child])
    }

    /// Replace this element with `replacement` in this element's parent.
    /// The replacement is adopted before the parent is checked, so a
    /// parentless target still pulls the replacement into its document.
    pub fn replace(&self, replacement: &XmlElement) -> Result<XmlElement> {
        self.adopt(replacement)?;
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        let id = self.id();
        if d.arena[id].parent().is_none() {
            return Err(Error::ElementHasNoParent);
        }
        id.checked_insert_before(replacement.id(), &mut d.arena)
            .map_err(|_| Error::ReplaceFailed)?;
        id.detach(&mut d.arena);
        Ok(replacement.clone())
    }

    /// Replace the child `existing` with `replacement`.
    pub fn replace_child(&self, existing: &XmlElement, replacement: &XmlElement) -> Result<()> {
        self.ensure_child(existing)?;
        self.adopt(replacement)?;
        let doc = self.doc();
        let mut d = doc.borrow_mut();
        existing
            .id()
            .checked_insert_before(replacement.id(), &mut d.arena)
            .map_err(|_| Error::ReplaceFailed)?;
        existing.id().detach(&mut d.arena);
        Ok(())
    }

    /// Pull `node` into this element's document if it lives in another
    /// one. The subtree is copied over, the original is detached in its
    /// source document, and `node` (with all its clones) is retargeted at
    /// the copy. Handles created on the subtree before adoption keep
    /// pointing into the source document.
    fn adopt(&self, node: &XmlElement) -> Result<()> {
        let my_doc = self.doc();
        let node_doc = node.doc();
        if Rc::ptr_eq(&my_doc, &node_doc) {
            return Ok(());
        }
        let copy = {
            let src = node_doc.borrow();
            let mut dst = my_doc.borrow_mut();
            let id = node.id();
            if src.get(id).element().is_none() {
                return Err(Error::AdoptionFailed);
            }
            dst.copy_subtree_from(&src, id)
        };
        {
            let mut src = node_doc.borrow_mut();
            node.id().detach(&mut src.arena);
        }
        tracing::debug!(name = %node.name(), "adopted element into another document");
        let mut target = node.target.borrow_mut();
        target.doc = my_doc;
        target.id = copy;
        Ok(())
    }

    fn ensure_child(&self, other: &XmlElement) -> Result<()> {
        let doc = self.doc();
        if !Rc::ptr_eq(&doc, &other.doc()) {
            return Err(Error::NotAChildElement);
        }
        let d = doc.borrow();
        if d.arena[other.id()].parent() == Some(self.id()) {
            Ok(())
        } else {
            Err(Error::NotAChildElement)
        }
    }

    // --- queries and output ---

    /// Prepare an XPath query rooted at this element.
    pub fn xpath(&self, expression: impl Into<String>) -> XPathQuery {
        XPathQuery::new(self.clone(), expression.into())
    }

    /// Serialize this element per the format's writer settings. Always
    /// starts with the UTF-8 XML declaration.
    pub fn to_xml(&self) -> Result<String> {
        let doc = self.doc();
        let d = doc.borrow();
        if self.format.is_pretty_print() {
            let policy = self.format.strip_policy()?;
            Ok(serialize::serialize_pretty(&d, self.id(), &policy))
        } else {
            Ok(serialize::serialize_plain(&d, self.id()))
        }
    }

    /// Serialize into an arbitrary sink.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        let text = self.to_xml()?;
        out.write_all(text.as_bytes())
            .map_err(|e| Error::TransformationFailed(e.to_string()))
    }
}

impl PartialEq for XmlElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.doc(), &other.doc()) && self.id() == other.id()
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_xml().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl fmt::Debug for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlElement")
            .field("namespace", &self.namespace())
            .field("name", &self.name())
            .finish()
    }
}

/// Handle on one attribute of one element, identified by its key. Stays
/// valid across value changes; reads fail once the attribute is removed.
#[derive(Clone)]
pub struct XmlAttribute {
    owner: XmlElement,
    key: AttrKey,
}

impl XmlAttribute {
    pub(crate) fn new(owner: XmlElement, key: AttrKey) -> Self {
        XmlAttribute { owner, key }
    }

    /// Local name.
    pub fn name(&self) -> String {
        self.key.local.clone()
    }

    pub fn namespace(&self) -> Option<String> {
        self.key.namespace.clone()
    }

    pub fn has_namespace(&self, namespace: Option<&str>) -> bool {
        self.key.namespace.as_deref() == namespace
    }

    pub fn has_prefix(&self, prefix: Option<&str>) -> bool {
        self.prefix().as_deref() == prefix
    }

    /// Prefix as written, if the attribute still exists.
    pub fn prefix(&self) -> Option<String> {
        let doc = self.owner.doc();
        let d = doc.borrow();
        d.get(self.owner.id())
            .element()
            .and_then(|e| e.attrs.get(&self.key))
            .and_then(|v| v.prefix.clone())
    }

    /// Current value.
    pub fn value(&self) -> Result<String> {
        let doc = self.owner.doc();
        let d = doc.borrow();
        d.get(self.owner.id())
            .element()
            .and_then(|e| e.attrs.get(&self.key))
            .map(|v| v.value.clone())
            .ok_or_else(|| self.not_found())
    }

    /// Overwrite the value, keeping the prefix.
    pub fn set_value(&self, value: &str) -> Result<()> {
        let doc = self.owner.doc();
        let mut d = doc.borrow_mut();
        let id = self.owner.id();
        d.get_mut(id)
            .element_mut()
            .and_then(|e| e.attrs.get_mut(&self.key))
            .map(|v| v.value = value.to_string())
            .ok_or_else(|| self.not_found())
    }

    /// Remove the attribute from its element; idempotent. Returns the
    /// owning element.
    pub fn remove(&self) -> XmlElement {
        self.owner
            .remove_attr_ns(self.key.namespace.as_deref(), &self.key.local);
        self.owner.clone()
    }

    pub fn owner_element(&self) -> XmlElement {
        self.owner.clone()
    }

    /// Write the attribute value into an arbitrary sink.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        let value = self.value()?;
        out.write_all(value.as_bytes())
            .map_err(|e| Error::TransformationFailed(e.to_string()))
    }

    fn not_found(&self) -> Error {
        Error::AttributeNotFound {
            namespace: self.key.namespace.clone(),
            name: self.key.local.clone(),
        }
    }
}

impl PartialEq for XmlAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.key == other.key
    }
}

/// The value only, like DOM `Attr.toString()`. Empty once removed.
impl fmt::Display for XmlAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value().unwrap_or_default())
    }
}

impl fmt::Debug for XmlAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlAttribute")
            .field("namespace", &self.key.namespace)
            .field("name", &self.key.local)
            .field("value", &self.value().ok())
            .finish()
    }
}
