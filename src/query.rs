//! Typed XPath queries rooted at an element.
//!
//! A query is created once and can be evaluated any number of times, in
//! any of seven result shapes. The expression is parsed fresh on each
//! evaluation and prefixes are resolved at that moment, so namespace
//! bindings added through [`XPathQuery::ns`] between evaluations take
//! effect on the next one.

use std::cell::RefCell;
use std::collections::HashMap;

use indextree::NodeId;

use crate::arena_dom::{AttrKey, Document, XML_NAMESPACE, XMLNS_NAMESPACE};
use crate::dom::{XmlAttribute, XmlElement};
use crate::error::{Error, Result};
use crate::xpath::{self, EvalContext, NodeRef, PrefixResolver, Value};

/// `/` selects the document itself, which no typed accessor can return.
const ROOT_EXPRESSION: &str = "/";

/// A reusable, namespace-aware query against one element.
pub struct XPathQuery {
    element: XmlElement,
    expression: String,
    bindings: RefCell<HashMap<String, String>>,
}

/// Bindings first, then the reserved `xml` prefix, then the xmlns
/// declarations in scope at the query origin, innermost wins.
struct QueryResolver<'a> {
    doc: &'a Document,
    origin: NodeId,
    bindings: &'a HashMap<String, String>,
}

impl PrefixResolver for QueryResolver<'_> {
    fn resolve(&self, prefix: &str) -> Option<String> {
        if let Some(uri) = self.bindings.get(prefix) {
            return Some(uri.clone());
        }
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        let key = AttrKey {
            namespace: Some(XMLNS_NAMESPACE.to_string()),
            local: prefix.to_string(),
        };
        for id in self.origin.ancestors(&self.doc.arena) {
            if let Some(decl) = self.doc.get(id).element().and_then(|e| e.attrs.get(&key)) {
                return Some(decl.value.clone());
            }
        }
        None
    }
}

impl XPathQuery {
    pub(crate) fn new(element: XmlElement, expression: String) -> Self {
        XPathQuery {
            element,
            expression,
            bindings: RefCell::new(HashMap::new()),
        }
    }

    /// Bind `prefix` to `uri` for subsequent evaluations.
    pub fn ns(&self, prefix: impl Into<String>, uri: impl Into<String>) -> &Self {
        self.bindings.borrow_mut().insert(prefix.into(), uri.into());
        self
    }

    /// Bind a whole set of prefixes at once.
    pub fn ns_all<I, K, V>(&self, namespaces: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut bindings = self.bindings.borrow_mut();
        for (prefix, uri) in namespaces {
            bindings.insert(prefix.into(), uri.into());
        }
        self
    }

    /// The first matching element, in document order.
    pub fn element(&self) -> Result<XmlElement> {
        self.run(|_, value| {
            let set = self.node_set(value, "an element")?;
            let first = set
                .into_iter()
                .next()
                .ok_or_else(|| Error::ElementNotFound(self.expression.clone()))?;
            self.wrap_element(first)
        })
    }

    /// All matching elements. An empty result is an error.
    pub fn element_list(&self) -> Result<Vec<XmlElement>> {
        self.run(|_, value| {
            let set = self.node_set(value, "an element list")?;
            if set.is_empty() {
                return Err(Error::ElementNotFound(self.expression.clone()));
            }
            set.into_iter().map(|node| self.wrap_element(node)).collect()
        })
    }

    /// The first matching attribute, in document order.
    pub fn attribute(&self) -> Result<XmlAttribute> {
        self.run(|_, value| {
            let set = self.node_set(value, "an attribute")?;
            let first = set
                .into_iter()
                .next()
                .ok_or_else(|| Error::ElementNotFound(self.expression.clone()))?;
            self.wrap_attribute(first)
        })
    }

    /// All matching attributes. An empty result is an error.
    pub fn attribute_list(&self) -> Result<Vec<XmlAttribute>> {
        self.run(|_, value| {
            let set = self.node_set(value, "an attribute list")?;
            if set.is_empty() {
                return Err(Error::ElementNotFound(self.expression.clone()));
            }
            set.into_iter()
                .map(|node| self.wrap_attribute(node))
                .collect()
        })
    }

    /// The result coerced to a string. An empty node-set coerces to `""`.
    pub fn string(&self) -> Result<String> {
        self.run(|ctx, value| Ok(ctx.to_string(&value)))
    }

    /// The result coerced to a number (possibly `NaN`).
    pub fn number(&self) -> Result<f64> {
        self.run(|ctx, value| Ok(ctx.to_number(&value)))
    }

    /// The result coerced to a boolean.
    pub fn bool(&self) -> Result<bool> {
        self.run(|ctx, value| Ok(ctx.to_boolean(&value)))
    }

    fn run<T>(&self, f: impl FnOnce(&EvalContext<'_>, Value) -> Result<T>) -> Result<T> {
        if self.expression == ROOT_EXPRESSION {
            return Err(Error::ElementQueryRootRejected);
        }
        let expr = xpath::parse(&self.expression).map_err(|reason| Error::PathEvaluationFailed {
            expression: self.expression.clone(),
            reason,
        })?;
        let doc_rc = self.element.doc();
        let doc = doc_rc.borrow();
        let bindings = self.bindings.borrow();
        let resolver = QueryResolver {
            doc: &doc,
            origin: self.element.id(),
            bindings: &bindings,
        };
        let ctx = EvalContext {
            doc: &doc,
            resolver: &resolver,
        };
        let value = ctx
            .evaluate(&expr, self.element.id())
            .map_err(|reason| Error::PathEvaluationFailed {
                expression: self.expression.clone(),
                reason,
            })?;
        f(&ctx, value)
    }

    fn node_set(&self, value: Value, expected: &'static str) -> Result<Vec<NodeRef>> {
        match value {
            Value::NodeSet(set) => Ok(set),
            _ => Err(Error::PathResultTypeMismatch { expected }),
        }
    }

    fn wrap_element(&self, node: NodeRef) -> Result<XmlElement> {
        match node {
            NodeRef::Node(id) => {
                let doc = self.element.doc();
                if doc.borrow().get(id).element().is_none() {
                    return Err(Error::PathResultTypeMismatch {
                        expected: "an element",
                    });
                }
                Ok(XmlElement::from_parts(
                    self.element.format().clone(),
                    doc,
                    id,
                ))
            }
            NodeRef::Attr { .. } => Err(Error::PathResultTypeMismatch {
                expected: "an element",
            }),
        }
    }

    fn wrap_attribute(&self, node: NodeRef) -> Result<XmlAttribute> {
        match node {
            NodeRef::Attr { owner, key } => {
                let owner = XmlElement::from_parts(
                    self.element.format().clone(),
                    self.element.doc(),
                    owner,
                );
                Ok(XmlAttribute::new(owner, key))
            }
            NodeRef::Node(_) => Err(Error::PathResultTypeMismatch {
                expected: "an attribute",
            }),
        }
    }
}
