//! The [`XmlDataFormat`]: parsing configuration plus writer configuration,
//! shared by every handle created from it.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::dom::XmlElement;
use crate::error::Result;
use crate::parser::parse_document;
use crate::serialize::StripSpacePolicy;

/// Entry point of the crate. Immutable once built; parsing hardening is
/// always on, only doctype acceptance, pretty-printing, and the
/// preserve-space list are configurable.
#[derive(Debug)]
pub struct XmlDataFormat {
    pretty_print: bool,
    allow_doctype: bool,
    preserve_space: Vec<String>,
    /// Whitespace-stripping rules, compiled on first pretty write. A failed
    /// compilation leaves this empty so the next write retries.
    strip_policy: Mutex<Option<Arc<StripSpacePolicy>>>,
}

impl XmlDataFormat {
    /// Default format: pretty-printing on, doctypes rejected.
    pub fn new() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> XmlDataFormatBuilder {
        XmlDataFormatBuilder {
            pretty_print: true,
            allow_doctype: false,
            preserve_space: Vec::new(),
        }
    }

    pub fn is_pretty_print(&self) -> bool {
        self.pretty_print
    }

    pub fn is_doctype_allowed(&self) -> bool {
        self.allow_doctype
    }

    /// Parse `input` and return a handle on the root element.
    pub fn parse_str(self: &Arc<Self>, input: &str) -> Result<XmlElement> {
        let doc = parse_document(input, self.allow_doctype)?;
        // parse_document guarantees a root element
        let root = doc.root_element().ok_or_else(|| {
            crate::error::Error::ParseFailed("no root element".to_string())
        })?;
        Ok(XmlElement::from_parts(
            self.clone(),
            Rc::new(RefCell::new(doc)),
            root,
        ))
    }

    /// Compiled preserve-space rules, built at most once per format.
    pub(crate) fn strip_policy(&self) -> Result<Arc<StripSpacePolicy>> {
        let mut cached = self
            .strip_policy
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(policy) = &*cached {
            return Ok(policy.clone());
        }
        match StripSpacePolicy::compile(&self.preserve_space) {
            Ok(policy) => {
                let policy = Arc::new(policy);
                *cached = Some(policy.clone());
                Ok(policy)
            }
            Err(e) => {
                tracing::warn!(error = %e, "unable to create the formatting templates");
                Err(e)
            }
        }
    }
}

/// Builder for [`XmlDataFormat`].
#[derive(Debug)]
pub struct XmlDataFormatBuilder {
    pretty_print: bool,
    allow_doctype: bool,
    preserve_space: Vec<String>,
}

impl XmlDataFormatBuilder {
    /// Toggle the pretty writer (default: on). When off, the writer emits
    /// the tree as stored, with only the declaration normalized.
    pub fn pretty_print(mut self, enabled: bool) -> Self {
        self.pretty_print = enabled;
        self
    }

    /// Accept (and skip) a doctype declaration instead of failing the
    /// parse. Entity definitions in it are never processed.
    pub fn allow_doctype(mut self, enabled: bool) -> Self {
        self.allow_doctype = enabled;
        self
    }

    /// Element names (`local` or `prefix:local`) whose content keeps its
    /// whitespace when pretty-printing.
    pub fn preserve_space<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserve_space = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Arc<XmlDataFormat> {
        Arc::new(XmlDataFormat {
            pretty_print: self.pretty_print,
            allow_doctype: self.allow_doctype,
            preserve_space: self.preserve_space,
            strip_policy: Mutex::new(None),
        })
    }
}
