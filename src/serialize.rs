//! XML serializer with a plain mode and an idempotent pretty mode.
//!
//! Both modes emit a forced `<?xml version="1.0" encoding="UTF-8"?>`
//! declaration directly followed by the element, with no separator.
//!
//! Pretty mode rules:
//! - element-only content goes block-style, one child per line, 2-space indent
//! - any text among the children switches the whole element to inline
//! - whitespace-only text nodes are skipped through a filtered view; the
//!   tree itself is never modified
//! - `xml:space="preserve"` (or a configured preserve-space name) turns
//!   filtering and indentation off for that subtree
//! - the output ends with a single newline
//!
//! Feeding pretty output back through parse+pretty reproduces it byte for
//! byte: the only whitespace the formatter adds is whitespace-only text,
//! which the filtered view drops again on the next pass.

use indextree::NodeId;

use crate::arena_dom::{AttrKey, AttrValue, Document, ElementData, NodeKind, QName, XML_NAMESPACE};
use crate::error::{Error, Result};

/// The declaration every writer output starts with.
pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

const INDENT: &str = "  ";

/// Compiled whitespace-handling rules for the pretty-printer: the set of
/// element names whose content keeps its whitespace verbatim.
#[derive(Debug, Default)]
pub(crate) struct StripSpacePolicy {
    preserve: Vec<String>,
}

impl StripSpacePolicy {
    /// Validate and compile the configured preserve-space names. Each entry
    /// is a local name or `prefix:local`. An invalid entry fails the whole
    /// compilation so the caller can leave its cache empty and retry.
    pub(crate) fn compile(names: &[String]) -> Result<Self> {
        for entry in names {
            if !is_qname_pattern(entry) {
                return Err(Error::TransformerCreationFailed(format!(
                    "invalid preserve-space element name '{entry}'"
                )));
            }
        }
        Ok(StripSpacePolicy {
            preserve: names.to_vec(),
        })
    }

    fn preserves(&self, name: &QName) -> bool {
        self.preserve
            .iter()
            .any(|entry| *entry == name.local || *entry == name.qualified())
    }
}

fn is_qname_pattern(entry: &str) -> bool {
    let mut parts = entry.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), None, _) => is_ncname(local),
        (Some(prefix), Some(local), None) => is_ncname(prefix) && is_ncname(local),
        _ => false,
    }
}

pub(crate) fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_'))
}

/// Declaration plus the subtree exactly as stored, no added whitespace,
/// no trailing newline.
pub(crate) fn serialize_plain(doc: &Document, id: NodeId) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    let ser = Serializer { doc, policy: None };
    ser.write_node(&mut out, id, 0, true, true);
    out
}

/// Declaration plus the formatted subtree, trailing newline included.
pub(crate) fn serialize_pretty(doc: &Document, id: NodeId, policy: &StripSpacePolicy) -> String {
    let mut out = String::with_capacity(256);
    out.push_str(XML_DECLARATION);
    let ser = Serializer {
        doc,
        policy: Some(policy),
    };
    ser.write_node(&mut out, id, 0, false, false);
    out.push('\n');
    out
}

struct Serializer<'a> {
    doc: &'a Document,
    /// `None` = plain mode (callers pass `preserve = true` throughout)
    policy: Option<&'a StripSpacePolicy>,
}

impl Serializer<'_> {
    fn write_node(&self, out: &mut String, id: NodeId, depth: usize, inline: bool, preserve: bool) {
        match &self.doc.get(id).kind {
            NodeKind::Element(_) => self.write_element(out, id, depth, inline, preserve),
            NodeKind::Text(text) => write_text_escaped(out, text),
            NodeKind::ProcessingInstruction { target, data } => write_pi(out, target, data),
            NodeKind::Document => {}
        }
    }

    fn write_element(
        &self,
        out: &mut String,
        id: NodeId,
        depth: usize,
        inline: bool,
        preserve: bool,
    ) {
        let elem = match self.doc.get(id).element() {
            Some(elem) => elem,
            None => return,
        };
        let preserve = self.preserve_for(elem, preserve);
        let name = elem.name.qualified();

        out.push('<');
        out.push_str(&name);
        for (key, value) in &elem.attrs {
            write_attr(out, key, value);
        }

        let children: Vec<NodeId> = self
            .doc
            .children(id)
            .filter(|&child| preserve || !self.is_strippable_text(child))
            .collect();

        if children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');

        let has_text = children
            .iter()
            .any(|&child| matches!(self.doc.get(child).kind, NodeKind::Text(_)));

        if inline || preserve || has_text {
            for child in children {
                self.write_node(out, child, depth, true, preserve);
            }
        } else {
            for child in children {
                out.push('\n');
                push_indent(out, depth + 1);
                self.write_node(out, child, depth + 1, false, preserve);
            }
            out.push('\n');
            push_indent(out, depth);
        }

        out.push_str("</");
        out.push_str(&name);
        out.push('>');
    }

    /// xml:space on the element wins over both the inherited state and the
    /// configured preserve-space names. Plain mode never strips.
    fn preserve_for(&self, elem: &ElementData, inherited: bool) -> bool {
        let Some(policy) = self.policy else {
            return true;
        };
        let space = elem.attrs.get(&AttrKey {
            namespace: Some(XML_NAMESPACE.to_string()),
            local: "space".to_string(),
        });
        match space.map(|v| v.value.as_str()) {
            Some("preserve") => true,
            Some("default") => false,
            _ => inherited || policy.preserves(&elem.name),
        }
    }

    fn is_strippable_text(&self, id: NodeId) -> bool {
        match &self.doc.get(id).kind {
            NodeKind::Text(text) => text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')),
            _ => false,
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_pi(out: &mut String, target: &str, data: &str) {
    out.push_str("<?");
    out.push_str(target);
    if !data.is_empty() {
        out.push(' ');
        out.push_str(data);
    }
    out.push_str("?>");
}

fn write_attr(out: &mut String, key: &AttrKey, value: &AttrValue) {
    out.push(' ');
    match &value.prefix {
        Some(prefix) => {
            out.push_str(prefix);
            out.push(':');
            out.push_str(&key.local);
        }
        None => out.push_str(&key.local),
    }
    out.push_str("=\"");
    write_attr_escaped(out, &value.value);
    out.push('"');
}

fn write_text_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn write_attr_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
