//! Hardened XML parsing into the arena [`Document`].
//!
//! Security posture is fixed, not configurable: no DTD processing, no
//! entity expansion beyond character references and the five predefined
//! entities, unbound prefixes are an error. Doctype declarations are
//! rejected unless the data format explicitly opts in, and even then the
//! declaration is skipped without being processed. Comments are dropped;
//! whitespace is preserved exactly as written.

use std::borrow::Cow;

use indextree::NodeId;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as XmlQName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::arena_dom::{
    AttrKey, AttrValue, Document, ElementData, NodeData, NodeKind, QName, XMLNS_NAMESPACE,
};
use crate::error::{Error, Result};

/// Parse `input` into a fresh document. The returned document always has
/// exactly one root element.
pub(crate) fn parse_document(input: &str, allow_doctype: bool) -> Result<Document> {
    let mut reader = NsReader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new();
    // open element stack; text is buffered so character references and
    // cdata sections coalesce into a single text node
    let mut stack: Vec<NodeId> = Vec::new();
    let mut pending_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                flush_text(&mut doc, &stack, &mut pending_text);
                let id = open_element(&reader, &e, &mut doc, &stack)?;
                stack.push(id);
            }
            Ok(Event::Empty(e)) => {
                flush_text(&mut doc, &stack, &mut pending_text);
                open_element(&reader, &e, &mut doc, &stack)?;
            }
            Ok(Event::End(e)) => {
                flush_text(&mut doc, &stack, &mut pending_text);
                let Some(id) = stack.pop() else {
                    return Err(Error::ParseFailed(format!(
                        "unexpected closing tag '</{}>'",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                };
                let open = match doc.get(id).element() {
                    Some(elem) => elem.name.qualified(),
                    None => String::new(),
                };
                if open.as_bytes() != e.name().as_ref() {
                    return Err(Error::ParseFailed(format!(
                        "closing tag '</{}>' does not match '<{open}>'",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
            }
            Ok(Event::Text(e)) => {
                let text = decode_bytes(e.as_ref())?;
                if stack.is_empty() {
                    if !text.trim().is_empty() {
                        return Err(Error::ParseFailed(
                            "character data outside the root element".to_string(),
                        ));
                    }
                } else {
                    pending_text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = decode_bytes(e.into_inner().as_ref())?;
                if stack.is_empty() {
                    if !text.trim().is_empty() {
                        return Err(Error::ParseFailed(
                            "character data outside the root element".to_string(),
                        ));
                    }
                } else {
                    pending_text.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                let name = decode_bytes(e.as_ref())?;
                let resolved = if let Some(digits) = name.strip_prefix('#') {
                    resolve_char_reference(digits)
                } else {
                    resolve_predefined_entity(&name).map(|s| s.to_string())
                };
                match resolved {
                    Some(text) if !stack.is_empty() => pending_text.push_str(&text),
                    Some(_) => {
                        return Err(Error::ParseFailed(
                            "character data outside the root element".to_string(),
                        ));
                    }
                    None => {
                        return Err(Error::ParseFailed(format!(
                            "undeclared entity '&{name};'"
                        )));
                    }
                }
            }
            Ok(Event::Comment(_)) => {
                // comments are dropped; no text flush, so text around a
                // comment coalesces into one node
            }
            Ok(Event::PI(e)) => {
                flush_text(&mut doc, &stack, &mut pending_text);
                let target = decode_bytes(e.target())?;
                let data = decode_bytes(e.content())?.trim_start().to_string();
                let pi = doc.arena.new_node(NodeData {
                    kind: NodeKind::ProcessingInstruction { target, data },
                });
                let parent = stack.last().copied().unwrap_or(doc.root);
                parent.append(pi, &mut doc.arena);
            }
            Ok(Event::Decl(_)) => {}
            Ok(Event::DocType(_)) => {
                if !allow_doctype {
                    return Err(Error::ParseFailed(
                        "doctype declarations are not allowed".to_string(),
                    ));
                }
                tracing::debug!("skipping doctype declaration (processing is disabled)");
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::ParseFailed(format!(
                    "error at position {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if doc.root_element().is_none() {
        return Err(Error::ParseFailed("no root element".to_string()));
    }
    Ok(doc)
}

/// Create the element for a Start/Empty event, attach it, and return its id.
fn open_element(
    reader: &NsReader<&[u8]>,
    e: &BytesStart<'_>,
    doc: &mut Document,
    stack: &[NodeId],
) -> Result<NodeId> {
    let name = resolve_element_name(reader, e.name())?;
    let mut data = ElementData::new(name);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::ParseFailed(err.to_string()))?;
        let (key, value) = build_attribute(reader, &attr)?;
        data.attrs.insert(key, value);
    }

    if stack.is_empty() && doc.root_element().is_some() {
        return Err(Error::ParseFailed("multiple root elements".to_string()));
    }

    let id = doc.new_element(data);
    let parent = stack.last().copied().unwrap_or(doc.root);
    parent.append(id, &mut doc.arena);
    Ok(id)
}

fn resolve_element_name(reader: &NsReader<&[u8]>, name: XmlQName<'_>) -> Result<QName> {
    let (ns, local) = reader.resolve_element(name);
    Ok(QName {
        namespace: resolve_to_uri(ns)?,
        prefix: split_prefix(name.as_ref())
            .map(decode_bytes)
            .transpose()?,
        local: decode_bytes(local.as_ref())?,
    })
}

/// Map one parsed attribute to its stored form. Namespace declarations are
/// kept as ordinary attributes in the reserved xmlns namespace so they
/// serialize back exactly where they were written.
fn build_attribute(
    reader: &NsReader<&[u8]>,
    attr: &Attribute<'_>,
) -> Result<(AttrKey, AttrValue)> {
    let raw_key = attr.key.as_ref();
    let value = unescape_value(attr)?;

    if raw_key == b"xmlns" {
        return Ok((
            AttrKey {
                namespace: Some(XMLNS_NAMESPACE.to_string()),
                local: "xmlns".to_string(),
            },
            AttrValue {
                prefix: None,
                value,
            },
        ));
    }
    if let Some(declared) = raw_key.strip_prefix(b"xmlns:") {
        return Ok((
            AttrKey {
                namespace: Some(XMLNS_NAMESPACE.to_string()),
                local: decode_bytes(declared)?,
            },
            AttrValue {
                prefix: Some("xmlns".to_string()),
                value,
            },
        ));
    }

    let (ns, local) = reader.resolve_attribute(attr.key);
    Ok((
        AttrKey {
            namespace: resolve_to_uri(ns)?,
            local: decode_bytes(local.as_ref())?,
        },
        AttrValue {
            prefix: split_prefix(raw_key).map(decode_bytes).transpose()?,
            value,
        },
    ))
}

fn unescape_value(attr: &Attribute<'_>) -> Result<String> {
    let raw = std::str::from_utf8(attr.value.as_ref())
        .map_err(|e| Error::ParseFailed(e.to_string()))?;
    let unescaped = quick_xml::escape::unescape(raw)
        .map_err(|e| Error::ParseFailed(format!("bad attribute value: {e}")))?;
    Ok(normalize_line_endings(&unescaped).into_owned())
}

fn flush_text(doc: &mut Document, stack: &[NodeId], pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    if let Some(&parent) = stack.last() {
        let node = doc.new_text(text);
        parent.append(node, &mut doc.arena);
    }
}

fn resolve_to_uri(ns: ResolveResult<'_>) -> Result<Option<String>> {
    match ns {
        ResolveResult::Bound(ns) => {
            let uri = std::str::from_utf8(ns.as_ref())
                .map_err(|e| Error::ParseFailed(e.to_string()))?;
            Ok(Some(uri.to_string()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::ParseFailed(format!(
            "unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn split_prefix(name: &[u8]) -> Option<&[u8]> {
    let pos = name.iter().position(|b| *b == b':')?;
    Some(&name[..pos])
}

fn decode_bytes(bytes: &[u8]) -> Result<String> {
    let s = std::str::from_utf8(bytes).map_err(|e| Error::ParseFailed(e.to_string()))?;
    Ok(normalize_line_endings(s).into_owned())
}

fn resolve_char_reference(digits: &str) -> Option<String> {
    let code_point = if let Some(hex) = digits.strip_prefix('x') {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code_point).map(|c| c.to_string())
}

fn normalize_line_endings(s: &str) -> Cow<'_, str> {
    if !s.contains('\r') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
