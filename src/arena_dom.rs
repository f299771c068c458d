//! Arena-based XML DOM.
//!
//! This module provides the core Document representation used throughout xylem.
//! Key features:
//! - **indextree Arena**: All nodes of a document in contiguous memory
//! - **Invisible document root**: a `NodeKind::Document` node owns the root
//!   element plus any top-level processing instructions
//! - **Detach, don't free**: removed subtrees stay allocated so stale handles
//!   still point at valid (detached) nodes

use indexmap::IndexMap;
use indextree::{Arena, NodeId};

/// Namespace URI reserved for `xmlns` / `xmlns:*` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace URI bound to the reserved `xml` prefix (e.g. `xml:space`).
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Expanded element name: namespace URI, the prefix it was written with,
/// and the local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, `None` for the null namespace
    pub namespace: Option<String>,
    /// Prefix as written in the source, `None` for default/no prefix
    pub prefix: Option<String>,
    /// Local name
    pub local: String,
}

impl QName {
    /// Name in the null namespace, without a prefix.
    pub fn local(local: impl Into<String>) -> Self {
        QName {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    /// `prefix:local`, or just `local` when unprefixed.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

/// Attribute identity: namespace URI + local name. Two attributes with the
/// same key cannot coexist on one element, regardless of prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrKey {
    pub namespace: Option<String>,
    pub local: String,
}

impl AttrKey {
    pub fn local(local: impl Into<String>) -> Self {
        AttrKey {
            namespace: None,
            local: local.into(),
        }
    }
}

/// Attribute payload: the prefix it serializes with, and the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue {
    pub prefix: Option<String>,
    pub value: String,
}

/// Element: name + ordered attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub name: QName,
    /// Insertion-ordered so serialization round-trips attribute order
    pub attrs: IndexMap<AttrKey, AttrValue>,
}

impl ElementData {
    pub fn new(name: QName) -> Self {
        ElementData {
            name,
            attrs: IndexMap::new(),
        }
    }
}

/// What kind of node this is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The invisible document node; exactly one per document, always the
    /// arena root. Never serialized itself.
    Document,
    Element(ElementData),
    Text(String),
    ProcessingInstruction { target: String, data: String },
}

/// Node payload stored in the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
}

impl NodeData {
    pub fn element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }
}

/// Document = Arena + the document node's id.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// The invisible document node
    pub root: NodeId,
}

impl Document {
    /// Empty document: just the invisible document node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeData {
            kind: NodeKind::Document,
        });
        Document { arena, root }
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// The root element, if the document has one.
    pub fn root_element(&self) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|&id| matches!(self.arena[id].get().kind, NodeKind::Element(_)))
    }

    /// Allocate a detached element node.
    pub fn new_element(&mut self, data: ElementData) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(data),
        })
    }

    /// Allocate a detached text node.
    pub fn new_text(&mut self, text: impl Into<String>) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(text.into()),
        })
    }

    /// XPath-style string value: concatenation of all text descendants.
    pub fn string_value(&self, id: NodeId) -> String {
        match &self.arena[id].get().kind {
            NodeKind::Text(t) => t.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            _ => {
                let mut out = String::new();
                for node in id.descendants(&self.arena) {
                    if let NodeKind::Text(t) = &self.arena[node].get().kind {
                        out.push_str(t);
                    }
                }
                out
            }
        }
    }

    /// Deep-copy a subtree from another document's arena into this one.
    /// Returns the id of the (detached) copy. Used for cross-document
    /// adoption, since arena nodes cannot move between arenas.
    pub fn copy_subtree_from(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let data = src.arena[src_id].get().clone();
        let copy = self.arena.new_node(data);
        for child in src_id.children(&src.arena) {
            let child_copy = self.copy_subtree_from(src, child);
            // fresh nodes, appending cannot form a cycle
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }

    /// Whether `id` is still attached under the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id.ancestors(&self.arena).any(|a| a == self.root)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
