//! Error types for parsing, tree mutation, querying, and writing.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while working with an XML document.
#[derive(Debug, Error)]
pub enum Error {
    /// The input text is not well-formed XML, or it uses a construct the
    /// hardened parser refuses (doctype declarations, unbound prefixes,
    /// undeclared entities).
    #[error("unable to parse input into a DOM document: {0}")]
    ParseFailed(String),

    /// No attribute with the given namespace/name on this element.
    #[error("unable to find attribute with namespace {namespace:?} and name '{name}'")]
    AttributeNotFound {
        namespace: Option<String>,
        name: String,
    },

    /// The attribute name (or its prefix) is not acceptable.
    #[error("unable to set attribute '{name}': {reason}")]
    AttributeSetFailed { name: String, reason: String },

    /// `child_element` found no matching child.
    #[error("unable to find child element with namespace {namespace:?} and name '{name}'")]
    ChildElementNotFound {
        namespace: Option<String>,
        name: String,
    },

    /// `child_element` found more than one matching child.
    #[error("multiple child elements with namespace {namespace:?} and name '{name}'")]
    MultipleChildElementsFound {
        namespace: Option<String>,
        name: String,
    },

    /// The element passed to a child-relative operation is not a child of
    /// the element it was passed to.
    #[error("the element is not a child element of this element")]
    NotAChildElement,

    /// The operation needs a parent element and the element has none.
    #[error("the element has no parent to operate on")]
    ElementHasNoParent,

    /// A node from another document could not be adopted. Only produced
    /// when the handle's target is not an element node, which element
    /// handles cannot normally reach.
    #[error("unable to adopt the element into this document")]
    AdoptionFailed,

    /// Appending would detach-and-reattach into an impossible position
    /// (the node itself, or one of its ancestors).
    #[error("unable to append the element at this position")]
    AppendFailed,

    /// The node could not be removed from its parent. Reserved: detaching
    /// an arena node cannot fail, so the childhood check
    /// ([`Error::NotAChildElement`]) is the only remove failure produced.
    #[error("unable to remove the element from its parent")]
    RemoveFailed,

    /// The replacement node could not be swapped in.
    #[error("unable to replace the element")]
    ReplaceFailed,

    /// The whitespace-stripping templates for the pretty-printer could not
    /// be compiled. The cache stays empty so a later write retries.
    #[error("unable to create the formatting templates: {0}")]
    TransformerCreationFailed(String),

    /// Serialization failed, e.g. the output sink reported an I/O error.
    #[error("unable to transform the element into text: {0}")]
    TransformationFailed(String),

    /// The root expression `/` selects the document itself, which none of
    /// the typed query accessors can represent.
    #[error("the expression '/' cannot be used to query an element")]
    ElementQueryRootRejected,

    /// The expression does not parse, or evaluation hit an unresolvable
    /// construct (unknown prefix, unknown function).
    #[error("unable to evaluate XPath expression '{expression}': {reason}")]
    PathEvaluationFailed { expression: String, reason: String },

    /// The expression evaluated fine but its value has the wrong shape for
    /// the accessor that was called.
    #[error("the XPath result cannot be converted to {expected}")]
    PathResultTypeMismatch { expected: &'static str },

    /// A node-set accessor came back empty.
    #[error("unable to find element for expression '{0}'")]
    ElementNotFound(String),
}
