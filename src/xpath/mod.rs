//! XPath 1.0 subset: abbreviated location paths over the arena DOM.
//!
//! Supported surface: the `child`, `attribute`, `descendant`,
//! `descendant-or-self`, `parent`, `ancestor`, and `self` axes (plus the
//! `.`, `..`, `@`, `//` abbreviations), name and wildcard node tests with
//! prefixes, `node()`/`text()` type tests, predicates, the boolean /
//! equality / relational / arithmetic / union operators, and the core
//! function library needed for the typed query results.
//!
//! Prefixes are resolved at evaluation time through a caller-supplied
//! resolver, never at parse time.

mod eval;
mod parser;

pub(crate) use eval::{EvalContext, NodeRef, PrefixResolver, Value};
pub(crate) use parser::parse;

/// A parsed expression.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Number(f64),
    Literal(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
    Function {
        name: String,
        args: Vec<Expr>,
    },
    Union(Box<Expr>, Box<Expr>),
    Path(LocationPath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A location path: `/a/b[1]//c`. The bare root path `/` has no steps.
#[derive(Debug, Clone)]
pub(crate) struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone)]
pub(crate) struct Step {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    SelfAxis,
    Attribute,
}

impl Axis {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "self" => Some(Self::SelfAxis),
            "attribute" => Some(Self::Attribute),
            _ => None,
        }
    }
}

/// Name or kind filter applied to candidate nodes of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    /// `local` or `prefix:local`; an unprefixed test matches the null
    /// namespace, never the default namespace
    Name {
        prefix: Option<String>,
        local: String,
    },
    /// `*` or `prefix:*`
    Wildcard { prefix: Option<String> },
    /// `node()`
    Node,
    /// `text()`
    Text,
}
