//! Expression evaluation against a [`Document`].
//!
//! Node-sets carry [`NodeRef`]s, not handles; the query layer turns them
//! into handles after evaluation. Results are kept in document order and
//! duplicate-free at every step.

use std::collections::{HashMap, HashSet};

use indextree::NodeId;

use crate::arena_dom::{AttrKey, Document, NodeKind, QName, XMLNS_NAMESPACE};

use super::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};

/// Resolves namespace prefixes at evaluation time.
pub(crate) trait PrefixResolver {
    fn resolve(&self, prefix: &str) -> Option<String>;
}

/// Reference to a node or an attribute inside the evaluated document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum NodeRef {
    Node(NodeId),
    Attr { owner: NodeId, key: AttrKey },
}

/// The four XPath 1.0 value types.
#[derive(Debug, Clone)]
pub(crate) enum Value {
    Boolean(bool),
    Number(f64),
    Str(String),
    NodeSet(Vec<NodeRef>),
}

pub(crate) struct EvalContext<'a> {
    pub doc: &'a Document,
    pub resolver: &'a dyn PrefixResolver,
}

impl EvalContext<'_> {
    /// Evaluate `expr` with `origin` as the context node.
    pub(crate) fn evaluate(&self, expr: &Expr, origin: NodeId) -> Result<Value, String> {
        self.eval(expr, &NodeRef::Node(origin), 1, 1)
    }

    fn eval(
        &self,
        expr: &Expr,
        context: &NodeRef,
        position: usize,
        size: usize,
    ) -> Result<Value, String> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Literal(s) => Ok(Value::Str(s.clone())),
            Expr::Neg(inner) => {
                let v = self.eval(inner, context, position, size)?;
                Ok(Value::Number(-self.to_number(&v)))
            }
            Expr::Binary { op, left, right } => {
                self.eval_binary(*op, left, right, context, position, size)
            }
            Expr::Function { name, args } => {
                self.call_function(name, args, context, position, size)
            }
            Expr::Union(left, right) => {
                let l = self.eval(left, context, position, size)?;
                let r = self.eval(right, context, position, size)?;
                match (l, r) {
                    (Value::NodeSet(mut a), Value::NodeSet(b)) => {
                        a.extend(b);
                        dedupe(&mut a);
                        self.sort_document_order(&mut a);
                        Ok(Value::NodeSet(a))
                    }
                    _ => Err("'|' requires node-sets on both sides".to_string()),
                }
            }
            Expr::Path(path) => self.eval_path(path, context),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        context: &NodeRef,
        position: usize,
        size: usize,
    ) -> Result<Value, String> {
        match op {
            BinaryOp::Or => {
                let l = self.eval(left, context, position, size)?;
                if self.to_boolean(&l) {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval(right, context, position, size)?;
                Ok(Value::Boolean(self.to_boolean(&r)))
            }
            BinaryOp::And => {
                let l = self.eval(left, context, position, size)?;
                if !self.to_boolean(&l) {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval(right, context, position, size)?;
                Ok(Value::Boolean(self.to_boolean(&r)))
            }
            BinaryOp::Eq | BinaryOp::Neq => {
                let l = self.eval(left, context, position, size)?;
                let r = self.eval(right, context, position, size)?;
                Ok(Value::Boolean(self.compare_equality(
                    op == BinaryOp::Eq,
                    &l,
                    &r,
                )))
            }
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                let l = self.eval(left, context, position, size)?;
                let r = self.eval(right, context, position, size)?;
                let (a, b) = (self.to_number(&l), self.to_number(&r));
                let result = match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Lte => a <= b,
                    BinaryOp::Gt => a > b,
                    _ => a >= b,
                };
                Ok(Value::Boolean(result))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let l = self.eval(left, context, position, size)?;
                let r = self.eval(right, context, position, size)?;
                let (a, b) = (self.to_number(&l), self.to_number(&r));
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                };
                Ok(Value::Number(result))
            }
        }
    }

    // --- location paths ---

    fn eval_path(&self, path: &LocationPath, context: &NodeRef) -> Result<Value, String> {
        let mut current: Vec<NodeRef> = if path.absolute {
            vec![NodeRef::Node(self.doc.root)]
        } else {
            vec![context.clone()]
        };

        for step in &path.steps {
            let mut selected = Vec::new();
            for node in &current {
                // predicates are scoped to the nodes produced from one
                // context node: position() and last() are local to that
                // batch, so /r/g/p[1] selects the first p of each g
                let mut batch = Vec::new();
                self.apply_step(step, node, &mut batch)?;

                for predicate in &step.predicates {
                    let total = batch.len();
                    let mut kept = Vec::with_capacity(total);
                    for (i, candidate) in batch.iter().enumerate() {
                        let v = self.eval(predicate, candidate, i + 1, total)?;
                        let keep = match v {
                            // a number predicate selects by position
                            Value::Number(n) => (i + 1) as f64 == n,
                            other => self.to_boolean(&other),
                        };
                        if keep {
                            kept.push(candidate.clone());
                        }
                    }
                    batch = kept;
                }
                selected.extend(batch);
            }
            dedupe(&mut selected);
            current = selected;
        }

        self.sort_document_order(&mut current);
        Ok(Value::NodeSet(current))
    }

    fn apply_step(
        &self,
        step: &Step,
        context: &NodeRef,
        out: &mut Vec<NodeRef>,
    ) -> Result<(), String> {
        let id = match context {
            NodeRef::Node(id) => *id,
            NodeRef::Attr { owner, .. } => {
                // attributes have no children; only parent/self go anywhere
                match step.axis {
                    Axis::Parent => {
                        if self.node_matches(*owner, &step.test)? {
                            out.push(NodeRef::Node(*owner));
                        }
                    }
                    Axis::SelfAxis => {
                        if step.test == NodeTest::Node {
                            out.push(context.clone());
                        }
                    }
                    _ => {}
                }
                return Ok(());
            }
        };

        match step.axis {
            Axis::Child => {
                for child in id.children(&self.doc.arena) {
                    if self.node_matches(child, &step.test)? {
                        out.push(NodeRef::Node(child));
                    }
                }
            }
            Axis::Descendant => {
                for node in id.descendants(&self.doc.arena).skip(1) {
                    if self.node_matches(node, &step.test)? {
                        out.push(NodeRef::Node(node));
                    }
                }
            }
            Axis::DescendantOrSelf => {
                for node in id.descendants(&self.doc.arena) {
                    if self.node_matches(node, &step.test)? {
                        out.push(NodeRef::Node(node));
                    }
                }
            }
            Axis::Parent => {
                if let Some(parent) = self.doc.arena[id].parent() {
                    if self.node_matches(parent, &step.test)? {
                        out.push(NodeRef::Node(parent));
                    }
                }
            }
            Axis::Ancestor => {
                for node in id.ancestors(&self.doc.arena).skip(1) {
                    if self.node_matches(node, &step.test)? {
                        out.push(NodeRef::Node(node));
                    }
                }
            }
            Axis::SelfAxis => {
                if self.node_matches(id, &step.test)? {
                    out.push(NodeRef::Node(id));
                }
            }
            Axis::Attribute => {
                if let Some(elem) = self.doc.get(id).element() {
                    for key in elem.attrs.keys() {
                        // namespace declarations are not on the attribute axis
                        if key.namespace.as_deref() == Some(XMLNS_NAMESPACE) {
                            continue;
                        }
                        if self.attr_matches(key, &step.test)? {
                            out.push(NodeRef::Attr {
                                owner: id,
                                key: key.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn node_matches(&self, id: NodeId, test: &NodeTest) -> Result<bool, String> {
        let kind = &self.doc.get(id).kind;
        match test {
            NodeTest::Node => Ok(true),
            NodeTest::Text => Ok(matches!(kind, NodeKind::Text(_))),
            NodeTest::Wildcard { prefix } => match kind {
                NodeKind::Element(elem) => match prefix {
                    None => Ok(true),
                    Some(p) => {
                        let uri = self.resolve_prefix(p)?;
                        Ok(elem.name.namespace.as_deref() == Some(uri.as_str()))
                    }
                },
                _ => Ok(false),
            },
            NodeTest::Name { prefix, local } => match kind {
                NodeKind::Element(elem) => {
                    if elem.name.local != *local {
                        return Ok(false);
                    }
                    match prefix {
                        None => Ok(elem.name.namespace.is_none()),
                        Some(p) => {
                            let uri = self.resolve_prefix(p)?;
                            Ok(elem.name.namespace.as_deref() == Some(uri.as_str()))
                        }
                    }
                }
                _ => Ok(false),
            },
        }
    }

    fn attr_matches(&self, key: &AttrKey, test: &NodeTest) -> Result<bool, String> {
        match test {
            NodeTest::Node => Ok(true),
            NodeTest::Text => Ok(false),
            NodeTest::Wildcard { prefix } => match prefix {
                None => Ok(true),
                Some(p) => {
                    let uri = self.resolve_prefix(p)?;
                    Ok(key.namespace.as_deref() == Some(uri.as_str()))
                }
            },
            NodeTest::Name { prefix, local } => {
                if key.local != *local {
                    return Ok(false);
                }
                match prefix {
                    None => Ok(key.namespace.is_none()),
                    Some(p) => {
                        let uri = self.resolve_prefix(p)?;
                        Ok(key.namespace.as_deref() == Some(uri.as_str()))
                    }
                }
            }
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String, String> {
        self.resolver
            .resolve(prefix)
            .ok_or_else(|| format!("unknown namespace prefix '{prefix}'"))
    }

    // --- function library ---

    fn call_function(
        &self,
        name: &str,
        args: &[Expr],
        context: &NodeRef,
        position: usize,
        size: usize,
    ) -> Result<Value, String> {
        let eval_arg = |i: usize| self.eval(&args[i], context, position, size);
        match (name, args.len()) {
            ("last", 0) => Ok(Value::Number(size as f64)),
            ("position", 0) => Ok(Value::Number(position as f64)),
            ("count", 1) => match eval_arg(0)? {
                Value::NodeSet(set) => Ok(Value::Number(set.len() as f64)),
                _ => Err("count() requires a node-set".to_string()),
            },
            ("not", 1) => Ok(Value::Boolean(!self.to_boolean(&eval_arg(0)?))),
            ("true", 0) => Ok(Value::Boolean(true)),
            ("false", 0) => Ok(Value::Boolean(false)),
            ("boolean", 1) => Ok(Value::Boolean(self.to_boolean(&eval_arg(0)?))),
            ("string", 0) => Ok(Value::Str(self.string_value(context))),
            ("string", 1) => Ok(Value::Str(self.to_string(&eval_arg(0)?))),
            ("number", 0) => Ok(Value::Number(parse_number(&self.string_value(context)))),
            ("number", 1) => Ok(Value::Number(self.to_number(&eval_arg(0)?))),
            ("concat", n) if n >= 2 => {
                let mut out = String::new();
                for i in 0..n {
                    out.push_str(&self.to_string(&eval_arg(i)?));
                }
                Ok(Value::Str(out))
            }
            ("contains", 2) => {
                let haystack = self.to_string(&eval_arg(0)?);
                let needle = self.to_string(&eval_arg(1)?);
                Ok(Value::Boolean(haystack.contains(&needle)))
            }
            ("starts-with", 2) => {
                let s = self.to_string(&eval_arg(0)?);
                let prefix = self.to_string(&eval_arg(1)?);
                Ok(Value::Boolean(s.starts_with(&prefix)))
            }
            ("string-length", 0) => {
                Ok(Value::Number(self.string_value(context).chars().count() as f64))
            }
            ("string-length", 1) => Ok(Value::Number(
                self.to_string(&eval_arg(0)?).chars().count() as f64,
            )),
            ("normalize-space", 0) => Ok(Value::Str(normalize_space(&self.string_value(context)))),
            ("normalize-space", 1) => {
                Ok(Value::Str(normalize_space(&self.to_string(&eval_arg(0)?))))
            }
            ("local-name", 0) => Ok(Value::Str(
                self.node_name(context).map(|n| n.local).unwrap_or_default(),
            )),
            ("local-name", 1) => Ok(Value::Str(
                self.first_node_name(&eval_arg(0)?)?
                    .map(|n| n.local)
                    .unwrap_or_default(),
            )),
            ("name", 0) => Ok(Value::Str(
                self.node_name(context)
                    .map(|n| n.qualified())
                    .unwrap_or_default(),
            )),
            ("name", 1) => Ok(Value::Str(
                self.first_node_name(&eval_arg(0)?)?
                    .map(|n| n.qualified())
                    .unwrap_or_default(),
            )),
            ("namespace-uri", 0) => Ok(Value::Str(
                self.node_name(context)
                    .and_then(|n| n.namespace)
                    .unwrap_or_default(),
            )),
            ("namespace-uri", 1) => Ok(Value::Str(
                self.first_node_name(&eval_arg(0)?)?
                    .and_then(|n| n.namespace)
                    .unwrap_or_default(),
            )),
            (other, n) => Err(format!("unknown function {other}() with {n} argument(s)")),
        }
    }

    fn first_node_name(&self, value: &Value) -> Result<Option<QName>, String> {
        match value {
            Value::NodeSet(set) => Ok(set.first().and_then(|n| self.node_name(n))),
            _ => Err("expected a node-set argument".to_string()),
        }
    }

    fn node_name(&self, node: &NodeRef) -> Option<QName> {
        match node {
            NodeRef::Node(id) => self.doc.get(*id).element().map(|e| e.name.clone()),
            NodeRef::Attr { owner, key } => {
                let prefix = self
                    .doc
                    .get(*owner)
                    .element()
                    .and_then(|e| e.attrs.get(key))
                    .and_then(|v| v.prefix.clone());
                Some(QName {
                    namespace: key.namespace.clone(),
                    prefix,
                    local: key.local.clone(),
                })
            }
        }
    }

    // --- coercions (XPath 1.0 section 4) ---

    pub(crate) fn string_value(&self, node: &NodeRef) -> String {
        match node {
            NodeRef::Node(id) => self.doc.string_value(*id),
            NodeRef::Attr { owner, key } => self
                .doc
                .get(*owner)
                .element()
                .and_then(|e| e.attrs.get(key))
                .map(|v| v.value.clone())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn to_string(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::NodeSet(set) => set
                .first()
                .map(|node| self.string_value(node))
                .unwrap_or_default(),
        }
    }

    pub(crate) fn to_number(&self, value: &Value) -> f64 {
        match value {
            Value::Number(n) => *n,
            Value::Str(s) => parse_number(s),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::NodeSet(_) => parse_number(&self.to_string(value)),
        }
    }

    pub(crate) fn to_boolean(&self, value: &Value) -> bool {
        match value {
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::NodeSet(set) => !set.is_empty(),
        }
    }

    // existential comparison for node-sets, XPath 1.0 section 3.4
    fn compare_equality(&self, eq: bool, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::NodeSet(a), Value::NodeSet(b)) => {
                let va: HashSet<String> = a.iter().map(|n| self.string_value(n)).collect();
                let vb: HashSet<String> = b.iter().map(|n| self.string_value(n)).collect();
                if eq {
                    !va.is_disjoint(&vb)
                } else {
                    // some pair differs
                    !va.is_empty() && !vb.is_empty() && (va.len() > 1 || vb.len() > 1 || va != vb)
                }
            }
            (Value::NodeSet(set), Value::Boolean(b))
            | (Value::Boolean(b), Value::NodeSet(set)) => (!set.is_empty() == *b) == eq,
            (Value::NodeSet(set), Value::Number(n))
            | (Value::Number(n), Value::NodeSet(set)) => set
                .iter()
                .any(|node| (parse_number(&self.string_value(node)) == *n) == eq),
            (Value::NodeSet(set), Value::Str(s)) | (Value::Str(s), Value::NodeSet(set)) => {
                set.iter().any(|node| (self.string_value(node) == *s) == eq)
            }
            _ => {
                let matches = if matches!(left, Value::Boolean(_))
                    || matches!(right, Value::Boolean(_))
                {
                    self.to_boolean(left) == self.to_boolean(right)
                } else if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
                    self.to_number(left) == self.to_number(right)
                } else {
                    self.to_string(left) == self.to_string(right)
                };
                matches == eq
            }
        }
    }

    fn sort_document_order(&self, nodes: &mut [NodeRef]) {
        if nodes.len() < 2 {
            return;
        }
        let mut order: HashMap<NodeId, usize> = HashMap::new();
        for (i, id) in self.doc.root.descendants(&self.doc.arena).enumerate() {
            order.insert(id, i);
        }
        nodes.sort_by_key(|node| match node {
            NodeRef::Node(id) => (order.get(id).copied().unwrap_or(usize::MAX), 0),
            NodeRef::Attr { owner, key } => {
                let attr_pos = self
                    .doc
                    .get(*owner)
                    .element()
                    .and_then(|e| e.attrs.get_index_of(key))
                    .unwrap_or(0);
                (order.get(owner).copied().unwrap_or(usize::MAX), attr_pos + 1)
            }
        });
    }
}

fn dedupe(nodes: &mut Vec<NodeRef>) {
    let mut seen = HashSet::new();
    nodes.retain(|node| seen.insert(node.clone()));
}

pub(crate) fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// XPath 1.0 section 4.4 number-to-string: integers print without a
/// fractional part, non-numbers as `NaN`/`Infinity`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use crate::xpath::parse;

    struct NoPrefixes;
    impl PrefixResolver for NoPrefixes {
        fn resolve(&self, _prefix: &str) -> Option<String> {
            None
        }
    }

    fn eval(xml: &str, expr: &str) -> Value {
        let doc = parse_document(xml, false).unwrap();
        let root = doc.root_element().unwrap();
        let ctx = EvalContext {
            doc: &doc,
            resolver: &NoPrefixes,
        };
        ctx.evaluate(&parse(expr).unwrap(), root).unwrap()
    }

    fn eval_string(xml: &str, expr: &str) -> String {
        let doc = parse_document(xml, false).unwrap();
        let root = doc.root_element().unwrap();
        let ctx = EvalContext {
            doc: &doc,
            resolver: &NoPrefixes,
        };
        let v = ctx.evaluate(&parse(expr).unwrap(), root).unwrap();
        ctx.to_string(&v)
    }

    const ORDER: &str = "<order><product>Milk</product><product>Coffee</product></order>";

    #[test]
    fn absolute_path_selects_in_document_order() {
        let Value::NodeSet(set) = eval(ORDER, "/order/product") else {
            panic!("expected node-set")
        };
        assert_eq!(set.len(), 2);
        assert_eq!(eval_string(ORDER, "/order/product"), "Milk");
    }

    #[test]
    fn positional_predicates() {
        assert_eq!(eval_string(ORDER, "/order/product[2]"), "Coffee");
        assert_eq!(eval_string(ORDER, "/order/product[last()]"), "Coffee");
        assert_eq!(eval_string(ORDER, "/order/product[position()=1]"), "Milk");
    }

    #[test]
    fn predicates_are_scoped_to_each_context_node() {
        let xml = "<r><g><p>a</p><p>b</p></g><g><p>c</p><p>d</p></g></r>";
        let Value::NodeSet(set) = eval(xml, "/r/g/p[1]") else {
            panic!("expected node-set")
        };
        assert_eq!(set.len(), 2);
        let Value::NodeSet(set) = eval(xml, "/r/g/p[last()]") else {
            panic!("expected node-set")
        };
        assert_eq!(set.len(), 2);
        // first batch contributes its own second entry
        assert_eq!(eval_string(xml, "/r/g/p[position()=2]"), "b");
    }

    #[test]
    fn value_predicates_and_attributes() {
        let xml = "<order><product id=\"a\">Milk</product><product id=\"b\">Coffee</product></order>";
        assert_eq!(eval_string(xml, "/order/product[@id='b']"), "Coffee");
        assert_eq!(eval_string(xml, "string(/order/product[2]/@id)"), "b");
        let Value::NodeSet(set) = eval(xml, "//@id") else {
            panic!("expected node-set")
        };
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn descendant_shorthand_and_union() {
        let xml = "<a><b><c>1</c></b><d>2</d></a>";
        let Value::NodeSet(set) = eval(xml, "//c | //d") else {
            panic!("expected node-set")
        };
        assert_eq!(set.len(), 2);
        // document order regardless of union operand order
        let Value::NodeSet(set2) = eval(xml, "//d | //c") else {
            panic!("expected node-set")
        };
        assert_eq!(set, set2);
    }

    #[test]
    fn count_and_arithmetic() {
        let Value::Number(n) = eval(ORDER, "count(/order/product)") else {
            panic!("expected number")
        };
        assert_eq!(n, 2.0);
        let Value::Number(n) = eval(ORDER, "count(//product) * 2 + 1") else {
            panic!("expected number")
        };
        assert_eq!(n, 5.0);
    }

    #[test]
    fn boolean_coercions() {
        let Value::Boolean(b) = eval(ORDER, "count(/order/product) = 2") else {
            panic!("expected boolean")
        };
        assert!(b);
        let Value::Boolean(b) = eval(ORDER, "not(/order/missing)") else {
            panic!("expected boolean")
        };
        assert!(b);
        let Value::Boolean(b) = eval(ORDER, "/order/product = 'Milk'") else {
            panic!("expected boolean")
        };
        assert!(b);
    }

    #[test]
    fn string_functions() {
        assert_eq!(eval_string(ORDER, "concat('a', 'b', 'c')"), "abc");
        let Value::Boolean(b) = eval(ORDER, "contains(/order/product, 'il')") else {
            panic!("expected boolean")
        };
        assert!(b);
        assert_eq!(eval_string(ORDER, "normalize-space('  a   b ')"), "a b");
        assert_eq!(eval_string(ORDER, "local-name(/order)"), "order");
    }

    #[test]
    fn unknown_prefix_is_an_evaluation_error() {
        let doc = parse_document(ORDER, false).unwrap();
        let root = doc.root_element().unwrap();
        let ctx = EvalContext {
            doc: &doc,
            resolver: &NoPrefixes,
        };
        let err = ctx
            .evaluate(&parse("/p:order").unwrap(), root)
            .unwrap_err();
        assert!(err.contains("unknown namespace prefix"));
    }

    #[test]
    fn number_formatting_follows_xpath_rules() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn relative_paths_start_at_the_context_node() {
        assert_eq!(eval_string(ORDER, "product"), "Milk");
        assert_eq!(eval_string(ORDER, "./product[2]"), "Coffee");
        assert_eq!(eval_string(ORDER, "product/.."), "MilkCoffee");
    }
}
