//! Tokenizer and recursive-descent parser for the XPath subset.
//!
//! Errors are plain strings; the query layer wraps them with the offending
//! expression.

use super::{Axis, BinaryOp, Expr, LocationPath, NodeTest, Step};

/// Parse a complete expression. Trailing input is an error.
pub(crate) fn parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(format!("unexpected trailing token {tok:?}")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Literal(String),
    Name(String),
    Slash,
    DoubleSlash,
    At,
    Dot,
    DotDot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
    Star,
    Plus,
    Minus,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Colon,
    DoubleColon,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' | '"' => {
                chars.next();
                let mut lit = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == c => break,
                        Some(ch) => lit.push(ch),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Literal(lit));
            }
            '0'..='9' => tokens.push(lex_number(&mut chars)?),
            '.' => {
                chars.next();
                match chars.peek() {
                    Some('.') => {
                        chars.next();
                        tokens.push(Token::DotDot);
                    }
                    Some(d) if d.is_ascii_digit() => {
                        let mut digits = String::from("0.");
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                digits.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        let n = digits
                            .parse::<f64>()
                            .map_err(|e| format!("bad number: {e}"))?;
                        tokens.push(Token::Number(n));
                    }
                    _ => tokens.push(Token::Dot),
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            ':' => {
                chars.next();
                if chars.peek() == Some(&':') {
                    chars.next();
                    tokens.push(Token::DoubleColon);
                } else {
                    tokens.push(Token::Colon);
                }
            }
            '@' => {
                chars.next();
                tokens.push(Token::At);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Neq);
                } else {
                    return Err("expected '=' after '!'".to_string());
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Lte);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Gte);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            c if is_name_start(c) => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if is_name_char(ch) {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

fn lex_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<Token, String> {
    let mut digits = String::new();
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || (c == '.' && !seen_dot) {
            seen_dot |= c == '.';
            digits.push(c);
            chars.next();
        } else {
            break;
        }
    }
    digits
        .parse::<f64>()
        .map(Token::Number)
        .map_err(|e| format!("bad number: {e}"))
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

// '-' and '.' are name characters in XPath; `price-discount` is one name,
// subtraction needs surrounding whitespace
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '.' | '_')
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, tok: &Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == *tok => Ok(()),
            Some(t) => Err(format!("expected {tok:?}, found {t:?}")),
            None => Err(format!("expected {tok:?}, found end of expression")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "or") {
            self.next();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek(), Some(Token::Name(n)) if n == "and") {
            self.next();
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Neq) => BinaryOp::Neq,
                _ => break,
            };
            self.next();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Lte) => BinaryOp::Lte,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Gte) => BinaryOp::Gte,
                _ => break,
            };
            self.next();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.next();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    // in operand position `*`, `div` and `mod` are names; after a complete
    // operand they are operators (XPath 1.0 section 3.7 disambiguation)
    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Name(n)) if n == "div" => BinaryOp::Div,
                Some(Token::Name(n)) if n == "mod" => BinaryOp::Mod,
                _ => break,
            };
            self.next();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while self.peek() == Some(&Token::Pipe) {
            self.next();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.next();
                Ok(Expr::Number(n))
            }
            Some(Token::Literal(lit)) => {
                let lit = lit.clone();
                self.next();
                Ok(Expr::Literal(lit))
            }
            Some(Token::LParen) => {
                self.next();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Name(name))
                if self.peek2() == Some(&Token::LParen) && !is_node_type(name) =>
            {
                self.parse_function_call()
            }
            _ => Ok(Expr::Path(self.parse_location_path()?)),
        }
    }

    fn parse_function_call(&mut self) -> Result<Expr, String> {
        let Some(Token::Name(name)) = self.next() else {
            return Err("expected function name".to_string());
        };
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.peek() == Some(&Token::Comma) {
                    self.next();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Expr::Function { name, args })
    }

    fn parse_location_path(&mut self) -> Result<LocationPath, String> {
        match self.peek() {
            Some(Token::Slash) => {
                self.next();
                let mut steps = Vec::new();
                if self.starts_step() {
                    self.parse_relative_steps(&mut steps)?;
                }
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            Some(Token::DoubleSlash) => {
                self.next();
                let mut steps = vec![descendant_or_self_step()];
                self.parse_relative_steps(&mut steps)?;
                Ok(LocationPath {
                    absolute: true,
                    steps,
                })
            }
            _ => {
                let mut steps = Vec::new();
                self.parse_relative_steps(&mut steps)?;
                Ok(LocationPath {
                    absolute: false,
                    steps,
                })
            }
        }
    }

    fn parse_relative_steps(&mut self, steps: &mut Vec<Step>) -> Result<(), String> {
        steps.push(self.parse_step()?);
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.next();
                }
                Some(Token::DoubleSlash) => {
                    self.next();
                    steps.push(descendant_or_self_step());
                }
                _ => return Ok(()),
            }
            steps.push(self.parse_step()?);
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Name(_) | Token::Star | Token::At | Token::Dot | Token::DotDot)
        )
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        match self.peek() {
            Some(Token::Dot) => {
                self.next();
                return Ok(Step {
                    axis: Axis::SelfAxis,
                    test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            Some(Token::DotDot) => {
                self.next();
                return Ok(Step {
                    axis: Axis::Parent,
                    test: NodeTest::Node,
                    predicates: Vec::new(),
                });
            }
            _ => {}
        }

        let axis = if self.peek() == Some(&Token::At) {
            self.next();
            Axis::Attribute
        } else if let (Some(Token::Name(name)), Some(Token::DoubleColon)) =
            (self.peek(), self.peek2())
        {
            let axis =
                Axis::parse(name).ok_or_else(|| format!("unsupported axis '{name}'"))?;
            self.next();
            self.next();
            axis
        } else {
            Axis::Child
        };

        let test = self.parse_node_test()?;
        let mut predicates = Vec::new();
        while self.peek() == Some(&Token::LBracket) {
            self.next();
            predicates.push(self.parse_expr()?);
            self.expect(&Token::RBracket)?;
        }
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        match self.next() {
            Some(Token::Star) => Ok(NodeTest::Wildcard { prefix: None }),
            Some(Token::Name(name)) => match self.peek() {
                Some(Token::LParen) => {
                    self.next();
                    self.expect(&Token::RParen)?;
                    match name.as_str() {
                        "node" => Ok(NodeTest::Node),
                        "text" => Ok(NodeTest::Text),
                        other => Err(format!("unsupported node type test '{other}()'")),
                    }
                }
                Some(Token::Colon) => {
                    self.next();
                    match self.next() {
                        Some(Token::Star) => Ok(NodeTest::Wildcard { prefix: Some(name) }),
                        Some(Token::Name(local)) => Ok(NodeTest::Name {
                            prefix: Some(name),
                            local,
                        }),
                        other => Err(format!("expected name after '{name}:', found {other:?}")),
                    }
                }
                _ => Ok(NodeTest::Name {
                    prefix: None,
                    local: name,
                }),
            },
            other => Err(format!("expected a node test, found {other:?}")),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn descendant_or_self_step() -> Step {
    Step {
        axis: Axis::DescendantOrSelf,
        test: NodeTest::Node,
        predicates: Vec::new(),
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "node" | "text" | "comment" | "processing-instruction")
}
