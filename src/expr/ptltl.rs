//! Past-time temporal logic expression sub-language.
//!
//! This is the default requirement sub-language: boolean connectives over
//! comparisons of telemetry variables, plus the past-time temporal operators.
//!
//! # Syntax
//!
//! - `true`, `false` — boolean constants
//! - `alt`, `engine_temp` — identifiers
//! - `a < b`, `a <= b`, `a > b`, `a >= b`, `a == b`, `a != b` — comparisons
//! - `a + b`, `a - b`, `a * b`, `a / b` — arithmetic terms
//! - `! p` or `not p` — negation
//! - `p && q` or `p and q`, `p || q` or `p or q`, `p => q` — connectives
//! - `H p` — historically (p held at every past step)
//! - `O p` — once (p held at some past step)
//! - `Y p` or `PRE p` — p held at the previous step
//! - `p S q` — p has held since q last held
//!
//! # Operator precedence (lowest to highest)
//!
//! 1. Implication (`=>`) — right-associative
//! 2. Or (`||`, `or`)
//! 3. And (`&&`, `and`)
//! 4. Since (`S`)
//! 5. Unary operators (`!`, `not`, `H`, `O`, `Y`, `PRE`)
//! 6. Comparisons, arithmetic, atoms

use std::collections::HashMap;
use std::fmt;

use crate::expr::ExpressionHandler;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        write!(f, "{}", s)
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// Parsed past-time temporal logic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(bool),
    Num(f64),
    Ident(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Historically(Box<Expr>),
    Once(Box<Expr>),
    Previous(Box<Expr>),
    Since(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
}

impl Expr {
    /// Identifiers referenced by this expression, in first-occurrence order,
    /// without duplicates.
    pub fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<String>) {
        match self {
            Expr::Ident(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Expr::Const(_) | Expr::Num(_) => {}
            Expr::Not(e)
            | Expr::Historically(e)
            | Expr::Once(e)
            | Expr::Previous(e)
            | Expr::Neg(e) => e.collect_identifiers(out),
            Expr::And(l, r)
            | Expr::Or(l, r)
            | Expr::Implies(l, r)
            | Expr::Since(l, r)
            | Expr::Cmp(_, l, r)
            | Expr::Arith(_, l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
        }
    }

    /// Rename identifiers according to the mapping; unmapped names pass
    /// through.
    pub fn substitute(&self, renames: &HashMap<String, String>) -> Expr {
        match self {
            Expr::Ident(name) => Expr::Ident(
                renames
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.clone()),
            ),
            Expr::Const(b) => Expr::Const(*b),
            Expr::Num(n) => Expr::Num(*n),
            Expr::Not(e) => Expr::Not(Box::new(e.substitute(renames))),
            Expr::Historically(e) => Expr::Historically(Box::new(e.substitute(renames))),
            Expr::Once(e) => Expr::Once(Box::new(e.substitute(renames))),
            Expr::Previous(e) => Expr::Previous(Box::new(e.substitute(renames))),
            Expr::Neg(e) => Expr::Neg(Box::new(e.substitute(renames))),
            Expr::And(l, r) => Expr::And(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Or(l, r) => Expr::Or(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Implies(l, r) => Expr::Implies(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Since(l, r) => Expr::Since(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Cmp(op, l, r) => Expr::Cmp(
                *op,
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Arith(op, l, r) => Expr::Arith(
                *op,
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
        }
    }

    /// Render back to concrete syntax. Sub-expressions are parenthesized, so
    /// the output always re-parses to an equivalent expression.
    pub fn render(&self) -> String {
        match self {
            Expr::Const(b) => b.to_string(),
            Expr::Num(n) => n.to_string(),
            Expr::Ident(name) => name.clone(),
            Expr::Not(e) => format!("! ({})", e.render()),
            Expr::Historically(e) => format!("H ({})", e.render()),
            Expr::Once(e) => format!("O ({})", e.render()),
            Expr::Previous(e) => format!("Y ({})", e.render()),
            Expr::Neg(e) => format!("(- {})", e.render()),
            Expr::And(l, r) => format!("({} && {})", l.render(), r.render()),
            Expr::Or(l, r) => format!("({} || {})", l.render(), r.render()),
            Expr::Implies(l, r) => format!("({} => {})", l.render(), r.render()),
            Expr::Since(l, r) => format!("({} S {})", l.render(), r.render()),
            Expr::Cmp(op, l, r) => format!("({} {} {})", l.render(), op, r.render()),
            Expr::Arith(op, l, r) => format!("({} {} {})", l.render(), op, r.render()),
        }
    }
}

/// Error raised when an expression fails to parse.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at position {}: {}", self.position, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Num(f64),
    True,
    False,
    Not,
    And,
    Or,
    Implies,
    Historically,
    Once,
    Previous,
    Since,
    LParen,
    RParen,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Plus,
    Minus,
    Star,
    Slash,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                j += 1;
            }
            let text: String = chars[i..j].iter().collect();
            let value = text.parse::<f64>().map_err(|_| ParseError {
                message: format!("invalid number '{}'", text),
                position: start,
            })?;
            tokens.push((Token::Num(value), start));
            i = j;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut j = i;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let word: String = chars[i..j].iter().collect();
            let token = match word.as_str() {
                "true" => Token::True,
                "false" => Token::False,
                "not" => Token::Not,
                "and" => Token::And,
                "or" => Token::Or,
                "H" => Token::Historically,
                "O" => Token::Once,
                "Y" | "PRE" => Token::Previous,
                "S" => Token::Since,
                _ => Token::Ident(word),
            };
            tokens.push((token, start));
            i = j;
            continue;
        }

        let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
        let token = match two.as_str() {
            "&&" => Some((Token::And, 2)),
            "||" => Some((Token::Or, 2)),
            "=>" => Some((Token::Implies, 2)),
            "<=" => Some((Token::Le, 2)),
            ">=" => Some((Token::Ge, 2)),
            "==" => Some((Token::Eq, 2)),
            "!=" => Some((Token::Ne, 2)),
            _ => None,
        };
        if let Some((token, len)) = token {
            tokens.push((token, start));
            i += len;
            continue;
        }

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '!' => Token::Not,
            '<' => Token::Lt,
            '>' => Token::Gt,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            other => {
                return Err(ParseError {
                    message: format!("unexpected character '{}'", other),
                    position: start,
                })
            }
        };
        tokens.push((token, start));
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, p)| *p)
            .unwrap_or(self.input_len)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.position(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_implies()
    }

    // Right-associative.
    fn parse_implies(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_or()?;
        if self.eat(&Token::Implies) {
            let right = self.parse_implies()?;
            return Ok(Expr::Implies(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_since()?;
        while self.eat(&Token::And) {
            let right = self.parse_since()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_since(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while self.eat(&Token::Since) {
            let right = self.parse_unary()?;
            left = Expr::Since(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Not) => {
                self.pos += 1;
                Ok(Expr::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::Historically) => {
                self.pos += 1;
                Ok(Expr::Historically(Box::new(self.parse_unary()?)))
            }
            Some(Token::Once) => {
                self.pos += 1;
                Ok(Expr::Once(Box::new(self.parse_unary()?)))
            }
            Some(Token::Previous) => {
                self.pos += 1;
                Ok(Expr::Previous(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_term()?;
        let op = match self.peek() {
            Some(Token::Lt) => Some(CmpOp::Lt),
            Some(Token::Le) => Some(CmpOp::Le),
            Some(Token::Gt) => Some(CmpOp::Gt),
            Some(Token::Ge) => Some(CmpOp::Ge),
            Some(Token::Eq) => Some(CmpOp::Eq),
            Some(Token::Ne) => Some(CmpOp::Ne),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let right = self.parse_term()?;
            return Ok(Expr::Cmp(op, Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_factor()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let position = self.position();
        match self.advance() {
            Some(Token::True) => Ok(Expr::Const(true)),
            Some(Token::False) => Ok(Expr::Const(false)),
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::Minus) => Ok(Expr::Neg(Box::new(self.parse_primary()?))),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(other) => Err(ParseError {
                message: format!("unexpected token {:?}", other),
                position,
            }),
            None => Err(ParseError {
                message: "unexpected end of input".to_string(),
                position,
            }),
        }
    }
}

/// Parse a past-time temporal logic expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError {
            message: "empty expression".to_string(),
            position: 0,
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let expr = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("trailing input after expression"));
    }
    Ok(expr)
}

/// Handler for the past-time temporal logic sub-language.
#[derive(Debug, Clone, Copy, Default)]
pub struct PtltlHandler;

impl ExpressionHandler for PtltlHandler {
    type Expr = Expr;

    fn parse(&self, source: &str) -> Result<Expr, String> {
        parse(source).map_err(|e| e.to_string())
    }

    fn substitute(&self, renames: &HashMap<String, String>, expr: &Expr) -> Expr {
        expr.substitute(renames)
    }

    fn render(&self, expr: &Expr) -> String {
        expr.render()
    }

    fn identifiers(&self, expr: &Expr) -> Vec<String> {
        expr.identifiers()
    }

    fn unknown(&self) -> Expr {
        Expr::Const(false)
    }
}
