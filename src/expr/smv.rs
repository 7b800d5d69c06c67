//! SMV-flavoured boolean expression sub-language.
//!
//! A structurally distinct alternative to the default temporal language,
//! matching the syntax conventions of symbolic model checkers: `&`, `|`,
//! `xor`, `->`, `!`, uppercase `TRUE`/`FALSE`, and the past-time operators
//! `H`, `O`, `Y` and `S`. The language is purely boolean; there are no
//! comparisons or arithmetic. Conjunction and disjunction are n-ary, so
//! `a & b & c` parses to a single three-way conjunction.
//!
//! Precedence, lowest to highest: `->` (right-associative), `|`, `xor`, `&`,
//! `S`, unary operators.

use std::collections::HashMap;
use std::fmt;

use crate::expr::ExpressionHandler;

/// Parsed SMV-flavoured expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(bool),
    Var(String),
    Neg(Box<Expr>),
    Conj(Vec<Expr>),
    Disj(Vec<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Impl(Box<Expr>, Box<Expr>),
    Hist(Box<Expr>),
    Once(Box<Expr>),
    Prev(Box<Expr>),
    Since(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Identifiers in first-occurrence order, without duplicates.
    pub fn identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect(&self, out: &mut Vec<String>) {
        match self {
            Expr::Var(name) => {
                if !out.iter().any(|n| n == name) {
                    out.push(name.clone());
                }
            }
            Expr::Lit(_) => {}
            Expr::Neg(e) | Expr::Hist(e) | Expr::Once(e) | Expr::Prev(e) => e.collect(out),
            Expr::Conj(items) | Expr::Disj(items) => {
                for item in items {
                    item.collect(out);
                }
            }
            Expr::Xor(l, r) | Expr::Impl(l, r) | Expr::Since(l, r) => {
                l.collect(out);
                r.collect(out);
            }
        }
    }

    pub fn substitute(&self, renames: &HashMap<String, String>) -> Expr {
        match self {
            Expr::Var(name) => Expr::Var(
                renames
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.clone()),
            ),
            Expr::Lit(b) => Expr::Lit(*b),
            Expr::Neg(e) => Expr::Neg(Box::new(e.substitute(renames))),
            Expr::Hist(e) => Expr::Hist(Box::new(e.substitute(renames))),
            Expr::Once(e) => Expr::Once(Box::new(e.substitute(renames))),
            Expr::Prev(e) => Expr::Prev(Box::new(e.substitute(renames))),
            Expr::Conj(items) => {
                Expr::Conj(items.iter().map(|e| e.substitute(renames)).collect())
            }
            Expr::Disj(items) => {
                Expr::Disj(items.iter().map(|e| e.substitute(renames)).collect())
            }
            Expr::Xor(l, r) => Expr::Xor(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Impl(l, r) => Expr::Impl(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
            Expr::Since(l, r) => Expr::Since(
                Box::new(l.substitute(renames)),
                Box::new(r.substitute(renames)),
            ),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Expr::Lit(true) => "TRUE".to_string(),
            Expr::Lit(false) => "FALSE".to_string(),
            Expr::Var(name) => name.clone(),
            Expr::Neg(e) => format!("!({})", e.render()),
            Expr::Hist(e) => format!("H ({})", e.render()),
            Expr::Once(e) => format!("O ({})", e.render()),
            Expr::Prev(e) => format!("Y ({})", e.render()),
            Expr::Conj(items) => render_nary(items, " & "),
            Expr::Disj(items) => render_nary(items, " | "),
            Expr::Xor(l, r) => format!("({} xor {})", l.render(), r.render()),
            Expr::Impl(l, r) => format!("({} -> {})", l.render(), r.render()),
            Expr::Since(l, r) => format!("({} S {})", l.render(), r.render()),
        }
    }
}

fn render_nary(items: &[Expr], sep: &str) -> String {
    let parts: Vec<String> = items.iter().map(|e| e.render()).collect();
    format!("({})", parts.join(sep))
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

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            input,
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        let end = self.pos + s.len();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().collect::<String>() == s {
            self.pos = end;
            true
        } else {
            false
        }
    }

    /// Match a keyword: like `eat_str`, but the next character must not
    /// continue an identifier.
    fn eat_word(&mut self, word: &str) -> bool {
        self.skip_ws();
        let end = self.pos + word.len();
        if end > self.chars.len() {
            return false;
        }
        if self.chars[self.pos..end].iter().collect::<String>() != word {
            return false;
        }
        if let Some(next) = self.chars.get(end) {
            if next.is_alphanumeric() || *next == '_' || *next == '.' {
                return false;
            }
        }
        self.pos = end;
        true
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos.min(self.input.len()),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_impl()
    }

    fn parse_impl(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_disj()?;
        if self.eat_str("->") {
            let right = self.parse_impl()?;
            return Ok(Expr::Impl(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_disj(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_xor()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            items.push(self.parse_xor()?);
        }
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Disj(items))
        }
    }

    fn parse_xor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_conj()?;
        while self.eat_word("xor") {
            let right = self.parse_conj()?;
            left = Expr::Xor(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conj(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_since()?];
        while self.peek() == Some('&') {
            self.pos += 1;
            items.push(self.parse_since()?);
        }
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Conj(items))
        }
    }

    fn parse_since(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while self.eat_word("S") {
            let right = self.parse_unary()?;
            left = Expr::Since(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat_word("H") {
            return Ok(Expr::Hist(Box::new(self.parse_unary()?)));
        }
        if self.eat_word("O") {
            return Ok(Expr::Once(Box::new(self.parse_unary()?)));
        }
        if self.eat_word("Y") {
            return Ok(Expr::Prev(Box::new(self.parse_unary()?)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some('(') {
            self.pos += 1;
            let inner = self.parse_expr()?;
            if self.peek() != Some(')') {
                return Err(self.error("expected ')'"));
            }
            self.pos += 1;
            return Ok(inner);
        }

        if self.eat_word("TRUE") {
            return Ok(Expr::Lit(true));
        }
        if self.eat_word("FALSE") {
            return Ok(Expr::Lit(false));
        }

        self.skip_ws();
        let start = self.pos;
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error(match self.chars.get(self.pos) {
                Some(c) => format!("unexpected character '{}'", c),
                None => "unexpected end of input".to_string(),
            }));
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if name.chars().next().map(|c| c.is_ascii_digit()) == Some(true) {
            return Err(ParseError {
                message: format!("invalid identifier '{}'", name),
                position: start,
            });
        }
        Ok(Expr::Var(name))
    }
}

/// Parse an SMV-flavoured boolean expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    if parser.peek().is_none() {
        return Err(ParseError {
            message: "empty expression".to_string(),
            position: 0,
        });
    }
    let expr = parser.parse_expr()?;
    if parser.peek().is_some() {
        return Err(parser.error("trailing input after expression"));
    }
    Ok(expr)
}

/// Handler for the SMV-flavoured sub-language.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmvHandler;

impl ExpressionHandler for SmvHandler {
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
        Expr::Lit(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nary_conjunction() {
        let expr = parse("a & b & c").unwrap();
        match expr {
            Expr::Conj(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // & binds tighter than |, | tighter than ->
        let expr = parse("a & b | c -> d").unwrap();
        match expr {
            Expr::Impl(l, _) => assert!(matches!(*l, Expr::Disj(_))),
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_temporal_operators() {
        let expr = parse("H !failed & O (armed S go)").unwrap();
        match expr {
            Expr::Conj(items) => {
                assert!(matches!(items[0], Expr::Hist(_)));
                assert!(matches!(items[1], Expr::Once(_)));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_keyword_prefix_identifiers() {
        // identifiers that merely start with an operator keyword
        let expr = parse("Halt & Opened & Sum").unwrap();
        assert_eq!(expr.identifiers(), vec!["Halt", "Opened", "Sum"]);
    }

    #[test]
    fn test_literals_and_xor() {
        let expr = parse("TRUE xor done").unwrap();
        assert!(matches!(expr, Expr::Xor(_, _)));
    }

    #[test]
    fn test_dotted_identifiers() {
        let expr = parse("nav.alt_ok & imu.ready").unwrap();
        assert_eq!(expr.identifiers(), vec!["nav.alt_ok", "imu.ready"]);
    }

    #[test]
    fn test_render_reparses() {
        let source = "H !failed -> (a & b & c | O d) xor (e S f)";
        let expr = parse(source).unwrap();
        let reparsed = parse(&expr.render()).unwrap();
        assert_eq!(expr.identifiers(), reparsed.identifiers());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("a &").is_err());
        assert!(parse("(a | b").is_err());
        assert!(parse("a ? b").is_err());
        assert!(parse("123abc").is_err());
    }
}
