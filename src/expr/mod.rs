//! Pluggable expression sub-languages.
//!
//! The extraction engine and the code generators never see the grammar of a
//! requirement expression; they go through [`ExpressionHandler`], a
//! capability bundle of the five operations a sub-language must support.
//! One handler is selected per run by name token via [`Handler::from_name`].
//!
//! Shipped sub-languages:
//!
//! - `ptltl` — past-time temporal logic with comparisons (default)
//! - `smv` — SMV-flavoured pure-boolean syntax
//! - `literal` — pass-through for pre-parsed expressions

pub mod literal;
pub mod preprocess;
pub mod ptltl;
pub mod smv;

use std::collections::{HashMap, HashSet};

use convert_case::{Case, Casing};

use crate::spec::{ExternalVariableDef, Spec};

pub use literal::LiteralHandler;
pub use preprocess::PreprocessCommand;
pub use ptltl::PtltlHandler;
pub use smv::SmvHandler;

/// Capability bundle for one expression sub-language.
///
/// The expression representation is opaque to everything but the handler
/// itself; the rest of the pipeline only stores, rewrites and renders it
/// through these five operations.
pub trait ExpressionHandler {
    type Expr: Clone + std::fmt::Debug + PartialEq;

    /// Parse concrete syntax into the sub-language representation.
    fn parse(&self, source: &str) -> Result<Self::Expr, String>;

    /// Rewrite identifier names according to the mapping. The identity
    /// substitution is valid for sub-languages that perform no rewriting.
    fn substitute(&self, renames: &HashMap<String, String>, expr: &Self::Expr) -> Self::Expr;

    /// Render back to concrete syntax.
    fn render(&self, expr: &Self::Expr) -> String;

    /// Identifiers referenced by the expression, in first-occurrence order.
    fn identifiers(&self, expr: &Self::Expr) -> Vec<String>;

    /// The designated value standing in for an unknown expression.
    fn unknown(&self) -> Self::Expr;
}

/// Expression representation erased over the shipped sub-languages.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ptltl(ptltl::Expr),
    Smv(smv::Expr),
    Literal(String),
}

impl Expr {
    pub fn render(&self) -> String {
        match self {
            Expr::Ptltl(e) => e.render(),
            Expr::Smv(e) => e.render(),
            Expr::Literal(s) => s.clone(),
        }
    }

    pub fn identifiers(&self) -> Vec<String> {
        match self {
            Expr::Ptltl(e) => e.identifiers(),
            Expr::Smv(e) => e.identifiers(),
            Expr::Literal(_) => Vec::new(),
        }
    }

    pub fn substitute(&self, renames: &HashMap<String, String>) -> Expr {
        match self {
            Expr::Ptltl(e) => Expr::Ptltl(e.substitute(renames)),
            Expr::Smv(e) => Expr::Smv(e.substitute(renames)),
            Expr::Literal(s) => Expr::Literal(s.clone()),
        }
    }
}

/// Sub-language registry: one variant per shipped handler, selected by name.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Ptltl(PtltlHandler),
    Smv(SmvHandler),
    Literal(LiteralHandler),
}

/// Recognized sub-language name tokens.
pub const HANDLER_NAMES: &[&str] = &["ptltl", "smv", "literal"];

impl Handler {
    /// Look up a sub-language by name token. Unrecognized tokens fall back
    /// to the default sub-language (`ptltl`).
    pub fn from_name(name: &str) -> Handler {
        match name.to_ascii_lowercase().as_str() {
            "ptltl" | "pt" => Handler::Ptltl(PtltlHandler),
            "smv" => Handler::Smv(SmvHandler),
            "literal" | "lit" => Handler::Literal(LiteralHandler),
            other => {
                tracing::debug!(
                    "unknown expression language '{}', falling back to ptltl",
                    other
                );
                Handler::Ptltl(PtltlHandler)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Handler::Ptltl(_) => "ptltl",
            Handler::Smv(_) => "smv",
            Handler::Literal(_) => "literal",
        }
    }
}

impl Default for Handler {
    fn default() -> Self {
        Handler::Ptltl(PtltlHandler)
    }
}

impl ExpressionHandler for Handler {
    type Expr = Expr;

    fn parse(&self, source: &str) -> Result<Expr, String> {
        match self {
            Handler::Ptltl(h) => h.parse(source).map(Expr::Ptltl),
            Handler::Smv(h) => h.parse(source).map(Expr::Smv),
            Handler::Literal(h) => h.parse(source).map(Expr::Literal),
        }
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
        match self {
            Handler::Ptltl(h) => Expr::Ptltl(h.unknown()),
            Handler::Smv(h) => Expr::Smv(h.unknown()),
            Handler::Literal(h) => Expr::Literal(h.unknown()),
        }
    }
}

/// Auto-declare external variables for identifiers referenced in some
/// requirement but never declared.
///
/// New declarations are appended in the order the names are first observed
/// across requirements, with an empty type. Running the completion again on
/// the result is a no-op.
pub fn complete_externals<H: ExpressionHandler>(spec: Spec<H::Expr>, handler: &H) -> Spec<H::Expr> {
    let mut spec = spec;
    let mut declared: HashSet<String> = spec
        .declared_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut inferred = Vec::new();
    for requirement in &spec.requirements {
        for name in handler.identifiers(&requirement.expr) {
            if declared.insert(name.clone()) {
                inferred.push(name);
            }
        }
    }

    if !inferred.is_empty() {
        tracing::debug!("auto-declaring {} external variable(s)", inferred.len());
    }
    for name in inferred {
        spec.external_variables.push(ExternalVariableDef {
            name,
            type_name: String::new(),
        });
    }
    spec
}

/// Build a substitution mapping that adapts identifier names to a letter
/// case convention, e.g. for targets whose glue code expects snake_case.
/// Names already in the target convention are omitted.
pub fn case_renames(names: &[String], case: Case) -> HashMap<String, String> {
    names
        .iter()
        .filter_map(|name| {
            let converted = name.to_case(case);
            if converted != *name {
                Some((name.clone(), converted))
            } else {
                None
            }
        })
        .collect()
}

/// Parse a case-convention name as accepted on the command line.
pub fn parse_case(name: &str) -> Option<Case> {
    match name.to_ascii_lowercase().as_str() {
        "snake" => Some(Case::Snake),
        "camel" => Some(Case::Camel),
        "pascal" => Some(Case::Pascal),
        "kebab" => Some(Case::Kebab),
        "upper-snake" | "screaming-snake" => Some(Case::UpperSnake),
        _ => None,
    }
}
