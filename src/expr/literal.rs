//! Pass-through expression handler.
//!
//! Used when requirement expressions arrive pre-parsed or already in the
//! target language: parsing never fails, the text is carried through
//! verbatim, and no identifiers are reported (so identifier completion
//! declares nothing).

use std::collections::HashMap;

use crate::expr::ExpressionHandler;

/// Handler that treats expressions as opaque text.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralHandler;

impl ExpressionHandler for LiteralHandler {
    type Expr = String;

    fn parse(&self, source: &str) -> Result<String, String> {
        Ok(source.trim().to_string())
    }

    fn substitute(&self, _renames: &HashMap<String, String>, expr: &String) -> String {
        expr.clone()
    }

    fn render(&self, expr: &String) -> String {
        expr.clone()
    }

    fn identifiers(&self, _expr: &String) -> Vec<String> {
        Vec::new()
    }

    fn unknown(&self) -> String {
        String::new()
    }
}
