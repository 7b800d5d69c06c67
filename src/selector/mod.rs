//! Selector-language adapters for the supported document shapes.
//!
//! A selector is a path-like string that, evaluated against a document or
//! sub-document, yields zero or more string matches. Each document shape has
//! its own selector language (markup paths, record paths, column references)
//! but all adapters satisfy the same compile-then-evaluate contract, which is
//! the only thing the extraction engine knows about them.

pub mod markup;
pub mod record;
pub mod table;

/// Format-agnostic selector evaluation.
///
/// Compilation doubles as validation: every selector in a format descriptor
/// is compiled before any document content is read, so evaluation never sees
/// a syntactically invalid selector.
pub trait SelectorAdapter {
    /// A document or sub-document this adapter can evaluate selectors against.
    type Scope: Clone;
    /// A validated, pre-parsed selector.
    type Selector;

    /// Parse a selector string, rejecting invalid syntax.
    fn compile(selector: &str) -> Result<Self::Selector, String>;

    /// Evaluate a collection selector, yielding matched sub-documents.
    fn select_docs(&self, selector: &Self::Selector, scope: &Self::Scope) -> Vec<Self::Scope>;

    /// Evaluate a value selector, yielding matched strings.
    fn select_values(&self, selector: &Self::Selector, scope: &Self::Scope) -> Vec<String>;
}
