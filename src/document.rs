//! Loaded documents and shape dispatch.
//!
//! A [`Document`] is the parsed form of one input file, in whichever of the
//! three supported shapes the format descriptor names. Parsing is the only
//! shape-specific step the pipeline performs directly; everything afterwards
//! goes through the selector adapter for that shape.

use crate::expr::{ExpressionHandler, PreprocessCommand};
use crate::extraction::{extract, ExtractionError};
use crate::format::{FormatDescriptor, FormatKind};
use crate::selector::markup::{self, MarkupAdapter, Node};
use crate::selector::record::RecordAdapter;
use crate::selector::table::{TableAdapter, TableScope, Workbook};
use crate::spec::Spec;

/// A parsed input document.
#[derive(Debug, Clone)]
pub enum Document {
    Markup(Node),
    Record(serde_json::Value),
    Table(Workbook),
}

impl Document {
    /// Parse raw bytes according to the descriptor's document shape.
    pub fn parse(kind: FormatKind, bytes: &[u8]) -> Result<Self, String> {
        match kind {
            FormatKind::Markup => markup::parse_document(bytes).map(Document::Markup),
            FormatKind::Record => serde_json::from_slice(bytes)
                .map(Document::Record)
                .map_err(|e| format!("invalid record document: {}", e)),
            FormatKind::Table => Workbook::from_bytes(bytes).map(Document::Table),
        }
    }
}

/// Run the extraction engine with the adapter matching the document shape.
pub fn extract_document<H: ExpressionHandler>(
    descriptor: &FormatDescriptor,
    document: &Document,
    handler: &H,
    preprocess: Option<&PreprocessCommand>,
) -> Result<Spec<H::Expr>, ExtractionError> {
    match document {
        Document::Markup(root) => extract(descriptor, &MarkupAdapter, root, handler, preprocess),
        Document::Record(value) => extract(descriptor, &RecordAdapter, value, handler, preprocess),
        Document::Table(book) => extract(
            descriptor,
            &TableAdapter,
            &TableScope::Book(book.clone()),
            handler,
            preprocess,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_document() {
        let doc = Document::parse(FormatKind::Record, br#"{"requirements": []}"#).unwrap();
        assert!(matches!(doc, Document::Record(_)));
    }

    #[test]
    fn test_parse_markup_document() {
        let doc = Document::parse(FormatKind::Markup, b"<spec></spec>").unwrap();
        assert!(matches!(doc, Document::Markup(_)));
    }

    #[test]
    fn test_parse_errors_are_strings() {
        assert!(Document::parse(FormatKind::Record, b"not json").is_err());
        assert!(Document::parse(FormatKind::Table, b"not a workbook").is_err());
    }
}
