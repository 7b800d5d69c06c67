//! Core-facing pipeline entry points.
//!
//! [`compile_spec`] takes a document, a format descriptor and a sub-language
//! name and produces the completed canonical spec; [`load_variable_db`]
//! folds routing-description files with the built-in default into one
//! database. All configuration is threaded in explicitly; nothing is read
//! from process-wide state.

use std::fs;
use std::path::Path;

use crate::document::{extract_document, Document};
use crate::expr::{complete_externals, Expr, Handler, PreprocessCommand};
use crate::format::FormatDescriptor;
use crate::routing::merge::merge_all;
use crate::routing::VariableDb;
use crate::spec::Spec;

/// Compile a requirements document into a completed canonical spec.
///
/// The handler name is resolved through the sub-language registry
/// (unrecognized names fall back to the default). After extraction,
/// identifier completion auto-declares external variables for identifiers
/// referenced in requirements but never declared.
pub fn compile_spec(
    document_bytes: &[u8],
    descriptor: &FormatDescriptor,
    handler_name: &str,
    preprocess: Option<&PreprocessCommand>,
) -> Result<Spec<Expr>, String> {
    let handler = Handler::from_name(handler_name);
    tracing::info!(
        "compiling spec ({} expression language)",
        handler.name()
    );

    let document = Document::parse(descriptor.format, document_bytes)?;
    let spec =
        extract_document(descriptor, &document, &handler, preprocess).map_err(|e| e.to_string())?;
    Ok(complete_externals(spec, &handler))
}

/// Convenience wrapper: read the document from a file and resolve the
/// descriptor from a preset name or path.
pub fn compile_spec_file<P: AsRef<Path>>(
    document_path: P,
    format_name_or_path: &str,
    handler_name: &str,
    preprocess: Option<&PreprocessCommand>,
) -> Result<Spec<Expr>, String> {
    let document_path = document_path.as_ref();
    let descriptor = FormatDescriptor::load(format_name_or_path)?;
    let bytes = fs::read(document_path)
        .map_err(|e| format!("failed to read {}: {}", document_path.display(), e))?;
    compile_spec(&bytes, &descriptor, handler_name, preprocess)
}

/// Load and merge routing-description files, in the order given, followed by
/// the built-in default database.
pub fn load_variable_db<P: AsRef<Path>>(paths: &[P]) -> Result<VariableDb, String> {
    let mut databases = Vec::with_capacity(paths.len() + 1);
    for path in paths {
        databases.push(VariableDb::from_file(path)?);
    }
    databases.push(VariableDb::builtin());

    let merged = merge_all(databases.iter()).map_err(|e| e.to_string())?;
    tracing::info!(
        "variable DB: {} input(s), {} topic(s), {} type mapping(s), {} output(s)",
        merged.inputs.len(),
        merged.topics.len(),
        merged.types.len(),
        merged.outputs.len()
    );
    Ok(merged)
}
