//! # Specmill: Requirement Specification Compilation
//!
//! Specmill ingests engineering requirement specifications — telemetry
//! variable declarations and past-time temporal-logic requirements — from
//! heterogeneous structured documents and compiles them into a canonical
//! model for stream-monitor generation. It also resolves how an external
//! variable maps onto the concrete message/topic/field path of a target
//! embedded framework.
//!
//! ## Features
//!
//! - **Format-directed extraction**: a declarative [`FormatDescriptor`]
//!   says where each field lives; the engine drives the matching selector
//!   adapter (markup paths, record paths, sheet/column references)
//! - **Pluggable expression sub-languages**: past-time temporal logic,
//!   SMV-flavoured boolean syntax, or pass-through literals, selected by
//!   name at pipeline construction
//! - **Identifier completion**: externals referenced in requirements but
//!   never declared are auto-declared
//! - **Variable routing**: partial routing descriptions merged with
//!   conflict detection, then queried with a strict four-relation join
//!
//! ## Example: compile a record document
//!
//! ```ignore
//! use specmill::{compile_spec, FormatDescriptor};
//!
//! let descriptor = FormatDescriptor::load("record-reqs")?;
//! let spec = compile_spec(&document_bytes, &descriptor, "ptltl", None)?;
//! for requirement in &spec.requirements {
//!     println!("{}: {}", requirement.name, requirement.expr.render());
//! }
//! ```
//!
//! ## Example: resolve a variable's routing
//!
//! ```ignore
//! use specmill::{load_variable_db, resolve_type};
//!
//! let db = load_variable_db(&["routing/fsw.json"])?;
//! if let Some(mapping) = resolve_type(&db, "alt", "cfs", "C") {
//!     println!("alt arrives as {}", mapping.to_type);
//! }
//! ```

// Core modules
pub mod document;
pub mod expr;
pub mod extraction;
pub mod format;
pub mod routing;
pub mod selector;
pub mod spec;

// Pipeline entry points
pub mod pipeline;

// Re-export key types
pub use document::{extract_document, Document};
pub use expr::{
    case_renames, complete_externals, Expr, ExpressionHandler, Handler, LiteralHandler,
    PreprocessCommand, PtltlHandler, SmvHandler, HANDLER_NAMES,
};
pub use extraction::{extract, ExtractionError};
pub use format::{FormatDescriptor, FormatKind};
pub use pipeline::{compile_spec, compile_spec_file, load_variable_db};
pub use routing::merge::{merge, merge_all, MergeError};
pub use routing::resolve::{output_type, resolve_type};
pub use routing::{Connection, InputDef, OutputDef, TopicDef, TypeDef, VariableDb};
pub use selector::SelectorAdapter;
pub use spec::{ExternalVariableDef, InternalVariableDef, Requirement, Spec};
