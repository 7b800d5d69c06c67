//! Format-directed extraction engine.
//!
//! Turns any supported document shape into a canonical [`Spec`], given only a
//! [`FormatDescriptor`] saying where each field lives. The engine is generic
//! over the selector adapter (document shape) and the expression handler
//! (requirement sub-language); it owns the shared behavior: selector
//! validation, the exactly-one cardinality rule for mandatory slots, and
//! atomic assembly — on any error no partial `Spec` escapes.

use crate::expr::{ExpressionHandler, PreprocessCommand};
use crate::format::FormatDescriptor;
use crate::selector::SelectorAdapter;
use crate::spec::{ExternalVariableDef, InternalVariableDef, Requirement, Spec};

/// Error raised while extracting a spec from a document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// A selector in the descriptor failed to compile. Reported before any
    /// document content is read.
    InvalidSelector {
        slot: &'static str,
        message: String,
    },
    /// A mandatory slot matched nothing within its scope.
    MissingValue { slot: &'static str },
    /// A mandatory slot matched more than once within its scope.
    MultipleValues { slot: &'static str },
    /// The expression sub-language (or the external preprocess command)
    /// rejected a requirement's expression.
    Expression {
        requirement: String,
        message: String,
    },
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::InvalidSelector { slot, message } => {
                write!(f, "invalid selector for {}: {}", slot, message)
            }
            ExtractionError::MissingValue { slot } => {
                write!(f, "Failed to find a value for {}", slot)
            }
            ExtractionError::MultipleValues { slot } => {
                write!(f, "Unexpectedly found multiple values for {}", slot)
            }
            ExtractionError::Expression {
                requirement,
                message,
            } => {
                write!(
                    f,
                    "failed to parse expression of requirement '{}': {}",
                    requirement, message
                )
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Pre-compiled selector slots for one descriptor.
struct CompiledSlots<A: SelectorAdapter> {
    internal: Option<InternalSlots<A>>,
    external: Option<ExternalSlots<A>>,
    requirements: ReqSlots<A>,
}

struct InternalSlots<A: SelectorAdapter> {
    collection: A::Selector,
    id: A::Selector,
    expr: A::Selector,
    type_selector: Option<A::Selector>,
}

struct ExternalSlots<A: SelectorAdapter> {
    collection: A::Selector,
    id: A::Selector,
    type_selector: Option<A::Selector>,
}

struct ReqSlots<A: SelectorAdapter> {
    collection: A::Selector,
    id: A::Selector,
    expr: A::Selector,
    description: Option<A::Selector>,
}

fn compile_slot<A: SelectorAdapter>(
    slot: &'static str,
    selector: &str,
) -> Result<A::Selector, ExtractionError> {
    A::compile(selector).map_err(|message| ExtractionError::InvalidSelector { slot, message })
}

/// Compile every declared selector, in the canonical slot order, stopping at
/// the first invalid one.
fn compile_descriptor<A: SelectorAdapter>(
    descriptor: &FormatDescriptor,
) -> Result<CompiledSlots<A>, ExtractionError> {
    let internal = match &descriptor.internal_vars {
        Some(slots) => Some(InternalSlots {
            collection: compile_slot::<A>("internal_vars.collection", &slots.collection)?,
            id: compile_slot::<A>("internal_vars.id", &slots.id)?,
            expr: compile_slot::<A>("internal_vars.expr", &slots.expr)?,
            type_selector: match &slots.type_selector {
                Some(t) => Some(compile_slot::<A>("internal_vars.type", t)?),
                None => None,
            },
        }),
        None => None,
    };

    let external = match &descriptor.external_vars {
        Some(slots) => Some(ExternalSlots {
            collection: compile_slot::<A>("external_vars.collection", &slots.collection)?,
            id: compile_slot::<A>("external_vars.id", &slots.id)?,
            type_selector: match &slots.type_selector {
                Some(t) => Some(compile_slot::<A>("external_vars.type", t)?),
                None => None,
            },
        }),
        None => None,
    };

    let requirements = ReqSlots {
        collection: compile_slot::<A>(
            "requirements.collection",
            &descriptor.requirements.collection,
        )?,
        id: compile_slot::<A>("requirements.id", &descriptor.requirements.id)?,
        expr: compile_slot::<A>("requirements.expr", &descriptor.requirements.expr)?,
        description: match &descriptor.requirements.description {
            Some(d) => Some(compile_slot::<A>("requirements.description", d)?),
            None => None,
        },
    };

    Ok(CompiledSlots {
        internal,
        external,
        requirements,
    })
}

/// Evaluate a scoped selector that must match exactly once.
fn single<A: SelectorAdapter>(
    adapter: &A,
    selector: &A::Selector,
    scope: &A::Scope,
    slot: &'static str,
) -> Result<String, ExtractionError> {
    let mut values = adapter.select_values(selector, scope);
    match values.len() {
        0 => Err(ExtractionError::MissingValue { slot }),
        1 => Ok(values.remove(0)),
        _ => Err(ExtractionError::MultipleValues { slot }),
    }
}

/// Evaluate an optional scoped selector: exactly-one if the slot is
/// declared, empty string otherwise.
fn single_or_default<A: SelectorAdapter>(
    adapter: &A,
    selector: &Option<A::Selector>,
    scope: &A::Scope,
    slot: &'static str,
) -> Result<String, ExtractionError> {
    match selector {
        Some(s) => single(adapter, s, scope, slot),
        None => Ok(String::new()),
    }
}

/// Extract a canonical spec from a document.
///
/// The descriptor's selectors are validated first (short-circuiting on the
/// first invalid one); the document is only consulted afterwards. The whole
/// operation fails atomically.
pub fn extract<A, H>(
    descriptor: &FormatDescriptor,
    adapter: &A,
    document: &A::Scope,
    handler: &H,
    preprocess: Option<&PreprocessCommand>,
) -> Result<Spec<H::Expr>, ExtractionError>
where
    A: SelectorAdapter,
    H: ExpressionHandler,
{
    let slots = compile_descriptor::<A>(descriptor)?;
    let mut spec = Spec::new();

    if let Some(internal) = &slots.internal {
        for element in adapter.select_docs(&internal.collection, document) {
            let name = single(adapter, &internal.id, &element, "internal_vars.id")?;
            let expr = single(adapter, &internal.expr, &element, "internal_vars.expr")?;
            let type_name = single_or_default(
                adapter,
                &internal.type_selector,
                &element,
                "internal_vars.type",
            )?;
            spec.internal_variables.push(InternalVariableDef {
                name,
                type_name,
                expr,
            });
        }
    }

    if let Some(external) = &slots.external {
        for element in adapter.select_docs(&external.collection, document) {
            let name = single(adapter, &external.id, &element, "external_vars.id")?;
            let type_name = single_or_default(
                adapter,
                &external.type_selector,
                &element,
                "external_vars.type",
            )?;
            spec.external_variables
                .push(ExternalVariableDef { name, type_name });
        }
    }

    for element in adapter.select_docs(&slots.requirements.collection, document) {
        let name = single(adapter, &slots.requirements.id, &element, "requirements.id")?;
        let raw = single(
            adapter,
            &slots.requirements.expr,
            &element,
            "requirements.expr",
        )?;
        let description = single_or_default(
            adapter,
            &slots.requirements.description,
            &element,
            "requirements.description",
        )?;

        let translated = match preprocess {
            Some(command) => {
                command
                    .run(&raw)
                    .map_err(|message| ExtractionError::Expression {
                        requirement: name.clone(),
                        message,
                    })?
            }
            None => raw,
        };

        let expr = handler
            .parse(&translated)
            .map_err(|message| ExtractionError::Expression {
                requirement: name.clone(),
                message,
            })?;

        spec.requirements.push(Requirement {
            name,
            expr,
            description,
        });
    }

    tracing::debug!(
        "extracted {} internal, {} external, {} requirement(s)",
        spec.internal_variables.len(),
        spec.external_variables.len(),
        spec.requirements.len()
    );

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::PtltlHandler;
    use crate::format::FormatKind;
    use crate::selector::record::RecordAdapter;
    use serde_json::json;

    fn record_descriptor() -> FormatDescriptor {
        FormatDescriptor::from_str(
            r#"
            format: record
            internal_vars:
              collection: "$.internal[*]"
              id: "name"
              expr: "definition"
            external_vars:
              collection: "$.external[*]"
              id: "name"
              type: "type"
            requirements:
              collection: "$.requirements[*]"
              id: "name"
              expr: "formula"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_extract_counts_match_document() {
        let descriptor = record_descriptor();
        assert_eq!(descriptor.format, FormatKind::Record);
        let doc = json!({
            "internal": [
                {"name": "ok", "definition": "alt > 0"}
            ],
            "external": [
                {"name": "alt", "type": "double"},
                {"name": "pressed", "type": "bool"}
            ],
            "requirements": [
                {"name": "req1", "formula": "H ok"},
                {"name": "req2", "formula": "O pressed"}
            ]
        });

        let spec = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap();
        assert_eq!(spec.internal_variables.len(), 1);
        assert_eq!(spec.external_variables.len(), 2);
        assert_eq!(spec.requirements.len(), 2);
        // internal type slot undeclared: defaults to empty
        assert_eq!(spec.internal_variables[0].type_name, "");
        assert_eq!(spec.requirements[0].name, "req1");
    }

    #[test]
    fn test_missing_mandatory_slot() {
        let descriptor = record_descriptor();
        let doc = json!({
            "requirements": [
                {"name": "req1"}
            ]
        });

        let err = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingValue {
                slot: "requirements.expr"
            }
        );
        assert_eq!(
            err.to_string(),
            "Failed to find a value for requirements.expr"
        );
    }

    #[test]
    fn test_multiple_matches_for_mandatory_slot() {
        let mut descriptor = record_descriptor();
        descriptor.requirements.id = "names[*]".to_string();
        let doc = json!({
            "requirements": [
                {"names": ["a", "b"], "formula": "x"}
            ]
        });

        let err = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unexpectedly found multiple values for requirements.id"
        );
    }

    #[test]
    fn test_invalid_selector_reported_before_reading_document() {
        let mut descriptor = record_descriptor();
        descriptor.requirements.expr = "formula[".to_string();
        // Document would also fail on cardinality, but the descriptor error
        // must win.
        let doc = json!({"requirements": [{}]});

        let err = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::InvalidSelector {
                slot: "requirements.expr",
                ..
            }
        ));
    }

    #[test]
    fn test_expression_error_tagged_with_requirement() {
        let descriptor = record_descriptor();
        let doc = json!({
            "requirements": [
                {"name": "bad_req", "formula": "alt > "}
            ]
        });

        let err = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap_err();
        match err {
            ExtractionError::Expression { requirement, .. } => {
                assert_eq!(requirement, "bad_req")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_absent_collections_yield_empty_lists() {
        let descriptor = FormatDescriptor::from_str(
            r#"
            format: record
            requirements:
              collection: "$.requirements[*]"
              id: "name"
              expr: "formula"
            "#,
        )
        .unwrap();
        let doc = json!({"requirements": []});

        let spec = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap();
        assert!(spec.internal_variables.is_empty());
        assert!(spec.external_variables.is_empty());
        assert!(spec.requirements.is_empty());
    }

    #[test]
    fn test_declared_optional_slot_is_strict() {
        let mut descriptor = record_descriptor();
        descriptor.requirements.description = Some("text".to_string());
        let doc = json!({
            "requirements": [
                {"name": "req1", "formula": "x"}
            ]
        });

        let err = extract(&descriptor, &RecordAdapter, &doc, &PtltlHandler, None).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MissingValue {
                slot: "requirements.description"
            }
        );
    }
}
