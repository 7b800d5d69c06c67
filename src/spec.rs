//! Canonical specification model.
//!
//! A [`Spec`] is the in-memory representation of one requirements document:
//! declared internal and external variables plus the requirements themselves.
//! It is generic over the expression representation `E` so that each
//! expression sub-language can carry its own parsed form through the
//! pipeline. Sequence order mirrors document order and is preserved all the
//! way into generated output.

use serde::{Deserialize, Serialize};

/// An internal (computed) variable declaration.
///
/// `type_name` is the empty string when the source format declares no type
/// for internal variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalVariableDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub expr: String,
}

/// An external (monitored) variable declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalVariableDef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
}

/// A single named requirement with its parsed expression.
///
/// `description` is the empty string when the source format has no
/// description selector or the document omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement<E> {
    pub name: String,
    pub expr: E,
    #[serde(default)]
    pub description: String,
}

/// Canonical representation of a requirements document.
///
/// Built once per run by the extraction engine and never mutated in place;
/// transformations (identifier completion, expression rewriting) produce new
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec<E> {
    pub internal_variables: Vec<InternalVariableDef>,
    pub external_variables: Vec<ExternalVariableDef>,
    pub requirements: Vec<Requirement<E>>,
}

impl<E> Spec<E> {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self {
            internal_variables: Vec::new(),
            external_variables: Vec::new(),
            requirements: Vec::new(),
        }
    }

    /// All declared variable names, internal first, in document order.
    pub fn declared_names(&self) -> Vec<&str> {
        self.internal_variables
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.external_variables.iter().map(|v| v.name.as_str()))
            .collect()
    }

    /// Convert the expression representation, preserving everything else.
    ///
    /// Used to render a parsed spec into a `Spec<String>` for emission:
    ///
    /// ```ignore
    /// let rendered = spec.map_exprs(|e| handler.render(&e));
    /// ```
    pub fn map_exprs<T, F>(self, mut f: F) -> Spec<T>
    where
        F: FnMut(E) -> T,
    {
        Spec {
            internal_variables: self.internal_variables,
            external_variables: self.external_variables,
            requirements: self
                .requirements
                .into_iter()
                .map(|r| Requirement {
                    name: r.name,
                    expr: f(r.expr),
                    description: r.description,
                })
                .collect(),
        }
    }
}

impl<E> Default for Spec<E> {
    fn default() -> Self {
        Self::new()
    }
}
