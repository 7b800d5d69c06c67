//! Format descriptors: declarative descriptions of where each specification
//! field lives in a document.
//!
//! A descriptor names the document shape and a set of selector slots. The
//! extraction engine drives the matching selector adapter with these slots;
//! nothing else about the document layout is hard-coded. Descriptors are
//! plain YAML (or JSON) files; a handful of named presets ship with the tool
//! and user-supplied descriptor files are accepted anywhere a preset name is.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::selector::markup::MarkupAdapter;
use crate::selector::record::RecordAdapter;
use crate::selector::table::TableAdapter;
use crate::selector::SelectorAdapter;

/// Supported document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Tagged-markup documents, addressed with markup paths.
    #[serde(alias = "xml")]
    Markup,
    /// Generic structured-record documents, addressed with record paths.
    #[serde(alias = "json")]
    Record,
    /// Spreadsheet workbooks, addressed with sheet/column references.
    #[serde(alias = "xlsx", alias = "workbook")]
    Table,
}

/// Selector slots for internal (computed) variable declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InternalVarSlots {
    pub collection: String,
    pub id: String,
    pub expr: String,
    #[serde(default, rename = "type")]
    pub type_selector: Option<String>,
}

/// Selector slots for external (monitored) variable declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalVarSlots {
    pub collection: String,
    pub id: String,
    #[serde(default, rename = "type")]
    pub type_selector: Option<String>,
}

/// Selector slots for requirements. The collection is mandatory: a format
/// without requirements is not a requirements format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementSlots {
    pub collection: String,
    pub id: String,
    pub expr: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A complete format descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatDescriptor {
    pub format: FormatKind,
    #[serde(default)]
    pub internal_vars: Option<InternalVarSlots>,
    #[serde(default)]
    pub external_vars: Option<ExternalVarSlots>,
    pub requirements: RequirementSlots,
}

/// Named presets shipped with the tool.
pub const PRESETS: &[(&str, &str)] = &[
    ("markup-reqs", include_str!("../config/formats/markup-reqs.yaml")),
    ("record-reqs", include_str!("../config/formats/record-reqs.yaml")),
    ("workbook-reqs", include_str!("../config/formats/workbook-reqs.yaml")),
];

impl FormatDescriptor {
    /// Parse a descriptor from YAML (JSON also parses, being a YAML subset).
    pub fn from_str(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| format!("invalid format descriptor: {}", e))
    }

    /// Load a descriptor from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read format file {}: {}", path.display(), e))?;
        Self::from_str(&content)
    }

    /// Look up a shipped preset by name.
    pub fn preset(name: &str) -> Option<Result<Self, String>> {
        PRESETS
            .iter()
            .find(|(preset_name, _)| *preset_name == name)
            .map(|(_, content)| Self::from_str(content))
    }

    /// Resolve a preset name or a descriptor file path, preset first.
    pub fn load(name_or_path: &str) -> Result<Self, String> {
        match Self::preset(name_or_path) {
            Some(result) => result,
            None => Self::from_file(name_or_path),
        }
    }

    /// Declared selector slots as `(label, selector)` pairs, in canonical
    /// order. The label is the one used in validation and cardinality error
    /// messages.
    pub fn slots(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(iv) = &self.internal_vars {
            out.push(("internal_vars.collection", iv.collection.as_str()));
            out.push(("internal_vars.id", iv.id.as_str()));
            out.push(("internal_vars.expr", iv.expr.as_str()));
            if let Some(t) = &iv.type_selector {
                out.push(("internal_vars.type", t.as_str()));
            }
        }
        if let Some(ev) = &self.external_vars {
            out.push(("external_vars.collection", ev.collection.as_str()));
            out.push(("external_vars.id", ev.id.as_str()));
            if let Some(t) = &ev.type_selector {
                out.push(("external_vars.type", t.as_str()));
            }
        }
        out.push(("requirements.collection", self.requirements.collection.as_str()));
        out.push(("requirements.id", self.requirements.id.as_str()));
        out.push(("requirements.expr", self.requirements.expr.as_str()));
        if let Some(d) = &self.requirements.description {
            out.push(("requirements.description", d.as_str()));
        }
        out
    }

    /// Validate every declared selector against the selector language of
    /// this descriptor's document shape. Short-circuiting: the first invalid
    /// selector is reported and validation stops.
    pub fn validate(&self) -> Result<(), String> {
        for (label, selector) in self.slots() {
            let result = match self.format {
                FormatKind::Markup => MarkupAdapter::compile(selector).map(|_| ()),
                FormatKind::Record => RecordAdapter::compile(selector).map(|_| ()),
                FormatKind::Table => TableAdapter::compile(selector).map(|_| ()),
            };
            result.map_err(|e| format!("invalid selector for {}: {}", label, e))?;
        }
        Ok(())
    }
}
