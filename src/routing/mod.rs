//! Variable-routing database.
//!
//! Describes how an external variable routes from a source framework's
//! message/topic/field through to a concrete type in a target framework.
//! A database is assembled by merging several partial, independently
//! authored JSON descriptions plus one built-in default (see [`merge`]),
//! then queried with a four-relation join (see [`resolve`]).

pub mod merge;
pub mod resolve;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One connection of an input variable: the topic (and optionally the
/// message field) carrying it within one framework scope. Unique per
/// `(owning input, scope)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub scope: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// An input (monitored) variable and its per-scope connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDef {
    pub name: String,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A topic and the message type it carries in one scope. Unique per
/// `(scope, topic)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDef {
    pub scope: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A type correspondence between two scopes, optionally narrowed to one
/// message field. Unique per `(from_scope, from_type, to_scope)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub from_scope: String,
    pub from_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_field: Option<String>,
    pub to_scope: String,
    pub to_type: String,
}

/// An output (monitor verdict) variable. Unique per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDef {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

/// The merged routing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VariableDb {
    #[serde(default)]
    pub inputs: Vec<InputDef>,
    #[serde(default)]
    pub topics: Vec<TopicDef>,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub outputs: Vec<OutputDef>,
}

/// On-disk schema of a routing-description file. `type_mappings` uses the
/// numbered `scope1`/`type1`/`field1`/`scope2`/`type2` spelling.
#[derive(Debug, Deserialize)]
struct DbFile {
    #[serde(default)]
    inputs: Vec<InputDef>,
    #[serde(default)]
    topics: Vec<TopicDef>,
    #[serde(default)]
    type_mappings: Vec<TypeMappingEntry>,
    #[serde(default)]
    outputs: Vec<OutputDef>,
}

#[derive(Debug, Deserialize)]
struct TypeMappingEntry {
    scope1: String,
    type1: String,
    #[serde(default)]
    field1: Option<String>,
    scope2: String,
    type2: String,
}

impl From<TypeMappingEntry> for TypeDef {
    fn from(entry: TypeMappingEntry) -> Self {
        TypeDef {
            from_scope: entry.scope1,
            from_type: entry.type1,
            from_field: entry.field1,
            to_scope: entry.scope2,
            to_type: entry.type2,
        }
    }
}

/// The default routing description compiled into the tool: scalar message
/// types of common robotics middleware mapped to C types. Merged after any
/// user-supplied files.
const BUILTIN_DB: &str = include_str!("../../resources/variable-db.json");

impl VariableDb {
    /// Parse a routing-description JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, String> {
        let file: DbFile = serde_json::from_str(content)
            .map_err(|e| format!("invalid routing description: {}", e))?;
        Ok(VariableDb {
            inputs: file.inputs,
            topics: file.topics,
            types: file.type_mappings.into_iter().map(TypeDef::from).collect(),
            outputs: file.outputs,
        })
    }

    /// Load a routing-description file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("failed to read routing file {}: {}", path.display(), e))?;
        Self::from_json_str(&content)
            .map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// The built-in default database.
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_DB).expect("built-in routing description parses")
    }

    pub fn input(&self, name: &str) -> Option<&InputDef> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
            && self.topics.is_empty()
            && self.types.is_empty()
            && self.outputs.is_empty()
    }
}
