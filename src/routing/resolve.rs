//! Routing resolution: the four-relation join.
//!
//! Answers "what concrete type and field does input X have when routed via
//! scope A into scope C". Every hop is a strict equality lookup; there is no
//! wildcard or nearest-match semantics, and a missing hop is a normal `None`
//! result the caller must handle (the variable is simply unroutable for that
//! target), never an error.

use super::{TypeDef, VariableDb};

/// Resolve the concrete target-scope type of one input variable.
///
/// The join walks input → connection (by `via_scope`) → topic (by scope and
/// topic name) → type mapping (by scope, topic type, connection field and
/// target scope). The optional connection field participates in the equality:
/// a connection without a field only matches a mapping without one.
pub fn resolve_type<'a>(
    db: &'a VariableDb,
    input_name: &str,
    via_scope: &str,
    to_scope: &str,
) -> Option<&'a TypeDef> {
    let input = db.input(input_name)?;
    let connection = input.connections.iter().find(|c| c.scope == via_scope)?;
    let topic = db
        .topics
        .iter()
        .find(|t| t.scope == via_scope && t.topic == connection.topic)?;
    db.types.iter().find(|t| {
        t.from_scope == via_scope
            && t.from_type == topic.type_name
            && t.from_field == connection.field
            && t.to_scope == to_scope
    })
}

/// Declared type of an output variable, if any.
pub fn output_type<'a>(db: &'a VariableDb, name: &str) -> Option<&'a str> {
    db.outputs
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.type_name.as_deref())
}
