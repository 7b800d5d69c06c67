//! Merging partial routing descriptions.
//!
//! Several independently authored descriptions (plus the built-in default)
//! are folded, in the order given, into one database. Within each relation
//! an entry whose key is already present must be structurally identical to
//! the existing one; a differing payload under the same key is a conflict
//! and fails the whole merge. The keyed-insert rule is implemented once and
//! reused for all four relations, so they cannot drift apart. Conflicts are
//! reported fail-fast: the first conflicting pair encountered wins, but the
//! accumulated database is the same for any input order when no conflicts
//! exist.

use std::hash::Hash;

use indexmap::IndexMap;

use super::{Connection, InputDef, OutputDef, TopicDef, TypeDef, VariableDb};

/// A conflict between two routing-description entries sharing a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    ConnectionConflict { input: String, scope: String },
    TopicConflict { scope: String, topic: String },
    TypeConflict {
        from_scope: String,
        from_type: String,
        to_scope: String,
    },
    OutputConflict { name: String },
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::ConnectionConflict { input, scope } => write!(
                f,
                "conflicting connections for input '{}' in scope '{}'",
                input, scope
            ),
            MergeError::TopicConflict { scope, topic } => write!(
                f,
                "conflicting topic definitions for '{}' in scope '{}'",
                topic, scope
            ),
            MergeError::TypeConflict {
                from_scope,
                from_type,
                to_scope,
            } => write!(
                f,
                "conflicting type mappings for '{}' from scope '{}' to scope '{}'",
                from_type, from_scope, to_scope
            ),
            MergeError::OutputConflict { name } => {
                write!(f, "conflicting output definitions for '{}'", name)
            }
        }
    }
}

impl std::error::Error for MergeError {}

/// Keyed insert shared by all relations: new keys are appended in encounter
/// order, identical re-declarations are no-ops, and a differing payload
/// under an existing key is a conflict.
fn merge_keyed<T, K, KF, CF>(
    accumulator: &mut IndexMap<K, T>,
    incoming: &[T],
    key_of: KF,
    conflict: CF,
) -> Result<(), MergeError>
where
    T: Clone + PartialEq,
    K: Hash + Eq,
    KF: Fn(&T) -> K,
    CF: Fn(&T) -> MergeError,
{
    for entry in incoming {
        match accumulator.get(&key_of(entry)) {
            None => {
                accumulator.insert(key_of(entry), entry.clone());
            }
            Some(existing) if existing == entry => {}
            Some(_) => return Err(conflict(entry)),
        }
    }
    Ok(())
}

#[derive(Default)]
struct Accumulator {
    inputs: IndexMap<String, IndexMap<String, Connection>>,
    topics: IndexMap<(String, String), TopicDef>,
    types: IndexMap<(String, String, String), TypeDef>,
    outputs: IndexMap<String, OutputDef>,
}

impl Accumulator {
    fn absorb(&mut self, db: &VariableDb) -> Result<(), MergeError> {
        for input in &db.inputs {
            let connections = self.inputs.entry(input.name.clone()).or_default();
            merge_keyed(
                connections,
                &input.connections,
                |c| c.scope.clone(),
                |c| MergeError::ConnectionConflict {
                    input: input.name.clone(),
                    scope: c.scope.clone(),
                },
            )?;
        }

        merge_keyed(
            &mut self.topics,
            &db.topics,
            |t| (t.scope.clone(), t.topic.clone()),
            |t| MergeError::TopicConflict {
                scope: t.scope.clone(),
                topic: t.topic.clone(),
            },
        )?;

        merge_keyed(
            &mut self.types,
            &db.types,
            |t| (t.from_scope.clone(), t.from_type.clone(), t.to_scope.clone()),
            |t| MergeError::TypeConflict {
                from_scope: t.from_scope.clone(),
                from_type: t.from_type.clone(),
                to_scope: t.to_scope.clone(),
            },
        )?;

        merge_keyed(
            &mut self.outputs,
            &db.outputs,
            |o| o.name.clone(),
            |o| MergeError::OutputConflict {
                name: o.name.clone(),
            },
        )?;

        Ok(())
    }

    fn finish(self) -> VariableDb {
        VariableDb {
            inputs: self
                .inputs
                .into_iter()
                .map(|(name, connections)| InputDef {
                    name,
                    connections: connections.into_values().collect(),
                })
                .collect(),
            topics: self.topics.into_values().collect(),
            types: self.types.into_values().collect(),
            outputs: self.outputs.into_values().collect(),
        }
    }
}

/// Fold an ordered sequence of databases into one, starting from empty.
pub fn merge_all<'a, I>(databases: I) -> Result<VariableDb, MergeError>
where
    I: IntoIterator<Item = &'a VariableDb>,
{
    let mut accumulator = Accumulator::default();
    for db in databases {
        accumulator.absorb(db)?;
    }
    Ok(accumulator.finish())
}

/// Merge two databases.
pub fn merge(a: &VariableDb, b: &VariableDb) -> Result<VariableDb, MergeError> {
    merge_all([a, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(scope: &str, name: &str, type_name: &str) -> TopicDef {
        TopicDef {
            scope: scope.to_string(),
            topic: name.to_string(),
            type_name: type_name.to_string(),
        }
    }

    fn db_with_topic(scope: &str, name: &str, type_name: &str) -> VariableDb {
        VariableDb {
            topics: vec![topic(scope, name, type_name)],
            ..VariableDb::default()
        }
    }

    #[test]
    fn test_identical_entries_merge_to_one() {
        let a = db_with_topic("cfs", "MSG1", "msg_t");
        let b = db_with_topic("cfs", "MSG1", "msg_t");
        let merged = merge(&a, &b).unwrap();
        assert_eq!(merged.topics.len(), 1);
    }

    #[test]
    fn test_topic_conflict() {
        let a = db_with_topic("cfs", "MSG1", "t_a");
        let b = db_with_topic("cfs", "MSG1", "t_b");
        let err = merge(&a, &b).unwrap_err();
        assert_eq!(
            err,
            MergeError::TopicConflict {
                scope: "cfs".to_string(),
                topic: "MSG1".to_string(),
            }
        );
    }

    #[test]
    fn test_same_topic_name_different_scopes_coexist() {
        let a = db_with_topic("cfs", "MSG1", "t_a");
        let b = db_with_topic("ros", "MSG1", "t_b");
        let merged = merge(&a, &b).unwrap();
        assert_eq!(merged.topics.len(), 2);
    }

    #[test]
    fn test_input_connections_union() {
        let a = VariableDb {
            inputs: vec![InputDef {
                name: "alt".to_string(),
                connections: vec![Connection {
                    scope: "cfs".to_string(),
                    topic: "MSG1".to_string(),
                    field: Some("altitude".to_string()),
                }],
            }],
            ..VariableDb::default()
        };
        let b = VariableDb {
            inputs: vec![InputDef {
                name: "alt".to_string(),
                connections: vec![Connection {
                    scope: "ros".to_string(),
                    topic: "/nav/alt".to_string(),
                    field: None,
                }],
            }],
            ..VariableDb::default()
        };

        let merged = merge(&a, &b).unwrap();
        assert_eq!(merged.inputs.len(), 1);
        assert_eq!(merged.inputs[0].connections.len(), 2);
    }

    #[test]
    fn test_connection_conflict() {
        let a = VariableDb {
            inputs: vec![InputDef {
                name: "alt".to_string(),
                connections: vec![Connection {
                    scope: "cfs".to_string(),
                    topic: "MSG1".to_string(),
                    field: None,
                }],
            }],
            ..VariableDb::default()
        };
        let mut b = a.clone();
        b.inputs[0].connections[0].topic = "MSG2".to_string();

        let err = merge(&a, &b).unwrap_err();
        assert!(matches!(err, MergeError::ConnectionConflict { .. }));
        assert!(err.to_string().contains("alt"));
    }

    #[test]
    fn test_order_independent_when_conflict_free() {
        let a = db_with_topic("cfs", "MSG1", "t_a");
        let b = db_with_topic("cfs", "MSG2", "t_b");
        let c = db_with_topic("ros", "MSG1", "t_c");

        let forward = merge_all([&a, &b, &c]).unwrap();
        let backward = merge_all([&c, &b, &a]).unwrap();

        let mut forward_topics = forward.topics.clone();
        let mut backward_topics = backward.topics.clone();
        forward_topics.sort_by(|x, y| (&x.scope, &x.topic).cmp(&(&y.scope, &y.topic)));
        backward_topics.sort_by(|x, y| (&x.scope, &x.topic).cmp(&(&y.scope, &y.topic)));
        assert_eq!(forward_topics, backward_topics);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let a = db_with_topic("cfs", "MSG1", "t_a");
        let merged = merge(&a, &VariableDb::default()).unwrap();
        assert_eq!(merged, a);
    }

    #[test]
    fn test_duplicate_within_one_source_detected() {
        let db = VariableDb {
            topics: vec![topic("cfs", "MSG1", "t_a"), topic("cfs", "MSG1", "t_b")],
            ..VariableDb::default()
        };
        assert!(merge_all([&db]).is_err());
    }

    #[test]
    fn test_type_key_excludes_field() {
        // Two mappings for the same (from_scope, from_type, to_scope) that
        // differ only in field are a conflict: the key does not include the
        // field.
        let a = VariableDb {
            types: vec![TypeDef {
                from_scope: "cfs".to_string(),
                from_type: "msg_t".to_string(),
                from_field: Some("altitude".to_string()),
                to_scope: "C".to_string(),
                to_type: "double".to_string(),
            }],
            ..VariableDb::default()
        };
        let mut b = a.clone();
        b.types[0].from_field = Some("speed".to_string());

        assert!(matches!(
            merge(&a, &b).unwrap_err(),
            MergeError::TypeConflict { .. }
        ));
    }
}
