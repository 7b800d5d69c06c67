//! Routing-database tests: file loading, merge properties, resolution.

use std::io::Write;

use tempfile::NamedTempFile;

use specmill::{load_variable_db, merge_all, resolve_type, MergeError, VariableDb};

fn temp_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const ROUTING_A: &str = r#"{
    "inputs": [
        {"name": "alt", "connections": [
            {"scope": "cfs", "topic": "MSG1", "field": "altitude"}
        ]}
    ],
    "topics": [
        {"scope": "cfs", "topic": "MSG1", "type": "msg_t"}
    ],
    "type_mappings": [
        {"scope1": "cfs", "type1": "msg_t", "field1": "altitude",
         "scope2": "C", "type2": "double"}
    ]
}"#;

#[test]
fn resolution_example_from_merged_files() {
    let file = temp_json(ROUTING_A);
    let db = load_variable_db(&[file.path()]).unwrap();

    let resolved = resolve_type(&db, "alt", "cfs", "C").unwrap();
    assert_eq!(resolved.to_type, "double");

    // no mapping into ROS: a normal miss, not an error
    assert!(resolve_type(&db, "alt", "cfs", "ROS").is_none());
}

#[test]
fn user_files_merge_with_builtin_default() {
    let file = temp_json(ROUTING_A);
    let db = load_variable_db(&[file.path()]).unwrap();

    // built-in std_msgs mappings survive alongside the user file
    assert!(db
        .types
        .iter()
        .any(|t| t.from_type == "std_msgs/msg/Float64" && t.to_type == "double"));
    assert!(db.input("alt").is_some());
}

#[test]
fn conflicting_files_fail_with_topic_conflict() {
    let a = temp_json(r#"{"topics": [{"scope": "cfs", "topic": "MSG1", "type": "t_a"}]}"#);
    let b = temp_json(r#"{"topics": [{"scope": "cfs", "topic": "MSG1", "type": "t_b"}]}"#);

    let err = load_variable_db(&[a.path(), b.path()]).unwrap_err();
    assert_eq!(
        err,
        MergeError::TopicConflict {
            scope: "cfs".to_string(),
            topic: "MSG1".to_string(),
        }
        .to_string()
    );
}

#[test]
fn merge_is_order_independent_on_conflict_free_inputs() {
    let a = VariableDb::from_json_str(ROUTING_A).unwrap();
    let b = VariableDb::from_json_str(
        r#"{"topics": [{"scope": "ros", "topic": "/nav/alt", "type": "std_msgs/msg/Float64"}]}"#,
    )
    .unwrap();
    let c = VariableDb::from_json_str(
        r#"{"outputs": [{"name": "violation", "type": "bool"}]}"#,
    )
    .unwrap();

    let forward = merge_all([&a, &b, &c]).unwrap();
    let backward = merge_all([&c, &b, &a]).unwrap();

    // equal as sets: sort every relation by key before comparing
    let normalize = |mut db: VariableDb| {
        db.inputs.sort_by(|x, y| x.name.cmp(&y.name));
        db.topics
            .sort_by(|x, y| (&x.scope, &x.topic).cmp(&(&y.scope, &y.topic)));
        db.types.sort_by(|x, y| {
            (&x.from_scope, &x.from_type, &x.to_scope).cmp(&(
                &y.from_scope,
                &y.from_type,
                &y.to_scope,
            ))
        });
        db.outputs.sort_by(|x, y| x.name.cmp(&y.name));
        db
    };
    assert_eq!(normalize(forward), normalize(backward));
}

#[test]
fn unreadable_file_is_a_load_error() {
    let err = load_variable_db(&["/nonexistent/routing.json"]).unwrap_err();
    assert!(err.contains("failed to read"), "got: {}", err);
}

#[test]
fn malformed_file_names_the_path() {
    let file = temp_json("{ not json");
    let path = file.path().to_path_buf();
    let err = load_variable_db(&[&path]).unwrap_err();
    assert!(
        err.contains(&path.display().to_string()),
        "got: {}",
        err
    );
}
