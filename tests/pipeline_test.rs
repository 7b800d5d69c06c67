//! Pipeline-level tests: file entry points, preprocessing, sub-language
//! registry behavior.

use std::io::Write;

use tempfile::NamedTempFile;

use specmill::{
    compile_spec, compile_spec_file, complete_externals, ExpressionHandler, FormatDescriptor,
    Handler, PreprocessCommand,
};

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const RECORD_DOC: &str = r#"{
    "variables": [
        {"name": "alt", "type": "double"}
    ],
    "requirements": [
        {"reqid": "req1",
         "semantics": {"ptExpanded": "H (alt > threshold)"},
         "fulltext": "altitude stays above threshold"}
    ]
}"#;

#[test]
fn compile_spec_file_resolves_preset_and_document() {
    let document = temp_file(RECORD_DOC);
    let spec = compile_spec_file(document.path(), "record-reqs", "ptltl", None).unwrap();

    assert_eq!(spec.requirements.len(), 1);
    assert_eq!(spec.requirements[0].name, "req1");
}

#[test]
fn compile_spec_file_accepts_descriptor_path() {
    let descriptor_file = temp_file(
        r#"
        format: record
        requirements:
          collection: "$.requirements[*]"
          id: "reqid"
          expr: "semantics.ptExpanded"
        "#,
    );
    let document = temp_file(RECORD_DOC);

    let spec = compile_spec_file(
        document.path(),
        &descriptor_file.path().display().to_string(),
        "ptltl",
        None,
    )
    .unwrap();
    // descriptor declares no description slot: defaults to empty
    assert_eq!(spec.requirements[0].description, "");
}

#[test]
fn preprocess_command_translates_before_parsing() {
    let descriptor = FormatDescriptor::preset("record-reqs").unwrap().unwrap();
    // `echo` reproduces the property verbatim, so parsing still succeeds
    let preprocess = PreprocessCommand::parse("echo").unwrap();
    let spec = compile_spec(
        RECORD_DOC.as_bytes(),
        &descriptor,
        "ptltl",
        Some(&preprocess),
    )
    .unwrap();
    assert_eq!(spec.requirements.len(), 1);
}

#[test]
fn preprocess_failure_is_reported_per_requirement() {
    let descriptor = FormatDescriptor::preset("record-reqs").unwrap().unwrap();
    let preprocess = PreprocessCommand::parse("false").unwrap();
    let err = compile_spec(
        RECORD_DOC.as_bytes(),
        &descriptor,
        "ptltl",
        Some(&preprocess),
    )
    .unwrap_err();
    assert!(err.contains("req1"), "got: {}", err);
}

#[test]
fn literal_handler_passes_anything_through() {
    let descriptor = FormatDescriptor::preset("record-reqs").unwrap().unwrap();
    let doc = r#"{
        "requirements": [
            {"reqid": "raw", "semantics": {"ptExpanded": "whatever :: goes"}, "fulltext": "d"}
        ]
    }"#;
    let spec = compile_spec(doc.as_bytes(), &descriptor, "literal", None).unwrap();
    assert_eq!(spec.requirements[0].expr.render(), "whatever :: goes");
    // the literal sub-language reports no identifiers, so nothing is
    // auto-declared
    assert!(spec.external_variables.is_empty());
}

#[test]
fn unknown_handler_token_falls_back_to_default() {
    let descriptor = FormatDescriptor::preset("record-reqs").unwrap().unwrap();
    let spec = compile_spec(RECORD_DOC.as_bytes(), &descriptor, "cocospec", None).unwrap();
    // parsed with the default temporal language: identifiers are visible
    assert!(spec
        .external_variables
        .iter()
        .any(|v| v.name == "threshold"));
}

#[test]
fn completion_is_idempotent_at_pipeline_level() {
    let descriptor = FormatDescriptor::preset("record-reqs").unwrap().unwrap();
    let spec = compile_spec(RECORD_DOC.as_bytes(), &descriptor, "ptltl", None).unwrap();

    let handler = Handler::from_name("ptltl");
    let again = complete_externals(spec.clone(), &handler);
    assert_eq!(spec.external_variables, again.external_variables);
}

#[test]
fn render_reparse_preserves_identifiers_across_languages() {
    for (language, source) in [
        ("ptltl", "H (alt > limit) => (armed S go)"),
        ("smv", "H !failed -> (a & b | O c)"),
    ] {
        let handler = Handler::from_name(language);
        let parsed = handler.parse(source).unwrap();
        let reparsed = handler.parse(&handler.render(&parsed)).unwrap();
        assert_eq!(
            handler.identifiers(&parsed),
            handler.identifiers(&reparsed),
            "round trip failed for {}",
            language
        );
    }
}
