//! Validates contract fixtures against frozen JSON schemas.

use jsonschema::JSONSchema;
use serde_json::Value;

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn compile_validator(schema_path: &str) -> JSONSchema {
    let schema = load_json(schema_path);
    JSONSchema::compile(&schema).expect("schema should compile")
}

#[test]
fn envelope_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/envelope.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/envelope.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "envelope fixture should validate against schema"
    );
}

#[test]
fn status_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/status-response.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/status-response.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "status fixture should validate against schema"
    );
}

#[test]
fn classification_fixture_matches_schema() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/classification-response.schema.json"
    ));
    let fixture = load_json(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/fixtures/classification-response.valid.json"
    ));
    assert!(
        validator.is_valid(&fixture),
        "classification fixture should validate against schema"
    );
}

#[test]
fn envelope_without_success_field_is_rejected() {
    let validator = compile_validator(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../contracts/envelope.schema.json"
    ));
    let malformed = serde_json::json!({ "data": "orphan payload" });
    assert!(
        !validator.is_valid(&malformed),
        "missing success field must not validate"
    );
}
