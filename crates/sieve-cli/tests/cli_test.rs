use pretty_assertions::assert_eq;
use sieve_cli::{list_rules, run_check, CheckOptions, OutputFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SCHEMA: &str = r#"
inputs:
  - name: AddressInput
    fields:
      - name: street
        type: String
        constraints:
          - name: NotBlank
      - name: zip
        type: String
        constraints:
          - name: Pattern
            arguments:
              regexp: "[0-9]{4,5}"
objects:
  - name: Mutation
    fields:
      - name: tag
        arguments:
          - name: tags
            type: "[String!]"
            constraints:
              - name: Size
                arguments:
                  min: 1
                  max: 5
      - name: move
        arguments:
          - name: address
            type: AddressInput!
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf, std::io::Error> {
    let path = dir.path().join(name);
    fs::write(&path, content)?;
    Ok(path)
}

fn options(schema: &Path, field: &str, values: &Path) -> CheckOptions {
    CheckOptions {
        schema: schema.to_path_buf(),
        field: field.to_string(),
        values: values.to_path_buf(),
        locale: None,
        config: None,
        format: OutputFormat::Text,
    }
}

#[test]
fn test_check_reports_errors_as_text() -> TestResult {
    let dir = TempDir::new()?;
    let schema = write(&dir, "schema.yaml", SCHEMA)?;
    let values = write(&dir, "values.json", r#"{"tags": ["ok", "", "toolong"]}"#)?;

    let report = run_check(&options(&schema, "Mutation.tag", &values))?;
    assert!(!report.outcome.is_valid());
    assert_eq!(
        report.rendered,
        "2 validation errors:\n  \
         1. /tag/tags[1]: /tag/tags[1] size must be between 1 and 5 [Size]\n  \
         2. /tag/tags[2]: /tag/tags[2] size must be between 1 and 5 [Size]\n"
    );
    Ok(())
}

#[test]
fn test_check_json_output_with_config() -> TestResult {
    let dir = TempDir::new()?;
    let schema = write(&dir, "schema.yaml", SCHEMA)?;
    let values = write(&dir, "values.yaml", "address:\n  street: ''\n  zip: '8000'\n")?;
    let config = write(
        &dir,
        "sieve.toml",
        r#"
error_strategy = "continue-with-errors"

[messages.fr]
"sieve.validation.NotBlank.message" = "{path} ne doit pas être vide"
"#,
    )?;

    let mut options = options(&schema, "Mutation.move", &values);
    options.config = Some(config);
    options.locale = Some("fr_CA".to_string());
    options.format = OutputFormat::Json;
    let report = run_check(&options)?;

    let rendered: serde_json::Value = serde_json::from_str(&report.rendered)?;
    assert_eq!(
        rendered,
        serde_json::json!({
            "errors": [{
                "message": "/move/address/street ne doit pas être vide",
                "path": "/move/address/street",
                "constraint": "NotBlank",
                "coordinates": "AddressInput.street"
            }],
            "strategy": "continue-with-errors"
        })
    );
    assert!(report.outcome.should_continue());
    Ok(())
}

#[test]
fn test_check_rejects_bad_inputs() -> TestResult {
    let dir = TempDir::new()?;
    let schema = write(&dir, "schema.yaml", SCHEMA)?;
    let values = write(&dir, "values.json", "[1, 2]")?;

    let not_an_object = run_check(&options(&schema, "Mutation.tag", &values));
    assert!(not_an_object.is_err());

    let values = write(&dir, "empty.json", "{}")?;
    let unknown = run_check(&options(&schema, "Mutation.nothing", &values));
    assert!(unknown.is_err());
    let malformed = run_check(&options(&schema, "tag", &values));
    assert!(malformed.is_err());

    let broken = write(
        &dir,
        "broken.yaml",
        "objects:\n  - name: Q\n    fields:\n      - name: f\n        arguments:\n          - name: a\n            type: Int\n            constraints:\n              - name: NotBlank\n",
    )?;
    let error = run_check(&options(&broken, "Q.f", &values)).map(|_| ()).unwrap_err();
    assert!(format!("{:#}", error).contains("cannot be applied to type `Int`"));
    Ok(())
}

#[test]
fn test_rules_listing() -> TestResult {
    let dir = TempDir::new()?;
    let schema = write(&dir, "schema.yaml", SCHEMA)?;
    assert_eq!(
        list_rules(&schema)?,
        "AddressInput.street: NotBlank\n\
         AddressInput.zip: Pattern(regexp: [0-9]{4,5})\n\
         Mutation.tag(tags:): Size(max: 5, min: 1)\n"
    );
    Ok(())
}
