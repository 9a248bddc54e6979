//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global: REPLACE (global defines the real baseline)
//! - Global → Local: UNION with negation support (local adds formula parameters)
//! - Any → Env vars: REPLACE (explicit user override)
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use prog2math::application::ApplicationError;
use prog2math::config::{local_config_path, Delimiters, Settings};
use prog2math::infrastructure::di::ServiceContainer;
use prog2math::infrastructure::traits::RealFileSystem;

fn write_local(dir: &TempDir, content: &str) {
    fs::write(local_config_path(dir.path()), content).unwrap();
}

#[test]
fn given_local_config_with_symbols_when_load_then_unions_with_current() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(
        &dir,
        r#"
[evaluation]
external_symbols = ["n", "m", "n"]
"#,
    );

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert: de-duplicated and sorted
    assert_eq!(
        settings.evaluation.external_symbols,
        vec!["m".to_string(), "n".to_string()]
    );
}

#[test]
fn given_local_config_with_negation_when_load_then_removes_item() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(
        &dir,
        r#"
[evaluation]
external_symbols = ["n", "x", "!n"]
"#,
    );

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.evaluation.external_symbols, vec!["x".to_string()]);
}

#[test]
fn given_local_config_with_scalars_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(
        &dir,
        r#"
[evaluation]
max_depth = 12
strict = true
require_labeled_root = true
"#,
    );

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.evaluation.max_depth, 12);
    assert!(settings.evaluation.strict);
    assert!(settings.evaluation.require_labeled_root);

    let options = settings.evaluation.to_options();
    assert_eq!(options.max_depth, Some(12));
}

#[test]
fn given_no_local_config_when_load_then_keeps_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert!(!settings.evaluation.strict);
    assert!(settings.evaluation.external_symbols.is_empty());
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(&dir, "[evaluation\nstrict = true\n");

    // Act
    let result = Settings::load(Some(dir.path()));

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => {
            assert!(message.contains(".prog2math.toml"), "message: {message}")
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn given_wrongly_typed_local_value_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    write_local(&dir, "[output]\ndelimiters = \"fancy\"\n");

    let result = Settings::load(Some(dir.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_env_override_when_load_then_env_wins() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(&dir, "[output]\ndelimiters = \"inline\"\n");
    std::env::set_var("PROG2MATH_OUTPUT__DELIMITERS", "display");

    // Act
    let result = Settings::load(Some(dir.path()));
    std::env::remove_var("PROG2MATH_OUTPUT__DELIMITERS");

    // Assert
    assert_eq!(result.unwrap().output.delimiters, Delimiters::Display);
}

#[test]
fn given_settings_when_building_container_then_evaluator_uses_them() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_local(
        &dir,
        r#"
[evaluation]
strict = true
external_symbols = ["n"]
"#,
    );
    let settings = Settings::load(Some(dir.path())).unwrap();

    // Act
    let container = ServiceContainer::with_deps(settings, Arc::new(RealFileSystem));
    let options = container.render_service().evaluator().options();

    // Assert
    assert!(options.strict);
    assert!(options.external_symbols.contains("n"));
}
