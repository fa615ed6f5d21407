#![forbid(unsafe_code)]

//! Loading [`EditorConfig`] from disk.
//!
//! Run:
//!   cargo test -p graphedit-runtime --features config --test config_loading

use std::io::Write;

use graphedit_runtime::{ConfigError, EditorConfig, HistoryConfig, MergePolicy};

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn toml_file_overrides_defaults() {
    let file = write_temp(
        ".toml",
        r#"
[history]
max_depth = 20

[history.merge]
max_gap_ms = 500
"#,
    );
    let config = EditorConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.history.max_depth, 20);
    assert_eq!(config.history.merge, MergePolicy::within(500));
    assert_eq!(config.message_log.capacity, 256, "untouched section keeps defaults");
}

#[test]
fn json_file_round_trips_through_serde() {
    let original = EditorConfig {
        history: HistoryConfig::unlimited().with_merge(MergePolicy::disabled()),
        ..EditorConfig::default()
    };
    let file = write_temp(".json", &serde_json::to_string(&original).unwrap());
    let loaded = EditorConfig::from_json_file(file.path()).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn empty_toml_is_default() {
    let config = EditorConfig::from_toml_str("").unwrap();
    assert_eq!(config, EditorConfig::default());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.toml");
    let err = EditorConfig::from_toml_file(&absent).unwrap_err();
    assert!(matches!(err, ConfigError::Io { ref path, .. } if *path == absent));
    assert!(std::error::Error::source(&err).is_some());
    assert!(err.to_string().starts_with("cannot read editor config"));
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = EditorConfig::from_toml_str("[history\nmax_depth = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("editor config is not valid TOML"));
}

#[test]
fn wrong_json_type_is_parse_error() {
    let err = EditorConfig::from_json_str(r#"{"history": {"max_depth": "deep"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn loaded_values_still_validate() {
    let file = write_temp(".toml", "[message_log]\ncapacity = 0\n");
    let err = EditorConfig::from_toml_file(file.path())
        .unwrap()
        .validated()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
}
