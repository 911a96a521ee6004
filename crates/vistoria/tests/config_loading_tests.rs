//! Table-driven tests for configuration loading and validation.

mod common;

use vistoria::config::{load_config, load_config_from_str};

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/srv/uploads"
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "version": "1.0",
            "database_path": "/var/lib/vistoria/vistoria.db",
            "upload_directory": "/srv/uploads",
            "worker_count": 4,
            "default_region": "SP",
            "ai": {
                "enabled": true,
                "endpoint": "https://llm.internal/v1",
                "api_key": "sk-test",
                "timeout_secs": 30
            },
            "detector": {
                "enabled": true,
                "endpoint": "http://localhost:9000/detect",
                "min_confidence": 0.6
            },
            "ocr": { "enabled": true, "languages": ["por", "eng"], "dpi": 200 },
            "costs": {
                "fallback_item_cost": 60.0,
                "deterioration_unit_cost": 120.0,
                "currency": "BRL"
            }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_upload_directory",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: false,
        expected_error: Some("upload_directory"),
    },
    ConfigTestCase {
        name: "unknown_version",
        config_json: r#"{ "version": "2.0", "upload_directory": "/u" }"#,
        should_succeed: false,
        expected_error: Some("2.0"),
    },
    ConfigTestCase {
        name: "zero_workers",
        config_json: r#"{ "version": "1.0", "upload_directory": "/u", "worker_count": 0 }"#,
        should_succeed: false,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unknown_top_level_field",
        config_json: r#"{ "version": "1.0", "upload_directory": "/u", "rules": [] }"#,
        should_succeed: false,
        expected_error: Some("rules"),
    },
    ConfigTestCase {
        name: "negative_fallback_cost",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/u",
            "costs": { "fallback_item_cost": -1 }
        }"#,
        should_succeed: false,
        expected_error: None,
    },
    ConfigTestCase {
        name: "detector_without_endpoint",
        config_json: r#"{
            "version": "1.0",
            "upload_directory": "/u",
            "detector": { "enabled": true }
        }"#,
        should_succeed: false,
        expected_error: Some("endpoint"),
    },
    ConfigTestCase {
        name: "not_json",
        config_json: "version: 1.0",
        should_succeed: false,
        expected_error: None,
    },
];

#[test]
fn test_json_config_table() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: error '{}' does not mention '{}'",
                        case.name,
                        message,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_load_config_from_file() {
    let harness = common::TestHarness::new();
    let path = harness.temp_path().join("vistoria.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"version": "1.0", "upload_directory": "{}", "worker_count": 2}}"#,
            harness.upload_dir.display()
        ),
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.worker_count, 2);
    assert_eq!(config.default_region, "RJ");
    assert!(!config.ai.enabled);
    assert_eq!(config.ocr.languages, vec!["por"]);
}
