//! Table-driven tests for configuration loading and validation.

use examgen::config::{load_config, load_config_from_str, AnswerDownloadRoute, UploadStrategy};

struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "empty_object_uses_defaults",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "full_override",
        config_json: r#"{
            "baseUrl": "https://staging.examfrompdf.com",
            "uploadStrategy": "per_file_session",
            "answerDownloadRoute": "nested",
            "maxUploadBytes": 52428800,
            "uploadTimeoutSecs": 60,
            "pollIntervalMs": 1000,
            "registrationDelayMs": 500,
            "notFoundRetryLimit": 3,
            "unlockBypass": false
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "unknown_fields_tolerated",
        config_json: r#"{"baseUrl": "http://localhost:9000", "somethingNew": 1}"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "rejects_malformed_json",
        config_json: "{not json",
        should_succeed: false,
        expected_error: Some("parse"),
    },
    ConfigTestCase {
        name: "rejects_non_http_scheme",
        config_json: r#"{"baseUrl": "file:///etc/passwd"}"#,
        should_succeed: false,
        expected_error: Some("http(s)"),
    },
    ConfigTestCase {
        name: "rejects_zero_upload_cap",
        config_json: r#"{"maxUploadBytes": 0}"#,
        should_succeed: false,
        expected_error: Some("max_upload_bytes must be nonzero"),
    },
    ConfigTestCase {
        name: "rejects_zero_upload_timeout",
        config_json: r#"{"uploadTimeoutSecs": 0}"#,
        should_succeed: false,
        expected_error: Some("upload_timeout_secs must be nonzero"),
    },
];

#[test]
fn test_config_loading_table() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        if case.should_succeed {
            assert!(result.is_ok(), "case '{}' failed: {:?}", case.name, result.err());
        } else {
            let err = result.expect_err(&format!("case '{}' should have failed", case.name));
            if let Some(expected) = case.expected_error {
                let text = err.to_string();
                assert!(
                    text.contains(expected),
                    "case '{}': error '{}' does not contain '{}'",
                    case.name,
                    text,
                    expected
                );
            }
        }
    }
}

#[test]
fn test_full_override_values() {
    let config = load_config_from_str(CONFIG_TESTS[1].config_json).unwrap();
    assert_eq!(config.base_url, "https://staging.examfrompdf.com");
    assert_eq!(config.upload_strategy, UploadStrategy::PerFileSession);
    assert_eq!(config.answer_download_route, AnswerDownloadRoute::Nested);
    assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
    assert_eq!(config.not_found_retry_limit, 3);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"pollIntervalMs": 250}"#).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.poll_interval_ms, 250);

    let missing = load_config(dir.path().join("absent.json"));
    assert!(missing.is_err());
}
