//! Tests for JSON settings loading and fail-closed validation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use claimlock_core::guard::StoreFailurePolicy;
use claimlock_infra::settings::{GuardSettings, SettingsError};

fn temp_settings_path(tag: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "claimlock_settings_{tag}_{}_{}.json",
        std::process::id(),
        nanos
    ))
}

fn remove_if_exists(path: &std::path::Path) {
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_full_settings_parse() {
    let settings = GuardSettings::from_json_str(
        r#"{
            "prefix": "checkout:",
            "timeout_s": 30,
            "message": "request already in flight",
            "fail_open": true
        }"#,
    )
    .unwrap();
    assert_eq!(settings.prefix, "checkout:");
    assert_eq!(settings.timeout_s, 30);
    assert_eq!(settings.message, "request already in flight");
    assert!(settings.fail_open);
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
    let settings = GuardSettings::from_json_str(r#"{"timeout_s": 10}"#).unwrap();
    assert_eq!(settings.prefix, "idempotent:");
    assert_eq!(settings.timeout_s, 10);
    assert_eq!(settings.message, "too fast, try again");
    assert!(!settings.fail_open);
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let err = GuardSettings::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn test_defaults_split_into_fail_closed_guard_parts() {
    let (defaults, policy) = GuardSettings::default().into_guard_parts().unwrap();
    assert_eq!(defaults.prefix, "idempotent:");
    assert_eq!(defaults.ttl, Duration::from_secs(5));
    assert_eq!(defaults.message, "too fast, try again");
    assert_eq!(policy, StoreFailurePolicy::FailClosed);
}

#[test]
fn test_fail_open_flag_selects_fail_open_policy() {
    let settings = GuardSettings::from_json_str(r#"{"fail_open": true}"#).unwrap();
    let (_, policy) = settings.into_guard_parts().unwrap();
    assert_eq!(policy, StoreFailurePolicy::FailOpen);
}

#[test]
fn test_zero_timeout_fails_closed() {
    let settings = GuardSettings::from_json_str(r#"{"timeout_s": 0}"#).unwrap();
    let err = settings.into_guard_parts().unwrap_err();
    assert!(matches!(err, SettingsError::Invalid { .. }));
}

#[test]
fn test_empty_prefix_fails_closed() {
    let settings = GuardSettings::from_json_str(r#"{"prefix": ""}"#).unwrap();
    let err = settings.into_guard_parts().unwrap_err();
    assert!(matches!(err, SettingsError::Invalid { .. }));
}

#[test]
fn test_load_reads_settings_from_disk() {
    let path = temp_settings_path("load");
    std::fs::write(&path, r#"{"prefix": "order:", "timeout_s": 3}"#)
        .expect("write settings file");

    let settings = GuardSettings::load(&path).expect("load settings");
    assert_eq!(settings.prefix, "order:");
    assert_eq!(settings.timeout_s, 3);

    remove_if_exists(&path);
}

#[test]
fn test_load_missing_file_is_an_io_error() {
    let path = temp_settings_path("missing");
    let err = GuardSettings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Io { .. }));
}
