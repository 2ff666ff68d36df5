// SPDX-FileCopyrightText: 2026 Cadence Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Cadence configuration system.

use std::io::Write;

use cadence_config::diagnostic::ConfigError;
use cadence_config::model::CadenceConfig;
use cadence_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_cadence_config() {
    let toml = r#"
[player]
log_level = "debug"
default_volume = 0.8
min_volume = 0.2
max_volume = 1.5
max_retries = 3
retry_backoff_ms = 250
idle_timeout_secs = 120
alone_timeout_secs = 30

[cache]
max_size = 100
ttl_secs = 600

[breaker]
failure_threshold = 2
recovery_timeout_secs = 10

[pool]
max_concurrent = 2

[dedup]
poll_interval_ms = 20
max_wait_ms = 2000

[autoplay]
enabled_by_default = true
songs_per_batch = 4
low_water_mark = 1
fetch_multiplier = 2
cache_ttl_secs = 60
cache_capacity = 10

[search]
playlist_limit = 25
catalog_limit = 40
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.player.log_level, "debug");
    assert_eq!(config.player.default_volume, 0.8);
    assert_eq!(config.player.max_retries, 3);
    assert_eq!(config.player.alone_timeout_secs, 30);
    assert_eq!(config.cache.max_size, 100);
    assert_eq!(config.cache.ttl_secs, 600);
    assert_eq!(config.breaker.failure_threshold, 2);
    assert_eq!(config.pool.max_concurrent, 2);
    assert_eq!(config.dedup.max_wait_ms, 2000);
    assert!(config.autoplay.enabled_by_default);
    assert_eq!(config.autoplay.cache_capacity, 10);
    assert_eq!(config.search.playlist_limit, 25);
    assert_eq!(config.search.catalog_limit, 40);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.player.log_level, "info");
    assert_eq!(config.player.default_volume, 0.5);
    assert_eq!(config.player.min_volume, 0.1);
    assert_eq!(config.player.max_volume, 2.0);
    assert_eq!(config.player.max_retries, 5);
    assert_eq!(config.player.retry_backoff_ms, 500);
    assert_eq!(config.player.idle_timeout_secs, 300);
    assert_eq!(config.player.alone_timeout_secs, 60);
    assert_eq!(config.cache.max_size, 500);
    assert_eq!(config.cache.ttl_secs, 21_600);
    assert_eq!(config.breaker.failure_threshold, 5);
    assert_eq!(config.breaker.recovery_timeout_secs, 60);
    assert_eq!(config.pool.max_concurrent, 5);
    assert!(!config.autoplay.enabled_by_default);
    assert_eq!(config.autoplay.songs_per_batch, 5);
    assert_eq!(config.autoplay.cache_ttl_secs, 3_600);
    assert_eq!(config.search.playlist_limit, 50);
    assert_eq!(config.search.catalog_limit, 100);
}

/// Dotted keys (what the env provider produces) override TOML values.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[cache]
ttl_secs = 100
"#;

    let config: CadenceConfig = Figment::new()
        .merge(Serialized::defaults(CadenceConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("cache.ttl_secs", 42))
        .extract()
        .expect("should merge override");

    assert_eq!(config.cache.ttl_secs, 42);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: CadenceConfig = Figment::new()
        .merge(Serialized::defaults(CadenceConfig::default()))
        .merge(Toml::file("/nonexistent/path/cadence.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.pool.max_concurrent, 5);
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown key in [player] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[player]
max_retires = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "max_retires"
                && suggestion.as_deref() == Some("max_retries")
                && valid_keys.contains("idle_timeout_secs")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'max_retires', got: {errors:?}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[pool]
max_concurrent = "lots"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("max_concurrent"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "ttl_sec".to_string(),
        suggestion: Some("ttl_secs".to_string()),
        valid_keys: "max_size, ttl_secs".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `ttl_secs`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("ttl_sec"));
}

/// Validation errors are collected, not fail-fast.
#[test]
fn validation_collects_every_error() {
    let toml = r#"
[player]
min_volume = 3.0
max_volume = 1.0

[pool]
max_concurrent = 0

[search]
playlist_limit = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid values should fail");
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { message } => Some(message.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(messages.len(), 3, "got: {messages:?}");
    assert!(messages.iter().any(|m| m.contains("player.min_volume")));
    assert!(messages.iter().any(|m| m.contains("pool.max_concurrent")));
    assert!(messages.iter().any(|m| m.contains("search.playlist_limit")));
}

/// An explicit config file is loaded and validated.
#[test]
fn load_and_validate_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[breaker]\nfailure_threshold = 7").expect("write config");

    let config = load_and_validate_path(file.path()).expect("file should validate");
    assert_eq!(config.breaker.failure_threshold, 7);
    assert_eq!(config.breaker.recovery_timeout_secs, 60);
}

/// A bad key in an explicit file gets a suggestion.
#[test]
fn unknown_key_in_file_is_diagnosed() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(file, "[cache]\nttl_sec = 5").expect("write config");

    let errors = load_and_validate_path(file.path()).expect_err("unknown key");
    let diagnosed = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, .. }
            if key == "ttl_sec" && suggestion.as_deref() == Some("ttl_secs"))
    });
    assert!(diagnosed, "expected an UnknownKey, got: {errors:?}");
}
