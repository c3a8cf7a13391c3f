use arbiter_config::{
    ArbiterConfig, ClashErasure, ConfigError, ConfigWarning, GenericSpecificity, LoggingConfig,
    ResolverConfig,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn empty_input_yields_defaults() {
    let config = ArbiterConfig::load_from_str("").expect("empty config should parse");
    assert_eq!(config, ArbiterConfig::default());

    let resolver = ResolverConfig::default();
    assert!(resolver.prefer_most_derived);
    assert_eq!(resolver.clash_erasure, ClashErasure::Member);
    assert_eq!(resolver.generic_specificity, GenericSpecificity::Instantiated);
    assert_eq!(resolver.lub_depth, 2);
    assert!(resolver.cache.enabled);
    assert_eq!(resolver.parallelism, None);
    assert_eq!(LoggingConfig::default().level, "info");
}

#[test]
fn parses_resolver_policy() {
    let text = r#"
[resolver]
prefer_most_derived = false
clash_erasure = "declared"
generic_specificity = "inferred"
lub_depth = 4
parallelism = 2

[resolver.cache]
enabled = false
shards = 4

[logging]
level = "debug"
json = true
"#;

    let config = ArbiterConfig::load_from_str(text).expect("config should parse");
    assert!(!config.resolver.prefer_most_derived);
    assert_eq!(config.resolver.clash_erasure, ClashErasure::Declared);
    assert_eq!(config.resolver.generic_specificity, GenericSpecificity::Inferred);
    assert_eq!(config.resolver.lub_depth, 4);
    assert_eq!(config.resolver.parallelism, Some(2));
    assert!(!config.resolver.cache.enabled);
    assert_eq!(config.resolver.cache.shards, 4);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
}

#[test]
fn toml_round_trip_preserves_values() {
    let mut config = ArbiterConfig::default();
    config.resolver.clash_erasure = ClashErasure::Declared;
    config.resolver.parallelism = Some(3);
    config.logging.stderr = false;

    let text = config.to_toml_string().expect("serialize");
    let reloaded = ArbiterConfig::load_from_str(&text).expect("reload");
    assert_eq!(reloaded, config);
}

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[resolver]
prefer_most_derivd = true

[resolver.cache]
enabeld = false
"#;

    let (config, diagnostics) =
        ArbiterConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["resolver.cache.enabeld", "resolver.prefer_most_derivd", "typo"]
    );
    assert!(config.resolver.cache.enabled);
}

#[test]
fn unusable_values_are_replaced_with_warnings() {
    let text = r#"
[resolver]
parallelism = 0

[resolver.cache]
shards = 0

[logging]
level = "info,arbiter.resolve=notalevel"
"#;

    let (config, diagnostics) =
        ArbiterConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(config.resolver.cache.shards, 1);
    assert_eq!(config.resolver.parallelism, None);
    assert_eq!(config.logging.level, "info");
    assert_eq!(
        diagnostics.warnings,
        vec![
            ConfigWarning::InvalidValue {
                toml_path: "resolver.cache.shards".to_owned(),
                message: "must be >= 1; using 1".to_owned(),
            },
            ConfigWarning::InvalidValue {
                toml_path: "resolver.parallelism".to_owned(),
                message: "must be >= 1; using the global thread pool".to_owned(),
            },
            ConfigWarning::LoggingLevelInvalid {
                value: "info,arbiter.resolve=notalevel".to_owned(),
            },
        ]
    );
}

#[test]
fn parse_errors_do_not_leak_values() {
    let text = r#"
[resolver]
clash_erasure = "top-secret-mode"
"#;

    let err = ArbiterConfig::load_from_str(text).expect_err("unknown variant should fail");
    let message = err.to_string();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(!message.contains("top-secret-mode"), "{message}");
    assert!(message.contains("<redacted>"), "{message}");
}

#[test]
fn loads_from_path_and_reports_missing_files() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("arbiter.toml");
    std::fs::write(&path, "[resolver]\nlub_depth = 1\n").expect("write config");

    let config = ArbiterConfig::load_from_path(&path).expect("config should load");
    assert_eq!(config.resolver.lub_depth, 1);

    let missing = dir.path().join("missing.toml");
    let err = ArbiterConfig::load_from_path(&missing).expect_err("missing file should fail");
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("missing.toml"));
}
