use arbiter_config::{init_tracing, json_schema, LoggingConfig};

#[test]
fn schema_lists_resolver_and_logging_sections() {
    let schema = serde_json::to_value(json_schema()).expect("schema serializes");
    let properties = schema
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("root properties");

    assert!(properties.contains_key("resolver"));
    assert!(properties.contains_key("logging"));

    let definitions = schema
        .get("definitions")
        .and_then(|value| value.as_object())
        .expect("definitions");
    assert!(definitions.contains_key("ClashErasure"));
    assert!(definitions.contains_key("CacheConfig"));
}

#[test]
fn init_tracing_is_idempotent() {
    let config = LoggingConfig {
        stderr: false,
        ..LoggingConfig::default()
    };
    init_tracing(&config);
    init_tracing(&config);
    tracing::info!(target: "arbiter.config", "still alive");
}
