//! Deserialisation and default behaviour of [`EngineConfig`].

use std::str::FromStr;

use fints_config::{
    DocumentVersionPolicy, EngineConfig, LogFormat, default_log_filter, default_log_format,
};
use rstest::rstest;

#[test]
fn defaults_match_documented_values() {
    let config = EngineConfig::default();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.document_versions(), DocumentVersionPolicy::Fallback);
    assert!(config.validate_documents());
}

#[test]
fn empty_document_deserialises_to_defaults() {
    let config: EngineConfig = serde_json::from_str("{}").expect("empty object parses");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn partial_document_overrides_named_fields_only() {
    let config: EngineConfig = serde_json::from_str(
        r#"{ "document_versions": "strict", "log_format": "compact" }"#,
    )
    .expect("partial object parses");
    assert_eq!(config.document_versions(), DocumentVersionPolicy::Strict);
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.log_filter(), "info");
    assert!(config.validate_documents());
}

#[test]
fn unknown_policy_is_rejected() {
    let result = serde_json::from_str::<EngineConfig>(r#"{ "document_versions": "lenient" }"#);
    assert!(result.is_err());
}

#[test]
fn builder_methods_replace_fields() {
    let config = EngineConfig::default()
        .with_log_filter("fints_jobs=debug")
        .with_log_format(LogFormat::Compact)
        .with_document_versions(DocumentVersionPolicy::Strict)
        .with_validate_documents(false);
    assert_eq!(config.log_filter(), "fints_jobs=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.document_versions(), DocumentVersionPolicy::Strict);
    assert!(!config.validate_documents());
}

#[test]
fn serialisation_round_trips() {
    let config = EngineConfig::default().with_document_versions(DocumentVersionPolicy::Strict);
    let json = serde_json::to_string(&config).expect("serialise");
    let parsed: EngineConfig = serde_json::from_str(&json).expect("deserialise");
    assert_eq!(parsed, config);
}

#[rstest]
#[case::lowercase("strict", DocumentVersionPolicy::Strict)]
#[case::uppercase("FALLBACK", DocumentVersionPolicy::Fallback)]
fn policy_parses_case_insensitively(#[case] input: &str, #[case] expected: DocumentVersionPolicy) {
    let parsed = DocumentVersionPolicy::from_str(input).expect("policy parses");
    assert_eq!(parsed, expected);
    assert_eq!(parsed.to_string(), input.to_ascii_lowercase());
}

#[rstest]
#[case::json("json", LogFormat::Json)]
#[case::compact("Compact", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
    assert_eq!(LogFormat::from_str(input).expect("format parses"), expected);
}
