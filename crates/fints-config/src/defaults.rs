use crate::engine::DocumentVersionPolicy;
use crate::telemetry::LogFormat;

/// Default log filter expression used by embedding applications.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default policy applied when a bank advertises no usable document schema.
#[must_use]
pub const fn default_document_versions() -> DocumentVersionPolicy {
    DocumentVersionPolicy::Fallback
}

/// Generated payment documents are schema-validated unless disabled.
#[must_use]
pub const fn default_validate_documents() -> bool {
    true
}
