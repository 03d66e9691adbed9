//! Engine-wide settings shared by every job in a dialog.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{
    default_document_versions, default_log_filter_string, default_log_format,
    default_validate_documents,
};
use crate::telemetry::LogFormat;

/// How job construction reacts when neither the bank's global nor its
/// function-specific capability data names a usable document schema.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DocumentVersionPolicy {
    /// Use the transaction kind's built-in default and log a warning.
    #[default]
    Fallback,
    /// Refuse to build the job.
    Strict,
}

/// Settings consumed by the job execution engine.
///
/// Every field has a default so partial documents deserialise cleanly:
///
/// - `log_filter`: `info`
/// - `log_format`: [`LogFormat::Json`]
/// - `document_versions`: [`DocumentVersionPolicy::Fallback`]
/// - `validate_documents`: `true`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_filter_string")]
    log_filter: String,
    #[serde(default = "default_log_format")]
    log_format: LogFormat,
    #[serde(default = "default_document_versions")]
    document_versions: DocumentVersionPolicy,
    #[serde(default = "default_validate_documents")]
    validate_documents: bool,
}

impl EngineConfig {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the policy for unresolvable document schema versions.
    #[must_use]
    pub const fn document_versions(&self) -> DocumentVersionPolicy {
        self.document_versions
    }

    /// Returns whether document generators should validate their output.
    #[must_use]
    pub const fn validate_documents(&self) -> bool {
        self.validate_documents
    }

    /// Replaces the tracing filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Replaces the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Replaces the document version policy.
    #[must_use]
    pub const fn with_document_versions(mut self, policy: DocumentVersionPolicy) -> Self {
        self.document_versions = policy;
        self
    }

    /// Enables or disables generator-side document validation.
    #[must_use]
    pub const fn with_validate_documents(mut self, validate: bool) -> Self {
        self.validate_documents = validate;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            document_versions: default_document_versions(),
            validate_documents: default_validate_documents(),
        }
    }
}
