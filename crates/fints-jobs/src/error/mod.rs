//! Errors raised while binding, building, and correlating jobs.
//!
//! Every variant names the business function it concerns so callers can
//! present an actionable message without knowing protocol internals.
//! Parameter-binding variants surface synchronously from `set`; the rest are
//! bundled into [`JobError::Construction`] by `verify` or into
//! [`JobError::ResultStorage`] by the correlator.

use std::sync::Arc;

use thiserror::Error;

/// Boxed source error carried by document build failures.
pub type BoxedSource = Arc<dyn std::error::Error + Send + Sync>;

/// Errors arising from job execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    /// No constraint is declared under the public parameter name.
    #[error("job '{job}' has no parameter named '{name}'")]
    UnknownParameter {
        /// Business function name.
        job: String,
        /// Public parameter name that was looked up.
        name: String,
    },

    /// A parameter was set to an empty value.
    #[error("parameter '{name}' of job '{job}' must not be empty")]
    EmptyValue {
        /// Business function name.
        job: String,
        /// Public parameter name.
        name: String,
    },

    /// An index was supplied for a parameter that does not take one.
    #[error("parameter '{name}' of job '{job}' cannot be indexed")]
    NotIndexable {
        /// Business function name.
        job: String,
        /// Public parameter name.
        name: String,
    },

    /// A mandatory parameter was never set.
    #[error("job '{job}' is missing required parameter '{name}'")]
    MissingRequiredParameter {
        /// Business function name.
        job: String,
        /// Public parameter name.
        name: String,
    },

    /// The bank advertises no segment version for the business function.
    #[error("job '{job}' is not supported by the bank")]
    FunctionNotSupported {
        /// Business function name.
        job: String,
    },

    /// No generator exists for the requested document schema version.
    #[error("document version '{version}' is not supported for job '{job}'")]
    UnsupportedDocumentVersion {
        /// Business function name.
        job: String,
        /// Rendered schema version.
        version: String,
    },

    /// Neither the bank nor the engine names a usable document schema and
    /// the strict policy is active.
    #[error("no usable document version for job '{job}'")]
    NoDocumentVersion {
        /// Business function name.
        job: String,
    },

    /// The document generator failed or produced no output.
    #[error("document for job '{job}' could not be built: {message}")]
    DocumentBuildFailure {
        /// Business function name.
        job: String,
        /// Human-readable failure description.
        message: String,
        /// Underlying generator error, when one was reported.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The grammar engine rejected the job's field tree.
    #[error("job '{job}' failed structural validation: {message}")]
    StructuralValidationFailure {
        /// Business function name.
        job: String,
        /// Description reported by the grammar engine.
        message: String,
    },

    /// Line items of a batched document use different currencies.
    #[error("job '{job}' mixes currencies '{expected}' and '{found}' in one batch")]
    MixedCurrencyFailure {
        /// Business function name.
        job: String,
        /// Currency of the first line item.
        expected: String,
        /// Conflicting currency.
        found: String,
    },

    /// A field path string could not be parsed.
    #[error("invalid field path '{path}': {message}")]
    InvalidFieldPath {
        /// The rejected input.
        path: String,
        /// Description of the problem.
        message: String,
    },

    /// An authentication step was driven out of order.
    #[error("authentication step for job '{job}' cannot {action} while {state}")]
    AuthenticationState {
        /// Business function name of the authentication job.
        job: String,
        /// Attempted operation.
        action: &'static str,
        /// Current state label.
        state: &'static str,
    },

    /// Verification failed; the job must not be sent.
    #[error("job '{job}' could not be constructed: {source}")]
    Construction {
        /// Business function name.
        job: String,
        /// The first failure encountered.
        #[source]
        source: Box<Self>,
    },

    /// Storing the bank's reply in the job result failed.
    #[error("results for job '{job}' could not be stored: {source}")]
    ResultStorage {
        /// Business function name.
        job: String,
        /// The failure raised while storing.
        #[source]
        source: Box<Self>,
    },
}

impl JobError {
    /// Wraps `self` as a non-recoverable construction error for `job`.
    #[must_use]
    pub fn into_construction(self, job: &str) -> Self {
        match self {
            already @ Self::Construction { .. } => already,
            other => Self::Construction {
                job: job.to_owned(),
                source: Box::new(other),
            },
        }
    }

    /// Wraps `self` as a result-storage error for `job`.
    #[must_use]
    pub fn into_result_storage(self, job: &str) -> Self {
        match self {
            already @ Self::ResultStorage { .. } => already,
            other => Self::ResultStorage {
                job: job.to_owned(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error beneath any wrapper variants.
    #[must_use]
    pub fn innermost(&self) -> &Self {
        match self {
            Self::Construction { source, .. } | Self::ResultStorage { source, .. } => {
                source.innermost()
            }
            other => other,
        }
    }

    /// Creates a document build failure without an underlying source.
    #[must_use]
    pub fn document(job: &str, message: impl Into<String>) -> Self {
        Self::DocumentBuildFailure {
            job: job.to_owned(),
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` when the error reflects a bank capability gap.
    #[must_use]
    pub const fn is_capability_gap(&self) -> bool {
        matches!(
            self,
            Self::FunctionNotSupported { .. } | Self::NoDocumentVersion { .. }
        )
    }
}
