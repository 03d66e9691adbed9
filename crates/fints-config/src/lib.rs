//! Configuration model and telemetry helpers for the FinTS job engine.
//!
//! [`EngineConfig`] carries the handful of knobs the engine consults while
//! building jobs (document version policy, generator validation) together
//! with the logging settings applications usually want to keep alongside
//! them. Loading the configuration from files or the environment is left to
//! the embedding application; every field deserialises with a default.

mod defaults;
mod engine;
pub mod telemetry;

pub use defaults::{
    DEFAULT_LOG_FILTER, default_document_versions, default_log_filter, default_log_filter_string,
    default_log_format, default_validate_documents,
};
pub use engine::{DocumentVersionPolicy, EngineConfig};
pub use telemetry::{LogFormat, LogFormatParseError};
