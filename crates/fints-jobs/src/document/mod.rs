//! Payment-instruction document dispatch.
//!
//! Document-producing jobs hand their side table to a generator chosen by
//! (document function, schema version). Generators are registered as
//! factories in a [`GeneratorRegistry`] shared by the dialog; each job
//! instantiates at most one generator, lazily, through its own
//! [`DocumentDispatch`].

mod total;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::error::{BoxedSource, JobError};
use crate::path::FieldPath;
use crate::version::DocumentVersion;

pub use self::total::{BatchTotal, batch_total};

/// Tracing target for document dispatch.
const DOCUMENT_TARGET: &str = "fints_jobs::document";

/// Lowlevel parameter receiving the generated document.
pub const DOCUMENT_PARAM: &str = "sepapain";

/// Lowlevel parameter receiving the document's schema URN.
pub const SCHEMA_PARAM: &str = "sepadescr";

/// Error type generators report.
pub type GeneratorError = Box<dyn std::error::Error + Send + Sync>;

/// Writes a complete payment-instruction document for one schema version.
pub trait DocumentGenerator: Send {
    /// Writes the document described by `params` into `sink`.
    ///
    /// `params` is keyed relative to the document namespace
    /// (`btg[1].value`). With `validate` set, the generator checks its output
    /// against the schema.
    ///
    /// # Errors
    ///
    /// Returns the generator's own error when the document cannot be built.
    fn generate(
        &self,
        params: &BTreeMap<FieldPath, String>,
        sink: &mut dyn Write,
        validate: bool,
    ) -> Result<(), GeneratorError>;
}

/// Creates a fresh generator instance.
pub type GeneratorFactory = Arc<dyn Fn() -> Box<dyn DocumentGenerator> + Send + Sync>;

/// Generator factories keyed by document function and schema version.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    factories: HashMap<(String, DocumentVersion), GeneratorFactory>,
}

impl GeneratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `function` at `version`, replacing any
    /// previous registration.
    pub fn register<F>(&mut self, function: impl Into<String>, version: DocumentVersion, factory: F)
    where
        F: Fn() -> Box<dyn DocumentGenerator> + Send + Sync + 'static,
    {
        self.factories
            .insert((function.into(), version), Arc::new(factory));
    }

    /// Builder-style [`Self::register`].
    #[must_use]
    pub fn with<F>(mut self, function: impl Into<String>, version: DocumentVersion, factory: F) -> Self
    where
        F: Fn() -> Box<dyn DocumentGenerator> + Send + Sync + 'static,
    {
        self.register(function, version, factory);
        self
    }

    /// Returns the versions supported for `function`, oldest first.
    #[must_use]
    pub fn supported_versions(&self, function: &str) -> Vec<DocumentVersion> {
        let mut versions: Vec<DocumentVersion> = self
            .factories
            .keys()
            .filter(|(registered, _)| registered == function)
            .map(|(_, version)| *version)
            .collect();
        versions.sort_unstable();
        versions
    }

    /// Looks up the factory for `function` at `version`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::UnsupportedDocumentVersion`] when nothing is
    /// registered for the pair.
    pub fn factory(
        &self,
        function: &str,
        version: DocumentVersion,
    ) -> Result<&GeneratorFactory, JobError> {
        self.factories
            .get(&(function.to_owned(), version))
            .ok_or_else(|| JobError::UnsupportedDocumentVersion {
                job: function.to_owned(),
                version: version.to_string(),
            })
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .factories
            .keys()
            .map(|(function, version)| format!("{function}@{version}"))
            .collect();
        keys.sort_unstable();
        f.debug_struct("GeneratorRegistry")
            .field("generators", &keys)
            .finish()
    }
}

/// Per-job generator cache.
///
/// Clones start with an empty cache so instances are never shared between
/// jobs.
#[derive(Default)]
pub struct DocumentDispatch {
    generator: OnceCell<(DocumentVersion, Box<dyn DocumentGenerator>)>,
}

impl DocumentDispatch {
    /// Returns the job's generator, instantiating it on first use.
    ///
    /// The first successful instantiation is kept for the job's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::UnsupportedDocumentVersion`] when no generator is
    /// registered for `function` at `version`, or when a generator for a
    /// different version is already cached.
    pub fn get(
        &self,
        registry: &GeneratorRegistry,
        function: &str,
        version: DocumentVersion,
    ) -> Result<&dyn DocumentGenerator, JobError> {
        let (cached, generator) = self.generator.get_or_try_init(|| {
            let factory = registry.factory(function, version)?;
            debug!(
                target: DOCUMENT_TARGET,
                job = function,
                version = %version,
                "instantiating document generator"
            );
            Ok::<_, JobError>((version, factory()))
        })?;
        if *cached != version {
            return Err(JobError::UnsupportedDocumentVersion {
                job: function.to_owned(),
                version: version.to_string(),
            });
        }
        Ok(generator.as_ref())
    }

    /// Returns `true` once a generator has been instantiated.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.generator.get().is_some()
    }
}

impl Clone for DocumentDispatch {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl fmt::Debug for DocumentDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDispatch")
            .field("version", &self.generator.get().map(|(version, _)| version))
            .finish()
    }
}

/// Runs `generator` and returns the produced document.
///
/// # Errors
///
/// Returns [`JobError::DocumentBuildFailure`] when the generator fails,
/// writes nothing, or writes bytes that are not UTF-8.
pub fn render(
    generator: &dyn DocumentGenerator,
    job: &str,
    params: &BTreeMap<FieldPath, String>,
    validate: bool,
) -> Result<String, JobError> {
    let mut sink = Vec::new();
    generator
        .generate(params, &mut sink, validate)
        .map_err(|err| JobError::DocumentBuildFailure {
            job: job.to_owned(),
            message: err.to_string(),
            source: Some(BoxedSource::from(err)),
        })?;
    if sink.is_empty() {
        return Err(JobError::document(job, "generator produced no output"));
    }
    let bytes = sink.len();
    let document = String::from_utf8(sink).map_err(|err| JobError::DocumentBuildFailure {
        job: job.to_owned(),
        message: String::from("document is not valid UTF-8"),
        source: Some(Arc::new(err)),
    })?;
    debug!(target: DOCUMENT_TARGET, job, bytes, "document generated");
    Ok(document)
}
