//! The job: one business transaction request/response cycle.
//!
//! A [`Job`] is built from a [`TransactionKind`] against the bank's
//! capability data. Construction fixes the segment version and with it the
//! protocol name; the application then sets parameters any number of times
//! before [`Job::verify`] generates the document (if any), resolves every
//! constraint and has the grammar engine build the field tree.

mod values;


use std::collections::BTreeMap;
use std::sync::Arc;

use fints_config::EngineConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binder::{ParameterBinder, Resolution};
use crate::capability::CapabilityData;
use crate::correlate::{ResponseSegment, ResponseTarget};
use crate::document::{
    BatchTotal, DOCUMENT_PARAM, DocumentDispatch, GeneratorRegistry, SCHEMA_PARAM, batch_total,
    render,
};
use crate::error::JobError;
use crate::grammar::{FieldTree, Grammar};
use crate::kind::{SegmentCode, TransactionKind};
use crate::path::FieldPath;
use crate::result::JobResult;
use crate::version::{
    DocumentNegotiation, DocumentVersion, resolve_document_version, resolve_segment_version,
};

pub use self::values::{Account, Amount};

/// Tracing target for job construction and verification.
const JOB_TARGET: &str = "fints_jobs::job";

const TOTAL_VALUE_PARAM: &str = "Total.value";
const TOTAL_CURRENCY_PARAM: &str = "Total.curr";

/// Collaborators a job is built and verified against.
///
/// Everything here is read-only and shared by all jobs of a dialog.
#[derive(Clone, Copy)]
pub struct JobContext<'a> {
    /// Bank capability snapshot.
    pub capabilities: &'a CapabilityData,
    /// Registered document generators.
    pub generators: &'a GeneratorRegistry,
    /// Wire grammar engine.
    pub grammar: &'a dyn Grammar,
    /// Engine configuration.
    pub config: &'a EngineConfig,
}

impl<'a> JobContext<'a> {
    /// Bundles the collaborators.
    #[must_use]
    pub const fn new(
        capabilities: &'a CapabilityData,
        generators: &'a GeneratorRegistry,
        grammar: &'a dyn Grammar,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            capabilities,
            generators,
            grammar,
            config,
        }
    }
}

/// Outcome of a successful [`Job::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Resolved content of every constrained path.
    pub resolution: Resolution,
    /// Field tree built by the grammar engine.
    pub tree: FieldTree,
}

/// Flattened lowlevel parameters of a job, for callers that persist them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    /// Business function name.
    pub job: String,
    /// Protocol name the keys are rooted at.
    pub protocol_name: String,
    /// Rendered qualified paths and their values.
    pub params: BTreeMap<String, String>,
}

/// One business transaction.
#[derive(Debug, Clone)]
pub struct Job {
    kind: Arc<TransactionKind>,
    segment_version: u32,
    protocol_name: String,
    position: u32,
    executed: bool,
    content_index: usize,
    binder: ParameterBinder,
    document_version: Option<DocumentVersion>,
    dispatch: DocumentDispatch,
    result: JobResult,
}

impl Job {
    /// Builds a job of `kind` at the highest segment version the bank
    /// advertises.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::FunctionNotSupported`] when the bank does not
    /// offer the function, and [`JobError::NoDocumentVersion`] when no
    /// document version can be agreed under the strict policy.
    pub fn new(kind: Arc<TransactionKind>, ctx: &JobContext<'_>) -> Result<Self, JobError> {
        let version = resolve_segment_version(kind.name(), ctx.capabilities)?;
        let document_version = match kind.document() {
            Some(spec) => {
                let supported = ctx.generators.supported_versions(&spec.function);
                let negotiation = DocumentNegotiation {
                    function: kind.name(),
                    family: spec.family,
                    supported: &supported,
                    fallback: spec.default_version,
                    policy: ctx.config.document_versions(),
                };
                Some(resolve_document_version(ctx.capabilities, &negotiation)?)
            }
            None => None,
        };
        Ok(Self::with_versions(kind, version, document_version))
    }

    /// Builds a job at an explicit segment version, skipping negotiation.
    ///
    /// Document kinds use their default document version.
    #[must_use]
    pub fn at_version(kind: Arc<TransactionKind>, segment_version: u32) -> Self {
        let document_version = kind.document().map(|spec| spec.default_version);
        Self::with_versions(kind, segment_version, document_version)
    }

    fn with_versions(
        kind: Arc<TransactionKind>,
        segment_version: u32,
        document_version: Option<DocumentVersion>,
    ) -> Self {
        let protocol_name = format!("{}{segment_version}", kind.name());
        let mut binder = ParameterBinder::new(kind.name(), protocol_name.as_str());
        for spec in kind.constraints() {
            binder.declare(spec.name.as_str(), &spec.path, spec.default.clone(), spec.indexable);
        }
        if let Some(version) = document_version {
            binder.set_lowlevel(&FieldPath::from_names([SCHEMA_PARAM]), version.urn());
        }
        debug!(
            target: JOB_TARGET,
            job = kind.name(),
            protocol = protocol_name.as_str(),
            "job created"
        );
        Self {
            kind,
            segment_version,
            protocol_name,
            position: 0,
            executed: false,
            content_index: 0,
            binder,
            document_version,
            dispatch: DocumentDispatch::default(),
            result: JobResult::default(),
        }
    }

    /// Returns the business function name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Returns the transaction kind.
    #[must_use]
    pub const fn kind(&self) -> &Arc<TransactionKind> {
        &self.kind
    }

    /// Returns the protocol name (function name plus segment version).
    #[must_use]
    pub fn protocol_name(&self) -> &str {
        &self.protocol_name
    }

    /// Returns the segment version.
    #[must_use]
    pub const fn segment_version(&self) -> u32 {
        self.segment_version
    }

    /// Returns the negotiated document version, for document kinds.
    #[must_use]
    pub const fn document_version(&self) -> Option<DocumentVersion> {
        self.document_version
    }

    /// Returns the request segment code.
    #[must_use]
    pub fn request_code(&self) -> &SegmentCode {
        self.kind.request_code()
    }

    /// Returns the segment code the bank answers with.
    #[must_use]
    pub fn response_code(&self) -> SegmentCode {
        self.kind.response_code()
    }

    /// Returns the job's segment number within its message.
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Places the job at segment number `position` of its message.
    pub const fn set_position(&mut self, position: u32) {
        self.position = position;
    }

    /// Returns `true` once a reply has been correlated with the job.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        self.executed
    }

    pub(crate) const fn mark_executed(&mut self) {
        self.executed = true;
    }

    /// Returns the number of response segments consumed so far.
    #[must_use]
    pub const fn content_index(&self) -> usize {
        self.content_index
    }

    pub(crate) const fn advance_content_index(&mut self) {
        self.content_index = self.content_index.saturating_add(1);
    }

    /// Returns the job's result.
    #[must_use]
    pub const fn result(&self) -> &JobResult {
        &self.result
    }

    pub(crate) const fn result_mut(&mut self) -> &mut JobResult {
        &mut self.result
    }

    /// Returns the parameter binder.
    #[must_use]
    pub const fn binder(&self) -> &ParameterBinder {
        &self.binder
    }

    /// Returns `true` when the public parameter `name` is declared.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.binder.accepts(name)
    }

    /// Sets a public parameter.
    ///
    /// # Errors
    ///
    /// See [`ParameterBinder::set`].
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), JobError> {
        self.binder.set(name, None, value)
    }

    /// Sets item `index` of an indexable public parameter.
    ///
    /// # Errors
    ///
    /// See [`ParameterBinder::set`].
    pub fn set_indexed(&mut self, name: &str, index: u32, value: &str) -> Result<(), JobError> {
        self.binder.set(name, Some(index), value)
    }

    /// Sets the account parameters below `prefix` (such as `src`).
    ///
    /// Sub-fields the account lacks, and sub-fields the job does not
    /// declare, are skipped.
    ///
    /// # Errors
    ///
    /// See [`ParameterBinder::set`].
    pub fn set_account(
        &mut self,
        prefix: &str,
        index: Option<u32>,
        account: &Account,
    ) -> Result<(), JobError> {
        for (field, value) in account.fields() {
            self.set_structured(prefix, field, index, value)?;
        }
        Ok(())
    }

    /// Sets `<prefix>.value` and `<prefix>.curr` from `amount`.
    ///
    /// # Errors
    ///
    /// See [`ParameterBinder::set`].
    pub fn set_amount(
        &mut self,
        prefix: &str,
        index: Option<u32>,
        amount: &Amount,
    ) -> Result<(), JobError> {
        let value = amount.value().to_string();
        self.set_structured(prefix, "value", index, &value)?;
        self.set_structured(prefix, "curr", index, amount.currency())
    }

    fn set_structured(
        &mut self,
        prefix: &str,
        field: &str,
        index: Option<u32>,
        value: &str,
    ) -> Result<(), JobError> {
        let name = format!("{prefix}.{field}");
        if value.is_empty() || !self.binder.accepts(&name) {
            return Ok(());
        }
        self.binder.set(&name, index, value)
    }

    /// Writes a protocol field directly by job-relative path.
    pub fn set_lowlevel(&mut self, relative: &FieldPath, value: impl Into<String>) {
        self.binder.set_lowlevel(relative, value);
    }

    /// Reads a protocol field by job-relative path such as `My.iban`.
    #[must_use]
    pub fn lowlevel(&self, relative: &str) -> Option<&str> {
        let path = FieldPath::parse(relative).ok()?;
        self.binder.lowlevel_value(&path)
    }

    /// Generates the document, resolves all constraints and builds the
    /// field tree.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Construction`] wrapping the first failure; the
    /// job must not be sent.
    pub fn verify(&mut self, ctx: &JobContext<'_>) -> Result<Verified, JobError> {
        let job = self.name().to_owned();
        self.verify_inner(ctx)
            .map_err(|err| err.into_construction(&job))
    }

    fn verify_inner(&mut self, ctx: &JobContext<'_>) -> Result<Verified, JobError> {
        self.build_document(ctx)?;
        let resolution = self.binder.verify()?;
        let tree = ctx
            .grammar
            .build(&self.protocol_name, self.binder.lowlevel())
            .map_err(|err| JobError::StructuralValidationFailure {
                job: self.name().to_owned(),
                message: err.message().to_owned(),
            })?;
        debug!(
            target: JOB_TARGET,
            job = self.name(),
            params = self.binder.lowlevel().len(),
            "job verified"
        );
        Ok(Verified { resolution, tree })
    }

    fn build_document(&mut self, ctx: &JobContext<'_>) -> Result<(), JobError> {
        let Some(spec) = self.kind.document().cloned() else {
            return Ok(());
        };
        let job = self.name().to_owned();
        let total = if spec.batch {
            batch_total(&job, self.binder.document_params())?
        } else {
            None
        };
        if let Some(total) = total {
            self.apply_total(&total)?;
        }
        let version = self
            .document_version
            .unwrap_or(spec.default_version);
        let generator = self.dispatch.get(ctx.generators, &spec.function, version)?;
        let document = render(
            generator,
            &job,
            self.binder.document_params(),
            ctx.config.validate_documents(),
        )?;
        self.binder
            .set_lowlevel(&FieldPath::from_names([DOCUMENT_PARAM]), document);
        Ok(())
    }

    fn apply_total(&mut self, total: &BatchTotal) -> Result<(), JobError> {
        let value = total.value.to_string();
        self.binder
            .set_document_param(BatchTotal::value_key(), value.as_str());
        self.binder
            .set_document_param(BatchTotal::currency_key(), total.currency.as_str());
        if self.binder.accepts(TOTAL_VALUE_PARAM) {
            self.binder.set(TOTAL_VALUE_PARAM, None, &value)?;
        }
        if self.binder.accepts(TOTAL_CURRENCY_PARAM) {
            self.binder.set(TOTAL_CURRENCY_PARAM, None, &total.currency)?;
        }
        Ok(())
    }

    /// Returns the job re-targeted at `version`.
    ///
    /// Lowlevel keys and constraint paths move from the old protocol name
    /// to the new one. The copy starts with an empty generator cache.
    #[must_use]
    pub fn rebound(&self, version: u32) -> Self {
        if version == self.segment_version {
            return self.clone();
        }
        let protocol_name = format!("{}{version}", self.name());
        debug!(
            target: JOB_TARGET,
            job = self.name(),
            from = self.protocol_name.as_str(),
            to = protocol_name.as_str(),
            "rebinding job"
        );
        Self {
            kind: Arc::clone(&self.kind),
            segment_version: version,
            binder: self.binder.rebased(&protocol_name),
            protocol_name,
            position: self.position,
            executed: self.executed,
            content_index: self.content_index,
            document_version: self.document_version,
            dispatch: DocumentDispatch::default(),
            result: self.result.clone(),
        }
    }

    /// Returns the flattened lowlevel parameters.
    #[must_use]
    pub fn parameter_snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            job: self.name().to_owned(),
            protocol_name: self.protocol_name.clone(),
            params: self
                .binder
                .lowlevel()
                .iter()
                .map(|(path, value)| (path.to_string(), value.clone()))
                .collect(),
        }
    }
}

impl ResponseTarget for Job {
    fn job(&self) -> &Self {
        self
    }

    fn job_mut(&mut self) -> &mut Self {
        self
    }

    fn extract(&mut self, segment: &ResponseSegment, index: usize) -> Result<(), JobError> {
        self.kind.extract(&mut self.result, segment, index)
    }
}
