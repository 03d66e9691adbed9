//! Transaction kind descriptors.
//!
//! A [`TransactionKind`] is plain data: the business function name, the
//! request segment code, the constraint list, an optional document
//! description, and an optional result-extraction closure. Every concrete
//! transaction is one [`Job`](crate::Job) parameterised by a kind.

mod segment;


use std::fmt;
use std::sync::Arc;

use crate::binder::ParamDefault;
use crate::correlate::ResponseSegment;
use crate::error::JobError;
use crate::path::FieldPath;
use crate::result::JobResult;
use crate::version::{DocumentFamily, DocumentVersion};

pub use self::segment::SegmentCode;

/// Result-extraction step run for every correlated response segment.
///
/// Receives the job's result, the segment, and the segment's content index.
pub type Extractor =
    Arc<dyn Fn(&mut JobResult, &ResponseSegment, usize) -> Result<(), JobError> + Send + Sync>;

/// One constraint declaration of a kind, with a job-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSpec {
    /// Public parameter name.
    pub name: String,
    /// Job-relative protocol path.
    pub path: FieldPath,
    /// Default applied at verification time.
    pub default: ParamDefault,
    /// Whether the mapping accepts an item index.
    pub indexable: bool,
}

/// Document produced by a kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSpec {
    /// Function the generators are registered under.
    pub function: String,
    /// Schema family of the document.
    pub family: DocumentFamily,
    /// Version used when the bank advertises nothing usable.
    pub default_version: DocumentVersion,
    /// Whether line items are summed into a batch total.
    pub batch: bool,
}

/// Data descriptor of one business transaction type.
#[derive(Clone)]
pub struct TransactionKind {
    name: String,
    request_code: SegmentCode,
    constraints: Vec<ConstraintSpec>,
    document: Option<DocumentSpec>,
    extractor: Option<Extractor>,
}

impl TransactionKind {
    /// Starts a descriptor for business function `name` sent as
    /// `request_code`.
    #[must_use]
    pub fn builder(name: impl Into<String>, request_code: impl Into<SegmentCode>) -> TransactionKindBuilder {
        TransactionKindBuilder {
            kind: Self {
                name: name.into(),
                request_code: request_code.into(),
                constraints: Vec::new(),
                document: None,
                extractor: None,
            },
            error: None,
        }
    }

    /// Returns the business function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the request segment code.
    #[must_use]
    pub const fn request_code(&self) -> &SegmentCode {
        &self.request_code
    }

    /// Returns the segment code the bank answers with.
    #[must_use]
    pub fn response_code(&self) -> SegmentCode {
        self.request_code.response()
    }

    /// Returns the constraint declarations in order.
    #[must_use]
    pub fn constraints(&self) -> &[ConstraintSpec] {
        &self.constraints
    }

    /// Returns the document description, if the kind produces one.
    #[must_use]
    pub const fn document(&self) -> Option<&DocumentSpec> {
        self.document.as_ref()
    }

    /// Runs the extraction step, if any.
    ///
    /// # Errors
    ///
    /// Propagates the extractor's error.
    pub fn extract(
        &self,
        result: &mut JobResult,
        segment: &ResponseSegment,
        index: usize,
    ) -> Result<(), JobError> {
        self.extractor
            .as_ref()
            .map_or(Ok(()), |extractor| extractor(result, segment, index))
    }
}

impl fmt::Debug for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionKind")
            .field("name", &self.name)
            .field("request_code", &self.request_code)
            .field("constraints", &self.constraints.len())
            .field("document", &self.document)
            .field("extractor", &self.extractor.is_some())
            .finish()
    }
}

/// Builder for [`TransactionKind`].
///
/// Path parse errors are remembered and reported by [`Self::build`].
#[must_use]
pub struct TransactionKindBuilder {
    kind: TransactionKind,
    error: Option<JobError>,
}

impl TransactionKindBuilder {
    /// Declares `name` mapped to the job-relative `path`.
    pub fn param(self, name: &str, path: &str, default: ParamDefault) -> Self {
        self.declare(name, path, default, false)
    }

    /// Declares an indexable mapping.
    pub fn indexed_param(self, name: &str, path: &str, default: ParamDefault) -> Self {
        self.declare(name, path, default, true)
    }

    /// Attaches a document description.
    pub fn document(mut self, spec: DocumentSpec) -> Self {
        self.kind.document = Some(spec);
        self
    }

    /// Attaches the result-extraction step.
    pub fn extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&mut JobResult, &ResponseSegment, usize) -> Result<(), JobError>
            + Send
            + Sync
            + 'static,
    {
        self.kind.extractor = Some(Arc::new(extractor));
        self
    }

    /// Finishes the descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first [`JobError::InvalidFieldPath`] met while declaring.
    pub fn build(self) -> Result<TransactionKind, JobError> {
        self.error.map_or(Ok(self.kind), Err)
    }

    fn declare(mut self, name: &str, path: &str, default: ParamDefault, indexable: bool) -> Self {
        if self.error.is_some() {
            return self;
        }
        match FieldPath::parse(path) {
            Ok(parsed) => self.kind.constraints.push(ConstraintSpec {
                name: name.to_owned(),
                path: parsed,
                default,
                indexable,
            }),
            Err(err) => self.error = Some(err),
        }
        self
    }
}
