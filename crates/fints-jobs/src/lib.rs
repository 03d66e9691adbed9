//! Job execution engine for a segmented, versioned online-banking protocol.
//!
//! A [`Job`] is one business transaction: a transfer, a balance query, a TAN
//! round. Applications set named parameters on it; the engine maps them onto
//! protocol field paths, negotiates segment and document schema versions
//! against the bank's advertised [`CapabilityData`], generates the payment
//! document where one is needed and hands the flat field map to a
//! [`Grammar`] implementation for serialisation.
//!
//! On the way back, [`correlate()`] hands every result segment of a reply to
//! the job that caused it, [`continuation`] tells the caller when the bank
//! has more data, and [`tan::AuthenticationStep`] routes replies of a
//! two-step authentication round.
//!
//! Transport, signing and the wire grammar itself are collaborators supplied
//! by the caller.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use fints_config::EngineConfig;
//! use fints_jobs::{
//!     CapabilityData, FieldPath, FieldTree, GeneratorRegistry, Grammar, Job, JobContext,
//!     StructuralError, catalogue,
//! };
//!
//! struct Accepting;
//!
//! impl Grammar for Accepting {
//!     fn build(
//!         &self,
//!         protocol_name: &str,
//!         params: &BTreeMap<FieldPath, String>,
//!     ) -> Result<FieldTree, StructuralError> {
//!         Ok(FieldTree::new(protocol_name, params.clone()))
//!     }
//! }
//!
//! let caps = CapabilityData::from_entries([("Params_1.SaldoSEPAPar7.SegHead.code", "HISALS")]);
//! let generators = GeneratorRegistry::new();
//! let config = EngineConfig::default();
//! let ctx = JobContext::new(&caps, &generators, &Accepting, &config);
//!
//! let mut job = Job::new(Arc::new(catalogue::balance()?), &ctx)?;
//! job.set("my.iban", "DE89370400440532013000")?;
//! job.set("my.bic", "COBADEFFXXX")?;
//! let verified = job.verify(&ctx)?;
//! assert_eq!(verified.tree.protocol_name(), "SaldoSEPA7");
//! assert_eq!(job.lowlevel("allaccounts"), Some("N"));
//! # Ok::<(), fints_jobs::JobError>(())
//! ```

pub mod binder;
pub mod capability;
pub mod catalogue;
pub mod continuation;
pub mod correlate;
pub mod document;
pub mod error;
pub mod grammar;
pub mod job;
pub mod kind;
pub mod path;
pub mod result;
pub mod tan;
pub mod version;

#[cfg(test)]
mod tests;

pub use self::binder::{ParamDefault, ParameterBinder, Resolution};
pub use self::capability::CapabilityData;
pub use self::correlate::{RawReply, ResponseSegment, ResponseTarget, correlate};
pub use self::document::{DocumentGenerator, GeneratorRegistry};
pub use self::error::JobError;
pub use self::grammar::{FieldTree, Grammar, StructuralError};
pub use self::job::{Account, Amount, Job, JobContext, ParameterSnapshot, Verified};
pub use self::kind::{SegmentCode, TransactionKind};
pub use self::path::FieldPath;
pub use self::result::{JobResult, ReturnValue};
pub use self::version::{DocumentFamily, DocumentVersion};
