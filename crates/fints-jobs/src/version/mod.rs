//! Segment and document schema version negotiation.
//!
//! A job is built against the highest segment version the bank advertises
//! for its business function. Jobs that carry a payment-instruction document
//! additionally pick the newest document schema that both the bank and the
//! engine's registered generators support.

mod document;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use fints_config::DocumentVersionPolicy;
use tracing::{debug, warn};

use crate::capability::CapabilityData;
use crate::error::JobError;
use crate::job::Job;

pub use self::document::{DocumentFamily, DocumentVersion};

/// Tracing target for version negotiation.
const VERSION_TARGET: &str = "fints_jobs::version";

/// Business function whose restrictions advertise the bank-wide document
/// schemas.
pub const GLOBAL_DOCUMENT_FUNCTION: &str = "SEPAInfo";

/// Restriction keys holding supported schema URNs start with this prefix.
pub const SUPPORTED_FORMATS_KEY: &str = "suppformats";

/// Returns the highest segment version the bank advertises for `function`.
///
/// Non-numeric embedded versions are logged and skipped.
///
/// # Errors
///
/// Returns [`JobError::FunctionNotSupported`] when no numeric version is
/// advertised.
pub fn resolve_segment_version(function: &str, caps: &CapabilityData) -> Result<u32, JobError> {
    let mut best: Option<u32> = None;
    for segment in caps.param_segments(function) {
        match segment.version.parse::<u32>() {
            Ok(version) if version > 0 => {
                best = Some(best.map_or(version, |current| current.max(version)));
            }
            _ => warn!(
                target: VERSION_TARGET,
                job = function,
                key = segment.key,
                "ignoring non-numeric segment version"
            ),
        }
    }
    let version = best.ok_or_else(|| JobError::FunctionNotSupported {
        job: function.to_owned(),
    })?;
    debug!(target: VERSION_TARGET, job = function, version, "resolved segment version");
    Ok(version)
}

/// Inputs for [`resolve_document_version`] besides the capability data.
#[derive(Debug, Clone, Copy)]
pub struct DocumentNegotiation<'a> {
    /// Business function whose restrictions are consulted.
    pub function: &'a str,
    /// Schema family the job produces.
    pub family: DocumentFamily,
    /// Versions the engine can generate for the job.
    pub supported: &'a [DocumentVersion],
    /// Version used when the bank names nothing usable.
    pub fallback: DocumentVersion,
    /// Reaction to an unresolvable version.
    pub policy: DocumentVersionPolicy,
}

/// Picks the document schema version for a document-producing job.
///
/// The function-specific version wins over the bank-wide one; when neither
/// exists the negotiation's fallback is used and a warning logged.
///
/// # Errors
///
/// Returns [`JobError::NoDocumentVersion`] only under
/// [`DocumentVersionPolicy::Strict`] when nothing usable is advertised.
pub fn resolve_document_version(
    caps: &CapabilityData,
    negotiation: &DocumentNegotiation<'_>,
) -> Result<DocumentVersion, JobError> {
    let global = best_advertised(
        &caps.restrictions(GLOBAL_DOCUMENT_FUNCTION),
        negotiation,
    );
    let specific = best_advertised(&caps.restrictions(negotiation.function), negotiation);

    match (specific, global) {
        (Some(version), _) => {
            debug!(
                target: VERSION_TARGET,
                job = negotiation.function,
                version = %version,
                "using job-specific document version"
            );
            Ok(version)
        }
        (None, Some(version)) => {
            debug!(
                target: VERSION_TARGET,
                job = negotiation.function,
                version = %version,
                "no job-specific document version, using bank-wide version"
            );
            Ok(version)
        }
        (None, None) => match negotiation.policy {
            DocumentVersionPolicy::Fallback => {
                warn!(
                    target: VERSION_TARGET,
                    job = negotiation.function,
                    version = %negotiation.fallback,
                    "unable to determine a matching document version, using default"
                );
                Ok(negotiation.fallback)
            }
            DocumentVersionPolicy::Strict => Err(JobError::NoDocumentVersion {
                job: negotiation.function.to_owned(),
            }),
        },
    }
}

fn best_advertised(
    restrictions: &BTreeMap<String, String>,
    negotiation: &DocumentNegotiation<'_>,
) -> Option<DocumentVersion> {
    restrictions
        .iter()
        .filter(|(key, _)| key.starts_with(SUPPORTED_FORMATS_KEY))
        .filter_map(|(_, urn)| {
            let parsed = DocumentVersion::from_urn(urn);
            if parsed.is_none() {
                debug!(target: VERSION_TARGET, urn = urn.as_str(), "ignoring unknown document schema");
            }
            parsed
        })
        .filter(|version| version.family() == negotiation.family)
        .filter(|version| negotiation.supported.contains(version))
        .max()
}

/// Re-targets `job` at `version`, returning the rebound job.
///
/// The protocol name, every lowlevel parameter key and every constraint
/// path rooted at the old protocol name move to the new one; suffixes and
/// values are untouched. Rebinding to the current version returns an
/// equivalent job.
#[must_use]
pub fn rebind(job: &Job, version: u32) -> Job {
    job.rebound(version)
}
