//! Multi-message continuation.
//!
//! When one reply cannot carry all requested data the bank answers with
//! return code `3040`, whose first parameter is an opaque cursor. The caller
//! sets that cursor on the job's `offset` parameter and resubmits; these
//! functions only inspect the job and never send anything.


use tracing::debug;

use crate::error::JobError;
use crate::job::Job;
use crate::result::ReturnValue;

/// Tracing target for continuation decisions.
const CONTINUATION_TARGET: &str = "fints_jobs::continuation";

/// Public parameter that carries the continuation cursor.
pub const OFFSET_PARAM: &str = "offset";

/// Returns `true` when the `occurrence`-th (1-based) "more data available"
/// return value of an executed job exists.
#[must_use]
pub fn needs_continuation(job: &Job, occurrence: usize) -> bool {
    nth_more_data(job, occurrence).is_some()
}

/// Returns the cursor of the `occurrence`-th (1-based) "more data
/// available" return value, if any.
#[must_use]
pub fn continuation_token(job: &Job, occurrence: usize) -> Option<String> {
    nth_more_data(job, occurrence)
        .and_then(ReturnValue::first_param)
        .map(str::to_owned)
}

/// Sets the cursor of the `occurrence`-th continuation on the job's
/// `offset` parameter, when the job declares one.
///
/// Returns the cursor that was found, whether or not it could be set.
///
/// # Errors
///
/// Propagates errors from setting the parameter.
pub fn prepare_continuation(job: &mut Job, occurrence: usize) -> Result<Option<String>, JobError> {
    let Some(token) = continuation_token(job, occurrence) else {
        return Ok(None);
    };
    if job.accepts(OFFSET_PARAM) {
        job.set(OFFSET_PARAM, &token)?;
        debug!(
            target: CONTINUATION_TARGET,
            job = job.name(),
            occurrence,
            "continuation cursor applied"
        );
    }
    Ok(Some(token))
}

fn nth_more_data(job: &Job, occurrence: usize) -> Option<&ReturnValue> {
    if !job.is_executed() {
        return None;
    }
    let skip = occurrence.checked_sub(1)?;
    job.result()
        .return_values()
        .iter()
        .filter(|value| value.is_more_data_available())
        .nth(skip)
}
