//! Correlation of a bank reply with the job that caused it.
//!
//! A reply bundles result segments of every job in the message. Each result
//! segment header `GVRes_<n>.<name>.SegHead.ref` names the request segment it
//! answers; [`correlate`] picks the segments referencing the target job,
//! visits them in ascending result-segment number, echoes their fields into
//! numbered `content` buckets and runs the job's extraction step.

mod reply;


use std::collections::BTreeMap;

use tracing::debug;

use crate::error::JobError;
use crate::job::Job;
use crate::result::DialogRef;

pub use self::reply::{RawReply, ResponseSegment};

/// Tracing target for reply correlation.
const CORRELATE_TARGET: &str = "fints_jobs::correlate";

/// Namespace of result segment keys.
pub const RESULT_NAMESPACE: &str = "GVRes";

const SEGMENT_REF_SUFFIX: &str = ".SegHead.ref";
const DIALOG_ID_KEY: &str = "MsgHead.dialogid";
const MESSAGE_NUMBER_KEY: &str = "MsgHead.msgnum";

/// Something that owns a job and can consume its response segments.
///
/// Plain jobs extract directly; an authentication step routes segments
/// between itself and the job it authenticates.
pub trait ResponseTarget {
    /// Returns the job whose request segment is being answered.
    fn job(&self) -> &Job;

    /// Returns the job mutably.
    fn job_mut(&mut self) -> &mut Job;

    /// Consumes one correlated segment.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the extraction step.
    fn extract(&mut self, segment: &ResponseSegment, index: usize) -> Result<(), JobError>;
}

/// Feeds `target` its share of `reply`.
///
/// `segment_offset` is the message's segment number offset, subtracted from
/// each reference before comparing it with the job's position. Returns the
/// number of segments handed to the extraction step.
///
/// # Errors
///
/// Returns [`JobError::ResultStorage`] wrapping the first failure. Results
/// stored before the failure stay in the job.
pub fn correlate<T>(target: &mut T, reply: &RawReply, segment_offset: u32) -> Result<usize, JobError>
where
    T: ResponseTarget + ?Sized,
{
    let job_name = target.job().name().to_owned();
    correlate_inner(target, reply, segment_offset)
        .map_err(|err| err.into_result_storage(&job_name))
}

fn correlate_inner<T>(target: &mut T, reply: &RawReply, segment_offset: u32) -> Result<usize, JobError>
where
    T: ResponseTarget + ?Sized,
{
    let position = target.job().position();
    let headers = matching_headers(reply, segment_offset, position);

    let job = target.job_mut();
    for status in reply.segment_status() {
        let refers_to_job = status
            .segment_ref()
            .and_then(|reference| reference.checked_sub(segment_offset))
            == Some(position);
        if refers_to_job {
            job.result_mut().add_return_value(status.clone());
        }
    }
    job.mark_executed();

    let mut handled = 0_usize;
    for (number, header) in headers {
        record_dialog(target.job_mut(), reply, position);
        let index = target.job().content_index();
        let segment = reply.segment(&header, number);
        echo(target.job_mut(), &segment, index);
        target.extract(&segment, index)?;
        target.job_mut().advance_content_index();
        handled = handled.saturating_add(1);
    }
    debug!(
        target: CORRELATE_TARGET,
        job = target.job().name(),
        position,
        segments = handled,
        "correlated reply"
    );
    Ok(handled)
}

/// Result segment headers referencing `position`, keyed by segment number.
fn matching_headers(reply: &RawReply, segment_offset: u32, position: u32) -> BTreeMap<u32, String> {
    reply
        .entries()
        .filter_map(|(key, value)| {
            let header = key.strip_suffix(SEGMENT_REF_SUFFIX)?;
            let number = result_segment_number(header)?;
            let reference = value.trim().parse::<u32>().ok()?;
            (reference.checked_sub(segment_offset) == Some(position))
                .then(|| (number, header.to_owned()))
        })
        .collect()
}

/// Parses the number of a `GVRes_<n>.<name>` header; plain `GVRes` is 0.
fn result_segment_number(header: &str) -> Option<u32> {
    let (namespace, name) = header.split_once('.')?;
    if name.is_empty() || name.contains('.') {
        return None;
    }
    let suffix = namespace.strip_prefix(RESULT_NAMESPACE)?;
    if suffix.is_empty() {
        return Some(0);
    }
    suffix.strip_prefix('_')?.parse::<u32>().ok()
}

fn record_dialog(job: &mut Job, reply: &RawReply, position: u32) {
    let dialog = DialogRef {
        dialog_id: reply.get(DIALOG_ID_KEY).unwrap_or_default().to_owned(),
        message_number: reply.get(MESSAGE_NUMBER_KEY).unwrap_or_default().to_owned(),
        segment_ref: position,
    };
    let result = job.result_mut();
    let basic = [
        ("basic.dialogid", dialog.dialog_id.clone()),
        ("basic.msgnum", dialog.message_number.clone()),
        ("basic.segnum", position.to_string()),
    ];
    if result.record_dialog(dialog) {
        for (key, value) in basic {
            result.store(key, value);
        }
    }
}

/// Name of the result bucket for the segment at `index`.
#[must_use]
pub fn content_bucket(index: usize) -> String {
    match index {
        0 => String::from("content"),
        other => format!("content_{}", other.saturating_add(1)),
    }
}

fn echo(job: &mut Job, segment: &ResponseSegment, index: usize) {
    let bucket = content_bucket(index);
    let result = job.result_mut();
    for (key, value) in segment.fields() {
        result.store(format!("{bucket}.{key}"), value.as_str());
    }
}
