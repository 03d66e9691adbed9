//! Job results and bank return values.

use std::collections::BTreeMap;

use serde::Serialize;

/// One status entry reported by the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnValue {
    code: String,
    text: String,
    params: Vec<String>,
    segment_ref: Option<u32>,
}

impl ReturnValue {
    /// Return code signalling that more result data can be fetched.
    pub const MORE_DATA_AVAILABLE: &'static str = "3040";

    /// Creates a return value without parameters or segment reference.
    #[must_use]
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
            params: Vec::new(),
            segment_ref: None,
        }
    }

    /// Attaches the bank-supplied parameters.
    #[must_use]
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Records the request segment number the entry refers to.
    #[must_use]
    pub const fn with_segment_ref(mut self, segment_ref: u32) -> Self {
        self.segment_ref = Some(segment_ref);
        self
    }

    /// Returns the four-digit return code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the bank's message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attached parameters.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the first attached parameter, if any.
    #[must_use]
    pub fn first_param(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    /// Returns the referenced request segment number.
    #[must_use]
    pub const fn segment_ref(&self) -> Option<u32> {
        self.segment_ref
    }

    /// Returns `true` for the "more data available" code.
    #[must_use]
    pub fn is_more_data_available(&self) -> bool {
        self.code == Self::MORE_DATA_AVAILABLE
    }

    /// Returns `true` for error codes (`9xxx`).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code.starts_with('9')
    }
}

/// Dialog bookkeeping recorded with the first correlated segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogRef {
    /// Dialog identifier assigned by the bank.
    pub dialog_id: String,
    /// Number of the message that carried the reply.
    pub message_number: String,
    /// Request segment number the job occupied.
    pub segment_ref: u32,
}

/// Outcome of a job, filled in by the correlator and the job's extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobResult {
    entries: BTreeMap<String, String>,
    return_values: Vec<ReturnValue>,
    dialog: Option<DialogRef>,
}

impl JobResult {
    /// Stores a result entry, replacing any previous value.
    pub fn store(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up a result entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns all result entries.
    #[must_use]
    pub const fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Appends a return value attributed to the job.
    pub fn add_return_value(&mut self, value: ReturnValue) {
        self.return_values.push(value);
    }

    /// Returns the job's return values in arrival order.
    #[must_use]
    pub fn return_values(&self) -> &[ReturnValue] {
        &self.return_values
    }

    /// Records dialog bookkeeping unless it was already recorded.
    ///
    /// Returns `true` when the bookkeeping was written.
    pub fn record_dialog(&mut self, dialog: DialogRef) -> bool {
        if self.dialog.is_some() {
            return false;
        }
        self.dialog = Some(dialog);
        true
    }

    /// Returns the recorded dialog bookkeeping.
    #[must_use]
    pub const fn dialog(&self) -> Option<&DialogRef> {
        self.dialog.as_ref()
    }

    /// Returns `true` when no return value carries an error code.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.return_values.iter().any(ReturnValue::is_error)
    }
}
