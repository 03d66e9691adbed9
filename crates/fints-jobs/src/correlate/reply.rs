//! Raw reply data handed over by the dialog driver.

use std::collections::BTreeMap;

use crate::kind::SegmentCode;
use crate::result::ReturnValue;

const SEGMENT_CODE_FIELD: &str = "SegHead.code";

/// A parsed bank reply: flat field data in arrival order plus status lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReply {
    data: Vec<(String, String)>,
    segment_status: Vec<ReturnValue>,
    global_status: Vec<ReturnValue>,
}

impl RawReply {
    /// Creates an empty reply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one field in arrival order.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Appends one field in arrival order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.push((key.into(), value.into()));
    }

    /// Appends a segment-level return value.
    #[must_use]
    pub fn with_segment_status(mut self, status: ReturnValue) -> Self {
        self.segment_status.push(status);
        self
    }

    /// Appends a message-level return value.
    #[must_use]
    pub fn with_global_status(mut self, status: ReturnValue) -> Self {
        self.global_status.push(status);
        self
    }

    /// Iterates over the fields in arrival order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.data
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the last value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the segment-level return values.
    #[must_use]
    pub fn segment_status(&self) -> &[ReturnValue] {
        &self.segment_status
    }

    /// Returns the message-level return values.
    #[must_use]
    pub fn global_status(&self) -> &[ReturnValue] {
        &self.global_status
    }

    /// Collects the fields below `header` into a segment.
    pub(crate) fn segment(&self, header: &str, number: u32) -> ResponseSegment {
        let prefix = format!("{header}.");
        let fields = self
            .data
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|relative| (relative.to_owned(), value.clone()))
            })
            .collect();
        ResponseSegment::from_fields(header, number, fields)
    }
}

/// One result segment of a reply, with fields relative to its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSegment {
    header: String,
    number: u32,
    code: Option<SegmentCode>,
    fields: BTreeMap<String, String>,
}

impl ResponseSegment {
    /// Builds a segment from relative field pairs.
    #[must_use]
    pub fn new<I, K, V>(header: impl Into<String>, number: u32, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = fields
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::from_fields(header, number, map)
    }

    fn from_fields(header: impl Into<String>, number: u32, fields: BTreeMap<String, String>) -> Self {
        let code = fields
            .get(SEGMENT_CODE_FIELD)
            .map(|code| SegmentCode::new(code.as_str()));
        Self {
            header: header.into(),
            number,
            code,
            fields,
        }
    }

    /// Returns the header such as `GVRes_2.KUmsZeitRes5`.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns the result segment number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns the segment code from `SegHead.code`, if present.
    #[must_use]
    pub const fn code(&self) -> Option<&SegmentCode> {
        self.code.as_ref()
    }

    /// Looks up a field relative to the header.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&str> {
        self.fields.get(relative).map(String::as_str)
    }

    /// Returns all fields relative to the header.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}
