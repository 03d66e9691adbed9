//! Read-only view of the bank's advertised capabilities.
//!
//! Banks publish their parameter data as a flat dotted key space. Each
//! supported business function appears as a parameter segment such as
//! `Params_3.UebSEPAPar1.SegHead.code`, whose embedded number is the
//! segment version, with function-specific restrictions nested under
//! `Params_3.UebSEPAPar1.ParUebSEPA.`. [`CapabilityData`] is an immutable,
//! cheaply cloned snapshot shared by every job of a dialog.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Namespace prefix of parameter segment keys.
pub const PARAMS_NAMESPACE: &str = "Params";

/// Trailing path that marks a parameter segment header entry.
pub const SEGMENT_CODE_SUFFIX: &str = "SegHead.code";

/// A parameter segment entry advertised for one business function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSegmentKey<'a> {
    /// Full capability key.
    pub key: &'a str,
    /// Namespace component such as `Params_3`.
    pub namespace: &'a str,
    /// Raw version token embedded after `<function>Par`.
    pub version: &'a str,
}

/// Immutable snapshot of bank capability data.
///
/// # Example
///
/// ```
/// use fints_jobs::CapabilityData;
///
/// let caps = CapabilityData::from_entries([
///     ("Params_1.SaldoSEPAPar7.SegHead.code", "HISALS"),
/// ]);
/// assert!(caps.supports("SaldoSEPA"));
/// assert!(!caps.supports("Saldo"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityData {
    entries: Arc<BTreeMap<String, String>>,
}

impl CapabilityData {
    /// Builds a snapshot from key/value pairs.
    #[must_use]
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: Arc::new(map),
        }
    }

    /// Looks up a single entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the parameter segment header keys of `function`.
    ///
    /// Version tokens are returned raw; callers decide how to treat tokens
    /// that are not numeric.
    pub fn param_segments<'a>(
        &'a self,
        function: &'a str,
    ) -> impl Iterator<Item = ParamSegmentKey<'a>> + 'a {
        self.entries
            .keys()
            .filter_map(move |key| parse_param_segment(key, function))
    }

    /// Returns `true` when the bank advertises any numeric segment version
    /// for `function`.
    #[must_use]
    pub fn supports(&self, function: &str) -> bool {
        self.highest_param_segment(function).is_some()
    }

    /// Returns the restriction entries of the highest advertised segment
    /// version of `function`, keyed relative to `Par<function>.`.
    #[must_use]
    pub fn restrictions(&self, function: &str) -> BTreeMap<String, String> {
        let Some((version, namespace)) = self.highest_param_segment(function) else {
            return BTreeMap::new();
        };
        let prefix = format!("{namespace}.{function}Par{version}.Par{function}.");
        self.entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_owned(), value.clone()))
            })
            .collect()
    }

    fn highest_param_segment(&self, function: &str) -> Option<(u32, String)> {
        self.param_segments(function)
            .filter_map(|segment| {
                segment
                    .version
                    .parse::<u32>()
                    .ok()
                    .filter(|version| *version > 0)
                    .map(|version| (version, segment.namespace.to_owned()))
            })
            .max_by_key(|(version, _)| *version)
    }
}

fn parse_param_segment<'a>(key: &'a str, function: &str) -> Option<ParamSegmentKey<'a>> {
    if !key.starts_with(PARAMS_NAMESPACE) {
        return None;
    }
    let (namespace, rest) = key.split_once('.')?;
    let (version, tail) = rest
        .strip_prefix(function)?
        .strip_prefix("Par")?
        .split_once('.')?;
    (tail == SEGMENT_CODE_SUFFIX).then_some(ParamSegmentKey {
        key,
        namespace,
        version,
    })
}
