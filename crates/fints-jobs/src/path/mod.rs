//! Typed protocol field paths.
//!
//! Protocol fields are addressed by dotted paths such as
//! `UebSEPA1.My.iban` or `btg[2].value`. A [`FieldPath`] holds the parsed
//! segments so index insertion and root rewrites are structural operations
//! rather than string surgery. The canonical rendering is the [`Display`]
//! implementation; [`FieldPath::parse`] is its inverse.
//!
//! [`Display`]: std::fmt::Display

use std::fmt;
use std::str::FromStr;

use crate::error::JobError;

/// One dot-separated token of a [`FieldPath`], optionally indexed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathSegment {
    name: String,
    index: Option<u32>,
}

impl PathSegment {
    /// Creates an unindexed segment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// Returns the segment name without its index.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the item index, if any.
    #[must_use]
    pub const fn index(&self) -> Option<u32> {
        self.index
    }

    fn parse(token: &str, whole: &str) -> Result<Self, JobError> {
        let invalid = |message: &str| JobError::InvalidFieldPath {
            path: whole.to_owned(),
            message: message.to_owned(),
        };
        let Some((name, rest)) = token.split_once('[') else {
            if token.is_empty() {
                return Err(invalid("empty segment"));
            }
            if token.contains(']') {
                return Err(invalid("unbalanced ']'"));
            }
            return Ok(Self::new(token));
        };
        if name.is_empty() {
            return Err(invalid("index without segment name"));
        }
        let digits = rest
            .strip_suffix(']')
            .ok_or_else(|| invalid("index must close with ']' at segment end"))?;
        let index = digits
            .parse::<u32>()
            .map_err(|_| invalid("index must be a non-negative integer"))?;
        Ok(Self {
            name: name.to_owned(),
            index: Some(index),
        })
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// An ordered list of path segments addressing one protocol field.
///
/// # Example
///
/// ```
/// use fints_jobs::FieldPath;
///
/// let path = FieldPath::parse("sepa.btg.value").expect("valid path");
/// let suffix = path.strip_prefix(&FieldPath::parse("sepa").expect("valid"));
/// let indexed = suffix.expect("has prefix").with_index_at(0, 2);
/// assert_eq!(indexed.to_string(), "btg[2].value");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses the canonical dotted rendering.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidFieldPath`] for empty input, empty
    /// segments, or malformed `[index]` suffixes.
    pub fn parse(input: &str) -> Result<Self, JobError> {
        if input.is_empty() {
            return Err(JobError::InvalidFieldPath {
                path: String::new(),
                message: String::from("path is empty"),
            });
        }
        let segments = input
            .split('.')
            .map(|token| PathSegment::parse(token, input))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Builds a path from unindexed segment names.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: names.into_iter().map(PathSegment::new).collect(),
        }
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the path with no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a copy of this path beneath a new leading segment.
    #[must_use]
    pub fn under(&self, root: &str) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len().saturating_add(1));
        segments.push(PathSegment::new(root));
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// Returns a copy with `name` appended as the last segment.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::new(name));
        Self { segments }
    }

    /// Returns `true` when `prefix` matches this path's leading segments.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Returns the remainder after `prefix`, or `None` when the prefix does
    /// not match or nothing remains.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        let rest = self.segments.strip_prefix(prefix.segments.as_slice())?;
        if rest.is_empty() {
            return None;
        }
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns a copy with `index` attached to the segment at `position`.
    ///
    /// Positions past the end leave the path unchanged.
    #[must_use]
    pub fn with_index_at(&self, position: usize, index: u32) -> Self {
        let mut copy = self.clone();
        if let Some(segment) = copy.segments.get_mut(position) {
            segment.index = Some(index);
        }
        copy
    }

    /// Returns a copy whose first segment is renamed from `old_root` to
    /// `new_root`, or `None` when the path is not rooted at `old_root`.
    #[must_use]
    pub fn rebased(&self, old_root: &str, new_root: &str) -> Option<Self> {
        let first = self.segments.first()?;
        if first.name != old_root || first.index.is_some() {
            return None;
        }
        let mut copy = self.clone();
        if let Some(segment) = copy.segments.first_mut() {
            segment.name = new_root.to_owned();
        }
        Some(copy)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = JobError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

#[cfg(test)]
mod tests;
