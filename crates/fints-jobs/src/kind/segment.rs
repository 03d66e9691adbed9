//! Wire segment codes.

use std::fmt;

use serde::{Deserialize, Serialize};

const REQUEST_ROLE: char = 'K';
const RESPONSE_ROLE: char = 'I';

/// A segment code such as `HKCCS`.
///
/// The second character encodes the role: `K` for segments the customer
/// sends, `I` for segments the institution answers with. Matching a reply
/// line against a request therefore swaps that character.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentCode(String);

impl SegmentCode {
    /// Wraps a segment code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for institution (response) codes.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.0.chars().nth(1) == Some(RESPONSE_ROLE)
    }

    /// Returns the code with the request/response role swapped.
    ///
    /// Codes without a role character are returned unchanged.
    #[must_use]
    pub fn swap_role(&self) -> Self {
        let mut chars = self.0.chars();
        let (Some(first), Some(role)) = (chars.next(), chars.next()) else {
            return self.clone();
        };
        let swapped = match role {
            REQUEST_ROLE => RESPONSE_ROLE,
            RESPONSE_ROLE => REQUEST_ROLE,
            _ => return self.clone(),
        };
        Self(format!("{first}{swapped}{}", chars.as_str()))
    }

    /// Returns the institution code answering this code.
    #[must_use]
    pub fn response(&self) -> Self {
        if self.is_response() {
            self.clone()
        } else {
            self.swap_role()
        }
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SegmentCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}
