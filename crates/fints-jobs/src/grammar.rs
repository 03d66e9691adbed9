//! Seam to the wire grammar engine.
//!
//! Serialising a job into the bank's line-oriented syntax is the grammar
//! engine's business. The engine only needs to hand over the protocol name
//! and the flat lowlevel parameter set and receive either a validated field
//! tree or a structural error.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::path::FieldPath;

/// Structural validation failure reported by a [`Grammar`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StructuralError {
    message: String,
}

impl StructuralError {
    /// Creates an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A validated, serialisable job segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTree {
    protocol_name: String,
    fields: BTreeMap<FieldPath, String>,
}

impl FieldTree {
    /// Creates a tree for `protocol_name` holding `fields`.
    #[must_use]
    pub fn new(protocol_name: impl Into<String>, fields: BTreeMap<FieldPath, String>) -> Self {
        Self {
            protocol_name: protocol_name.into(),
            fields,
        }
    }

    /// Returns the protocol name the tree was built for.
    #[must_use]
    pub fn protocol_name(&self) -> &str {
        &self.protocol_name
    }

    /// Returns the validated fields.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<FieldPath, String> {
        &self.fields
    }
}

/// Builds and validates wire-level field trees.
pub trait Grammar {
    /// Builds the tree for `protocol_name` from qualified lowlevel
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError`] when the parameters do not form a valid
    /// segment.
    fn build(
        &self,
        protocol_name: &str,
        params: &BTreeMap<FieldPath, String>,
    ) -> Result<FieldTree, StructuralError>;
}
