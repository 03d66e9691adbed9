//! Constraint-based parameter binding.
//!
//! A [`ParameterBinder`] owns one job's constraint table together with its
//! lowlevel parameter set and the document side table. Public parameter
//! names map to one or more protocol field paths (fan-out); each mapping
//! carries a [`ParamDefault`] and an indexable flag.
//!
//! Constraint paths and lowlevel keys are stored fully qualified, rooted at
//! the job's protocol name (`UebSEPA1.My.iban`). Paths below the document
//! namespace (`sepa.`) never reach the lowlevel set; their values live in a
//! side table keyed by the suffix (`btg.value`), which the document
//! generator consumes.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::JobError;
use crate::path::FieldPath;

/// Tracing target for parameter binding.
const BINDER_TARGET: &str = "fints_jobs::binder";

/// Leading path segment of constraints routed to the document side table.
pub const DOCUMENT_NAMESPACE: &str = "sepa";

/// Default of one constraint mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamDefault {
    /// Verification fails unless a value is set.
    Required,
    /// Omitted from the request when absent.
    Optional,
    /// Written at verification time when nothing was set.
    Value(String),
}

impl ParamDefault {
    /// Builds a [`ParamDefault::Value`].
    #[must_use]
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    fn content(&self) -> Option<&str> {
        match self {
            Self::Required => None,
            Self::Optional => Some(""),
            Self::Value(value) => Some(value),
        }
    }
}

/// One declared mapping from a public name to a protocol field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    name: String,
    path: FieldPath,
    default: ParamDefault,
    indexable: bool,
}

impl Constraint {
    /// Returns the public parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fully qualified protocol path.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the declared default.
    #[must_use]
    pub const fn default_value(&self) -> &ParamDefault {
        &self.default
    }

    /// Returns `true` when the mapping accepts an item index.
    #[must_use]
    pub const fn indexable(&self) -> bool {
        self.indexable
    }
}

/// Where a constraint's value is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Lowlevel(FieldPath),
    Document(FieldPath),
}

/// Resolved content of every constrained path after verification.
///
/// Optional parameters that were never set resolve to an empty string here
/// without being written to the lowlevel set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    root: String,
    values: BTreeMap<FieldPath, String>,
}

impl Resolution {
    /// Looks up a value by job-relative path such as `My.iban`.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&str> {
        let path = FieldPath::parse(relative).ok()?.under(&self.root);
        self.values.get(&path).map(String::as_str)
    }

    /// Iterates over qualified paths and their resolved content.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &str)> + '_ {
        self.values
            .iter()
            .map(|(path, value)| (path, value.as_str()))
    }

    /// Returns the number of resolved paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no constraint was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Constraint table and parameter storage of a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinder {
    job: String,
    root: String,
    constraints: Vec<Constraint>,
    lowlevel: BTreeMap<FieldPath, String>,
    document: BTreeMap<FieldPath, String>,
}

impl ParameterBinder {
    /// Creates an empty binder for business function `job` whose protocol
    /// name is `root`.
    #[must_use]
    pub fn new(job: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            root: root.into(),
            constraints: Vec::new(),
            lowlevel: BTreeMap::new(),
            document: BTreeMap::new(),
        }
    }

    /// Returns the business function name used in errors.
    #[must_use]
    pub fn job(&self) -> &str {
        &self.job
    }

    /// Returns the protocol name every path is rooted at.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Appends a mapping from `name` to the job-relative `path`.
    ///
    /// Document-namespace mappings with a non-required default seed the side
    /// table immediately, because the document is generated before ordinary
    /// defaulting runs.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        path: &FieldPath,
        default: ParamDefault,
        indexable: bool,
    ) {
        let qualified = path.under(&self.root);
        if let (Slot::Document(key), Some(content)) =
            (self.slot_of(&qualified), default.content())
        {
            self.document.insert(key, content.to_owned());
        }
        self.constraints.push(Constraint {
            name: name.into(),
            path: qualified,
            default,
            indexable,
        });
    }

    /// Returns `true` when `name` is declared.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.constraints.iter().any(|constraint| constraint.name == name)
    }

    /// Returns the declared constraints in declaration order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Stores `value` at every path mapped to `name`.
    ///
    /// With an index, `[index]` is attached to the first job-relative path
    /// segment (the first segment after `sepa.` for document parameters).
    ///
    /// # Errors
    ///
    /// Returns [`JobError::UnknownParameter`] for undeclared names,
    /// [`JobError::NotIndexable`] when an index is given for a mapping not
    /// declared indexable (whatever the value) and [`JobError::EmptyValue`]
    /// for empty values. Nothing is written on error.
    pub fn set(&mut self, name: &str, index: Option<u32>, value: &str) -> Result<(), JobError> {
        let targets: Vec<(FieldPath, bool)> = self
            .constraints
            .iter()
            .filter(|constraint| constraint.name == name)
            .map(|constraint| (constraint.path.clone(), constraint.indexable))
            .collect();
        if targets.is_empty() {
            return Err(JobError::UnknownParameter {
                job: self.job.clone(),
                name: name.to_owned(),
            });
        }
        if index.is_some() && targets.iter().any(|(_, indexable)| !indexable) {
            return Err(JobError::NotIndexable {
                job: self.job.clone(),
                name: name.to_owned(),
            });
        }
        if value.is_empty() {
            return Err(JobError::EmptyValue {
                job: self.job.clone(),
                name: name.to_owned(),
            });
        }
        for (path, _) in targets {
            let slot = index.map_or_else(
                || self.slot_of(&path),
                |item| self.slot_of(&path).with_index(item),
            );
            debug!(target: BINDER_TARGET, job = self.job.as_str(), param = name, "storing parameter");
            self.write(slot, value.to_owned());
        }
        Ok(())
    }

    /// Resolves every constraint, writing non-empty defaults that were never
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingRequiredParameter`] naming the public key
    /// of the first required constraint without a value.
    pub fn verify(&mut self) -> Result<Resolution, JobError> {
        let mut values = BTreeMap::new();
        let constraints = self.constraints.clone();
        for constraint in &constraints {
            let slot = self.slot_of(&constraint.path);
            let mut given = self.read(&slot).map(str::to_owned);
            if constraint.indexable && given.as_deref().is_none_or(str::is_empty) {
                given = self
                    .read(&slot.with_index(0))
                    .map(str::to_owned)
                    .or(given);
            }
            let content = match given.as_deref() {
                Some(value) if !value.is_empty() => Some(value.to_owned()),
                _ => constraint.default.content().map(str::to_owned),
            };
            let Some(content) = content else {
                return Err(JobError::MissingRequiredParameter {
                    job: self.job.clone(),
                    name: constraint.name.clone(),
                });
            };
            if given.is_none() && !content.is_empty() {
                debug!(
                    target: BINDER_TARGET,
                    job = self.job.as_str(),
                    param = constraint.name.as_str(),
                    "applying default"
                );
                self.write(slot, content.clone());
            }
            values.insert(constraint.path.clone(), content);
        }
        Ok(Resolution {
            root: self.root.clone(),
            values,
        })
    }

    /// Writes a protocol field directly, bypassing the constraint table.
    pub fn set_lowlevel(&mut self, relative: &FieldPath, value: impl Into<String>) {
        self.lowlevel.insert(relative.under(&self.root), value.into());
    }

    /// Reads a protocol field by job-relative path.
    #[must_use]
    pub fn lowlevel_value(&self, relative: &FieldPath) -> Option<&str> {
        self.lowlevel
            .get(&relative.under(&self.root))
            .map(String::as_str)
    }

    /// Returns the lowlevel parameter set keyed by qualified path.
    #[must_use]
    pub const fn lowlevel(&self) -> &BTreeMap<FieldPath, String> {
        &self.lowlevel
    }

    /// Writes a document parameter directly, keyed relative to `sepa.`.
    pub fn set_document_param(&mut self, key: FieldPath, value: impl Into<String>) {
        self.document.insert(key, value.into());
    }

    /// Returns the document side table.
    #[must_use]
    pub const fn document_params(&self) -> &BTreeMap<FieldPath, String> {
        &self.document
    }

    /// Returns a copy whose paths are rooted at `new_root` instead.
    ///
    /// Only paths rooted at the current protocol name move; suffixes, values
    /// and the document side table are untouched.
    #[must_use]
    pub fn rebased(&self, new_root: &str) -> Self {
        let rebase = |path: &FieldPath| {
            path.rebased(&self.root, new_root)
                .unwrap_or_else(|| path.clone())
        };
        Self {
            job: self.job.clone(),
            root: new_root.to_owned(),
            constraints: self
                .constraints
                .iter()
                .map(|constraint| Constraint {
                    path: rebase(&constraint.path),
                    ..constraint.clone()
                })
                .collect(),
            lowlevel: self
                .lowlevel
                .iter()
                .map(|(path, value)| (rebase(path), value.clone()))
                .collect(),
            document: self.document.clone(),
        }
    }

    fn slot_of(&self, qualified: &FieldPath) -> Slot {
        let namespace = FieldPath::from_names([self.root.as_str(), DOCUMENT_NAMESPACE]);
        qualified
            .strip_prefix(&namespace)
            .map_or_else(|| Slot::Lowlevel(qualified.clone()), Slot::Document)
    }

    fn read(&self, slot: &Slot) -> Option<&str> {
        match slot {
            Slot::Lowlevel(path) => self.lowlevel.get(path),
            Slot::Document(key) => self.document.get(key),
        }
        .map(String::as_str)
    }

    fn write(&mut self, slot: Slot, value: String) {
        match slot {
            Slot::Lowlevel(path) => self.lowlevel.insert(path, value),
            Slot::Document(key) => self.document.insert(key, value),
        };
    }
}

impl Slot {
    fn with_index(&self, index: u32) -> Self {
        match self {
            Self::Lowlevel(path) => Self::Lowlevel(path.with_index_at(1, index)),
            Self::Document(key) => Self::Document(key.with_index_at(0, index)),
        }
    }
}

#[cfg(test)]
mod tests;
