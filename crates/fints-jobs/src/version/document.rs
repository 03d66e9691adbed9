//! Payment-instruction document schema identifiers.

use std::cmp::Ordering;
use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// Schema family of a generated payment-instruction document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, IntoStaticStr,
)]
pub enum DocumentFamily {
    /// `pain.001` credit transfer initiation.
    #[strum(serialize = "001")]
    CreditTransfer,
    /// `pain.008` direct debit initiation.
    #[strum(serialize = "008")]
    DirectDebit,
}

/// A known document schema version.
///
/// Versions order by recency within their family, which is not the numeric
/// order of their identifiers: the German `pain.001.003.03` predates the
/// ISO `pain.001.001.03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentVersion {
    family: DocumentFamily,
    variant: u16,
    revision: u16,
}

/// Every version the engine knows, oldest first within each family.
const KNOWN: [DocumentVersion; 12] = [
    DocumentVersion::new(DocumentFamily::CreditTransfer, 1, 2),
    DocumentVersion::new(DocumentFamily::CreditTransfer, 2, 2),
    DocumentVersion::new(DocumentFamily::CreditTransfer, 2, 3),
    DocumentVersion::new(DocumentFamily::CreditTransfer, 3, 3),
    DocumentVersion::new(DocumentFamily::CreditTransfer, 1, 3),
    DocumentVersion::new(DocumentFamily::CreditTransfer, 1, 9),
    DocumentVersion::new(DocumentFamily::DirectDebit, 1, 1),
    DocumentVersion::new(DocumentFamily::DirectDebit, 2, 1),
    DocumentVersion::new(DocumentFamily::DirectDebit, 2, 2),
    DocumentVersion::new(DocumentFamily::DirectDebit, 3, 2),
    DocumentVersion::new(DocumentFamily::DirectDebit, 1, 2),
    DocumentVersion::new(DocumentFamily::DirectDebit, 1, 8),
];

const ISO_URN_PREFIX: &str = "urn:iso:std:iso:20022:tech:xsd:";
const SWIFT_URN_PREFIX: &str = "urn:swift:xsd:$";

impl DocumentVersion {
    /// `pain.001.001.03`, the long-standing credit transfer default.
    pub const PAIN_001_001_03: Self = Self::new(DocumentFamily::CreditTransfer, 1, 3);
    /// `pain.001.001.09`.
    pub const PAIN_001_001_09: Self = Self::new(DocumentFamily::CreditTransfer, 1, 9);
    /// `pain.001.003.03`.
    pub const PAIN_001_003_03: Self = Self::new(DocumentFamily::CreditTransfer, 3, 3);
    /// `pain.008.001.02`, the long-standing direct debit default.
    pub const PAIN_008_001_02: Self = Self::new(DocumentFamily::DirectDebit, 1, 2);
    /// `pain.008.001.08`.
    pub const PAIN_008_001_08: Self = Self::new(DocumentFamily::DirectDebit, 1, 8);
    /// `pain.008.003.02`.
    pub const PAIN_008_003_02: Self = Self::new(DocumentFamily::DirectDebit, 3, 2);

    const fn new(family: DocumentFamily, variant: u16, revision: u16) -> Self {
        Self {
            family,
            variant,
            revision,
        }
    }

    /// Returns the known version with the given identifier parts.
    #[must_use]
    pub fn known(family: DocumentFamily, variant: u16, revision: u16) -> Option<Self> {
        let candidate = Self::new(family, variant, revision);
        KNOWN.contains(&candidate).then_some(candidate)
    }

    /// Iterates over all known versions, oldest first within each family.
    pub fn all() -> impl Iterator<Item = Self> {
        KNOWN.into_iter()
    }

    /// Extracts a known version from a schema URN or file name.
    ///
    /// Accepts the ISO (`urn:iso:std:iso:20022:tech:xsd:pain.001.001.03`),
    /// SWIFT (`urn:swift:xsd:$pain.001.002.02`) and file-name
    /// (`sepade.pain.001.001.03.xsd`) spellings.
    #[must_use]
    pub fn from_urn(urn: &str) -> Option<Self> {
        let (_, tail) = urn.split_once("pain.")?;
        let mut parts = tail.splitn(4, '.');
        let family = parts.next()?.parse::<DocumentFamily>().ok()?;
        let variant = parse_part(parts.next()?)?;
        let revision = parse_part(parts.next()?)?;
        match parts.next() {
            None | Some("xsd") => Self::known(family, variant, revision),
            Some(_) => None,
        }
    }

    /// Returns the schema family.
    #[must_use]
    pub const fn family(self) -> DocumentFamily {
        self.family
    }

    /// Returns the canonical schema URN announced alongside the document.
    #[must_use]
    pub fn urn(self) -> String {
        let prefix = if self.variant == 2 && self.revision == 2 {
            SWIFT_URN_PREFIX
        } else {
            ISO_URN_PREFIX
        };
        format!("{prefix}{self}")
    }

    fn rank(self) -> usize {
        KNOWN
            .iter()
            .position(|known| *known == self)
            .unwrap_or(usize::MAX)
    }
}

fn parse_part(token: &str) -> Option<u16> {
    (token.len() == 3 || token.len() == 2)
        .then(|| token.parse::<u16>().ok())
        .flatten()
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pain.{}.{:03}.{:02}",
            self.family, self.variant, self.revision
        )
    }
}

impl PartialOrd for DocumentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocumentVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family
            .cmp(&other.family)
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}
