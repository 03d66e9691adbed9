//! Structured values set through one call with fan-out.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    value: Decimal,
    currency: String,
}

impl Amount {
    /// Creates an amount in `currency`.
    #[must_use]
    pub fn new(value: Decimal, currency: impl Into<String>) -> Self {
        Self {
            value,
            currency: currency.into(),
        }
    }

    /// Creates a Euro amount.
    #[must_use]
    pub fn eur(value: Decimal) -> Self {
        Self::new(value, "EUR")
    }

    /// Returns the value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the ISO currency code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// A bank account; every sub-field is optional.
///
/// Sub-fields left `None` are never written, so the request only carries
/// fields the caller actually knows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Country code of the bank.
    pub country: Option<String>,
    /// National bank code.
    pub bank_code: Option<String>,
    /// Account number.
    pub number: Option<String>,
    /// Account sub-number.
    pub subnumber: Option<String>,
    /// International bank account number.
    pub iban: Option<String>,
    /// Bank identifier code.
    pub bic: Option<String>,
    /// Account holder name.
    pub name: Option<String>,
}

impl Account {
    /// Creates an account known by IBAN and BIC.
    #[must_use]
    pub fn sepa(iban: impl Into<String>, bic: impl Into<String>) -> Self {
        Self {
            iban: Some(iban.into()),
            bic: Some(bic.into()),
            ..Self::default()
        }
    }

    /// Sets the holder name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the present sub-fields under their protocol names.
    pub(crate) fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("country", &self.country),
            ("blz", &self.bank_code),
            ("number", &self.number),
            ("subnumber", &self.subnumber),
            ("iban", &self.iban),
            ("bic", &self.bic),
            ("name", &self.name),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|present| (field, present)))
    }
}
