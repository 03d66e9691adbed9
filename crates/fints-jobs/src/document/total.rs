//! Batch totals for multi-transaction documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::JobError;
use crate::path::FieldPath;

const ITEM_SEGMENT: &str = "btg";
const VALUE_FIELD: &str = "value";
const CURRENCY_FIELD: &str = "curr";

/// Summed amount of a batched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTotal {
    /// Sum of every line item amount.
    pub value: Decimal,
    /// Currency shared by every line item.
    pub currency: String,
}

impl BatchTotal {
    /// Side-table key of the total amount.
    #[must_use]
    pub fn value_key() -> FieldPath {
        FieldPath::from_names(["Total", "value"])
    }

    /// Side-table key of the total's currency.
    #[must_use]
    pub fn currency_key() -> FieldPath {
        FieldPath::from_names(["Total", "curr"])
    }
}

/// Sums the `btg[n].value` line items of a document side table.
///
/// An item without its own `btg[n].curr` uses the unindexed `btg.curr`.
/// The unindexed `btg.value` counts as the single item only when no indexed
/// item exists. Returns `None` when the table has no line items.
///
/// # Errors
///
/// Returns [`JobError::MixedCurrencyFailure`] when items use different
/// currencies and [`JobError::DocumentBuildFailure`] for unparsable amounts
/// or items without any currency.
pub fn batch_total(
    job: &str,
    params: &BTreeMap<FieldPath, String>,
) -> Result<Option<BatchTotal>, JobError> {
    let shared_currency = params.get(&FieldPath::from_names([ITEM_SEGMENT, CURRENCY_FIELD]));
    let indexed = params
        .keys()
        .filter_map(line_item)
        .any(|item| item.segments().iter().any(|segment| segment.index().is_some()));
    let mut total: Option<BatchTotal> = None;

    for (key, raw) in params {
        let Some(item) = line_item(key) else {
            continue;
        };
        if indexed && key.segments().iter().all(|segment| segment.index().is_none()) {
            continue;
        }
        let amount = raw
            .parse::<Decimal>()
            .map_err(|err| JobError::DocumentBuildFailure {
                job: job.to_owned(),
                message: format!("amount '{raw}' of '{key}' is not a decimal"),
                source: Some(Arc::new(err)),
            })?;
        let currency = params
            .get(&item.child(CURRENCY_FIELD))
            .or(shared_currency)
            .ok_or_else(|| JobError::document(job, format!("'{key}' has no currency")))?;

        total = Some(match total {
            None => BatchTotal {
                value: amount,
                currency: currency.clone(),
            },
            Some(running) if running.currency == *currency => BatchTotal {
                value: running.value.checked_add(amount).ok_or_else(|| {
                    JobError::document(job, "batch total overflows")
                })?,
                currency: running.currency,
            },
            Some(running) => {
                return Err(JobError::MixedCurrencyFailure {
                    job: job.to_owned(),
                    expected: running.currency,
                    found: currency.clone(),
                });
            }
        });
    }
    Ok(total)
}

/// Returns the item prefix (`btg[2]`) when `key` is a line item amount.
fn line_item(key: &FieldPath) -> Option<FieldPath> {
    match key.segments() {
        [item, field] if item.name() == ITEM_SEGMENT && field.name() == VALUE_FIELD => {
            let prefix = FieldPath::from_names([ITEM_SEGMENT]);
            Some(item.index().map_or_else(|| prefix.clone(), |index| prefix.with_index_at(0, index)))
        }
        _ => None,
    }
}
