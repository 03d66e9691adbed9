//! Built-in transaction kinds.
//!
//! Each kind is data: its constraint table, document description and result
//! extraction. Item-indexed parameters of batch kinds count from 0; item 0
//! doubles as the fallback for the unindexed path.

use time::OffsetDateTime;

use crate::binder::ParamDefault::{self, Optional, Required};
use crate::correlate::ResponseSegment;
use crate::error::JobError;
use crate::kind::{DocumentSpec, TransactionKind, TransactionKindBuilder};
use crate::result::JobResult;
use crate::version::{DocumentFamily, DocumentVersion};

/// End-to-end reference used when the caller supplies none.
pub const NOT_PROVIDED: &str = "NOTPROVIDED";

/// SEPA credit transfer (`HKCCS`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn transfer() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("UebSEPA", "HKCCS");
    sepa_source(builder)
        .param("dst.bic", "sepa.dst.bic", Optional)
        .param("dst.iban", "sepa.dst.iban", Required)
        .param("dst.name", "sepa.dst.name", Required)
        .param("btg.value", "sepa.btg.value", Required)
        .param("btg.curr", "sepa.btg.curr", ParamDefault::value("EUR"))
        .param("usage", "sepa.usage", Optional)
        .param("endtoendid", "sepa.endtoendid", ParamDefault::value(NOT_PROVIDED))
        .param("purposecode", "sepa.purposecode", Optional)
        .param("date", "sepa.date", Optional)
        .document(credit_transfer("UebSEPA", false))
        .build()
}

/// SEPA batch credit transfer (`HKCCM`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn batch_transfer() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("SammelUebSEPA", "HKCCM");
    sepa_source(builder)
        .indexed_param("dst.bic", "sepa.dst.bic", Optional)
        .indexed_param("dst.iban", "sepa.dst.iban", Required)
        .indexed_param("dst.name", "sepa.dst.name", Required)
        .indexed_param("btg.value", "sepa.btg.value", Required)
        .indexed_param("btg.curr", "sepa.btg.curr", ParamDefault::value("EUR"))
        .indexed_param("usage", "sepa.usage", Optional)
        .indexed_param("endtoendid", "sepa.endtoendid", ParamDefault::value(NOT_PROVIDED))
        .param("batchbook", "sepa.batchbook", Optional)
        .param("Total.value", "Total.value", Required)
        .param("Total.curr", "Total.curr", Required)
        .document(credit_transfer("SammelUebSEPA", true))
        .build()
}

/// SEPA direct debit (`HKDSE`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn direct_debit() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("LastSEPA", "HKDSE");
    sepa_source(builder)
        .param("dst.bic", "sepa.dst.bic", Optional)
        .param("dst.iban", "sepa.dst.iban", Required)
        .param("dst.name", "sepa.dst.name", Required)
        .param("btg.value", "sepa.btg.value", Required)
        .param("btg.curr", "sepa.btg.curr", ParamDefault::value("EUR"))
        .param("usage", "sepa.usage", Optional)
        .param("endtoendid", "sepa.endtoendid", ParamDefault::value(NOT_PROVIDED))
        .param("creditorid", "sepa.creditorid", Required)
        .param("mandateid", "sepa.mandateid", Required)
        .param("manddateofsig", "sepa.manddateofsig", Required)
        .param("amendmandindic", "sepa.amendmandindic", ParamDefault::value("false"))
        .param("sequencetype", "sepa.sequencetype", ParamDefault::value("OOFF"))
        .param("type", "sepa.type", ParamDefault::value("CORE"))
        .param("targetdate", "sepa.targetdate", Required)
        .document(DocumentSpec {
            function: String::from("LastSEPA"),
            family: DocumentFamily::DirectDebit,
            default_version: DocumentVersion::PAIN_008_001_02,
            batch: false,
        })
        .build()
}

/// SEPA standing order creation (`HKCDE`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn standing_order() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("DauerSEPANew", "HKCDE");
    sepa_source(builder)
        .param("dst.bic", "sepa.dst.bic", Optional)
        .param("dst.iban", "sepa.dst.iban", Required)
        .param("dst.name", "sepa.dst.name", Required)
        .param("btg.value", "sepa.btg.value", Required)
        .param("btg.curr", "sepa.btg.curr", ParamDefault::value("EUR"))
        .param("usage", "sepa.usage", Optional)
        .param("endtoendid", "sepa.endtoendid", ParamDefault::value(NOT_PROVIDED))
        .param("firstdate", "DauerDetails.firstdate", Required)
        .param("timeunit", "DauerDetails.timeunit", ParamDefault::value("M"))
        .param("turnus", "DauerDetails.turnus", ParamDefault::value("1"))
        .param("execday", "DauerDetails.execday", Required)
        .param("lastdate", "DauerDetails.lastdate", Optional)
        .document(credit_transfer("DauerSEPANew", false))
        .extractor(|result, segment, _| {
            copy_field(result, segment, "orderid", "orderid");
            Ok(())
        })
        .build()
}

/// Account balance (`HKSAL`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn balance() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("SaldoSEPA", "HKSAL");
    account_query(builder)
        .extractor(|result, segment, _| {
            copy_field(result, segment, "BookedBal.BTG.value", "saldo.value");
            copy_field(result, segment, "BookedBal.BTG.curr", "saldo.curr");
            copy_field(result, segment, "BookedBal.CreditDebit", "saldo.sign");
            copy_field(result, segment, "PendingBal.BTG.value", "pending.value");
            Ok(())
        })
        .build()
}

/// Account statement for a date range (`HKKAZ`).
///
/// Booked and pending turnover is concatenated across every segment the
/// job receives, including continuation rounds.
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn statement() -> Result<TransactionKind, JobError> {
    let builder = TransactionKind::builder("KUmsZeit", "HKKAZ");
    account_query(builder)
        .param("startdate", "startdate", Optional)
        .param("enddate", "enddate", Optional)
        .extractor(|result, segment, _| {
            append_field(result, segment, "booked");
            append_field(result, segment, "notbooked");
            Ok(())
        })
        .build()
}

/// Two-step authentication (`HKTAN`).
///
/// # Errors
///
/// Returns [`JobError::InvalidFieldPath`] if a declaration is malformed.
pub fn tan_step() -> Result<TransactionKind, JobError> {
    TransactionKind::builder("TAN2Step", "HKTAN")
        .param("process", "process", Required)
        .param("ordersegcode", "ordersegcode", Optional)
        .param("orderhash", "orderhash", Optional)
        .param("orderref", "orderref", Optional)
        .param("notlasttan", "notlasttan", Optional)
        .param("challengeklass", "challengeklass", Optional)
        .param("tanmedia", "tanmedia", Optional)
        .build()
}

/// Every built-in kind.
///
/// # Errors
///
/// Returns the first declaration error.
pub fn all() -> Result<Vec<TransactionKind>, JobError> {
    [
        transfer,
        batch_transfer,
        direct_debit,
        standing_order,
        balance,
        statement,
        tan_step,
    ]
    .into_iter()
    .map(|build| build())
    .collect()
}

fn credit_transfer(function: &str, batch: bool) -> DocumentSpec {
    DocumentSpec {
        function: function.to_owned(),
        family: DocumentFamily::CreditTransfer,
        default_version: DocumentVersion::PAIN_001_001_03,
        batch,
    }
}

/// Ordering account, fanned out to the segment and the document.
fn sepa_source(builder: TransactionKindBuilder) -> TransactionKindBuilder {
    let message_id = message_id();
    builder
        .param("src.iban", "My.iban", Required)
        .param("src.iban", "sepa.src.iban", Required)
        .param("src.bic", "My.bic", Required)
        .param("src.bic", "sepa.src.bic", Required)
        .param("src.name", "sepa.src.name", Required)
        .param("sepaid", "sepa.sepaid", ParamDefault::value(message_id.as_str()))
        .param("pmtinfid", "sepa.pmtinfid", ParamDefault::value(message_id))
}

fn account_query(builder: TransactionKindBuilder) -> TransactionKindBuilder {
    builder
        .param("my.iban", "KTV.iban", Required)
        .param("my.bic", "KTV.bic", Required)
        .param("my.country", "KTV.KIK.country", ParamDefault::value("DE"))
        .param("my.blz", "KTV.KIK.blz", Optional)
        .param("my.number", "KTV.number", Optional)
        .param("my.subnumber", "KTV.subnumber", Optional)
        .param("allaccounts", "allaccounts", ParamDefault::value("N"))
        .param("maxentries", "maxentries", Optional)
        .param("offset", "offset", Optional)
}

/// Time-based message identifier, unique per millisecond.
fn message_id() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}{:03}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond()
    )
}

fn copy_field(result: &mut JobResult, segment: &ResponseSegment, from: &str, to: &str) {
    if let Some(value) = segment.get(from) {
        result.store(to, value);
    }
}

fn append_field(result: &mut JobResult, segment: &ResponseSegment, field: &str) {
    let Some(value) = segment.get(field) else {
        return;
    };
    let combined = format!("{}{value}", result.get(field).unwrap_or_default());
    result.store(field, combined);
}
