//! Unit tests for the parameter binder.

use rstest::{fixture, rstest};

use super::*;

fn path(input: &str) -> FieldPath {
    FieldPath::parse(input).expect("valid path")
}

fn lowlevel<'a>(binder: &'a ParameterBinder, relative: &str) -> Option<&'a str> {
    binder.lowlevel_value(&path(relative))
}

#[fixture]
fn transfer() -> ParameterBinder {
    let mut binder = ParameterBinder::new("UebSEPA", "UebSEPA1");
    binder.declare("src.iban", &path("My.iban"), ParamDefault::Required, false);
    binder.declare("usage", &path("usage.usage"), ParamDefault::Optional, true);
    binder.declare("type", &path("KIDetails.type"), ParamDefault::value("51"), false);
    binder.declare("btg.value", &path("sepa.btg.value"), ParamDefault::Required, true);
    binder.declare("pmtinfid", &path("sepa.pmtinfid"), ParamDefault::value("P1"), false);
    binder
}

// ---- set ----

#[rstest]
fn set_writes_qualified_lowlevel_key(mut transfer: ParameterBinder) {
    transfer.set("src.iban", None, "DE1234").expect("set");
    assert_eq!(lowlevel(&transfer, "My.iban"), Some("DE1234"));
    assert!(transfer.lowlevel().contains_key(&path("UebSEPA1.My.iban")));
}

#[rstest]
fn unknown_names_are_rejected(mut transfer: ParameterBinder) {
    let err = transfer.set("dst.iban", None, "DE1").expect_err("unknown");
    assert!(matches!(
        err,
        JobError::UnknownParameter { ref job, ref name } if job == "UebSEPA" && name == "dst.iban"
    ));
}

#[rstest]
fn empty_values_are_rejected(mut transfer: ParameterBinder) {
    let err = transfer.set("src.iban", None, "").expect_err("empty");
    assert!(matches!(err, JobError::EmptyValue { .. }));
}

#[rstest]
#[case::plain_value("DE1234")]
#[case::other_value("x")]
#[case::empty_value("")]
fn index_on_plain_constraint_is_rejected(mut transfer: ParameterBinder, #[case] value: &str) {
    let err = transfer.set("src.iban", Some(1), value).expect_err("not indexable");
    assert!(matches!(err, JobError::NotIndexable { ref name, .. } if name == "src.iban"));
    assert!(transfer.lowlevel().is_empty());
}

#[rstest]
fn index_lands_in_first_relative_segment(mut transfer: ParameterBinder) {
    transfer.set("usage", Some(2), "rent").expect("set");
    assert_eq!(lowlevel(&transfer, "usage[2].usage"), Some("rent"));
}

#[test]
fn fan_out_writes_every_mapped_path() {
    let mut binder = ParameterBinder::new("Saldo", "Saldo5");
    for target in ["My.number", "Acc.number", "Other.number"] {
        binder.declare("my.number", &path(target), ParamDefault::Required, false);
    }
    binder.set("my.number", None, "1234567").expect("set");
    for target in ["My.number", "Acc.number", "Other.number"] {
        assert_eq!(lowlevel(&binder, target), Some("1234567"));
    }
}

// ---- document side table ----

#[rstest]
fn document_params_bypass_lowlevel_set(mut transfer: ParameterBinder) {
    transfer.set("btg.value", Some(1), "10.00").expect("set");
    assert_eq!(
        transfer.document_params().get(&path("btg[1].value")).map(String::as_str),
        Some("10.00")
    );
    assert!(transfer.lowlevel().keys().all(|key| key.to_string() != "UebSEPA1.sepa.btg[1].value"));
}

#[rstest]
fn document_defaults_are_seeded_at_declaration(transfer: ParameterBinder) {
    assert_eq!(
        transfer.document_params().get(&path("pmtinfid")).map(String::as_str),
        Some("P1")
    );
    assert!(!transfer.document_params().contains_key(&path("btg.value")));
}

// ---- verify ----

#[rstest]
fn verify_applies_defaults_and_skips_optional(mut transfer: ParameterBinder) {
    transfer.set("src.iban", None, "DE1234").expect("set");
    transfer.set("btg.value", None, "5.00").expect("set");
    let resolution = transfer.verify().expect("verified");

    assert_eq!(lowlevel(&transfer, "KIDetails.type"), Some("51"));
    assert_eq!(lowlevel(&transfer, "usage.usage"), None);
    assert_eq!(resolution.get("usage.usage"), Some(""));
    assert_eq!(resolution.get("My.iban"), Some("DE1234"));
    assert_eq!(resolution.get("sepa.pmtinfid"), Some("P1"));
    assert_eq!(resolution.len(), 5);
}

#[rstest]
fn missing_required_parameter_names_public_key(mut transfer: ParameterBinder) {
    transfer.set("btg.value", None, "5.00").expect("set");
    let err = transfer.verify().expect_err("missing");
    assert!(matches!(
        err,
        JobError::MissingRequiredParameter { ref job, ref name } if job == "UebSEPA" && name == "src.iban"
    ));
}

#[rstest]
fn indexable_constraint_falls_back_to_first_item(mut transfer: ParameterBinder) {
    transfer.set("src.iban", None, "DE1234").expect("set");
    transfer.set("btg.value", Some(0), "7.00").expect("set");
    let resolution = transfer.verify().expect("verified");
    assert_eq!(resolution.get("sepa.btg.value"), Some("7.00"));
}

#[rstest]
fn explicit_value_is_not_overwritten_by_default(mut transfer: ParameterBinder) {
    transfer.set("src.iban", None, "DE1234").expect("set");
    transfer.set("btg.value", None, "5.00").expect("set");
    transfer.set("type", None, "53").expect("set");
    transfer.verify().expect("verified");
    assert_eq!(lowlevel(&transfer, "KIDetails.type"), Some("53"));
}

// ---- direct access and rebasing ----

#[rstest]
fn accepts_reports_declared_names(transfer: ParameterBinder) {
    assert!(transfer.accepts("usage"));
    assert!(!transfer.accepts("offset"));
}

#[rstest]
fn lowlevel_writes_bypass_constraints(mut transfer: ParameterBinder) {
    transfer.set_lowlevel(&path("sepadescr"), "urn:x");
    assert_eq!(lowlevel(&transfer, "sepadescr"), Some("urn:x"));
}

#[rstest]
fn rebased_moves_roots_and_keeps_values(mut transfer: ParameterBinder) {
    transfer.set("src.iban", None, "DE1234").expect("set");
    transfer.set("btg.value", None, "5.00").expect("set");
    let moved = transfer.rebased("UebSEPA2");

    assert_eq!(moved.root(), "UebSEPA2");
    assert_eq!(lowlevel(&moved, "My.iban"), Some("DE1234"));
    assert!(moved.lowlevel().contains_key(&path("UebSEPA2.My.iban")));
    assert!(
        moved
            .constraints()
            .iter()
            .all(|constraint| constraint.path().to_string().starts_with("UebSEPA2."))
    );
    assert_eq!(moved.document_params(), transfer.document_params());
}

#[rstest]
fn rebasing_to_same_root_changes_nothing(transfer: ParameterBinder) {
    assert_eq!(transfer.rebased("UebSEPA1"), transfer);
}
