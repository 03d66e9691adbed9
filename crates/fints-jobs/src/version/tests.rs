//! Unit tests for version negotiation.

use rstest::{fixture, rstest};

use super::*;

const ISO_001_001_03: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03";
const ISO_001_001_09: &str = "urn:iso:std:iso:20022:tech:xsd:pain.001.001.09";
const DK_001_003_03: &str = "sepade.pain.001.003.03.xsd";

fn segment_caps(versions: &[&str]) -> CapabilityData {
    CapabilityData::from_entries(versions.iter().enumerate().map(|(slot, version)| {
        (
            format!("Params_{slot}.UebSEPAPar{version}.SegHead.code"),
            String::from("HICCSS"),
        )
    }))
}

// ---- segment versions ----

#[test]
fn highest_segment_version_wins() {
    let caps = segment_caps(&["3", "5", "2"]);
    assert_eq!(resolve_segment_version("UebSEPA", &caps).expect("supported"), 5);
}

#[test]
fn no_matching_keys_is_fatal() {
    let caps = segment_caps(&["3"]);
    let err = resolve_segment_version("LastSEPA", &caps).expect_err("unsupported");
    assert!(matches!(err, JobError::FunctionNotSupported { ref job } if job == "LastSEPA"));
    assert!(err.is_capability_gap());
}

#[test]
fn non_numeric_versions_are_skipped() {
    let caps = segment_caps(&["x", "4"]);
    assert_eq!(resolve_segment_version("UebSEPA", &caps).expect("supported"), 4);
}

#[test]
fn only_non_numeric_versions_is_unsupported() {
    let caps = segment_caps(&["x"]);
    assert!(resolve_segment_version("UebSEPA", &caps).is_err());
}

// ---- document versions ----

const SUPPORTED: [DocumentVersion; 3] = [
    DocumentVersion::PAIN_001_003_03,
    DocumentVersion::PAIN_001_001_03,
    DocumentVersion::PAIN_001_001_09,
];

#[fixture]
fn negotiation() -> DocumentNegotiation<'static> {
    DocumentNegotiation {
        function: "UebSEPA",
        family: DocumentFamily::CreditTransfer,
        supported: &SUPPORTED,
        fallback: DocumentVersion::PAIN_001_001_03,
        policy: DocumentVersionPolicy::Fallback,
    }
}

fn document_caps(global: &[&str], specific: &[&str]) -> CapabilityData {
    let mut entries = vec![
        (
            String::from("Params_1.SEPAInfoPar1.SegHead.code"),
            String::from("HISPAS"),
        ),
        (
            String::from("Params_2.UebSEPAPar1.SegHead.code"),
            String::from("HICCSS"),
        ),
    ];
    for (slot, urn) in global.iter().enumerate() {
        entries.push((
            format!("Params_1.SEPAInfoPar1.ParSEPAInfo.suppformats_{slot}"),
            (*urn).to_owned(),
        ));
    }
    for (slot, urn) in specific.iter().enumerate() {
        entries.push((
            format!("Params_2.UebSEPAPar1.ParUebSEPA.suppformats_{slot}"),
            (*urn).to_owned(),
        ));
    }
    CapabilityData::from_entries(entries)
}

#[rstest]
fn function_specific_version_wins(negotiation: DocumentNegotiation<'static>) {
    let caps = document_caps(&[ISO_001_001_09], &[DK_001_003_03]);
    let version = resolve_document_version(&caps, &negotiation).expect("resolved");
    assert_eq!(version, DocumentVersion::PAIN_001_003_03);
}

#[rstest]
fn global_version_used_without_specific(negotiation: DocumentNegotiation<'static>) {
    let caps = document_caps(&[DK_001_003_03, ISO_001_001_09, ISO_001_001_03], &[]);
    let version = resolve_document_version(&caps, &negotiation).expect("resolved");
    assert_eq!(version, DocumentVersion::PAIN_001_001_09);
}

#[rstest]
fn unsupported_and_foreign_versions_are_filtered(negotiation: DocumentNegotiation<'static>) {
    let caps = document_caps(
        &[
            "urn:iso:std:iso:20022:tech:xsd:pain.008.001.08",
            "urn:swift:xsd:$pain.001.002.02",
            "urn:iso:std:iso:20022:tech:xsd:camt.052.001.02",
        ],
        &[],
    );
    let version = resolve_document_version(&caps, &negotiation).expect("fallback");
    assert_eq!(version, DocumentVersion::PAIN_001_001_03);
}

#[rstest]
fn fallback_applies_when_nothing_is_advertised(negotiation: DocumentNegotiation<'static>) {
    let caps = CapabilityData::default();
    let version = resolve_document_version(&caps, &negotiation).expect("fallback");
    assert_eq!(version, negotiation.fallback);
}

#[rstest]
fn strict_policy_rejects_missing_versions(negotiation: DocumentNegotiation<'static>) {
    let strict = DocumentNegotiation {
        policy: DocumentVersionPolicy::Strict,
        ..negotiation
    };
    let err = resolve_document_version(&CapabilityData::default(), &strict)
        .expect_err("strict policy");
    assert!(matches!(err, JobError::NoDocumentVersion { ref job } if job == "UebSEPA"));
}

// ---- document version identifiers ----

#[rstest]
#[case::iso(ISO_001_001_03, DocumentVersion::PAIN_001_001_03)]
#[case::file_name(DK_001_003_03, DocumentVersion::PAIN_001_003_03)]
#[case::direct_debit(
    "urn:iso:std:iso:20022:tech:xsd:pain.008.003.02",
    DocumentVersion::PAIN_008_003_02
)]
fn urns_parse_to_known_versions(#[case] urn: &str, #[case] expected: DocumentVersion) {
    assert_eq!(DocumentVersion::from_urn(urn), Some(expected));
}

#[rstest]
#[case::unknown_revision("urn:iso:std:iso:20022:tech:xsd:pain.001.001.05")]
#[case::unknown_family("urn:iso:std:iso:20022:tech:xsd:pain.002.001.03")]
#[case::truncated("pain.001.001")]
#[case::not_a_schema("SEPA")]
fn unknown_urns_are_rejected(#[case] urn: &str) {
    assert_eq!(DocumentVersion::from_urn(urn), None);
}

#[test]
fn versions_order_by_recency_not_numerals() {
    assert!(DocumentVersion::PAIN_001_003_03 < DocumentVersion::PAIN_001_001_03);
    assert!(DocumentVersion::PAIN_001_001_03 < DocumentVersion::PAIN_001_001_09);
    assert!(DocumentVersion::PAIN_008_003_02 < DocumentVersion::PAIN_008_001_08);
}

#[test]
fn urn_rendering_round_trips() {
    for version in DocumentVersion::all() {
        assert_eq!(DocumentVersion::from_urn(&version.urn()), Some(version));
    }
    assert_eq!(
        DocumentVersion::PAIN_008_001_02.urn(),
        "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02"
    );
}
