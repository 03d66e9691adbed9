//! Unit tests for field path parsing and rewriting.

use rstest::rstest;

use super::*;

fn path(input: &str) -> FieldPath {
    FieldPath::parse(input).expect("valid path")
}

#[rstest]
#[case::plain("UebSEPA1.My.iban")]
#[case::single("usage")]
#[case::indexed_first("btg[1].value")]
#[case::indexed_inner("UebSEPA1.usage[3].usage")]
fn rendering_inverts_parsing(#[case] input: &str) {
    assert_eq!(path(input).to_string(), input);
}

#[rstest]
#[case::empty("")]
#[case::empty_segment("My..iban")]
#[case::trailing_dot("My.iban.")]
#[case::missing_close("btg[1.value")]
#[case::negative_index("btg[-1].value")]
#[case::text_index("btg[x].value")]
#[case::bare_index("[2].value")]
#[case::stray_close("btg].value")]
#[case::suffix_after_index("btg[1]x.value")]
fn malformed_paths_are_rejected(#[case] input: &str) {
    let err = FieldPath::parse(input).expect_err("should reject");
    assert!(matches!(err, JobError::InvalidFieldPath { .. }));
}

#[test]
fn parsed_segments_expose_names_and_indices() {
    let parsed = path("btg[7].value");
    let first = parsed.segments().first().expect("first segment");
    assert_eq!(first.name(), "btg");
    assert_eq!(first.index(), Some(7));
    assert_eq!(parsed.len(), 2);
}

#[test]
fn index_lands_in_requested_segment() {
    let qualified = path("UebSEPA1.usage.usage");
    assert_eq!(
        qualified.with_index_at(1, 2).to_string(),
        "UebSEPA1.usage[2].usage"
    );
    assert_eq!(qualified.with_index_at(9, 2), qualified);
}

#[test]
fn under_and_strip_prefix_are_inverse() {
    let relative = path("My.iban");
    let qualified = relative.under("UebSEPA1");
    assert_eq!(qualified.to_string(), "UebSEPA1.My.iban");
    let root = FieldPath::from_names(["UebSEPA1"]);
    assert_eq!(qualified.strip_prefix(&root), Some(relative));
}

#[test]
fn strip_prefix_requires_a_remainder() {
    let root = path("UebSEPA1");
    assert_eq!(root.strip_prefix(&root), None);
    assert_eq!(path("Other.x").strip_prefix(&root), None);
}

#[test]
fn starts_with_compares_whole_segments() {
    let prefix = path("UebSEPA1.sepa");
    assert!(path("UebSEPA1.sepa.btg.value").starts_with(&prefix));
    assert!(!path("UebSEPA1.sepadescr").starts_with(&prefix));
}

#[test]
fn rebased_rewrites_root_and_keeps_suffix() {
    let original = path("TAN2Step6.orderref");
    let moved = original.rebased("TAN2Step6", "TAN2Step7").expect("rooted");
    assert_eq!(moved.to_string(), "TAN2Step7.orderref");
    assert_eq!(original.rebased("TAN2Step", "TAN2Step7"), None);
}

#[test]
fn child_appends_segment() {
    assert_eq!(path("content").child("x").to_string(), "content.x");
}

#[test]
fn from_str_matches_parse() {
    let parsed: FieldPath = "a.b[1].c".parse().expect("valid");
    assert_eq!(parsed, path("a.b[1].c"));
}
