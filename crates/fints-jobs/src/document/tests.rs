//! Unit tests for document dispatch and batch totals.

use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};
use rust_decimal::Decimal;

use super::*;

/// Writes a fixed body, or fails when constructed with `None`.
struct FixedGenerator {
    body: Option<&'static str>,
}

impl DocumentGenerator for FixedGenerator {
    fn generate(
        &self,
        _params: &BTreeMap<FieldPath, String>,
        sink: &mut dyn Write,
        _validate: bool,
    ) -> Result<(), GeneratorError> {
        let body = self.body.ok_or("schema violation")?;
        sink.write_all(body.as_bytes())?;
        Ok(())
    }
}

fn params(entries: &[(&str, &str)]) -> BTreeMap<FieldPath, String> {
    entries
        .iter()
        .map(|(key, value)| (FieldPath::parse(key).expect("valid key"), (*value).to_owned()))
        .collect()
}

#[fixture]
fn registry() -> GeneratorRegistry {
    GeneratorRegistry::new()
        .with("UebSEPA", DocumentVersion::PAIN_001_001_09, || {
            Box::new(FixedGenerator { body: Some("<Document/>") })
        })
        .with("UebSEPA", DocumentVersion::PAIN_001_003_03, || {
            Box::new(FixedGenerator { body: Some("<Document/>") })
        })
        .with("LastSEPA", DocumentVersion::PAIN_008_001_02, || {
            Box::new(FixedGenerator { body: None })
        })
}

// ---- registry ----

#[rstest]
fn supported_versions_are_sorted_per_function(registry: GeneratorRegistry) {
    assert_eq!(
        registry.supported_versions("UebSEPA"),
        vec![
            DocumentVersion::PAIN_001_003_03,
            DocumentVersion::PAIN_001_001_09
        ]
    );
    assert!(registry.supported_versions("KUmsZeit").is_empty());
    assert_eq!(registry.len(), 3);
}

#[rstest]
fn unregistered_pairs_are_unsupported(registry: GeneratorRegistry) {
    let err = registry
        .factory("UebSEPA", DocumentVersion::PAIN_001_001_03)
        .err()
        .expect("unsupported");
    assert!(matches!(
        err,
        JobError::UnsupportedDocumentVersion { ref job, ref version }
            if job == "UebSEPA" && version == "pain.001.001.03"
    ));
}

// ---- dispatch ----

#[test]
fn generator_is_instantiated_once_per_job() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let registry = GeneratorRegistry::new().with(
        "UebSEPA",
        DocumentVersion::PAIN_001_001_09,
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(FixedGenerator { body: Some("x") })
        },
    );
    let dispatch = DocumentDispatch::default();
    assert!(!dispatch.is_initialised());
    for _ in 0..3 {
        dispatch
            .get(&registry, "UebSEPA", DocumentVersion::PAIN_001_001_09)
            .expect("generator");
    }
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(dispatch.is_initialised());

    let other_job = dispatch.clone();
    assert!(!other_job.is_initialised());
}

#[rstest]
fn failed_lookup_leaves_cache_empty(registry: GeneratorRegistry) {
    let dispatch = DocumentDispatch::default();
    assert!(
        dispatch
            .get(&registry, "UebSEPA", DocumentVersion::PAIN_001_001_03)
            .is_err()
    );
    assert!(!dispatch.is_initialised());
}

// ---- rendering ----

#[rstest]
fn rendering_returns_generated_document(registry: GeneratorRegistry) {
    let dispatch = DocumentDispatch::default();
    let generator = dispatch
        .get(&registry, "UebSEPA", DocumentVersion::PAIN_001_001_09)
        .expect("generator");
    let document = render(generator, "UebSEPA", &BTreeMap::new(), true).expect("document");
    assert_eq!(document, "<Document/>");
}

#[rstest]
fn generator_failure_is_a_build_failure(registry: GeneratorRegistry) {
    let dispatch = DocumentDispatch::default();
    let generator = dispatch
        .get(&registry, "LastSEPA", DocumentVersion::PAIN_008_001_02)
        .expect("generator");
    let err = render(generator, "LastSEPA", &BTreeMap::new(), true).expect_err("fails");
    assert!(matches!(
        err,
        JobError::DocumentBuildFailure { ref message, source: Some(_), .. } if message == "schema violation"
    ));
}

#[test]
fn empty_output_is_a_build_failure() {
    let generator = FixedGenerator { body: Some("") };
    let err = render(&generator, "UebSEPA", &BTreeMap::new(), false).expect_err("empty");
    assert!(matches!(err, JobError::DocumentBuildFailure { source: None, .. }));
}

// ---- batch totals ----

#[test]
fn line_items_are_summed() {
    let table = params(&[
        ("btg[1].value", "10.00"),
        ("btg[1].curr", "EUR"),
        ("btg[2].value", "5.50"),
        ("btg[2].curr", "EUR"),
        ("dst[1].iban", "DE02"),
    ]);
    let total = batch_total("SammelUebSEPA", &table)
        .expect("total")
        .expect("items present");
    assert_eq!(total.value, Decimal::new(1550, 2));
    assert_eq!(total.value.to_string(), "15.50");
    assert_eq!(total.currency, "EUR");
}

#[test]
fn mixed_currencies_fail() {
    let table = params(&[
        ("btg[1].value", "10.00"),
        ("btg[1].curr", "EUR"),
        ("btg[2].value", "5.50"),
        ("btg[2].curr", "USD"),
    ]);
    let err = batch_total("SammelUebSEPA", &table).expect_err("mixed");
    assert!(matches!(
        err,
        JobError::MixedCurrencyFailure { ref expected, ref found, .. }
            if expected == "EUR" && found == "USD"
    ));
}

#[test]
fn unindexed_currency_applies_to_every_item() {
    let table = params(&[
        ("btg.curr", "EUR"),
        ("btg[1].value", "1.25"),
        ("btg[2].value", "2.75"),
    ]);
    let total = batch_total("SammelUebSEPA", &table)
        .expect("total")
        .expect("items present");
    assert_eq!(total.value, Decimal::new(400, 2));
}

#[test]
fn unindexed_amount_is_ignored_once_items_exist() {
    let table = params(&[
        ("btg.curr", "EUR"),
        ("btg.value", "10.00"),
        ("btg[0].value", "10.00"),
        ("btg[1].value", "5.50"),
    ]);
    let total = batch_total("SammelUebSEPA", &table)
        .expect("total")
        .expect("items present");
    assert_eq!(total.value.to_string(), "15.50");
}

#[test]
fn lone_unindexed_amount_is_the_only_item() {
    let table = params(&[("btg.value", "7.25"), ("btg.curr", "EUR")]);
    let total = batch_total("SammelUebSEPA", &table)
        .expect("total")
        .expect("items present");
    assert_eq!(total.value, Decimal::new(725, 2));
    assert_eq!(total.currency, "EUR");
}

#[rstest]
#[case::no_items(&[("pmtinfid", "P1")], true)]
#[case::bad_amount(&[("btg[1].value", "ten"), ("btg[1].curr", "EUR")], false)]
#[case::no_currency(&[("btg[1].value", "1.00")], false)]
fn degenerate_tables(#[case] entries: &[(&str, &str)], #[case] succeeds: bool) {
    let outcome = batch_total("SammelUebSEPA", &params(entries));
    match outcome {
        Ok(total) => {
            assert!(succeeds);
            assert_eq!(total, None);
        }
        Err(err) => {
            assert!(!succeeds);
            assert!(matches!(err, JobError::DocumentBuildFailure { .. }));
        }
    }
}
