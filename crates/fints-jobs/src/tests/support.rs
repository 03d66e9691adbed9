//! Shared fixtures: capability data, generators and grammar doubles.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use fints_config::EngineConfig;
use mockall::mock;

use crate::capability::CapabilityData;
use crate::document::{DocumentGenerator, GeneratorError, GeneratorRegistry};
use crate::error::JobError;
use crate::grammar::{FieldTree, Grammar, StructuralError};
use crate::job::{Job, JobContext};
use crate::kind::TransactionKind;
use crate::path::FieldPath;
use crate::version::DocumentVersion;

mock! {
    pub Grammar {}
    impl Grammar for Grammar {
        fn build(
            &self,
            protocol_name: &str,
            params: &BTreeMap<FieldPath, String>,
        ) -> Result<FieldTree, StructuralError>;
    }
}

/// Accepts every parameter set unchanged.
pub(crate) struct EchoGrammar;

impl Grammar for EchoGrammar {
    fn build(
        &self,
        protocol_name: &str,
        params: &BTreeMap<FieldPath, String>,
    ) -> Result<FieldTree, StructuralError> {
        Ok(FieldTree::new(protocol_name, params.clone()))
    }
}

/// Renders the side table as `key=value` lines under a schema header.
pub(crate) struct ListingGenerator {
    version: DocumentVersion,
}

impl DocumentGenerator for ListingGenerator {
    fn generate(
        &self,
        params: &BTreeMap<FieldPath, String>,
        sink: &mut dyn Write,
        _validate: bool,
    ) -> Result<(), GeneratorError> {
        writeln!(sink, "# {}", self.version)?;
        for (key, value) in params {
            writeln!(sink, "{key}={value}")?;
        }
        Ok(())
    }
}

fn listing(version: DocumentVersion) -> impl Fn() -> Box<dyn DocumentGenerator> + Send + Sync {
    move || Box::new(ListingGenerator { version })
}

/// Generators for every document kind of the catalogue.
pub(crate) fn registry() -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    for function in ["UebSEPA", "SammelUebSEPA", "DauerSEPANew"] {
        for version in [DocumentVersion::PAIN_001_001_03, DocumentVersion::PAIN_001_001_09] {
            registry.register(function, version, listing(version));
        }
    }
    registry.register(
        "LastSEPA",
        DocumentVersion::PAIN_008_001_02,
        listing(DocumentVersion::PAIN_008_001_02),
    );
    registry
}

/// Capability data advertising every catalogue kind.
pub(crate) fn capabilities() -> CapabilityData {
    CapabilityData::from_entries([
        ("Params_1.UebSEPAPar1.SegHead.code", "HICCSS"),
        ("Params_2.SammelUebSEPAPar1.SegHead.code", "HICCMS"),
        ("Params_3.LastSEPAPar1.SegHead.code", "HIDSES"),
        ("Params_4.DauerSEPANewPar1.SegHead.code", "HICDES"),
        ("Params_5.SaldoSEPAPar5.SegHead.code", "HISALS"),
        ("Params_6.SaldoSEPAPar7.SegHead.code", "HISALS"),
        ("Params_7.KUmsZeitPar7.SegHead.code", "HIKAZS"),
        ("Params_8.TAN2StepPar6.SegHead.code", "HITANS"),
        ("Params_8.TAN2StepPar6.ParTAN2Step.can1step", "N"),
        ("Params_8.TAN2StepPar6.ParTAN2Step.TAN2StepParams.secfunc", "912"),
        ("Params_8.TAN2StepPar6.ParTAN2Step.TAN2StepParams.name", "chipTAN"),
        ("Params_8.TAN2StepPar6.ParTAN2Step.TAN2StepParams_2.secfunc", "942"),
        ("Params_8.TAN2StepPar6.ParTAN2Step.TAN2StepParams_2.segversion", "7"),
        ("Params_9.SEPAInfoPar1.SegHead.code", "HISPAS"),
        (
            "Params_9.SEPAInfoPar1.ParSEPAInfo.suppformats",
            "urn:iso:std:iso:20022:tech:xsd:pain.001.001.03",
        ),
        (
            "Params_9.SEPAInfoPar1.ParSEPAInfo.suppformats_2",
            "urn:iso:std:iso:20022:tech:xsd:pain.008.001.02",
        ),
    ])
}

/// Owns every collaborator a [`JobContext`] borrows.
pub(crate) struct Harness {
    pub(crate) capabilities: CapabilityData,
    pub(crate) generators: GeneratorRegistry,
    pub(crate) grammar: Box<dyn Grammar>,
    pub(crate) config: EngineConfig,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            capabilities: capabilities(),
            generators: registry(),
            grammar: Box::new(EchoGrammar),
            config: EngineConfig::default(),
        }
    }
}

impl Harness {
    pub(crate) fn ctx(&self) -> JobContext<'_> {
        JobContext::new(
            &self.capabilities,
            &self.generators,
            self.grammar.as_ref(),
            &self.config,
        )
    }

    /// Builds a job of `kind` against this harness.
    pub(crate) fn job(&self, kind: fn() -> Result<TransactionKind, JobError>) -> Job {
        let kind = kind().expect("catalogue kind");
        Job::new(Arc::new(kind), &self.ctx()).expect("job supported")
    }
}

/// Sets the fields every SEPA credit transfer requires.
pub(crate) fn fill_transfer(job: &mut Job) {
    for (name, value) in [
        ("src.iban", "DE89370400440532013000"),
        ("src.bic", "COBADEFFXXX"),
        ("src.name", "Alice"),
        ("dst.iban", "DE02120300000000202051"),
        ("dst.name", "Bob"),
        ("btg.value", "12.50"),
    ] {
        job.set(name, value).expect("parameter accepted");
    }
}
