//! TAN procedure parameters advertised by the bank.

use std::collections::BTreeMap;
use std::str::FromStr;

use strum::{AsRefStr, EnumString};
use tracing::debug;

use crate::capability::CapabilityData;

use super::TAN_TARGET;

const TAN_FUNCTION: &str = "TAN2Step";
const PARAMS_GROUP: &str = "TAN2StepParams";

/// Known keys of a TAN procedure description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MechanismKey {
    /// Security function code identifying the procedure.
    SecFunc,
    /// Version of the `HKTAN` segment the procedure uses.
    SegVersion,
    /// Process code (`1` or `2`).
    Process,
    /// Display name.
    Name,
    /// Technical identifier.
    Id,
    /// Name of the standardised procedure family.
    #[strum(serialize = "zkamethod_name")]
    ZkaMethodName,
    /// Version of the standardised procedure family.
    #[strum(serialize = "zkamethod_version")]
    ZkaMethodVersion,
    /// Whether a challenge class must be sent.
    NeedChallengeKlass,
    /// Whether a challenge value must be sent.
    NeedChallengeValue,
    /// Whether and how TAN media must be named.
    NeedTanMedia,
    /// Whether the challenge text is structured.
    IsChallengeStructured,
    /// Maximum TAN length.
    #[strum(serialize = "maxlentan2step")]
    MaxLenTan,
    /// Allowed TAN characters.
    TanFormat,
    /// Number of simultaneously active TAN media.
    #[strum(serialize = "nofactivetanmedia")]
    ActiveMedia,
}

/// One TAN procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoStepMechanism {
    /// Security function code.
    pub security_function: String,
    /// `HKTAN` segment version to use with the procedure.
    pub segment_version: Option<u32>,
    /// Process code.
    pub process: Option<String>,
    /// Display name.
    pub name: String,
    /// Technical identifier.
    pub id: String,
    /// Standardised procedure family name.
    pub zka_method_name: Option<String>,
    /// Standardised procedure family version.
    pub zka_method_version: Option<String>,
    /// A challenge class must be sent.
    pub need_challenge_class: bool,
    /// A challenge value must be sent.
    pub need_challenge_value: bool,
    /// TAN media requirement code.
    pub need_tan_media: Option<String>,
    /// The challenge text is structured.
    pub challenge_structured: bool,
    /// Maximum TAN length.
    pub max_tan_length: Option<u32>,
    /// Allowed TAN characters.
    pub tan_format: Option<String>,
    /// Number of simultaneously active TAN media.
    pub active_media: Option<u32>,
}

/// Builds a [`TwoStepMechanism`] from key/value entries.
///
/// Unknown keys and values that do not parse are collected instead of
/// being dropped silently.
#[derive(Debug, Clone, Default)]
pub struct TwoStepMechanismBuilder {
    mechanism: TwoStepMechanism,
    rejected: Vec<String>,
}

impl TwoStepMechanismBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets the segment version, typically from the parameter segment
    /// the procedure was listed in.
    #[must_use]
    pub const fn with_segment_version(mut self, version: u32) -> Self {
        self.mechanism.segment_version = Some(version);
        self
    }

    /// Builder-style [`Self::apply`].
    #[must_use]
    pub fn entry(mut self, key: &str, value: &str) -> Self {
        self.apply(key, value);
        self
    }

    /// Applies one entry, returning `false` when it was rejected.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let accepted = MechanismKey::from_str(key).is_ok_and(|known| self.assign(known, value));
        if !accepted {
            self.rejected.push(key.to_owned());
        }
        accepted
    }

    /// Returns the keys rejected so far.
    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Finishes the mechanism.
    #[must_use]
    pub fn build(self) -> TwoStepMechanism {
        self.mechanism
    }

    fn assign(&mut self, key: MechanismKey, value: &str) -> bool {
        let target = &mut self.mechanism;
        match key {
            MechanismKey::SecFunc => target.security_function = value.to_owned(),
            MechanismKey::Name => target.name = value.to_owned(),
            MechanismKey::Id => target.id = value.to_owned(),
            MechanismKey::Process => target.process = Some(value.to_owned()),
            MechanismKey::ZkaMethodName => target.zka_method_name = Some(value.to_owned()),
            MechanismKey::ZkaMethodVersion => target.zka_method_version = Some(value.to_owned()),
            MechanismKey::NeedTanMedia => target.need_tan_media = Some(value.to_owned()),
            MechanismKey::TanFormat => target.tan_format = Some(value.to_owned()),
            MechanismKey::SegVersion => return store(&mut target.segment_version, value.parse().ok()),
            MechanismKey::MaxLenTan => return store(&mut target.max_tan_length, value.parse().ok()),
            MechanismKey::ActiveMedia => return store(&mut target.active_media, value.parse().ok()),
            MechanismKey::NeedChallengeKlass => return flag(&mut target.need_challenge_class, value),
            MechanismKey::NeedChallengeValue => return flag(&mut target.need_challenge_value, value),
            MechanismKey::IsChallengeStructured => {
                return flag(&mut target.challenge_structured, value);
            }
        }
        true
    }
}

const fn store(slot: &mut Option<u32>, parsed: Option<u32>) -> bool {
    match parsed {
        Some(number) => {
            *slot = Some(number);
            true
        }
        None => false,
    }
}

fn flag(slot: &mut bool, value: &str) -> bool {
    match value {
        "J" => *slot = true,
        "N" => *slot = false,
        _ => return false,
    }
    true
}

/// Reads every TAN procedure the bank advertises.
///
/// Procedures are listed under `Params_n.TAN2StepPar<v>.ParTAN2Step.
/// TAN2StepParams[_k].`; each inherits `<v>` as its segment version unless
/// it names one explicitly.
#[must_use]
pub fn two_step_mechanisms(caps: &CapabilityData) -> Vec<TwoStepMechanism> {
    let mut mechanisms = Vec::new();
    for segment in caps.param_segments(TAN_FUNCTION) {
        let Ok(version) = segment.version.parse::<u32>() else {
            continue;
        };
        let prefix = format!(
            "{}.{TAN_FUNCTION}Par{version}.Par{TAN_FUNCTION}.",
            segment.namespace
        );
        let mut groups: BTreeMap<&str, TwoStepMechanismBuilder> = BTreeMap::new();
        for (key, value) in caps.iter() {
            let Some((group, field)) = key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.split_once('.'))
            else {
                continue;
            };
            if !group.starts_with(PARAMS_GROUP) {
                continue;
            }
            groups
                .entry(group)
                .or_insert_with(|| TwoStepMechanismBuilder::new().with_segment_version(version))
                .apply(field, value);
        }
        for (group, builder) in groups {
            if !builder.rejected().is_empty() {
                debug!(
                    target: TAN_TARGET,
                    group,
                    rejected = ?builder.rejected(),
                    "ignoring unknown TAN procedure entries"
                );
            }
            mechanisms.push(builder.build());
        }
    }
    mechanisms
}
