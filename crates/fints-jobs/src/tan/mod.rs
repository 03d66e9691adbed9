//! Two-step authentication rounds.
//!
//! An [`AuthenticationStep`] wraps the `TAN2Step` job of one round together
//! with the business job it authenticates. Outside the second leg it
//! surfaces the bank's challenge; in the second leg it relays reply segments
//! meant for the original job and notices when that job has to be sent
//! again.
//!
//! A round moves through [`AuthState::AwaitingChallenge`],
//! [`AuthState::ChallengeIssued`], [`AuthState::AwaitingVerdict`] and ends in
//! [`AuthState::Resolved`]. A new round needs a new step.

mod mechanism;


use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::continuation::needs_continuation;
use crate::correlate::{ResponseSegment, ResponseTarget};
use crate::error::JobError;
use crate::job::Job;
use crate::version::rebind;

pub use self::mechanism::{
    MechanismKey, TwoStepMechanism, TwoStepMechanismBuilder, two_step_mechanisms,
};

/// Tracing target for authentication rounds.
const TAN_TARGET: &str = "fints_jobs::tan";

const PROCESS_PARAM: &str = "process";
const ORDER_SEGMENT_PARAM: &str = "ordersegcode";
const NOT_LAST_TAN_PARAM: &str = "notlasttan";

/// TAN process variant, rendered as the protocol's process code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum TanProcess {
    /// One request carries both the order and the TAN.
    #[strum(serialize = "1")]
    SingleStep,
    /// First leg: the bank answers the order with a challenge.
    #[strum(serialize = "4")]
    FirstLeg,
    /// Second leg: the TAN is submitted for the pending order.
    #[strum(serialize = "2")]
    SecondLeg,
}

/// Progress of an authentication round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AuthState {
    /// Created; the request has not been prepared.
    AwaitingChallenge,
    /// The request carries its process parameters.
    ChallengeIssued,
    /// The request has been sent.
    AwaitingVerdict,
    /// A reply has been processed; the round is over.
    Resolved,
}

/// Challenge surfaced to the user for out-of-band confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TanChallenge {
    /// Human-readable challenge text.
    pub challenge: String,
    /// Machine-decodable challenge variant, for optical or chip readers.
    pub challenge_hhd_uc: Option<String>,
    /// Bank reference of the pending order.
    pub order_reference: Option<String>,
}

/// What [`AuthenticationStep::on_response_segment`] did with a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRouting {
    /// The challenge was extracted and the round resolved.
    Challenge,
    /// The segment was handed to the original job.
    Relayed,
    /// The original job has to be sent again.
    RedoRequested,
    /// The segment was relayed and the original job must also be sent
    /// again.
    RelayedWithRedo,
    /// Nothing applied.
    Ignored,
}

/// One round of two-step authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationStep {
    job: Job,
    process: TanProcess,
    original: Option<Job>,
    state: AuthState,
    redo: bool,
    challenge: Option<TanChallenge>,
}

impl AuthenticationStep {
    /// Starts a round driving `job`, optionally authenticating `original`.
    #[must_use]
    pub const fn new(job: Job, process: TanProcess, original: Option<Job>) -> Self {
        Self {
            job,
            process,
            original,
            state: AuthState::AwaitingChallenge,
            redo: false,
            challenge: None,
        }
    }

    /// Returns the process variant.
    #[must_use]
    pub const fn process(&self) -> TanProcess {
        self.process
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Returns the authenticated business job, if bound.
    #[must_use]
    pub const fn original(&self) -> Option<&Job> {
        self.original.as_ref()
    }

    /// Ends the round and hands back the authenticated business job with
    /// everything relayed to its extraction.
    ///
    /// Returns `None` when no job was bound or [`Self::take_redo`] already
    /// took it.
    #[must_use]
    pub fn into_original(self) -> Option<Job> {
        self.original
    }

    /// Returns the challenge surfaced by the round.
    #[must_use]
    pub const fn challenge(&self) -> Option<&TanChallenge> {
        self.challenge.as_ref()
    }

    /// Re-targets the TAN job at the segment version `mechanism` names.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AuthenticationState`] once the request has been
    /// prepared.
    pub fn retarget(&mut self, mechanism: &TwoStepMechanism) -> Result<(), JobError> {
        self.require(&[AuthState::AwaitingChallenge], "retarget")?;
        let Some(version) = mechanism.segment_version else {
            return Ok(());
        };
        if version != self.job.segment_version() {
            debug!(
                target: TAN_TARGET,
                from = self.job.segment_version(),
                to = version,
                "retargeting authentication job"
            );
            self.job = rebind(&self.job, version);
        }
        Ok(())
    }

    /// Writes the process parameters into the TAN request.
    ///
    /// The first leg also names the original job's request segment.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AuthenticationState`] unless the round has just
    /// started, or any parameter binding error.
    pub fn issue(&mut self) -> Result<(), JobError> {
        self.require(&[AuthState::AwaitingChallenge], "issue")?;
        let process = self.process.to_string();
        self.job.set(PROCESS_PARAM, &process)?;
        match (self.process, &self.original) {
            (TanProcess::FirstLeg, Some(original)) => {
                let code = original.request_code().to_string();
                self.job.set(ORDER_SEGMENT_PARAM, &code)?;
            }
            (TanProcess::SecondLeg, _) if self.job.accepts(NOT_LAST_TAN_PARAM) => {
                self.job.set(NOT_LAST_TAN_PARAM, "N")?;
            }
            _ => {}
        }
        self.state = AuthState::ChallengeIssued;
        Ok(())
    }

    /// Records that the request went out.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AuthenticationState`] unless the request was
    /// issued.
    pub fn submitted(&mut self) -> Result<(), JobError> {
        self.require(&[AuthState::ChallengeIssued], "submit")?;
        self.state = AuthState::AwaitingVerdict;
        Ok(())
    }

    /// Routes one correlated response segment.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AuthenticationState`] before the request was
    /// sent, or the original job's extraction error.
    pub fn on_response_segment(
        &mut self,
        segment: &ResponseSegment,
        index: usize,
    ) -> Result<SegmentRouting, JobError> {
        self.require(
            &[AuthState::AwaitingVerdict, AuthState::Resolved],
            "process a response",
        )?;
        if self.process != TanProcess::SecondLeg {
            self.extract_challenge(segment);
            self.state = AuthState::Resolved;
            return Ok(SegmentRouting::Challenge);
        }
        let Some(original) = self.original.as_mut() else {
            return Ok(SegmentRouting::Ignored);
        };

        let code = segment.code();
        let relayed = code == Some(&original.response_code());
        if relayed {
            debug!(
                target: TAN_TARGET,
                job = original.name(),
                header = segment.header(),
                "relaying segment to original job"
            );
            original.extract(segment, index)?;
        }
        let redo = code == Some(&self.job.response_code()) && needs_continuation(&self.job, 1);
        if redo {
            debug!(
                target: TAN_TARGET,
                job = original.name(),
                "original job must be sent again"
            );
            self.redo = true;
        }
        self.state = AuthState::Resolved;
        Ok(match (relayed, redo) {
            (true, true) => SegmentRouting::RelayedWithRedo,
            (true, false) => SegmentRouting::Relayed,
            (false, true) => SegmentRouting::RedoRequested,
            (false, false) => SegmentRouting::Ignored,
        })
    }

    /// Returns the job marked for resubmission.
    #[must_use]
    pub fn redo(&self) -> Option<&Job> {
        self.original.as_ref().filter(|_| self.redo)
    }

    /// Takes the job marked for resubmission out of the step.
    pub const fn take_redo(&mut self) -> Option<Job> {
        if !self.redo {
            return None;
        }
        self.redo = false;
        self.original.take()
    }

    fn extract_challenge(&mut self, segment: &ResponseSegment) {
        let owned = |field: &str| segment.get(field).map(str::to_owned);
        let challenge = TanChallenge {
            challenge: owned("challenge").unwrap_or_default(),
            challenge_hhd_uc: owned("challenge_hhd_uc"),
            order_reference: owned("orderref"),
        };
        let result = self.job.result_mut();
        result.store("challenge", challenge.challenge.as_str());
        if let Some(hhd) = &challenge.challenge_hhd_uc {
            result.store("challenge_hhd_uc", hhd.as_str());
        }
        if let Some(reference) = &challenge.order_reference {
            result.store("orderref", reference.as_str());
        }
        debug!(
            target: TAN_TARGET,
            process = %self.process,
            "challenge received"
        );
        self.challenge = Some(challenge);
    }

    fn require(&self, allowed: &[AuthState], action: &'static str) -> Result<(), JobError> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(JobError::AuthenticationState {
            job: self.job.name().to_owned(),
            action,
            state: self.state.into(),
        })
    }
}

impl ResponseTarget for AuthenticationStep {
    fn job(&self) -> &Job {
        &self.job
    }

    fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    fn extract(&mut self, segment: &ResponseSegment, index: usize) -> Result<(), JobError> {
        self.on_response_segment(segment, index).map(|_| ())
    }
}
