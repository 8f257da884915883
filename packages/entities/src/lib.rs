#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical typed entity model for custody and supervision records.
//!
//! This crate defines the shapes that the external hydration layer produces
//! for each person: incarceration and supervision periods, sentences,
//! assessments, violations and their responses, and every enum those records
//! carry. All entities are immutable once loaded and are consumed read-only
//! by the calculation pipelines.

pub mod enums;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub use enums::{
    AssessmentLevel, AssessmentType, CaseType, CustodyStatus, Ethnicity, Gender,
    IncarcerationAdmissionReason, IncarcerationReleaseReason, Race, ResponseDecision,
    RevocationType, SupervisionTerminationReason, SupervisionType, ViolationResponseKind,
    ViolationType,
};

/// A person whose records are being processed.
///
/// A person can carry more than one race and more than one ethnicity; the
/// combination generator explodes metrics across all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Stable identifier assigned by the hydration layer.
    pub person_id: i64,
    /// Date of birth, when known.
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub races: Vec<Race>,
    pub ethnicities: Vec<Ethnicity>,
}

impl Person {
    /// Returns the person's age in whole years on the given date, or `None`
    /// when the birthdate is unknown.
    #[must_use]
    pub fn age_on(&self, date: NaiveDate) -> Option<i32> {
        let birthdate = self.birthdate?;

        let mut age = date.year() - birthdate.year();
        if (date.month(), date.day()) < (birthdate.month(), birthdate.day()) {
            age -= 1;
        }

        Some(age)
    }
}

/// A single continuous stay in an incarceration facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncarcerationPeriod {
    pub incarceration_period_id: i64,
    /// Source-system identifier, preserved for data-quality investigations.
    pub external_id: Option<String>,
    pub state_code: String,
    pub status: CustodyStatus,
    pub facility: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub admission_reason: Option<IncarcerationAdmissionReason>,
    pub release_date: Option<NaiveDate>,
    pub release_reason: Option<IncarcerationReleaseReason>,
    /// The violation response that triggered this admission, when the
    /// admission was a supervision revocation.
    pub source_violation_response_id: Option<i64>,
}

impl IncarcerationPeriod {
    /// Whether the admission to this period was triggered by a supervision
    /// revocation.
    #[must_use]
    pub const fn is_revocation_admission(&self) -> bool {
        matches!(
            self.admission_reason,
            Some(
                IncarcerationAdmissionReason::ParoleRevocation
                    | IncarcerationAdmissionReason::ProbationRevocation
                    | IncarcerationAdmissionReason::DualRevocation
            )
        )
    }
}

/// A single continuous stretch of community supervision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionPeriod {
    pub supervision_period_id: i64,
    pub state_code: String,
    pub start_date: Option<NaiveDate>,
    pub termination_date: Option<NaiveDate>,
    pub termination_reason: Option<SupervisionTerminationReason>,
    pub supervision_type: Option<SupervisionType>,
    /// The supervising site/district recorded directly on the period.
    pub supervision_site: Option<String>,
    /// Specialized caseload classifications for this period.
    pub case_types: Vec<CaseType>,
}

impl SupervisionPeriod {
    /// Whether this period was in effect on the given day.
    ///
    /// A period with no termination date is treated as still active; the
    /// termination day itself does not count as a day on supervision.
    #[must_use]
    pub fn overlaps_day(&self, day: NaiveDate) -> bool {
        self.start_date.is_some_and(|start| start <= day)
            && self.termination_date.is_none_or(|termination| day < termination)
    }
}

/// A sentence to a term of community supervision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionSentence {
    pub supervision_sentence_id: i64,
    pub state_code: String,
    pub supervision_type: Option<SupervisionType>,
    pub start_date: Option<NaiveDate>,
    /// The day supervision actually ended.
    pub completion_date: Option<NaiveDate>,
    /// The day supervision was projected to end when the sentence was imposed.
    pub projected_completion_date: Option<NaiveDate>,
    /// Supervision periods served under this sentence.
    pub supervision_period_ids: Vec<i64>,
}

/// A sentence to a term of incarceration. Parole time served under an
/// incarceration sentence is linked here through the period ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncarcerationSentence {
    pub incarceration_sentence_id: i64,
    pub state_code: String,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub supervision_period_ids: Vec<i64>,
}

/// A risk/needs assessment administered during supervision or incarceration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub assessment_id: i64,
    pub state_code: String,
    pub assessment_date: Option<NaiveDate>,
    pub assessment_score: Option<i32>,
    pub assessment_level: Option<AssessmentLevel>,
    pub assessment_type: Option<AssessmentType>,
}

/// A recorded violation of supervision conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub supervision_violation_id: i64,
    pub state_code: String,
    pub violation_types: Vec<ViolationType>,
    /// Free-text condition identifiers that were violated.
    pub violated_conditions: Vec<String>,
}

/// One decision recorded on a violation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDecisionEntry {
    pub decision: Option<ResponseDecision>,
    pub revocation_type: Option<RevocationType>,
}

/// The official response to a supervision violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationResponse {
    pub supervision_violation_response_id: i64,
    pub state_code: String,
    pub response_date: Option<NaiveDate>,
    pub response_kind: Option<ViolationResponseKind>,
    /// Draft responses are still being written and never count toward
    /// violation history.
    pub is_draft: bool,
    pub revocation_type: Option<RevocationType>,
    pub decision_entries: Vec<ResponseDecisionEntry>,
    pub violation: Option<Violation>,
}

/// Officer and district identifiers resolved through an association map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAssociation {
    pub agent_external_id: Option<String>,
    pub district_external_id: Option<String>,
}
