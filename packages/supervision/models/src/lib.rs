#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Supervision time-bucket types.
//!
//! A [`SupervisionTimeBucket`] describes one person-month (or one event)
//! on community supervision, classified by outcome: an ordinary month on
//! supervision, a revocation return, a termination, or a projected
//! completion. Buckets are created once per pipeline run and mutated only
//! by the dual-supervision reconciler, which rewrites `supervision_type`.

use justice_metrics_entities::{
    AssessmentLevel, AssessmentType, CaseType, ResponseDecision, RevocationType, SupervisionType,
    SupervisionTerminationReason, ViolationType,
};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A summary of the violations recorded in the window leading up to a
/// bucket. Derived once per bucket; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationHistory {
    pub most_severe_violation_type: Option<ViolationType>,
    /// State-agnostic processing mirrors the type itself here; states with
    /// finer-grained subtypes override it upstream.
    pub most_severe_violation_type_subtype: Option<String>,
    pub most_severe_response_decision: Option<ResponseDecision>,
    /// Number of qualifying responses in the window.
    pub response_count: u32,
    /// Shorthand like `1fel;2tech`, ordered most severe first.
    pub description: Option<String>,
    /// Per violation, the violation-type labels and uppercased violated
    /// conditions. A technical violation with no conditions is marked
    /// `TECHNICAL_NO_CONDITIONS`.
    pub type_frequency_counter: Vec<Vec<String>>,
}

/// An ordinary month spent on supervision without a revocation return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevocationReturnBucket {
    pub state_code: String,
    pub year: i32,
    pub month: u32,
    pub supervision_type: SupervisionType,
    pub case_type: CaseType,
    pub assessment_score: Option<i32>,
    pub assessment_level: Option<AssessmentLevel>,
    pub assessment_type: Option<AssessmentType>,
    pub violation_history: ViolationHistory,
    pub supervising_officer_external_id: Option<String>,
    pub supervising_district_external_id: Option<String>,
    pub is_on_supervision_last_day_of_month: bool,
}

/// A return to incarceration caused by a supervision revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationReturnBucket {
    pub state_code: String,
    pub year: i32,
    pub month: u32,
    pub supervision_type: SupervisionType,
    pub case_type: CaseType,
    pub assessment_score: Option<i32>,
    pub assessment_level: Option<AssessmentLevel>,
    pub assessment_type: Option<AssessmentType>,
    pub revocation_type: RevocationType,
    pub source_violation_type: Option<ViolationType>,
    pub violation_history: ViolationHistory,
    pub supervising_officer_external_id: Option<String>,
    pub supervising_district_external_id: Option<String>,
}

/// The month a supervision period ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationBucket {
    pub state_code: String,
    pub year: i32,
    pub month: u32,
    pub supervision_type: SupervisionType,
    pub case_type: CaseType,
    pub termination_reason: SupervisionTerminationReason,
    /// Last assessment score in the termination span minus the second
    /// assessment score; `None` when fewer than two assessments exist.
    pub assessment_score_change: Option<i32>,
    pub supervising_officer_external_id: Option<String>,
    pub supervising_district_external_id: Option<String>,
}

/// A supervision sentence whose projected completion month has passed,
/// scored as a success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedCompletionBucket {
    pub state_code: String,
    pub year: i32,
    pub month: u32,
    pub supervision_type: SupervisionType,
    pub case_type: CaseType,
    pub successful_completion: bool,
    pub incarcerated_during_sentence: bool,
    pub sentence_days_served: i64,
    pub supervising_officer_external_id: Option<String>,
    pub supervising_district_external_id: Option<String>,
}

/// One classified unit of supervision time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisionTimeBucket {
    NonRevocationReturn(NonRevocationReturnBucket),
    RevocationReturn(RevocationReturnBucket),
    Termination(TerminationBucket),
    ProjectedCompletion(ProjectedCompletionBucket),
}

impl SupervisionTimeBucket {
    #[must_use]
    pub const fn kind(&self) -> SupervisionTimeBucketKind {
        match self {
            Self::NonRevocationReturn(_) => SupervisionTimeBucketKind::NonRevocationReturn,
            Self::RevocationReturn(_) => SupervisionTimeBucketKind::RevocationReturn,
            Self::Termination(_) => SupervisionTimeBucketKind::Termination,
            Self::ProjectedCompletion(_) => SupervisionTimeBucketKind::ProjectedCompletion,
        }
    }

    #[must_use]
    pub fn state_code(&self) -> &str {
        match self {
            Self::NonRevocationReturn(bucket) => &bucket.state_code,
            Self::RevocationReturn(bucket) => &bucket.state_code,
            Self::Termination(bucket) => &bucket.state_code,
            Self::ProjectedCompletion(bucket) => &bucket.state_code,
        }
    }

    #[must_use]
    pub const fn year_month(&self) -> (i32, u32) {
        match self {
            Self::NonRevocationReturn(bucket) => (bucket.year, bucket.month),
            Self::RevocationReturn(bucket) => (bucket.year, bucket.month),
            Self::Termination(bucket) => (bucket.year, bucket.month),
            Self::ProjectedCompletion(bucket) => (bucket.year, bucket.month),
        }
    }

    #[must_use]
    pub const fn supervision_type(&self) -> SupervisionType {
        match self {
            Self::NonRevocationReturn(bucket) => bucket.supervision_type,
            Self::RevocationReturn(bucket) => bucket.supervision_type,
            Self::Termination(bucket) => bucket.supervision_type,
            Self::ProjectedCompletion(bucket) => bucket.supervision_type,
        }
    }

    /// Rewrites the supervision type; used only by the dual-supervision
    /// reconciler.
    pub const fn set_supervision_type(&mut self, supervision_type: SupervisionType) {
        match self {
            Self::NonRevocationReturn(bucket) => bucket.supervision_type = supervision_type,
            Self::RevocationReturn(bucket) => bucket.supervision_type = supervision_type,
            Self::Termination(bucket) => bucket.supervision_type = supervision_type,
            Self::ProjectedCompletion(bucket) => bucket.supervision_type = supervision_type,
        }
    }
}

/// The variant of a [`SupervisionTimeBucket`], without its payload.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisionTimeBucketKind {
    NonRevocationReturn,
    RevocationReturn,
    Termination,
    ProjectedCompletion,
}

/// The supervision metric families produced downstream. Each family draws
/// on a fixed set of bucket kinds; the dual-supervision reconciler groups
/// buckets per family when deciding whether a month becomes DUAL.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SupervisionMetricType {
    /// Assessment-score change at termination.
    AssessmentChange,
    /// Monthly supervised population.
    Population,
    /// Revocation returns.
    Revocation,
    /// Successful completion rates.
    Success,
    /// Days served on successfully completed sentences.
    SuccessfulSentenceDaysServed,
}

impl SupervisionMetricType {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AssessmentChange,
            Self::Population,
            Self::Revocation,
            Self::Success,
            Self::SuccessfulSentenceDaysServed,
        ]
    }

    /// The bucket kinds that feed this metric family.
    #[must_use]
    pub const fn contributing_bucket_kinds(self) -> &'static [SupervisionTimeBucketKind] {
        match self {
            Self::AssessmentChange => &[SupervisionTimeBucketKind::Termination],
            Self::Population => &[
                SupervisionTimeBucketKind::NonRevocationReturn,
                SupervisionTimeBucketKind::RevocationReturn,
            ],
            Self::Revocation => &[SupervisionTimeBucketKind::RevocationReturn],
            Self::Success | Self::SuccessfulSentenceDaysServed => {
                &[SupervisionTimeBucketKind::ProjectedCompletion]
            }
        }
    }
}
