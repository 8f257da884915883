#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Release-event and recidivism metric key types.
//!
//! A [`ReleaseEvent`] describes one qualifying release from incarceration,
//! tagged as recidivism or non-recidivism. Events are grouped by release
//! cohort (the calendar year of the release date). The metric calculator
//! turns events into [`AugmentedMetricKey`]/value rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use justice_metrics_entities::ViolationType;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How a person returned to incarceration after a release.
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
pub enum ReincarcerationReturnType {
    /// A brand new admission, unrelated to any supervision term.
    NewAdmission,
    /// A return caused by the revocation of supervision.
    Revocation,
}

/// The kind of supervision a revocation return came from.
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
pub enum ReturnFromSupervisionType {
    Parole,
    Probation,
}

/// A release from incarceration that was followed by a reincarceration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecidivismReleaseEvent {
    pub state_code: String,
    /// Admission date of the stay this release ended.
    pub original_admission_date: NaiveDate,
    pub release_date: NaiveDate,
    pub release_facility: Option<String>,
    pub reincarceration_date: NaiveDate,
    pub reincarceration_facility: Option<String>,
    pub return_type: ReincarcerationReturnType,
    /// Set only for revocation returns.
    pub from_supervision_type: Option<ReturnFromSupervisionType>,
    /// The violation that eventually produced the revocation, when known.
    pub source_violation_type: Option<ViolationType>,
    pub county_of_residence: Option<String>,
}

impl RecidivismReleaseEvent {
    /// Days spent at liberty between the release and the reincarceration.
    /// Negative only when the input data is inconsistent.
    #[must_use]
    pub fn days_at_liberty(&self) -> i64 {
        (self.reincarceration_date - self.release_date).num_days()
    }
}

/// A release from incarceration with no subsequent reincarceration on
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRecidivismReleaseEvent {
    pub state_code: String,
    pub original_admission_date: NaiveDate,
    pub release_date: NaiveDate,
    pub release_facility: Option<String>,
    pub county_of_residence: Option<String>,
}

/// One qualifying release, classified by whether the person returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseEvent {
    Recidivism(RecidivismReleaseEvent),
    NonRecidivism(NonRecidivismReleaseEvent),
}

impl ReleaseEvent {
    #[must_use]
    pub fn state_code(&self) -> &str {
        match self {
            Self::Recidivism(event) => &event.state_code,
            Self::NonRecidivism(event) => &event.state_code,
        }
    }

    #[must_use]
    pub const fn original_admission_date(&self) -> NaiveDate {
        match self {
            Self::Recidivism(event) => event.original_admission_date,
            Self::NonRecidivism(event) => event.original_admission_date,
        }
    }

    #[must_use]
    pub const fn release_date(&self) -> NaiveDate {
        match self {
            Self::Recidivism(event) => event.release_date,
            Self::NonRecidivism(event) => event.release_date,
        }
    }

    #[must_use]
    pub fn release_facility(&self) -> Option<&str> {
        match self {
            Self::Recidivism(event) => event.release_facility.as_deref(),
            Self::NonRecidivism(event) => event.release_facility.as_deref(),
        }
    }

    #[must_use]
    pub fn county_of_residence(&self) -> Option<&str> {
        match self {
            Self::Recidivism(event) => event.county_of_residence.as_deref(),
            Self::NonRecidivism(event) => event.county_of_residence.as_deref(),
        }
    }
}

/// Release events grouped by release cohort year.
pub type ReleaseCohorts = BTreeMap<i32, Vec<ReleaseEvent>>;

/// Age band at the original admission.
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
pub enum AgeBucket {
    #[serde(rename = "<25")]
    #[strum(serialize = "<25")]
    Under25,
    #[serde(rename = "25-29")]
    #[strum(serialize = "25-29")]
    From25To29,
    #[serde(rename = "30-34")]
    #[strum(serialize = "30-34")]
    From30To34,
    #[serde(rename = "35-39")]
    #[strum(serialize = "35-39")]
    From35To39,
    #[serde(rename = "40+")]
    #[strum(serialize = "40+")]
    Over40,
}

impl AgeBucket {
    /// Buckets an age in whole years.
    #[must_use]
    pub const fn from_age(age: i32) -> Self {
        match age {
            i32::MIN..=24 => Self::Under25,
            25..=29 => Self::From25To29,
            30..=34 => Self::From30To34,
            35..=39 => Self::From35To39,
            _ => Self::Over40,
        }
    }
}

/// Length-of-stay band, in whole months, upper bound exclusive.
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
pub enum StayLengthBucket {
    #[serde(rename = "<12")]
    #[strum(serialize = "<12")]
    Under12,
    #[serde(rename = "12-24")]
    #[strum(serialize = "12-24")]
    From12To24,
    #[serde(rename = "24-36")]
    #[strum(serialize = "24-36")]
    From24To36,
    #[serde(rename = "36-48")]
    #[strum(serialize = "36-48")]
    From36To48,
    #[serde(rename = "48-60")]
    #[strum(serialize = "48-60")]
    From48To60,
    #[serde(rename = "60-72")]
    #[strum(serialize = "60-72")]
    From60To72,
    #[serde(rename = "72-84")]
    #[strum(serialize = "72-84")]
    From72To84,
    #[serde(rename = "84-96")]
    #[strum(serialize = "84-96")]
    From84To96,
    #[serde(rename = "96-108")]
    #[strum(serialize = "96-108")]
    From96To108,
    #[serde(rename = "108-120")]
    #[strum(serialize = "108-120")]
    From108To120,
    #[serde(rename = "120+")]
    #[strum(serialize = "120+")]
    Over120,
}

impl StayLengthBucket {
    /// Buckets a stay length in whole months. A 23-month stay lands in
    /// `12-24`; a 24-month stay lands in `24-36`.
    #[must_use]
    pub const fn from_months(months: i32) -> Self {
        match months {
            i32::MIN..=11 => Self::Under12,
            12..=23 => Self::From12To24,
            24..=35 => Self::From24To36,
            36..=47 => Self::From36To48,
            48..=59 => Self::From48To60,
            60..=71 => Self::From60To72,
            72..=83 => Self::From72To84,
            84..=95 => Self::From84To96,
            96..=107 => Self::From96To108,
            108..=119 => Self::From108To120,
            _ => Self::Over120,
        }
    }
}

/// Whether a metric counts every qualifying event or each person once.
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
pub enum Methodology {
    Event,
    Person,
}

/// The family of recidivism metric a key belongs to.
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
pub enum RecidivismMetricType {
    /// Recidivism within an N-year follow-up window after release.
    Rate,
    /// Reincarceration counts per month and rolling window.
    Count,
    /// Days at liberty between release and reincarceration.
    Liberty,
}

/// One slice of the tracked demographic/contextual dimensions.
///
/// Every field is optional; the all-`None` combination is the "all people"
/// aggregate and is always present in a generated set. When `person_id` is
/// set the combination is person-level and is never expanded across
/// return-type breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacteristicCombination {
    pub age_bucket: Option<AgeBucket>,
    pub gender: Option<justice_metrics_entities::Gender>,
    pub race: Option<justice_metrics_entities::Race>,
    pub ethnicity: Option<justice_metrics_entities::Ethnicity>,
    pub release_facility: Option<String>,
    pub stay_length_bucket: Option<StayLengthBucket>,
    pub county_of_residence: Option<String>,
    pub person_id: Option<i64>,
}

impl CharacteristicCombination {
    /// Whether this is a person-level combination.
    #[must_use]
    pub const fn is_person_level(&self) -> bool {
        self.person_id.is_some()
    }
}

/// A fully-qualified metric key: a characteristic combination plus every
/// parameter that scopes the measurement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AugmentedMetricKey {
    pub combination: CharacteristicCombination,
    pub state_code: String,
    pub metric_type: RecidivismMetricType,
    pub methodology: Methodology,
    /// Release cohort year; set on rate metrics.
    pub release_cohort: Option<i32>,
    /// Follow-up window in years (1..=10); set on rate metrics.
    pub follow_up_period: Option<u8>,
    pub return_type: Option<ReincarcerationReturnType>,
    pub from_supervision_type: Option<ReturnFromSupervisionType>,
    pub source_violation_type: Option<ViolationType>,
    /// Calendar bucket; set on count metrics.
    pub year: Option<i32>,
    /// Calendar bucket; set on count metrics.
    pub month: Option<u32>,
    /// Rolling window length; set on count metrics (1 for the
    /// reincarceration-month bucket).
    pub metric_period_months: Option<u32>,
    /// Window bounds; set on liberty metrics.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AugmentedMetricKey {
    /// A bare key carrying only the combination, state, metric type, and
    /// methodology. The calculator fills in the scoping parameters.
    #[must_use]
    pub const fn new(
        combination: CharacteristicCombination,
        state_code: String,
        metric_type: RecidivismMetricType,
        methodology: Methodology,
    ) -> Self {
        Self {
            combination,
            state_code,
            metric_type,
            methodology,
            release_cohort: None,
            follow_up_period: None,
            return_type: None,
            from_supervision_type: None,
            source_violation_type: None,
            year: None,
            month: None,
            metric_period_months: None,
            start_date: None,
            end_date: None,
        }
    }
}
