//! Enumerated values carried on custody and supervision records.
//!
//! All enums serialize to `SCREAMING_SNAKE_CASE` so emitted rows match the
//! naming used by the downstream warehouse.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Why a person was admitted to an incarceration facility.
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
pub enum IncarcerationAdmissionReason {
    /// The admission was recorded in error.
    AdmittedInError,
    /// Simultaneous revocation of parole and probation.
    DualRevocation,
    /// The source system could not determine the reason.
    ExternalUnknown,
    /// A new court commitment.
    NewAdmission,
    /// Return to prison for a parole violation.
    ParoleRevocation,
    /// Return to prison for a probation violation.
    ProbationRevocation,
    /// A short hold that is not a prison admission (jail hold, court hold).
    TemporaryCustody,
    /// Movement between facilities while serving the same stint.
    Transfer,
}

/// Why a person was released from an incarceration facility.
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
pub enum IncarcerationReleaseReason {
    /// Sentence commuted by an executive.
    Commuted,
    /// Released early on medical or humanitarian grounds.
    Compassionate,
    /// Released to supervision before the sentence was fully served.
    ConditionalRelease,
    CourtOrder,
    Death,
    Escape,
    Execution,
    ExternalUnknown,
    /// End of a temporary hold; never a cohort-qualifying release.
    ReleasedFromTemporaryCustody,
    ReleasedInError,
    SentenceServed,
    /// Movement between facilities while serving the same stint.
    Transfer,
}

/// Custody status recorded on an incarceration period.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    InCustody,
    NotInCustody,
}

/// The flavor of community supervision a person is serving.
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
pub enum SupervisionType {
    /// Supervised release following incarceration.
    Parole,
    /// Court-ordered supervision in lieu of incarceration.
    Probation,
    /// Simultaneously serving parole and probation.
    Dual,
}

/// Specialized caseload classification on a supervision period.
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
pub enum CaseType {
    SexOffender,
    DomesticViolence,
    SeriousMentalIllness,
    General,
}

impl CaseType {
    /// Case types ordered most severe first; used to pick the single case
    /// type reported on a bucket when a period carries several.
    #[must_use]
    pub const fn severity_order() -> &'static [Self] {
        &[
            Self::SexOffender,
            Self::DomesticViolence,
            Self::SeriousMentalIllness,
            Self::General,
        ]
    }
}

/// Why a supervision period ended.
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
pub enum SupervisionTerminationReason {
    /// The person absconded from supervision.
    Absconsion,
    Death,
    /// Discharged from supervision early by an authority.
    Discharge,
    /// The supervision term expired as scheduled.
    Expiration,
    ExternalUnknown,
    InternalUnknown,
    /// Supervision revoked; the person returned to incarceration.
    Revocation,
    ReturnFromAbsconsion,
    Suspension,
    TransferWithinState,
    TransferOutOfState,
}

/// The category of a recorded supervision violation.
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
pub enum ViolationType {
    Absconded,
    Escaped,
    /// A new felony offense.
    Felony,
    /// A new misdemeanor offense.
    Misdemeanor,
    /// A new municipal offense.
    Municipal,
    /// A violation of supervision conditions without a new offense.
    Technical,
}

impl ViolationType {
    /// All variants, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Absconded,
            Self::Escaped,
            Self::Felony,
            Self::Misdemeanor,
            Self::Municipal,
            Self::Technical,
        ]
    }

    /// Violation types ordered most severe first.
    #[must_use]
    pub const fn severity_order() -> &'static [Self] {
        &[
            Self::Felony,
            Self::Misdemeanor,
            Self::Absconded,
            Self::Municipal,
            Self::Escaped,
            Self::Technical,
        ]
    }

    /// Short label used when building violation-history descriptions,
    /// e.g. `3fel;2tech`.
    #[must_use]
    pub const fn shorthand(self) -> &'static str {
        match self {
            Self::Absconded => "abs",
            Self::Escaped => "esc",
            Self::Felony => "fel",
            Self::Misdemeanor => "misd",
            Self::Municipal => "muni",
            Self::Technical => "tech",
        }
    }
}

/// The kind of incarceration a revocation sends a person to.
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
pub enum RevocationType {
    /// A short stint meant as a deterrent.
    ShockIncarceration,
    /// Commitment to a treatment program in prison.
    TreatmentInPrison,
    /// A standard return to prison.
    Reincarceration,
    /// The decision returned the person to supervision; never counted as a
    /// revocation return.
    ReturnToSupervision,
}

impl RevocationType {
    /// Revocation types ordered most severe first.
    /// `ReturnToSupervision` is deliberately excluded.
    #[must_use]
    pub const fn severity_order() -> &'static [Self] {
        &[
            Self::ShockIncarceration,
            Self::TreatmentInPrison,
            Self::Reincarceration,
        ]
    }
}

/// A decision recorded on a violation response.
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
pub enum ResponseDecision {
    Continuance,
    DelayedAction,
    Extension,
    Revocation,
    ServiceTermination,
    Suspension,
}

impl ResponseDecision {
    /// Response decisions ordered most severe first.
    #[must_use]
    pub const fn severity_order() -> &'static [Self] {
        &[
            Self::Revocation,
            Self::Extension,
            Self::Suspension,
            Self::ServiceTermination,
            Self::DelayedAction,
            Self::Continuance,
        ]
    }
}

/// The form a violation response took.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationResponseKind {
    /// A citation issued to the person.
    Citation,
    /// A final decision by a parole board or court.
    PermanentDecision,
    /// A violation report written by the supervising officer.
    ViolationReport,
}

/// Gender as recorded by the source system.
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
pub enum Gender {
    Female,
    Male,
    TransFemale,
    TransMale,
    ExternalUnknown,
}

/// Race as recorded by the source system. A person may have several.
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
pub enum Race {
    AmericanIndianAlaskanNative,
    Asian,
    Black,
    NativeHawaiianPacificIslander,
    White,
    Other,
    ExternalUnknown,
}

/// Ethnicity as recorded by the source system. A person may have several.
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
pub enum Ethnicity {
    Hispanic,
    NotHispanic,
    ExternalUnknown,
}

/// The instrument used for a risk/needs assessment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    Lsir,
    Oras,
    Psa,
    Sorac,
}

/// The banded risk level an assessment produced.
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
pub enum AssessmentLevel {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
    VeryHigh,
}
