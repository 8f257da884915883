#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Recidivism release-event identification and metric calculation.
//!
//! The path runs in three stages: [`identifier`] normalizes a person's raw
//! incarceration periods and classifies qualifying releases into
//! [`justice_metrics_recidivism_models::ReleaseEvent`]s grouped by cohort
//! year, [`combinations`] explodes a person+event into the set of
//! characteristic combinations tracked for reporting, and [`calculator`]
//! expands those into `(AugmentedMetricKey, value)` rows for the rate,
//! count, and liberty metrics.

pub mod calculator;
pub mod combinations;
pub mod identifier;

use chrono::NaiveDate;
use justice_metrics_entities::{IncarcerationAdmissionReason, IncarcerationReleaseReason};
use thiserror::Error;

/// Data-integrity failures raised while processing one person's periods.
///
/// Any of these fails the single person's computation; the run continues
/// for everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecidivismError {
    #[error(
        "Incarceration period {incarceration_period_id} is missing admission data that cannot be recovered from a preceding transfer release"
    )]
    UnrecoverableMissingAdmission { incarceration_period_id: i64 },

    #[error("Incarceration period {incarceration_period_id} has a release date but no release reason")]
    MissingReleaseReason { incarceration_period_id: i64 },

    #[error(
        "Incarceration period {incarceration_period_id} has a release reason or a released status but no release date"
    )]
    MissingReleaseDate { incarceration_period_id: i64 },

    #[error(
        "Release reason {release_reason} on incarceration period {incarceration_period_id} should have been removed during normalization"
    )]
    UnexpectedReleaseReason {
        incarceration_period_id: i64,
        release_reason: IncarcerationReleaseReason,
    },

    #[error(
        "Admission reason {admission_reason} on incarceration period {incarceration_period_id} cannot follow a qualifying release"
    )]
    UnexpectedAdmissionReason {
        incarceration_period_id: i64,
        admission_reason: IncarcerationAdmissionReason,
    },

    #[error("Reincarceration on {reincarceration_date} precedes the release on {release_date}")]
    NegativeTimeAtLiberty {
        release_date: NaiveDate,
        reincarceration_date: NaiveDate,
    },
}
