#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Supervision time-bucket identification.
//!
//! [`identifier`] walks one person's supervision and incarceration records
//! and classifies every unit of supervision time into a
//! [`justice_metrics_supervision_models::SupervisionTimeBucket`]:
//! person-months on supervision, revocation returns, terminations, and
//! projected completions. [`violations`] derives the violation-history
//! summaries the buckets carry, and [`reconciler`] applies the per-state
//! dual-supervision policy to the finished list.

pub mod identifier;
pub mod reconciler;
pub mod violations;

use std::collections::BTreeMap;

use justice_metrics_entities::{
    AgentAssociation, Assessment, IncarcerationPeriod, IncarcerationSentence, SupervisionPeriod,
    SupervisionSentence, ViolationResponse,
};

/// One person's fully-hydrated supervision inputs, plus the association
/// maps resolved by the hydration layer.
#[derive(Debug, Clone, Copy)]
pub struct SupervisionRecords<'a> {
    pub supervision_periods: &'a [SupervisionPeriod],
    pub incarceration_periods: &'a [IncarcerationPeriod],
    pub supervision_sentences: &'a [SupervisionSentence],
    pub incarceration_sentences: &'a [IncarcerationSentence],
    pub assessments: &'a [Assessment],
    pub violation_responses: &'a [ViolationResponse],
    /// Violation-response id to officer/district.
    pub response_associations: &'a BTreeMap<i64, AgentAssociation>,
    /// Supervision-period id to officer/district.
    pub period_associations: &'a BTreeMap<i64, AgentAssociation>,
}
