#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-person pipeline orchestration.
//!
//! Runs the recidivism and supervision calculations over a batch of hydrated
//! person records. Each person is processed independently: a failure in one
//! person's records is logged and skipped without touching anyone else's
//! output.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use chrono::NaiveDate;
use justice_metrics_config::{CalculationConfig, StatePolicy};
use justice_metrics_entities::{
    AgentAssociation, Assessment, IncarcerationPeriod, IncarcerationSentence, Person,
    SupervisionPeriod, SupervisionSentence, ViolationResponse,
};
use justice_metrics_recidivism::RecidivismError;
use justice_metrics_recidivism_models::{AugmentedMetricKey, ReleaseCohorts};
use justice_metrics_supervision::SupervisionRecords;
use justice_metrics_supervision_models::SupervisionTimeBucket;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a single person's processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Recidivism(#[from] RecidivismError),

    #[error("Worker thread panicked while processing this person's records")]
    WorkerPanic,
}

/// Everything the hydration layer loads for one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecords {
    pub person: Person,
    pub county_of_residence: Option<String>,
    pub incarceration_periods: Vec<IncarcerationPeriod>,
    pub supervision_periods: Vec<SupervisionPeriod>,
    pub supervision_sentences: Vec<SupervisionSentence>,
    pub incarceration_sentences: Vec<IncarcerationSentence>,
    pub assessments: Vec<Assessment>,
    pub violation_responses: Vec<ViolationResponse>,
    /// Violation-response id to officer/district.
    pub response_associations: BTreeMap<i64, AgentAssociation>,
    /// Supervision-period id to officer/district.
    pub period_associations: BTreeMap<i64, AgentAssociation>,
}

impl PersonRecords {
    /// The state these records belong to, taken from the first period that
    /// carries one. Records are hydrated one state at a time.
    #[must_use]
    pub fn state_code(&self) -> Option<&str> {
        self.incarceration_periods
            .iter()
            .map(|period| period.state_code.as_str())
            .chain(
                self.supervision_periods
                    .iter()
                    .map(|period| period.state_code.as_str()),
            )
            .next()
    }

    fn supervision_records(&self) -> SupervisionRecords<'_> {
        SupervisionRecords {
            supervision_periods: &self.supervision_periods,
            incarceration_periods: &self.incarceration_periods,
            supervision_sentences: &self.supervision_sentences,
            incarceration_sentences: &self.incarceration_sentences,
            assessments: &self.assessments,
            violation_responses: &self.violation_responses,
            response_associations: &self.response_associations,
            period_associations: &self.period_associations,
        }
    }
}

/// One person's finished calculations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonOutput {
    pub person_id: i64,
    pub release_cohorts: ReleaseCohorts,
    pub recidivism_rows: Vec<(AugmentedMetricKey, i64)>,
    pub supervision_buckets: Vec<SupervisionTimeBucket>,
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
}

/// The outputs of a run plus its summary, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub outputs: Vec<PersonOutput>,
    pub summary: RunSummary,
}

/// Today's date in UTC, the reference point for a production run.
#[must_use]
pub fn current_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Runs the full calculation for one person.
///
/// # Errors
///
/// Returns an error when the person's incarceration history cannot be
/// normalized or classified. Supervision calculations log and skip bad
/// records instead of failing.
pub fn process_person(
    records: &PersonRecords,
    config: &CalculationConfig,
    today: NaiveDate,
) -> Result<PersonOutput, PipelineError> {
    let policy = records
        .state_code()
        .map_or_else(StatePolicy::default, |code| config.states.for_state(code));

    let release_cohorts = justice_metrics_recidivism::identifier::release_events_by_cohort(
        &records.incarceration_periods,
        &records.violation_responses,
        policy,
        records.county_of_residence.as_deref(),
    )?;
    let recidivism_rows = justice_metrics_recidivism::calculator::map_recidivism_metrics(
        &records.person,
        &release_cohorts,
        config,
        today,
    )?;

    let supervision_buckets = justice_metrics_supervision::identifier::supervision_time_buckets(
        &records.supervision_records(),
        policy,
        today,
    );

    Ok(PersonOutput {
        person_id: records.person.person_id,
        release_cohorts,
        recidivism_rows,
        supervision_buckets,
    })
}

/// Processes a batch of people in parallel, isolating per-person failures.
///
/// Outputs keep the input order. A person whose records fail to process is
/// counted in [`RunSummary::skipped`] and logged, never silently dropped.
#[must_use]
pub fn run(people: &[PersonRecords], config: &CalculationConfig, today: NaiveDate) -> RunOutcome {
    let workers = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    let chunk_size = people.len().div_ceil(workers).max(1);

    let results: Vec<Result<PersonOutput, PipelineError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = people
            .chunks(chunk_size)
            .map(|chunk| {
                let handle = scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|records| process_person(records, config, today))
                        .collect::<Vec<_>>()
                });
                (chunk.len(), handle)
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|(chunk_len, handle)| recovered_chunk_results(chunk_len, handle.join()))
            .collect()
    });

    let mut outputs = Vec::with_capacity(results.len());
    let mut skipped = 0;
    for (records, result) in people.iter().zip(results) {
        match result {
            Ok(output) => outputs.push(output),
            Err(error) => {
                skipped += 1;
                log::warn!(
                    "skipping person {}: {error}",
                    records.person.person_id
                );
            }
        }
    }

    let summary = RunSummary {
        processed: outputs.len(),
        skipped,
    };
    log::info!(
        "pipeline run finished: {} processed, {} skipped",
        summary.processed,
        summary.skipped
    );

    RunOutcome { outputs, summary }
}

/// Keeps the result list aligned with the input when a worker dies: every
/// person in a panicked chunk becomes an error row instead of vanishing.
fn recovered_chunk_results(
    chunk_len: usize,
    joined: std::thread::Result<Vec<Result<PersonOutput, PipelineError>>>,
) -> Vec<Result<PersonOutput, PipelineError>> {
    match joined {
        Ok(chunk_results) => chunk_results,
        Err(_) => {
            log::error!("pipeline worker thread panicked; skipping its {chunk_len} people");
            vec![Err(PipelineError::WorkerPanic); chunk_len]
        }
    }
}

#[cfg(test)]
mod tests {
    use justice_metrics_entities::{
        CustodyStatus, Gender, IncarcerationAdmissionReason, IncarcerationReleaseReason,
        SupervisionTerminationReason, SupervisionType,
    };
    use justice_metrics_recidivism_models::RecidivismMetricType;
    use justice_metrics_supervision_models::SupervisionTimeBucketKind;

    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn person(id: i64) -> Person {
        Person {
            person_id: id,
            birthdate: Some(d(1984, 8, 31)),
            gender: Some(Gender::Female),
            races: vec![],
            ethnicities: vec![],
        }
    }

    fn released_period(
        id: i64,
        admission: NaiveDate,
        release: NaiveDate,
        release_reason: Option<IncarcerationReleaseReason>,
    ) -> IncarcerationPeriod {
        IncarcerationPeriod {
            incarceration_period_id: id,
            external_id: None,
            state_code: "US_XX".to_string(),
            status: CustodyStatus::NotInCustody,
            facility: None,
            admission_date: Some(admission),
            admission_reason: Some(IncarcerationAdmissionReason::NewAdmission),
            release_date: Some(release),
            release_reason,
            source_violation_response_id: None,
        }
    }

    fn healthy_records(person_id: i64) -> PersonRecords {
        PersonRecords {
            person: person(person_id),
            incarceration_periods: vec![
                released_period(
                    1,
                    d(2008, 1, 1),
                    d(2010, 1, 1),
                    Some(IncarcerationReleaseReason::SentenceServed),
                ),
                released_period(
                    2,
                    d(2014, 1, 1),
                    d(2016, 1, 1),
                    Some(IncarcerationReleaseReason::SentenceServed),
                ),
            ],
            supervision_periods: vec![SupervisionPeriod {
                supervision_period_id: 1,
                state_code: "US_XX".to_string(),
                start_date: Some(d(2016, 1, 1)),
                termination_date: Some(d(2016, 3, 15)),
                termination_reason: Some(SupervisionTerminationReason::Discharge),
                supervision_type: Some(SupervisionType::Parole),
                supervision_site: None,
                case_types: vec![],
            }],
            ..PersonRecords::default()
        }
    }

    #[test]
    fn processes_recidivism_and_supervision_for_one_person() {
        let output = process_person(
            &healthy_records(1),
            &CalculationConfig::default(),
            d(2020, 1, 1),
        )
        .unwrap();

        assert_eq!(output.person_id, 1);
        assert_eq!(output.release_cohorts.len(), 2);
        assert!(output.recidivism_rows.iter().any(|(key, _)| {
            key.metric_type == RecidivismMetricType::Rate
        }));
        assert!(output.recidivism_rows.iter().any(|(key, _)| {
            key.metric_type == RecidivismMetricType::Count
        }));
        assert_eq!(output.supervision_buckets.len(), 4);
        assert!(output.supervision_buckets.iter().any(|bucket| {
            bucket.kind() == SupervisionTimeBucketKind::Termination
        }));
    }

    #[test]
    fn one_bad_person_does_not_sink_the_run() {
        let mut broken = healthy_records(2);
        // A release date with no recorded reason fails classification.
        broken.incarceration_periods[0].release_reason = None;

        let people = vec![healthy_records(1), broken, healthy_records(3)];
        let outcome = run(&people, &CalculationConfig::default(), d(2020, 1, 1));

        assert_eq!(outcome.summary.processed, 2);
        assert_eq!(outcome.summary.skipped, 1);
        let ids: Vec<i64> = outcome
            .outputs
            .iter()
            .map(|output| output.person_id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn panicked_worker_chunk_skips_every_person_in_it() {
        let panic_payload: Box<dyn std::any::Any + Send> = Box::new("boom");

        let results = recovered_chunk_results(3, Err(panic_payload));

        assert_eq!(results.len(), 3);
        assert!(
            results
                .iter()
                .all(|result| result == &Err(PipelineError::WorkerPanic))
        );

        // A healthy chunk passes through untouched.
        let passthrough = recovered_chunk_results(1, Ok(vec![Err(PipelineError::WorkerPanic)]));
        assert_eq!(passthrough.len(), 1);
    }

    #[test]
    fn empty_records_produce_empty_output() {
        let records = PersonRecords {
            person: person(9),
            ..PersonRecords::default()
        };

        let output =
            process_person(&records, &CalculationConfig::default(), d(2020, 1, 1)).unwrap();

        assert!(output.release_cohorts.is_empty());
        assert!(output.recidivism_rows.is_empty());
        assert!(output.supervision_buckets.is_empty());
    }
}
