//! Incarceration period normalization and release-event classification.
//!
//! Normalization turns one person's raw incarceration periods into a clean
//! chronological sequence: temporary holds are dropped, missing admission
//! data is recovered from a preceding transfer release where possible, and
//! facility-to-facility transfer chains are collapsed into a single stay.
//! Classification then walks the normalized sequence and emits one release
//! event per qualifying release, grouped by the release-cohort year.

use chrono::Datelike;
use justice_metrics_config::StatePolicy;
use justice_metrics_entities::{
    CustodyStatus, IncarcerationAdmissionReason, IncarcerationPeriod, IncarcerationReleaseReason,
    ViolationResponse, ViolationType,
};
use justice_metrics_recidivism_models::{
    NonRecidivismReleaseEvent, RecidivismReleaseEvent, ReincarcerationReturnType, ReleaseCohorts,
    ReleaseEvent, ReturnFromSupervisionType,
};

use crate::RecidivismError;

/// Normalizes a person's incarceration periods and classifies every
/// qualifying release into a cohort-grouped release event.
///
/// # Errors
///
/// Returns an error when a period carries unrecoverably missing admission
/// data or inconsistent release data.
pub fn release_events_by_cohort(
    periods: &[IncarcerationPeriod],
    violation_responses: &[ViolationResponse],
    policy: StatePolicy,
    county_of_residence: Option<&str>,
) -> Result<ReleaseCohorts, RecidivismError> {
    let normalized = normalize_periods(periods, policy)?;
    classify_release_events(&normalized, violation_responses, county_of_residence)
}

/// Drops temporary-custody periods, recovers missing admission data, sorts
/// by admission date, and collapses transfer chains.
///
/// # Errors
///
/// Returns an error when admission data is missing and the period does not
/// directly follow a transfer release, or when release data is set on only
/// one of date/reason.
pub fn normalize_periods(
    periods: &[IncarcerationPeriod],
    policy: StatePolicy,
) -> Result<Vec<IncarcerationPeriod>, RecidivismError> {
    let mut periods: Vec<IncarcerationPeriod> = periods
        .iter()
        .filter(|period| {
            period.admission_reason != Some(IncarcerationAdmissionReason::TemporaryCustody)
                && period.release_reason
                    != Some(IncarcerationReleaseReason::ReleasedFromTemporaryCustody)
        })
        .cloned()
        .collect();

    // A period missing its admission date sorts by release date, which
    // places it directly after the transfer release it follows.
    periods.sort_by_key(|period| {
        (
            period.admission_date.or(period.release_date),
            period.release_date,
        )
    });

    resolve_missing_admissions(&mut periods, policy)?;
    validate_periods(&periods)?;

    Ok(collapse_transfer_chains(periods))
}

fn resolve_missing_admissions(
    periods: &mut [IncarcerationPeriod],
    policy: StatePolicy,
) -> Result<(), RecidivismError> {
    for index in 0..periods.len() {
        let current = &periods[index];
        if current.admission_date.is_some() && current.admission_reason.is_some() {
            continue;
        }

        let linked_release = index
            .checked_sub(1)
            .map(|previous_index| &periods[previous_index])
            .and_then(|previous| {
                (previous.release_reason == Some(IncarcerationReleaseReason::Transfer))
                    .then_some(previous.release_date)
                    .flatten()
            });

        let Some(release_date) = linked_release else {
            return Err(RecidivismError::UnrecoverableMissingAdmission {
                incarceration_period_id: current.incarceration_period_id,
            });
        };

        if policy.infer_missing_admission_from_transfer {
            log::debug!(
                "inferring admission for incarceration period {} from the preceding transfer release",
                current.incarceration_period_id
            );
        } else {
            log::warn!(
                "incarceration period {} is missing admission data; linking it to the preceding transfer release",
                current.incarceration_period_id
            );
        }

        let current = &mut periods[index];
        current.admission_date.get_or_insert(release_date);
        current
            .admission_reason
            .get_or_insert(IncarcerationAdmissionReason::Transfer);
    }

    Ok(())
}

fn validate_periods(periods: &[IncarcerationPeriod]) -> Result<(), RecidivismError> {
    for period in periods {
        match (period.release_date, period.release_reason) {
            (Some(_), None) => {
                return Err(RecidivismError::MissingReleaseReason {
                    incarceration_period_id: period.incarceration_period_id,
                });
            }
            (None, Some(_)) => {
                return Err(RecidivismError::MissingReleaseDate {
                    incarceration_period_id: period.incarceration_period_id,
                });
            }
            (None, None) if period.status == CustodyStatus::NotInCustody => {
                return Err(RecidivismError::MissingReleaseDate {
                    incarceration_period_id: period.incarceration_period_id,
                });
            }
            _ => {}
        }
    }

    Ok(())
}

/// Merges each transfer-linked pair into one period spanning the first
/// admission through the last release. Chains collapse transitively because
/// the merged period keeps absorbing the next transfer admission.
fn collapse_transfer_chains(periods: Vec<IncarcerationPeriod>) -> Vec<IncarcerationPeriod> {
    let mut collapsed: Vec<IncarcerationPeriod> = Vec::with_capacity(periods.len());

    for period in periods {
        match collapsed.last_mut() {
            Some(previous)
                if previous.release_reason == Some(IncarcerationReleaseReason::Transfer)
                    && period.admission_reason
                        == Some(IncarcerationAdmissionReason::Transfer) =>
            {
                previous.status = period.status;
                previous.facility = period.facility;
                previous.release_date = period.release_date;
                previous.release_reason = period.release_reason;
            }
            _ => collapsed.push(period),
        }
    }

    collapsed
}

/// Walks normalized periods and emits release events grouped by the
/// release-cohort year.
///
/// # Errors
///
/// Returns an error when a release or admission reason survives
/// normalization that the classification table cannot place.
pub fn classify_release_events(
    periods: &[IncarcerationPeriod],
    violation_responses: &[ViolationResponse],
    county_of_residence: Option<&str>,
) -> Result<ReleaseCohorts, RecidivismError> {
    let mut cohorts = ReleaseCohorts::new();

    for (index, period) in periods.iter().enumerate() {
        let Some(event) = event_for_period(
            period,
            periods.get(index + 1),
            violation_responses,
            county_of_residence,
        )?
        else {
            continue;
        };

        cohorts
            .entry(event.release_date().year())
            .or_default()
            .push(event);
    }

    Ok(cohorts)
}

const fn release_qualifies(reason: IncarcerationReleaseReason) -> bool {
    matches!(
        reason,
        IncarcerationReleaseReason::Commuted
            | IncarcerationReleaseReason::Compassionate
            | IncarcerationReleaseReason::ConditionalRelease
            | IncarcerationReleaseReason::ExternalUnknown
            | IncarcerationReleaseReason::SentenceServed
    )
}

const fn release_never_qualifies(reason: IncarcerationReleaseReason) -> bool {
    matches!(
        reason,
        IncarcerationReleaseReason::CourtOrder
            | IncarcerationReleaseReason::Death
            | IncarcerationReleaseReason::Escape
            | IncarcerationReleaseReason::Execution
            | IncarcerationReleaseReason::ReleasedInError
            | IncarcerationReleaseReason::Transfer
    )
}

fn event_for_period(
    period: &IncarcerationPeriod,
    next: Option<&IncarcerationPeriod>,
    violation_responses: &[ViolationResponse],
    county_of_residence: Option<&str>,
) -> Result<Option<ReleaseEvent>, RecidivismError> {
    let Some(original_admission_date) = period.admission_date else {
        return Err(RecidivismError::UnrecoverableMissingAdmission {
            incarceration_period_id: period.incarceration_period_id,
        });
    };

    let Some(release_date) = period.release_date else {
        // Still in custody. A later period here means the records overlap.
        if next.is_some() {
            log::warn!(
                "open incarceration period {} precedes another admission; no release event emitted",
                period.incarceration_period_id
            );
        }
        return Ok(None);
    };

    let Some(release_reason) = period.release_reason else {
        return Err(RecidivismError::MissingReleaseReason {
            incarceration_period_id: period.incarceration_period_id,
        });
    };

    if release_never_qualifies(release_reason) {
        return Ok(None);
    }
    if !release_qualifies(release_reason) {
        return Err(RecidivismError::UnexpectedReleaseReason {
            incarceration_period_id: period.incarceration_period_id,
            release_reason,
        });
    }

    let Some(next_period) = next else {
        return Ok(Some(ReleaseEvent::NonRecidivism(NonRecidivismReleaseEvent {
            state_code: period.state_code.clone(),
            original_admission_date,
            release_date,
            release_facility: period.facility.clone(),
            county_of_residence: county_of_residence.map(str::to_string),
        })));
    };

    let Some(reincarceration_date) = next_period.admission_date else {
        return Err(RecidivismError::UnrecoverableMissingAdmission {
            incarceration_period_id: next_period.incarceration_period_id,
        });
    };

    let (return_type, from_supervision_type) = match next_period.admission_reason {
        Some(
            IncarcerationAdmissionReason::AdmittedInError
            | IncarcerationAdmissionReason::ExternalUnknown
            | IncarcerationAdmissionReason::NewAdmission
            | IncarcerationAdmissionReason::Transfer,
        ) => (ReincarcerationReturnType::NewAdmission, None),
        Some(IncarcerationAdmissionReason::ParoleRevocation) => (
            ReincarcerationReturnType::Revocation,
            Some(ReturnFromSupervisionType::Parole),
        ),
        Some(IncarcerationAdmissionReason::ProbationRevocation) => (
            ReincarcerationReturnType::Revocation,
            Some(ReturnFromSupervisionType::Probation),
        ),
        Some(admission_reason) => {
            return Err(RecidivismError::UnexpectedAdmissionReason {
                incarceration_period_id: next_period.incarceration_period_id,
                admission_reason,
            });
        }
        None => {
            return Err(RecidivismError::UnrecoverableMissingAdmission {
                incarceration_period_id: next_period.incarceration_period_id,
            });
        }
    };

    let source_violation_type = if return_type == ReincarcerationReturnType::Revocation {
        violation_type_for_admission(next_period, violation_responses)
    } else {
        None
    };

    Ok(Some(ReleaseEvent::Recidivism(RecidivismReleaseEvent {
        state_code: period.state_code.clone(),
        original_admission_date,
        release_date,
        release_facility: period.facility.clone(),
        reincarceration_date,
        reincarceration_facility: next_period.facility.clone(),
        return_type,
        from_supervision_type,
        source_violation_type,
        county_of_residence: county_of_residence.map(str::to_string),
    })))
}

/// The most severe violation type on the violation behind the response that
/// triggered the admission.
fn violation_type_for_admission(
    period: &IncarcerationPeriod,
    violation_responses: &[ViolationResponse],
) -> Option<ViolationType> {
    let response_id = period.source_violation_response_id?;
    let response = violation_responses
        .iter()
        .find(|response| response.supervision_violation_response_id == response_id)?;
    let violation = response.violation.as_ref()?;

    ViolationType::severity_order()
        .iter()
        .copied()
        .find(|violation_type| violation.violation_types.contains(violation_type))
}
