//! The supervision time-bucket state machine.
//!
//! Walks one person's supervision periods month by month, detects
//! revocation returns from the incarceration periods, and scores
//! terminations and projected completions. The finished list is handed to
//! the dual-supervision reconciler before it is returned.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use justice_metrics_config::StatePolicy;
use justice_metrics_dates::{
    add_months, first_day_of_month, last_day_of_month, sub_months, year_month,
};
use justice_metrics_entities::{
    Assessment, CaseType, IncarcerationPeriod, RevocationType, SupervisionPeriod,
    SupervisionTerminationReason, SupervisionType, ViolationResponse, ViolationType,
};
use justice_metrics_supervision_models::{
    NonRevocationReturnBucket, ProjectedCompletionBucket, RevocationReturnBucket,
    SupervisionTimeBucket, TerminationBucket,
};

use crate::{SupervisionRecords, reconciler, violations};

/// How long a terminated supervision period stays relevant to a later
/// revocation admission, in months.
pub const REVOCATION_PROXIMITY_MONTHS: u32 = 24;

/// Classifies every unit of a person's supervision time into buckets and
/// applies the state's dual-supervision policy.
#[must_use]
pub fn supervision_time_buckets(
    records: &SupervisionRecords<'_>,
    policy: StatePolicy,
    today: NaiveDate,
) -> Vec<SupervisionTimeBucket> {
    let index = IncarcerationIndex::build(records.incarceration_periods, today);
    let mut buckets = Vec::new();

    for period in records.supervision_periods {
        non_revocation_buckets(&mut buckets, period, records, &index, today);
        if let Some(bucket) = termination_bucket(period, records) {
            buckets.push(bucket);
        }
    }

    revocation_buckets(&mut buckets, records, policy);
    completion_buckets(&mut buckets, records, today);

    reconciler::reconcile_dual_supervision(buckets, policy)
}

/// Month-keyed views over the incarceration periods.
struct IncarcerationIndex {
    /// Months where the person was incarcerated on every day.
    fully_incarcerated_months: BTreeSet<(i32, u32)>,
    /// Months containing a revocation admission.
    revocation_admission_months: BTreeSet<(i32, u32)>,
}

impl IncarcerationIndex {
    fn build(periods: &[IncarcerationPeriod], today: NaiveDate) -> Self {
        let mut fully_incarcerated_months = BTreeSet::new();

        for period in periods {
            let Some(admission) = period.admission_date else {
                continue;
            };
            let release = period.release_date.unwrap_or(today);

            let mut month_start = if admission.day() == 1 {
                admission
            } else {
                first_day_of_month(add_months(admission, 1))
            };
            while last_day_of_month(month_start) < release {
                fully_incarcerated_months.insert(year_month(month_start));
                month_start = add_months(month_start, 1);
            }
        }

        let revocation_admission_months = periods
            .iter()
            .filter(|period| period.is_revocation_admission())
            .filter_map(|period| period.admission_date)
            .map(year_month)
            .collect();

        Self {
            fully_incarcerated_months,
            revocation_admission_months,
        }
    }
}

fn incarcerated_on(periods: &[IncarcerationPeriod], date: NaiveDate) -> bool {
    periods.iter().any(|period| {
        period
            .admission_date
            .is_some_and(|admission| admission <= date)
            && period.release_date.is_none_or(|release| date < release)
    })
}

fn most_severe_case_type(period: &SupervisionPeriod) -> CaseType {
    CaseType::severity_order()
        .iter()
        .copied()
        .find(|case_type| period.case_types.contains(case_type))
        .unwrap_or(CaseType::General)
}

fn most_recent_assessment(assessments: &[Assessment], cutoff: NaiveDate) -> Option<&Assessment> {
    assessments
        .iter()
        .filter(|assessment| {
            assessment
                .assessment_date
                .is_some_and(|date| date <= cutoff)
                && assessment.assessment_score.is_some()
        })
        .max_by_key(|assessment| assessment.assessment_date)
}

/// Officer and district for a supervision period. The site recorded on the
/// period wins over the association's district.
fn period_officer_district(
    records: &SupervisionRecords<'_>,
    period: &SupervisionPeriod,
) -> (Option<String>, Option<String>) {
    let association = records.period_associations.get(&period.supervision_period_id);
    if association.is_none() {
        log::warn!(
            "no officer association for supervision period {}",
            period.supervision_period_id
        );
    }

    let officer = association.and_then(|association| association.agent_external_id.clone());
    let district = period.supervision_site.clone().or_else(|| {
        association.and_then(|association| association.district_external_id.clone())
    });

    (officer, district)
}

/// Resolves the supervision type in effect on `date` from the sentences,
/// falling back to the type recorded on the period. Serving parole and
/// probation at once resolves to DUAL.
fn resolve_supervision_type(
    period: Option<&SupervisionPeriod>,
    date: NaiveDate,
    records: &SupervisionRecords<'_>,
) -> Option<SupervisionType> {
    let mut parole = false;
    let mut probation = false;

    for sentence in records.supervision_sentences {
        if !sentence_applies(
            period,
            &sentence.supervision_period_ids,
            sentence.start_date,
            sentence.completion_date,
            date,
        ) {
            continue;
        }
        match sentence.supervision_type {
            Some(SupervisionType::Parole) => parole = true,
            Some(SupervisionType::Probation) => probation = true,
            Some(SupervisionType::Dual) => {
                parole = true;
                probation = true;
            }
            None => {}
        }
    }

    // Supervision served under an incarceration sentence is parole.
    for sentence in records.incarceration_sentences {
        if sentence_applies(
            period,
            &sentence.supervision_period_ids,
            sentence.start_date,
            sentence.completion_date,
            date,
        ) {
            parole = true;
        }
    }

    match (parole, probation) {
        (true, true) => Some(SupervisionType::Dual),
        (true, false) => Some(SupervisionType::Parole),
        (false, true) => Some(SupervisionType::Probation),
        (false, false) => period.and_then(|period| period.supervision_type),
    }
}

fn sentence_applies(
    period: Option<&SupervisionPeriod>,
    period_ids: &[i64],
    start_date: Option<NaiveDate>,
    completion_date: Option<NaiveDate>,
    date: NaiveDate,
) -> bool {
    if let Some(period) = period {
        if !period_ids.is_empty() && !period_ids.contains(&period.supervision_period_id) {
            return false;
        }
    }

    start_date.is_some_and(|start| start <= date)
        && completion_date.is_none_or(|completion| date <= completion)
}

fn non_revocation_buckets(
    buckets: &mut Vec<SupervisionTimeBucket>,
    period: &SupervisionPeriod,
    records: &SupervisionRecords<'_>,
    index: &IncarcerationIndex,
    today: NaiveDate,
) {
    let Some(start_date) = period.start_date else {
        log::warn!(
            "supervision period {} has no start date; skipping",
            period.supervision_period_id
        );
        return;
    };

    // Last full day on supervision: the day before termination, or today
    // while the period is still active.
    let last_full_day = period
        .termination_date
        .map_or(today, |termination| {
            termination
                .checked_sub_days(Days::new(1))
                .unwrap_or(termination)
        })
        .min(today);
    if last_full_day < start_date {
        return;
    }

    let final_month = first_day_of_month(last_full_day);
    let mut month_start = first_day_of_month(start_date);

    while month_start <= final_month {
        let month = year_month(month_start);
        let month_end = last_day_of_month(month_start);

        if index.fully_incarcerated_months.contains(&month)
            || index.revocation_admission_months.contains(&month)
        {
            month_start = add_months(month_start, 1);
            continue;
        }

        // The final month yields nothing when an incarceration stay covers
        // the supervision time remaining in it.
        if month_start == final_month {
            if let Some(termination) = period.termination_date {
                let overlapped = records.incarceration_periods.iter().any(|incarceration| {
                    incarceration
                        .admission_date
                        .is_some_and(|admission| admission <= month_start)
                        && incarceration
                            .release_date
                            .is_none_or(|release| termination <= release)
                });
                if overlapped {
                    break;
                }
            }
        }

        let Some(supervision_type) =
            resolve_supervision_type(Some(period), month_end.min(last_full_day), records)
        else {
            log::debug!(
                "supervision type unresolvable for period {} in {}-{:02}",
                period.supervision_period_id,
                month.0,
                month.1
            );
            month_start = add_months(month_start, 1);
            continue;
        };

        let assessment = most_recent_assessment(records.assessments, month_end);
        let violation_cutoff = period
            .termination_date
            .map_or(month_end, |termination| termination.min(month_end));
        let (officer, district) = period_officer_district(records, period);

        let is_on_supervision_last_day_of_month = today >= month_end
            && !incarcerated_on(records.incarceration_periods, month_end)
            && period.overlaps_day(month_end);

        buckets.push(SupervisionTimeBucket::NonRevocationReturn(
            NonRevocationReturnBucket {
                state_code: period.state_code.clone(),
                year: month.0,
                month: month.1,
                supervision_type,
                case_type: most_severe_case_type(period),
                assessment_score: assessment.and_then(|assessment| assessment.assessment_score),
                assessment_level: assessment.and_then(|assessment| assessment.assessment_level),
                assessment_type: assessment.and_then(|assessment| assessment.assessment_type),
                violation_history: violations::violation_history(
                    records.violation_responses,
                    violation_cutoff,
                ),
                supervising_officer_external_id: officer,
                supervising_district_external_id: district,
                is_on_supervision_last_day_of_month,
            },
        ));

        month_start = add_months(month_start, 1);
    }
}

fn termination_bucket(
    period: &SupervisionPeriod,
    records: &SupervisionRecords<'_>,
) -> Option<SupervisionTimeBucket> {
    let start_date = period.start_date?;
    let termination_date = period.termination_date?;
    let Some(termination_reason) = period.termination_reason else {
        log::debug!(
            "supervision period {} terminated without a reason; no termination bucket",
            period.supervision_period_id
        );
        return None;
    };

    let (year, month) = year_month(termination_date);

    // Periods terminating in the same month widen the measured span, so
    // back-to-back transfers do not fragment the score change.
    let mut span_start = start_date;
    let mut span_end = termination_date;
    for other in records.supervision_periods {
        if other
            .termination_date
            .is_some_and(|termination| year_month(termination) == (year, month))
        {
            if let Some(other_start) = other.start_date {
                span_start = span_start.min(other_start);
            }
            if let Some(other_termination) = other.termination_date {
                span_end = span_end.max(other_termination);
            }
        }
    }

    let Some(supervision_type) = resolve_supervision_type(Some(period), termination_date, records)
    else {
        log::debug!(
            "supervision type unresolvable for period {} at termination",
            period.supervision_period_id
        );
        return None;
    };

    let (officer, district) = period_officer_district(records, period);

    Some(SupervisionTimeBucket::Termination(TerminationBucket {
        state_code: period.state_code.clone(),
        year,
        month,
        supervision_type,
        case_type: most_severe_case_type(period),
        termination_reason,
        assessment_score_change: assessment_score_change(records.assessments, span_start, span_end),
        supervising_officer_external_id: officer,
        supervising_district_external_id: district,
    }))
}

/// Last assessment score in the span minus the second one. The first
/// assessment is intake and never anchors the change.
fn assessment_score_change(
    assessments: &[Assessment],
    span_start: NaiveDate,
    span_end: NaiveDate,
) -> Option<i32> {
    let mut scored: Vec<(NaiveDate, i32)> = assessments
        .iter()
        .filter_map(|assessment| {
            let date = assessment.assessment_date?;
            let score = assessment.assessment_score?;
            (span_start <= date && date <= span_end).then_some((date, score))
        })
        .collect();
    scored.sort_by_key(|(date, _)| *date);

    let (_, second_score) = scored.get(1)?;
    let (_, last_score) = scored.last()?;
    Some(last_score - second_score)
}

fn revocation_buckets(
    buckets: &mut Vec<SupervisionTimeBucket>,
    records: &SupervisionRecords<'_>,
    policy: StatePolicy,
) {
    for incarceration in records.incarceration_periods {
        if !incarceration.is_revocation_admission() {
            continue;
        }
        let Some(admission_date) = incarceration.admission_date else {
            continue;
        };

        let response = incarceration.source_violation_response_id.and_then(|id| {
            records
                .violation_responses
                .iter()
                .find(|response| response.supervision_violation_response_id == id)
        });
        let revocation_type = revocation_type_for(response);
        let source_violation_type = response
            .and_then(|response| response.violation.as_ref())
            .and_then(|violation| {
                ViolationType::severity_order()
                    .iter()
                    .copied()
                    .find(|candidate| violation.violation_types.contains(candidate))
            });
        let history = violations::violation_history(records.violation_responses, admission_date);
        let assessment = most_recent_assessment(records.assessments, admission_date);
        let (year, month) = year_month(admission_date);

        let response_association = incarceration
            .source_violation_response_id
            .and_then(|id| records.response_associations.get(&id));
        if response_association.is_none() {
            log::warn!(
                "no officer association for the violation response behind incarceration period {}",
                incarceration.incarceration_period_id
            );
        }

        let relevant = relevant_supervision_periods(records.supervision_periods, admission_date);

        if relevant.is_empty() {
            let Some(supervision_type) = resolve_supervision_type(None, admission_date, records)
            else {
                log::debug!(
                    "supervision type at revocation admission {} unresolvable; skipping",
                    incarceration.incarceration_period_id
                );
                continue;
            };

            buckets.push(SupervisionTimeBucket::RevocationReturn(
                RevocationReturnBucket {
                    state_code: incarceration.state_code.clone(),
                    year,
                    month,
                    supervision_type,
                    case_type: CaseType::General,
                    assessment_score: assessment
                        .and_then(|assessment| assessment.assessment_score),
                    assessment_level: assessment
                        .and_then(|assessment| assessment.assessment_level),
                    assessment_type: assessment
                        .and_then(|assessment| assessment.assessment_type),
                    revocation_type,
                    source_violation_type,
                    violation_history: history.clone(),
                    supervising_officer_external_id: response_association
                        .and_then(|association| association.agent_external_id.clone()),
                    supervising_district_external_id: response_association
                        .and_then(|association| association.district_external_id.clone()),
                },
            ));
            continue;
        }

        for period in relevant {
            let Some(supervision_type) =
                resolve_supervision_type(Some(period), admission_date, records)
            else {
                log::debug!(
                    "supervision type at revocation admission {} unresolvable for period {}",
                    incarceration.incarceration_period_id,
                    period.supervision_period_id
                );
                continue;
            };

            let (mut officer, mut district) = (
                response_association
                    .and_then(|association| association.agent_external_id.clone()),
                response_association
                    .and_then(|association| association.district_external_id.clone()),
            );
            if officer.is_none()
                && district.is_none()
                && policy.default_to_period_officer_for_revocation
            {
                (officer, district) = period_officer_district(records, period);
            }

            buckets.push(SupervisionTimeBucket::RevocationReturn(
                RevocationReturnBucket {
                    state_code: incarceration.state_code.clone(),
                    year,
                    month,
                    supervision_type,
                    case_type: most_severe_case_type(period),
                    assessment_score: assessment
                        .and_then(|assessment| assessment.assessment_score),
                    assessment_level: assessment
                        .and_then(|assessment| assessment.assessment_level),
                    assessment_type: assessment
                        .and_then(|assessment| assessment.assessment_type),
                    revocation_type,
                    source_violation_type,
                    violation_history: history.clone(),
                    supervising_officer_external_id: officer,
                    supervising_district_external_id: district,
                },
            ));
        }
    }
}

/// Supervision periods a revocation admission is charged against: every
/// period overlapping the admission day, else the most recently terminated
/// period within the proximity window.
fn relevant_supervision_periods<'a>(
    periods: &'a [SupervisionPeriod],
    admission_date: NaiveDate,
) -> Vec<&'a SupervisionPeriod> {
    let overlapping: Vec<&SupervisionPeriod> = periods
        .iter()
        .filter(|period| {
            period.start_date.is_some_and(|start| start <= admission_date)
                && period
                    .termination_date
                    .is_none_or(|termination| admission_date <= termination)
        })
        .collect();
    if !overlapping.is_empty() {
        return overlapping;
    }

    let earliest = sub_months(admission_date, REVOCATION_PROXIMITY_MONTHS);
    let latest_termination = periods
        .iter()
        .filter_map(|period| period.termination_date)
        .filter(|termination| *termination <= admission_date && *termination >= earliest)
        .max();

    let Some(latest_termination) = latest_termination else {
        return Vec::new();
    };
    periods
        .iter()
        .filter(|period| period.termination_date == Some(latest_termination))
        .collect()
}

/// Most severe revocation type on the response's decisions, else the
/// response-level type, else a plain reincarceration.
fn revocation_type_for(response: Option<&ViolationResponse>) -> RevocationType {
    let from_decisions = response.and_then(|response| {
        RevocationType::severity_order()
            .iter()
            .copied()
            .find(|candidate| {
                response
                    .decision_entries
                    .iter()
                    .any(|entry| entry.revocation_type == Some(*candidate))
            })
    });

    from_decisions
        .or_else(|| {
            response
                .and_then(|response| response.revocation_type)
                .filter(|revocation_type| *revocation_type != RevocationType::ReturnToSupervision)
        })
        .unwrap_or(RevocationType::Reincarceration)
}

fn completion_buckets(
    buckets: &mut Vec<SupervisionTimeBucket>,
    records: &SupervisionRecords<'_>,
    today: NaiveDate,
) {
    for sentence in records.supervision_sentences {
        let Some(start_date) = sentence.start_date else {
            continue;
        };
        let Some(projected_completion) = sentence.projected_completion_date else {
            continue;
        };
        if projected_completion > today {
            continue;
        }
        let Some(completion_date) = sentence.completion_date else {
            continue;
        };

        let Some(period) =
            latest_terminated_period(records.supervision_periods, &sentence.supervision_period_ids)
        else {
            log::warn!(
                "no terminated supervision period associated with sentence {}",
                sentence.supervision_sentence_id
            );
            continue;
        };
        let Some(termination_reason) = period.termination_reason else {
            continue;
        };

        let successful_completion = match termination_reason {
            SupervisionTerminationReason::Discharge | SupervisionTerminationReason::Expiration => {
                true
            }
            SupervisionTerminationReason::Absconsion | SupervisionTerminationReason::Revocation => {
                false
            }
            SupervisionTerminationReason::Death
            | SupervisionTerminationReason::ExternalUnknown
            | SupervisionTerminationReason::InternalUnknown
            | SupervisionTerminationReason::ReturnFromAbsconsion
            | SupervisionTerminationReason::Suspension
            | SupervisionTerminationReason::TransferWithinState
            | SupervisionTerminationReason::TransferOutOfState => continue,
        };

        if completion_date < start_date {
            log::warn!(
                "supervision sentence {} completes before it starts; skipping",
                sentence.supervision_sentence_id
            );
            continue;
        }

        let Some(supervision_type) = sentence
            .supervision_type
            .or_else(|| resolve_supervision_type(Some(period), completion_date, records))
        else {
            log::debug!(
                "supervision type unresolvable for sentence {}; skipping",
                sentence.supervision_sentence_id
            );
            continue;
        };

        let (officer, district) = period_officer_district(records, period);
        let (year, month) = year_month(projected_completion);

        buckets.push(SupervisionTimeBucket::ProjectedCompletion(
            ProjectedCompletionBucket {
                state_code: sentence.state_code.clone(),
                year,
                month,
                supervision_type,
                case_type: most_severe_case_type(period),
                successful_completion,
                incarcerated_during_sentence: records.incarceration_periods.iter().any(
                    |incarceration| {
                        incarceration
                            .admission_date
                            .is_some_and(|admission| {
                                start_date <= admission && admission < completion_date
                            })
                    },
                ),
                sentence_days_served: (completion_date - start_date).num_days(),
                supervising_officer_external_id: officer,
                supervising_district_external_id: district,
            },
        ));
    }
}

fn latest_terminated_period<'a>(
    periods: &'a [SupervisionPeriod],
    period_ids: &[i64],
) -> Option<&'a SupervisionPeriod> {
    periods
        .iter()
        .filter(|period| period_ids.contains(&period.supervision_period_id))
        .filter(|period| period.termination_date.is_some())
        .max_by_key(|period| period.termination_date)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use justice_metrics_entities::{
        AgentAssociation, CustodyStatus, IncarcerationAdmissionReason, IncarcerationReleaseReason,
        IncarcerationSentence, SupervisionSentence,
    };
    use justice_metrics_supervision_models::SupervisionTimeBucketKind;

    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn supervision_period(
        id: i64,
        start: NaiveDate,
        termination: Option<(NaiveDate, SupervisionTerminationReason)>,
    ) -> SupervisionPeriod {
        SupervisionPeriod {
            supervision_period_id: id,
            state_code: "US_XX".to_string(),
            start_date: Some(start),
            termination_date: termination.map(|(date, _)| date),
            termination_reason: termination.map(|(_, reason)| reason),
            supervision_type: Some(SupervisionType::Parole),
            supervision_site: None,
            case_types: vec![],
        }
    }

    fn incarceration_period(
        id: i64,
        admission: NaiveDate,
        admission_reason: IncarcerationAdmissionReason,
        release: Option<NaiveDate>,
    ) -> IncarcerationPeriod {
        IncarcerationPeriod {
            incarceration_period_id: id,
            external_id: None,
            state_code: "US_XX".to_string(),
            status: if release.is_some() {
                CustodyStatus::NotInCustody
            } else {
                CustodyStatus::InCustody
            },
            facility: None,
            admission_date: Some(admission),
            admission_reason: Some(admission_reason),
            release_date: release,
            release_reason: release.map(|_| IncarcerationReleaseReason::ConditionalRelease),
            source_violation_response_id: None,
        }
    }

    struct Fixture {
        supervision_periods: Vec<SupervisionPeriod>,
        incarceration_periods: Vec<IncarcerationPeriod>,
        supervision_sentences: Vec<SupervisionSentence>,
        incarceration_sentences: Vec<IncarcerationSentence>,
        assessments: Vec<Assessment>,
        violation_responses: Vec<ViolationResponse>,
        response_associations: BTreeMap<i64, AgentAssociation>,
        period_associations: BTreeMap<i64, AgentAssociation>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                supervision_periods: vec![],
                incarceration_periods: vec![],
                supervision_sentences: vec![],
                incarceration_sentences: vec![],
                assessments: vec![],
                violation_responses: vec![],
                response_associations: BTreeMap::new(),
                period_associations: BTreeMap::new(),
            }
        }

        fn records(&self) -> SupervisionRecords<'_> {
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

    #[test]
    fn one_bucket_per_month_on_supervision() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2018, 3, 5),
            Some((d(2018, 5, 19), SupervisionTerminationReason::Discharge)),
        ));

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        let months: Vec<(i32, u32)> = buckets
            .iter()
            .filter(|bucket| bucket.kind() == SupervisionTimeBucketKind::NonRevocationReturn)
            .map(SupervisionTimeBucket::year_month)
            .collect();
        assert_eq!(months, vec![(2018, 3), (2018, 4), (2018, 5)]);

        let flags: Vec<bool> = buckets
            .iter()
            .filter_map(|bucket| match bucket {
                SupervisionTimeBucket::NonRevocationReturn(bucket) => {
                    Some(bucket.is_on_supervision_last_day_of_month)
                }
                _ => None,
            })
            .collect();
        // The period terminates mid-May, so May's last day is off
        // supervision.
        assert_eq!(flags, vec![true, true, false]);

        // The termination also yields a termination bucket in May.
        assert!(buckets.iter().any(|bucket| {
            bucket.kind() == SupervisionTimeBucketKind::Termination
                && bucket.year_month() == (2018, 5)
        }));
    }

    #[test]
    fn fully_incarcerated_months_are_skipped() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2018, 3, 5),
            Some((d(2018, 5, 19), SupervisionTerminationReason::Discharge)),
        ));
        fixture.incarceration_periods.push(incarceration_period(
            10,
            d(2018, 3, 25),
            IncarcerationAdmissionReason::NewAdmission,
            Some(d(2018, 5, 3)),
        ));

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        let months: Vec<(i32, u32)> = buckets
            .iter()
            .filter(|bucket| bucket.kind() == SupervisionTimeBucketKind::NonRevocationReturn)
            .map(SupervisionTimeBucket::year_month)
            .collect();
        assert_eq!(months, vec![(2018, 3), (2018, 5)]);
    }

    #[test]
    fn revocation_admission_replaces_the_month_bucket() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2018, 3, 5),
            Some((d(2018, 4, 10), SupervisionTerminationReason::Revocation)),
        ));
        fixture.incarceration_periods.push(incarceration_period(
            10,
            d(2018, 4, 10),
            IncarcerationAdmissionReason::ParoleRevocation,
            None,
        ));

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        assert!(!buckets.iter().any(|bucket| {
            bucket.kind() == SupervisionTimeBucketKind::NonRevocationReturn
                && bucket.year_month() == (2018, 4)
        }));

        let revocation = buckets
            .iter()
            .find_map(|bucket| match bucket {
                SupervisionTimeBucket::RevocationReturn(bucket) => Some(bucket),
                _ => None,
            })
            .unwrap();
        assert_eq!((revocation.year, revocation.month), (2018, 4));
        assert_eq!(revocation.supervision_type, SupervisionType::Parole);
        assert_eq!(revocation.revocation_type, RevocationType::Reincarceration);
        assert_eq!(revocation.case_type, CaseType::General);
    }

    #[test]
    fn recently_terminated_period_stays_relevant_to_a_revocation() {
        let terminated = supervision_period(
            1,
            d(2016, 1, 1),
            Some((d(2017, 1, 15), SupervisionTerminationReason::Expiration)),
        );

        let relevant = relevant_supervision_periods(
            std::slice::from_ref(&terminated),
            d(2018, 6, 1),
        );
        assert_eq!(relevant.len(), 1);

        // Outside the proximity window nothing is relevant.
        let relevant = relevant_supervision_periods(
            std::slice::from_ref(&terminated),
            d(2019, 2, 1),
        );
        assert!(relevant.is_empty());
    }

    #[test]
    fn revocation_officer_falls_back_to_the_period_association_per_policy() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2018, 1, 1),
            Some((d(2018, 4, 10), SupervisionTerminationReason::Revocation)),
        ));
        fixture.incarceration_periods.push(incarceration_period(
            10,
            d(2018, 4, 10),
            IncarcerationAdmissionReason::ParoleRevocation,
            None,
        ));
        fixture.period_associations.insert(
            1,
            AgentAssociation {
                agent_external_id: Some("OFFICER_7".to_string()),
                district_external_id: Some("DISTRICT_2".to_string()),
            },
        );

        let with_fallback = StatePolicy {
            default_to_period_officer_for_revocation: true,
            ..StatePolicy::default()
        };
        let buckets = supervision_time_buckets(&fixture.records(), with_fallback, d(2019, 1, 1));
        let revocation = buckets
            .iter()
            .find_map(|bucket| match bucket {
                SupervisionTimeBucket::RevocationReturn(bucket) => Some(bucket),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            revocation.supervising_officer_external_id.as_deref(),
            Some("OFFICER_7")
        );

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));
        let revocation = buckets
            .iter()
            .find_map(|bucket| match bucket {
                SupervisionTimeBucket::RevocationReturn(bucket) => Some(bucket),
                _ => None,
            })
            .unwrap();
        assert_eq!(revocation.supervising_officer_external_id, None);
    }

    #[test]
    fn termination_span_widens_across_same_month_terminations() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2018, 1, 10),
            Some((d(2018, 11, 5), SupervisionTerminationReason::TransferWithinState)),
        ));
        fixture.supervision_periods.push(supervision_period(
            2,
            d(2018, 5, 1),
            Some((d(2018, 11, 20), SupervisionTerminationReason::Discharge)),
        ));
        for (id, date, score) in [
            (1, d(2018, 1, 15), 30),
            (2, d(2018, 3, 1), 28),
            (3, d(2018, 10, 1), 22),
        ] {
            fixture.assessments.push(Assessment {
                assessment_id: id,
                state_code: "US_XX".to_string(),
                assessment_date: Some(date),
                assessment_score: Some(score),
                assessment_level: None,
                assessment_type: None,
            });
        }

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        let changes: Vec<Option<i32>> = buckets
            .iter()
            .filter_map(|bucket| match bucket {
                SupervisionTimeBucket::Termination(bucket) => {
                    Some(bucket.assessment_score_change)
                }
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![Some(-6), Some(-6)]);
    }

    #[test]
    fn completed_sentence_scores_success_by_termination_reason() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2016, 3, 1),
            Some((d(2018, 2, 25), SupervisionTerminationReason::Discharge)),
        ));
        fixture.supervision_sentences.push(SupervisionSentence {
            supervision_sentence_id: 100,
            state_code: "US_XX".to_string(),
            supervision_type: Some(SupervisionType::Probation),
            start_date: Some(d(2016, 3, 1)),
            completion_date: Some(d(2018, 2, 25)),
            projected_completion_date: Some(d(2018, 3, 1)),
            supervision_period_ids: vec![1],
        });
        fixture.incarceration_periods.push(incarceration_period(
            10,
            d(2017, 6, 1),
            IncarcerationAdmissionReason::NewAdmission,
            Some(d(2017, 6, 20)),
        ));

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        let completion = buckets
            .iter()
            .find_map(|bucket| match bucket {
                SupervisionTimeBucket::ProjectedCompletion(bucket) => Some(bucket),
                _ => None,
            })
            .unwrap();
        assert_eq!((completion.year, completion.month), (2018, 3));
        assert!(completion.successful_completion);
        assert!(completion.incarcerated_during_sentence);
        assert_eq!(completion.sentence_days_served, 726);
        assert_eq!(completion.supervision_type, SupervisionType::Probation);
    }

    #[test]
    fn out_of_state_transfer_never_produces_a_completion_bucket() {
        let mut fixture = Fixture::new();
        fixture.supervision_periods.push(supervision_period(
            1,
            d(2016, 3, 1),
            Some((
                d(2018, 2, 25),
                SupervisionTerminationReason::TransferOutOfState,
            )),
        ));
        fixture.supervision_sentences.push(SupervisionSentence {
            supervision_sentence_id: 100,
            state_code: "US_XX".to_string(),
            supervision_type: Some(SupervisionType::Probation),
            start_date: Some(d(2016, 3, 1)),
            completion_date: Some(d(2018, 2, 25)),
            projected_completion_date: Some(d(2018, 3, 1)),
            supervision_period_ids: vec![1],
        });

        let buckets =
            supervision_time_buckets(&fixture.records(), StatePolicy::default(), d(2019, 1, 1));

        assert!(!buckets
            .iter()
            .any(|bucket| bucket.kind() == SupervisionTimeBucketKind::ProjectedCompletion));
    }

    #[test]
    fn overlapping_parole_and_probation_sentences_resolve_to_dual() {
        let period = supervision_period(1, d(2018, 1, 1), None);
        let fixture = {
            let mut fixture = Fixture::new();
            fixture.supervision_sentences.push(SupervisionSentence {
                supervision_sentence_id: 100,
                state_code: "US_XX".to_string(),
                supervision_type: Some(SupervisionType::Probation),
                start_date: Some(d(2017, 6, 1)),
                completion_date: None,
                projected_completion_date: None,
                supervision_period_ids: vec![1],
            });
            fixture.incarceration_sentences.push(IncarcerationSentence {
                incarceration_sentence_id: 200,
                state_code: "US_XX".to_string(),
                start_date: Some(d(2016, 1, 1)),
                completion_date: None,
                supervision_period_ids: vec![1],
            });
            fixture
        };

        let resolved =
            resolve_supervision_type(Some(&period), d(2018, 6, 30), &fixture.records());

        assert_eq!(resolved, Some(SupervisionType::Dual));
    }
}
