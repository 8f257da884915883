//! Metric augmentation and the rate, count, and liberty metric mappers.
//!
//! Each release event is expanded into `(AugmentedMetricKey, value)` rows.
//! Non-person-level keys fan out across return-type, from-supervision-type,
//! and source-violation-type breakdowns; values come from a wildcard match
//! against the event's actual outcome (an unset key field matches any
//! outcome, a set field must equal it).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use justice_metrics_config::CalculationConfig;
use justice_metrics_dates::{add_years, first_day_of_month, last_day_of_month, sub_months};
use justice_metrics_entities::{Person, ViolationType};
use justice_metrics_recidivism_models::{
    AugmentedMetricKey, CharacteristicCombination, Methodology, RecidivismMetricType,
    RecidivismReleaseEvent, ReincarcerationReturnType, ReleaseCohorts, ReleaseEvent,
    ReturnFromSupervisionType,
};

use crate::{RecidivismError, combinations::characteristic_combinations};

/// Rolling window lengths, in months, used by the count metric alongside
/// the single reincarceration-month bucket.
pub const METRIC_PERIOD_MONTHS: [u32; 4] = [36, 12, 6, 3];

/// Follow-up windows measured by the rate metric, in years.
pub const FOLLOW_UP_PERIODS: std::ops::RangeInclusive<u8> = 1..=10;

/// The actual outcome of a reincarceration, matched against key breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnOutcome {
    pub return_type: ReincarcerationReturnType,
    pub from_supervision_type: Option<ReturnFromSupervisionType>,
    pub source_violation_type: Option<ViolationType>,
}

impl From<&RecidivismReleaseEvent> for ReturnOutcome {
    fn from(event: &RecidivismReleaseEvent) -> Self {
        Self {
            return_type: event.return_type,
            from_supervision_type: event.from_supervision_type,
            source_violation_type: event.source_violation_type,
        }
    }
}

struct MetricContext<'a> {
    combinations: &'a [CharacteristicCombination],
    reincarcerations: &'a BTreeMap<NaiveDate, ReturnOutcome>,
    config: &'a CalculationConfig,
    today: NaiveDate,
}

/// Maps a person's cohort-grouped release events to metric rows.
///
/// # Errors
///
/// Returns an error when a recidivism event carries a reincarceration date
/// before its release date.
pub fn map_recidivism_metrics(
    person: &Person,
    cohorts: &ReleaseCohorts,
    config: &CalculationConfig,
    today: NaiveDate,
) -> Result<Vec<(AugmentedMetricKey, i64)>, RecidivismError> {
    let reincarcerations = reincarcerations_by_date(cohorts);
    let mut rows = Vec::new();

    for (cohort_year, events) in cohorts {
        let first_release_index = events
            .iter()
            .enumerate()
            .min_by_key(|(_, event)| event.release_date())
            .map(|(index, _)| index);

        for (index, event) in events.iter().enumerate() {
            let combinations = characteristic_combinations(person, event, config.inclusions);
            let context = MetricContext {
                combinations: &combinations,
                reincarcerations: &reincarcerations,
                config,
                today,
            };

            rate_rows(
                &mut rows,
                event,
                *cohort_year,
                Some(index) == first_release_index,
                &context,
            );

            if let ReleaseEvent::Recidivism(recidivism) = event {
                count_rows(&mut rows, recidivism, &context);
                liberty_rows(&mut rows, recidivism, &context)?;
            }
        }
    }

    Ok(rows)
}

/// All the person's reincarcerations keyed by date, used for window counts
/// across the entire history rather than a single event.
fn reincarcerations_by_date(cohorts: &ReleaseCohorts) -> BTreeMap<NaiveDate, ReturnOutcome> {
    let mut reincarcerations = BTreeMap::new();

    for event in cohorts.values().flatten() {
        if let ReleaseEvent::Recidivism(recidivism) = event {
            reincarcerations.insert(recidivism.reincarceration_date, ReturnOutcome::from(recidivism));
        }
    }

    reincarcerations
}

fn methodologies(config: &CalculationConfig) -> Vec<Methodology> {
    let mut methodologies = Vec::with_capacity(2);
    if config.event_based {
        methodologies.push(Methodology::Event);
    }
    if config.person_based {
        methodologies.push(Methodology::Person);
    }
    methodologies
}

/// The earliest follow-up period in which the reincarceration falls.
///
/// A return on the release anniversary lands in the next period: the
/// period-N window is `[release, release + N years)`.
fn earliest_recidivated_follow_up_period(
    release_date: NaiveDate,
    reincarceration_date: NaiveDate,
) -> u8 {
    let years_apart = reincarceration_date.year() - release_date.year();
    let on_or_after_anniversary = (reincarceration_date.month(), reincarceration_date.day())
        >= (release_date.month(), release_date.day());

    let period = years_apart + i32::from(on_or_after_anniversary);
    u8::try_from(period.max(1)).unwrap_or(u8::MAX)
}

fn rate_rows(
    rows: &mut Vec<(AugmentedMetricKey, i64)>,
    event: &ReleaseEvent,
    cohort_year: i32,
    is_first_release_in_cohort: bool,
    context: &MetricContext<'_>,
) {
    let release_date = event.release_date();

    let (outcome, earliest_period) = match event {
        ReleaseEvent::Recidivism(recidivism) => (
            Some(ReturnOutcome::from(recidivism)),
            Some(earliest_recidivated_follow_up_period(
                release_date,
                recidivism.reincarceration_date,
            )),
        ),
        ReleaseEvent::NonRecidivism(_) => (None, None),
    };

    for period in FOLLOW_UP_PERIODS {
        // A period is relevant once its window has started, even when the
        // window end is still in the future.
        if add_years(release_date, u32::from(period) - 1) > context.today {
            break;
        }

        for methodology in methodologies(context.config) {
            if methodology == Methodology::Person && !is_first_release_in_cohort {
                continue;
            }

            for combination in context.combinations {
                if combination.is_person_level() {
                    continue;
                }

                let mut prototype = AugmentedMetricKey::new(
                    combination.clone(),
                    event.state_code().to_string(),
                    RecidivismMetricType::Rate,
                    methodology,
                );
                prototype.release_cohort = Some(cohort_year);
                prototype.follow_up_period = Some(period);

                for key in augmented_metric_keys(
                    &prototype,
                    outcome.as_ref(),
                    context.config.include_return_type_breakdowns,
                ) {
                    let recidivated = earliest_period.is_some_and(|earliest| period >= earliest);
                    if !recidivated {
                        rows.push((key, 0));
                        continue;
                    }

                    match methodology {
                        Methodology::Person => {
                            let value = outcome
                                .as_ref()
                                .map_or(0, |outcome| recidivism_value_for_metric(&key, outcome));
                            rows.push((key, value));
                        }
                        Methodology::Event => {
                            let window_end = add_years(release_date, u32::from(period));
                            for (_, reincarceration) in
                                context.reincarcerations.range(release_date..window_end)
                            {
                                let value = recidivism_value_for_metric(&key, reincarceration);
                                rows.push((key.clone(), value));
                            }
                        }
                    }
                }
            }
        }
    }
}

fn count_rows(
    rows: &mut Vec<(AugmentedMetricKey, i64)>,
    event: &RecidivismReleaseEvent,
    context: &MetricContext<'_>,
) {
    let reincarceration_date = event.reincarceration_date;
    let outcome = ReturnOutcome::from(event);

    // (year, month, window length, window end).
    let mut buckets = vec![(
        reincarceration_date.year(),
        reincarceration_date.month(),
        1,
        last_day_of_month(reincarceration_date),
    )];

    let start_of_current_month = first_day_of_month(context.today);
    for period_months in METRIC_PERIOD_MONTHS {
        if sub_months(start_of_current_month, period_months - 1) <= reincarceration_date {
            buckets.push((
                context.today.year(),
                context.today.month(),
                period_months,
                last_day_of_month(context.today),
            ));
        }
    }

    for (year, month, period_months, window_end) in buckets {
        let reincarcerations_in_window = context
            .reincarcerations
            .range(reincarceration_date..=window_end)
            .count();

        for methodology in methodologies(context.config) {
            // A person who returned again within the same window is only
            // counted through the later return.
            if methodology == Methodology::Person && reincarcerations_in_window != 1 {
                continue;
            }

            for combination in context.combinations {
                let mut prototype = AugmentedMetricKey::new(
                    combination.clone(),
                    event.state_code.clone(),
                    RecidivismMetricType::Count,
                    methodology,
                );
                prototype.year = Some(year);
                prototype.month = Some(month);
                prototype.metric_period_months = Some(period_months);

                for key in augmented_metric_keys(
                    &prototype,
                    Some(&outcome),
                    context.config.include_return_type_breakdowns,
                ) {
                    let value = recidivism_value_for_metric(&key, &outcome);
                    if key.combination.is_person_level() && value != 1 {
                        continue;
                    }
                    rows.push((key, value));
                }
            }
        }
    }
}

fn liberty_rows(
    rows: &mut Vec<(AugmentedMetricKey, i64)>,
    event: &RecidivismReleaseEvent,
    context: &MetricContext<'_>,
) -> Result<(), RecidivismError> {
    let days_at_liberty = event.days_at_liberty();
    if days_at_liberty < 0 {
        return Err(RecidivismError::NegativeTimeAtLiberty {
            release_date: event.release_date,
            reincarceration_date: event.reincarceration_date,
        });
    }

    let outcome = ReturnOutcome::from(event);
    let reincarceration_date = event.reincarceration_date;
    let year = reincarceration_date.year();

    let windows = [
        (
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(reincarceration_date),
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(reincarceration_date),
            None,
        ),
        (
            first_day_of_month(reincarceration_date),
            last_day_of_month(reincarceration_date),
            Some(reincarceration_date.month()),
        ),
    ];

    for (start_date, end_date, month) in windows {
        let first_in_window = context
            .reincarcerations
            .range(start_date..=end_date)
            .next()
            .is_some_and(|(date, _)| *date == reincarceration_date);

        for methodology in methodologies(context.config) {
            if methodology == Methodology::Person && !first_in_window {
                continue;
            }

            for combination in context.combinations {
                let mut prototype = AugmentedMetricKey::new(
                    combination.clone(),
                    event.state_code.clone(),
                    RecidivismMetricType::Liberty,
                    methodology,
                );
                prototype.year = Some(year);
                prototype.month = month;
                prototype.start_date = Some(start_date);
                prototype.end_date = Some(end_date);

                for key in augmented_metric_keys(
                    &prototype,
                    Some(&outcome),
                    context.config.include_return_type_breakdowns,
                ) {
                    if recidivism_value_for_metric(&key, &outcome) != 1 {
                        continue;
                    }
                    rows.push((key, days_at_liberty));
                }
            }
        }
    }

    Ok(())
}

/// Expands a prototype key across the return-type breakdowns.
///
/// Person-level prototypes produce a single key carrying the event's actual
/// outcome rather than the speculative enumeration. With breakdowns
/// disabled, only the aggregate key is produced. Otherwise the list has
/// `5 + 3 * |ViolationType|` keys, in a fixed order.
#[must_use]
pub fn augmented_metric_keys(
    prototype: &AugmentedMetricKey,
    outcome: Option<&ReturnOutcome>,
    include_return_type_breakdowns: bool,
) -> Vec<AugmentedMetricKey> {
    if prototype.combination.is_person_level() {
        let mut key = prototype.clone();
        if let Some(outcome) = outcome {
            key.return_type = Some(outcome.return_type);
            key.from_supervision_type = outcome.from_supervision_type;
            key.source_violation_type = outcome.source_violation_type;
        }
        return vec![key];
    }

    if !include_return_type_breakdowns {
        return vec![prototype.clone()];
    }

    let mut keys = Vec::with_capacity(5 + 3 * ViolationType::all().len());
    keys.push(prototype.clone());

    let mut new_admission = prototype.clone();
    new_admission.return_type = Some(ReincarcerationReturnType::NewAdmission);
    keys.push(new_admission);

    let mut revocation = prototype.clone();
    revocation.return_type = Some(ReincarcerationReturnType::Revocation);
    keys.push(revocation.clone());

    for violation_type in ViolationType::all() {
        let mut key = revocation.clone();
        key.source_violation_type = Some(*violation_type);
        keys.push(key);
    }

    for supervision_type in [
        ReturnFromSupervisionType::Parole,
        ReturnFromSupervisionType::Probation,
    ] {
        let mut from_supervision = revocation.clone();
        from_supervision.from_supervision_type = Some(supervision_type);
        keys.push(from_supervision.clone());

        for violation_type in ViolationType::all() {
            let mut key = from_supervision.clone();
            key.source_violation_type = Some(*violation_type);
            keys.push(key);
        }
    }

    keys
}

/// The 0/1 contribution of an event outcome to one key.
///
/// A key with no breakdown fields set is the generic bucket and always
/// counts. Otherwise the return types must match, and for revocations each
/// set key field must equal the outcome (`None` is a wildcard).
#[must_use]
pub fn recidivism_value_for_metric(key: &AugmentedMetricKey, outcome: &ReturnOutcome) -> i64 {
    if key.return_type.is_none()
        && key.from_supervision_type.is_none()
        && key.source_violation_type.is_none()
    {
        return 1;
    }

    if key.return_type != Some(outcome.return_type) {
        return 0;
    }

    if outcome.return_type == ReincarcerationReturnType::Revocation {
        if key.from_supervision_type.is_some()
            && key.from_supervision_type != outcome.from_supervision_type
        {
            return 0;
        }
        if key.source_violation_type.is_some()
            && key.source_violation_type != outcome.source_violation_type
        {
            return 0;
        }
    }

    1
}
