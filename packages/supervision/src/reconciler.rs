//! Dual-supervision reconciliation.
//!
//! States disagree on what serving parole and probation at once means. Where
//! the two are distinct legal statuses, a month carrying both collapses into
//! DUAL buckets; elsewhere a DUAL bucket fans out into a parole copy and a
//! probation copy so each system counts the person.

use std::collections::BTreeMap;

use justice_metrics_config::StatePolicy;
use justice_metrics_entities::SupervisionType;
use justice_metrics_supervision_models::{SupervisionMetricType, SupervisionTimeBucket};

/// Applies the state's dual-supervision policy to a finished bucket list.
#[must_use]
pub fn reconcile_dual_supervision(
    buckets: Vec<SupervisionTimeBucket>,
    policy: StatePolicy,
) -> Vec<SupervisionTimeBucket> {
    if policy.supervision_types_distinct {
        convert_to_dual(buckets)
    } else {
        expand_dual(buckets)
    }
}

/// Rewrites every bucket in a month that feeds a metric family alongside
/// both parole and probation time (or any DUAL time) to DUAL, then drops
/// the duplicates the rewrite creates.
fn convert_to_dual(mut buckets: Vec<SupervisionTimeBucket>) -> Vec<SupervisionTimeBucket> {
    let mut by_month: BTreeMap<(i32, u32), Vec<usize>> = BTreeMap::new();
    for (index, bucket) in buckets.iter().enumerate() {
        by_month.entry(bucket.year_month()).or_default().push(index);
    }

    for month_indexes in by_month.values() {
        for metric_type in SupervisionMetricType::all() {
            let contributing: Vec<usize> = month_indexes
                .iter()
                .copied()
                .filter(|index| {
                    metric_type
                        .contributing_bucket_kinds()
                        .contains(&buckets[*index].kind())
                })
                .collect();

            let mut parole = false;
            let mut probation = false;
            let mut dual = false;
            for index in &contributing {
                match buckets[*index].supervision_type() {
                    SupervisionType::Parole => parole = true,
                    SupervisionType::Probation => probation = true,
                    SupervisionType::Dual => dual = true,
                }
            }

            if (parole && probation) || dual {
                for index in contributing {
                    buckets[index].set_supervision_type(SupervisionType::Dual);
                }
            }
        }
    }

    // The rewrite can leave identical buckets behind; keep the first of each.
    let mut deduped: Vec<SupervisionTimeBucket> = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        if !deduped.contains(&bucket) {
            deduped.push(bucket);
        }
    }
    deduped
}

/// Fans every DUAL bucket out into a parole copy and a probation copy,
/// keeping the original.
fn expand_dual(buckets: Vec<SupervisionTimeBucket>) -> Vec<SupervisionTimeBucket> {
    let mut expanded = Vec::with_capacity(buckets.len());

    for bucket in buckets {
        let is_dual = bucket.supervision_type() == SupervisionType::Dual;
        expanded.push(bucket.clone());
        if is_dual {
            let mut parole = bucket.clone();
            parole.set_supervision_type(SupervisionType::Parole);
            expanded.push(parole);

            let mut probation = bucket;
            probation.set_supervision_type(SupervisionType::Probation);
            expanded.push(probation);
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use justice_metrics_entities::CaseType;
    use justice_metrics_supervision_models::{
        NonRevocationReturnBucket, SupervisionTimeBucketKind, ViolationHistory,
    };

    use super::*;

    fn month_bucket(
        year: i32,
        month: u32,
        supervision_type: SupervisionType,
    ) -> SupervisionTimeBucket {
        SupervisionTimeBucket::NonRevocationReturn(NonRevocationReturnBucket {
            state_code: "US_XX".to_string(),
            year,
            month,
            supervision_type,
            case_type: CaseType::General,
            assessment_score: None,
            assessment_level: None,
            assessment_type: None,
            violation_history: ViolationHistory::default(),
            supervising_officer_external_id: None,
            supervising_district_external_id: None,
            is_on_supervision_last_day_of_month: true,
        })
    }

    #[test]
    fn distinct_types_collapse_a_shared_month_into_one_dual_bucket() {
        let policy = StatePolicy {
            supervision_types_distinct: true,
            ..StatePolicy::default()
        };

        let buckets = reconcile_dual_supervision(
            vec![
                month_bucket(2018, 4, SupervisionType::Parole),
                month_bucket(2018, 4, SupervisionType::Probation),
            ],
            policy,
        );

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].supervision_type(), SupervisionType::Dual);
    }

    #[test]
    fn distinct_types_leave_single_type_months_alone() {
        let policy = StatePolicy {
            supervision_types_distinct: true,
            ..StatePolicy::default()
        };

        let buckets = reconcile_dual_supervision(
            vec![
                month_bucket(2018, 3, SupervisionType::Parole),
                month_bucket(2018, 4, SupervisionType::Probation),
            ],
            policy,
        );

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].supervision_type(), SupervisionType::Parole);
        assert_eq!(buckets[1].supervision_type(), SupervisionType::Probation);
    }

    #[test]
    fn dual_buckets_expand_into_parole_and_probation_copies() {
        let buckets = reconcile_dual_supervision(
            vec![month_bucket(2018, 4, SupervisionType::Dual)],
            StatePolicy::default(),
        );

        let types: Vec<SupervisionType> = buckets
            .iter()
            .map(SupervisionTimeBucket::supervision_type)
            .collect();
        assert_eq!(
            types,
            vec![
                SupervisionType::Dual,
                SupervisionType::Parole,
                SupervisionType::Probation,
            ]
        );
        assert!(
            buckets
                .iter()
                .all(|bucket| bucket.kind() == SupervisionTimeBucketKind::NonRevocationReturn)
        );
    }
}
