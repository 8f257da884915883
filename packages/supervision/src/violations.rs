//! Violation-history derivation.
//!
//! Summarizes the violations recorded in the window leading up to a
//! supervision time bucket. Only dated, non-draft violation reports and
//! citations count; the window is the twelve months ending at the last
//! qualifying response on or before the cutoff date.

use chrono::NaiveDate;
use justice_metrics_dates::sub_months;
use justice_metrics_entities::{
    ResponseDecision, Violation, ViolationResponse, ViolationResponseKind, ViolationType,
};
use justice_metrics_supervision_models::ViolationHistory;

/// Months of history measured before the anchoring response.
pub const VIOLATION_HISTORY_WINDOW_MONTHS: u32 = 12;

/// Derives the violation history for a bucket with the given cutoff date.
#[must_use]
pub fn violation_history(responses: &[ViolationResponse], cutoff: NaiveDate) -> ViolationHistory {
    let qualifying: Vec<(NaiveDate, &ViolationResponse)> = responses
        .iter()
        .filter_map(|response| {
            let date = response.response_date?;
            let counts = !response.is_draft
                && date <= cutoff
                && matches!(
                    response.response_kind,
                    Some(ViolationResponseKind::ViolationReport | ViolationResponseKind::Citation)
                );
            counts.then_some((date, response))
        })
        .collect();

    let Some(last_response_date) = qualifying.iter().map(|(date, _)| *date).max() else {
        return ViolationHistory::default();
    };

    let window_start = sub_months(last_response_date, VIOLATION_HISTORY_WINDOW_MONTHS);
    let in_window: Vec<&ViolationResponse> = qualifying
        .iter()
        .filter(|(date, _)| *date >= window_start)
        .map(|(_, response)| *response)
        .collect();

    let violations: Vec<&Violation> = in_window
        .iter()
        .filter_map(|response| response.violation.as_ref())
        .collect();

    let most_severe_violation_type = most_severe_violation_type(&violations);

    ViolationHistory {
        most_severe_violation_type,
        most_severe_violation_type_subtype: most_severe_violation_type
            .map(|violation_type| violation_type.to_string()),
        most_severe_response_decision: most_severe_response_decision(&in_window),
        response_count: u32::try_from(in_window.len()).unwrap_or(u32::MAX),
        description: description(&violations),
        type_frequency_counter: type_frequency_counter(&violations),
    }
}

fn most_severe_violation_type(violations: &[&Violation]) -> Option<ViolationType> {
    ViolationType::severity_order()
        .iter()
        .copied()
        .find(|candidate| {
            violations
                .iter()
                .any(|violation| violation.violation_types.contains(candidate))
        })
}

fn most_severe_response_decision(responses: &[&ViolationResponse]) -> Option<ResponseDecision> {
    ResponseDecision::severity_order()
        .iter()
        .copied()
        .find(|candidate| {
            responses.iter().any(|response| {
                response
                    .decision_entries
                    .iter()
                    .any(|entry| entry.decision == Some(*candidate))
            })
        })
}

/// Shorthand counts ordered most severe first, e.g. `1fel;2tech`.
fn description(violations: &[&Violation]) -> Option<String> {
    let mut parts = Vec::new();

    for violation_type in ViolationType::severity_order() {
        let count = violations
            .iter()
            .filter(|violation| violation.violation_types.contains(violation_type))
            .count();
        if count > 0 {
            parts.push(format!("{count}{}", violation_type.shorthand()));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(";"))
    }
}

fn type_frequency_counter(violations: &[&Violation]) -> Vec<Vec<String>> {
    violations
        .iter()
        .map(|violation| {
            let mut labels = Vec::new();

            for violation_type in &violation.violation_types {
                if *violation_type == ViolationType::Technical {
                    if violation.violated_conditions.is_empty() {
                        labels.push("TECHNICAL_NO_CONDITIONS".to_string());
                    }
                } else {
                    labels.push(violation_type.to_string());
                }
            }
            for condition in &violation.violated_conditions {
                labels.push(condition.to_uppercase());
            }

            labels
        })
        .collect()
}
