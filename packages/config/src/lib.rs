#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Run configuration and the per-state policy table.
//!
//! State-specific behavior is deliberately kept out of the calculation code:
//! the pipelines take a [`StatePolicies`] table and look up the flags they
//! need, so adding a state is a configuration change rather than a new
//! branch in the state machine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which demographic/contextual dimensions are exploded into metric
/// combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DimensionInclusions {
    pub age_bucket: bool,
    pub gender: bool,
    pub race: bool,
    pub ethnicity: bool,
    pub release_facility: bool,
    pub stay_length_bucket: bool,
}

impl Default for DimensionInclusions {
    fn default() -> Self {
        Self {
            age_bucket: true,
            gender: true,
            race: true,
            ethnicity: true,
            release_facility: true,
            stay_length_bucket: true,
        }
    }
}

/// Top-level calculation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct CalculationConfig {
    /// Dimensions to include when exploding characteristic combinations.
    pub inclusions: DimensionInclusions,
    /// Emit event-based (every qualifying event counted) metrics.
    pub event_based: bool,
    /// Emit person-based (each person counted once) metrics.
    pub person_based: bool,
    /// Expand every non-person-level key across return-type,
    /// from-supervision-type, and source-violation-type breakdowns. When
    /// false, only the aggregate key per combination is produced.
    pub include_return_type_breakdowns: bool,
    /// Per-state policy overrides, keyed by state code.
    pub states: StatePolicies,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            inclusions: DimensionInclusions::default(),
            event_based: true,
            person_based: true,
            include_return_type_breakdowns: true,
            states: StatePolicies::default(),
        }
    }
}

impl CalculationConfig {
    /// Parses a configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or does not match
    /// the configuration shape.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Behavioral flags for a single state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StatePolicy {
    /// Whether an incarceration period with missing admission data that
    /// directly follows a transfer release inherits the prior period's
    /// release linkage. Some states drop admission fields after transfers.
    pub infer_missing_admission_from_transfer: bool,
    /// Whether the state tracks DUAL supervision as distinct from PAROLE and
    /// PROBATION. When true, overlapping parole/probation buckets in a month
    /// are rewritten to DUAL; when false, DUAL buckets are expanded into
    /// additional PAROLE and PROBATION copies.
    pub supervision_types_distinct: bool,
    /// Whether revocation details fall back to the supervision period's
    /// officer association when the violation response has none.
    pub default_to_period_officer_for_revocation: bool,
}

/// The per-state policy lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatePolicies {
    policies: BTreeMap<String, StatePolicy>,
}

impl StatePolicies {
    /// The table of states with known non-default behavior.
    #[must_use]
    pub fn standard() -> Self {
        let mut policies = BTreeMap::new();

        policies.insert(
            "US_ND".to_string(),
            StatePolicy {
                infer_missing_admission_from_transfer: true,
                supervision_types_distinct: false,
                default_to_period_officer_for_revocation: true,
            },
        );
        policies.insert(
            "US_ID".to_string(),
            StatePolicy {
                infer_missing_admission_from_transfer: false,
                supervision_types_distinct: true,
                default_to_period_officer_for_revocation: false,
            },
        );

        Self { policies }
    }

    /// Returns the policy for a state, or the all-defaults policy when the
    /// state has no entry.
    #[must_use]
    pub fn for_state(&self, state_code: &str) -> StatePolicy {
        self.policies.get(state_code).copied().unwrap_or_default()
    }

    /// Inserts or replaces the policy for a state.
    pub fn insert(&mut self, state_code: impl Into<String>, policy: StatePolicy) {
        self.policies.insert(state_code.into(), policy);
    }
}
