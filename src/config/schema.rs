use serde::{Deserialize, Serialize};

use crate::ranklist::{Duration, RoundingMode, RuleDefaults, DEFAULT_PENALTY};

/// Default number of ranklists processed at once.
pub const DEFAULT_JOBS: usize = 4;

/// Tool settings.
///
/// Example YAML:
/// ```yaml
/// jobs: 8
/// default_penalty: [20, "min"]
/// default_rounding: floor
/// exclude:
///   penalty: ["ccpc2019xiamen", "icpc2025srni"]
///   time_precision: ["icpc2025*"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Ranklists processed concurrently (default: 4)
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Penalty per rejected attempt when a ranklist does not set one
    #[serde(default)]
    pub default_penalty: Option<Duration>,

    /// Rounding when a ranklist does not set `timeRounding`
    #[serde(default)]
    pub default_rounding: Option<RoundingMode>,

    /// Ranklist keys skipped by each tool. Entries are exact keys or glob patterns.
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
    #[serde(default)]
    pub penalty: Vec<String>,

    #[serde(default)]
    pub time_precision: Vec<String>,
}

impl Settings {
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or(DEFAULT_JOBS)
    }

    pub fn rule_defaults(&self) -> RuleDefaults {
        RuleDefaults {
            penalty: self.default_penalty.unwrap_or(DEFAULT_PENALTY),
            rounding: self.default_rounding.unwrap_or_default(),
        }
    }
}
