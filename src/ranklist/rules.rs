use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Ranklist;
use super::units::{best_unit, Duration, RoundingMode, TimeUnit};

/// Penalty applied per extra attempt when a ranklist does not set one.
pub const DEFAULT_PENALTY: Duration = Duration::new(20, TimeUnit::Min);

/// Values used to fill gaps in a ranklist's `sorter.config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleDefaults {
    pub penalty: Duration,
    pub rounding: RoundingMode,
}

impl Default for RuleDefaults {
    fn default() -> Self {
        Self {
            penalty: DEFAULT_PENALTY,
            rounding: RoundingMode::Floor,
        }
    }
}

/// Comparison granularity: explicit, or detected from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    #[default]
    Auto,
    Fixed(TimeUnit),
}

impl Precision {
    /// Resolve to a concrete unit. `Auto` uses the finest unit in the file.
    pub fn resolve(self, ranklist: &Ranklist) -> TimeUnit {
        match self {
            Precision::Fixed(unit) => unit,
            Precision::Auto => best_unit(ranklist.durations()),
        }
    }

    pub fn as_option(self) -> Option<TimeUnit> {
        match self {
            Precision::Auto => None,
            Precision::Fixed(unit) => Some(unit),
        }
    }
}

impl From<Option<TimeUnit>> for Precision {
    fn from(unit: Option<TimeUnit>) -> Self {
        unit.map_or(Precision::Auto, Precision::Fixed)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Auto => f.write_str("auto"),
            Precision::Fixed(unit) => write!(f, "{}", unit),
        }
    }
}

/// The `timePrecision` / `timeRounding` pair of a sorter config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_precision: Option<TimeUnit>,
    pub time_rounding: RoundingMode,
}

impl TimeConfig {
    pub fn new(precision: Precision, rounding: RoundingMode) -> Self {
        Self {
            time_precision: precision.as_option(),
            time_rounding: rounding,
        }
    }

    pub fn precision(&self) -> Precision {
        self.time_precision.into()
    }
}

impl fmt::Display for TimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "precision={}, rounding={}", self.precision(), self.time_rounding)
    }
}

/// Unit and rounding used to compare summed status times with a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompareConfig {
    pub unit: TimeUnit,
    pub rounding: RoundingMode,
}

impl CompareConfig {
    pub fn new(unit: TimeUnit, rounding: RoundingMode) -> Self {
        Self { unit, rounding }
    }
}

/// Effective scoring rules of one ranklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub penalty: Duration,
    pub precision: Precision,
    pub rounding: RoundingMode,
}

impl ScoringRules {
    /// Read rules from `sorter.config`, falling back to `defaults`.
    pub fn from_ranklist(ranklist: &Ranklist, defaults: &RuleDefaults) -> Self {
        let config = ranklist.sorter_config();
        Self {
            penalty: config.and_then(|c| c.penalty).unwrap_or(defaults.penalty),
            precision: config.and_then(|c| c.time_precision).into(),
            rounding: config
                .and_then(|c| c.time_rounding)
                .unwrap_or(defaults.rounding),
        }
    }

    pub fn time_config(&self) -> TimeConfig {
        TimeConfig::new(self.precision, self.rounding)
    }

    pub fn with_time_config(self, time: TimeConfig) -> Self {
        Self {
            precision: time.precision(),
            rounding: time.time_rounding,
            ..self
        }
    }

    pub fn compare_config(&self, ranklist: &Ranklist) -> CompareConfig {
        CompareConfig::new(self.precision.resolve(ranklist), self.rounding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranklist(json: &str) -> Ranklist {
        Ranklist::from_json_str(json).unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_config() {
        let r = ranklist(r#"{ "problems": [], "rows": [] }"#);
        let rules = ScoringRules::from_ranklist(&r, &RuleDefaults::default());
        assert_eq!(rules.penalty, Duration::new(20, TimeUnit::Min));
        assert_eq!(rules.precision, Precision::Auto);
        assert_eq!(rules.rounding, RoundingMode::Floor);
    }

    #[test]
    fn test_explicit_config_wins_over_defaults() {
        let r = ranklist(
            r#"{ "sorter": { "config": {
                "penalty": [5, "min"], "timePrecision": "s", "timeRounding": "round"
            } } }"#,
        );
        let defaults = RuleDefaults {
            penalty: Duration::new(1, TimeUnit::H),
            rounding: RoundingMode::Ceil,
        };
        let rules = ScoringRules::from_ranklist(&r, &defaults);
        assert_eq!(rules.penalty, Duration::new(5, TimeUnit::Min));
        assert_eq!(rules.precision, Precision::Fixed(TimeUnit::S));
        assert_eq!(rules.rounding, RoundingMode::Round);
    }

    #[test]
    fn test_auto_precision_resolves_from_data() {
        let r = ranklist(
            r#"{ "rows": [ { "score": { "time": [2, "h"] },
                "statuses": [ { "result": "AC", "tries": 1, "time": [90, "s"] } ] } ] }"#,
        );
        assert_eq!(Precision::Auto.resolve(&r), TimeUnit::S);
        assert_eq!(Precision::Fixed(TimeUnit::Min).resolve(&r), TimeUnit::Min);
    }

    #[test]
    fn test_time_config_json_omits_auto_precision() {
        let auto = TimeConfig::new(Precision::Auto, RoundingMode::Ceil);
        assert_eq!(
            serde_json::to_string(&auto).unwrap(),
            r#"{"timeRounding":"ceil"}"#
        );
        let fixed = TimeConfig::new(Precision::Fixed(TimeUnit::S), RoundingMode::Floor);
        assert_eq!(
            serde_json::to_string(&fixed).unwrap(),
            r#"{"timePrecision":"s","timeRounding":"floor"}"#
        );
    }
}
