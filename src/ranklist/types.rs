use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::RanklistError;
use super::units::{Duration, RoundingMode, TimeUnit};

/// Typed view of a single srk ranklist file.
///
/// Only the fields needed for time checks are read. The file itself is
/// kept as a JSON document and changes are written back into it, see
/// [`write_back`](super::document::write_back).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ranklist {
    #[serde(default)]
    pub problems: Vec<Value>,

    #[serde(default)]
    pub sorter: Option<Sorter>,

    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Sorter {
    #[serde(default)]
    pub config: Option<SorterConfig>,
}

/// Time-related part of `sorter.config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SorterConfig {
    #[serde(default)]
    pub penalty: Option<Duration>,

    #[serde(default)]
    pub time_precision: Option<TimeUnit>,

    #[serde(default)]
    pub time_rounding: Option<RoundingMode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub statuses: Vec<Status>,

    #[serde(default)]
    pub score: Score,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub time: Option<Duration>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub result: Option<SolutionResult>,

    #[serde(default)]
    pub tries: Option<i64>,

    #[serde(default)]
    pub time: Option<Duration>,
}

impl Status {
    /// Whether this status adds time to the row total.
    pub fn is_scoring(&self) -> bool {
        self.result.as_ref().is_some_and(SolutionResult::is_scoring)
    }
}

/// Outcome of a problem for one row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SolutionResult {
    Accepted,
    FirstBlood,
    /// Any other tag ("RJ", "?", ...). Never contributes time.
    Other(String),
}

impl SolutionResult {
    pub fn is_scoring(&self) -> bool {
        matches!(self, SolutionResult::Accepted | SolutionResult::FirstBlood)
    }
}

impl From<String> for SolutionResult {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "AC" => SolutionResult::Accepted,
            "FB" => SolutionResult::FirstBlood,
            _ => SolutionResult::Other(tag),
        }
    }
}

impl Ranklist {
    pub fn from_json_str(s: &str) -> Result<Self, RanklistError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read the typed view out of an already parsed document.
    pub fn from_document(document: &Map<String, Value>) -> Result<Self, RanklistError> {
        Ok(serde_json::from_value(Value::Object(document.clone()))?)
    }

    pub fn sorter_config(&self) -> Option<&SorterConfig> {
        self.sorter.as_ref().and_then(|s| s.config.as_ref())
    }

    /// Mutable `sorter.config`, created if missing.
    pub fn sorter_config_mut(&mut self) -> &mut SorterConfig {
        self.sorter
            .get_or_insert_with(Sorter::default)
            .config
            .get_or_insert_with(SorterConfig::default)
    }

    /// Every duration stored in statuses and scores.
    pub fn durations(&self) -> impl Iterator<Item = &Duration> {
        self.rows.iter().flat_map(|row| {
            row.score
                .time
                .iter()
                .chain(row.statuses.iter().filter_map(|s| s.time.as_ref()))
        })
    }
}
