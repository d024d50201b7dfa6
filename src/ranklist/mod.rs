//! Time and penalty consistency of srk ranklists.
//!
//! Every row must satisfy: the sum over AC/FB statuses of
//! `round(time + (tries - 1) * penalty)` equals `round(score.time)`, both in
//! the same compare unit and with the same rounding.

pub mod document;
pub mod error;
pub mod penalty;
pub mod repair;
pub mod rules;
pub mod search;
pub mod types;
pub mod units;
pub mod verify;

pub use document::write_back;
pub use error::RanklistError;
pub use penalty::{penalized_time, ScoringStatus};
pub use repair::{check_penalty, repair_penalty, RepairReport};
pub use rules::{CompareConfig, Precision, RuleDefaults, ScoringRules, TimeConfig, DEFAULT_PENALTY};
pub use search::{apply_time_config, candidates, search_time_config, SearchOutcome, SearchReport};
pub use types::{Ranklist, Row, Score, SolutionResult, Sorter, SorterConfig, Status};
pub use units::{best_unit, from_millis, Duration, RoundingMode, TimeUnit};
pub use verify::{check_row, verify, verify_with, RowCheck, Verification};
