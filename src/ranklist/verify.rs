use super::error::RanklistError;
use super::penalty::penalized_time;
use super::rules::{CompareConfig, ScoringRules};
use super::types::{Ranklist, Row};
use super::units::{from_millis, Duration};

/// Comparison of one row's summed status times against its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCheck {
    pub row: usize,
    /// Sum of penalized status times, in the compare unit.
    pub total: i64,
    /// Score time, in the compare unit.
    pub expected: i64,
}

impl RowCheck {
    pub fn is_consistent(&self) -> bool {
        self.total == self.expected
    }
}

/// Result of checking a whole ranklist at one `CompareConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub compare: CompareConfig,
    pub mismatches: Vec<RowCheck>,
}

impl Verification {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Number of inconsistent rows.
    pub fn total_issues(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_mismatch(&self, row: usize) -> bool {
        self.mismatches.iter().any(|m| m.row == row)
    }
}

/// Check the shape of a row before doing any arithmetic on it.
fn validate_row(row: &Row, index: usize, problem_count: usize) -> Result<Duration, RanklistError> {
    if row.statuses.len() != problem_count {
        return Err(RanklistError::malformed(
            index,
            format!(
                "{} statuses for {} problems",
                row.statuses.len(),
                problem_count
            ),
        ));
    }
    row.score
        .time
        .ok_or_else(|| RanklistError::malformed(index, "score has no time"))
}

/// Sum one row's penalized status times and convert its score, both in
/// `compare.unit` with `compare.rounding`.
pub fn check_row(
    row: &Row,
    index: usize,
    problem_count: usize,
    penalty: Duration,
    compare: CompareConfig,
) -> Result<RowCheck, RanklistError> {
    let score_time = validate_row(row, index, problem_count)?;

    let mut total: i64 = 0;
    for status in &row.statuses {
        total = total
            .checked_add(penalized_time(status, index, penalty, compare)?)
            .ok_or_else(|| RanklistError::overflow(index))?;
    }

    let score_millis = score_time
        .to_millis()
        .ok_or_else(|| RanklistError::overflow(index))?;

    Ok(RowCheck {
        row: index,
        total,
        expected: from_millis(score_millis, compare.unit, compare.rounding),
    })
}

/// Check every row of `ranklist` at an explicit compare config.
///
/// Pure: the ranklist is never modified.
pub fn verify_with(
    ranklist: &Ranklist,
    penalty: Duration,
    compare: CompareConfig,
) -> Result<Verification, RanklistError> {
    let problem_count = ranklist.problems.len();
    let mut mismatches = Vec::new();

    for (index, row) in ranklist.rows.iter().enumerate() {
        let check = check_row(row, index, problem_count, penalty, compare)?;
        if !check.is_consistent() {
            mismatches.push(check);
        }
    }

    Ok(Verification {
        compare,
        mismatches,
    })
}

/// Check `ranklist` under `rules`, resolving an automatic precision from
/// the ranklist's own durations.
pub fn verify(ranklist: &Ranklist, rules: &ScoringRules) -> Result<Verification, RanklistError> {
    verify_with(ranklist, rules.penalty, rules.compare_config(ranklist))
}
