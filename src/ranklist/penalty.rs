use super::error::RanklistError;
use super::rules::CompareConfig;
use super::types::Status;
use super::units::{from_millis, Duration};

/// A scoring status with its required fields checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringStatus {
    pub time: Duration,
    pub tries: i64,
}

impl ScoringStatus {
    /// Extract the fields of an AC/FB status. Returns `None` for statuses
    /// that never contribute time, without looking at `time` or `tries`.
    pub fn from_status(status: &Status, row: usize) -> Result<Option<Self>, RanklistError> {
        if !status.is_scoring() {
            return Ok(None);
        }
        let time = status
            .time
            .ok_or_else(|| RanklistError::malformed(row, "accepted status has no time"))?;
        let tries = status
            .tries
            .ok_or_else(|| RanklistError::malformed(row, "accepted status has no tries"))?;
        if tries < 1 {
            return Err(RanklistError::malformed(
                row,
                format!("accepted status has {} tries", tries),
            ));
        }
        Ok(Some(Self { time, tries }))
    }

    /// Milliseconds of penalty for the rejected attempts before acceptance.
    /// `None` on overflow.
    pub fn penalty_millis(&self, penalty: Duration) -> Option<i64> {
        (self.tries - 1).checked_mul(penalty.to_millis()?)
    }

    /// Accepted time plus penalty, exact, in milliseconds. `None` on overflow.
    pub fn penalized_millis(&self, penalty: Duration) -> Option<i64> {
        self.time.to_millis()?.checked_add(self.penalty_millis(penalty)?)
    }
}

/// Contribution of `status` to its row total in `compare.unit`.
///
/// Non-scoring statuses contribute exactly zero.
pub fn penalized_time(
    status: &Status,
    row: usize,
    penalty: Duration,
    compare: CompareConfig,
) -> Result<i64, RanklistError> {
    let Some(scoring) = ScoringStatus::from_status(status, row)? else {
        return Ok(0);
    };
    let millis = scoring
        .penalized_millis(penalty)
        .ok_or_else(|| RanklistError::overflow(row))?;
    Ok(from_millis(millis, compare.unit, compare.rounding))
}
