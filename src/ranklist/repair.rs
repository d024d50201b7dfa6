use tracing::{debug, warn};

use super::error::RanklistError;
use super::penalty::ScoringStatus;
use super::rules::ScoringRules;
use super::types::Ranklist;
use super::units::Duration;
use super::verify::{verify_with, Verification};

/// Per-file result of the penalty check, and of the repair in fix mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairReport {
    /// Inconsistent rows found before any repair.
    pub total_issues: usize,
    /// Status times rewritten by a committed repair.
    pub fixed_issues: usize,
    /// Whether the ranklist was changed and has to be written back.
    pub need_to_save: bool,
}

/// Check only. Equivalent to a repair that is never attempted.
pub fn check_penalty(ranklist: &Ranklist, rules: &ScoringRules) -> Result<RepairReport, RanklistError> {
    let verification = verify_with(ranklist, rules.penalty, rules.compare_config(ranklist))?;
    Ok(RepairReport {
        total_issues: verification.total_issues(),
        ..Default::default()
    })
}

/// Treat each inconsistent row's score as authoritative and rewrite its
/// AC/FB status times so they no longer carry the penalty.
///
/// Every rewrite is staged on a copy. The copy is re-verified at the
/// original compare config, and replaces `ranklist` only if all rows agree.
/// Otherwise `ranklist` is untouched and `fixed_issues` is zero.
pub fn repair_penalty(
    ranklist: &mut Ranklist,
    rules: &ScoringRules,
) -> Result<RepairReport, RanklistError> {
    let compare = rules.compare_config(ranklist);
    let verification = verify_with(ranklist, rules.penalty, compare)?;
    let total_issues = verification.total_issues();
    if total_issues == 0 {
        return Ok(RepairReport::default());
    }

    let mut staged = ranklist.clone();
    let fixed_issues = rewrite_status_times(&mut staged, &verification, rules)?;

    let recheck = verify_with(&staged, rules.penalty, compare)?;
    if !recheck.is_consistent() {
        warn!(
            issues = total_issues,
            remaining = recheck.total_issues(),
            "penalty repair does not reconcile every row, discarding"
        );
        return Ok(RepairReport {
            total_issues,
            fixed_issues: 0,
            need_to_save: false,
        });
    }

    *ranklist = staged;
    Ok(RepairReport {
        total_issues,
        fixed_issues,
        need_to_save: fixed_issues > 0,
    })
}

/// Strip the penalty from every scoring status of each mismatched row,
/// keeping each status in its own unit. Returns the number of statuses
/// rewritten.
fn rewrite_status_times(
    ranklist: &mut Ranklist,
    verification: &Verification,
    rules: &ScoringRules,
) -> Result<usize, RanklistError> {
    let mut rewritten = 0;

    for (index, row) in ranklist.rows.iter_mut().enumerate() {
        if !verification.is_mismatch(index) {
            continue;
        }
        for status in row.statuses.iter_mut() {
            let Some(scoring) = ScoringStatus::from_status(status, index)? else {
                continue;
            };
            let unpenalized = scoring
                .time
                .to_millis()
                .zip(scoring.penalty_millis(rules.penalty))
                .and_then(|(time, penalty)| time.checked_sub(penalty))
                .ok_or_else(|| RanklistError::overflow(index))?;
            let fixed = Duration::from_millis(unpenalized, scoring.time.unit, rules.rounding);
            debug!(row = index, from = %scoring.time, to = %fixed, "rewrote status time");
            status.time = Some(fixed);
            rewritten += 1;
        }
    }

    Ok(rewritten)
}
