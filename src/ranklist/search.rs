use tracing::debug;

use super::error::RanklistError;
use super::rules::{Precision, ScoringRules, TimeConfig};
use super::types::Ranklist;
use super::units::{RoundingMode, TimeUnit};
use super::verify::verify;

/// Precisions tried by the search, in order. Days are never a sensible
/// comparison granularity and are left out.
pub const SEARCH_PRECISIONS: [Precision; 5] = [
    Precision::Auto,
    Precision::Fixed(TimeUnit::Ms),
    Precision::Fixed(TimeUnit::S),
    Precision::Fixed(TimeUnit::Min),
    Precision::Fixed(TimeUnit::H),
];

/// All 15 candidate configurations in search order: precision-major,
/// then floor, ceil, round.
pub fn candidates() -> impl Iterator<Item = TimeConfig> {
    SEARCH_PRECISIONS.into_iter().flat_map(|precision| {
        RoundingMode::ALL
            .into_iter()
            .map(move |rounding| TimeConfig::new(precision, rounding))
    })
}

/// Outcome of looking for a time configuration that reconciles a ranklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The current configuration already reconciles every row.
    Consistent,
    /// The first candidate that reconciles every row.
    Found(TimeConfig),
    /// No candidate reconciles every row.
    NotFound,
}

/// Per-file report of the time configuration search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    pub current: TimeConfig,
    pub outcome: SearchOutcome,
}

impl SearchReport {
    pub fn has_issues(&self) -> bool {
        !matches!(self.outcome, SearchOutcome::Consistent)
    }

    pub fn can_fix(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Found(_))
    }

    pub fn correct_config(&self) -> Option<TimeConfig> {
        match self.outcome {
            SearchOutcome::Found(config) => Some(config),
            _ => None,
        }
    }
}

/// Check the current configuration and, if it fails, search the candidate
/// space for the first configuration with zero inconsistent rows.
///
/// The ranklist is not modified.
pub fn search_time_config(
    ranklist: &Ranklist,
    rules: &ScoringRules,
) -> Result<SearchReport, RanklistError> {
    let current = rules.time_config();

    if verify(ranklist, rules)?.is_consistent() {
        return Ok(SearchReport {
            current,
            outcome: SearchOutcome::Consistent,
        });
    }

    for candidate in candidates() {
        let verification = verify(ranklist, &rules.with_time_config(candidate))?;
        debug!(
            candidate = %candidate,
            issues = verification.total_issues(),
            "tried time config"
        );
        if verification.is_consistent() {
            return Ok(SearchReport {
                current,
                outcome: SearchOutcome::Found(candidate),
            });
        }
    }

    Ok(SearchReport {
        current,
        outcome: SearchOutcome::NotFound,
    })
}

/// Write `config` into the ranklist's `sorter.config`, then re-verify the
/// whole ranklist with it. The change is kept only if every row agrees;
/// otherwise the ranklist is left exactly as it was.
pub fn apply_time_config(
    ranklist: &mut Ranklist,
    rules: &ScoringRules,
    config: TimeConfig,
) -> Result<bool, RanklistError> {
    let mut staged = ranklist.clone();
    {
        let sorter_config = staged.sorter_config_mut();
        sorter_config.time_precision = config.time_precision;
        sorter_config.time_rounding = Some(config.time_rounding);
    }

    if !verify(&staged, &rules.with_time_config(config))?.is_consistent() {
        return Ok(false);
    }
    *ranklist = staged;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranklist::rules::{CompareConfig, RuleDefaults};
    use crate::ranklist::verify::verify_with;

    fn ranklist(json: &str) -> Ranklist {
        Ranklist::from_json_str(json).unwrap()
    }

    fn rules(r: &Ranklist) -> ScoringRules {
        ScoringRules::from_ranklist(r, &RuleDefaults::default())
    }

    /// Only reconcilable at seconds with ceiling rounding among the first
    /// five candidates: 1500ms ceils to 2s, which is the score.
    const SECONDS_CEIL: &str = r#"{
        "problems": [{}],
        "rows": [ { "score": { "time": [2, "s"] },
                    "statuses": [ { "result": "AC", "tries": 1, "time": [1500, "ms"] } ] } ]
    }"#;

    #[test]
    fn test_candidate_order() {
        let all: Vec<_> = candidates().collect();
        assert_eq!(all.len(), 15);
        assert_eq!(all[0], TimeConfig::new(Precision::Auto, RoundingMode::Floor));
        assert_eq!(all[2], TimeConfig::new(Precision::Auto, RoundingMode::Round));
        assert_eq!(
            all[3],
            TimeConfig::new(Precision::Fixed(TimeUnit::Ms), RoundingMode::Floor)
        );
        assert_eq!(
            all[14],
            TimeConfig::new(Precision::Fixed(TimeUnit::H), RoundingMode::Round)
        );
        assert!(all.iter().all(|c| c.time_precision != Some(TimeUnit::D)));
    }

    #[test]
    fn test_search_finds_first_match_seconds_ceil() {
        let r = ranklist(SECONDS_CEIL);
        let penalty = rules(&r).penalty;

        // No earlier candidate may also reconcile the fixture.
        for (unit, rounding) in [
            (TimeUnit::Ms, RoundingMode::Floor),
            (TimeUnit::Ms, RoundingMode::Ceil),
            (TimeUnit::Ms, RoundingMode::Round),
            (TimeUnit::S, RoundingMode::Floor),
        ] {
            let v = verify_with(&r, penalty, CompareConfig::new(unit, rounding)).unwrap();
            assert!(!v.is_consistent(), "{}/{} should not reconcile", unit, rounding);
        }

        let report = search_time_config(&r, &rules(&r)).unwrap();
        assert!(report.has_issues());
        assert!(report.can_fix());
        assert_eq!(
            report.correct_config(),
            Some(TimeConfig::new(Precision::Fixed(TimeUnit::S), RoundingMode::Ceil))
        );
        assert_eq!(report.current, TimeConfig::new(Precision::Auto, RoundingMode::Floor));
    }

    #[test]
    fn test_consistent_file_reports_no_issue() {
        let r = ranklist(
            r#"{ "problems": [{}],
                 "rows": [ { "score": { "time": [1500, "ms"] },
                             "statuses": [ { "result": "AC", "tries": 1, "time": [1500, "ms"] } ] } ] }"#,
        );
        let report = search_time_config(&r, &rules(&r)).unwrap();
        assert_eq!(report.outcome, SearchOutcome::Consistent);
        assert!(!report.has_issues());
        assert_eq!(report.correct_config(), None);
    }

    #[test]
    fn test_irreconcilable_file_is_not_found() {
        let r = ranklist(
            r#"{ "problems": [{}],
                 "rows": [ { "score": { "time": [10, "h"] },
                             "statuses": [ { "result": "AC", "tries": 1, "time": [1, "min"] } ] } ] }"#,
        );
        let report = search_time_config(&r, &rules(&r)).unwrap();
        assert_eq!(report.outcome, SearchOutcome::NotFound);
        assert!(report.has_issues());
        assert!(!report.can_fix());
    }

    #[test]
    fn test_apply_writes_config_after_reverifying() {
        let mut r = ranklist(SECONDS_CEIL);
        let found = TimeConfig::new(Precision::Fixed(TimeUnit::S), RoundingMode::Ceil);
        let current = rules(&r);
        assert!(apply_time_config(&mut r, &current, found).unwrap());

        let config = r.sorter_config().unwrap();
        assert_eq!(config.time_precision, Some(TimeUnit::S));
        assert_eq!(config.time_rounding, Some(RoundingMode::Ceil));

        let reread = rules(&r);
        assert!(verify(&r, &reread).unwrap().is_consistent());
    }

    #[test]
    fn test_apply_rejects_config_that_does_not_reconcile() {
        let mut r = ranklist(SECONDS_CEIL);
        let before = r.clone();
        let wrong = TimeConfig::new(Precision::Fixed(TimeUnit::Ms), RoundingMode::Floor);
        let current = rules(&r);
        assert!(!apply_time_config(&mut r, &current, wrong).unwrap());
        assert_eq!(r, before);
    }
}
