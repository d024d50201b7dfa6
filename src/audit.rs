use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::collection::{load_ranklist, save_ranklist, ExclusionSet, RanklistEntry, RanklistFile};
use crate::ranklist::{
    apply_time_config, check_penalty, repair_penalty, search_time_config, Ranklist, RanklistError,
    RepairReport, RuleDefaults, ScoringRules, SearchReport,
};

/// Which consistency tool to run over a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Verify row totals, and in fix mode rewrite status times.
    Penalty,
    /// Search for a `timePrecision` / `timeRounding` pair that reconciles the file.
    TimePrecision,
}

impl Tool {
    pub fn label(self) -> &'static str {
        match self {
            Tool::Penalty => "penalty",
            Tool::TimePrecision => "time precision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Check,
    Fix,
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub tool: Tool,
    pub mode: Mode,
    pub jobs: usize,
    pub defaults: RuleDefaults,
}

/// A ranklist read into memory together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedRanklist {
    pub entry: RanklistEntry,
    pub file: RanklistFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Penalty(RepairReport),
    TimePrecision {
        report: SearchReport,
        /// Whether the found configuration passed re-verification and was kept.
        committed: bool,
    },
    /// The file could not be checked; it is never written.
    Malformed(String),
}

impl FileOutcome {
    pub fn has_issues(&self) -> bool {
        match self {
            FileOutcome::Penalty(report) => report.total_issues > 0,
            FileOutcome::TimePrecision { report, .. } => report.has_issues(),
            FileOutcome::Malformed(_) => true,
        }
    }

    /// Inconsistent rows for the penalty tool; one per problem file otherwise.
    pub fn issue_count(&self) -> usize {
        match self {
            FileOutcome::Penalty(report) => report.total_issues,
            other => usize::from(other.has_issues()),
        }
    }

    pub fn can_fix(&self) -> bool {
        match self {
            FileOutcome::Penalty(report) => report.need_to_save,
            FileOutcome::TimePrecision { report, .. } => report.can_fix(),
            FileOutcome::Malformed(_) => false,
        }
    }

    fn needs_save(&self) -> bool {
        match self {
            FileOutcome::Penalty(report) => report.need_to_save,
            FileOutcome::TimePrecision { committed, .. } => *committed,
            FileOutcome::Malformed(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub unique_key: String,
    pub outcome: FileOutcome,
    /// Whether the file was written back.
    pub saved: bool,
}

/// Aggregate counts over one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_issues: usize,
    pub files_fixable: usize,
    pub files_fixed: usize,
}

/// Drop entries whose key is excluded. Excluded ranklists are not even read.
pub fn filter_excluded(entries: Vec<RanklistEntry>, exclusions: &ExclusionSet) -> Vec<RanklistEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let excluded = exclusions.is_excluded(&entry.unique_key);
            if excluded {
                debug!(key = %entry.unique_key, "excluded");
            }
            !excluded
        })
        .collect()
}

/// Run `f` over `inputs` on at most `jobs` blocking workers, returning the
/// results in input order.
async fn ordered_blocking<I, T, F>(inputs: Vec<I>, jobs: usize, f: F) -> Result<Vec<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Result<T> + Clone + Send + 'static,
{
    let joined: Vec<_> = stream::iter(inputs)
        .map(|input| {
            let f = f.clone();
            tokio::task::spawn_blocking(move || f(input))
        })
        .buffered(jobs.max(1))
        .collect()
        .await;

    joined
        .into_iter()
        .map(|result| -> Result<T> { result.context("Worker task failed")? })
        .collect()
}

/// Read every ranklist before anything is checked. Any unreadable or
/// unparsable file fails the whole run, so nothing is written.
pub async fn load_collection(entries: Vec<RanklistEntry>, jobs: usize) -> Result<Vec<LoadedRanklist>> {
    ordered_blocking(entries, jobs, |entry| {
        let file = load_ranklist(&entry.file_path)
            .with_context(|| format!("Prepare failed for {}", entry.unique_key))?;
        Ok(LoadedRanklist { entry, file })
    })
    .await
}

/// Check (and in fix mode, repair) every loaded ranklist. Results come back
/// in the order the ranklists were given.
pub async fn run_audit(files: Vec<LoadedRanklist>, options: &AuditOptions) -> Result<Vec<FileResult>> {
    let start = Instant::now();
    let count = files.len();
    let worker_options = options.clone();
    let results = ordered_blocking(files, options.jobs, move |loaded| {
        audit_file(loaded, &worker_options)
    })
    .await?;

    info!(
        tool = options.tool.label(),
        files = count,
        elapsed = ?start.elapsed(),
        "audit finished"
    );
    Ok(results)
}

/// Check one ranklist and commit its repair if there is one.
pub fn audit_file(loaded: LoadedRanklist, options: &AuditOptions) -> Result<FileResult> {
    let LoadedRanklist { entry, mut file } = loaded;
    let rules = ScoringRules::from_ranklist(&file.ranklist, &options.defaults);

    let outcome = match evaluate(&mut file.ranklist, &rules, options) {
        Ok(outcome) => outcome,
        Err(e) if e.is_file_local() => {
            warn!(key = %entry.unique_key, error = %e, "skipping malformed ranklist");
            FileOutcome::Malformed(e.to_string())
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Check failed for {}", entry.unique_key));
        }
    };

    let saved = options.mode == Mode::Fix && outcome.needs_save();
    if saved {
        save_ranklist(&entry.file_path, &file)?;
        debug!(key = %entry.unique_key, path = %entry.file_path.display(), "saved");
    }

    Ok(FileResult {
        unique_key: entry.unique_key,
        outcome,
        saved,
    })
}

fn evaluate(
    ranklist: &mut Ranklist,
    rules: &ScoringRules,
    options: &AuditOptions,
) -> Result<FileOutcome, RanklistError> {
    match (options.tool, options.mode) {
        (Tool::Penalty, Mode::Check) => Ok(FileOutcome::Penalty(check_penalty(ranklist, rules)?)),
        (Tool::Penalty, Mode::Fix) => Ok(FileOutcome::Penalty(repair_penalty(ranklist, rules)?)),
        (Tool::TimePrecision, mode) => {
            let report = search_time_config(ranklist, rules)?;
            let committed = match (mode, report.correct_config()) {
                (Mode::Fix, Some(config)) => apply_time_config(ranklist, rules, config)?,
                _ => false,
            };
            Ok(FileOutcome::TimePrecision { report, committed })
        }
    }
}

pub fn summarize(results: &[FileResult]) -> RunSummary {
    results.iter().fold(
        RunSummary {
            total_files: results.len(),
            ..Default::default()
        },
        |mut summary, result| {
            if result.outcome.has_issues() {
                summary.files_with_issues += 1;
                summary.total_issues += result.outcome.issue_count();
            }
            if result.outcome.can_fix() {
                summary.files_fixable += 1;
            }
            if result.saved {
                summary.files_fixed += 1;
            }
            summary
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranklist::{Duration, Precision, RoundingMode, SearchOutcome, TimeConfig, TimeUnit};
    use std::fs;
    use std::path::Path;

    const CONSISTENT: &str = r#"{
  "contest": { "title": "Consistent" },
  "problems": [{}],
  "rows": [{ "score": { "time": [30, "min"] },
             "statuses": [{ "result": "AC", "tries": 2, "time": [10, "min"] }] }]
}"#;

    /// Status times include the penalty; repairable.
    const PENALTY_INCLUDED: &str = r#"{
  "problems": [{}],
  "rows": [{ "score": { "time": [50, "min"] },
             "statuses": [{ "result": "AC", "tries": 2, "time": [50, "min"] }] }]
}"#;

    /// Only seconds with ceiling rounding reconciles this one.
    const NEEDS_SECONDS_CEIL: &str = r#"{
  "problems": [{}],
  "rows": [{ "score": { "time": [2, "s"] },
             "statuses": [{ "result": "AC", "tries": 1, "time": [1500, "ms"] }] }]
}"#;

    const MALFORMED: &str = r#"{
  "problems": [{}, {}],
  "rows": [{ "score": { "time": [0, "ms"] }, "statuses": [{ "result": null }] }]
}"#;

    fn entry(dir: &Path, key: &str, json: &str) -> RanklistEntry {
        let file_path = dir.join(format!("{}.srk.json", key));
        fs::write(&file_path, json).unwrap();
        RanklistEntry {
            unique_key: key.to_string(),
            file_path,
        }
    }

    fn options(tool: Tool, mode: Mode) -> AuditOptions {
        AuditOptions {
            tool,
            mode,
            jobs: 2,
            defaults: RuleDefaults::default(),
        }
    }

    async fn run(entries: Vec<RanklistEntry>, options: &AuditOptions) -> Vec<FileResult> {
        let loaded = load_collection(entries, options.jobs).await.unwrap();
        run_audit(loaded, options).await.unwrap()
    }

    #[tokio::test]
    async fn test_results_keep_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        let keys = ["e", "d", "c", "b", "a"];
        let entries: Vec<_> = keys
            .iter()
            .map(|k| entry(dir.path(), k, CONSISTENT))
            .collect();

        let results = run(entries, &options(Tool::Penalty, Mode::Check)).await;
        let order: Vec<_> = results.iter().map(|r| r.unique_key.as_str()).collect();
        assert_eq!(order, keys);
    }

    #[tokio::test]
    async fn test_penalty_check_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), "p", PENALTY_INCLUDED);
        let path = e.file_path.clone();

        let results = run(vec![e], &options(Tool::Penalty, Mode::Check)).await;
        assert_eq!(results[0].outcome.issue_count(), 1);
        assert!(!results[0].saved);
        assert_eq!(fs::read_to_string(&path).unwrap(), PENALTY_INCLUDED);
    }

    #[tokio::test]
    async fn test_penalty_fix_writes_repaired_file() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), "p", PENALTY_INCLUDED);
        let path = e.file_path.clone();

        let results = run(vec![e], &options(Tool::Penalty, Mode::Fix)).await;
        assert!(results[0].saved);

        let repaired = load_ranklist(&path).unwrap().ranklist;
        assert_eq!(
            repaired.rows[0].statuses[0].time,
            Some(Duration::new(30, TimeUnit::Min))
        );
    }

    #[tokio::test]
    async fn test_penalty_fix_keeps_untouched_keys_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let original = r#"{
  "type": "general",
  "version": "0.3.0",
  "problems": [{ "alias": "A" }],
  "rows": [{ "user": { "id": "t1" },
             "score": { "value": 1, "time": [50, "min"] },
             "statuses": [{ "result": "AC", "time": [50, "min"], "tries": 2 }] }],
  "remarks": "kept last"
}"#;
        let e = entry(dir.path(), "k", original);
        let path = e.file_path.clone();

        let results = run(vec![e], &options(Tool::Penalty, Mode::Fix)).await;
        assert!(results[0].saved);

        let mut expected: serde_json::Value = serde_json::from_str(original).unwrap();
        expected["rows"][0]["statuses"][0]["time"] = serde_json::json!([30, "min"]);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            serde_json::to_string_pretty(&expected).unwrap()
        );
    }

    #[tokio::test]
    async fn test_rejected_repair_leaves_file_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let unrepairable = r#"{
  "problems": [{}],
  "rows": [{ "score": { "time": [20, "min"] },
             "statuses": [{ "result": "AC", "tries": 2, "time": [30, "min"] }] }]
}"#;
        let e = entry(dir.path(), "u", unrepairable);
        let path = e.file_path.clone();

        let results = run(vec![e], &options(Tool::Penalty, Mode::Fix)).await;
        assert!(results[0].outcome.has_issues());
        assert!(!results[0].saved);
        assert_eq!(fs::read_to_string(&path).unwrap(), unrepairable);
    }

    #[tokio::test]
    async fn test_time_precision_fix_updates_sorter_config() {
        let dir = tempfile::tempdir().unwrap();
        let e = entry(dir.path(), "t", NEEDS_SECONDS_CEIL);
        let path = e.file_path.clone();

        let results = run(vec![e], &options(Tool::TimePrecision, Mode::Fix)).await;
        let FileOutcome::TimePrecision { report, committed } = &results[0].outcome else {
            panic!("unexpected outcome {:?}", results[0].outcome);
        };
        assert!(*committed);
        assert_eq!(
            report.outcome,
            SearchOutcome::Found(TimeConfig::new(Precision::Fixed(TimeUnit::S), RoundingMode::Ceil))
        );

        let fixed = load_ranklist(&path).unwrap().ranklist;
        let config = fixed.sorter_config().unwrap();
        assert_eq!(config.time_precision, Some(TimeUnit::S));
        assert_eq!(config.time_rounding, Some(RoundingMode::Ceil));
    }

    #[tokio::test]
    async fn test_time_precision_check_counts_fixable() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "ok", CONSISTENT),
            entry(dir.path(), "t", NEEDS_SECONDS_CEIL),
        ];
        let results = run(entries, &options(Tool::TimePrecision, Mode::Check)).await;
        let summary = summarize(&results);
        assert_eq!(
            summary,
            RunSummary {
                total_files: 2,
                files_with_issues: 1,
                total_issues: 1,
                files_fixable: 1,
                files_fixed: 0,
            }
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("t.srk.json")).unwrap(),
            NEEDS_SECONDS_CEIL
        );
    }

    #[tokio::test]
    async fn test_malformed_file_is_reported_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "bad", MALFORMED),
            entry(dir.path(), "p", PENALTY_INCLUDED),
        ];
        let results = run(entries, &options(Tool::Penalty, Mode::Fix)).await;
        assert!(matches!(results[0].outcome, FileOutcome::Malformed(_)));
        assert!(!results[0].saved);
        assert!(results[1].saved);
        assert_eq!(fs::read_to_string(dir.path().join("bad.srk.json")).unwrap(), MALFORMED);
    }

    #[tokio::test]
    async fn test_unparsable_file_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let bad_unit = PENALTY_INCLUDED.replace("[50, \"min\"]", "[50, \"minutes\"]");
        let entries = vec![
            entry(dir.path(), "p", PENALTY_INCLUDED),
            entry(dir.path(), "corrupt", &bad_unit),
        ];
        let err = load_collection(entries, 2).await.unwrap_err();
        assert!(format!("{:#}", err).contains("corrupt"));
        assert_eq!(
            fs::read_to_string(dir.path().join("p.srk.json")).unwrap(),
            PENALTY_INCLUDED
        );
    }

    #[tokio::test]
    async fn test_excluded_file_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![
            entry(dir.path(), "icpc2025srni", PENALTY_INCLUDED),
            entry(dir.path(), "ok", CONSISTENT),
        ];

        // Checked directly, the excluded ranklist does have an issue.
        let direct = run(entries.clone(), &options(Tool::Penalty, Mode::Check)).await;
        assert_eq!(summarize(&direct).total_issues, 1);

        let exclusions = ExclusionSet::new(["icpc2025srni"]).unwrap();
        let kept = filter_excluded(entries, &exclusions);
        let results = run(kept, &options(Tool::Penalty, Mode::Check)).await;
        let summary = summarize(&results);
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.files_with_issues, 0);
        assert_eq!(summary.total_issues, 0);
    }

    #[test]
    fn test_summarize_fix_counts() {
        let results = vec![
            FileResult {
                unique_key: "a".to_string(),
                outcome: FileOutcome::Penalty(RepairReport {
                    total_issues: 3,
                    fixed_issues: 4,
                    need_to_save: true,
                }),
                saved: true,
            },
            FileResult {
                unique_key: "b".to_string(),
                outcome: FileOutcome::Penalty(RepairReport {
                    total_issues: 2,
                    fixed_issues: 0,
                    need_to_save: false,
                }),
                saved: false,
            },
            FileResult {
                unique_key: "c".to_string(),
                outcome: FileOutcome::Penalty(RepairReport::default()),
                saved: false,
            },
        ];
        let summary = summarize(&results);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.files_with_issues, 2);
        assert_eq!(summary.total_issues, 5);
        assert_eq!(summary.files_fixed, 1);
    }
}
