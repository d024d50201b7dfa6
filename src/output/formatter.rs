use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::audit::{FileOutcome, FileResult, Mode, RunSummary, Tool};
use crate::ranklist::TimeConfig;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// "Checking penalty issues in collection official"
pub fn format_header(tool: Tool, mode: Mode, collection: &str) -> String {
    let verb = match mode {
        Mode::Check => "Checking",
        Mode::Fix => "Fixing",
    };
    format!("{} {} issues in collection {}", verb, tool.label(), collection)
}

/// "Found 12 ranklists to check"
pub fn format_found(count: usize, mode: Mode) -> String {
    let action = match mode {
        Mode::Check => "check",
        Mode::Fix => "fix",
    };
    format!("Found {} ranklists to {}", count, action)
}

/// Render a time config the way it appears in `sorter.config`.
fn format_time_config(config: &TimeConfig) -> String {
    serde_json::to_string(config).unwrap_or_else(|_| config.to_string())
}

/// One indented line for a ranklist with issues, or None if it is clean.
pub fn format_file_result(result: &FileResult, mode: Mode, use_colors: bool) -> Option<String> {
    if !result.outcome.has_issues() {
        return None;
    }
    let key = &result.unique_key;

    let line = match &result.outcome {
        FileOutcome::Penalty(report) => {
            let n = report.total_issues;
            match mode {
                Mode::Fix if result.saved => paint(format!("Fixed {} issues in {}", n, key), Tone::Good, use_colors),
                Mode::Fix => paint(
                    format!(
                        "Found {} issues in {} (could not fix all, possibly a time precision issue)",
                        n, key
                    ),
                    Tone::Bad,
                    use_colors,
                ),
                Mode::Check => paint(format!("Found {} issues in {}", n, key), Tone::Warn, use_colors),
            }
        }
        FileOutcome::TimePrecision { report, committed } => {
            let current = format_time_config(&report.current);
            match report.correct_config() {
                Some(correct) if *committed => paint(
                    format!("Fixed {}: {} -> {}", key, current, format_time_config(&correct)),
                    Tone::Good,
                    use_colors,
                ),
                Some(correct) if mode == Mode::Fix => paint(
                    format!(
                        "Found issue in {}: {} -> {} (re-verification failed, not saved)",
                        key,
                        current,
                        format_time_config(&correct)
                    ),
                    Tone::Bad,
                    use_colors,
                ),
                Some(correct) => paint(
                    format!("Found issue in {}: {} -> {}", key, current, format_time_config(&correct)),
                    Tone::Warn,
                    use_colors,
                ),
                None => paint(
                    format!("Found issue in {}: {} (cannot fix)", key, current),
                    Tone::Bad,
                    use_colors,
                ),
            }
        }
        FileOutcome::Malformed(reason) => paint(format!("Skipped {}: {}", key, reason), Tone::Bad, use_colors),
    };

    Some(format!("  {}", line))
}

/// Closing summary block, one line per entry.
pub fn format_summary(summary: &RunSummary, tool: Tool, mode: Mode, elapsed: Duration) -> Vec<String> {
    let verb = match mode {
        Mode::Check => "Check",
        Mode::Fix => "Fix",
    };
    // Millisecond resolution is plenty for a run report.
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);

    let mut lines = vec![
        String::new(),
        format!("{} completed in {}", verb, humantime::format_duration(elapsed)),
        format!(
            "Files with issues: {}/{}",
            summary.files_with_issues, summary.total_files
        ),
    ];

    match (mode, tool) {
        (Mode::Fix, _) => {
            lines.push(format!(
                "Files fixed: {}/{}",
                summary.files_fixed, summary.files_with_issues
            ));
        }
        (Mode::Check, Tool::TimePrecision) => {
            lines.push(format!(
                "Files can be fixed: {}/{}",
                summary.files_fixable, summary.files_with_issues
            ));
            if summary.files_fixable > 0 {
                lines.push(String::new());
                lines.push("Use -f flag to fix the issues".to_string());
            }
        }
        (Mode::Check, Tool::Penalty) => {
            if summary.total_issues > 0 {
                lines.push(String::new());
                lines.push("Use -f flag to fix the issues".to_string());
            }
        }
    }

    lines
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
}

fn paint(text: String, tone: Tone, use_colors: bool) -> String {
    if !use_colors {
        return text;
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Bad => text.red().to_string(),
    }
}
