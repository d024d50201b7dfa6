use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use srk_fix::audit::{self, AuditOptions, Mode, Tool};
use srk_fix::collection::{enumerate_collection, ExclusionSet};
use srk_fix::output;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that row score times equal the sum of penalized status times
    Penalty {
        /// Collection directory containing config.yaml
        dir: PathBuf,
        /// Rewrite status times so rows match their scores
        #[arg(short, long)]
        fix: bool,
    },
    /// Find the timePrecision/timeRounding that makes every row consistent
    TimePrecision {
        /// Collection directory containing config.yaml
        dir: PathBuf,
        /// Write the found configuration into sorter.config
        #[arg(short, long)]
        fix: bool,
    },
}

impl Commands {
    fn parts(&self) -> (Tool, Mode, &PathBuf) {
        let (tool, fix, dir) = match self {
            Commands::Penalty { dir, fix } => (Tool::Penalty, *fix, dir),
            Commands::TimePrecision { dir, fix } => (Tool::TimePrecision, *fix, dir),
        };
        (tool, if fix { Mode::Fix } else { Mode::Check }, dir)
    }
}

#[derive(Parser, Debug)]
#[command(name = "srk-fix")]
#[command(about = "Check and repair time consistency of srk ranklist collections", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to settings file (defaults to ~/.config/srk-fix/config.yaml)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Number of ranklists processed concurrently (overrides settings)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Skip ranklists with this key or glob pattern (repeatable)
    #[arg(long = "exclude", global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let (tool, mode, dir) = cli.command.parts();
    let start_time = Instant::now();

    // Load settings
    let mut settings = match srk_fix::config::load_settings(cli.settings.clone()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Settings error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if let Some(jobs) = cli.jobs {
        settings.jobs = Some(jobs);
    }
    let exclude_list = match tool {
        Tool::Penalty => &mut settings.exclude.penalty,
        Tool::TimePrecision => &mut settings.exclude.time_precision,
    };
    exclude_list.extend(cli.exclude.iter().cloned());

    if let Err(errors) = srk_fix::config::validate_settings(&settings) {
        eprintln!("Settings errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let exclude_patterns = match tool {
        Tool::Penalty => &settings.exclude.penalty,
        Tool::TimePrecision => &settings.exclude.time_precision,
    };
    let exclusions = match ExclusionSet::new(exclude_patterns) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Settings error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let collection = dir.display().to_string();
    println!("{}", output::format_header(tool, mode, &collection));

    let entries = match enumerate_collection(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Collection error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };
    let enumerated = entries.len();
    let entries = audit::filter_excluded(entries, &exclusions);
    tracing::info!(
        enumerated,
        excluded = enumerated - entries.len(),
        "enumerated collection"
    );

    let options = AuditOptions {
        tool,
        mode,
        jobs: settings.jobs(),
        defaults: settings.rule_defaults(),
    };

    // Everything is read before anything is checked or written
    let files = match audit::load_collection(entries, options.jobs).await {
        Ok(files) => files,
        Err(e) => {
            eprintln!("Input error: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };
    println!("{}", output::format_found(files.len(), mode));

    let results = match audit::run_audit(files, &options).await {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Run failed: {:#}", e);
            std::process::exit(EXIT_INPUT);
        }
    };

    let use_colors = output::should_use_colors();
    for result in &results {
        if let Some(line) = output::format_file_result(result, mode, use_colors) {
            println!("{}", line);
        }
    }

    let summary = audit::summarize(&results);
    for line in output::format_summary(&summary, tool, mode, start_time.elapsed()) {
        println!("{}", line);
    }

    std::process::exit(EXIT_SUCCESS);
}
