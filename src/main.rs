use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use walkdir::WalkDir;

use lrucache::output::{self, OutputFormat};
use lrucache::report::ReplayReport;

#[derive(Parser)]
#[command(name = "lrucache", about = "Replay access scripts against an LRU cache")]
struct Cli {
    /// Script file or directory of `.lru` / `.json` scripts.
    path: PathBuf,

    /// Capacity to use instead of the one declared in each script.
    #[arg(long, allow_negative_numbers = true)]
    capacity: Option<i64>,

    /// Output format: pretty, text, or json.
    #[arg(long, default_value = "pretty")]
    format: String,

    /// Exit 1 if any expectation in any script failed.
    #[arg(long)]
    strict: bool,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s {
        "pretty" => Ok(OutputFormat::Pretty),
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => anyhow::bail!("unknown format: {other} (expected pretty, text, or json)"),
    }
}

fn is_script(path: &std::path::Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "lru" || ext == "json")
}

fn collect_files(path: &PathBuf) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.clone()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let p = entry.path();
        if is_script(p) {
            files.push(p.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn format_report(report: &ReplayReport, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => output::format_json(report),
        OutputFormat::Text => output::format_text(report),
        OutputFormat::Pretty => output::format_pretty(report),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let fmt = parse_format(&cli.format)?;

    let files = collect_files(&cli.path).context("failed to collect scripts")?;

    if files.is_empty() {
        anyhow::bail!("no .lru or .json scripts found in {}", cli.path.display());
    }

    let reports: Vec<ReplayReport> = files
        .iter()
        .map(|f| {
            lrucache::replay_file(f, cli.capacity)
                .with_context(|| format!("failed to replay {}", f.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    if fmt == OutputFormat::Json && reports.len() > 1 {
        let json = serde_json::to_string_pretty(&reports)?;
        println!("{json}");
    } else {
        for report in &reports {
            println!("{}", format_report(report, fmt));
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        log::warn!("{failed} of {} script(s) had failing expectations", reports.len());
        if cli.strict {
            std::process::exit(1);
        }
    }

    Ok(())
}
