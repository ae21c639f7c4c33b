use crate::report::ReplayReport;

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

/// Format a report as JSON.
pub fn format_json(report: &ReplayReport) -> String {
    serde_json::to_string_pretty(report).expect("report should be serializable")
}

/// Format a report as plain text (no colors).
pub fn format_text(report: &ReplayReport) -> String {
    let mut out = String::new();

    if let Some(ref path) = report.file_path {
        out.push_str(&format!("Script: {}\n", path.display()));
    }
    let verdict = if report.passed() { "PASS" } else { "FAIL" };
    out.push_str(&format!(
        "Result: {} ({} of {} steps failed)\n",
        verdict,
        report.failures,
        report.outcomes.len()
    ));
    out.push_str(&format!(
        "Capacity: {} | Hits: {} | Misses: {} | Evictions: {} | Hit rate: {:.1}%\n",
        report.capacity,
        report.stats.hits,
        report.stats.misses,
        report.stats.evictions,
        report.stats.hit_rate() * 100.0
    ));

    if !report.outcomes.is_empty() {
        out.push_str("\nSteps:\n");
        for outcome in &report.outcomes {
            let mark = if outcome.passed { "ok" } else { "FAIL" };
            out.push_str(&format!(
                "  [{:<4}] {:<24} -> {}\n",
                mark,
                outcome.step.to_string(),
                outcome.observed
            ));
        }
    }

    out.push_str("\nContents (most recent first):\n");
    if report.contents.is_empty() {
        out.push_str("  (empty)\n");
    }
    for (key, value) in &report.contents {
        out.push_str(&format!("  {key} = {value}\n"));
    }

    out
}

/// Format a report with terminal colors.
#[cfg(feature = "cli")]
pub fn format_pretty(report: &ReplayReport) -> String {
    use colored::Colorize;

    let mut out = String::new();

    if let Some(ref path) = report.file_path {
        out.push_str(&format!("{} {}\n", "Script:".bold(), path.display()));
    }

    let verdict = if report.passed() {
        "PASS".green().bold()
    } else {
        format!("FAIL ({} failed)", report.failures).red().bold()
    };
    out.push_str(&format!("{} {}\n", "Result:".bold(), verdict));
    out.push_str(&format!(
        "{} {} | {} {} | {} {} | {} {}\n",
        "Capacity:".dimmed(),
        report.capacity,
        "Hits:".dimmed(),
        report.stats.hits,
        "Misses:".dimmed(),
        report.stats.misses,
        "Evictions:".dimmed(),
        report.stats.evictions,
    ));

    let bar_len = (report.stats.hit_rate() * 30.0) as usize;
    out.push_str(&format!(
        "{} {} {:.1}%\n",
        "Hit rate:".dimmed(),
        "█".repeat(bar_len).cyan(),
        report.stats.hit_rate() * 100.0
    ));

    if !report.outcomes.is_empty() {
        out.push_str(&format!("\n{}\n", "Steps:".bold()));
        for outcome in &report.outcomes {
            let mark = if outcome.passed {
                "✓".green()
            } else {
                "✗".red()
            };
            let step = format!("{:<24}", outcome.step.to_string());
            out.push_str(&format!(
                "  {} {} {}\n",
                mark,
                step,
                outcome.observed.to_string().dimmed()
            ));
        }
    }

    out.push_str(&format!("\n{}\n", "Contents (most recent first):".bold()));
    if report.contents.is_empty() {
        out.push_str(&format!("  {}\n", "(empty)".dimmed()));
    }
    for (key, value) in &report.contents {
        out.push_str(&format!("  {} = {}\n", key.bold(), value));
    }

    out
}
