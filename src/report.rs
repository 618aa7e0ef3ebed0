//! Terminal output: run banner, streaming progress lines and the end-of-run
//! summary table, plus JSON export of the run summary.

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;

use crate::config::BenchConfig;
use crate::progress::ProgressMeter;
use crate::runner::RunOutcome;
use crate::stats::SampleStats;
use crate::{BenchResult, SystemInfo};

// ────────────────────────────────────────────────────────────────────────────────
// Banner
// ────────────────────────────────────────────────────────────────────────────────

pub fn print_banner(cfg: &BenchConfig, info: &SystemInfo, backends: &[String]) {
    println!(
        "\n{}",
        "╔══════════════════════════════════════════════════════╗"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "║        scalebench — storage scaling benchmark        ║"
            .bold()
            .blue()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════╝"
            .bold()
            .blue()
    );
    println!(
        "  OS: {}  Arch: {}  CPUs: {}  Time: {}",
        info.os, info.arch, info.cpus, info.timestamp
    );
    println!("  Backends: {}", backends.join(", "));
    println!("  Working directory: {}", cfg.work_dir.display());
    println!("  Result directory: {}", cfg.result_dir.display());
    println!("  Session ID: {}", cfg.session_id);
    println!("  Max data size: {}", cfg.data_size);
    println!(
        "  Trials: {}..{}  Timeout: {:?}",
        cfg.min_trials, cfg.max_trials, cfg.deadline
    );
    println!(
        "  CV threshold: {:.1}% (multiplier {:.1})",
        cfg.criteria.threshold * 100.0,
        cfg.criteria.multiplier
    );
    println!(
        "  Divisions: append {} / query {}",
        cfg.append_divisions, cfg.query_divisions
    );
    println!("  Data type: 8-byte integers\n");
}

pub fn warn(msg: &str) {
    eprintln!("  {} {}", "WARN".yellow().bold(), msg);
}

// ────────────────────────────────────────────────────────────────────────────────
// Streaming progress lines
// ────────────────────────────────────────────────────────────────────────────────

pub fn heading_ms() {
    println!(
        "{:>10} {:>9} {:>10} {:>6} {:>9} {:<18}",
        "DataSize", "Mean[ms]", "StdDev[ms]", "CV[%]", "Trials", "ETA"
    );
    println!(
        "{} {} {} {} {} {}",
        "-".repeat(10),
        "-".repeat(9),
        "-".repeat(10),
        "-".repeat(6),
        "-".repeat(9),
        "-".repeat(18)
    );
}

pub fn summary_ms(data_size: u64, stats: &SampleStats, meter: &ProgressMeter) {
    let cv_percent = if stats.mean > 0.0 {
        stats.std_dev / stats.mean * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>9.3} {:>10.3} {:>6.1} {:>9} {:<18}",
        data_size,
        stats.mean,
        stats.std_dev,
        cv_percent,
        meter.completed(),
        meter.eta()
    );
}

pub fn heading_cv() {
    println!(
        "{:>10} {:>6} {:>9} {:<18}",
        "DataSize", "CV[%]", "Trials", "ETA"
    );
    println!(
        "{} {} {} {}",
        "-".repeat(10),
        "-".repeat(6),
        "-".repeat(9),
        "-".repeat(18)
    );
}

pub fn summary_cv(data_size: u64, worst_cv: Option<f64>, meter: &ProgressMeter) {
    let cv = worst_cv
        .map(|cv| format!("{:.1}", cv * 100.0))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>10} {:>6} {:>9} {:<18}",
        data_size,
        cv,
        meter.completed(),
        meter.eta()
    );
}

// ────────────────────────────────────────────────────────────────────────────────
// End-of-run summary
// ────────────────────────────────────────────────────────────────────────────────

pub fn print_outcomes(outcomes: &[RunOutcome]) {
    if outcomes.is_empty() {
        return;
    }
    println!("\n{}", "━━━ Run Summary ━━━".bold().cyan());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        "Backend",
        "Series",
        "Trials",
        "Stopped by",
        "Worst CV",
        "Elapsed",
    ]);

    for o in outcomes {
        let (stop, color) = if o.converged {
            ("converged", Color::Green)
        } else if o.timed_out {
            ("deadline", Color::Yellow)
        } else {
            ("max trials", Color::Yellow)
        };
        let worst = o
            .worst_cv
            .map(|cv| format!("{:.2}%", cv * 100.0))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&o.backend),
            Cell::new(&o.series),
            Cell::new(o.trials),
            Cell::new(stop).fg(color),
            Cell::new(worst),
            Cell::new(format!("{:.1}s", o.elapsed_secs)),
        ]);
    }
    println!("{table}");

    for o in outcomes {
        for f in &o.result_files {
            println!("  ==> {}", f.dimmed());
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub system_info: &'a SystemInfo,
    pub outcomes: &'a [RunOutcome],
}

pub fn export_summary(
    cfg: &BenchConfig,
    info: &SystemInfo,
    outcomes: &[RunOutcome],
) -> BenchResult<()> {
    let summary = RunSummary {
        system_info: info,
        outcomes,
    };
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let path = cfg.summary_file();
    std::fs::write(&path, json)?;
    println!("  JSON summary: {}", path.display());
    Ok(())
}
