//! The sampling controller.
//!
//! Both benchmark shapes share one state machine: Init → {Trial → Evaluate}
//! loop → Drain/Serialize → Done. Trials run strictly sequentially; the
//! deadline is checked cooperatively between trials, so an in-flight trial
//! always completes. Results are written only when the loop ends legitimately
//! (convergence, deadline, or trial exhaustion) — never after a mid-trial
//! error.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::BenchConfig;
use crate::probe;
use crate::progress::ProgressMeter;
use crate::report;
use crate::stats::SampleSet;
use crate::{splitmix64, BenchError, BenchResult, StorageCut};

/// How one benchmark run ended, for the summary table and JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub backend: String,
    pub series: String,
    pub trials: usize,
    pub converged: bool,
    pub timed_out: bool,
    pub worst_cv: Option<f64>,
    pub elapsed_secs: f64,
    pub result_files: Vec<String>,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Close the component under test and delete its artifact. On a fatal error
/// with `keep_on_failure` set, the artifact is left for post-mortem
/// inspection. Cleanup never masks the primary outcome.
fn cleanup(cut: &mut dyn StorageCut, cfg: &BenchConfig, series: &str, failed: bool) {
    let _ = cut.close();
    if failed && cfg.keep_on_failure {
        return;
    }
    let _ = cfg.remove_artifact(series);
}

// ────────────────────────────────────────────────────────────────────────────────
// Append benchmark
// ────────────────────────────────────────────────────────────────────────────────

/// Measure cumulative append time and storage footprint at linearly spaced
/// checkpoints, repeating trials until every checkpoint's CV is under the
/// threshold or the deadline expires. Time samples land in
/// `<session>-<time_series>.csv`, space samples in
/// `<session>-<space_series>.csv`.
pub fn append_benchmark(
    cut: &mut dyn StorageCut,
    cfg: &BenchConfig,
    time_series: &str,
    space_series: &str,
) -> BenchResult<RunOutcome> {
    println!("\n=== Append Benchmark ({time_series}) ===");
    let result = run_append(cut, cfg, time_series, space_series);
    cleanup(cut, cfg, time_series, result.is_err());
    result
}

fn run_append(
    cut: &mut dyn StorageCut,
    cfg: &BenchConfig,
    time_series: &str,
    space_series: &str,
) -> BenchResult<RunOutcome> {
    cfg.validate()?;
    let checkpoints = probe::linspace(1, cfg.data_size, cfg.append_divisions)?;

    let mut times = SampleSet::new();
    let mut spaces = SampleSet::new();
    let mut meter = ProgressMeter::new(
        cfg.deadline,
        cfg.notice_interval,
        cfg.max_trials,
        cfg.progress_divisions,
    );
    report::heading_ms();

    let mut converged = false;
    let mut timed_out = false;

    for trial in 0..cfg.max_trials {
        // Fresh artifact per trial: close, delete, reopen.
        cut.close()?;
        cfg.remove_artifact(time_series)?;
        cut.open()?;

        let mut cumulative = Duration::ZERO;
        for &n in &checkpoints {
            let (elapsed, footprint) = cut.measure_append(n)?;
            cumulative += elapsed;
            times.record(n, millis(cumulative));
            // Space is deterministic given the same inputs; sample it once.
            if trial == 0 {
                spaces.record(n, footprint as f64);
            }
        }

        let notify = meter.carried_out(1);
        if trial + 1 > cfg.min_trials
            && times
                .filter_unconverged(&checkpoints, &cfg.criteria)
                .is_empty()
        {
            converged = true;
            report::summary_ms(cfg.data_size, &times.stats(cfg.data_size), &meter);
            break;
        }
        if meter.expired() {
            timed_out = true;
            report::summary_ms(cfg.data_size, &times.stats(cfg.data_size), &meter);
            report::warn("append benchmark timed out before convergence");
            break;
        }
        if notify {
            report::summary_ms(cfg.data_size, &times.stats(cfg.data_size), &meter);
        }
    }
    if !converged && !timed_out {
        report::warn("append benchmark exhausted max trials without convergence");
    }

    let time_path = cfg.result_file(time_series);
    let space_path = cfg.result_file(space_series);
    times.save(&time_path, "SIZE", "MILLISECONDS")?;
    spaces.save(&space_path, "SIZE", "BYTES")?;

    Ok(RunOutcome {
        backend: cut.name().to_string(),
        series: time_series.to_string(),
        trials: meter.completed(),
        converged,
        timed_out,
        worst_cv: times.worst_cv(),
        elapsed_secs: meter.elapsed().as_secs_f64(),
        result_files: vec![
            time_path.display().to_string(),
            space_path.display().to_string(),
        ],
    })
}

// ────────────────────────────────────────────────────────────────────────────────
// Lookup benchmark
// ────────────────────────────────────────────────────────────────────────────────

/// Measure point-lookup latency at logarithmically spaced distances from the
/// latest write. The artifact is built once outside the timed loop; each trial
/// probes the still-active keys in a freshly shuffled order, prunes converged
/// keys after the minimum trial count, and stops when the active set is empty
/// or the deadline expires.
pub fn lookup_benchmark<R: Rng>(
    cut: &mut dyn StorageCut,
    cfg: &BenchConfig,
    series: &str,
    rng: &mut R,
) -> BenchResult<RunOutcome> {
    println!("\n=== Lookup Benchmark ({series}) ===");
    let result = run_lookup(cut, cfg, series, rng);
    cleanup(cut, cfg, series, result.is_err());
    result
}

fn run_lookup<R: Rng>(
    cut: &mut dyn StorageCut,
    cfg: &BenchConfig,
    series: &str,
    rng: &mut R,
) -> BenchResult<RunOutcome> {
    cfg.validate()?;

    // Build the artifact to full size, untimed.
    cfg.remove_artifact(series)?;
    cut.open()?;
    let t0 = Instant::now();
    cut.measure_append(cfg.data_size)?;
    println!(
        "Prepared {} entries in {:.3} [ms]",
        cfg.data_size,
        millis(t0.elapsed())
    );

    let distances = probe::logspace(1, cfg.data_size, cfg.query_divisions)?;
    // Distance d from the latest write maps to logical position
    // data_size - d + 1.
    let mut active: Vec<u64> = distances.iter().map(|d| cfg.data_size - d + 1).collect();

    let mut times = SampleSet::new();
    let mut meter = ProgressMeter::new(
        cfg.deadline,
        cfg.notice_interval,
        cfg.max_trials,
        cfg.progress_divisions,
    );
    report::heading_cv();

    let mut converged = false;
    let mut timed_out = false;

    for trial in 0..cfg.max_trials {
        // Uniform shuffle per trial so no key benefits from a fixed probe
        // order (cache warm-up, readahead).
        active.shuffle(rng);
        let samples = cut.measure_gets(&active)?;
        for (&key, sample) in &samples {
            let expected = splitmix64(key);
            if sample.value != expected {
                return Err(BenchError::VerificationMismatch {
                    key,
                    expected,
                    actual: sample.value,
                });
            }
            times.record(key, millis(sample.elapsed));
        }

        let notify = meter.carried_out(1);
        if trial + 1 > cfg.min_trials {
            // Monotone pruning: a key that leaves the active set never
            // returns within this run.
            active = times.filter_unconverged(&active, &cfg.criteria);
            if active.is_empty() {
                converged = true;
                report::summary_cv(cfg.data_size, times.worst_cv(), &meter);
                break;
            }
        }
        if meter.expired() {
            timed_out = true;
            report::summary_cv(cfg.data_size, times.worst_cv(), &meter);
            report::warn("lookup benchmark timed out before convergence");
            break;
        }
        if notify {
            report::summary_cv(cfg.data_size, times.worst_cv(), &meter);
        }
    }
    if !converged && !timed_out {
        report::warn("lookup benchmark exhausted max trials without convergence");
    }

    let path = cfg.result_file(series);
    times.save(&path, "SIZE", "TIME")?;

    Ok(RunOutcome {
        backend: cut.name().to_string(),
        series: series.to_string(),
        trials: meter.completed(),
        converged,
        timed_out,
        worst_cv: times.worst_cv(),
        elapsed_secs: meter.elapsed().as_secs_f64(),
        result_files: vec![path.display().to_string()],
    })
}
