//! scalebench CLI.
//!
//! Usage:
//!   scalebench 65536                       # all backends, append + lookup
//!   scalebench 65536 --backend sqlite      # one backend
//!   scalebench --clean                     # delete cached artifacts and exit
//!   scalebench 1048576 --timeout 1800      # 30-minute budget per run

use clap::Parser;
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Duration;

use scalebench::config::BenchConfig;
use scalebench::runner::{self, RunOutcome};
use scalebench::stats::CvCriteria;
use scalebench::{adapters, report, BenchResult, SystemInfo};

#[derive(Parser, Debug)]
#[command(
    name = "scalebench",
    about = "Measure append/lookup scaling of storage backends with adaptive sampling"
)]
struct Cli {
    /// Target data size (number of appended items).
    #[arg(index = 1, default_value = "256")]
    data_size: u64,

    /// Working directory for benchmark artifacts.
    #[arg(long, short = 'd')]
    dir: Option<PathBuf>,

    /// Directory for result CSV/JSON files.
    #[arg(long, short = 'o', default_value = ".")]
    output: PathBuf,

    /// Session name used as the result-file prefix (defaults to a timestamp).
    #[arg(long, short = 's')]
    session: Option<String>,

    /// Benchmark deadline in seconds, per run.
    #[arg(long, default_value = "600")]
    timeout: u64,

    /// Backends to benchmark (comma-separated: memory, seqfile, sqlite).
    #[arg(long, value_delimiter = ',')]
    backend: Vec<String>,

    /// Skip the append benchmark.
    #[arg(long)]
    skip_append: bool,

    /// Skip the lookup benchmark.
    #[arg(long)]
    skip_lookup: bool,

    /// CV convergence threshold, as a fraction.
    #[arg(long, default_value = "0.05")]
    cv_threshold: f64,

    /// Multiplier applied to the CV before the threshold comparison.
    #[arg(long, default_value = "1.0")]
    cv_multiplier: f64,

    /// Leave artifacts on disk after a fatal error for post-mortem inspection.
    #[arg(long)]
    keep_on_failure: bool,

    /// Delete all cached benchmark artifacts and exit.
    #[arg(long, short = 'c')]
    clean: bool,
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{} {e}", "FATAL".red().bold());
            std::process::exit(e.exit_code());
        }
    }
}

fn run() -> BenchResult<()> {
    let cli = Cli::parse();

    let backends: Vec<String> = if cli.backend.is_empty() {
        adapters::BACKENDS.iter().map(|s| s.to_string()).collect()
    } else {
        cli.backend.iter().map(|s| s.to_lowercase()).collect()
    };

    let cfg = BenchConfig {
        data_size: cli.data_size,
        work_dir: cli.dir.unwrap_or_else(std::env::temp_dir),
        result_dir: cli.output,
        session_id: cli
            .session
            .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d%H%M%S").to_string()),
        deadline: Duration::from_secs(cli.timeout),
        criteria: CvCriteria {
            threshold: cli.cv_threshold,
            multiplier: cli.cv_multiplier,
        },
        keep_on_failure: cli.keep_on_failure,
        ..Default::default()
    };
    cfg.validate()?;
    cfg.ensure_dirs()?;

    if cli.clean {
        for backend in &backends {
            for series in series_names(backend) {
                cfg.remove_artifact(&series)?;
                eprintln!("deleted artifact: {}", cfg.artifact_path(&series).display());
            }
        }
        return Ok(());
    }

    let info = SystemInfo::collect();
    report::print_banner(&cfg, &info, &backends);

    // One process-wide RNG for probe-order shuffling.
    let mut rng = ChaCha8Rng::from_entropy();

    let mut outcomes: Vec<RunOutcome> = Vec::new();
    for backend in &backends {
        let [append_series, volume_series, query_series] = series_names(backend);

        if !cli.skip_append {
            let mut cut = adapters::create(backend, cfg.artifact_path(&append_series))?;
            let outcome =
                runner::append_benchmark(cut.as_mut(), &cfg, &append_series, &volume_series)?;
            outcomes.push(outcome);
        }

        if !cli.skip_lookup {
            let mut cut = adapters::create(backend, cfg.artifact_path(&query_series))?;
            let outcome = runner::lookup_benchmark(cut.as_mut(), &cfg, &query_series, &mut rng)?;
            outcomes.push(outcome);
        }
    }

    report::print_outcomes(&outcomes);
    report::export_summary(&cfg, &info, &outcomes)?;
    Ok(())
}

fn series_names(backend: &str) -> [String; 3] {
    [
        format!("{backend}-append"),
        format!("{backend}-volume"),
        format!("{backend}-query"),
    ]
}
