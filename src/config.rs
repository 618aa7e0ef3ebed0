//! Run configuration: sizes, directories, deadline and convergence criteria.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::stats::CvCriteria;
use crate::{BenchError, BenchResult};

pub const DEFAULT_MAX_TRIALS: usize = 1000;
pub const DEFAULT_MIN_TRIALS: usize = 5;
pub const DEFAULT_APPEND_DIVISIONS: usize = 10;
pub const DEFAULT_QUERY_DIVISIONS: usize = 100;

#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Target data size (number of appended items).
    pub data_size: u64,
    /// Directory for benchmark artifacts.
    pub work_dir: PathBuf,
    /// Directory for result CSV/JSON files.
    pub result_dir: PathBuf,
    /// Naming prefix for result files.
    pub session_id: String,
    /// Wall-clock budget per benchmark run.
    pub deadline: Duration,
    pub min_trials: usize,
    pub max_trials: usize,
    pub criteria: CvCriteria,
    /// Checkpoint count for the append benchmark (linear spacing).
    pub append_divisions: usize,
    /// Probe count for the lookup benchmark (logarithmic spacing).
    pub query_divisions: usize,
    /// Elapsed-time cadence for progress notifications.
    pub notice_interval: Duration,
    /// Trial-count cadence divisor for progress notifications.
    pub progress_divisions: usize,
    /// Leave the artifact on disk after a fatal error, for post-mortem
    /// inspection.
    pub keep_on_failure: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_size: 256,
            work_dir: std::env::temp_dir(),
            result_dir: PathBuf::from("."),
            session_id: chrono::Local::now().format("%Y%m%d%H%M%S").to_string(),
            deadline: Duration::from_secs(600),
            min_trials: DEFAULT_MIN_TRIALS,
            max_trials: DEFAULT_MAX_TRIALS,
            criteria: CvCriteria::default(),
            append_divisions: DEFAULT_APPEND_DIVISIONS,
            query_divisions: DEFAULT_QUERY_DIVISIONS,
            notice_interval: Duration::from_secs(600),
            progress_divisions: 10,
            keep_on_failure: false,
        }
    }
}

impl BenchConfig {
    /// Artifact path for a named series under the working directory.
    pub fn artifact_path(&self, series: &str) -> PathBuf {
        self.work_dir.join(format!("scalebench-{series}.db"))
    }

    /// Delete the artifact for `series`, whether it is a file or a directory
    /// tree. Missing artifacts are fine.
    pub fn remove_artifact(&self, series: &str) -> BenchResult<()> {
        remove_path(&self.artifact_path(series))
    }

    /// Result CSV path for a series: `<result_dir>/<session>-<series>.csv`.
    pub fn result_file(&self, series: &str) -> PathBuf {
        self.result_dir
            .join(format!("{}-{}.csv", self.session_id, series))
    }

    /// Run summary JSON path.
    pub fn summary_file(&self) -> PathBuf {
        self.result_dir
            .join(format!("{}-summary.json", self.session_id))
    }

    /// Create the working and result directories if needed.
    pub fn ensure_dirs(&self) -> BenchResult<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        std::fs::create_dir_all(&self.result_dir)?;
        Ok(())
    }

    /// Reject configurations that the sampling loops cannot honor.
    pub fn validate(&self) -> BenchResult<()> {
        if self.data_size == 0 {
            return Err(BenchError::InvalidParameter(
                "data size must be positive".into(),
            ));
        }
        if self.max_trials == 0 {
            return Err(BenchError::InvalidParameter(
                "max trials must be positive".into(),
            ));
        }
        if self.criteria.threshold <= 0.0 || self.criteria.multiplier <= 0.0 {
            return Err(BenchError::InvalidParameter(
                "CV threshold and multiplier must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn remove_path(path: &Path) -> BenchResult<()> {
    let result = match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let cfg = BenchConfig {
            work_dir: PathBuf::from("/tmp/work"),
            result_dir: PathBuf::from("/tmp/out"),
            session_id: "20260830".into(),
            ..Default::default()
        };
        assert_eq!(
            cfg.artifact_path("seqfile-append"),
            PathBuf::from("/tmp/work/scalebench-seqfile-append.db")
        );
        assert_eq!(
            cfg.result_file("seqfile-append"),
            PathBuf::from("/tmp/out/20260830-seqfile-append.csv")
        );
        assert_eq!(
            cfg.summary_file(),
            PathBuf::from("/tmp/out/20260830-summary.json")
        );
    }

    #[test]
    fn test_remove_artifact_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = BenchConfig {
            work_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        // Absent artifact: fine.
        cfg.remove_artifact("nothing").unwrap();
        // File artifact.
        std::fs::write(cfg.artifact_path("f"), b"x").unwrap();
        cfg.remove_artifact("f").unwrap();
        assert!(!cfg.artifact_path("f").exists());
        // Directory artifact.
        std::fs::create_dir(cfg.artifact_path("d")).unwrap();
        std::fs::write(cfg.artifact_path("d").join("inner"), b"x").unwrap();
        cfg.remove_artifact("d").unwrap();
        assert!(!cfg.artifact_path("d").exists());
    }

    #[test]
    fn test_validate_rejects_bad_criteria() {
        let mut cfg = BenchConfig::default();
        cfg.validate().unwrap();
        cfg.criteria.threshold = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(BenchError::InvalidParameter(_))
        ));
    }
}
