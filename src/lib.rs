//! Shared types, the component-under-test trait and the deterministic payload
//! codec for scalebench.
//!
//! The interesting machinery lives in [`stats`] (per-key sample accumulation
//! and CV convergence), [`probe`] (measurement-point generation),
//! [`progress`] (deadline/ETA tracking) and [`runner`] (the sampling loops).

pub mod adapters;
pub mod config;
pub mod probe;
pub mod progress;
pub mod report;
pub mod runner;
pub mod stats;

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("verification mismatch at key {key}: expected {expected:#018x}, got {actual:#018x}")]
    VerificationMismatch {
        key: u64,
        expected: u64,
        actual: u64,
    },
}

impl BenchError {
    /// Process exit code for fatal errors. Soft conditions (timeout,
    /// non-convergence) never reach this path.
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::InvalidParameter(_) => 2,
            BenchError::VerificationMismatch { .. } => 3,
            _ => 1,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// Component-under-test trait — every storage adapter implements this
// ────────────────────────────────────────────────────────────────────────────────

/// One timed point lookup, with the value read back for verification.
#[derive(Debug, Clone, Copy)]
pub struct GetSample {
    pub elapsed: Duration,
    pub value: u64,
}

/// A storage backend under measurement.
///
/// Logical positions are 1-based: item `i` carries the payload
/// `splitmix64(i)` as an 8-byte little-endian value. The harness owns the
/// artifact lifecycle; adapters only open and close the path they were
/// constructed with.
pub trait StorageCut {
    fn name(&self) -> &str;

    /// Acquire or load persistent state. Idempotent; a no-op if already open.
    fn open(&mut self) -> BenchResult<()>;

    /// Release all resources. The harness deletes the artifact separately.
    fn close(&mut self) -> BenchResult<()>;

    /// Grow the artifact from its current size up to `target`, returning the
    /// elapsed time and the on-disk footprint after growth.
    fn measure_append(&mut self, target: u64) -> BenchResult<(Duration, u64)>;

    /// Fetch the value at each logical position, timing every lookup
    /// individually.
    fn measure_gets(&mut self, keys: &[u64]) -> BenchResult<HashMap<u64, GetSample>>;
}

// ────────────────────────────────────────────────────────────────────────────────
// Deterministic payload codec
// ────────────────────────────────────────────────────────────────────────────────

/// SplitMix64 finalizer. The payload for item `i` is `splitmix64(i)`, giving
/// every position a cheap, verifiable 8-byte value.
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

pub fn key_to_bytes(key: u64) -> [u8; 8] {
    key.to_le_bytes()
}

pub fn value_for(key: u64) -> [u8; 8] {
    splitmix64(key).to_le_bytes()
}

pub fn value_to_u64(bytes: &[u8]) -> BenchResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| BenchError::Storage(format!("invalid value byte size: {}", bytes.len())))?;
    Ok(u64::from_le_bytes(arr))
}

// ────────────────────────────────────────────────────────────────────────────────
// Filesystem footprint
// ────────────────────────────────────────────────────────────────────────────────

/// Size of a file, or the recursive size of a directory tree. Unreadable
/// entries count as zero rather than failing the measurement.
pub fn fs_footprint(path: &Path) -> u64 {
    let Ok(meta) = std::fs::metadata(path) else {
        return 0;
    };
    if !meta.is_dir() {
        return meta.len();
    }
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| fs_footprint(&e.path()))
        .sum()
}

// ────────────────────────────────────────────────────────────────────────────────
// System info
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpus: usize,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        }
    }
}
