//! Storage backend adapters.

pub mod memory;
pub mod seqfile;
pub mod sqlite;

use std::path::PathBuf;

use crate::{BenchError, BenchResult, StorageCut};

/// Backends selectable from the CLI.
pub const BACKENDS: &[&str] = &["memory", "seqfile", "sqlite"];

pub fn create(backend: &str, path: PathBuf) -> BenchResult<Box<dyn StorageCut>> {
    match backend {
        "memory" => Ok(Box::new(memory::MemoryCut::new())),
        "seqfile" => Ok(Box::new(seqfile::SeqFileCut::new(path))),
        "sqlite" => Ok(Box::new(sqlite::SqliteCut::new(path))),
        other => Err(BenchError::InvalidParameter(format!(
            "unknown backend: {other} (expected one of {})",
            BACKENDS.join(", ")
        ))),
    }
}
