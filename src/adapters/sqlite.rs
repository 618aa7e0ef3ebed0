//! SQLite backend (via rusqlite).
//!
//! WAL mode with NORMAL synchronous, a WITHOUT ROWID key/value table and
//! prepared statements; appends run inside one transaction per growth step.

use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::{
    fs_footprint, value_for, value_to_u64, BenchError, BenchResult, GetSample, StorageCut,
};

pub struct SqliteCut {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteCut {
    pub fn new(path: PathBuf) -> Self {
        Self { path, conn: None }
    }

    fn conn_mut(&mut self) -> BenchResult<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| BenchError::Storage("sqlite: not open".into()))
    }

    /// Main file plus WAL/SHM companions.
    fn footprint(&self) -> u64 {
        let mut total = fs_footprint(&self.path);
        for suffix in ["-wal", "-shm"] {
            let mut name = self.path.as_os_str().to_os_string();
            name.push(suffix);
            total += fs_footprint(name.as_ref());
        }
        total
    }
}

fn db_err(op: &str, e: impl std::fmt::Display) -> BenchError {
    BenchError::Storage(format!("sqlite {op}: {e}"))
}

impl StorageCut for SqliteCut {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn open(&mut self) -> BenchResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = Connection::open(&self.path).map_err(|e| db_err("open", e))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             CREATE TABLE IF NOT EXISTS kv (
                 k INTEGER PRIMARY KEY,
                 v BLOB NOT NULL
             ) WITHOUT ROWID;",
        )
        .map_err(|e| db_err("init", e))?;
        self.conn = Some(conn);
        Ok(())
    }

    fn close(&mut self) -> BenchResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| db_err("close", e))?;
        }
        Ok(())
    }

    fn measure_append(&mut self, target: u64) -> BenchResult<(Duration, u64)> {
        let conn = self.conn_mut()?;
        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(k), 0) FROM kv", [], |row| row.get(0))
            .map_err(|e| db_err("size", e))?;

        let t0 = Instant::now();
        let tx = conn.transaction().map_err(|e| db_err("begin", e))?;
        {
            let mut stmt = tx
                .prepare_cached("INSERT OR REPLACE INTO kv (k, v) VALUES (?1, ?2)")
                .map_err(|e| db_err("prepare", e))?;
            for i in current as u64 + 1..=target {
                stmt.execute(params![i as i64, &value_for(i)[..]])
                    .map_err(|e| db_err("insert", e))?;
            }
        }
        tx.commit().map_err(|e| db_err("commit", e))?;
        let elapsed = t0.elapsed();

        Ok((elapsed, self.footprint()))
    }

    fn measure_gets(&mut self, keys: &[u64]) -> BenchResult<HashMap<u64, GetSample>> {
        let conn = self.conn_mut()?;
        let mut stmt = conn
            .prepare_cached("SELECT v FROM kv WHERE k = ?1")
            .map_err(|e| db_err("prepare", e))?;

        let mut out = HashMap::with_capacity(keys.len());
        for &key in keys {
            let t = Instant::now();
            let blob: Vec<u8> = stmt
                .query_row(params![key as i64], |row| row.get(0))
                .map_err(|e| db_err(&format!("get {key}"), e))?;
            let elapsed = t.elapsed();
            out.insert(
                key,
                GetSample {
                    elapsed,
                    value: value_to_u64(&blob)?,
                },
            );
        }
        Ok(out)
    }
}
