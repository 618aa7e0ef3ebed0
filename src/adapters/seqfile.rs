//! Append-only flat-file backend.
//!
//! The artifact is a single file of 8-byte little-endian records; logical
//! position `i` lives at byte offset `(i - 1) * 8`. Appends are written one
//! record at a time, unbuffered, so the measurement reflects per-item write
//! cost rather than batching.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::{value_for, value_to_u64, BenchError, BenchResult, GetSample, StorageCut};

pub struct SeqFileCut {
    path: PathBuf,
    file: Option<File>,
}

impl SeqFileCut {
    pub fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    fn file_mut(&mut self) -> BenchResult<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| BenchError::Storage("seqfile: not open".into()))
    }
}

impl StorageCut for SeqFileCut {
    fn name(&self) -> &str {
        "seqfile"
    }

    fn open(&mut self) -> BenchResult<()> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        Ok(())
    }

    fn close(&mut self) -> BenchResult<()> {
        self.file = None;
        Ok(())
    }

    fn measure_append(&mut self, target: u64) -> BenchResult<(Duration, u64)> {
        let file = self.file_mut()?;
        let current = file.metadata()?.len() / 8;
        file.seek(SeekFrom::End(0))?;

        let t0 = Instant::now();
        for i in current + 1..=target {
            file.write_all(&value_for(i))?;
        }
        file.flush()?;
        let elapsed = t0.elapsed();

        Ok((elapsed, file.metadata()?.len()))
    }

    fn measure_gets(&mut self, keys: &[u64]) -> BenchResult<HashMap<u64, GetSample>> {
        let file = self.file_mut()?;
        let size = file.metadata()?.len() / 8;
        let mut out = HashMap::with_capacity(keys.len());
        let mut buf = [0u8; 8];
        for &key in keys {
            if key == 0 || key > size {
                return Err(BenchError::Storage(format!(
                    "seqfile: position {key} out of range (size {size})"
                )));
            }
            let t = Instant::now();
            file.seek(SeekFrom::Start((key - 1) * 8))?;
            file.read_exact(&mut buf)?;
            let elapsed = t.elapsed();
            out.insert(
                key,
                GetSample {
                    elapsed,
                    value: value_to_u64(&buf)?,
                },
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitmix64;

    #[test]
    fn test_append_and_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cut = SeqFileCut::new(tmp.path().join("seq.db"));
        cut.open().unwrap();
        let (_, space) = cut.measure_append(64).unwrap();
        assert_eq!(space, 64 * 8);

        let samples = cut.measure_gets(&[1, 32, 64]).unwrap();
        for key in [1u64, 32, 64] {
            assert_eq!(samples[&key].value, splitmix64(key));
        }
    }

    #[test]
    fn test_growth_resumes_from_current_size() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cut = SeqFileCut::new(tmp.path().join("seq.db"));
        cut.open().unwrap();
        cut.measure_append(10).unwrap();
        let (_, space) = cut.measure_append(20).unwrap();
        assert_eq!(space, 160);
        assert_eq!(cut.measure_gets(&[15]).unwrap()[&15].value, splitmix64(15));
    }

    #[test]
    fn test_reopen_sees_persisted_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seq.db");
        let mut cut = SeqFileCut::new(path.clone());
        cut.open().unwrap();
        cut.measure_append(8).unwrap();
        cut.close().unwrap();

        let mut cut = SeqFileCut::new(path);
        cut.open().unwrap();
        assert_eq!(cut.measure_gets(&[8]).unwrap()[&8].value, splitmix64(8));
    }

    #[test]
    fn test_get_requires_open() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cut = SeqFileCut::new(tmp.path().join("seq.db"));
        assert!(cut.measure_gets(&[1]).is_err());
    }
}
