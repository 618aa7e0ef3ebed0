//! In-memory reference backend: a plain `Vec<u64>`.
//!
//! No persistence and no I/O, which makes it the floor against which the
//! on-disk backends are read.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{splitmix64, BenchError, BenchResult, GetSample, StorageCut};

#[derive(Debug, Default)]
pub struct MemoryCut {
    items: Vec<u64>,
}

impl MemoryCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageCut for MemoryCut {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self) -> BenchResult<()> {
        Ok(())
    }

    fn close(&mut self) -> BenchResult<()> {
        self.items.clear();
        Ok(())
    }

    fn measure_append(&mut self, target: u64) -> BenchResult<(Duration, u64)> {
        let t0 = Instant::now();
        while (self.items.len() as u64) < target {
            let i = self.items.len() as u64 + 1;
            self.items.push(splitmix64(i));
        }
        Ok((t0.elapsed(), self.items.len() as u64 * 8))
    }

    fn measure_gets(&mut self, keys: &[u64]) -> BenchResult<HashMap<u64, GetSample>> {
        let mut out = HashMap::with_capacity(keys.len());
        for &key in keys {
            if key == 0 || key > self.items.len() as u64 {
                return Err(BenchError::Storage(format!(
                    "memory: position {key} out of range (size {})",
                    self.items.len()
                )));
            }
            let t = Instant::now();
            let value = self.items[(key - 1) as usize];
            let elapsed = t.elapsed();
            out.insert(key, GetSample { elapsed, value });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get_roundtrip() {
        let mut cut = MemoryCut::new();
        cut.open().unwrap();
        let (_, space) = cut.measure_append(100).unwrap();
        assert_eq!(space, 800);

        let samples = cut.measure_gets(&[1, 50, 100]).unwrap();
        for key in [1u64, 50, 100] {
            assert_eq!(samples[&key].value, splitmix64(key));
        }
    }

    #[test]
    fn test_incremental_growth() {
        let mut cut = MemoryCut::new();
        cut.open().unwrap();
        cut.measure_append(10).unwrap();
        let (_, space) = cut.measure_append(20).unwrap();
        assert_eq!(space, 160);
        assert_eq!(cut.measure_gets(&[15]).unwrap()[&15].value, splitmix64(15));
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let mut cut = MemoryCut::new();
        cut.open().unwrap();
        cut.measure_append(5).unwrap();
        assert!(cut.measure_gets(&[6]).is_err());
        assert!(cut.measure_gets(&[0]).is_err());
    }

    #[test]
    fn test_close_resets_state() {
        let mut cut = MemoryCut::new();
        cut.open().unwrap();
        cut.measure_append(5).unwrap();
        cut.close().unwrap();
        cut.open().unwrap();
        let (_, space) = cut.measure_append(2).unwrap();
        assert_eq!(space, 16);
    }
}
