use std::path::Path;

use crate::config::SweepConfig;
use crate::prelude::*;
use crate::sample::RequestType;
use crate::sweep::SweepCell;
use crate::writer::ResultRow;

/// Per-type sample counts and mean latency in milliseconds for one result file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub get_count: usize,
    pub post_count: usize,
    pub get_mean_ms: Option<f64>,
    pub post_mean_ms: Option<f64>,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    total_seconds: f64,
}

impl Accumulator {
    fn add(&mut self, seconds: f64) {
        self.count += 1;
        self.total_seconds += seconds;
    }

    fn mean_ms(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total_seconds / self.count as f64 * 1000.0)
    }
}

/// Reads a result file. A missing file means the cell has no data.
pub fn read_result_file(path: impl AsRef<Path>) -> Result<Option<RunSummary>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut gets = Accumulator::default();
    let mut posts = Accumulator::default();
    for row in reader.deserialize() {
        let row: ResultRow = row?;
        match row.request_type {
            RequestType::Get => gets.add(row.latency),
            RequestType::Post => posts.add(row.latency),
        }
    }

    Ok(Some(RunSummary {
        get_count: gets.count,
        post_count: posts.count,
        get_mean_ms: gets.mean_ms(),
        post_mean_ms: posts.mean_ms(),
    }))
}

/// Summaries for every cell of the sweep, in sweep order.
pub fn summarize_sweep(
    output_dir: impl AsRef<Path>,
    sweep: &SweepConfig,
) -> Result<Vec<(SweepCell, Option<RunSummary>)>> {
    let output_dir = output_dir.as_ref();
    sweep
        .cells()
        .into_iter()
        .map(|cell| {
            let summary = read_result_file(output_dir.join(cell.file_name()))?;
            Ok((cell, summary))
        })
        .collect()
}
