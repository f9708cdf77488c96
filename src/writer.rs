use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::{CacheMode, RunConfiguration};
use crate::prelude::*;
use crate::sample::{LatencySample, MergedRunResult, RequestType};

pub const HEADER: [&str; 2] = ["type", "latency"];

/// One data row of a result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    /// Seconds.
    pub latency: f64,
}

impl From<&LatencySample> for ResultRow {
    fn from(sample: &LatencySample) -> Self {
        Self {
            request_type: sample.request_type(),
            latency: sample.elapsed_seconds(),
        }
    }
}

pub fn result_file_name(cache_mode: CacheMode, probability: u8) -> String {
    format!("latency_{}_p{}.csv", cache_mode.label(), probability)
}

#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, config: &RunConfiguration) -> PathBuf {
        self.output_dir.join(result_file_name(
            config.cache_mode(),
            config.post_probability_percent(),
        ))
    }

    /// Replaces the cell's result file. Rows go to a temporary file in the
    /// same directory which is renamed into place once complete, so readers
    /// see either the previous file, the new one, or none.
    pub fn write(&self, result: &MergedRunResult) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(&result.config);

        let mut file = NamedTempFile::new_in(&self.output_dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut file);
            writer.write_record(HEADER)?;
            for sample in result.rows() {
                writer.serialize(ResultRow::from(sample))?;
            }
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&path)?;

        debug!(
            "Wrote {} rows to {}",
            result.get_samples.len() + result.post_samples.len(),
            path.display()
        );
        Ok(path)
    }
}
