use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RunConfiguration;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    Get,
    Post,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Get => write!(f, "GET"),
            RequestType::Post => write!(f, "POST"),
        }
    }
}

/// One successful round trip. Failed requests never produce a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    request_type: RequestType,
    elapsed: Duration,
}

impl LatencySample {
    pub fn new(request_type: RequestType, elapsed: Duration) -> Self {
        Self {
            request_type,
            elapsed,
        }
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Samples produced by a single client, in issuance order.
#[derive(Debug, Clone, Default)]
pub struct ClientResult {
    pub worker_id: u32,
    pub get_samples: Vec<LatencySample>,
    pub post_samples: Vec<LatencySample>,
    pub get_failures: u64,
    pub post_failures: u64,
}

impl ClientResult {
    pub fn new(worker_id: u32) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }

    pub fn record(&mut self, sample: LatencySample) {
        match sample.request_type() {
            RequestType::Get => self.get_samples.push(sample),
            RequestType::Post => self.post_samples.push(sample),
        }
    }

    pub fn record_failure(&mut self, request_type: RequestType) {
        match request_type {
            RequestType::Get => self.get_failures += 1,
            RequestType::Post => self.post_failures += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MergedRunResult {
    pub config: RunConfiguration,
    pub get_samples: Vec<LatencySample>,
    pub post_samples: Vec<LatencySample>,
    pub get_failures: u64,
    pub post_failures: u64,
}

impl MergedRunResult {
    /// Concatenates per-client results ordered by worker id.
    pub fn merge(config: RunConfiguration, mut results: Vec<ClientResult>) -> Self {
        results.sort_by_key(|r| r.worker_id);

        let mut merged = Self {
            config,
            get_samples: Vec::new(),
            post_samples: Vec::new(),
            get_failures: 0,
            post_failures: 0,
        };
        for result in results {
            merged.get_samples.extend(result.get_samples);
            merged.post_samples.extend(result.post_samples);
            merged.get_failures += result.get_failures;
            merged.post_failures += result.post_failures;
        }
        merged
    }

    /// GET rows first, then POST rows.
    pub fn rows(&self) -> impl Iterator<Item = &LatencySample> {
        self.get_samples.iter().chain(self.post_samples.iter())
    }
}
