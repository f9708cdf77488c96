use std::io;

use thiserror::Error;

use crate::sample::RequestType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
    #[error("Configuration error: invalid value for {key}: {reason}")]
    EnvVarError { key: &'static str, reason: String },
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to persist result file: {0}")]
    PersistError(#[from] tempfile::PersistError),
    #[error("{0} sweep cell(s) could not be written")]
    IncompleteSweep(usize),
}

/// Transport-level failure of a single request. Absorbed by the client that
/// issued the request; it never aborts a run.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{request_type} request failed: {detail}")]
pub struct RequestFailure {
    pub request_type: RequestType,
    pub detail: String,
}

impl RequestFailure {
    pub fn new(request_type: RequestType, detail: impl Into<String>) -> Self {
        Self {
            request_type,
            detail: detail.into(),
        }
    }
}
