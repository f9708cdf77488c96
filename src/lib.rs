pub mod analysis;
pub mod client;
pub mod config;
pub mod error;
pub mod issuer;
pub mod runner;
pub mod sample;
pub mod sweep;
pub mod timer;
pub mod writer;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use crate::error::*;
    pub use tracing::{debug, error, info, span, trace, warn};
}

pub use config::{CacheMode, HarnessConfig, RunConfiguration, TargetConfig};
pub use issuer::{HttpIssuer, OrderPayload, RequestIssuer};
pub use runner::RunCoordinator;
pub use sample::{ClientResult, LatencySample, MergedRunResult, RequestType};
pub use sweep::{CellOutcome, SweepCell, SweepReport, run_sweep};
pub use writer::ResultWriter;
