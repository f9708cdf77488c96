use std::sync::Arc;

use tokio::task::JoinSet;

use crate::client::{client_rng, run_client};
use crate::config::{RunConfiguration, TargetConfig};
use crate::issuer::RequestIssuer;
use crate::prelude::*;
use crate::sample::{ClientResult, MergedRunResult};

/// Runs all clients of one sweep cell and merges what they collected.
#[derive(Clone)]
pub struct RunCoordinator {
    target: Arc<TargetConfig>,
    issuer: Arc<dyn RequestIssuer>,
    seed: Option<u64>,
}

impl RunCoordinator {
    pub fn new(target: TargetConfig, issuer: Arc<dyn RequestIssuer>, seed: Option<u64>) -> Self {
        Self {
            target: Arc::new(target),
            issuer,
            seed,
        }
    }

    pub async fn run(&self, config: RunConfiguration) -> MergedRunResult {
        info!(
            "Running with {}% POST chance, cache = {}",
            config.post_probability_percent(),
            config.cache_mode().is_enabled()
        );

        let mut set = JoinSet::new();
        for worker_id in 0..config.workers() {
            let target = self.target.clone();
            let issuer = self.issuer.clone();
            let rng = client_rng(self.seed, worker_id);

            set.spawn(async move { run_client(worker_id, config, &target, issuer.as_ref(), rng).await });
        }

        // Each client result is moved out exactly once; merging happens after every join.
        let mut results: Vec<ClientResult> = Vec::with_capacity(config.workers() as usize);
        while let Some(res) = set.join_next().await {
            match res {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!("Client task failed: {}", e);
                }
            }
        }

        let merged = MergedRunResult::merge(config, results);
        info!(
            "Collected {} GET and {} POST samples ({} GET / {} POST failures) of {} iterations",
            merged.get_samples.len(),
            merged.post_samples.len(),
            merged.get_failures,
            merged.post_failures,
            config.total_iterations()
        );
        merged
    }
}
