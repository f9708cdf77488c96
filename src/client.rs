use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{RunConfiguration, TargetConfig};
use crate::issuer::{IssueResult, OrderPayload, RequestIssuer};
use crate::prelude::*;
use crate::sample::{ClientResult, LatencySample, RequestType};

/// Per-client random source for the POST decision.
pub fn client_rng(seed: Option<u64>, worker_id: u32) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
        None => StdRng::from_entropy(),
    }
}

fn absorb(result: &mut ClientResult, request_type: RequestType, outcome: IssueResult) {
    match outcome {
        Ok(elapsed) => result.record(LatencySample::new(request_type, elapsed)),
        Err(failure) => {
            warn!("Client {} {}", result.worker_id, failure);
            result.record_failure(request_type);
        }
    }
}

/// Simulates one user session: a fixed number of catalog reads, each
/// followed by an independent roll for an order write.
pub async fn run_client(
    worker_id: u32,
    config: RunConfiguration,
    target: &TargetConfig,
    issuer: &dyn RequestIssuer,
    mut rng: StdRng,
) -> ClientResult {
    let cache_mode = config.cache_mode();
    let post_probability = config.post_probability();
    let payload = OrderPayload::from(target);
    let mut result = ClientResult::new(worker_id);

    for _ in 0..config.requests_per_worker() {
        let outcome = issuer.issue_get(target, cache_mode).await;
        absorb(&mut result, RequestType::Get, outcome);

        // Rolled regardless of how the GET went.
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < post_probability {
            let outcome = issuer.issue_post(target, &payload, cache_mode).await;
            absorb(&mut result, RequestType::Post, outcome);
        }
    }

    debug!(
        "Client {} finished: {} GET, {} POST, {} failed",
        worker_id,
        result.get_samples.len(),
        result.post_samples.len(),
        result.get_failures + result.post_failures
    );
    result
}
