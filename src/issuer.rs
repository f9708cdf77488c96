use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::config::{CacheMode, TargetConfig};
use crate::prelude::*;
use crate::sample::RequestType;
use crate::timer::measure;

pub type IssueResult = std::result::Result<Duration, RequestFailure>;

/// Body of the order-write request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    pub stock: String,
    pub qty: u32,
}

impl From<&TargetConfig> for OrderPayload {
    fn from(target: &TargetConfig) -> Self {
        Self {
            stock: target.stock.clone(),
            qty: target.order_qty,
        }
    }
}

/// Performs exactly one round trip per call and reports how long it took.
#[async_trait]
pub trait RequestIssuer: Send + Sync {
    async fn issue_get(&self, target: &TargetConfig, cache_mode: CacheMode) -> IssueResult;

    async fn issue_post(
        &self,
        target: &TargetConfig,
        payload: &OrderPayload,
        cache_mode: CacheMode,
    ) -> IssueResult;
}

pub struct HttpIssuer {
    client: Client,
}

impl HttpIssuer {
    pub fn new(target: &TargetConfig, workers: u32) -> Result<Self> {
        let mut builder = Client::builder()
            // One idle connection slot per simulated client
            .pool_max_idle_per_host(workers as usize)
            .tcp_nodelay(true)
            .no_proxy();
        if let Some(timeout) = target.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

fn apply_cache_mode(request: RequestBuilder, cache_mode: CacheMode) -> RequestBuilder {
    match cache_mode {
        CacheMode::Enabled => request,
        CacheMode::Disabled => request.header(CACHE_CONTROL, "no-cache"),
    }
}

// Status codes are not inspected; draining the body completes the round trip.
async fn round_trip(request: RequestBuilder) -> reqwest::Result<()> {
    let response = request.send().await?;
    response.bytes().await?;
    Ok(())
}

async fn timed(request_type: RequestType, request: RequestBuilder) -> IssueResult {
    let (outcome, elapsed) = measure(round_trip(request)).await;
    outcome
        .map(|_| elapsed)
        .map_err(|e| RequestFailure::new(request_type, e.to_string()))
}

#[async_trait]
impl RequestIssuer for HttpIssuer {
    async fn issue_get(&self, target: &TargetConfig, cache_mode: CacheMode) -> IssueResult {
        let request = self
            .client
            .get(target.catalog_url())
            .query(&[("stock", target.stock.as_str())]);
        timed(RequestType::Get, apply_cache_mode(request, cache_mode)).await
    }

    async fn issue_post(
        &self,
        target: &TargetConfig,
        payload: &OrderPayload,
        cache_mode: CacheMode,
    ) -> IssueResult {
        let request = self.client.post(target.order_url()).json(payload);
        timed(RequestType::Post, apply_cache_mode(request, cache_mode)).await
    }
}
