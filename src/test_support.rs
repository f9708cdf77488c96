use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{CacheMode, TargetConfig};
use crate::error::RequestFailure;
use crate::issuer::{IssueResult, OrderPayload, RequestIssuer};
use crate::sample::RequestType;

/// Answers every request instantly with a fixed latency.
#[derive(Default)]
pub struct FixedLatencyIssuer {
    pub latency: Duration,
    pub fail_gets: bool,
    pub fail_posts: bool,
    pub gets: AtomicU64,
    pub posts: AtomicU64,
}

impl FixedLatencyIssuer {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_gets: true,
            fail_posts: true,
            ..Default::default()
        }
    }

    pub fn get_calls(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> u64 {
        self.posts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestIssuer for FixedLatencyIssuer {
    async fn issue_get(&self, _target: &TargetConfig, _cache_mode: CacheMode) -> IssueResult {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets {
            return Err(RequestFailure::new(RequestType::Get, "connection refused"));
        }
        Ok(self.latency)
    }

    async fn issue_post(
        &self,
        _target: &TargetConfig,
        _payload: &OrderPayload,
        _cache_mode: CacheMode,
    ) -> IssueResult {
        self.posts.fetch_add(1, Ordering::SeqCst);
        if self.fail_posts {
            return Err(RequestFailure::new(RequestType::Post, "connection refused"));
        }
        Ok(self.latency)
    }
}
