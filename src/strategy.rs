//! The ordered chain of transport strategies.
//!
//! A strategy is plain data: where to send the request, how to build it,
//! how to parse what comes back, and how often to retry. There is one type
//! for every kind of endpoint; the differences live in the function pointers
//! and the retry policy, so the orchestrator has a single control flow.

use std::time::Duration;

use serde::Serialize;

use crate::config::AcquisitionConfig;
use crate::data_sources::{enrichment, wris};
use crate::error::ApiError;
use crate::model::QueryParameters;
use crate::normalize::UpstreamPayload;
use crate::transport::PreparedRequest;

/// Builds the request for a strategy from its addresses and the query.
pub type BuildFn = fn(&EndpointStrategy, &QueryParameters) -> PreparedRequest;

/// Parses a successful HTTP body into an upstream payload.
pub type ParseFn = fn(&str) -> Result<UpstreamPayload, ApiError>;

/// What kind of endpoint a strategy talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Direct,
    Relay,
    Enrichment,
}

/// How many attempts a strategy gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Linear backoff base: the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
    /// Applied to every attempt separately.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// One entry of the chain.
#[derive(Debug, Clone)]
pub struct EndpointStrategy {
    pub name: String,
    pub kind: StrategyKind,
    /// Address of the service answering the request.
    pub base_url: String,
    /// Relay address the request is routed through, if any.
    pub relay_prefix: Option<String>,
    pub build: BuildFn,
    pub parse: ParseFn,
    pub retry: RetryPolicy,
}

impl EndpointStrategy {
    /// Call the dataset endpoint directly.
    pub fn direct(base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            name: "direct".to_string(),
            kind: StrategyKind::Direct,
            base_url: base_url.to_string(),
            relay_prefix: None,
            build: build_direct,
            parse: parse_direct,
            retry,
        }
    }

    /// Call the dataset endpoint through a relay prefix.
    pub fn relay(prefix: &str, upstream_url: &str, retry: RetryPolicy) -> Self {
        Self {
            name: format!("relay:{}", prefix),
            kind: StrategyKind::Relay,
            base_url: upstream_url.to_string(),
            relay_prefix: Some(prefix.to_string()),
            build: build_relay,
            parse: parse_direct,
            retry,
        }
    }

    /// Fetch and enrich through the prediction backend.
    pub fn enrichment(base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            name: "enrichment".to_string(),
            kind: StrategyKind::Enrichment,
            base_url: base_url.to_string(),
            relay_prefix: None,
            build: build_enrichment,
            parse: parse_enrichment,
            retry,
        }
    }

    /// Override the policy (tests and per-deployment tuning).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn request(&self, params: &QueryParameters) -> PreparedRequest {
        (self.build)(self, params)
    }
}

fn build_direct(strategy: &EndpointStrategy, params: &QueryParameters) -> PreparedRequest {
    wris::direct_request(&strategy.base_url, params)
}

/// The query string goes on the upstream URL before the relay wraps it.
fn build_relay(strategy: &EndpointStrategy, params: &QueryParameters) -> PreparedRequest {
    let target = wris::target_url(&strategy.base_url, params);
    match &strategy.relay_prefix {
        Some(prefix) => PreparedRequest::post(wris::relay_url(prefix, &target)),
        None => PreparedRequest::post(target),
    }
}

fn build_enrichment(strategy: &EndpointStrategy, params: &QueryParameters) -> PreparedRequest {
    enrichment::fetch_request(&strategy.base_url, params)
}

fn parse_direct(body: &str) -> Result<UpstreamPayload, ApiError> {
    wris::parse_response(body).map(UpstreamPayload::Direct)
}

fn parse_enrichment(body: &str) -> Result<UpstreamPayload, ApiError> {
    enrichment::parse_response(body).map(UpstreamPayload::Enrichment)
}

/// Strategies in priority order.
#[derive(Debug, Clone, Default)]
pub struct StrategyChain {
    strategies: Vec<EndpointStrategy>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<EndpointStrategy>) -> Self {
        Self { strategies }
    }

    /// Direct call first, then each configured relay, then the enrichment
    /// backend when one is configured.
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        let retry = config.retry_policy();
        let mut strategies = vec![EndpointStrategy::direct(&config.upstream_url, retry)];

        strategies.extend(
            config
                .relays
                .iter()
                .map(|prefix| EndpointStrategy::relay(prefix, &config.upstream_url, retry)),
        );

        if let Some(url) = &config.enrichment_url {
            strategies.push(EndpointStrategy::enrichment(url, retry));
        }

        Self { strategies }
    }

    pub fn push(mut self, strategy: EndpointStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> &[EndpointStrategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Upper bound on attempts for one acquisition.
    pub fn total_attempts(&self) -> u32 {
        self.strategies.iter().map(|s| s.retry.max_attempts).sum()
    }
}
