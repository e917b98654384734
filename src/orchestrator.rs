//! The fetch orchestrator.
//!
//! [`FetchOrchestrator::acquire`] validates a query, then walks the strategy
//! chain in order. Each strategy gets its own attempts with a per-attempt
//! timeout and linear backoff between attempts. The first success is
//! normalized and returned. When every strategy is exhausted the fallback
//! generator supplies substitute records and the outcome is tagged
//! `Degraded`.
//!
//! All retry state is local to one `acquire` call, so concurrent calls on
//! the same orchestrator never influence each other.

use std::sync::Arc;

use tokio::time::{sleep, timeout};

use crate::data_sources::enrichment;
use crate::error::{ApiError, FetchError, TransportError};
use crate::events::{AcquisitionEvent, EventSink, TracingSink};
use crate::fallback;
use crate::model::{FetchOutcome, QueryParameters, TrainingReport};
use crate::normalize::{Normalized, UpstreamPayload, normalize};
use crate::strategy::{EndpointStrategy, StrategyChain, StrategyKind};
use crate::transport::{HttpTransport, PreparedRequest, Transport, TransportResponse};
use crate::validation::validate;

/// Drives the strategy chain for each acquisition.
#[derive(Clone)]
pub struct FetchOrchestrator<T: Transport = HttpTransport> {
    chain: Arc<StrategyChain>,
    transport: T,
    events: Arc<dyn EventSink>,
}

impl<T: Transport> FetchOrchestrator<T> {
    /// Create an orchestrator that reports through `tracing`.
    pub fn new(chain: StrategyChain, transport: T) -> Self {
        Self {
            chain: Arc::new(chain),
            transport,
            events: Arc::new(TracingSink),
        }
    }

    /// Report events to a different sink.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Turn a query into exactly one outcome.
    ///
    /// Invalid queries return `Failure` without touching the network.
    /// Every valid query returns `Success` or `Degraded`.
    pub async fn acquire(&self, params: &QueryParameters) -> FetchOutcome {
        let params = match validate(params.clone()) {
            Ok(params) => params,
            Err(error) => {
                self.events.emit(AcquisitionEvent::Rejected {
                    reason: error.to_string(),
                });
                return FetchOutcome::Failure {
                    error: error.into(),
                };
            }
        };

        let mut attempts = 0;
        let mut last_error = None;

        for strategy in self.chain.strategies() {
            match self.run_strategy(strategy, &params, &mut attempts).await {
                Ok(normalized) => {
                    return FetchOutcome::Success {
                        records: normalized.records,
                        source: normalized.source,
                        strategy: strategy.name.clone(),
                        backend_source: normalized.backend_source,
                    };
                }
                Err(error) => {
                    self.events.emit(AcquisitionEvent::StrategyExhausted {
                        strategy: strategy.name.clone(),
                        attempts: strategy.retry.max_attempts.max(1),
                    });
                    last_error = Some(error);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| {
            TransportError::Request("no strategy configured".to_string()).into()
        });
        let reason = FetchError::Exhausted {
            strategies: self.chain.len(),
            attempts,
            last: Box::new(last),
        };

        let records = fallback::generate(&params);
        self.events.emit(AcquisitionEvent::FellBack {
            region: params.region.clone(),
            records: records.len(),
            attempts,
            reason: reason.to_string(),
        });

        FetchOutcome::Degraded { records, reason }
    }

    /// Run every attempt of one strategy, returning its last error when none succeed.
    async fn run_strategy(
        &self,
        strategy: &EndpointStrategy,
        params: &QueryParameters,
        attempts: &mut u32,
    ) -> Result<Normalized, FetchError> {
        let request = strategy.request(params);
        let max_attempts = strategy.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            *attempts += 1;
            self.events.emit(AcquisitionEvent::AttemptStarted {
                strategy: strategy.name.clone(),
                kind: strategy.kind,
                attempt,
            });

            match self.attempt(strategy, &request).await {
                Ok(payload) => {
                    let normalized = normalize(payload);
                    self.events.emit(AcquisitionEvent::Succeeded {
                        strategy: strategy.name.clone(),
                        attempt,
                        records: normalized.records.len(),
                        source: normalized.source,
                    });
                    return Ok(normalized);
                }
                Err(error) => {
                    self.events.emit(AcquisitionEvent::AttemptFailed {
                        strategy: strategy.name.clone(),
                        attempt,
                        error: error.to_string(),
                        retryable: error.is_retryable(),
                    });

                    if attempt >= max_attempts || !error.is_retryable() {
                        return Err(error);
                    }

                    sleep(strategy.retry.backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        strategy: &EndpointStrategy,
        request: &PreparedRequest,
    ) -> Result<UpstreamPayload, FetchError> {
        let response = self.send_once(strategy, request).await?;
        Ok((strategy.parse)(&response.body)?)
    }

    /// One request under the strategy's timeout; non-2xx is an API error.
    async fn send_once(
        &self,
        strategy: &EndpointStrategy,
        request: &PreparedRequest,
    ) -> Result<TransportResponse, FetchError> {
        let limit = strategy.retry.timeout;
        let response = timeout(limit, self.transport.send(request))
            .await
            .map_err(|_| TransportError::Timeout { after: Some(limit) })??;

        if !response.is_success() {
            return Err(ApiError::HttpStatus {
                status: response.status,
            }
            .into());
        }

        Ok(response)
    }

    /// The enrichment backend strategy, if the chain has one.
    pub fn enrichment_strategy(&self) -> Option<&EndpointStrategy> {
        self.chain
            .strategies()
            .iter()
            .find(|s| s.kind == StrategyKind::Enrichment)
    }

    /// Probe the enrichment backend's health endpoint once.
    pub async fn probe_enrichment(&self) -> Result<(), FetchError> {
        let strategy = self
            .enrichment_strategy()
            .ok_or(FetchError::EnrichmentUnavailable)?;
        let request = enrichment::status_request(&strategy.base_url);
        self.send_once(strategy, &request).await.map(|_| ())
    }

    /// Ask the enrichment backend to retrain its model.
    pub async fn train_enrichment(&self) -> Result<TrainingReport, FetchError> {
        let strategy = self
            .enrichment_strategy()
            .ok_or(FetchError::EnrichmentUnavailable)?;
        let request = enrichment::train_request(&strategy.base_url);
        let response = self.send_once(strategy, &request).await?;
        Ok(enrichment::parse_training(&response.body)?)
    }
}
