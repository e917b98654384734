//! The acquisition state controller.
//!
//! One controller owns the current query and the published snapshot for one
//! consumer. Snapshots are published on a `tokio::sync::watch` channel so
//! collaborators can either poll [`AcquisitionController::snapshot`] or
//! await changes from [`AcquisitionController::subscribe`].
//!
//! Every fetch takes a sequence number when it starts. Its result is applied
//! only if no later fetch, reset or dispose has happened in the meantime, so
//! the most recent request wins no matter which response arrives first.
//! Superseded requests still finish their round trip; they just have no
//! effect.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregation::summarize;
use crate::config::AcquisitionConfig;
use crate::error::FetchError;
use crate::model::{
    FetchOutcome, ParameterUpdate, QueryParameters, StationRecord, StationRef,
    StatisticsSummary, TrainingReport,
};
use crate::orchestrator::FetchOrchestrator;
use crate::strategy::StrategyChain;
use crate::transport::{HttpTransport, Transport};

/// Where the controller is in its request lifecycle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "outcome", rename_all = "lowercase")]
pub enum Phase {
    /// Nothing fetched yet, or reset since.
    Idle,
    /// A request is in flight; no records or statistics are shown.
    Loading,
    Ready(FetchOutcome),
}

/// Everything a consumer needs to render the current state.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionSnapshot {
    pub phase: Phase,
    pub params: QueryParameters,
    /// Sequence number of the most recent request.
    pub sequence: u64,
    /// Always computed from the records in `phase`.
    pub statistics: StatisticsSummary,
    pub disposed: bool,
}

impl AcquisitionSnapshot {
    fn new(params: QueryParameters) -> Self {
        Self {
            phase: Phase::Idle,
            params,
            sequence: 0,
            statistics: summarize(&[]),
            disposed: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn outcome(&self) -> Option<&FetchOutcome> {
        match &self.phase {
            Phase::Ready(outcome) => Some(outcome),
            Phase::Idle | Phase::Loading => None,
        }
    }

    /// Records of the last applied outcome; empty otherwise.
    pub fn records(&self) -> &[StationRecord] {
        self.outcome().map(FetchOutcome::records).unwrap_or_default()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.outcome().and_then(FetchOutcome::error)
    }

    pub fn is_degraded(&self) -> bool {
        self.outcome().is_some_and(FetchOutcome::is_degraded)
    }
}

/// What happened to the result of a [`AcquisitionController::fetch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// The result was published.
    Applied,
    /// A newer request, reset or dispose came first; the result was dropped.
    Superseded,
    /// The controller was already disposed; nothing was sent.
    Disposed,
}

/// Stateful façade over the orchestrator.
pub struct AcquisitionController<T: Transport = HttpTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T: Transport> {
    orchestrator: FetchOrchestrator<T>,
    state: watch::Sender<AcquisitionSnapshot>,
}

impl<T: Transport> Clone for AcquisitionController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl AcquisitionController<HttpTransport> {
    /// Build the strategy chain and HTTP transport described by `config`.
    pub fn from_config(config: &AcquisitionConfig) -> Self {
        let chain = StrategyChain::from_config(config);
        let orchestrator = FetchOrchestrator::new(chain, HttpTransport::new());
        let params = QueryParameters {
            agency: config.default_agency.clone(),
            ..QueryParameters::default()
        };
        Self::new(orchestrator, params)
    }
}

impl<T: Transport> AcquisitionController<T> {
    pub fn new(orchestrator: FetchOrchestrator<T>, params: QueryParameters) -> Self {
        let (state, _) = watch::channel(AcquisitionSnapshot::new(params));
        Self {
            inner: Arc::new(Inner {
                orchestrator,
                state,
            }),
        }
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator<T> {
        &self.inner.orchestrator
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> AcquisitionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<AcquisitionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn parameters(&self) -> QueryParameters {
        self.inner.state.borrow().params.clone()
    }

    pub fn statistics(&self) -> StatisticsSummary {
        self.inner.state.borrow().statistics.clone()
    }

    /// Merge a partial update into the current query. Does not fetch.
    pub fn update_parameters(&self, update: ParameterUpdate) {
        self.inner.state.send_if_modified(|state| {
            if state.disposed {
                return false;
            }
            state.params.merge(update);
            true
        });
    }

    /// Fetch with the current query and publish the result unless superseded.
    pub async fn fetch(&self) -> FetchStatus {
        let mut ticket = None;
        self.inner.state.send_if_modified(|state| {
            if state.disposed {
                return false;
            }
            state.sequence += 1;
            state.phase = Phase::Loading;
            state.statistics = summarize(&[]);
            ticket = Some((state.sequence, state.params.clone()));
            true
        });

        let Some((sequence, params)) = ticket else {
            debug!("Fetch ignored on disposed controller");
            return FetchStatus::Disposed;
        };

        let outcome = self.inner.orchestrator.acquire(&params).await;
        let records = outcome.records().len();
        let degraded = outcome.is_degraded();

        let applied = self.inner.state.send_if_modified(move |state| {
            if state.disposed || state.sequence != sequence {
                return false;
            }
            state.statistics = summarize(outcome.records());
            state.phase = Phase::Ready(outcome);
            true
        });

        if applied {
            info!(sequence, records, degraded, region = %params.region, "Snapshot published");
            FetchStatus::Applied
        } else {
            debug!(sequence, "Stale result discarded");
            FetchStatus::Superseded
        }
    }

    /// Return to `Idle`, dropping records, statistics and errors.
    ///
    /// The query is kept. Any request in flight is superseded.
    pub fn reset(&self) {
        self.inner.state.send_if_modified(|state| {
            if state.disposed {
                return false;
            }
            state.sequence += 1;
            state.phase = Phase::Idle;
            state.statistics = summarize(&[]);
            true
        });
    }

    /// Dismiss a failed fetch, going back to `Idle`.
    pub fn clear_error(&self) {
        self.inner.state.send_if_modified(|state| {
            if !matches!(state.phase, Phase::Ready(FetchOutcome::Failure { .. })) {
                return false;
            }
            state.phase = Phase::Idle;
            state.statistics = summarize(&[]);
            true
        });
    }

    /// Tear the controller down. Later fetches and completions are no-ops.
    pub fn dispose(&self) {
        self.inner.state.send_modify(|state| {
            state.sequence += 1;
            state.disposed = true;
        });
    }

    /// Whether the enrichment backend answers its health probe.
    pub async fn test_connection(&self) -> bool {
        match self.inner.orchestrator.probe_enrichment().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Enrichment backend unreachable");
                false
            }
        }
    }

    /// Trigger model training on the enrichment backend.
    pub async fn train_model(&self) -> Result<TrainingReport, FetchError> {
        let report = self.inner.orchestrator.train_enrichment().await;
        match &report {
            Ok(report) => info!(status = %report.status, "Model training triggered"),
            Err(e) => warn!(error = %e, "Model training failed"),
        }
        report
    }

    /// Current records for one station.
    pub fn filter_by_station(&self, station_code: &str) -> Vec<StationRecord> {
        self.inner
            .state
            .borrow()
            .records()
            .iter()
            .filter(|r| r.station_code == station_code)
            .cloned()
            .collect()
    }

    /// Distinct stations in the current records, in first-seen order.
    pub fn stations(&self) -> Vec<StationRef> {
        let state = self.inner.state.borrow();
        let mut seen = HashSet::new();
        state
            .records()
            .iter()
            .filter(|r| seen.insert(r.station_code.as_str()))
            .map(|r| StationRef {
                code: r.station_code.clone(),
                name: r.station_name.clone(),
            })
            .collect()
    }

    /// Current records that carry a prediction.
    pub fn records_with_predictions(&self) -> Vec<StationRecord> {
        self.inner
            .state
            .borrow()
            .records()
            .iter()
            .filter(|r| r.is_enriched())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::DataSource;
    use crate::strategy::{EndpointStrategy, RetryPolicy};
    use crate::transport::testing::{Reply, ScriptedTransport, record_json, wris_body};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    /// Answers each state with its own station after a state-specific delay.
    fn by_region() -> ScriptedTransport {
        ScriptedTransport::new(|request, _| {
            if request.url.contains("stateName=Kerala") {
                Reply::ok(wris_body(serde_json::json!([record_json("KL1", -2.0, "2024-01-02")])))
                    .after(Duration::from_millis(150))
            } else if request.url.contains("stateName=Odisha") {
                Reply::ok(wris_body(serde_json::json!([
                    record_json("OD1", -5.0, "2024-01-02"),
                    record_json("OD2", -7.0, "2024-01-05"),
                    record_json("OD1", -6.0, "2024-01-03"),
                ])))
                .after(Duration::from_millis(10))
            } else {
                Reply::refused()
            }
        })
    }

    fn controller(transport: &ScriptedTransport, region: &str) -> AcquisitionController<ScriptedTransport> {
        let chain = StrategyChain::new(vec![EndpointStrategy::direct("http://upstream.test", fast())]);
        let orchestrator = FetchOrchestrator::new(chain, transport.clone());
        AcquisitionController::new(
            orchestrator,
            QueryParameters::new(region, "2024-01-01", "2024-01-31"),
        )
    }

    fn region(name: &str) -> ParameterUpdate {
        ParameterUpdate {
            region: Some(name.to_string()),
            ..ParameterUpdate::default()
        }
    }

    #[test]
    fn test_starts_idle() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");
        let snapshot = controller.snapshot();

        assert!(matches!(snapshot.phase, Phase::Idle));
        assert_eq!(snapshot.sequence, 0);
        assert_eq!(snapshot.statistics.total_records, 0);
    }

    #[tokio::test]
    async fn test_fetch_publishes_records_and_statistics() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");

        assert_eq!(controller.fetch().await, FetchStatus::Applied);

        let snapshot = controller.snapshot();
        assert!(matches!(
            snapshot.outcome(),
            Some(FetchOutcome::Success {
                source: DataSource::Live,
                ..
            })
        ));
        assert_eq!(snapshot.statistics, summarize(snapshot.records()));
        assert_eq!(snapshot.statistics.unique_stations, 2);
    }

    #[tokio::test]
    async fn test_update_parameters_does_not_fetch() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");

        controller.update_parameters(ParameterUpdate {
            sub_region: Some(Some("Puri".to_string())),
            ..ParameterUpdate::default()
        });

        assert_eq!(controller.parameters().sub_region.as_deref(), Some("Puri"));
        assert_eq!(controller.parameters().region, "Odisha");
        assert_eq!(transport.call_count(), 0);
        assert!(matches!(controller.snapshot().phase, Phase::Idle));
    }

    #[tokio::test]
    async fn test_second_fetch_wins_when_first_answers_last() {
        let transport = by_region();
        let controller = controller(&transport, "Kerala");

        let (first, second) = tokio::join!(controller.fetch(), async {
            controller.update_parameters(region("Odisha"));
            controller.fetch().await
        });

        assert_eq!(first, FetchStatus::Superseded);
        assert_eq!(second, FetchStatus::Applied);
        let snapshot = controller.snapshot();
        assert!(snapshot.records().iter().all(|r| r.station_code.starts_with("OD")));
        assert_eq!(snapshot.sequence, 2);
    }

    #[tokio::test]
    async fn test_second_fetch_wins_when_first_answers_first() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");

        let (first, second) = tokio::join!(controller.fetch(), async {
            controller.update_parameters(region("Kerala"));
            controller.fetch().await
        });

        assert_eq!(first, FetchStatus::Superseded);
        assert_eq!(second, FetchStatus::Applied);
        let records = controller.snapshot().records().to_vec();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].station_code, "KL1");
    }

    #[tokio::test]
    async fn test_statistics_match_records_while_loading() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");
        controller.fetch().await;
        assert_eq!(controller.statistics().total_records, 3);

        controller.update_parameters(region("Kerala"));
        let (status, _) = tokio::join!(controller.fetch(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let snapshot = controller.snapshot();
            assert!(snapshot.is_loading());
            assert_eq!(snapshot.statistics, summarize(snapshot.records()));
            assert!(controller.stations().is_empty());
            assert_eq!(controller.statistics().total_records, 0);
        });

        assert_eq!(status, FetchStatus::Applied);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.statistics, summarize(snapshot.records()));
        assert_eq!(snapshot.statistics.total_records, 1);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_result() {
        let transport = by_region();
        let controller = controller(&transport, "Kerala");

        let (status, _) = tokio::join!(controller.fetch(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert!(controller.snapshot().is_loading());
            controller.reset();
        });

        assert_eq!(status, FetchStatus::Superseded);
        let snapshot = controller.snapshot();
        assert!(matches!(snapshot.phase, Phase::Idle));
        assert!(snapshot.records().is_empty());
        assert_eq!(snapshot.params.region, "Kerala");
    }

    #[tokio::test]
    async fn test_invalid_query_is_failure_and_clearable() {
        let transport = by_region();
        let controller = controller(&transport, "");

        controller.fetch().await;
        assert!(matches!(
            controller.snapshot().error(),
            Some(FetchError::Validation(_))
        ));

        controller.clear_error();
        assert!(matches!(controller.snapshot().phase, Phase::Idle));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_error_keeps_degraded_data() {
        let transport = by_region();
        let controller = controller(&transport, "Goa");

        controller.fetch().await;
        controller.clear_error();

        let snapshot = controller.snapshot();
        assert!(snapshot.is_degraded());
        assert!(!snapshot.records().is_empty());
        assert_eq!(snapshot.statistics.total_records, snapshot.records().len());
    }

    #[tokio::test]
    async fn test_dispose_turns_fetch_into_noop() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");

        controller.dispose();

        assert_eq!(controller.fetch().await, FetchStatus::Disposed);
        assert_eq!(transport.call_count(), 0);
        assert!(controller.snapshot().disposed);
    }

    #[tokio::test]
    async fn test_subscribers_see_published_snapshots() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");
        let mut receiver = controller.subscribe();

        controller.fetch().await;

        assert!(receiver.has_changed().unwrap());
        let snapshot = receiver.borrow_and_update().clone();
        assert_eq!(snapshot.statistics.total_records, 3);
    }

    #[tokio::test]
    async fn test_station_views() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");
        controller.fetch().await;

        let stations = controller.stations();
        assert_eq!(
            stations.iter().map(|s| s.code.as_str()).collect::<Vec<_>>(),
            vec!["OD1", "OD2"]
        );
        assert_eq!(stations[0].name, "Station OD1");
        assert_eq!(controller.filter_by_station("OD1").len(), 2);
        assert!(controller.filter_by_station("XX").is_empty());
        assert!(controller.records_with_predictions().is_empty());
    }

    #[tokio::test]
    async fn test_connection_without_backend_is_false() {
        let transport = by_region();
        let controller = controller(&transport, "Odisha");

        assert!(!controller.test_connection().await);
        assert_eq!(
            controller.train_model().await,
            Err(FetchError::EnrichmentUnavailable)
        );
        assert!(matches!(controller.snapshot().phase, Phase::Idle));
    }
}
