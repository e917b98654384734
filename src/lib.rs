//! Aquifer - Resilient acquisition of groundwater-monitoring station readings.
//!
//! # Overview
//!
//! Aquifer turns a query (region, date range, paging) into a normalized,
//! summarized set of station readings. The public hydrology API it reads
//! from is slow and unreliable, so every fetch walks an ordered chain of
//! strategies: a direct call, zero or more relays, and an optional
//! enrichment backend that also attaches predicted levels. Each strategy is
//! retried with linear backoff under a per-attempt timeout. When all of them
//! fail, deterministic substitute data is served and the outcome is flagged
//! as degraded, so a consumer always has something to show.
//!
//! # Modules
//!
//! - [`model`]: Query, record, outcome and statistics types
//! - [`error`]: Error taxonomy
//! - [`validation`]: Query validation
//! - [`data_sources`]: Upstream and enrichment backend wire formats
//! - [`strategy`]: The strategy chain and retry policy
//! - [`transport`]: The network seam
//! - [`orchestrator`]: Runs the chain for one query
//! - [`normalize`]: Maps upstream payloads to canonical records
//! - [`fallback`]: Deterministic substitute data
//! - [`aggregation`]: Statistics over a record set
//! - [`events`]: Diagnostic event interface
//! - [`controller`]: Stateful façade with last-request-wins semantics
//! - [`config`]: Environment configuration
//! - [`api`]: HTTP API handlers

pub mod aggregation;
pub mod api;
pub mod config;
pub mod controller;
pub mod data_sources;
pub mod error;
pub mod events;
pub mod fallback;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod strategy;
pub mod transport;
pub mod validation;
