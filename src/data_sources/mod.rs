//! Request and response shapes of the external services.
//!
//! # Data Sources
//!
//! - [`wris`]: the public groundwater level dataset, called directly or through a relay
//! - [`enrichment`]: the prediction backend that fetches and augments records
//!
//! Neither module performs I/O. They build [`PreparedRequest`](crate::transport::PreparedRequest)s
//! and parse response bodies; the orchestrator owns sending, retrying and timing.

pub mod enrichment;
pub mod wris;

pub use enrichment::{EnrichmentResponse, Predictions};
pub use wris::WrisResponse;
