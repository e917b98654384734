use std::env;
use std::time::Duration;

use crate::data_sources::wris::WRIS_API_BASE;
use crate::model::DEFAULT_AGENCY;
use crate::strategy::RetryPolicy;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    // Upstream
    pub upstream_url: String,
    pub relays: Vec<String>,
    pub enrichment_url: Option<String>,

    // Retry settings, applied to every strategy
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,

    // Query defaults
    pub default_agency: String,

    // API settings
    pub port: u16,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            upstream_url: WRIS_API_BASE.to_string(),
            relays: Vec::new(),
            enrichment_url: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            default_agency: DEFAULT_AGENCY.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AcquisitionConfig {
    /// Load configuration from `AQUIFER_*` environment variables.
    ///
    /// Nothing is required. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            upstream_url: lookup("AQUIFER_UPSTREAM_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
            relays: lookup("AQUIFER_RELAYS")
                .map(|list| split_list(&list))
                .unwrap_or_default(),
            enrichment_url: lookup("AQUIFER_ENRICHMENT_URL")
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),

            max_attempts: lookup("AQUIFER_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_attempts),
            retry_delay: lookup("AQUIFER_RETRY_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            request_timeout: lookup("AQUIFER_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),

            default_agency: lookup("AQUIFER_DEFAULT_AGENCY")
                .filter(|agency| !agency.trim().is_empty())
                .unwrap_or(defaults.default_agency),

            port: lookup("AQUIFER_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// The policy every strategy built from this config uses.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_delay,
            timeout: self.request_timeout,
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
