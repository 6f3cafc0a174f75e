use std::time::Duration;

pub const DEFAULT_ATTRIBUTION: &str = "CROSS_DEVICE_LAST_SIGNIFICANT";

/// Engine limits and provider settings, loaded once per process.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Provider-side cap on metrics per request; longer lists are batched.
    pub max_metrics_per_request: usize,
    /// Total attempts for a request that keeps timing out (first try included).
    pub max_retry_attempts: usize,
    pub retry_delay_ms: u64,
    /// In-flight detail fetches per hierarchy fetch.
    pub detail_concurrency: usize,
    /// In-flight source generations per multi-provider run.
    pub source_concurrency: usize,
    pub attribution: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_metrics_per_request: 20,
            max_retry_attempts: 3,
            retry_delay_ms: 1000,
            detail_concurrency: 5,
            source_concurrency: 5,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> Result<usize, String> {
    let value: usize = lookup(name)
        .unwrap_or_else(|| default.to_string())
        .parse()
        .map_err(|e| format!("invalid {name}: {e}"))?;
    if value == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from `ADREPORT_*` values returned by `lookup`; missing values
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            max_metrics_per_request: positive(
                &lookup,
                "ADREPORT_MAX_METRICS_PER_REQUEST",
                defaults.max_metrics_per_request,
            )?,
            max_retry_attempts: positive(
                &lookup,
                "ADREPORT_MAX_RETRY_ATTEMPTS",
                defaults.max_retry_attempts,
            )?,
            retry_delay_ms: lookup("ADREPORT_RETRY_DELAY_MS")
                .unwrap_or_else(|| defaults.retry_delay_ms.to_string())
                .parse()
                .map_err(|e| format!("invalid ADREPORT_RETRY_DELAY_MS: {e}"))?,
            detail_concurrency: positive(
                &lookup,
                "ADREPORT_DETAIL_CONCURRENCY",
                defaults.detail_concurrency,
            )?,
            source_concurrency: positive(
                &lookup,
                "ADREPORT_SOURCE_CONCURRENCY",
                defaults.source_concurrency,
            )?,
            attribution: lookup("ADREPORT_ATTRIBUTION")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.attribution),
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
