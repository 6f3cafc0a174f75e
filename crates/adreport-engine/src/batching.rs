//! Metric batching and retry around a provider client.
//!
//! Providers cap the number of metrics per request. Longer metric lists are
//! split into consecutive batches; the first batch defines row identity and
//! every later batch appends its values onto the matching base rows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use adreport_core::config::Config;
use adreport_core::error::ProviderError;
use adreport_core::provider::{DataQuery, DataRow, ProviderClient, ProviderResponse};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{debug, error, info, warn};

/// Split `metrics` into consecutive chunks of at most `cap` names.
pub fn split_batches(metrics: &[String], cap: usize) -> Vec<&[String]> {
    metrics.chunks(cap.max(1)).collect()
}

/// Append a later batch onto the base response.
///
/// Returns `false` (and leaves `base` untouched) when the batch disagrees with
/// the base on row count. Base rows the batch does not contain are padded
/// with absent values so every row stays aligned with `base.metrics`.
pub fn merge_batch(base: &mut ProviderResponse, batch: ProviderResponse) -> bool {
    if batch.rows.len() != base.rows.len() {
        return false;
    }
    let width = batch.metrics.len();
    let mut padded = 0usize;
    for (i, row) in base.rows.iter_mut().enumerate() {
        match matching_row(&batch.rows, i, row) {
            Some(extra) if extra.metrics.len() == width => {
                row.metrics.extend(extra.metrics.iter().copied());
            }
            _ => {
                row.metrics.extend(std::iter::repeat(None).take(width));
                padded += 1;
            }
        }
    }
    if padded > 0 {
        warn!(rows = padded, "Batch rows did not match base rows; values left absent");
    }
    base.metrics.extend(batch.metrics);
    true
}

fn matching_row<'a>(rows: &'a [DataRow], position: usize, base: &DataRow) -> Option<&'a DataRow> {
    match rows.get(position) {
        Some(row) if row.same_identity(base) => Some(row),
        _ => rows.iter().find(|row| row.same_identity(base)),
    }
}

/// Provider client facade that hides batching and timeout retries.
#[derive(Clone)]
pub struct BatchingClient {
    inner: Arc<dyn ProviderClient>,
    max_metrics_per_request: usize,
    max_retry_attempts: usize,
    retry_delay: Duration,
}

impl BatchingClient {
    pub fn new(inner: Arc<dyn ProviderClient>, config: &Config) -> Self {
        Self {
            inner,
            max_metrics_per_request: config.max_metrics_per_request.max(1),
            max_retry_attempts: config.max_retry_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    pub fn client(&self) -> &dyn ProviderClient {
        self.inner.as_ref()
    }

    /// Fetch `query`, batching metrics when there are more than the provider
    /// accepts per request.
    ///
    /// Fails only when the first (or only) request fails. A later batch that
    /// fails or disagrees with the base rows is dropped: its metrics are
    /// missing from the result's `metrics` list.
    pub async fn fetch(&self, query: &DataQuery) -> Result<ProviderResponse, ProviderError> {
        if query.metrics.len() <= self.max_metrics_per_request {
            return self.fetch_with_retry(query).await;
        }

        let batches = split_batches(&query.metrics, self.max_metrics_per_request);
        info!(
            metrics = query.metrics.len(),
            batches = batches.len(),
            "Splitting request into metric batches"
        );
        let Some((first, rest)) = batches.split_first() else {
            return self.fetch_with_retry(query).await;
        };

        let mut base = self
            .fetch_with_retry(&query.for_metrics(first))
            .await
            .map_err(|e| {
                error!(error = %e, "First metric batch failed");
                e
            })?;
        if base.is_empty() {
            return Ok(base);
        }

        for (i, batch) in rest.iter().enumerate() {
            let number = i + 2;
            debug!(batch = number, total = batches.len(), "Fetching metric batch");
            match self.fetch_with_retry(&query.for_metrics(batch)).await {
                Ok(response) => {
                    if !merge_batch(&mut base, response) {
                        warn!(
                            batch = number,
                            "Metric batch row count differs from base; batch dropped"
                        );
                    }
                }
                Err(e) => {
                    warn!(batch = number, error = %e, "Metric batch failed; batch dropped");
                }
            }
        }
        Ok(base)
    }

    /// One request, retried on timeout with a fixed delay.
    async fn fetch_with_retry(&self, query: &DataQuery) -> Result<ProviderResponse, ProviderError> {
        let attempts = AtomicUsize::new(0);
        let max_attempts = self.max_retry_attempts;
        let strategy = FixedInterval::new(self.retry_delay).take(max_attempts - 1);

        let result = RetryIf::start(
            strategy,
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                self.inner.fetch(query)
            },
            |e: &ProviderError| {
                if e.is_timeout() {
                    warn!(
                        attempt = attempts.load(Ordering::SeqCst),
                        max_attempts, "Provider request timed out"
                    );
                    true
                } else {
                    false
                }
            },
        )
        .await;

        match result {
            Ok(mut response) => {
                if response.metrics.is_empty() {
                    response.metrics = query.metrics.clone();
                }
                Ok(response)
            }
            Err(e) => {
                if e.is_timeout() {
                    error!(max_attempts, "Max timeout attempts reached");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adreport_core::provider::DimensionValue;

    fn row(id: &str, values: &[f64]) -> DataRow {
        DataRow::new(
            vec![DimensionValue::new(id, id.to_uppercase())],
            values.iter().copied().map(Some).collect(),
        )
    }

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn split_covers_all_metrics_in_order() {
        let metrics = names("m", 45);
        let batches = split_batches(&metrics, 20);
        assert_eq!(
            batches.iter().map(|b| b.len()).collect::<Vec<_>>(),
            vec![20, 20, 5]
        );
        assert_eq!(batches.concat(), metrics);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut base = ProviderResponse::new(names("a", 2), vec![row("x", &[1.0, 2.0])]);
        let batch = ProviderResponse::new(names("b", 1), vec![row("x", &[3.0])]);
        assert!(merge_batch(&mut base, batch));
        assert_eq!(base.metrics, vec!["a0", "a1", "b0"]);
        assert_eq!(base.rows[0].metrics, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn merge_rejects_row_count_mismatch() {
        let mut base = ProviderResponse::new(names("a", 1), vec![row("x", &[1.0]), row("y", &[2.0])]);
        let batch = ProviderResponse::new(names("b", 1), vec![row("x", &[3.0])]);
        assert!(!merge_batch(&mut base, batch));
        assert_eq!(base.metrics, vec!["a0"]);
        assert_eq!(base.rows[0].metrics.len(), 1);
    }

    #[test]
    fn merge_matches_reordered_rows_and_pads_unknown_ones() {
        let mut base = ProviderResponse::new(
            names("a", 1),
            vec![row("x", &[1.0]), row("y", &[2.0]), row("z", &[3.0])],
        );
        let batch = ProviderResponse::new(
            names("b", 1),
            vec![row("y", &[20.0]), row("x", &[10.0]), row("q", &[99.0])],
        );
        assert!(merge_batch(&mut base, batch));
        assert_eq!(base.rows[0].metrics, vec![Some(1.0), Some(10.0)]);
        assert_eq!(base.rows[1].metrics, vec![Some(2.0), Some(20.0)]);
        assert_eq!(base.rows[2].metrics, vec![Some(3.0), None]);
    }
}
