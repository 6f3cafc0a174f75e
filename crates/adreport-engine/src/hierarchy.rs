//! Two-level (main + detail) report fetching.

use adreport_core::error::ProviderError;
use adreport_core::provider::{DataQuery, ProviderResponse};
use adreport_core::report::{Cell, DateRange};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::batching::BatchingClient;
use crate::layout::{MetricLookup, ReportLayout};

/// Label prefix of detail rows.
pub const DETAIL_INDENT: &str = "  ";

#[derive(Debug, Clone)]
pub struct HierarchyRequest {
    pub main_dimension: String,
    pub detail_dimension: Option<String>,
    pub metrics: Vec<String>,
    pub date_range: DateRange,
    pub main_filter: Option<String>,
    pub client_scope: Option<String>,
}

impl HierarchyRequest {
    fn main_query(&self) -> DataQuery {
        DataQuery::new(
            vec![self.main_dimension.clone()],
            self.metrics.clone(),
            self.date_range,
        )
        .with_filter(self.main_filter.clone())
        .with_client_scope(self.client_scope.clone())
    }

    fn detail_query(&self, dimension: &str, filter: Option<String>) -> DataQuery {
        DataQuery::new(
            vec![dimension.to_string()],
            self.metrics.clone(),
            self.date_range,
        )
        .with_filter(filter)
        .with_client_scope(self.client_scope.clone())
    }
}

fn response_rows(layout: &ReportLayout, response: &ProviderResponse, indent: &str) -> Vec<Vec<Cell>> {
    let lookup = MetricLookup::new(&response.metrics);
    response
        .rows
        .iter()
        .map(|row| {
            let label = format!("{indent}{}", row.label());
            layout.build_row(&label, &lookup, &row.metrics)
        })
        .collect()
}

/// Fetch the main breakdown, then one detail breakdown per main row.
///
/// Detail fetches run concurrently, at most `concurrency` in flight. Each
/// main row is immediately followed by its own detail rows, labelled with
/// [`DETAIL_INDENT`]. A failed or empty detail fetch contributes no rows.
/// Only a failed main fetch fails the whole call; an empty main result is
/// returned as-is.
pub async fn fetch_hierarchy<F>(
    client: &BatchingClient,
    layout: &ReportLayout,
    request: &HierarchyRequest,
    detail_filter: F,
    concurrency: usize,
) -> Result<(Vec<String>, Vec<Vec<Cell>>), ProviderError>
where
    F: Fn(&str) -> Option<String>,
{
    let headers = layout.headers();
    let main = client.fetch(&request.main_query()).await?;
    debug!(
        dimension = %request.main_dimension,
        rows = main.rows.len(),
        "Fetched main breakdown"
    );

    let Some(detail_dimension) = request.detail_dimension.as_deref() else {
        return Ok((headers, response_rows(layout, &main, "")));
    };
    if main.is_empty() {
        return Ok((headers, Vec::new()));
    }

    let semaphore = Semaphore::new(concurrency.max(1));
    let semaphore = &semaphore;
    let details = join_all(main.rows.iter().map(|row| {
        let key = row.key().to_string();
        let query = request.detail_query(detail_dimension, detail_filter(&key));
        async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return Vec::new();
            };
            match client.fetch(&query).await {
                Ok(response) => response_rows(layout, &response, DETAIL_INDENT),
                Err(e) => {
                    warn!(key = %key, error = %e, "Detail fetch failed; main row kept without details");
                    Vec::new()
                }
            }
        }
    }))
    .await;

    let lookup = MetricLookup::new(&main.metrics);
    let mut rows = Vec::with_capacity(main.rows.len() + details.iter().map(Vec::len).sum::<usize>());
    for (row, detail_rows) in main.rows.iter().zip(details) {
        rows.push(layout.build_row(row.label(), &lookup, &row.metrics));
        rows.extend(detail_rows);
    }
    info!(
        main_rows = main.rows.len(),
        rows = rows.len(),
        "Hierarchy assembled"
    );
    Ok((headers, rows))
}
