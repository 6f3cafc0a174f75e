//! Google Analytics 4 channel report.

use std::sync::Arc;

use adreport_core::config::Config;
use adreport_core::error::GenerateError;
use adreport_core::provider::{DataQuery, ProviderClient};
use adreport_core::report::{Cell, ProviderSlug, ReportSpec, TabularReport, TrafficKind};
use async_trait::async_trait;
use tracing::info;

use super::ReportProvider;
use crate::batching::BatchingClient;
use crate::layout::MetricLookup;

pub const CHANNEL_DIMENSION: &str = "sessionDefaultChannelGroup";

fn metrics_for(kind: TrafficKind) -> Vec<String> {
    let second = match kind {
        TrafficKind::Free => "engagedSessions",
        TrafficKind::Paid | TrafficKind::Direct | TrafficKind::All => "totalRevenue",
    };
    vec!["sessions".to_string(), second.to_string()]
}

pub struct GoogleAnalyticsProvider {
    client: BatchingClient,
}

impl GoogleAnalyticsProvider {
    pub fn new(client: Arc<dyn ProviderClient>, config: &Config) -> Self {
        Self {
            client: BatchingClient::new(client, config),
        }
    }
}

#[async_trait]
impl ReportProvider for GoogleAnalyticsProvider {
    fn slug(&self) -> ProviderSlug {
        ProviderSlug::GoogleAnalytics
    }

    async fn generate_report(&self, spec: &ReportSpec) -> Result<TabularReport, GenerateError> {
        spec.validate()?;
        let metrics = metrics_for(spec.traffic_kind);
        let query = DataQuery::new(
            vec![CHANNEL_DIMENSION.to_string()],
            metrics.clone(),
            spec.date_range,
        );
        let response = self.client.fetch(&query).await?;
        if response.is_empty() {
            return Err(GenerateError::empty("google-analytics-fetch"));
        }

        let lookup = MetricLookup::new(&response.metrics);
        let rows = response
            .rows
            .iter()
            .map(|row| {
                std::iter::once(Cell::from(row.label()))
                    .chain(
                        metrics
                            .iter()
                            .map(|m| Cell::number(lookup.value(&row.metrics, m))),
                    )
                    .collect::<Vec<_>>()
            })
            .collect();
        let headers = std::iter::once("Channel".to_string())
            .chain(metrics.iter().cloned())
            .collect();

        let report = TabularReport::new(headers, rows).with_meta("Google Analytics 4 (v1beta)");
        info!(rows = report.rows.len(), "Google Analytics report generated");
        Ok(report)
    }
}
