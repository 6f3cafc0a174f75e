//! Traffic-kind report strategies and the generation pipeline that runs them.
//!
//! A strategy is an immutable value: which metrics to ask for, along which
//! dimensions, with which filters. [`ReportGenerator::generate`] drives one
//! strategy through scope resolution, goal lookup, planning, fetching and
//! assembly. Any stage that yields nothing fails the generation; no partial
//! report is returned.

pub mod direct;
pub mod free;
pub mod paid;

use std::sync::Arc;

use adreport_core::config::Config;
use adreport_core::error::GenerateError;
use adreport_core::provider::{DataQuery, ProviderClient};
use adreport_core::report::{ReportSpec, TabularReport, TrafficKind};
use tracing::{debug, error, info, warn};

use crate::batching::BatchingClient;
use crate::catalog::{MetricProfile, DIRECT_PROFILE, FREE_PROFILE, PAID_PROFILE};
use crate::goals::{resolve_goal_names, GoalMetricMap};
use crate::hierarchy::{fetch_hierarchy, HierarchyRequest};
use crate::layout::ReportLayout;
use crate::planner::plan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficStrategy {
    /// Ad traffic collapsed into one aggregate row.
    Paid { attribution: String },
    /// Organic traffic by source and engine; `include_ad` folds ad traffic in.
    Free { include_ad: bool },
    /// Campaigns and their ad groups; needs an advertiser scope.
    Direct { attribution: String },
}

impl TrafficStrategy {
    pub fn for_kind(kind: TrafficKind, config: &Config) -> Self {
        match kind {
            TrafficKind::Paid => Self::Paid {
                attribution: config.attribution.clone(),
            },
            TrafficKind::Free => Self::Free { include_ad: false },
            TrafficKind::All => Self::Free { include_ad: true },
            TrafficKind::Direct => Self::Direct {
                attribution: config.attribution.clone(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Paid { .. } => "paid",
            Self::Free { include_ad: false } => "free",
            Self::Free { include_ad: true } => "all",
            Self::Direct { .. } => "direct",
        }
    }

    pub fn profile(&self) -> &'static MetricProfile {
        match self {
            Self::Paid { .. } => &PAID_PROFILE,
            Self::Free { .. } => &FREE_PROFILE,
            Self::Direct { .. } => &DIRECT_PROFILE,
        }
    }

    pub fn main_dimension(&self) -> String {
        match self {
            Self::Paid { attribution } => paid::main_dimension(attribution),
            Self::Free { .. } => free::MAIN_DIMENSION.to_string(),
            Self::Direct { attribution } => direct::main_dimension(attribution),
        }
    }

    pub fn detail_dimension(&self) -> Option<String> {
        match self {
            Self::Paid { .. } => None,
            Self::Free { .. } => Some(free::DETAIL_DIMENSION.to_string()),
            Self::Direct { attribution } => Some(direct::detail_dimension(attribution)),
        }
    }

    pub fn main_filter(&self) -> Option<String> {
        match self {
            Self::Free { include_ad } => free::main_filter(*include_ad),
            Self::Paid { .. } | Self::Direct { .. } => None,
        }
    }

    /// Filter for the detail breakdown of the main row with key `key`.
    pub fn detail_filter(&self, key: &str) -> Option<String> {
        match self {
            Self::Paid { .. } => None,
            Self::Free { .. } => Some(free::detail_filter(key)),
            Self::Direct { attribution } => Some(direct::detail_filter(attribution, key)),
        }
    }

    pub fn main_column_label(&self) -> &'static str {
        match self {
            Self::Paid { .. } => paid::COLUMN_LABEL,
            Self::Free { .. } => free::COLUMN_LABEL,
            Self::Direct { .. } => direct::COLUMN_LABEL,
        }
    }

    /// Ad dimensions need an advertiser scope; session dimensions take none.
    pub fn requires_client_scope(&self) -> bool {
        matches!(self, Self::Paid { .. } | Self::Direct { .. })
    }

    pub fn collapses_rows(&self) -> bool {
        matches!(self, Self::Paid { .. })
    }
}

/// Runs traffic strategies against one provider client.
#[derive(Clone)]
pub struct ReportGenerator {
    client: BatchingClient,
    detail_concurrency: usize,
}

impl ReportGenerator {
    pub fn new(client: Arc<dyn ProviderClient>, config: &Config) -> Self {
        Self {
            client: BatchingClient::new(client, config),
            detail_concurrency: config.detail_concurrency,
        }
    }

    pub async fn generate(
        &self,
        strategy: &TrafficStrategy,
        spec: &ReportSpec,
    ) -> Result<TabularReport, GenerateError> {
        let result = self.run(strategy, spec).await;
        if let Err(e) = &result {
            error!(strategy = strategy.name(), error = %e, "Report generation failed");
        }
        result
    }

    async fn run(
        &self,
        strategy: &TrafficStrategy,
        spec: &ReportSpec,
    ) -> Result<TabularReport, GenerateError> {
        spec.validate()?;
        info!(
            strategy = strategy.name(),
            start = %spec.date_range.start_iso(),
            end = %spec.date_range.end_iso(),
            goals = spec.goals.len(),
            "Generating report"
        );

        let client_scope = self.resolve_scope(strategy).await?;

        let goals = resolve_goal_names(self.client.client(), &spec.goals).await;
        let profile = strategy.profile();
        let goal_map = GoalMetricMap::build(&goals, profile.goal_prefix);

        let planned = plan(
            &profile.base(),
            goal_map.metrics(),
            &spec.selected_attributes,
            &profile.attribute_map(),
        );
        if planned.is_empty() {
            return Err(GenerateError::empty("plan-metrics"));
        }
        debug!(metrics = planned.len(), "Metrics planned");

        let layout = ReportLayout::new(
            strategy.main_column_label(),
            profile,
            &planned,
            &goal_map,
            spec,
        );

        let (headers, rows) = if strategy.collapses_rows() {
            let query = DataQuery::new(
                vec![strategy.main_dimension()],
                planned.names(),
                spec.date_range,
            )
            .with_filter(strategy.main_filter())
            .with_client_scope(client_scope);
            let response = self.client.fetch(&query).await?;
            if response.is_empty() {
                return Err(GenerateError::empty("fetch-aggregate"));
            }
            (layout.headers(), vec![paid::collapse(&layout, &response)])
        } else {
            let request = HierarchyRequest {
                main_dimension: strategy.main_dimension(),
                detail_dimension: strategy.detail_dimension(),
                metrics: planned.names(),
                date_range: spec.date_range,
                main_filter: strategy.main_filter(),
                client_scope,
            };
            fetch_hierarchy(
                &self.client,
                &layout,
                &request,
                |key| strategy.detail_filter(key),
                self.detail_concurrency,
            )
            .await?
        };
        if rows.is_empty() {
            return Err(GenerateError::empty("fetch-hierarchy"));
        }

        let report = TabularReport::new(headers, rows)
            .with_meta(format!("Yandex Metrika, {} traffic", strategy.name()))
            .with_meta(format!(
                "Period: {} to {}",
                spec.date_range.start_iso(),
                spec.date_range.end_iso()
            ));
        info!(
            strategy = strategy.name(),
            columns = report.headers.len(),
            rows = report.rows.len(),
            "Report generated"
        );
        Ok(report)
    }

    /// Comma-separated advertiser logins for ad-scoped strategies.
    async fn resolve_scope(&self, strategy: &TrafficStrategy) -> Result<Option<String>, GenerateError> {
        if !strategy.requires_client_scope() {
            return Ok(None);
        }
        let logins = match self.client.client().list_client_scopes().await {
            Ok(scopes) => scopes
                .into_iter()
                .map(|s| s.login)
                .filter(|login| !login.is_empty())
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Client scope lookup failed");
                Vec::new()
            }
        };
        if logins.is_empty() {
            return Err(GenerateError::ScopeResolution(strategy.name().to_string()));
        }
        debug!(clients = logins.len(), "Client scope resolved");
        Ok(Some(logins.join(",")))
    }
}
