use std::sync::Arc;

use adreport_core::config::Config;
use adreport_core::error::GenerateError;
use adreport_core::report::{ReportSpec, SourceSpec, TabularReport};
use tracing::{error, info};

use crate::collector::collect_reports;
use crate::merger::union_merge;
use crate::provider::ProviderRegistry;

/// Entry point for single- and multi-provider report generation.
#[derive(Clone)]
pub struct ReportService {
    registry: Arc<ProviderRegistry>,
    source_concurrency: usize,
}

impl ReportService {
    pub fn new(registry: ProviderRegistry, config: &Config) -> Self {
        Self {
            registry: Arc::new(registry),
            source_concurrency: config.source_concurrency,
        }
    }

    /// Generate one report.
    ///
    /// `sources` overrides `spec.sources`. With no sources at all the default
    /// provider runs alone; otherwise every source runs and the survivors are
    /// union-merged. Fails when no source produced data.
    pub async fn generate(
        &self,
        spec: &ReportSpec,
        sources: Option<&[SourceSpec]>,
    ) -> Result<TabularReport, GenerateError> {
        spec.validate()?;
        let sources = sources
            .filter(|s| !s.is_empty())
            .or_else(|| (!spec.sources.is_empty()).then_some(spec.sources.as_slice()));

        let Some(sources) = sources else {
            let provider = self.registry.default_provider()?;
            info!(provider = %provider.slug(), "Generating single-provider report");
            return provider.generate_report(spec).await;
        };

        info!(sources = sources.len(), "Generating multi-provider report");
        let results =
            collect_reports(&self.registry, spec, sources, self.source_concurrency).await;
        if results.is_empty() {
            error!(sources = sources.len(), "No source produced data");
            return Err(GenerateError::NoSourceData);
        }
        Ok(union_merge(&results))
    }

    /// Run the same request over the spec's comparison range.
    pub async fn generate_comparison(
        &self,
        spec: &ReportSpec,
        sources: Option<&[SourceSpec]>,
    ) -> Result<TabularReport, GenerateError> {
        let comparison = spec.comparison_spec().ok_or_else(|| {
            GenerateError::InvalidSpec("no comparison range requested".to_string())
        })?;
        self.generate(&comparison, sources).await
    }
}
