use std::sync::Arc;

use adreport_core::config::Config;
use adreport_core::error::GenerateError;
use adreport_core::provider::ProviderClient;
use adreport_core::report::{ProviderSlug, ReportSpec, TabularReport};
use async_trait::async_trait;

use super::ReportProvider;
use crate::strategy::{ReportGenerator, TrafficStrategy};

/// Yandex Metrika reports, one strategy per traffic kind.
pub struct MetrikaProvider {
    generator: ReportGenerator,
    config: Config,
}

impl MetrikaProvider {
    pub fn new(client: Arc<dyn ProviderClient>, config: Config) -> Self {
        Self {
            generator: ReportGenerator::new(client, &config),
            config,
        }
    }
}

#[async_trait]
impl ReportProvider for MetrikaProvider {
    fn slug(&self) -> ProviderSlug {
        ProviderSlug::YandexMetrika
    }

    async fn generate_report(&self, spec: &ReportSpec) -> Result<TabularReport, GenerateError> {
        let strategy = TrafficStrategy::for_kind(spec.traffic_kind, &self.config);
        self.generator.generate(&strategy, spec).await
    }
}
