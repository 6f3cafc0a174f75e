//! Report providers: one per analytics service, looked up by slug.

pub mod google;
pub mod metrika;

use std::collections::HashMap;
use std::sync::Arc;

use adreport_core::error::GenerateError;
use adreport_core::report::{ProviderSlug, ReportSpec, TabularReport};
use async_trait::async_trait;

pub use google::GoogleAnalyticsProvider;
pub use metrika::MetrikaProvider;

/// Turns a report spec into a finished table for one analytics service.
#[async_trait]
pub trait ReportProvider: Send + Sync + 'static {
    fn slug(&self) -> ProviderSlug;

    async fn generate_report(&self, spec: &ReportSpec) -> Result<TabularReport, GenerateError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderSlug, Arc<dyn ReportProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own slug, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn ReportProvider>) {
        self.providers.insert(provider.slug(), provider);
    }

    pub fn with(mut self, provider: Arc<dyn ReportProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, slug: ProviderSlug) -> Option<Arc<dyn ReportProvider>> {
        self.providers.get(&slug).cloned()
    }

    /// Provider used when a request names no sources: Yandex Metrika when
    /// available, otherwise Google Analytics.
    pub fn default_provider(&self) -> Result<Arc<dyn ReportProvider>, GenerateError> {
        [ProviderSlug::YandexMetrika, ProviderSlug::GoogleAnalytics]
            .into_iter()
            .find_map(|slug| self.get(slug))
            .ok_or(GenerateError::NoProvider)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
