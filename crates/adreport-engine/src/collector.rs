use adreport_core::report::{ProviderSlug, ReportSpec, SourceSpec, TabularReport};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::provider::ProviderRegistry;

/// Run one generation per source, at most `concurrency` at a time.
///
/// Every source works on its own copy of `spec` with the source's traffic
/// kind. Sources that fail, return nothing or name an unregistered provider
/// are dropped; the rest keep the order of `sources`.
pub async fn collect_reports(
    registry: &ProviderRegistry,
    spec: &ReportSpec,
    sources: &[SourceSpec],
    concurrency: usize,
) -> Vec<(ProviderSlug, TabularReport)> {
    let semaphore = Semaphore::new(concurrency.max(1));
    let semaphore = &semaphore;

    let results = join_all(sources.iter().map(|source| async move {
        let Some(provider) = registry.get(source.provider) else {
            warn!(provider = %source.provider, "Provider not registered; source skipped");
            return None;
        };
        let Ok(_permit) = semaphore.acquire().await else {
            return None;
        };
        let source_spec = spec.with_traffic_kind(source.traffic_kind);
        match provider.generate_report(&source_spec).await {
            Ok(report) if !report.is_empty() => Some((source.provider, report)),
            Ok(_) => {
                warn!(
                    provider = %source.provider,
                    traffic = %source.traffic_kind,
                    "Source returned no rows; skipped"
                );
                None
            }
            Err(e) => {
                warn!(
                    provider = %source.provider,
                    traffic = %source.traffic_kind,
                    error = %e,
                    "Source failed; skipped"
                );
                None
            }
        }
    }))
    .await;

    let collected: Vec<_> = results.into_iter().flatten().collect();
    info!(
        requested = sources.len(),
        collected = collected.len(),
        "Sources collected"
    );
    collected
}
