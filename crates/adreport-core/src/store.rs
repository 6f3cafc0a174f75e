use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::report::TabularReport;

/// Opaque reference to a persisted report, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactHandle(pub String);

impl ArtifactHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persistence collaborator for finished reports.
///
/// The engine has no opinion on the byte format; implementations may write
/// spreadsheets to object storage, JSON to disk, or keep reports in memory.
#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    async fn store(&self, prefix: &str, report: &TabularReport) -> anyhow::Result<ArtifactHandle>;
}

/// Keeps reports in process memory. Used by tests and local runs.
#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<Vec<(ArtifactHandle, TabularReport)>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, handle: &ArtifactHandle) -> Option<TabularReport> {
        self.reports
            .lock()
            .await
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, report)| report.clone())
    }

    pub async fn len(&self) -> usize {
        self.reports.lock().await.len()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn store(&self, prefix: &str, report: &TabularReport) -> anyhow::Result<ArtifactHandle> {
        let handle = ArtifactHandle(format!("{}_{}", prefix, uuid::Uuid::new_v4().simple()));
        self.reports
            .lock()
            .await
            .push((handle.clone(), report.clone()));
        Ok(handle)
    }
}
