//! Background report runs with persistence.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use adreport_core::report::ReportSpec;
use adreport_core::store::{ArtifactHandle, ReportStore};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::service::ReportService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Finished,
    Failed,
    /// Another run for the same report id was in progress; nothing was done.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOutcome {
    pub report_id: Uuid,
    pub status: JobStatus,
    pub artifact: Option<ArtifactHandle>,
    pub error: Option<String>,
}

impl JobOutcome {
    fn new(report_id: Uuid, status: JobStatus) -> Self {
        Self {
            report_id,
            status,
            artifact: None,
            error: None,
        }
    }

    fn failed(report_id: Uuid, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(report_id, JobStatus::Failed)
        }
    }
}

type RunningSet = Mutex<HashSet<Uuid>>;

fn lock(running: &RunningSet) -> MutexGuard<'_, HashSet<Uuid>> {
    running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds a report id in the running set until dropped, including when the
/// run is aborted or panics.
struct RunningGuard<'a> {
    running: &'a RunningSet,
    report_id: Uuid,
}

impl<'a> RunningGuard<'a> {
    fn acquire(running: &'a RunningSet, report_id: Uuid) -> Option<Self> {
        lock(running)
            .insert(report_id)
            .then_some(Self { running, report_id })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        lock(self.running).remove(&self.report_id);
    }
}

pub struct ReportJobs {
    service: ReportService,
    store: Arc<dyn ReportStore>,
    running: RunningSet,
}

impl ReportJobs {
    pub fn new(service: ReportService, store: Arc<dyn ReportStore>) -> Self {
        Self {
            service,
            store,
            running: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_running(&self, report_id: Uuid) -> bool {
        lock(&self.running).contains(&report_id)
    }

    /// Generate and persist the report for `report_id`.
    ///
    /// The artifact is stored under `report_<traffic kind>`. A report id that
    /// is already being generated is not started a second time.
    pub async fn run(&self, report_id: Uuid, spec: ReportSpec) -> JobOutcome {
        let Some(_guard) = RunningGuard::acquire(&self.running, report_id) else {
            warn!(report_id = %report_id, "Report generation already running");
            return JobOutcome::new(report_id, JobStatus::AlreadyRunning);
        };
        self.generate_and_store(report_id, &spec).await
    }

    async fn generate_and_store(&self, report_id: Uuid, spec: &ReportSpec) -> JobOutcome {
        let report = match self.service.generate(spec, None).await {
            Ok(report) => report,
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Report job failed");
                return JobOutcome::failed(report_id, e);
            }
        };
        let prefix = format!("report_{}", spec.traffic_kind);
        match self.store.store(&prefix, &report).await {
            Ok(handle) => {
                info!(
                    report_id = %report_id,
                    artifact = %handle.as_str(),
                    rows = report.rows.len(),
                    "Report job finished"
                );
                JobOutcome {
                    artifact: Some(handle),
                    ..JobOutcome::new(report_id, JobStatus::Finished)
                }
            }
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Report storage failed");
                JobOutcome::failed(report_id, e)
            }
        }
    }

    /// Run the job on the tokio runtime.
    pub fn spawn(self: &Arc<Self>, report_id: Uuid, spec: ReportSpec) -> JoinHandle<JobOutcome> {
        let jobs = Arc::clone(self);
        tokio::spawn(async move { jobs.run(report_id, spec).await })
    }
}
