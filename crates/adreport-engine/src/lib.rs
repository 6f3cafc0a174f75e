pub mod batching;
pub mod catalog;
pub mod collector;
pub mod goals;
pub mod hierarchy;
pub mod jobs;
pub mod layout;
pub mod merger;
pub mod planner;
pub mod provider;
pub mod service;
pub mod strategy;

pub use batching::BatchingClient;
pub use jobs::{JobOutcome, JobStatus, ReportJobs};
pub use provider::{GoogleAnalyticsProvider, MetrikaProvider, ProviderRegistry, ReportProvider};
pub use service::ReportService;
pub use strategy::{ReportGenerator, TrafficStrategy};
