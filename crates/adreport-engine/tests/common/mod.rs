#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use adreport_core::error::ProviderError;
use adreport_core::provider::{
    ClientScope, DataQuery, DataRow, DimensionValue, ProviderClient, ProviderResponse,
};
use adreport_core::report::{DateRange, GoalDefinition, ReportSpec, TrafficKind};
use async_trait::async_trait;

type Handler = dyn Fn(&DataQuery) -> Result<ProviderResponse, ProviderError> + Send + Sync;
type Delay = dyn Fn(&DataQuery) -> Duration + Send + Sync;

/// Provider client whose responses come from a closure. Records every query
/// and the peak number of concurrent `fetch` calls.
pub struct ScriptedClient {
    handler: Box<Handler>,
    delay: Box<Delay>,
    calls: Mutex<Vec<DataQuery>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    scopes: Option<Vec<ClientScope>>,
    goals: Option<Vec<GoalDefinition>>,
}

impl ScriptedClient {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&DataQuery) -> Result<ProviderResponse, ProviderError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            delay: Box::new(|_: &DataQuery| Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            scopes: None,
            goals: None,
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_fn(move |_| delay)
    }

    pub fn with_delay_fn<F>(mut self, delay: F) -> Self
    where
        F: Fn(&DataQuery) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    pub fn with_scopes(mut self, logins: &[&str]) -> Self {
        self.scopes = Some(
            logins
                .iter()
                .enumerate()
                .map(|(i, login)| ClientScope {
                    id: (i + 1).to_string(),
                    login: login.to_string(),
                })
                .collect(),
        );
        self
    }

    pub fn with_goals(mut self, goals: Vec<GoalDefinition>) -> Self {
        self.goals = Some(goals);
        self
    }

    pub fn calls(&self) -> Vec<DataQuery> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedClient {
    async fn fetch(&self, query: &DataQuery) -> Result<ProviderResponse, ProviderError> {
        self.calls.lock().expect("calls lock").push(query.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay)(query);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let result = (self.handler)(query);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_client_scopes(&self) -> Result<Vec<ClientScope>, ProviderError> {
        self.scopes
            .clone()
            .ok_or(ProviderError::Unsupported("client scope listing"))
    }

    async fn list_goals(&self) -> Result<Vec<GoalDefinition>, ProviderError> {
        self.goals
            .clone()
            .ok_or(ProviderError::Unsupported("goal listing"))
    }
}

/// Response with one row per key; every value comes from `value(key, metric)`.
pub fn response_for(
    query: &DataQuery,
    keys: &[&str],
    value: impl Fn(&str, &str) -> f64,
) -> ProviderResponse {
    let rows = keys
        .iter()
        .map(|&key| {
            DataRow::new(
                vec![DimensionValue::new(key, key)],
                query
                    .metrics
                    .iter()
                    .map(|m| Some(value(key, m.as_str())))
                    .collect(),
            )
        })
        .collect();
    ProviderResponse::new(query.metrics.clone(), rows)
}

pub fn empty_response(query: &DataQuery) -> ProviderResponse {
    ProviderResponse::new(query.metrics.clone(), Vec::new())
}

pub fn range() -> DateRange {
    DateRange::parse("2024-01-01", "2024-01-31").expect("range")
}

pub fn spec(kind: TrafficKind) -> ReportSpec {
    ReportSpec::new(range(), kind)
}

pub fn server_error() -> ProviderError {
    ProviderError::Status {
        status: 500,
        message: "internal error".to_string(),
    }
}
