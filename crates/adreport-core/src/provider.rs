//! Provider client abstraction.
//!
//! The wire protocol of each analytics provider lives behind
//! [`ProviderClient`]; the engine only sees rows of dimension values plus
//! metric values aligned to the metric list of the response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::report::{DateRange, GoalDefinition};

/// One provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub date_range: DateRange,
    pub filter: Option<String>,
    /// Comma-separated advertiser logins, for ad-account scoped dimensions.
    pub client_scope: Option<String>,
}

impl DataQuery {
    pub fn new(dimensions: Vec<String>, metrics: Vec<String>, date_range: DateRange) -> Self {
        Self {
            dimensions,
            metrics,
            date_range,
            filter: None,
            client_scope: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_client_scope(mut self, client_scope: Option<String>) -> Self {
        self.client_scope = client_scope;
        self
    }

    /// Same request for a different metric slice.
    pub fn for_metrics(&self, metrics: &[String]) -> Self {
        Self {
            metrics: metrics.to_vec(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionValue {
    pub id: Option<String>,
    pub name: String,
}

impl DimensionValue {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

/// One server-returned row. `metrics[i]` belongs to `ProviderResponse::metrics[i]`;
/// `None` means the provider sent no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub dimensions: Vec<DimensionValue>,
    pub metrics: Vec<Option<f64>>,
}

impl DataRow {
    pub fn new(dimensions: Vec<DimensionValue>, metrics: Vec<Option<f64>>) -> Self {
        Self {
            dimensions,
            metrics,
        }
    }

    /// Key used to filter the detail level: the first dimension's id, or its
    /// name when the provider sent no id.
    pub fn key(&self) -> &str {
        match self.dimensions.first() {
            Some(DimensionValue { id: Some(id), .. }) => id.as_str(),
            Some(DimensionValue { name, .. }) => name.as_str(),
            None => "",
        }
    }

    pub fn label(&self) -> &str {
        self.dimensions
            .first()
            .map(|d| d.name.as_str())
            .unwrap_or_default()
    }

    /// Two rows describe the same dimension tuple.
    pub fn same_identity(&self, other: &DataRow) -> bool {
        self.dimensions == other.dimensions
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Metric names the row values are aligned to.
    pub metrics: Vec<String>,
    pub rows: Vec<DataRow>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub sampled: Option<bool>,
}

impl ProviderResponse {
    pub fn new(metrics: Vec<String>, rows: Vec<DataRow>) -> Self {
        Self {
            metrics,
            rows,
            total_rows: None,
            sampled: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An advertiser account the provider can scope ad queries to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientScope {
    pub id: String,
    pub login: String,
}

/// Raw access to one analytics provider.
#[async_trait]
pub trait ProviderClient: Send + Sync + 'static {
    async fn fetch(&self, query: &DataQuery) -> Result<ProviderResponse, ProviderError>;

    async fn list_client_scopes(&self) -> Result<Vec<ClientScope>, ProviderError> {
        Err(ProviderError::Unsupported("client scope listing"))
    }

    async fn list_goals(&self) -> Result<Vec<GoalDefinition>, ProviderError> {
        Err(ProviderError::Unsupported("goal listing"))
    }
}
