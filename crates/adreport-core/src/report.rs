//! Report request and result types.

use std::fmt;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::derived::round2;
use crate::error::GenerateError;

/// Free-text additional metrics are honoured only when they name one of these.
pub const BASE_ADDITIONAL_METRICS: &[&str] = &["cpc", "cr", "cpo", "cac", "romi", "drr", "roi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrafficKind {
    #[default]
    Paid,
    Free,
    Direct,
    All,
}

impl TrafficKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "paid" => Ok(Self::Paid),
            "free" => Ok(Self::Free),
            "direct" => Ok(Self::Direct),
            "all" => Ok(Self::All),
            _ => Err(anyhow!("traffic kind must be one of: paid, free, direct, all")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Free => "free",
            Self::Direct => "direct",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TrafficKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSlug {
    YandexMetrika,
    GoogleAnalytics,
}

impl ProviderSlug {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "yandex_metrika" => Ok(Self::YandexMetrika),
            "google_analytics" => Ok(Self::GoogleAnalytics),
            _ => Err(anyhow!("provider must be one of: yandex_metrika, google_analytics")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YandexMetrika => "yandex_metrika",
            Self::GoogleAnalytics => "google_analytics",
        }
    }
}

impl fmt::Display for ProviderSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a multi-source run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub provider: ProviderSlug,
    pub traffic_kind: TrafficKind,
}

impl SourceSpec {
    pub fn new(provider: ProviderSlug, traffic_kind: TrafficKind) -> Self {
        Self {
            provider,
            traffic_kind,
        }
    }
}

/// A provider-defined conversion goal. An empty `name` is resolved from the
/// provider's goal list before metrics are planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl GoalDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Inclusive date range, serialised as ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(anyhow!("end date must be on or after start date"));
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |raw: &str, field: &str| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| anyhow!("invalid {field} (expected YYYY-MM-DD)"))
        };
        Self::new(parse(start, "start date")?, parse(end, "end date")?)
    }

    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Immutable description of one generation request.
///
/// Multi-source runs never mutate a shared spec: each branch works on the
/// copy returned by [`ReportSpec::with_traffic_kind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub date_range: DateRange,
    #[serde(default)]
    pub traffic_kind: TrafficKind,
    #[serde(default)]
    pub goals: Vec<GoalDefinition>,
    /// Derived-metric keys such as `cpa` or `roi`.
    #[serde(default)]
    pub selected_metrics: Vec<String>,
    /// Attribute keys such as `clicks` or `decline`.
    #[serde(default)]
    pub selected_attributes: Vec<String>,
    /// Comma-separated derived-metric keys typed in by the user.
    #[serde(default)]
    pub additional_metrics: Option<String>,
    #[serde(default)]
    pub cpa_goal: Option<String>,
    #[serde(default)]
    pub cpo_goal: Option<String>,
    #[serde(default)]
    pub compare_range: Option<DateRange>,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

impl ReportSpec {
    pub fn new(date_range: DateRange, traffic_kind: TrafficKind) -> Self {
        Self {
            date_range,
            traffic_kind,
            goals: Vec::new(),
            selected_metrics: Vec::new(),
            selected_attributes: Vec::new(),
            additional_metrics: None,
            cpa_goal: None,
            cpo_goal: None,
            compare_range: None,
            sources: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.date_range.end < self.date_range.start {
            return Err(GenerateError::InvalidSpec(
                "end date must be on or after start date".to_string(),
            ));
        }
        if let Some(compare) = &self.compare_range {
            if compare.end < compare.start {
                return Err(GenerateError::InvalidSpec(
                    "comparison end date must be on or after comparison start date".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn with_traffic_kind(&self, traffic_kind: TrafficKind) -> Self {
        Self {
            traffic_kind,
            ..self.clone()
        }
    }

    /// The same request over the comparison period, if one was asked for.
    pub fn comparison_spec(&self) -> Option<Self> {
        self.compare_range.map(|range| Self {
            date_range: range,
            compare_range: None,
            ..self.clone()
        })
    }

    /// Additional free-text metric keys that are known and not already selected,
    /// in the order the user typed them.
    pub fn additional_metric_keys(&self) -> Vec<String> {
        let Some(raw) = self.additional_metrics.as_deref() else {
            return Vec::new();
        };
        let mut keys: Vec<String> = Vec::new();
        for key in raw.split(',').map(str::trim) {
            if key.is_empty()
                || !BASE_ADDITIONAL_METRICS.contains(&key)
                || self.selected_metrics.iter().any(|m| m == key)
                || keys.iter().any(|k| k == key)
            {
                continue;
            }
            keys.push(key.to_string());
        }
        keys
    }
}

/// A single table cell. Numbers are rounded to display precision on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn number(value: f64) -> Self {
        Cell::Number(round2(value))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            Cell::Number(_) => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

/// The only artifact that leaves the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabularReport {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(default)]
    pub meta_data: Vec<String>,
}

impl TabularReport {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            rows,
            meta_data: Vec::new(),
        }
    }

    pub fn with_meta(mut self, line: impl Into<String>) -> Self {
        self.meta_data.push(line.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row has exactly one cell per header.
    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|row| row.len() == self.headers.len())
    }

    /// First-column labels, mostly useful for inspecting row order.
    pub fn labels(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| match row.first() {
                Some(Cell::Text(s)) => s.clone(),
                Some(Cell::Number(v)) => v.to_string(),
                None => String::new(),
            })
            .collect()
    }
}
