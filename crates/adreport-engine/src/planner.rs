//! Metric query planning.
//!
//! A plan is the canonical, deduplicated, order-preserving list of metrics to
//! request: base metrics, then goal metrics, then the metric behind every
//! selected attribute. Each planned metric carries its [`ColumnRole`] so base
//! aggregates are a lookup rather than a guess from the metric name.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// What a metric contributes to derived-metric computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnRole {
    Cost,
    Clicks,
    Visits,
    Revenue,
    /// Goal completions.
    Goal,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlannedMetric {
    pub name: String,
    pub role: ColumnRole,
}

impl PlannedMetric {
    pub fn new(name: impl Into<String>, role: ColumnRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }
}

/// Attribute key → metric, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: Vec<(String, PlannedMetric)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: impl Into<String>, metric: PlannedMetric) -> Self {
        self.entries.push((attribute.into(), metric));
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&PlannedMetric> {
        self.entries
            .iter()
            .find(|(key, _)| key == attribute)
            .map(|(_, metric)| metric)
    }

    /// True when `metric` is the target of some attribute.
    pub fn maps_to(&self, metric: &str) -> bool {
        self.entries.iter().any(|(_, m)| m.name == metric)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricPlan {
    metrics: Vec<PlannedMetric>,
    index: HashMap<String, usize>,
}

impl MetricPlan {
    pub fn from_metrics(metrics: Vec<PlannedMetric>) -> Self {
        let metrics = dedup_keep_order(metrics);
        let index = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Self { metrics, index }
    }

    pub fn metrics(&self) -> &[PlannedMetric] {
        &self.metrics
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        self.index.get(name).map(|&i| self.metrics[i].role)
    }
}

/// Drop repeated metric names, keeping the first occurrence in place.
pub fn dedup_keep_order(metrics: Vec<PlannedMetric>) -> Vec<PlannedMetric> {
    let mut seen = HashSet::new();
    metrics
        .into_iter()
        .filter(|m| seen.insert(m.name.clone()))
        .collect()
}

/// Build the ordered metric list for one report.
///
/// Attributes absent from `attributes` are skipped silently.
pub fn plan(
    base_metrics: &[PlannedMetric],
    goal_metrics: &[PlannedMetric],
    selected_attributes: &[String],
    attributes: &AttributeMap,
) -> MetricPlan {
    let mut metrics = Vec::with_capacity(
        base_metrics.len() + goal_metrics.len() + selected_attributes.len(),
    );
    metrics.extend_from_slice(base_metrics);
    metrics.extend_from_slice(goal_metrics);
    metrics.extend(
        selected_attributes
            .iter()
            .filter_map(|attr| attributes.get(attr))
            .cloned(),
    );
    MetricPlan::from_metrics(metrics)
}
