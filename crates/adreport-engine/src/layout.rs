//! Column layout shared by headers and rows.
//!
//! Column order: label, one column per selected attribute, one per planned
//! metric that is not an attribute metric, one per user-selected derived
//! metric, one per additional derived metric. Headers and rows are both built
//! from the same layout so their lengths always agree.

use std::collections::HashMap;

use adreport_core::derived::{self, BaseAggregates, DerivedMetric};
use adreport_core::report::{Cell, ReportSpec};

use crate::catalog::MetricProfile;
use crate::goals::{completions_metric, GoalMetricMap};
use crate::planner::{ColumnRole, MetricPlan};

#[derive(Debug, Clone)]
struct MetricColumn {
    header: String,
    metric: String,
}

#[derive(Debug, Clone)]
struct DerivedColumn {
    header: String,
    /// `None` for keys the calculator does not know; those render as 0.
    metric: Option<DerivedMetric>,
}

/// Position of each metric within one provider response.
pub struct MetricLookup<'a> {
    index: HashMap<&'a str, usize>,
}

impl<'a> MetricLookup<'a> {
    pub fn new(metrics: &'a [String]) -> Self {
        let mut index = HashMap::with_capacity(metrics.len());
        for (i, name) in metrics.iter().enumerate() {
            index.entry(name.as_str()).or_insert(i);
        }
        Self { index }
    }

    /// Value of `metric` in `values`; absent metrics and nulls read as 0.
    pub fn value(&self, values: &[Option<f64>], metric: &str) -> f64 {
        self.index
            .get(metric)
            .and_then(|&i| values.get(i).copied().flatten())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct ReportLayout {
    label_header: String,
    attribute_columns: Vec<MetricColumn>,
    value_columns: Vec<MetricColumn>,
    derived_columns: Vec<DerivedColumn>,
    plan: MetricPlan,
    cpa_goal_metric: Option<String>,
    cpo_goal_metric: Option<String>,
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl ReportLayout {
    pub fn new(
        label_header: &str,
        profile: &MetricProfile,
        plan: &MetricPlan,
        goals: &GoalMetricMap,
        spec: &ReportSpec,
    ) -> Self {
        let attributes = profile.attribute_map();

        let attribute_columns = spec
            .selected_attributes
            .iter()
            .filter_map(|attr| {
                attributes.get(attr).map(|metric| MetricColumn {
                    header: profile
                        .display_name(&metric.name)
                        .map(str::to_string)
                        .unwrap_or_else(|| title_case(attr)),
                    metric: metric.name.clone(),
                })
            })
            .collect();

        let value_columns = plan
            .metrics()
            .iter()
            .filter(|m| !attributes.maps_to(&m.name))
            .map(|m| MetricColumn {
                header: goals
                    .label(&m.name)
                    .or_else(|| profile.display_name(&m.name))
                    .unwrap_or(m.name.as_str())
                    .to_string(),
                metric: m.name.clone(),
            })
            .collect();

        let derived_columns = spec
            .selected_metrics
            .iter()
            .cloned()
            .chain(spec.additional_metric_keys())
            .map(|key| DerivedColumn {
                header: profile
                    .display_name(&key)
                    .map(str::to_string)
                    .unwrap_or_else(|| key.to_uppercase()),
                metric: DerivedMetric::parse(&key),
            })
            .collect();

        let targeted = |goal: &Option<String>| {
            goal.as_deref()
                .map(|id| completions_metric(profile.goal_prefix, id))
                .filter(|metric| plan.contains(metric))
        };

        Self {
            label_header: label_header.to_string(),
            attribute_columns,
            value_columns,
            derived_columns,
            plan: plan.clone(),
            cpa_goal_metric: targeted(&spec.cpa_goal),
            cpo_goal_metric: targeted(&spec.cpo_goal),
        }
    }

    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.label_header.clone())
            .chain(self.attribute_columns.iter().map(|c| c.header.clone()))
            .chain(self.value_columns.iter().map(|c| c.header.clone()))
            .chain(self.derived_columns.iter().map(|c| c.header.clone()))
            .collect()
    }

    pub fn width(&self) -> usize {
        1 + self.attribute_columns.len() + self.value_columns.len() + self.derived_columns.len()
    }

    /// Sum the planned metrics of one row by their column role.
    pub fn base_aggregates(&self, lookup: &MetricLookup<'_>, values: &[Option<f64>]) -> BaseAggregates {
        let mut base = BaseAggregates::default();
        for metric in self.plan.metrics() {
            let value = lookup.value(values, &metric.name);
            match metric.role {
                ColumnRole::Cost => base.cost += value,
                ColumnRole::Clicks => base.clicks += value,
                ColumnRole::Visits => base.visits += value,
                ColumnRole::Revenue => base.revenue += value,
                ColumnRole::Goal => base.goal_completions += value,
                ColumnRole::Other => {}
            }
        }
        base.cpa_goal_completions = self
            .cpa_goal_metric
            .as_deref()
            .map(|m| lookup.value(values, m));
        base.cpo_goal_completions = self
            .cpo_goal_metric
            .as_deref()
            .map(|m| lookup.value(values, m));
        base
    }

    /// Build one row. Derived metrics are computed from this row's own base
    /// values, never summed from other rows.
    pub fn build_row(&self, label: &str, lookup: &MetricLookup<'_>, values: &[Option<f64>]) -> Vec<Cell> {
        let mut row = Vec::with_capacity(self.width());
        row.push(Cell::from(label));
        for column in self.attribute_columns.iter().chain(&self.value_columns) {
            row.push(Cell::number(lookup.value(values, &column.metric)));
        }
        if !self.derived_columns.is_empty() {
            let base = self.base_aggregates(lookup, values);
            for column in &self.derived_columns {
                let value = column
                    .metric
                    .map(|metric| derived::compute(metric, &base))
                    .unwrap_or(0.0);
                row.push(Cell::number(value));
            }
        }
        row
    }
}
