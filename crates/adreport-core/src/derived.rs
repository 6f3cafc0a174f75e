//! Business metrics computed from base aggregates.
//!
//! Every calculator guards its denominator: a zero denominator yields `0.0`,
//! never `inf` or `NaN`. Results are rounded to two decimals.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedMetric {
    Cpc,
    Cpa,
    Cpo,
    Cr,
    Cac,
    Romi,
    Roi,
    Drr,
}

impl DerivedMetric {
    pub const ALL: [DerivedMetric; 8] = [
        DerivedMetric::Cpc,
        DerivedMetric::Cpa,
        DerivedMetric::Cpo,
        DerivedMetric::Cr,
        DerivedMetric::Cac,
        DerivedMetric::Romi,
        DerivedMetric::Roi,
        DerivedMetric::Drr,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cpc" => Some(Self::Cpc),
            "cpa" => Some(Self::Cpa),
            "cpo" => Some(Self::Cpo),
            "cr" => Some(Self::Cr),
            "cac" => Some(Self::Cac),
            "romi" => Some(Self::Romi),
            "roi" => Some(Self::Roi),
            "drr" => Some(Self::Drr),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Cpc => "cpc",
            Self::Cpa => "cpa",
            Self::Cpo => "cpo",
            Self::Cr => "cr",
            Self::Cac => "cac",
            Self::Romi => "romi",
            Self::Roi => "roi",
            Self::Drr => "drr",
        }
    }
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Base values extracted from one report row.
///
/// `cpa_goal_completions` / `cpo_goal_completions` hold the completions of the
/// goals chosen as CPA/CPO targets; when absent, `goal_completions` is used.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaseAggregates {
    pub cost: f64,
    pub clicks: f64,
    pub visits: f64,
    pub revenue: f64,
    pub goal_completions: f64,
    pub cpa_goal_completions: Option<f64>,
    pub cpo_goal_completions: Option<f64>,
    pub new_customers: Option<f64>,
}

pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round2(numerator / denominator)
}

fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    round2(numerator / denominator * 100.0)
}

pub fn cpc(cost: f64, clicks: f64) -> f64 {
    ratio(cost, clicks)
}

pub fn cpa(cost: f64, goal_completions: f64) -> f64 {
    ratio(cost, goal_completions)
}

pub fn cpo(cost: f64, orders: f64) -> f64 {
    ratio(cost, orders)
}

pub fn cr(goal_completions: f64, visits: f64) -> f64 {
    percent(goal_completions, visits)
}

pub fn cac(cost: f64, new_customers: f64) -> f64 {
    ratio(cost, new_customers)
}

pub fn romi(revenue: f64, cost: f64) -> f64 {
    percent(revenue - cost, cost)
}

pub fn roi(revenue: f64, cost: f64) -> f64 {
    percent(revenue, cost)
}

pub fn drr(cost: f64, revenue: f64) -> f64 {
    percent(cost, revenue)
}

/// Compute one derived metric from base aggregates.
pub fn compute(metric: DerivedMetric, base: &BaseAggregates) -> f64 {
    match metric {
        DerivedMetric::Cpc => cpc(base.cost, base.clicks),
        DerivedMetric::Cpa => cpa(
            base.cost,
            base.cpa_goal_completions.unwrap_or(base.goal_completions),
        ),
        DerivedMetric::Cpo => cpo(
            base.cost,
            base.cpo_goal_completions.unwrap_or(base.goal_completions),
        ),
        DerivedMetric::Cr => cr(base.goal_completions, base.visits),
        DerivedMetric::Cac => cac(base.cost, base.new_customers.unwrap_or(0.0)),
        DerivedMetric::Romi => romi(base.revenue, base.cost),
        DerivedMetric::Roi => roi(base.revenue, base.cost),
        DerivedMetric::Drr => drr(base.cost, base.revenue),
    }
}

/// Compute the requested subset. Keys that were not requested are absent
/// from the result rather than zero-filled.
pub fn calculate(
    selected: &[DerivedMetric],
    base: &BaseAggregates,
) -> BTreeMap<DerivedMetric, f64> {
    selected
        .iter()
        .map(|metric| (*metric, compute(*metric, base)))
        .collect()
}
