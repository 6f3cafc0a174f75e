//! Yandex Metrika metric catalog per traffic kind.

use crate::planner::{AttributeMap, ColumnRole, PlannedMetric};

pub const AD_COST: &str = "ym:ad:RUBConvertedAdCost";
pub const AD_REVENUE: &str = "ym:ad:ecommerceRUBConvertedRevenue";

pub const AD_GOAL_PREFIX: &str = "ym:ad:";
pub const SESSION_GOAL_PREFIX: &str = "ym:s:";

/// Static description of the metrics one traffic kind works with.
#[derive(Debug)]
pub struct MetricProfile {
    pub base_metrics: &'static [(&'static str, ColumnRole)],
    /// `(attribute key, metric, role)`.
    pub attributes: &'static [(&'static str, &'static str, ColumnRole)],
    /// Metric or derived-metric key → column header.
    pub display_names: &'static [(&'static str, &'static str)],
    /// Prefix of synthetic goal metrics (`<prefix>goal<ID>visits`).
    pub goal_prefix: &'static str,
}

impl MetricProfile {
    pub fn base(&self) -> Vec<PlannedMetric> {
        self.base_metrics
            .iter()
            .map(|(name, role)| PlannedMetric::new(*name, *role))
            .collect()
    }

    pub fn attribute_map(&self) -> AttributeMap {
        self.attributes
            .iter()
            .fold(AttributeMap::new(), |map, (attr, name, role)| {
                map.with(*attr, PlannedMetric::new(*name, *role))
            })
    }

    pub fn display_name(&self, key: &str) -> Option<&'static str> {
        self.display_names
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, name)| *name)
    }
}

const AD_ATTRIBUTES: &[(&str, &str, ColumnRole)] = &[
    ("clicks", "ym:ad:clicks", ColumnRole::Clicks),
    ("visits", "ym:ad:visits", ColumnRole::Visits),
    ("decline", "ym:ad:bounceRate", ColumnRole::Other),
    ("timeonsite", "ym:ad:avgVisitDurationSeconds", ColumnRole::Other),
    ("depthofview", "ym:ad:pageDepth", ColumnRole::Other),
];

const SESSION_ATTRIBUTES: &[(&str, &str, ColumnRole)] = &[
    ("visits", "ym:s:visits", ColumnRole::Visits),
    ("decline", "ym:s:bounceRate", ColumnRole::Other),
    ("timeonsite", "ym:s:avgVisitDurationSeconds", ColumnRole::Other),
    ("depthofview", "ym:s:pageDepth", ColumnRole::Other),
];

const AD_BASE: &[(&str, ColumnRole)] = &[
    (AD_COST, ColumnRole::Cost),
    (AD_REVENUE, ColumnRole::Revenue),
];

const AD_NAMES: &[(&str, &str)] = &[
    (AD_COST, "Cost"),
    ("ym:ad:clicks", "Clicks"),
    ("ym:ad:visits", "Visits"),
    (AD_REVENUE, "Revenue"),
    ("ym:ad:bounceRate", "Bounce rate, %"),
    ("ym:ad:avgVisitDurationSeconds", "Time on site, s"),
    ("ym:ad:pageDepth", "Page depth"),
    ("cpc", "CPC"),
    ("cr", "CR, %"),
    ("cpo", "CPO"),
    ("cpa", "CPA"),
    ("cac", "CAC"),
    ("romi", "ROMI, %"),
    ("drr", "DRR, %"),
    ("roi", "ROI, %"),
];

const SESSION_NAMES: &[(&str, &str)] = &[
    ("ym:s:visits", "Visits"),
    ("ym:s:ecommerceRUBConvertedRevenue", "Revenue"),
    ("ym:s:bounceRate", "Bounce rate, %"),
    ("ym:s:avgVisitDurationSeconds", "Time on site, s"),
    ("ym:s:pageDepth", "Page depth"),
    ("cpc", "CPC"),
    ("cr", "CR, %"),
    ("cpo", "CPO"),
    ("cpa", "CPA"),
    ("cac", "CAC"),
    ("romi", "ROMI, %"),
    ("drr", "DRR, %"),
    ("roi", "ROI, %"),
];

pub static PAID_PROFILE: MetricProfile = MetricProfile {
    base_metrics: AD_BASE,
    attributes: AD_ATTRIBUTES,
    display_names: AD_NAMES,
    goal_prefix: AD_GOAL_PREFIX,
};

// Direct shares the ad metrics with paid traffic; only the dimensions differ.
pub static DIRECT_PROFILE: MetricProfile = MetricProfile {
    base_metrics: AD_BASE,
    attributes: AD_ATTRIBUTES,
    display_names: AD_NAMES,
    goal_prefix: AD_GOAL_PREFIX,
};

pub static FREE_PROFILE: MetricProfile = MetricProfile {
    base_metrics: &[],
    attributes: SESSION_ATTRIBUTES,
    display_names: SESSION_NAMES,
    goal_prefix: SESSION_GOAL_PREFIX,
};
