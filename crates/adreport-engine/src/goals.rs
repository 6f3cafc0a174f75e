//! Goal metric synthesis.

use std::collections::HashMap;

use adreport_core::provider::ProviderClient;
use adreport_core::report::GoalDefinition;
use tracing::warn;

use crate::planner::{ColumnRole, PlannedMetric};

pub fn completions_metric(prefix: &str, goal_id: &str) -> String {
    format!("{prefix}goal{goal_id}visits")
}

pub fn conversion_rate_metric(prefix: &str, goal_id: &str) -> String {
    format!("{prefix}goal{goal_id}conversionRate")
}

/// Synthetic goal metrics and their column headers.
#[derive(Debug, Clone, Default)]
pub struct GoalMetricMap {
    metrics: Vec<PlannedMetric>,
    labels: HashMap<String, String>,
}

impl GoalMetricMap {
    /// Two metrics per goal: completions (role `Goal`) then conversion rate.
    pub fn build(goals: &[GoalDefinition], prefix: &str) -> Self {
        let mut map = Self::default();
        for goal in goals {
            let visits = completions_metric(prefix, &goal.id);
            let rate = conversion_rate_metric(prefix, &goal.id);
            map.labels
                .insert(visits.clone(), format!("Goal completions: {}", goal.name));
            map.labels
                .insert(rate.clone(), format!("Goal conversion rate: {}, %", goal.name));
            map.metrics.push(PlannedMetric::new(visits, ColumnRole::Goal));
            map.metrics.push(PlannedMetric::new(rate, ColumnRole::Other));
        }
        map
    }

    pub fn metrics(&self) -> &[PlannedMetric] {
        &self.metrics
    }

    pub fn label(&self, metric: &str) -> Option<&str> {
        self.labels.get(metric).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Fill in missing goal names from the provider's goal list.
///
/// A failed lookup is not fatal: unnamed goals fall back to their id.
pub async fn resolve_goal_names(
    client: &dyn ProviderClient,
    goals: &[GoalDefinition],
) -> Vec<GoalDefinition> {
    if goals.iter().all(|g| !g.name.trim().is_empty()) {
        return goals.to_vec();
    }
    let known: HashMap<String, String> = match client.list_goals().await {
        Ok(list) => list.into_iter().map(|g| (g.id, g.name)).collect(),
        Err(e) => {
            warn!(error = %e, "Goal lookup failed; unnamed goals keep their id");
            HashMap::new()
        }
    };
    goals
        .iter()
        .map(|goal| {
            if !goal.name.trim().is_empty() {
                return goal.clone();
            }
            let name = known
                .get(&goal.id)
                .cloned()
                .unwrap_or_else(|| goal.id.clone());
            GoalDefinition::new(goal.id.clone(), name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_and_free_use_different_prefixes() {
        let goals = vec![GoalDefinition::new("7", "Lead")];
        let paid = GoalMetricMap::build(&goals, "ym:ad:");
        let free = GoalMetricMap::build(&goals, "ym:s:");
        assert_eq!(paid.metrics()[0].name, "ym:ad:goal7visits");
        assert_eq!(free.metrics()[0].name, "ym:s:goal7visits");
        assert_eq!(free.metrics()[1].name, "ym:s:goal7conversionRate");
        assert_eq!(paid.metrics()[0].role, ColumnRole::Goal);
        assert_eq!(paid.metrics()[1].role, ColumnRole::Other);
        assert_eq!(paid.label("ym:ad:goal7visits"), Some("Goal completions: Lead"));
        assert_eq!(
            paid.label("ym:ad:goal7conversionRate"),
            Some("Goal conversion rate: Lead, %")
        );
    }

    #[test]
    fn no_goals_no_metrics() {
        assert!(GoalMetricMap::build(&[], "ym:s:").is_empty());
    }
}
