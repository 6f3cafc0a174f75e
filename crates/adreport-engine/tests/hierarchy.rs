mod common;

use std::sync::Arc;
use std::time::Duration;

use adreport_core::config::Config;
use adreport_core::provider::DataQuery;
use adreport_core::report::TrafficKind;
use adreport_engine::catalog::FREE_PROFILE;
use adreport_engine::goals::GoalMetricMap;
use adreport_engine::hierarchy::{fetch_hierarchy, HierarchyRequest};
use adreport_engine::layout::ReportLayout;
use adreport_engine::planner::plan;
use adreport_engine::strategy::free;
use adreport_engine::BatchingClient;
use common::{empty_response, range, response_for, server_error, spec, ScriptedClient};

fn visits_layout() -> (ReportLayout, Vec<String>) {
    let mut spec = spec(TrafficKind::Free);
    spec.selected_attributes = vec!["visits".to_string()];
    let goals = GoalMetricMap::build(&[], FREE_PROFILE.goal_prefix);
    let planned = plan(
        &FREE_PROFILE.base(),
        goals.metrics(),
        &spec.selected_attributes,
        &FREE_PROFILE.attribute_map(),
    );
    let layout = ReportLayout::new(free::COLUMN_LABEL, &FREE_PROFILE, &planned, &goals, &spec);
    (layout, planned.names())
}

fn request(metrics: Vec<String>) -> HierarchyRequest {
    HierarchyRequest {
        main_dimension: free::MAIN_DIMENSION.to_string(),
        detail_dimension: Some(free::DETAIL_DIMENSION.to_string()),
        metrics,
        date_range: range(),
        main_filter: None,
        client_scope: None,
    }
}

fn is_main(query: &DataQuery) -> bool {
    query.dimensions[0] == free::MAIN_DIMENSION
}

fn detail_of(query: &DataQuery, key: &str) -> bool {
    query.filter.as_deref() == Some(free::detail_filter(key).as_str())
}

fn labels(rows: &[Vec<adreport_core::report::Cell>]) -> Vec<String> {
    rows.iter()
        .map(|row| row[0].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn detail_rows_follow_their_main_row() {
    let client = Arc::new(ScriptedClient::new(|q| {
        Ok(if is_main(q) {
            response_for(q, &["M1", "M2"], |_, _| 10.0)
        } else if detail_of(q, "M1") {
            response_for(q, &["D1", "D2"], |_, _| 5.0)
        } else {
            empty_response(q)
        })
    }));
    let batching = BatchingClient::new(client.clone(), &Config::default());
    let (layout, metrics) = visits_layout();

    let (headers, rows) = fetch_hierarchy(
        &batching,
        &layout,
        &request(metrics),
        |key| Some(free::detail_filter(key)),
        5,
    )
    .await
    .expect("hierarchy");

    assert_eq!(headers, vec!["Traffic source", "Visits"]);
    assert_eq!(labels(&rows), vec!["M1", "  D1", "  D2", "M2"]);
    assert!(rows.iter().all(|r| r.len() == headers.len()));
    assert_eq!(client.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn order_holds_when_later_details_finish_first() {
    let client = Arc::new(
        ScriptedClient::new(|q| {
            Ok(if is_main(q) {
                response_for(q, &["M1", "M2"], |_, _| 1.0)
            } else if detail_of(q, "M1") {
                response_for(q, &["slow"], |_, _| 1.0)
            } else {
                response_for(q, &["fast"], |_, _| 1.0)
            })
        })
        .with_delay_fn(|q| {
            if detail_of(q, "M1") {
                Duration::from_millis(500)
            } else {
                Duration::from_millis(10)
            }
        }),
    );
    let batching = BatchingClient::new(client, &Config::default());
    let (layout, metrics) = visits_layout();

    let (_, rows) = fetch_hierarchy(
        &batching,
        &layout,
        &request(metrics),
        |key| Some(free::detail_filter(key)),
        5,
    )
    .await
    .expect("hierarchy");

    assert_eq!(labels(&rows), vec!["M1", "  slow", "M2", "  fast"]);
}

#[tokio::test]
async fn failed_detail_fetch_keeps_main_row() {
    let client = Arc::new(ScriptedClient::new(|q| {
        if is_main(q) {
            Ok(response_for(q, &["M1", "M2"], |_, _| 1.0))
        } else if detail_of(q, "M1") {
            Err(server_error())
        } else {
            Ok(response_for(q, &["D3"], |_, _| 1.0))
        }
    }));
    let batching = BatchingClient::new(client, &Config::default());
    let (layout, metrics) = visits_layout();

    let (_, rows) = fetch_hierarchy(
        &batching,
        &layout,
        &request(metrics),
        |key| Some(free::detail_filter(key)),
        5,
    )
    .await
    .expect("hierarchy");

    assert_eq!(labels(&rows), vec!["M1", "M2", "  D3"]);
}

#[tokio::test]
async fn failed_main_fetch_fails() {
    let client = Arc::new(ScriptedClient::new(|_| Err(server_error())));
    let batching = BatchingClient::new(client, &Config::default());
    let (layout, metrics) = visits_layout();

    let result = fetch_hierarchy(
        &batching,
        &layout,
        &request(metrics),
        |key| Some(free::detail_filter(key)),
        5,
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn detail_fetches_are_bounded() {
    let keys: Vec<String> = (0..12).map(|i| format!("M{i}")).collect();
    let main_keys = keys.clone();
    let client = Arc::new(
        ScriptedClient::new(move |q| {
            if is_main(q) {
                let keys: Vec<&str> = main_keys.iter().map(String::as_str).collect();
                Ok(response_for(q, &keys, |_, _| 1.0))
            } else {
                Ok(response_for(q, &["detail"], |_, _| 1.0))
            }
        })
        .with_delay(Duration::from_millis(100)),
    );
    let batching = BatchingClient::new(client.clone(), &Config::default());
    let (layout, metrics) = visits_layout();

    let (_, rows) = fetch_hierarchy(
        &batching,
        &layout,
        &request(metrics),
        |key| Some(free::detail_filter(key)),
        5,
    )
    .await
    .expect("hierarchy");

    assert_eq!(rows.len(), 24);
    assert_eq!(client.call_count(), 13);
    assert_eq!(client.max_in_flight(), 5);
}

#[tokio::test]
async fn without_detail_dimension_only_main_rows_are_returned() {
    let client = Arc::new(ScriptedClient::new(|q| {
        Ok(response_for(q, &["M1", "M2"], |_, _| 3.0))
    }));
    let batching = BatchingClient::new(client.clone(), &Config::default());
    let (layout, metrics) = visits_layout();
    let request = HierarchyRequest {
        detail_dimension: None,
        ..request(metrics)
    };

    let (_, rows) = fetch_hierarchy(&batching, &layout, &request, |_| None, 5)
        .await
        .expect("hierarchy");

    assert_eq!(labels(&rows), vec!["M1", "M2"]);
    assert_eq!(client.call_count(), 1);
}
