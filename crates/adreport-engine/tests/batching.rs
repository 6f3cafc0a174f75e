mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adreport_core::config::Config;
use adreport_core::error::ProviderError;
use adreport_core::provider::{DataQuery, ProviderResponse};
use adreport_engine::BatchingClient;
use common::{range, response_for, server_error, ScriptedClient};

fn metric_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("m{i}")).collect()
}

fn metric_index(metric: &str) -> f64 {
    metric
        .trim_start_matches('m')
        .parse::<f64>()
        .expect("numeric metric")
}

/// Row `x` carries the metric index, row `y` the index plus 1000.
fn indexed(query: &DataQuery) -> ProviderResponse {
    response_for(query, &["x", "y"], |key, metric| {
        metric_index(metric) + if key == "y" { 1000.0 } else { 0.0 }
    })
}

fn query(n: usize) -> DataQuery {
    DataQuery::new(vec!["ym:s:lastSignTrafficSource".to_string()], metric_names(n), range())
}

#[tokio::test]
async fn small_request_is_sent_once() {
    let client = Arc::new(ScriptedClient::new(|q| Ok(indexed(q))));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let response = batching.fetch(&query(20)).await.expect("fetch");

    assert_eq!(client.call_count(), 1);
    assert_eq!(response.metrics, metric_names(20));
}

#[tokio::test]
async fn batches_reassemble_in_original_order() {
    let client = Arc::new(ScriptedClient::new(|q| Ok(indexed(q))));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let response = batching.fetch(&query(45)).await.expect("fetch");

    let sizes: Vec<usize> = client.calls().iter().map(|q| q.metrics.len()).collect();
    assert_eq!(sizes, vec![20, 20, 5]);
    assert_eq!(response.metrics, metric_names(45));
    assert_eq!(response.rows.len(), 2);
    for (row, offset) in response.rows.iter().zip([0.0, 1000.0]) {
        let expected: Vec<Option<f64>> = (0..45).map(|i| Some(i as f64 + offset)).collect();
        assert_eq!(row.metrics, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_retried_with_fixed_delay() {
    let failures = AtomicUsize::new(0);
    let client = Arc::new(ScriptedClient::new(move |q| {
        if failures.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(ProviderError::Timeout)
        } else {
            Ok(indexed(q))
        }
    }));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let started = tokio::time::Instant::now();
    let response = batching.fetch(&query(3)).await.expect("fetch");

    assert_eq!(client.call_count(), 3);
    assert_eq!(response.rows.len(), 2);
    assert!(started.elapsed() >= std::time::Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn exhausted_timeouts_fail_the_fetch() {
    let client = Arc::new(ScriptedClient::new(|_| Err(ProviderError::Timeout)));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let err = batching.fetch(&query(3)).await.expect_err("should fail");

    assert_eq!(err, ProviderError::Timeout);
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let client = Arc::new(ScriptedClient::new(|_| Err(server_error())));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let err = batching.fetch(&query(3)).await.expect_err("should fail");

    assert!(matches!(err, ProviderError::Status { status: 500, .. }));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn failed_first_batch_fails_the_fetch() {
    let client = Arc::new(ScriptedClient::new(|q| {
        if q.metrics[0] == "m0" {
            Err(server_error())
        } else {
            Ok(indexed(q))
        }
    }));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    assert!(batching.fetch(&query(45)).await.is_err());
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn failed_middle_batch_leaves_its_metrics_absent() {
    let client = Arc::new(ScriptedClient::new(|q| {
        if q.metrics[0] == "m20" {
            Err(server_error())
        } else {
            Ok(indexed(q))
        }
    }));
    let batching = BatchingClient::new(client.clone(), &Config::default());

    let response = batching.fetch(&query(45)).await.expect("fetch");

    assert_eq!(client.call_count(), 3);
    let expected_names: Vec<String> = metric_names(45)
        .into_iter()
        .filter(|m| !(20..40).contains(&(metric_index(m) as usize)))
        .collect();
    assert_eq!(response.metrics, expected_names);
    for row in &response.rows {
        assert_eq!(row.metrics.len(), 25);
        let offset = if row.key() == "y" { 1000.0 } else { 0.0 };
        assert_eq!(row.metrics[20], Some(40.0 + offset));
    }
}

#[tokio::test]
async fn batch_with_different_row_count_is_dropped() {
    let client = Arc::new(ScriptedClient::new(|q| {
        if q.metrics[0] == "m20" {
            Ok(response_for(q, &["x"], |_, _| 1.0))
        } else {
            Ok(indexed(q))
        }
    }));
    let batching = BatchingClient::new(client, &Config::default());

    let response = batching.fetch(&query(30)).await.expect("fetch");

    assert_eq!(response.metrics, metric_names(20));
    assert!(response.rows.iter().all(|r| r.metrics.len() == 20));
}
