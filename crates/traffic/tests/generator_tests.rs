//! Integration tests for the traffic loop against stub endpoints

use monitor_lib::{CounterStore, Outcome, TrafficGenerator, TrafficSettings};
use std::time::Duration;

fn settings(model_url: String) -> TrafficSettings {
    TrafficSettings {
        model_url,
        request_timeout: Duration::from_secs(5),
        wait_min: Duration::from_millis(1),
        wait_max: Duration::from_millis(2),
    }
}

#[tokio::test]
async fn test_three_iterations_against_healthy_stub() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/invocations")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"predictions":[1]}"#)
        .expect(3)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let counters_path = dir.path().join("counters.json");
    let store = CounterStore::new(&counters_path);
    let mut generator =
        TrafficGenerator::new(settings(format!("{}/invocations", server.url())), store).unwrap();

    for _ in 0..3 {
        let outcome = generator.run_once().await;
        assert!(outcome.is_success());
        if let Outcome::Success { status, body, .. } = outcome {
            assert_eq!(status, 200);
            assert_eq!(body, r#"{"predictions":[1]}"#);
        }
    }

    let counters = *generator.counters();
    assert_eq!(counters.request_count, 3);
    assert_eq!(counters.error_count, 0);
    assert_eq!(counters.latency_count, 3);
    assert!(counters.latency_sum > 0.0);

    // A second process reading the file sees the same state.
    let mut reader = CounterStore::new(&counters_path);
    assert_eq!(*reader.load().unwrap(), counters);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_two_iterations_against_unreachable_endpoint() {
    // Nothing listens on port 1.
    let dir = tempfile::tempdir().unwrap();
    let counters_path = dir.path().join("counters.json");
    let store = CounterStore::new(&counters_path);
    let mut generator = TrafficGenerator::new(
        settings("http://127.0.0.1:1/invocations".to_string()),
        store,
    )
    .unwrap();

    for _ in 0..2 {
        let outcome = generator.run_once().await;
        assert!(matches!(outcome, Outcome::ConnectionError));
    }

    let counters = generator.counters();
    assert_eq!(counters.request_count, 2);
    assert_eq!(counters.error_count, 2);
    assert_eq!(counters.latency_count, 0);
    assert_eq!(counters.latency_sum, 0.0);

    // Failures are persisted like any other outcome.
    let mut reader = CounterStore::new(&counters_path);
    assert_eq!(reader.load().unwrap().error_count, 2);
}

#[tokio::test]
async fn test_error_status_counts_as_error_without_latency() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/invocations")
        .with_status(500)
        .with_body("model exploded")
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = CounterStore::new(dir.path().join("counters.json"));
    let mut generator =
        TrafficGenerator::new(settings(format!("{}/invocations", server.url())), store).unwrap();

    let outcome = generator.run_once().await;
    assert!(matches!(outcome, Outcome::ApplicationError { status: 500, .. }));

    let counters = generator.counters();
    assert_eq!(counters.request_count, 1);
    assert_eq!(counters.error_count, 1);
    assert_eq!(counters.latency_count, 0);
    assert_eq!(counters.average_latency(), None);
}

#[tokio::test]
async fn test_mixed_outcomes_accumulate() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/ok/invocations")
        .with_status(200)
        .with_body(r#"{"predictions":[0]}"#)
        .expect(2)
        .create_async()
        .await;
    let bad = server
        .mock("POST", "/bad/invocations")
        .with_status(503)
        .with_body("unavailable")
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let counters_path = dir.path().join("counters.json");

    // Two successes against one endpoint, then one failure from a second
    // generator that loads the same counters file first.
    let store = CounterStore::new(&counters_path);
    let mut generator =
        TrafficGenerator::new(settings(format!("{}/ok/invocations", server.url())), store)
            .unwrap();
    generator.run_once().await;
    generator.run_once().await;

    let after_successes = *generator.counters();
    assert_eq!(after_successes.request_count, 2);
    assert_eq!(after_successes.latency_count, 2);

    let mut store = CounterStore::new(&counters_path);
    store.load().unwrap();
    let mut generator =
        TrafficGenerator::new(settings(format!("{}/bad/invocations", server.url())), store)
            .unwrap();
    generator.run_once().await;

    let counters = generator.counters();
    assert_eq!(counters.request_count, 3);
    assert_eq!(counters.error_count, 1);
    assert_eq!(counters.latency_count, 2);

    ok.assert_async().await;
    bad.assert_async().await;
}
