//! Integration tests for the label fetcher using wiremock

use qamask::utils::error::FetchError;
use qamask::utils::retry::RetryConfig;
use qamask::wikidata::LabelFetcher;
use std::collections::BTreeSet;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn identifiers(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| (*s).to_string()).collect()
}

fn fast_fetcher(endpoint: &str) -> LabelFetcher {
    LabelFetcher::with_config(
        endpoint,
        "qamask-tests/0.1",
        Duration::from_millis(1),
        RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
        },
        Duration::from_secs(5),
    )
    .unwrap()
}

fn bindings_json(rows: &[(&str, &str)]) -> serde_json::Value {
    let bindings: Vec<serde_json::Value> = rows
        .iter()
        .map(|(id, label)| {
            serde_json::json!({
                "id": {"type": "literal", "value": id},
                "label": {"type": "literal", "xml:lang": "en", "value": label}
            })
        })
        .collect();
    serde_json::json!({
        "head": {"vars": ["id", "label"]},
        "results": {"bindings": bindings}
    })
}

#[tokio::test]
async fn test_fetch_labels_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_param_contains("query", "wd:Q42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bindings_json(&[
            ("Q42", "Douglas Adams"),
            ("Q42", "DNA"),
            ("P57", "director"),
        ])))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(&format!("{}/sparql", mock_server.uri()));
    let labels = fetcher
        .fetch_labels(&identifiers(&["Q42", "P57", "Q999"]), "en")
        .await
        .unwrap();

    assert_eq!(
        labels["Q42"],
        vec!["Douglas Adams".to_string(), "DNA".to_string()]
    );
    assert_eq!(labels["P57"], vec!["director".to_string()]);
    // Identifiers without bindings keep an empty label list.
    assert!(labels["Q999"].is_empty());
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let mock_server = MockServer::start().await;

    // Answer 429 twice, then succeed.
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bindings_json(&[("Q1", "one")])))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(&format!("{}/sparql", mock_server.uri()));
    let labels = fetcher.fetch_labels(&identifiers(&["Q1"]), "en").await.unwrap();
    assert_eq!(labels["Q1"], vec!["one".to_string()]);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(&format!("{}/sparql", mock_server.uri()));
    let err = fetcher
        .fetch_labels(&identifiers(&["Q1"]), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ServerError(400)));
}

#[tokio::test]
async fn test_malformed_response_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let fetcher = fast_fetcher(&format!("{}/sparql", mock_server.uri()));
    let err = fetcher
        .fetch_labels(&identifiers(&["Q1"]), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_invalid_endpoint_is_rejected() {
    let err = LabelFetcher::new("not a url", "qamask-tests/0.1").unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}
