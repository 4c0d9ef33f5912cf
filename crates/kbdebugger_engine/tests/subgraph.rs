use std::sync::Arc;
use std::time::Duration;

use kbdebugger_engine::{fetch_subgraph, ApiSettings, LatestRequest, ReqwestApi};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(node: &str) -> serde_json::Value {
    json!({"elements": {"nodes": [{"data": {"id": node, "label": node}}], "edges": []}})
}

#[tokio::test]
async fn newer_request_supersedes_slow_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/subgraph"))
        .and(query_param("keyword", "Privacy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(payload("privacy")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/graph/subgraph"))
        .and(query_param("keyword", "Fairness"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("fairness")))
        .mount(&server)
        .await;

    let api = Arc::new(
        ReqwestApi::new(&ApiSettings {
            base_url: server.uri(),
            ..ApiSettings::default()
        })
        .unwrap(),
    );
    let latest = LatestRequest::new();

    let first = latest.supersede();
    let slow = tokio::spawn({
        let api = api.clone();
        let token = first.clone();
        async move { fetch_subgraph(api.as_ref(), "Privacy", &token).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = latest.supersede();
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    assert!(slow.await.unwrap().is_none());
    let fresh = fetch_subgraph(api.as_ref(), "Fairness", &second)
        .await
        .expect("not superseded")
        .expect("subgraph");
    assert_eq!(fresh.elements.nodes[0].data.id, "fairness");
}

#[tokio::test]
async fn cancelled_token_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/subgraph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload("x")))
        .expect(0)
        .mount(&server)
        .await;

    let api = ReqwestApi::new(&ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .unwrap();
    let latest = LatestRequest::new();
    let stale = latest.supersede();
    let _current = latest.supersede();

    assert!(fetch_subgraph(&api, "Privacy", &stale).await.is_none());
}
