use std::time::Duration;

use kbdebugger_core::{Extraction, JobState, UpsertRequest};
use kbdebugger_engine::{ApiSettings, FailureKind, JobApi, ReqwestApi, Submission};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestApi {
    ReqwestApi::new(&ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .expect("api")
}

#[tokio::test]
async fn search_keywords_returns_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/search-keywords"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"keywords": ["Transparency", "Privacy"]})),
        )
        .mount(&server)
        .await;

    let keywords = api_for(&server).search_keywords().await.expect("keywords");
    assert_eq!(keywords, vec!["Transparency", "Privacy"]);
}

#[tokio::test]
async fn error_body_becomes_application_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/subgraph"))
        .and(query_param("keyword", "Unknown"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Keyword not allowed"})),
        )
        .mount(&server)
        .await;

    let err = api_for(&server).subgraph("Unknown").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Application);
    assert_eq!(err.to_string(), "Keyword not allowed");
}

#[tokio::test]
async fn bare_http_failure_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/jobs/abc"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = api_for(&server).job_status("abc").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/search-keywords"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"keywords": []})),
        )
        .mount(&server)
        .await;

    let api = ReqwestApi::new(&ApiSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ApiSettings::default()
    })
    .expect("api");
    let err = api.search_keywords().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn subgraph_parses_cytoscape_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/graph/subgraph"))
        .and(query_param("keyword", "Human agency and oversight"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": {
                "nodes": [{"data": {"id": "a", "label": "AI system"}}, {"data": {"id": "b", "label": "human"}}],
                "edges": [{"data": {"id": "e0", "source": "a", "target": "b", "label": "overseen_by",
                    "properties": {"sentence": "AI systems are overseen by humans.", "page_number": 3}}}]
            }
        })))
        .mount(&server)
        .await;

    let payload = api_for(&server)
        .subgraph("Human agency and oversight")
        .await
        .expect("subgraph");
    assert_eq!(payload.node_count(), 2);
    assert_eq!(payload.edge_count(), 1);
    assert_eq!(
        payload.sentence_records()[0].sentence,
        "AI systems are overseen by humans."
    );
}

#[tokio::test]
async fn pipeline_run_uploads_document_with_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .and(query_param("keyword", "Transparency"))
        .and(body_string_contains("name=\"document\""))
        .and(body_string_contains("%PDF-1.4 fake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "f00d"})))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let document = temp.path().join("report.pdf");
    std::fs::write(&document, "%PDF-1.4 fake").unwrap();

    let job_id = api_for(&server)
        .run_pipeline("Transparency", &document)
        .await
        .expect("job id");
    assert_eq!(job_id, "f00d");
}

#[tokio::test]
async fn empty_document_is_rejected_before_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "never"})))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let document = temp.path().join("empty.pdf");
    std::fs::write(&document, "").unwrap();

    let err = api_for(&server)
        .run_pipeline("Transparency", &document)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::EmptyDocument);

    let missing = api_for(&server)
        .run_pipeline("Transparency", &temp.path().join("missing.pdf"))
        .await
        .unwrap_err();
    assert_eq!(missing.kind, FailureKind::Io);
}

#[tokio::test]
async fn triplet_extraction_posts_selected_qualities() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/triplet-extraction"))
        .and(body_json(json!({"selected_qualities": ["q1", "q2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j2"})))
        .mount(&server)
        .await;

    let job_id = api_for(&server)
        .triplet_extraction(&["q1".to_string(), "q2".to_string()])
        .await
        .expect("job id");
    assert_eq!(job_id, "j2");
}

fn upsert_request() -> UpsertRequest {
    UpsertRequest {
        extractions: vec![Extraction {
            sentence: "A.".to_string(),
            triplets: vec![["x".to_string(), "y".to_string(), "rel".to_string()]],
        }],
        source: Some("ui/temp_uploads/a.pdf".to_string()),
    }
}

#[tokio::test]
async fn upsert_sends_wire_order_and_accepts_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/upsert"))
        .and(body_json(json!({
            "extractions": [{"sentence": "A.", "triplets": [["x", "y", "rel"]]}],
            "source": "ui/temp_uploads/a.pdf"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j3"})))
        .mount(&server)
        .await;

    let submission = api_for(&server).upsert(&upsert_request()).await.expect("upsert");
    assert_eq!(submission, Submission::Queued("j3".to_string()));
}

#[tokio::test]
async fn upsert_accepts_terminal_job_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "done", "stage": "KnowledgeGraphUpsert", "message": "ok",
            "result": {"upserted": 1}
        })))
        .mount(&server)
        .await;

    let submission = api_for(&server).upsert(&upsert_request()).await.expect("upsert");
    let Submission::Finished(status) = submission else {
        panic!("expected a finished job");
    };
    assert_eq!(status.state, JobState::Done);
    assert_eq!(status.result, Some(json!({"upserted": 1})));
}

#[tokio::test]
async fn search_node_reports_details_or_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search_node"))
        .and(body_json(json!({"name": "AI Act"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"details": ["regulates AI", 7]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search_node"))
        .and(body_json(json!({"name": "nothing"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Node not found"})))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let details = api.search_node("AI Act").await.expect("details");
    assert_eq!(details, vec!["regulates AI", "7"]);

    let err = api.search_node("nothing").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Application);
    assert_eq!(err.message, "Node not found");
}

#[tokio::test]
async fn upload_verify_returns_three_panes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload_verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "existing": "old facts", "partial": "some", "new": "fresh"
        })))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let document = temp.path().join("doc.txt");
    std::fs::write(&document, "content").unwrap();

    let panes = api_for(&server).upload_verify(&document).await.expect("panes");
    assert_eq!(panes.existing, "old facts");
    assert_eq!(panes.partial, "some");
    assert_eq!(panes.new, "fresh");
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = ReqwestApi::new(&ApiSettings {
        base_url: "not a url".to_string(),
        ..ApiSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
