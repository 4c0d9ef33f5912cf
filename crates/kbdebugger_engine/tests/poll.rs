use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kbdebugger_core::{
    JobId, JobKind, JobState, JobStatus, JobTicket, SubgraphPayload, UpsertRequest, VerifyPanes,
};
use kbdebugger_engine::{
    complete_job, poll_job, ApiError, ApiSettings, EngineEvent, EventSink, FailureKind, JobApi,
    ReqwestApi, Submission,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAST: Duration = Duration::from_millis(5);

fn ticket(kind: JobKind) -> JobTicket {
    JobTicket {
        kind,
        generation: 1,
    }
}

#[derive(Default, Clone)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    fn completions(&self) -> Vec<EngineEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, EngineEvent::JobCompleted { .. }))
            .collect()
    }

    fn status_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, EngineEvent::JobStatus { .. }))
            .count()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Answers `job_status` from a script; the last answer repeats.
struct ScriptedApi {
    script: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    calls: Mutex<usize>,
}

impl ScriptedApi {
    fn new(script: Vec<Result<JobStatus, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

fn status(state: JobState) -> JobStatus {
    JobStatus {
        state,
        ..JobStatus::default()
    }
}

fn unused<T>() -> Result<T, ApiError> {
    panic!("not used by the poll loop")
}

#[async_trait::async_trait]
impl JobApi for ScriptedApi {
    async fn search_keywords(&self) -> Result<Vec<String>, ApiError> {
        unused()
    }

    async fn subgraph(&self, _keyword: &str) -> Result<SubgraphPayload, ApiError> {
        unused()
    }

    async fn run_pipeline(&self, _keyword: &str, _document: &Path) -> Result<JobId, ApiError> {
        unused()
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobStatus, ApiError> {
        *self.calls.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }

    async fn triplet_extraction(&self, _qualities: &[String]) -> Result<JobId, ApiError> {
        unused()
    }

    async fn upsert(&self, _request: &UpsertRequest) -> Result<Submission, ApiError> {
        unused()
    }

    async fn search_node(&self, _name: &str) -> Result<Vec<String>, ApiError> {
        unused()
    }

    async fn upload_verify(&self, _document: &Path) -> Result<VerifyPanes, ApiError> {
        unused()
    }
}

#[tokio::test]
async fn polls_until_done_and_returns_result() {
    let mut done = status(JobState::Done);
    done.result = Some(json!({"NoveltyLLM": {"results": []}}));
    let api = ScriptedApi::new(vec![
        Ok(status(JobState::Queued)),
        Ok(status(JobState::Running)),
        Ok(status(JobState::Running)),
        Ok(done),
    ]);
    let sink = TestSink::default();

    let result = poll_job(&api, ticket(JobKind::Pipeline), "j1", FAST, &sink).await;

    assert_eq!(result, Ok(json!({"NoveltyLLM": {"results": []}})));
    assert_eq!(api.calls(), 4);
    assert_eq!(sink.status_count(), 4);
}

#[tokio::test]
async fn done_without_result_yields_null() {
    let api = ScriptedApi::new(vec![Ok(status(JobState::Done))]);
    let sink = TestSink::default();

    let result = poll_job(&api, ticket(JobKind::Upsert), "j1", FAST, &sink).await;
    assert_eq!(result, Ok(serde_json::Value::Null));
}

#[tokio::test]
async fn error_state_uses_reported_message_or_fallback() {
    let mut failed = status(JobState::Error);
    failed.error = Some("LLM quota exceeded".to_string());
    let api = ScriptedApi::new(vec![Ok(status(JobState::Running)), Ok(failed)]);
    let sink = TestSink::default();
    let err = poll_job(&api, ticket(JobKind::Pipeline), "j1", FAST, &sink)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::JobFailed);
    assert_eq!(err.to_string(), "LLM quota exceeded");

    let mut blank = status(JobState::Error);
    blank.error = Some("   ".to_string());
    let api = ScriptedApi::new(vec![Ok(blank)]);
    let err = poll_job(&api, ticket(JobKind::Pipeline), "j2", FAST, &sink)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Job failed");
}

#[tokio::test]
async fn transport_failure_stops_polling() {
    let network = ApiError {
        kind: FailureKind::Network,
        message: "connection refused".to_string(),
    };
    let api = ScriptedApi::new(vec![
        Ok(status(JobState::Running)),
        Err(network.clone()),
        Ok(status(JobState::Done)),
    ]);
    let sink = TestSink::default();

    let result = poll_job(&api, ticket(JobKind::TripletExtraction), "j1", FAST, &sink).await;

    assert_eq!(result, Err(network));
    assert_eq!(api.calls(), 2);
    assert_eq!(sink.status_count(), 1);
}

#[tokio::test]
async fn queued_submission_reports_once_with_job_id() {
    let api = ScriptedApi::new(vec![Ok(status(JobState::Running)), Ok(status(JobState::Done))]);
    let sink = TestSink::default();

    complete_job(
        &api,
        ticket(JobKind::TripletExtraction),
        Ok(Submission::Queued("j7".to_string())),
        FAST,
        &sink,
    )
    .await;

    let events = sink.events();
    assert_eq!(
        events.first(),
        Some(&EngineEvent::JobSubmitted {
            ticket: ticket(JobKind::TripletExtraction),
            job_id: "j7".to_string(),
        })
    );
    assert_eq!(
        sink.completions(),
        vec![EngineEvent::JobCompleted {
            ticket: ticket(JobKind::TripletExtraction),
            job_id: Some("j7".to_string()),
            result: Ok(serde_json::Value::Null),
        }]
    );
    assert!(matches!(events.last(), Some(EngineEvent::JobCompleted { .. })));
}

#[tokio::test]
async fn finished_submission_skips_polling() {
    let api = ScriptedApi::new(vec![Ok(status(JobState::Running))]);
    let sink = TestSink::default();
    let mut done = status(JobState::Done);
    done.result = Some(json!({"upserted": 2}));

    complete_job(
        &api,
        ticket(JobKind::Upsert),
        Ok(Submission::Finished(done)),
        FAST,
        &sink,
    )
    .await;

    assert_eq!(api.calls(), 0);
    assert_eq!(
        sink.events(),
        vec![EngineEvent::JobCompleted {
            ticket: ticket(JobKind::Upsert),
            job_id: None,
            result: Ok(json!({"upserted": 2})),
        }]
    );
}

#[tokio::test]
async fn rejected_submission_completes_with_error() {
    let api = ScriptedApi::new(vec![Ok(status(JobState::Running))]);
    let sink = TestSink::default();
    let rejected = ApiError {
        kind: FailureKind::Application,
        message: "No document uploaded".to_string(),
    };

    complete_job(&api, ticket(JobKind::Pipeline), Err(rejected.clone()), FAST, &sink).await;

    assert_eq!(api.calls(), 0);
    assert_eq!(
        sink.events(),
        vec![EngineEvent::JobCompleted {
            ticket: ticket(JobKind::Pipeline),
            job_id: None,
            result: Err(rejected),
        }]
    );
}

#[tokio::test]
async fn polls_http_service_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/jobs/j9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "running", "stage": "NoveltyLLM", "message": "Comparing",
            "progress": {"current": 3, "total": 10}
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/jobs/j9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "done", "stage": "NoveltyLLM", "message": "Finished",
            "result": {"NoveltyLLM": {"results": [{"quality": "q"}]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = ReqwestApi::new(&ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .unwrap();
    let sink = TestSink::default();

    let result = poll_job(&api, ticket(JobKind::Pipeline), "j9", FAST, &sink)
        .await
        .unwrap();

    assert_eq!(result["NoveltyLLM"]["results"][0]["quality"], "q");
    let first = sink.events().into_iter().next().unwrap();
    let EngineEvent::JobStatus { status, .. } = first else {
        panic!("expected a status event first");
    };
    assert_eq!(status.stage, "NoveltyLLM");
    assert_eq!(status.current(), Some(3.0));
    assert_eq!(status.total(), Some(10.0));
}
