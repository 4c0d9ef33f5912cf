use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use kbdebugger_core::{JobId, JobStatus, SubgraphPayload, UpsertRequest, VerifyPanes};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::{ApiError, FailureKind};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5002".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// What a submission endpoint answered with.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Work was queued; poll this id.
    Queued(JobId),
    /// The service already finished the work and returned a terminal status.
    Finished(JobStatus),
}

/// HTTP contract of the KBDebugger service.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn search_keywords(&self) -> Result<Vec<String>, ApiError>;

    async fn subgraph(&self, keyword: &str) -> Result<SubgraphPayload, ApiError>;

    async fn run_pipeline(&self, keyword: &str, document: &Path) -> Result<JobId, ApiError>;

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError>;

    async fn triplet_extraction(&self, qualities: &[String]) -> Result<JobId, ApiError>;

    async fn upsert(&self, request: &UpsertRequest) -> Result<Submission, ApiError>;

    async fn search_node(&self, name: &str) -> Result<Vec<String>, ApiError>;

    async fn upload_verify(&self, document: &Path) -> Result<VerifyPanes, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and decodes a JSON body, folding every failure into
    /// an [`ApiError`].
    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let body = self.send_value(request).await?;
        serde_json::from_value(body).map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn send_value(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            return Err(match body.as_ref().and_then(application_error) {
                Some(message) => ApiError::new(FailureKind::Application, message),
                None => ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string()),
            });
        }
        body.ok_or_else(|| ApiError::new(FailureKind::Decode, "response body is not JSON"))
    }

    async fn document_part(document: &Path) -> Result<Part, ApiError> {
        let bytes = tokio::fs::read(document).await.map_err(|err| {
            ApiError::new(FailureKind::Io, format!("{}: {err}", document.display()))
        })?;
        if bytes.is_empty() {
            return Err(ApiError::new(
                FailureKind::EmptyDocument,
                format!("{} is empty", document.display()),
            ));
        }
        let file_name = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Part::bytes(bytes).file_name(file_name))
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestApi {
    async fn search_keywords(&self) -> Result<Vec<String>, ApiError> {
        #[derive(serde::Deserialize)]
        struct Keywords {
            keywords: Vec<String>,
        }
        let url = self.endpoint(&["api", "graph", "search-keywords"])?;
        let body: Keywords = self.send(self.client.get(url)).await?;
        Ok(body.keywords)
    }

    async fn subgraph(&self, keyword: &str) -> Result<SubgraphPayload, ApiError> {
        let mut url = self.endpoint(&["api", "graph", "subgraph"])?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        engine_debug!("GET subgraph keyword={}", keyword);
        self.send(self.client.get(url)).await
    }

    async fn run_pipeline(&self, keyword: &str, document: &Path) -> Result<JobId, ApiError> {
        let part = Self::document_part(document).await?;
        let mut url = self.endpoint(&["api", "pipeline", "run"])?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        engine_info!(
            "Submitting pipeline run keyword={} document={}",
            keyword,
            document.display()
        );
        let body = self
            .send_value(self.client.post(url).multipart(Form::new().part("document", part)))
            .await?;
        job_id_of(&body)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        let url = self.endpoint(&["api", "pipeline", "jobs", job_id])?;
        self.send(self.client.get(url)).await
    }

    async fn triplet_extraction(&self, qualities: &[String]) -> Result<JobId, ApiError> {
        let url = self.endpoint(&["api", "pipeline", "triplet-extraction"])?;
        engine_info!("Submitting triplet extraction for {} qualities", qualities.len());
        let body = self
            .send_value(
                self.client
                    .post(url)
                    .json(&json!({ "selected_qualities": qualities })),
            )
            .await?;
        job_id_of(&body)
    }

    async fn upsert(&self, request: &UpsertRequest) -> Result<Submission, ApiError> {
        let url = self.endpoint(&["api", "pipeline", "upsert"])?;
        engine_info!(
            "Submitting upsert of {} triplets across {} sentences",
            request.triplet_count(),
            request.extractions.len()
        );
        let body = self.send_value(self.client.post(url).json(request)).await?;
        if let Ok(job_id) = job_id_of(&body) {
            return Ok(Submission::Queued(job_id));
        }
        let status: JobStatus = serde_json::from_value(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        if status.state.is_terminal() {
            Ok(Submission::Finished(status))
        } else {
            Err(ApiError::new(
                FailureKind::Decode,
                "upsert response has neither a job_id nor a terminal state",
            ))
        }
    }

    async fn search_node(&self, name: &str) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["api", "search_node"])?;
        let body = self
            .send_value(self.client.post(url).json(&json!({ "name": name })))
            .await?;
        if let Some(message) = application_error(&body) {
            return Err(ApiError::new(FailureKind::Application, message));
        }
        let details = body
            .get("details")
            .and_then(Value::as_array)
            .ok_or_else(|| ApiError::new(FailureKind::Decode, "missing details"))?;
        Ok(details
            .iter()
            .map(|detail| match detail {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect())
    }

    async fn upload_verify(&self, document: &Path) -> Result<VerifyPanes, ApiError> {
        let part = Self::document_part(document).await?;
        let url = self.endpoint(&["api", "upload_verify"])?;
        self.send(self.client.post(url).multipart(Form::new().part("document", part)))
            .await
    }
}

fn application_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

fn job_id_of(body: &Value) -> Result<JobId, ApiError> {
    body.get("job_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ApiError::new(FailureKind::Decode, "response has no job_id"))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
