use serde::{Deserialize, Serialize};

/// Opaque identifier handed out by the job-queue service.
pub type JobId = String;

/// Which flow a remote job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Pipeline,
    TripletExtraction,
    Upsert,
}

impl JobKind {
    pub fn label(self) -> &'static str {
        match self {
            JobKind::Pipeline => "pipeline",
            JobKind::TripletExtraction => "triplet extraction",
            JobKind::Upsert => "knowledge graph upsert",
        }
    }
}

/// Identifies one submission made by this client. `generation` is bumped on
/// every submission, so events from an abandoned job never match a newer one
/// of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobTicket {
    pub kind: JobKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Queued,
    Running,
    Done,
    Error,
}

impl JobState {
    /// `done` and `error` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Error)
    }
}

/// Raw numerator/denominator reported by the service. Either side may be
/// missing or non-numeric, in which case it deserializes to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JobCounts {
    #[serde(default, deserialize_with = "lenient_number")]
    pub current: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total: Option<f64>,
}

/// Status document returned by `GET /api/pipeline/jobs/:id`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: Option<JobCounts>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<serde_json::Value>,
}

impl JobStatus {
    pub fn current(&self) -> Option<f64> {
        self.progress.and_then(|p| p.current)
    }

    pub fn total(&self) -> Option<f64> {
        self.progress.and_then(|p| p.total)
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}
