use std::fmt;
use std::path::PathBuf;

use kbdebugger_core::{JobId, JobStatus, JobTicket, RequestId, SubgraphPayload, VerifyPanes};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    KeywordsLoaded(Result<Vec<String>, ApiError>),
    /// Only emitted for requests that were not superseded.
    SubgraphLoaded {
        request: RequestId,
        keyword: String,
        result: Result<SubgraphPayload, ApiError>,
    },
    JobSubmitted {
        ticket: JobTicket,
        job_id: JobId,
    },
    JobStatus {
        ticket: JobTicket,
        job_id: JobId,
        status: JobStatus,
    },
    /// Emitted exactly once per submitted unit of work.
    JobCompleted {
        ticket: JobTicket,
        job_id: Option<JobId>,
        result: Result<serde_json::Value, ApiError>,
    },
    NodeDetails {
        name: String,
        result: Result<Vec<String>, ApiError>,
    },
    VerifyLoaded(Result<VerifyPanes, ApiError>),
    ExportWritten(Result<PathBuf, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            // The service's own message is what the user needs to see.
            FailureKind::Application | FailureKind::JobFailed => f.write_str(&self.message),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Response body was not the expected JSON shape.
    Decode,
    /// The service answered with an `{error}` body.
    Application,
    /// The job reached the `error` state.
    JobFailed,
    EmptyDocument,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::Application => write!(f, "service error"),
            FailureKind::JobFailed => write!(f, "job failed"),
            FailureKind::EmptyDocument => write!(f, "empty document"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
