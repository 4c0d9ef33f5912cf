use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use kbdebugger_core::{JobState, JobTicket};
use serde_json::Value;

use crate::client::{JobApi, Submission};
use crate::{ApiError, EngineEvent, FailureKind};

const FALLBACK_JOB_ERROR: &str = "Job failed";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls `job_id` until it reaches a terminal state.
///
/// Each poll waits for the previous request to settle, then sleeps for
/// `interval`. Every successful poll is reported to `sink`. A transport
/// failure ends the poll; there is no retry.
pub async fn poll_job(
    api: &dyn JobApi,
    ticket: JobTicket,
    job_id: &str,
    interval: Duration,
    sink: &dyn EventSink,
) -> Result<Value, ApiError> {
    let mut polls: u64 = 0;
    loop {
        let status = api.job_status(job_id).await?;
        polls += 1;
        let state = status.state;
        let (result, error) = (status.result.clone(), status.error.clone());
        sink.emit(EngineEvent::JobStatus {
            ticket,
            job_id: job_id.to_string(),
            status,
        });

        match state {
            JobState::Done => {
                engine_info!("Job {} ({}) done after {} polls", job_id, ticket.kind.label(), polls);
                return Ok(result.unwrap_or(Value::Null));
            }
            JobState::Error => return Err(job_error(error)),
            JobState::Queued | JobState::Running => {
                engine_debug!("Job {} still {:?}", job_id, state);
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Drives one unit of work from its submission answer to a single
/// [`EngineEvent::JobCompleted`].
pub async fn complete_job(
    api: &dyn JobApi,
    ticket: JobTicket,
    submission: Result<Submission, ApiError>,
    interval: Duration,
    sink: &dyn EventSink,
) {
    let (job_id, result) = match submission {
        Err(err) => (None, Err(err)),
        Ok(Submission::Finished(status)) => {
            let result = match status.state {
                JobState::Error => Err(job_error(status.error)),
                _ => Ok(status.result.unwrap_or(Value::Null)),
            };
            (None, result)
        }
        Ok(Submission::Queued(job_id)) => {
            sink.emit(EngineEvent::JobSubmitted {
                ticket,
                job_id: job_id.clone(),
            });
            let result = poll_job(api, ticket, &job_id, interval, sink).await;
            (Some(job_id), result)
        }
    };

    if let Err(err) = &result {
        engine_warn!("{} job {:?} failed: {}", ticket.kind.label(), job_id, err);
    }
    sink.emit(EngineEvent::JobCompleted {
        ticket,
        job_id,
        result,
    });
}

fn job_error(error: Option<String>) -> ApiError {
    let message = error
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| FALLBACK_JOB_ERROR.to_string());
    ApiError::new(FailureKind::JobFailed, message)
}
