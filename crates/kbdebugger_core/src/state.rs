use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::oversight::{group_by_decision, DecisionGroups, OversightCursor, SelectionSet};
use crate::progress::{project_progress, ProgressBar};
use crate::{JobId, JobKind, JobStatus, JobTicket, NoveltyItem, RunContext, SubgraphPayload, TripletRow};

/// Monotonic tag for subgraph requests; only the latest one may land.
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStep {
    #[default]
    Upload,
    Oversight,
    TripletReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Result of the legacy `/api/upload_verify` call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifyPanes {
    #[serde(default)]
    pub existing: String,
    #[serde(default)]
    pub partial: String,
    #[serde(default)]
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDetails {
    pub name: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppOptions {
    /// Enables the legacy upload-verify flow next to the job pipeline.
    pub legacy_upload_verify: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobProgressView {
    pub stage: String,
    pub message: String,
    pub bar: ProgressBar,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveJob {
    pub(crate) ticket: JobTicket,
    pub(crate) job_id: Option<JobId>,
    pub(crate) progress: JobProgressView,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SubgraphCache {
    pub(crate) latest_request: RequestId,
    pub(crate) loading: bool,
    pub(crate) keyword: Option<String>,
    pub(crate) payload: Option<SubgraphPayload>,
}

/// Explicit session state. All controllers read and write through it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub(crate) options: AppOptions,
    pub(crate) keywords: Vec<String>,
    pub(crate) keyword: Option<String>,
    pub(crate) subgraph: SubgraphCache,
    pub(crate) document: Option<PathBuf>,
    pub(crate) active_job: Option<ActiveJob>,
    pub(crate) run_context: Option<RunContext>,
    pub(crate) novelty: DecisionGroups,
    pub(crate) cursor: OversightCursor,
    pub(crate) selection: SelectionSet,
    pub(crate) triplets: Vec<TripletRow>,
    /// Last ticket generation handed out; never reset.
    pub(crate) job_generation: u64,
    pub(crate) step: WorkflowStep,
    pub(crate) node_details: Option<NodeDetails>,
    pub(crate) verify: Option<VerifyPanes>,
    pub(crate) notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AppOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn run_context(&self) -> Option<&RunContext> {
        self.run_context.as_ref()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn triplets(&self) -> &[TripletRow] {
        &self.triplets
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        });
        self.mark_dirty();
    }

    /// Starts tracking a new submission and returns its ticket.
    pub(crate) fn begin_job(&mut self, kind: JobKind, message: impl Into<String>) -> JobTicket {
        self.job_generation += 1;
        let ticket = JobTicket {
            kind,
            generation: self.job_generation,
        };
        self.active_job = Some(ActiveJob {
            ticket,
            job_id: None,
            progress: JobProgressView {
                stage: "Queued".to_string(),
                message: message.into(),
                bar: ProgressBar::Indeterminate,
            },
        });
        self.mark_dirty();
        ticket
    }

    /// Whether an event carrying `ticket` belongs to the job in flight.
    pub(crate) fn is_active_job(&self, ticket: JobTicket) -> bool {
        self.active_job
            .as_ref()
            .is_some_and(|active| active.ticket == ticket)
    }

    pub(crate) fn apply_job_status(&mut self, status: &JobStatus) {
        if let Some(active) = &mut self.active_job {
            active.progress = JobProgressView {
                stage: status.stage.clone(),
                message: status.message.clone(),
                bar: project_progress(status.current(), status.total()),
            };
            self.mark_dirty();
        }
    }

    pub(crate) fn load_novelty(&mut self, items: Vec<NoveltyItem>) {
        self.novelty = group_by_decision(items);
        self.cursor = OversightCursor::default();
        self.selection.clear();
        self.mark_dirty();
    }

    /// Clears the run: provenance, selection, review tables, step indicator
    /// and the chosen document. Keyword and subgraph cache are kept.
    pub(crate) fn reset_session(&mut self) {
        self.run_context = None;
        self.active_job = None;
        self.novelty = DecisionGroups::default();
        self.cursor = OversightCursor::default();
        self.selection.clear();
        self.triplets.clear();
        self.step = WorkflowStep::Upload;
        self.document = None;
        self.verify = None;
        self.mark_dirty();
    }
}
