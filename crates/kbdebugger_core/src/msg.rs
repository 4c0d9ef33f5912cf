use std::path::PathBuf;

use crate::{
    Decision, ExportFormat, JobId, JobStatus, JobTicket, RequestId, RowId, RunContext,
    SelectionKey, SubgraphPayload, TripletField, VerifyPanes,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Front end finished start-up.
    Started,
    /// Restore a run context persisted by an earlier session.
    RestoreRunContext(RunContext),
    KeywordsLoaded(Result<Vec<String>, String>),
    /// User picked a search keyword.
    KeywordSelected(String),
    SubgraphLoaded {
        request: RequestId,
        keyword: String,
        result: Result<SubgraphPayload, String>,
    },
    /// User chose a document; starts a pipeline run.
    DocumentChosen(PathBuf),
    /// The service accepted a job.
    JobSubmitted { ticket: JobTicket, job_id: JobId },
    /// One successful status poll.
    JobStatusUpdated {
        ticket: JobTicket,
        job_id: JobId,
        status: JobStatus,
    },
    /// Terminal outcome. `job_id` is `None` when submission itself failed.
    JobFinished {
        ticket: JobTicket,
        job_id: Option<JobId>,
        result: Result<serde_json::Value, String>,
    },
    TabSelected(Decision),
    /// 1-based page of the active tab; clamped.
    PageSelected(usize),
    RowToggled { key: SelectionKey, checked: bool },
    /// Select or clear every row of the visible page.
    SelectAllToggled(bool),
    ExtractTripletsClicked,
    TripletEdited {
        row_id: RowId,
        field: TripletField,
        value: String,
    },
    /// Soft-delete or restore a triplet row.
    TripletDeleteToggled { row_id: RowId },
    SubmitTripletsClicked,
    NodeSearchSubmitted(String),
    NodeDetailsLoaded {
        name: String,
        result: Result<Vec<String>, String>,
    },
    /// Legacy three-pane verification of a document.
    VerifyDocumentClicked(PathBuf),
    VerifyLoaded(Result<VerifyPanes, String>),
    ExportRequested { format: ExportFormat, path: PathBuf },
    ExportFinished(Result<PathBuf, String>),
    ResetClicked,
    NoticeDismissed,
    /// Fallback for placeholder wiring.
    NoOp,
}
