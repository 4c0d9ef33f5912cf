//! KBDebugger core: data model, pure state machine and view-model helpers.
mod effect;
mod graph;
mod job;
mod msg;
pub mod oversight;
mod progress;
mod run_context;
mod state;
pub mod triplets;
mod update;
mod view_model;

pub use effect::{Effect, ExportFormat};
pub use graph::{
    EdgeData, GraphEdge, GraphElements, GraphNode, NodeData, SentenceExport, SentenceRecord,
    SubgraphPayload,
};
pub use job::{JobCounts, JobId, JobKind, JobState, JobStatus, JobTicket};
pub use msg::Msg;
pub use oversight::{Decision, NoveltyItem, SelectAllState, SelectionKey, SelectionSet, PAGE_SIZE};
pub use progress::{project_progress, ProgressBar};
pub use run_context::RunContext;
pub use state::{
    AppOptions, AppState, JobProgressView, NodeDetails, Notice, NoticeLevel, RequestId,
    VerifyPanes, WorkflowStep,
};
pub use triplets::{Extraction, RawExtraction, RowId, TripletField, TripletRow, UpsertRequest};
pub use update::update;
pub use view_model::{AppViewModel, GraphSummary, JobView, OversightRowView, OversightView, TabView};
