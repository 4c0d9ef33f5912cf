use std::path::PathBuf;

use crate::oversight::{clamp_page, page_count, page_slice, SelectAllState};
use crate::state::{JobProgressView, NodeDetails, Notice, VerifyPanes, WorkflowStep};
use crate::{AppState, Decision, JobId, JobKind, RunContext, SelectionKey, TripletRow};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub step: WorkflowStep,
    pub keywords: Vec<String>,
    pub keyword: Option<String>,
    pub graph: Option<GraphSummary>,
    pub graph_loading: bool,
    pub document: Option<PathBuf>,
    pub job: Option<JobView>,
    pub run_context: Option<RunContext>,
    pub oversight: OversightView,
    pub triplets: Vec<TripletRow>,
    /// Rows that would be submitted (not soft-deleted).
    pub active_triplets: usize,
    pub node_details: Option<NodeDetails>,
    pub verify: Option<VerifyPanes>,
    pub legacy_upload_verify: bool,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub keyword: String,
    pub nodes: usize,
    pub edges: usize,
    pub sentences: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobView {
    pub kind: JobKind,
    pub job_id: Option<JobId>,
    pub progress: JobProgressView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub decision: Decision,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OversightRowView {
    pub key: SelectionKey,
    pub quality: String,
    pub decision: Decision,
    pub max_score: f64,
    pub confidence: Option<f64>,
    pub matched_neighbor: Option<String>,
    pub rationale: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OversightView {
    pub tabs: Vec<TabView>,
    pub page: usize,
    pub page_count: usize,
    pub rows: Vec<OversightRowView>,
    /// Derived from `rows` on every build; never stored.
    pub select_all: SelectAllState,
    pub selected_count: usize,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            step: self.step,
            keywords: self.keywords.clone(),
            keyword: self.keyword.clone(),
            graph: self.graph_summary(),
            graph_loading: self.subgraph.loading,
            document: self.document.clone(),
            job: self.active_job.as_ref().map(|job| JobView {
                kind: job.ticket.kind,
                job_id: job.job_id.clone(),
                progress: job.progress.clone(),
            }),
            run_context: self.run_context.clone(),
            oversight: self.oversight_view(),
            triplets: self.triplets.clone(),
            active_triplets: self.triplets.iter().filter(|row| !row.deleted).count(),
            node_details: self.node_details.clone(),
            verify: self.verify.clone(),
            legacy_upload_verify: self.options.legacy_upload_verify,
            notice: self.notice.clone(),
        }
    }

    fn graph_summary(&self) -> Option<GraphSummary> {
        let payload = self.subgraph.payload.as_ref()?;
        Some(GraphSummary {
            keyword: self.subgraph.keyword.clone().unwrap_or_default(),
            nodes: payload.node_count(),
            edges: payload.edge_count(),
            sentences: payload.sentence_records().len(),
        })
    }

    fn oversight_view(&self) -> OversightView {
        let tab = self.cursor.tab;
        let items = self.novelty.get(tab);
        let page = clamp_page(self.cursor.page(tab), items.len());
        let rows: Vec<OversightRowView> = page_slice(items, page)
            .iter()
            .map(|item| {
                let key = item.selection_key();
                OversightRowView {
                    checked: self.selection.contains(&key),
                    key,
                    quality: item.quality.clone(),
                    decision: item.decision,
                    max_score: item.score(),
                    confidence: item.confidence,
                    matched_neighbor: item.matched_neighbor_sentence.clone(),
                    rationale: item.rationale.clone(),
                }
            })
            .collect();
        let checked = rows.iter().filter(|row| row.checked).count();

        OversightView {
            tabs: Decision::ALL
                .iter()
                .map(|&decision| TabView {
                    decision,
                    count: self.novelty.len(decision),
                    active: decision == tab,
                })
                .collect(),
            page,
            page_count: page_count(items.len()),
            select_all: SelectAllState::derive(checked, rows.len()),
            rows,
            selected_count: self.selection.len(),
        }
    }
}
