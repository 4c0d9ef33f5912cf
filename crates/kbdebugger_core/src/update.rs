use std::path::PathBuf;

use serde_json::Value;

use crate::oversight::{clamp_page, page_slice};
use crate::state::{NodeDetails, WorkflowStep};
use crate::triplets::{build_upsert_request, rows_from_extractions, PayloadError, RawExtraction};
use crate::{AppState, Effect, JobKind, Msg, NoveltyItem, RunContext};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::LoadKeywords],
        Msg::RestoreRunContext(context) => {
            state.run_context = Some(context);
            state.mark_dirty();
            Vec::new()
        }
        Msg::KeywordsLoaded(Ok(keywords)) => {
            state.keywords = keywords;
            state.mark_dirty();
            Vec::new()
        }
        Msg::KeywordsLoaded(Err(err)) => {
            state.error(format!("Could not load search keywords: {err}"));
            Vec::new()
        }
        Msg::KeywordSelected(keyword) => select_keyword(&mut state, keyword),
        Msg::SubgraphLoaded {
            request,
            keyword,
            result,
        } => {
            // Responses for a superseded keyword are dropped.
            if request != state.subgraph.latest_request {
                return (state, Vec::new());
            }
            state.subgraph.loading = false;
            match result {
                Ok(payload) => {
                    state.subgraph.keyword = Some(keyword);
                    state.subgraph.payload = Some(payload);
                    state.mark_dirty();
                }
                Err(err) => state.error(format!("Could not load subgraph for '{keyword}': {err}")),
            }
            Vec::new()
        }
        Msg::DocumentChosen(document) => choose_document(&mut state, document),
        Msg::JobSubmitted { ticket, job_id } => {
            if let Some(active) = state.active_job.as_mut() {
                if active.ticket == ticket && active.job_id.is_none() {
                    active.job_id = Some(job_id);
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::JobStatusUpdated { ticket, status, .. } => {
            if state.is_active_job(ticket) {
                state.apply_job_status(&status);
            }
            Vec::new()
        }
        Msg::JobFinished { ticket, result, .. } => {
            // Late events of an abandoned job carry an older generation.
            if !state.is_active_job(ticket) {
                return (state, Vec::new());
            }
            let kind = ticket.kind;
            state.active_job = None;
            state.mark_dirty();
            match result {
                Ok(payload) => finish_job(&mut state, kind, &payload),
                Err(err) => {
                    if kind == JobKind::Pipeline {
                        // Lets the same file be chosen again.
                        state.document = None;
                    }
                    state.error(format!("The {} job failed: {err}", kind.label()));
                    Vec::new()
                }
            }
        }
        Msg::TabSelected(decision) => {
            if state.cursor.tab != decision {
                state.cursor.tab = decision;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PageSelected(page) => {
            let tab = state.cursor.tab;
            let page = clamp_page(page, state.novelty.len(tab));
            if state.cursor.page(tab) != page {
                state.cursor.set_page(tab, page);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::RowToggled { key, checked } => {
            let found = crate::Decision::ALL
                .iter()
                .flat_map(|&decision| state.novelty.get(decision))
                .find(|item| item.selection_key() == key)
                .cloned();
            if let Some(item) = found {
                state.selection.set(&item, checked);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectAllToggled(checked) => {
            let tab = state.cursor.tab;
            let items = state.novelty.get(tab);
            let page = clamp_page(state.cursor.page(tab), items.len());
            let visible: Vec<NoveltyItem> = page_slice(items, page).to_vec();
            for item in &visible {
                state.selection.set(item, checked);
            }
            if !visible.is_empty() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ExtractTripletsClicked => extract_triplets(&mut state),
        Msg::TripletEdited {
            row_id,
            field,
            value,
        } => {
            if let Some(row) = state.triplets.iter_mut().find(|row| row.id == row_id) {
                row.set_field(field, value);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TripletDeleteToggled { row_id } => {
            if let Some(row) = state.triplets.iter_mut().find(|row| row.id == row_id) {
                row.deleted = !row.deleted;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmitTripletsClicked => submit_triplets(&mut state),
        Msg::NodeSearchSubmitted(name) => {
            let name = name.trim();
            if name.is_empty() {
                state.error("Enter a node name to search.");
                Vec::new()
            } else {
                vec![Effect::SearchNode {
                    name: name.to_string(),
                }]
            }
        }
        Msg::NodeDetailsLoaded { name, result } => {
            match result {
                Ok(details) => {
                    state.node_details = Some(NodeDetails { name, details });
                    state.mark_dirty();
                }
                Err(err) => {
                    state.node_details = None;
                    state.error(format!("Node search for '{name}' failed: {err}"));
                }
            }
            Vec::new()
        }
        Msg::VerifyDocumentClicked(document) => {
            if !state.options.legacy_upload_verify {
                state.error("Legacy upload verification is disabled.");
                Vec::new()
            } else {
                vec![Effect::UploadVerify { document }]
            }
        }
        Msg::VerifyLoaded(result) => {
            match result {
                Ok(panes) => {
                    state.verify = Some(panes);
                    state.mark_dirty();
                }
                Err(err) => state.error(format!("Verification failed: {err}")),
            }
            Vec::new()
        }
        Msg::ExportRequested { format, path } => {
            let Some(payload) = state.subgraph.payload.as_ref() else {
                state.error("Load a subgraph before exporting.");
                return (state, Vec::new());
            };
            let sentences = payload.sentence_records();
            if sentences.is_empty() {
                state.error("The current subgraph has no sentences to export.");
                return (state, Vec::new());
            }
            let keyword = state.subgraph.keyword.clone().unwrap_or_default();
            vec![Effect::ExportSentences {
                format,
                path,
                export: crate::SentenceExport { keyword, sentences },
            }]
        }
        Msg::ExportFinished(Ok(path)) => {
            state.info(format!("Exported sentences to {}", path.display()));
            Vec::new()
        }
        Msg::ExportFinished(Err(err)) => {
            state.error(format!("Export failed: {err}"));
            Vec::new()
        }
        Msg::ResetClicked => {
            state.reset_session();
            vec![Effect::PersistRunContext(None)]
        }
        Msg::NoticeDismissed => {
            if state.notice.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn select_keyword(state: &mut AppState, keyword: String) -> Vec<Effect> {
    let keyword = keyword.trim().to_string();
    if keyword.is_empty() {
        return Vec::new();
    }
    state.keyword = Some(keyword.clone());
    state.subgraph.latest_request += 1;
    state.subgraph.loading = true;
    state.mark_dirty();
    vec![Effect::LoadSubgraph {
        request: state.subgraph.latest_request,
        keyword,
    }]
}

fn choose_document(state: &mut AppState, document: PathBuf) -> Vec<Effect> {
    // Same file again is not a change.
    if state.document.as_ref() == Some(&document) {
        return Vec::new();
    }
    if let Some(active) = &state.active_job {
        state.error(format!("A {} job is still running.", active.ticket.kind.label()));
        return Vec::new();
    }
    let Some(keyword) = state.keyword.clone() else {
        state.error("Select a search keyword before uploading a document.");
        return Vec::new();
    };

    state.document = Some(document.clone());
    state.run_context = None;
    state.novelty = Default::default();
    state.selection.clear();
    state.triplets.clear();
    state.step = WorkflowStep::Upload;
    let ticket = state.begin_job(JobKind::Pipeline, "Uploading document...");
    vec![
        Effect::PersistRunContext(None),
        Effect::RunPipeline {
            ticket,
            keyword,
            document,
        },
    ]
}

fn extract_triplets(state: &mut AppState) -> Vec<Effect> {
    if let Some(active) = &state.active_job {
        state.error(format!("A {} job is still running.", active.ticket.kind.label()));
        return Vec::new();
    }
    if state.selection.is_empty() {
        state.error("Select at least one quality to extract triplets from.");
        return Vec::new();
    }
    let qualities = state.selection.qualities();
    let ticket = state.begin_job(
        JobKind::TripletExtraction,
        format!("Submitting {} selected qualities...", qualities.len()),
    );
    vec![Effect::ExtractTriplets { ticket, qualities }]
}

fn submit_triplets(state: &mut AppState) -> Vec<Effect> {
    if let Some(active) = &state.active_job {
        state.error(format!("A {} job is still running.", active.ticket.kind.label()));
        return Vec::new();
    }
    let source = state.run_context.as_ref().map(|ctx| ctx.source.as_str());
    match build_upsert_request(&state.triplets, source) {
        Ok(request) => {
            let ticket = state.begin_job(
                JobKind::Upsert,
                format!("Submitting {} triplets...", request.triplet_count()),
            );
            vec![Effect::Upsert { ticket, request }]
        }
        Err(PayloadError::NoTriplets) => {
            state.error("There are no triplets to submit.");
            Vec::new()
        }
    }
}

fn finish_job(state: &mut AppState, kind: JobKind, payload: &Value) -> Vec<Effect> {
    match kind {
        JobKind::Pipeline => {
            let results = payload
                .get("NoveltyLLM")
                .and_then(|log| log.get("results"))
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            let items: Vec<NoveltyItem> = match serde_json::from_value(results) {
                Ok(items) => items,
                Err(err) => {
                    state.document = None;
                    state.error(format!("Unexpected pipeline result: {err}"));
                    return Vec::new();
                }
            };
            let count = items.len();
            state.load_novelty(items);
            state.step = WorkflowStep::Oversight;
            state.info(format!("Pipeline finished: {count} qualities to review."));

            match RunContext::from_pipeline_result(payload) {
                Some(context) => {
                    state.run_context = Some(context.clone());
                    vec![Effect::PersistRunContext(Some(context))]
                }
                None => Vec::new(),
            }
        }
        JobKind::TripletExtraction => {
            let results = payload
                .get("extracted_triplets")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            let extractions: Vec<RawExtraction> = match serde_json::from_value(results) {
                Ok(extractions) => extractions,
                Err(err) => {
                    state.error(format!("Unexpected extraction result: {err}"));
                    return Vec::new();
                }
            };
            let rows = rows_from_extractions(&extractions);
            let count = rows.len();
            state.triplets = rows;
            state.step = WorkflowStep::TripletReview;
            if count == 0 {
                state.info("No triplets were extracted from the selected qualities.");
            } else {
                state.info(format!("Extracted {count} triplets."));
            }
            Vec::new()
        }
        JobKind::Upsert => {
            state.reset_session();
            state.info("Knowledge graph updated.");
            vec![Effect::PersistRunContext(None)]
        }
    }
}
