use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use kbdebugger_core::{Effect, Msg};
use kbdebugger_engine::{EngineConfig, EngineEvent, EngineHandle, EventSink};

use super::app::AppEvent;
use super::config::AppConfig;
use super::persistence;

pub struct EffectRunner {
    engine: EngineHandle,
    session_file: PathBuf,
}

impl EffectRunner {
    pub fn new(config: &AppConfig, events: mpsc::Sender<AppEvent>) -> anyhow::Result<Self> {
        let engine_config =
            EngineConfig::new(config.api_settings(), Arc::new(|| Utc::now().to_rfc3339()));
        let engine = EngineHandle::new(engine_config, Arc::new(MsgSink { tx: events }))?;
        Ok(Self {
            engine,
            session_file: config.session_file.clone(),
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadKeywords => self.engine.load_keywords(),
                Effect::LoadSubgraph { request, keyword } => {
                    self.engine.load_subgraph(request, keyword);
                }
                Effect::RunPipeline {
                    ticket,
                    keyword,
                    document,
                } => {
                    engine_info!(
                        "RunPipeline #{} keyword={} document={}",
                        ticket.generation,
                        keyword,
                        document.display()
                    );
                    self.engine.run_pipeline(ticket, keyword, document);
                }
                Effect::ExtractTriplets { ticket, qualities } => {
                    engine_info!(
                        "ExtractTriplets #{} qualities={}",
                        ticket.generation,
                        qualities.len()
                    );
                    self.engine.extract_triplets(ticket, qualities);
                }
                Effect::Upsert { ticket, request } => self.engine.upsert(ticket, request),
                Effect::SearchNode { name } => self.engine.search_node(name),
                Effect::UploadVerify { document } => self.engine.upload_verify(document),
                Effect::ExportSentences {
                    format,
                    path,
                    export,
                } => self.engine.export(format, path, export),
                Effect::PersistRunContext(context) => {
                    persistence::save_run_context(&self.session_file, context.as_ref());
                }
            }
        }
    }
}

struct MsgSink {
    tx: mpsc::Sender<AppEvent>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(AppEvent::Msg(to_msg(event)));
    }
}

pub(crate) fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::KeywordsLoaded(result) => Msg::KeywordsLoaded(result.map_err(|e| e.to_string())),
        EngineEvent::SubgraphLoaded {
            request,
            keyword,
            result,
        } => Msg::SubgraphLoaded {
            request,
            keyword,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::JobSubmitted { ticket, job_id } => Msg::JobSubmitted { ticket, job_id },
        EngineEvent::JobStatus {
            ticket,
            job_id,
            status,
        } => Msg::JobStatusUpdated {
            ticket,
            job_id,
            status,
        },
        EngineEvent::JobCompleted {
            ticket,
            job_id,
            result,
        } => Msg::JobFinished {
            ticket,
            job_id,
            result: result.map_err(|err| {
                engine_warn!("{} job failed: {}", ticket.kind.label(), err);
                err.to_string()
            }),
        },
        EngineEvent::NodeDetails { name, result } => Msg::NodeDetailsLoaded {
            name,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::VerifyLoaded(result) => Msg::VerifyLoaded(result.map_err(|e| e.to_string())),
        EngineEvent::ExportWritten(result) => Msg::ExportFinished(result),
    }
}
