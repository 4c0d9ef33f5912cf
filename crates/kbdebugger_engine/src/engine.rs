use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use kbdebugger_core::{ExportFormat, JobTicket, RequestId, SentenceExport, UpsertRequest};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiSettings, JobApi, ReqwestApi, Submission};
use crate::export::write_export;
use crate::poll::{complete_job, EventSink};
use crate::subgraph::{fetch_subgraph, LatestRequest};
use crate::{ApiError, EngineEvent};

/// Produces the `exported_at` timestamp for exports.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub clock: Clock,
}

impl EngineConfig {
    pub fn new(api: ApiSettings, clock: Clock) -> Self {
        Self { api, clock }
    }
}

enum EngineCommand {
    LoadKeywords,
    LoadSubgraph {
        request: RequestId,
        keyword: String,
        token: CancellationToken,
    },
    RunPipeline {
        ticket: JobTicket,
        keyword: String,
        document: PathBuf,
    },
    ExtractTriplets {
        ticket: JobTicket,
        qualities: Vec<String>,
    },
    Upsert {
        ticket: JobTicket,
        request: UpsertRequest,
    },
    SearchNode {
        name: String,
    },
    UploadVerify {
        document: PathBuf,
    },
    Export {
        format: ExportFormat,
        path: PathBuf,
        export: SentenceExport,
    },
}

struct Worker {
    api: Arc<dyn JobApi>,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    clock: Clock,
}

/// Owns the IO thread. Commands run concurrently on a tokio runtime and
/// report back through the [`EventSink`].
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    subgraph: LatestRequest,
}

impl EngineHandle {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> io::Result<Self> {
        let api = ReqwestApi::new(&config.api)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
        Self::with_api(Arc::new(api), config, sink)
    }

    /// Same as [`EngineHandle::new`] with a caller-provided API implementation.
    pub fn with_api(
        api: Arc<dyn JobApi>,
        config: EngineConfig,
        sink: Arc<dyn EventSink>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let worker = Arc::new(Worker {
            api,
            sink,
            poll_interval: config.api.poll_interval,
            clock: config.clock,
        });

        thread::Builder::new()
            .name("kbdebugger-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let worker = worker.clone();
                    runtime.spawn(async move {
                        worker.handle(command).await;
                    });
                }
                engine_info!("Engine command channel closed");
            })?;

        Ok(Self {
            cmd_tx,
            subgraph: LatestRequest::new(),
        })
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("Engine thread is gone; command dropped");
        }
    }

    pub fn load_keywords(&self) {
        self.send(EngineCommand::LoadKeywords);
    }

    /// Supersedes any subgraph request still in flight.
    pub fn load_subgraph(&self, request: RequestId, keyword: impl Into<String>) {
        let token = self.subgraph.supersede();
        self.send(EngineCommand::LoadSubgraph {
            request,
            keyword: keyword.into(),
            token,
        });
    }

    pub fn run_pipeline(
        &self,
        ticket: JobTicket,
        keyword: impl Into<String>,
        document: impl Into<PathBuf>,
    ) {
        self.send(EngineCommand::RunPipeline {
            ticket,
            keyword: keyword.into(),
            document: document.into(),
        });
    }

    pub fn extract_triplets(&self, ticket: JobTicket, qualities: Vec<String>) {
        self.send(EngineCommand::ExtractTriplets { ticket, qualities });
    }

    pub fn upsert(&self, ticket: JobTicket, request: UpsertRequest) {
        self.send(EngineCommand::Upsert { ticket, request });
    }

    pub fn search_node(&self, name: impl Into<String>) {
        self.send(EngineCommand::SearchNode { name: name.into() });
    }

    pub fn upload_verify(&self, document: impl Into<PathBuf>) {
        self.send(EngineCommand::UploadVerify {
            document: document.into(),
        });
    }

    pub fn export(&self, format: ExportFormat, path: impl Into<PathBuf>, export: SentenceExport) {
        self.send(EngineCommand::Export {
            format,
            path: path.into(),
            export,
        });
    }
}

impl Worker {
    async fn handle(&self, command: EngineCommand) {
        let api = self.api.as_ref();
        let sink = self.sink.as_ref();
        match command {
            EngineCommand::LoadKeywords => {
                sink.emit(EngineEvent::KeywordsLoaded(api.search_keywords().await));
            }
            EngineCommand::LoadSubgraph {
                request,
                keyword,
                token,
            } => {
                if let Some(result) = fetch_subgraph(api, &keyword, &token).await {
                    sink.emit(EngineEvent::SubgraphLoaded {
                        request,
                        keyword,
                        result,
                    });
                }
            }
            EngineCommand::RunPipeline {
                ticket,
                keyword,
                document,
            } => {
                let submission = api
                    .run_pipeline(&keyword, &document)
                    .await
                    .map(Submission::Queued);
                self.complete(ticket, submission).await;
            }
            EngineCommand::ExtractTriplets { ticket, qualities } => {
                let submission = api
                    .triplet_extraction(&qualities)
                    .await
                    .map(Submission::Queued);
                self.complete(ticket, submission).await;
            }
            EngineCommand::Upsert { ticket, request } => {
                let submission = api.upsert(&request).await;
                self.complete(ticket, submission).await;
            }
            EngineCommand::SearchNode { name } => {
                let result = api.search_node(&name).await;
                sink.emit(EngineEvent::NodeDetails { name, result });
            }
            EngineCommand::UploadVerify { document } => {
                sink.emit(EngineEvent::VerifyLoaded(api.upload_verify(&document).await));
            }
            EngineCommand::Export {
                format,
                path,
                export,
            } => {
                let exported_at = (self.clock)();
                let result = tokio::task::spawn_blocking(move || {
                    write_export(&path, format, &export, &exported_at).map_err(|err| err.to_string())
                })
                .await
                .unwrap_or_else(|err| Err(err.to_string()));
                sink.emit(EngineEvent::ExportWritten(result));
            }
        }
    }

    async fn complete(&self, ticket: JobTicket, submission: Result<Submission, ApiError>) {
        complete_job(
            self.api.as_ref(),
            ticket,
            submission,
            self.poll_interval,
            self.sink.as_ref(),
        )
        .await;
    }
}
