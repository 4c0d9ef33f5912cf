use std::path::PathBuf;

use crate::{JobTicket, RequestId, RunContext, SentenceExport, UpsertRequest};

/// IO requested by [`crate::update`]. Executed outside the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadKeywords,
    LoadSubgraph { request: RequestId, keyword: String },
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
    SearchNode { name: String },
    UploadVerify { document: PathBuf },
    ExportSentences {
        format: ExportFormat,
        path: PathBuf,
        export: SentenceExport,
    },
    /// Store (or clear, with `None`) the run context outside the process.
    PersistRunContext(Option<RunContext>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}
