//! KBDebugger engine: HTTP client, job polling and effect execution.
mod client;
mod engine;
mod export;
mod persist;
mod poll;
mod subgraph;
mod types;

pub use client::{ApiSettings, JobApi, ReqwestApi, Submission};
pub use engine::{Clock, EngineConfig, EngineHandle};
pub use export::{render_json, render_text, write_export, ExportError};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use poll::{complete_job, poll_job, ChannelEventSink, EventSink};
pub use subgraph::{fetch_subgraph, LatestRequest};
pub use types::{ApiError, EngineEvent, FailureKind};
