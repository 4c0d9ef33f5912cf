use std::sync::{Mutex, PoisonError};

use engine_logging::engine_debug;
use kbdebugger_core::SubgraphPayload;
use tokio_util::sync::CancellationToken;

use crate::client::JobApi;
use crate::ApiError;

/// Tracks the one subgraph request allowed to be in flight.
#[derive(Debug, Default)]
pub struct LatestRequest {
    current: Mutex<Option<CancellationToken>>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the request in flight, if any, and hands out the token for the
    /// next one. Must be called in request order.
    pub fn supersede(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        token
    }
}

/// Fetches the subgraph unless `token` is cancelled first. `None` means the
/// request was superseded and its outcome must be ignored.
pub async fn fetch_subgraph(
    api: &dyn JobApi,
    keyword: &str,
    token: &CancellationToken,
) -> Option<Result<SubgraphPayload, ApiError>> {
    if token.is_cancelled() {
        return None;
    }
    tokio::select! {
        _ = token.cancelled() => {
            engine_debug!("Subgraph request for '{}' superseded", keyword);
            None
        }
        result = api.subgraph(keyword) => {
            if token.is_cancelled() { None } else { Some(result) }
        }
    }
}
