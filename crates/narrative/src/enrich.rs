use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use foundation::ids::PageId;
use parking_lot::Mutex;
use survey::ClusterList;
use tracing::{info, warn};

use crate::cancel::CancelSignal;
use crate::client::LanguageModel;
use crate::error::NarrativeError;
use crate::prompt::Prompt;
use crate::response::NarrativeResponse;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests cluster narratives, at most one in flight per page.
#[derive(Clone)]
pub struct Enricher {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
    pending: Arc<Mutex<HashSet<PageId>>>,
}

/// Clears the page's in-flight mark however the request ends.
struct PendingGuard {
    pending: Arc<Mutex<HashSet<PageId>>>,
    page: PageId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.page);
    }
}

impl Enricher {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            timeout: DEFAULT_TIMEOUT,
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_pending(&self, page: PageId) -> bool {
        self.pending.lock().contains(&page)
    }

    fn begin(&self, page: PageId) -> Result<PendingGuard, NarrativeError> {
        let mut pending = self.pending.lock();
        if !pending.insert(page) {
            return Err(NarrativeError::AlreadyPending(page));
        }
        Ok(PendingGuard {
            pending: Arc::clone(&self.pending),
            page,
        })
    }

    /// Asks the model to name and explain every cluster of `list`.
    ///
    /// Returns a fully merged copy of `list`, or an error and nothing else:
    /// the caller's list is never partially updated.
    pub async fn request_reasoning(
        &self,
        list: &ClusterList,
        mut cancel: CancelSignal,
    ) -> Result<ClusterList, NarrativeError> {
        let page = list.page;
        if list.is_empty() {
            return Err(NarrativeError::NoClusters(page));
        }
        let _guard = self.begin(page)?;
        if cancel.is_cancelled() {
            return Err(NarrativeError::Cancelled);
        }

        let prompt = Prompt::for_clusters(list);
        let answer = tokio::select! {
            _ = cancel.cancelled() => Err(NarrativeError::Cancelled),
            out = tokio::time::timeout(self.timeout, self.model.complete(&prompt)) => {
                out.unwrap_or(Err(NarrativeError::Timeout(self.timeout)))
            }
        };

        let merged = answer
            .and_then(|content| NarrativeResponse::parse(&content))
            .and_then(|response| response.merge_into(list));
        match &merged {
            Ok(_) => info!(%page, clusters = list.len(), "cluster narratives received"),
            Err(err) => warn!(%page, "cluster narratives not applied: {err}"),
        }
        merged
    }
}
