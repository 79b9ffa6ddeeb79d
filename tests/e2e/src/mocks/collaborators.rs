//! Scripted Collaborators
//!
//! Stand-ins for the remote scheduling backend and the similarity lookup
//! whose answers are fixed up front.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use cadence_core::{
    RemoteError, RemoteRequest, RemoteResponse, RemoteScheduler, SimilarItem, SimilarityError,
    SimilarityLookup, SimilarityQuery,
};

/// Remote backend replaying a queue of outcomes.
///
/// Once the queue is empty every call fails with a transport error.
#[derive(Default)]
pub struct ScriptedRemote {
    script: Mutex<VecDeque<Result<RemoteResponse, RemoteError>>>,
    requests: Mutex<Vec<RemoteRequest>>,
}

impl ScriptedRemote {
    pub fn new(outcomes: impl IntoIterator<Item = Result<RemoteResponse, RemoteError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteScheduler for ScriptedRemote {
    async fn schedule(&self, request: RemoteRequest) -> Result<RemoteResponse, RemoteError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Transport("script exhausted".to_string())))
    }
}

/// Remote backend that never answers within any sane timeout
pub struct HangingRemote(pub Duration);

#[async_trait]
impl RemoteScheduler for HangingRemote {
    async fn schedule(&self, _request: RemoteRequest) -> Result<RemoteResponse, RemoteError> {
        tokio::time::sleep(self.0).await;
        Err(RemoteError::Transport("woke up too late".to_string()))
    }
}

/// Similarity lookup that is always down
pub struct FailingSimilarity;

#[async_trait]
impl SimilarityLookup for FailingSimilarity {
    async fn find_similar(&self, _query: SimilarityQuery) -> Result<Vec<SimilarItem>, SimilarityError> {
        Err(SimilarityError::Unavailable("index offline".to_string()))
    }
}
