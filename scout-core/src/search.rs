//! Search orchestration
//!
//! [`CompanySearch`] owns one conversation with the research agent: it picks
//! POST or PUT depending on whether a run identifier has been captured,
//! feeds the streamed body through [`crate::stream::read_objects`], and
//! accumulates de-duplicated companies as they arrive.
//!
//! ## Lifecycle
//!
//! - Starting a search cancels any search still streaming, then clears the
//!   previous results. A generation counter makes sure the superseded
//!   stream can no longer touch shared state, even if it is still unwinding.
//! - The run identifier survives across searches until
//!   [`CompanySearch::new_conversation`] clears it.
//! - A failure keeps whatever was accumulated before it happened.
//! - There are no retries; errors go back to the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::accumulate::CompanyAccumulator;
use crate::agent::AgentClient;
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::stream::read_objects;
use crate::types::Company;

/// Summary of a completed search
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub query: String,
    /// Unique companies accumulated by this search
    pub companies_added: usize,
    /// JSON objects recovered from the stream, including ones without companies
    pub objects: usize,
    pub duration: Duration,
    /// Run identifier in effect after the search
    pub run_id: Option<String>,
}

#[derive(Debug, Default)]
struct SearchState {
    run_id: Option<String>,
    generation: u64,
    cancel: Option<CancellationToken>,
    results: CompanyAccumulator,
    loading: bool,
    last_duration: Option<Duration>,
    last_error: Option<String>,
}

/// Handle to a search conversation; clones share the same state.
#[derive(Clone)]
pub struct CompanySearch {
    client: Arc<AgentClient>,
    shared: Arc<Mutex<SearchState>>,
}

impl CompanySearch {
    pub fn new(client: AgentClient) -> Self {
        Self {
            client: Arc::new(client),
            shared: Arc::new(Mutex::new(SearchState::default())),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        Ok(Self::new(AgentClient::new(config)?))
    }

    fn state(&self) -> MutexGuard<'_, SearchState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a search, calling `on_update` with each batch of newly added companies.
    pub async fn search<F>(&self, query: &str, mut on_update: F) -> Result<SearchReport>
    where
        F: FnMut(&[Company]),
    {
        let started = Instant::now();
        let (generation, token, run_id) = self.begin();
        let deadline = self.client.deadline();

        tracing::info!(
            query,
            generation,
            follow_up = run_id.is_some(),
            "Starting search"
        );

        let outcome = tokio::select! {
            _ = token.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(
                deadline,
                self.run(query, run_id, generation, &mut on_update),
            ) => result.unwrap_or(Err(Error::Timeout(deadline))),
        };

        let duration = started.elapsed();
        let companies_added = self.finish(generation, duration, outcome.as_ref().err());

        match outcome {
            Ok(objects) => {
                let report = SearchReport {
                    query: query.to_string(),
                    companies_added,
                    objects,
                    duration,
                    run_id: self.run_id(),
                };
                tracing::info!(
                    companies = report.companies_added,
                    objects = report.objects,
                    duration_ms = duration.as_millis() as u64,
                    "Search complete"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retained = companies_added,
                    duration_ms = duration.as_millis() as u64,
                    "Search failed"
                );
                Err(e)
            }
        }
    }

    /// Supersede whatever is running and reset per-search state.
    fn begin(&self) -> (u64, CancellationToken, Option<String>) {
        let mut state = self.state();
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
            tracing::debug!(generation = state.generation, "Cancelled in-flight search");
        }

        state.generation += 1;
        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        state.results.clear();
        state.loading = true;
        state.last_duration = None;
        state.last_error = None;

        (state.generation, token, state.run_id.clone())
    }

    async fn run<F>(
        &self,
        query: &str,
        run_id: Option<String>,
        generation: u64,
        on_update: &mut F,
    ) -> Result<usize>
    where
        F: FnMut(&[Company]),
    {
        let response = self.client.open(query, run_id.as_deref()).await?;

        if let Some(captured) = &response.run_id {
            let mut state = self.state();
            if state.generation == generation {
                tracing::info!(run_id = %captured, "Captured run identifier");
                state.run_id = Some(captured.clone());
            }
        }

        let deadline = self.client.deadline();
        read_objects(response.into_chunks(), |object| {
            let added = {
                let mut state = self.state();
                if state.generation != generation {
                    return;
                }
                state.results.absorb(&object).to_vec()
            };
            if !added.is_empty() {
                tracing::debug!(added = added.len(), "Companies received");
                on_update(&added);
            }
        })
        .await
        .map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(deadline)
            } else {
                Error::Stream(e.to_string())
            }
        })
    }

    /// Record the outcome; returns the number of companies retained.
    fn finish(&self, generation: u64, duration: Duration, error: Option<&Error>) -> usize {
        let mut state = self.state();
        if state.generation != generation {
            return 0;
        }
        state.loading = false;
        state.cancel = None;
        state.last_duration = Some(duration);
        state.last_error = error.map(Error::user_message);
        state.results.len()
    }

    /// Cancel the in-flight search, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.state().cancel.take() {
            tracing::info!("Cancelling search");
            token.cancel();
        }
    }

    /// Forget the run identifier so the next search opens a new conversation.
    ///
    /// Also cancels a search still in flight, since it belongs to the old
    /// conversation.
    pub fn new_conversation(&self) {
        let mut state = self.state();
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        state.generation += 1;
        state.loading = false;
        if let Some(run_id) = state.run_id.take() {
            tracing::info!(run_id = %run_id, "Starting new conversation");
        }
    }

    /// Continue a conversation started elsewhere, e.g. by an earlier process.
    pub fn resume_conversation(&self, run_id: impl Into<String>) {
        let run_id = run_id.into();
        tracing::info!(run_id = %run_id, "Resuming conversation");
        self.state().run_id = Some(run_id);
    }

    pub fn run_id(&self) -> Option<String> {
        self.state().run_id.clone()
    }

    /// Snapshot of the companies accumulated by the current search.
    pub fn companies(&self) -> Vec<Company> {
        self.state().results.companies().to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn last_duration(&self) -> Option<Duration> {
        self.state().last_duration
    }

    /// User-facing message for the last failed search
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search() -> CompanySearch {
        CompanySearch::from_config(&AgentConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let search = search();
        assert!(search.run_id().is_none());
        assert!(search.companies().is_empty());
        assert!(!search.is_loading());
        assert!(search.last_error().is_none());
    }

    #[test]
    fn test_begin_cancels_previous_token() {
        let search = search();
        let (first, token, _) = search.begin();
        let (second, _, _) = search.begin();

        assert!(token.is_cancelled());
        assert_eq!(second, first + 1);
        assert!(search.is_loading());
    }

    #[test]
    fn test_stale_generation_does_not_finish() {
        let search = search();
        let (stale, _, _) = search.begin();
        search.begin();

        search.finish(stale, Duration::from_secs(1), Some(&Error::Cancelled));
        assert!(search.is_loading());
        assert!(search.last_error().is_none());
    }

    #[test]
    fn test_new_conversation_clears_run_id() {
        let search = search();
        search.state().run_id = Some("run-1".to_string());
        let (_, token, run_id) = search.begin();
        assert_eq!(run_id.as_deref(), Some("run-1"));

        search.new_conversation();
        assert!(token.is_cancelled());
        assert!(search.run_id().is_none());
        assert!(!search.is_loading());
    }
}
