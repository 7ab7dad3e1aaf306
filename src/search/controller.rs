use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use crate::{
    catalog_client::CatalogSource,
    config::SearchSettings,
    domain::models::Book,
};

use super::{
    debounce::Debouncer,
    events::{FetchCompletion, SearchEvent},
    session::{SearchPhase, SearchSession, SessionId},
};

/// Read-only copy of the controller state handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    /// Bumped on every state change
    pub revision: u64,
    pub session_id: Option<SessionId>,
    pub query: Option<String>,
    pub phase: SearchPhase,
    pub books: Vec<Book>,
    pub next_offset: u32,
    pub total_available: Option<u64>,
    /// Last failure of the current session, cleared by the next success
    pub last_error: Option<String>,
}

/// Owns the current search session and reconciles user intent with page
/// fetches.
///
/// Not thread safe by itself: every method must be called from one control
/// flow (see `search::service`). Fetches run on spawned tasks and report back
/// through `events` as [`SearchEvent::FetchCompleted`]; a completion whose
/// session id is not the current one is dropped without touching state.
pub struct CatalogSearchController {
    source: Arc<dyn CatalogSource>,
    settings: SearchSettings,
    events: UnboundedSender<SearchEvent>,
    session: Option<SearchSession>,
    last_session_id: SessionId,
    phase: SearchPhase,
    last_error: Option<String>,
    revision: u64,
    debounce: Debouncer,
    rng: StdRng,
}

impl CatalogSearchController {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        settings: SearchSettings,
        events: UnboundedSender<SearchEvent>,
    ) -> Self {
        let debounce = Debouncer::new(settings.debounce);
        CatalogSearchController {
            source,
            settings,
            events,
            session: None,
            last_session_id: 0,
            phase: SearchPhase::Idle,
            last_error: None,
            revision: 0,
            debounce,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source used to pick refresh topics.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let session = self.session.as_ref();
        SearchSnapshot {
            revision: self.revision,
            session_id: session.map(|s| s.id()),
            query: session.map(|s| s.query().to_string()),
            phase: self.phase,
            books: session.map(|s| s.results().to_vec()).unwrap_or_default(),
            next_offset: session.map(|s| s.next_offset()).unwrap_or(0),
            total_available: session.and_then(|s| s.total_available()),
            last_error: self.last_error.clone(),
        }
    }

    /// Dispatch one event.
    pub fn handle(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::TextChanged(text) => self.on_text_changed(&text),
            SearchEvent::Submitted(text) => self.on_search_submitted(&text),
            SearchEvent::RefreshRequested(text) => self.on_refresh_requested(&text),
            SearchEvent::ScrollNearEnd => self.on_scroll_near_end(),
            SearchEvent::RowVisible(index) => self.on_row_visible(index),
            SearchEvent::DebounceElapsed { generation, text } => {
                self.on_debounce_elapsed(generation, &text)
            }
            SearchEvent::FetchCompleted(completion) => self.on_fetch_completed(completion),
        }
    }

    /// Start the default-query session shown before the user types anything.
    pub fn initial_load(&mut self) {
        let query = self.settings.default_query.clone();
        self.start_session(query);
    }

    /// Supersede the current session with a fresh one for `query` and fetch
    /// its first page. Returns the new session id.
    pub fn start_session(&mut self, query: impl Into<String>) -> SessionId {
        let query = query.into();
        self.last_session_id += 1;
        let id = self.last_session_id;
        if let Some(old) = self.session.as_ref().filter(|s| s.page_in_flight()) {
            tracing::debug!(stale_session = old.id(), "abandoning session with a page in flight");
        }
        tracing::info!(session_id = id, query = %query, "starting search session");
        self.session = Some(SearchSession::new(id, query));
        self.last_error = None;
        self.phase = SearchPhase::Loading(id);
        self.touch();
        self.load_next_page();
        id
    }

    /// Request the next page of the current session. Returns whether a fetch
    /// was issued; a page already in flight or an exhausted session makes
    /// this a no-op.
    pub fn load_next_page(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.page_in_flight() {
            tracing::trace!(session_id = session.id(), "page already in flight");
            return false;
        }
        if session.is_exhausted() {
            tracing::trace!(session_id = session.id(), "session exhausted");
            return false;
        }

        let fetch = session.begin_fetch();
        let query = session.query().to_string();
        self.phase = if session.results().is_empty() {
            SearchPhase::Loading(fetch.session_id)
        } else {
            SearchPhase::Paginating(fetch.session_id)
        };
        self.touch();

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let limit = self.settings.page_size;
        let span = tracing::debug_span!(
            "page_fetch",
            session_id = fetch.session_id,
            offset = fetch.offset,
            limit
        );
        tokio::spawn(
            async move {
                let result = source.fetch_page(&query, fetch.offset, limit).await;
                if events
                    .send(SearchEvent::FetchCompleted(FetchCompletion { fetch, result }))
                    .is_err()
                {
                    tracing::debug!("search controller gone, dropping page");
                }
            }
            .instrument(span),
        );
        true
    }

    pub fn on_text_changed(&mut self, text: &str) {
        let events = self.events.clone();
        let text = text.to_string();
        let generation = self.debounce.schedule(move |generation| {
            let _ = events.send(SearchEvent::DebounceElapsed { generation, text });
        });
        tracing::trace!(generation, "debounce armed");
    }

    pub fn on_search_submitted(&mut self, text: &str) {
        self.debounce.cancel();
        let query = self.query_or_default(text);
        self.start_session(query);
    }

    pub fn on_refresh_requested(&mut self, text: &str) {
        self.debounce.cancel();
        let trimmed = text.trim();
        let query = if trimmed.is_empty() {
            self.random_topic()
        } else {
            trimmed.to_string()
        };
        self.start_session(query);
    }

    pub fn on_scroll_near_end(&mut self) {
        self.load_next_page();
    }

    /// Row `index` became visible; load more when it is within the lookahead
    /// window of the end of the list.
    pub fn on_row_visible(&mut self, index: usize) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if index + self.settings.scroll_lookahead >= session.results().len() {
            self.on_scroll_near_end();
        }
    }

    fn on_debounce_elapsed(&mut self, generation: u64, text: &str) {
        if !self.debounce.settle(generation) {
            tracing::debug!(generation, "ignoring outdated debounce expiry");
            return;
        }
        let query = self.query_or_default(text);
        self.start_session(query);
    }

    fn on_fetch_completed(&mut self, completion: FetchCompletion) {
        let FetchCompletion { fetch, result } = completion;
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.id() == fetch.session_id)
        else {
            tracing::debug!(
                session_id = fetch.session_id,
                offset = fetch.offset,
                ok = result.is_ok(),
                "discarding stale page"
            );
            return;
        };

        match result {
            Ok(page) => {
                let total = page.total;
                let appended = session.apply_page(page);
                self.last_error = None;
                self.phase = if session.is_exhausted() {
                    SearchPhase::Exhausted(session.id())
                } else {
                    SearchPhase::Ready(session.id())
                };
                tracing::debug!(
                    session_id = session.id(),
                    offset = fetch.offset,
                    appended,
                    loaded = session.results().len(),
                    total,
                    "page merged"
                );
            }
            Err(err) => {
                session.fail_fetch();
                self.phase = if session.results().is_empty() {
                    SearchPhase::Idle
                } else {
                    SearchPhase::Ready(session.id())
                };
                tracing::warn!(
                    session_id = session.id(),
                    offset = fetch.offset,
                    error = %err,
                    "page fetch failed"
                );
                self.last_error = Some(err.to_string());
            }
        }
        self.touch();
    }

    fn query_or_default(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.settings.default_query.clone()
        } else {
            trimmed.to_string()
        }
    }

    fn random_topic(&mut self) -> String {
        let topics: Vec<&String> = self
            .settings
            .topic_pool
            .iter()
            .filter(|t| !t.trim().is_empty())
            .collect();
        topics
            .choose(&mut self.rng)
            .map(|t| t.trim().to_string())
            .unwrap_or_else(|| self.settings.default_query.clone())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
