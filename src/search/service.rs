use std::sync::Arc;

use thiserror::Error;
use tokio::{
    select,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{catalog_client::CatalogSource, config::SearchSettings};

use super::{
    controller::{CatalogSearchController, SearchSnapshot},
    events::SearchEvent,
};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("search service has stopped")]
pub struct ServiceStopped;

/// Cloneable front door to the search task.
#[derive(Clone, Debug)]
pub struct SearchHandle {
    events: UnboundedSender<SearchEvent>,
    snapshots: watch::Receiver<SearchSnapshot>,
}

impl SearchHandle {
    pub fn text_changed(&self, text: impl Into<String>) -> Result<(), ServiceStopped> {
        self.send(SearchEvent::TextChanged(text.into()))
    }

    pub fn submit(&self, text: impl Into<String>) -> Result<(), ServiceStopped> {
        self.send(SearchEvent::Submitted(text.into()))
    }

    pub fn refresh(&self, text: impl Into<String>) -> Result<(), ServiceStopped> {
        self.send(SearchEvent::RefreshRequested(text.into()))
    }

    pub fn scroll_near_end(&self) -> Result<(), ServiceStopped> {
        self.send(SearchEvent::ScrollNearEnd)
    }

    pub fn row_visible(&self, index: usize) -> Result<(), ServiceStopped> {
        self.send(SearchEvent::RowVisible(index))
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, event: SearchEvent) -> Result<(), ServiceStopped> {
        self.events.send(event).map_err(|_| ServiceStopped)
    }
}

/// Spawn the task that owns the search controller.
///
/// The task starts the default-query session, then handles events one at a
/// time until `cancel` fires. User input, timer expiries and fetch
/// completions all arrive on the same channel, so controller state is only
/// ever touched from this task.
pub fn spawn(
    source: Arc<dyn CatalogSource>,
    settings: SearchSettings,
    cancel: CancellationToken,
) -> (SearchHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = CatalogSearchController::new(source, settings, tx.clone());
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
    let task = tokio::spawn(run(controller, rx, snapshot_tx, cancel));
    let handle = SearchHandle {
        events: tx,
        snapshots: snapshot_rx,
    };
    (handle, task)
}

async fn run(
    mut controller: CatalogSearchController,
    mut events: UnboundedReceiver<SearchEvent>,
    snapshots: watch::Sender<SearchSnapshot>,
    cancel: CancellationToken,
) {
    tracing::info!("search service started");
    controller.initial_load();
    publish(&controller, &snapshots);

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_event = events.recv() => {
                // The controller holds a sender itself, so `None` only
                // happens if it was dropped.
                let Some(event) = maybe_event else { break };
                controller.handle(event);
                publish(&controller, &snapshots);
            }
        }
    }
    tracing::info!("search service stopped");
}

fn publish(controller: &CatalogSearchController, snapshots: &watch::Sender<SearchSnapshot>) {
    let revision = controller.revision();
    snapshots.send_if_modified(|current| {
        if current.revision == revision {
            return false;
        }
        *current = controller.snapshot();
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{search::session::SearchPhase, test_support::RecordingCatalog};

    fn start(
        total: u64,
    ) -> (SearchHandle, JoinHandle<()>, CancellationToken, Arc<RecordingCatalog>) {
        let source = RecordingCatalog::new(total);
        let cancel = CancellationToken::new();
        let (handle, task) = spawn(source.clone(), SearchSettings::default(), cancel.clone());
        (handle, task, cancel, source)
    }

    #[tokio::test]
    async fn loads_default_query_on_start() {
        let (handle, task, cancel, _) = start(57);
        let mut rx = handle.subscribe();
        let snap = rx
            .wait_for(|s| matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.query.as_deref(), Some("fiction"));
        assert_eq!(snap.books.len(), 20);
        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn submit_then_scroll_grows_the_new_session() {
        let (handle, task, cancel, source) = start(57);
        let mut rx = handle.subscribe();
        rx.wait_for(|s| matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap();

        handle.submit("dune").unwrap();
        rx.wait_for(|s| s.query.as_deref() == Some("dune") && matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap();
        handle.row_visible(17).unwrap();
        let snap = rx
            .wait_for(|s| s.books.len() == 40)
            .await
            .unwrap()
            .clone();
        assert!(snap.books.iter().all(|b| b.id.starts_with("dune-")));
        assert_eq!(snap.next_offset, 40);
        assert_eq!(
            source.queries(),
            vec!["fiction", "dune", "dune"]
        );

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn typed_text_is_debounced_through_the_service() {
        let (handle, task, cancel, source) = start(57);
        let mut rx = handle.subscribe();
        rx.wait_for(|s| matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap();

        for text in ["l", "le", "le g", "le guin"] {
            handle.text_changed(text).unwrap();
        }
        let snap = rx
            .wait_for(|s| s.query.as_deref() == Some("le guin") && matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.session_id, Some(2));
        assert_eq!(source.queries().len(), 2);

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn handle_reports_stopped_service() {
        let (handle, task, cancel, _) = start(57);
        cancel.cancel();
        task.await.unwrap();
        assert_eq!(handle.submit("dune"), Err(ServiceStopped));
    }
}
