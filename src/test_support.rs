// Shared fakes for unit tests

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    catalog_client::{CatalogSource, FetchError},
    domain::models::{Book, Page},
};

/// Serves `total` synthetic books per query, ids `"{query}-{n}"` (1-based),
/// and records every call.
pub struct RecordingCatalog {
    total: u64,
    failing: AtomicBool,
    calls: Mutex<Vec<(String, u32, u32)>>,
}

impl RecordingCatalog {
    pub fn new(total: u64) -> Arc<Self> {
        Arc::new(RecordingCatalog {
            total,
            failing: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|(q, _, _)| q).collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

pub fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        authors: Some(vec!["Anon".into()]),
        published_date: None,
        description: None,
        thumbnail_url: None,
        rating: None,
        preview_url: None,
    }
}

#[async_trait::async_trait]
impl CatalogSource for RecordingCatalog {
    async fn fetch_page(&self, query: &str, offset: u32, limit: u32) -> Result<Page, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), offset, limit));
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::TransportFailure {
                message: "connection reset".into(),
                status: None,
            });
        }
        let end = (offset as u64 + limit as u64).min(self.total);
        let items = (offset as u64..end)
            .map(|n| {
                book(
                    &format!("{}-{}", query, n + 1),
                    &format!("{} volume {}", query, n + 1),
                )
            })
            .collect();
        Ok(Page {
            items,
            total: self.total,
        })
    }
}
