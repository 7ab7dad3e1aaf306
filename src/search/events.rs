use crate::{catalog_client::FetchError, domain::models::Page};

use super::session::PendingFetch;

/// Everything the search controller reacts to, delivered one at a time.
#[derive(Debug)]
pub enum SearchEvent {
    /// Search box text edited; debounced
    TextChanged(String),
    /// Search button pressed; bypasses the debounce
    Submitted(String),
    /// Pull-to-refresh with the text currently in the search box
    RefreshRequested(String),
    /// The list is close to its end
    ScrollNearEnd,
    /// A row at this index became visible
    RowVisible(usize),
    /// Debounce timer expired for the given generation
    DebounceElapsed { generation: u64, text: String },
    /// A page fetch finished, successfully or not
    FetchCompleted(FetchCompletion),
}

#[derive(Debug)]
pub struct FetchCompletion {
    pub fetch: PendingFetch,
    pub result: Result<Page, FetchError>,
}
