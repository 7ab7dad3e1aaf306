use crate::domain::models::{Book, Page};

pub type SessionId = u64;

/// Where the controller is in the life of its current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No session, or the first page of the current one failed
    Idle,
    /// First page of the session is in flight
    Loading(SessionId),
    /// At least one page loaded, more may be available
    Ready(SessionId),
    /// Next page in flight while earlier results stay visible
    Paginating(SessionId),
    /// Everything the provider reported has been loaded
    Exhausted(SessionId),
}

/// The fetch a completion belongs to, captured when the request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFetch {
    pub session_id: SessionId,
    pub offset: u32,
}

/// One search query and its accumulated results.
///
/// A new value replaces the old one on every query change; the old one is
/// dropped and never touched again. `next_offset` is derived from the result
/// count so there can be no gap between the two.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSession {
    id: SessionId,
    query: String,
    results: Vec<Book>,
    total_available: Option<u64>,
    page_in_flight: bool,
}

impl SearchSession {
    pub fn new(id: SessionId, query: impl Into<String>) -> Self {
        SearchSession {
            id,
            query: query.into(),
            results: Vec::new(),
            total_available: None,
            page_in_flight: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[Book] {
        &self.results
    }

    pub fn next_offset(&self) -> u32 {
        u32::try_from(self.results.len()).unwrap_or(u32::MAX)
    }

    /// Provider's total hint; `None` until the first page arrives.
    pub fn total_available(&self) -> Option<u64> {
        self.total_available
    }

    pub fn page_in_flight(&self) -> bool {
        self.page_in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_available
            .is_some_and(|total| self.results.len() as u64 >= total)
    }

    pub fn can_load_more(&self) -> bool {
        !self.page_in_flight && !self.is_exhausted()
    }

    /// Mark a page as in flight and return the tag its completion must carry.
    pub(crate) fn begin_fetch(&mut self) -> PendingFetch {
        self.page_in_flight = true;
        PendingFetch {
            session_id: self.id,
            offset: self.next_offset(),
        }
    }

    /// Append a page in server order and refresh the total hint. Returns the
    /// number of books appended.
    pub(crate) fn apply_page(&mut self, page: Page) -> usize {
        self.page_in_flight = false;
        let appended = page.items.len();
        self.results.extend(page.items);
        let loaded = self.results.len() as u64;
        // An empty page means the provider has nothing past this offset,
        // whatever its total claims.
        self.total_available = if appended == 0 {
            Some(loaded)
        } else {
            Some(page.total.max(loaded))
        };
        appended
    }

    pub(crate) fn fail_fetch(&mut self) {
        self.page_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(prefix: &str, range: std::ops::Range<u32>) -> Vec<Book> {
        range
            .map(|n| Book {
                id: format!("{prefix}{n}"),
                title: format!("Title {n}"),
                authors: None,
                published_date: None,
                description: None,
                thumbnail_url: None,
                rating: None,
                preview_url: None,
            })
            .collect()
    }

    #[test]
    fn offset_tracks_result_count_across_pages() {
        let mut s = SearchSession::new(1, "dune");
        assert_eq!(s.total_available(), None);
        assert!(s.can_load_more());

        let fetch = s.begin_fetch();
        assert_eq!(fetch, PendingFetch { session_id: 1, offset: 0 });
        assert!(!s.can_load_more());
        s.apply_page(Page { items: books("B", 1..21), total: 57 });
        assert_eq!(s.next_offset(), 20);

        let fetch = s.begin_fetch();
        assert_eq!(fetch.offset, 20);
        s.apply_page(Page { items: books("B", 21..41), total: 57 });
        assert_eq!(s.next_offset(), 40);
        assert_eq!(s.results().len(), 40);
        assert!(!s.is_exhausted());
    }

    #[test]
    fn reaching_total_exhausts() {
        let mut s = SearchSession::new(1, "dune");
        s.begin_fetch();
        s.apply_page(Page { items: books("B", 1..4), total: 3 });
        assert!(s.is_exhausted());
        assert!(!s.can_load_more());
    }

    #[test]
    fn empty_page_exhausts_even_if_total_claims_more() {
        let mut s = SearchSession::new(1, "dune");
        s.begin_fetch();
        s.apply_page(Page { items: books("B", 1..21), total: 500 });
        s.begin_fetch();
        assert_eq!(s.apply_page(Page { items: vec![], total: 500 }), 0);
        assert_eq!(s.total_available(), Some(20));
        assert!(s.is_exhausted());
    }

    #[test]
    fn shrinking_total_never_drops_below_loaded() {
        let mut s = SearchSession::new(1, "dune");
        s.begin_fetch();
        s.apply_page(Page { items: books("B", 1..21), total: 12 });
        assert_eq!(s.total_available(), Some(20));
    }

    #[test]
    fn failed_fetch_clears_in_flight_only() {
        let mut s = SearchSession::new(1, "dune");
        s.begin_fetch();
        s.fail_fetch();
        assert!(s.can_load_more());
        assert!(s.results().is_empty());
        assert_eq!(s.total_available(), None);
    }
}
