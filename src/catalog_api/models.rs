use poem_openapi::{ApiResponse, Enum, Object, payload::Json};

use crate::{
    domain::models::Book,
    search::{SearchPhase, SearchSnapshot},
};

#[derive(Debug, Clone, Object)]
pub struct BookDto {
    pub id: String,
    pub title: String,
    pub authors: Option<Vec<String>>,
    /// Authors joined for display
    pub authors_line: String,
    pub published_date: Option<String>,
    pub description: Option<String>,
    /// Always https
    pub thumbnail_url: Option<String>,
    pub rating: Option<f64>,
    pub preview_url: Option<String>,
}

impl From<&Book> for BookDto {
    fn from(book: &Book) -> Self {
        BookDto {
            id: book.id.clone(),
            title: book.title.clone(),
            authors: book.authors.clone(),
            authors_line: book.authors_line(),
            published_date: book.published_date.clone(),
            description: book.description.clone(),
            thumbnail_url: book.thumbnail_url.clone(),
            rating: book.rating,
            preview_url: book.preview_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[oai(rename_all = "snake_case")]
pub enum SearchStateDto {
    Idle,
    Loading,
    Ready,
    Paginating,
    Exhausted,
}

impl From<SearchPhase> for SearchStateDto {
    fn from(phase: SearchPhase) -> Self {
        match phase {
            SearchPhase::Idle => SearchStateDto::Idle,
            SearchPhase::Loading(_) => SearchStateDto::Loading,
            SearchPhase::Ready(_) => SearchStateDto::Ready,
            SearchPhase::Paginating(_) => SearchStateDto::Paginating,
            SearchPhase::Exhausted(_) => SearchStateDto::Exhausted,
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct SearchSnapshotDto {
    pub revision: u64,
    pub session_id: Option<u64>,
    pub query: Option<String>,
    pub state: SearchStateDto,
    pub books: Vec<BookDto>,
    pub next_offset: u32,
    /// Provider's total hint, absent until the first page arrives
    pub total_available: Option<u64>,
    /// Whether scrolling further can load more
    pub has_more: bool,
    /// Set when the last fetch of this session failed
    pub last_error: Option<String>,
}

impl From<&SearchSnapshot> for SearchSnapshotDto {
    fn from(snap: &SearchSnapshot) -> Self {
        let has_more = match snap.phase {
            SearchPhase::Ready(_) | SearchPhase::Paginating(_) => true,
            SearchPhase::Idle => snap.session_id.is_some(),
            SearchPhase::Loading(_) | SearchPhase::Exhausted(_) => false,
        };
        SearchSnapshotDto {
            revision: snap.revision,
            session_id: snap.session_id,
            query: snap.query.clone(),
            state: snap.phase.into(),
            books: snap.books.iter().map(BookDto::from).collect(),
            next_offset: snap.next_offset,
            total_available: snap.total_available,
            has_more,
            last_error: snap.last_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Object)]
pub struct SearchTextRequestDto {
    /// Current search box text; may be empty
    #[oai(default)]
    pub text: String,
}

#[derive(Debug, Clone, Object)]
pub struct ScrollRequestDto {
    /// Index of the row that just became visible. Without it the request is
    /// treated as "near the end".
    pub visible_index: Option<u32>,
}

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub message: String,
}

#[derive(ApiResponse)]
pub enum SearchSnapshotResponse {
    /// Current search session
    #[oai(status = 200)]
    Ok(Json<SearchSnapshotDto>),
}

#[derive(ApiResponse)]
pub enum AcceptedResponse {
    /// Event queued for the search session
    #[oai(status = 202)]
    Accepted,

    /// Search service is not running
    #[oai(status = 503)]
    Unavailable(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum BookDetailResponse {
    /// Book from the current results
    #[oai(status = 200)]
    Ok(Json<BookDto>),

    /// Not part of the current results
    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),
}
