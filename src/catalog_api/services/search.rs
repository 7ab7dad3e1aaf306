use poem_openapi::payload::Json;

use crate::{
    catalog_api::models::{
        AcceptedResponse, BookDetailResponse, BookDto, ErrorDto, SearchSnapshotDto,
        SearchSnapshotResponse,
    },
    search::{SearchHandle, ServiceStopped},
};

pub struct SearchService<'a> {
    pub search: &'a SearchHandle,
}

impl<'a> SearchService<'a> {
    pub fn new(search: &'a SearchHandle) -> Self {
        Self { search }
    }

    pub fn snapshot(&self) -> SearchSnapshotResponse {
        let snap = self.search.snapshot();
        SearchSnapshotResponse::Ok(Json(SearchSnapshotDto::from(&snap)))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn text_changed(&self, text: String) -> AcceptedResponse {
        accepted(self.search.text_changed(text))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn submit(&self, text: String) -> AcceptedResponse {
        accepted(self.search.submit(text))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn refresh(&self, text: String) -> AcceptedResponse {
        accepted(self.search.refresh(text))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn scroll(&self, visible_index: Option<u32>) -> AcceptedResponse {
        let res = match visible_index {
            Some(index) => self.search.row_visible(index as usize),
            None => self.search.scroll_near_end(),
        };
        accepted(res)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn book_detail(&self, book_id: &str) -> BookDetailResponse {
        let snap = self.search.snapshot();
        match snap.books.iter().find(|b| b.id == book_id) {
            Some(book) => BookDetailResponse::Ok(Json(BookDto::from(book))),
            None => BookDetailResponse::NotFound(Json(ErrorDto {
                message: format!("book {} is not in the current results", book_id),
            })),
        }
    }
}

fn accepted(res: Result<(), ServiceStopped>) -> AcceptedResponse {
    match res {
        Ok(()) => AcceptedResponse::Accepted,
        Err(e) => {
            tracing::error!(error = %e, "search event rejected");
            AcceptedResponse::Unavailable(Json(ErrorDto {
                message: e.to_string(),
            }))
        }
    }
}
