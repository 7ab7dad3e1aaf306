use poem_openapi::{
    OpenApi,
    param::Path,
    payload::{Json, PlainText},
};

use super::models::{
    AcceptedResponse, BookDetailResponse, ScrollRequestDto, SearchSnapshotResponse,
    SearchTextRequestDto,
};
use super::services::{health::HealthService, search::SearchService};
use crate::search::SearchHandle;

pub struct CatalogApi {
    pub search: SearchHandle,
}

#[OpenApi]
impl CatalogApi {
    #[oai(path = "/status", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn status(&self) -> PlainText<String> {
        tracing::debug!("handling /status");
        HealthService::new(&self.search).status_text()
    }

    /// Current search session: query, state and loaded books
    #[oai(path = "/v1/search", method = "get")]
    async fn current_search(&self) -> SearchSnapshotResponse {
        SearchService::new(&self.search).snapshot()
    }

    /// Search box text changed (debounced)
    #[oai(path = "/v1/search/text", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn text_changed(&self, body: Json<SearchTextRequestDto>) -> AcceptedResponse {
        SearchService::new(&self.search).text_changed(body.0.text)
    }

    /// Search button pressed
    #[oai(path = "/v1/search/submit", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn submit(&self, body: Json<SearchTextRequestDto>) -> AcceptedResponse {
        SearchService::new(&self.search).submit(body.0.text)
    }

    /// Pull-to-refresh; an empty text picks a random topic
    #[oai(path = "/v1/search/refresh", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn refresh(&self, body: Json<SearchTextRequestDto>) -> AcceptedResponse {
        SearchService::new(&self.search).refresh(body.0.text)
    }

    /// List scrolled; loads the next page when close to the end
    #[oai(path = "/v1/search/scroll", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn scroll(&self, body: Json<ScrollRequestDto>) -> AcceptedResponse {
        SearchService::new(&self.search).scroll(body.0.visible_index)
    }

    /// Detail of one book from the current results
    #[oai(path = "/v1/books/:book_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, book_id))]
    async fn book_detail(&self, book_id: Path<String>) -> BookDetailResponse {
        SearchService::new(&self.search).book_detail(&book_id.0)
    }
}

#[cfg(test)]
mod tests {
    use poem::{Route, http::StatusCode, test::TestClient};
    use poem_openapi::OpenApiService;
    use serde_json::json;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{
        config::SearchSettings,
        search::{SearchPhase, service},
        test_support::RecordingCatalog,
    };

    struct Fixture {
        client: TestClient<Route>,
        search: SearchHandle,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    }

    async fn fixture(total: u64) -> Fixture {
        let cancel = CancellationToken::new();
        let (search, task) = service::spawn(
            RecordingCatalog::new(total),
            SearchSettings::default(),
            cancel.clone(),
        );
        search
            .subscribe()
            .wait_for(|s| matches!(s.phase, SearchPhase::Ready(_) | SearchPhase::Exhausted(_)))
            .await
            .unwrap();
        let api = OpenApiService::new(
            CatalogApi {
                search: search.clone(),
            },
            "test",
            "0",
        );
        Fixture {
            client: TestClient::new(Route::new().nest("/", api)),
            search,
            cancel,
            task,
        }
    }

    impl Fixture {
        async fn shutdown(self) {
            self.cancel.cancel();
            self.task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn current_search_returns_default_session() {
        let fx = fixture(57).await;
        let resp = fx.client.get("/v1/search").send().await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let obj = body.value().object();
        obj.get("query").assert_string("fiction");
        obj.get("state").assert_string("ready");
        obj.get("books").array().assert_len(20);
        obj.get("has_more").assert_bool(true);
        fx.shutdown().await;
    }

    #[tokio::test]
    async fn submit_is_accepted_and_replaces_results() {
        let fx = fixture(57).await;
        let resp = fx
            .client
            .post("/v1/search/submit")
            .body_json(&json!({ "text": "dune" }))
            .send()
            .await;
        resp.assert_status(StatusCode::ACCEPTED);

        fx.search
            .subscribe()
            .wait_for(|s| s.query.as_deref() == Some("dune") && matches!(s.phase, SearchPhase::Ready(_)))
            .await
            .unwrap();

        let resp = fx.client.get("/v1/books/dune-3").send().await;
        resp.assert_status_is_ok();
        resp.json()
            .await
            .value()
            .object()
            .get("authors_line")
            .assert_string("Anon");

        let resp = fx.client.get("/v1/books/fiction-3").send().await;
        resp.assert_status(StatusCode::NOT_FOUND);
        fx.shutdown().await;
    }

    #[tokio::test]
    async fn scroll_loads_next_page() {
        let fx = fixture(57).await;
        let resp = fx
            .client
            .post("/v1/search/scroll")
            .body_json(&json!({ "visible_index": 18 }))
            .send()
            .await;
        resp.assert_status(StatusCode::ACCEPTED);
        let snap = fx
            .search
            .subscribe()
            .wait_for(|s| s.books.len() == 40)
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.next_offset, 40);
        fx.shutdown().await;
    }

    #[tokio::test]
    async fn events_after_shutdown_are_unavailable() {
        let fx = fixture(57).await;
        fx.cancel.cancel();
        let Fixture { client, task, .. } = fx;
        task.await.unwrap();
        let resp = client
            .post("/v1/search/refresh")
            .body_json(&json!({ "text": "" }))
            .send()
            .await;
        resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
