use poem_openapi::payload::PlainText;

use crate::{catalog_api::models::SearchStateDto, search::SearchHandle};

pub struct HealthService<'a> {
    pub search: &'a SearchHandle,
}

impl<'a> HealthService<'a> {
    pub fn new(search: &'a SearchHandle) -> Self {
        Self { search }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn status_text(&self) -> PlainText<String> {
        let snap = self.search.snapshot();
        let state = SearchStateDto::from(snap.phase);
        PlainText(format!(
            "{} version={} session={} state={:?}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            snap.session_id.unwrap_or(0),
            state
        ))
    }
}
