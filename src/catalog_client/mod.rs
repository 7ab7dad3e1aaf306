mod error;

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::domain::{
    mapping::map_volume_to_book,
    models::{Book, Page},
};

pub use error::FetchError;

/// Largest `maxResults` the volumes endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 40;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything that can serve one page of catalog results.
///
/// The search controller only talks to this seam; [`BookCatalogClient`] is the
/// HTTP implementation.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, query: &str, offset: u32, limit: u32) -> Result<Page, FetchError>;
}

/// Stateless client for the Google Books volumes search.
#[derive(Clone, Debug)]
pub struct BookCatalogClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl BookCatalogClient {
    /// Create a new client for the given volumes endpoint
    /// (e.g. "https://www.googleapis.com/books/v1/volumes").
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating BookCatalogClient");
        Ok(BookCatalogClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            api_key: None,
            client,
        })
    }

    /// Return a client that sends the provided API key. An empty key is ignored.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Build the search URL for one page. Does not perform a request.
    pub fn volumes_url(&self, query: &str, offset: u32, limit: u32) -> Result<Url, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetchError::InvalidRequest("query is empty".into()));
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(FetchError::InvalidRequest(format!(
                "limit {} outside 1..={}",
                limit, MAX_PAGE_SIZE
            )));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("base url {}: {}", self.base_url, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query)
                .append_pair("startIndex", &offset.to_string())
                .append_pair("maxResults", &limit.to_string());
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        Ok(url)
    }

    /// GET one page of volumes matching `query`, starting at `offset`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_page(&self, query: &str, offset: u32, limit: u32) -> Result<Page, FetchError> {
        let url = self.volumes_url(query, offset, limit)?;
        tracing::debug!(url = %redact_key(&url), "GET volumes page");

        let resp = self.client.get(url).send().await?;
        let status = resp.error_for_status()?;
        let body = status.text().await?;
        let parsed = match serde_json::from_str::<VolumesResponse>(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                let snippet = body_snippet(&body, 2000);
                tracing::error!(error = %e, body_snippet = %snippet, "failed to parse VolumesResponse");
                return Err(e.into());
            }
        };

        let items: Vec<Book> = parsed
            .items
            .unwrap_or_default()
            .into_iter()
            .map(map_volume_to_book)
            .collect();
        tracing::debug!(count = items.len(), total = parsed.total_items, "decoded volumes page");
        Ok(Page {
            items,
            total: parsed.total_items,
        })
    }
}

#[async_trait::async_trait]
impl CatalogSource for BookCatalogClient {
    async fn fetch_page(&self, query: &str, offset: u32, limit: u32) -> Result<Page, FetchError> {
        BookCatalogClient::fetch_page(self, query, offset, limit).await
    }
}

fn redact_key(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

fn body_snippet(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

// ============ Wire format ============

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    pub total_items: u64,
    pub items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub image_links: Option<ImageLinks>,
    pub average_rating: Option<f64>,
    pub preview_link: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}
