use std::time::Duration;

use anyhow::Context;

use crate::catalog_client::MAX_PAGE_SIZE;

#[derive(Debug)]
pub struct Config {
    pub catalog_api_key: String,
    pub catalog_base_url: String,
    pub bind_addr: String,
    pub search: SearchSettings,
}

const DEFAULT_CATALOG_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_SCROLL_LOOKAHEAD: usize = 5;
pub const DEFAULT_QUERY: &str = "fiction";

/// Topics a refresh on an empty search box picks from.
pub const TOPIC_POOL: [&str; 16] = [
    "fiction",
    "fantasy",
    "science fiction",
    "mystery",
    "history",
    "biography",
    "poetry",
    "philosophy",
    "romance",
    "thriller",
    "science",
    "travel",
    "art",
    "cooking",
    "psychology",
    "adventure",
];

/// Tunables of the catalog search session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub page_size: u32,
    pub debounce: Duration,
    /// Rows from the end of the list that trigger loading the next page
    pub scroll_lookahead: usize,
    pub default_query: String,
    pub topic_pool: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            scroll_lookahead: DEFAULT_SCROLL_LOOKAHEAD,
            default_query: DEFAULT_QUERY.to_string(),
            topic_pool: TOPIC_POOL.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let catalog_api_key = std::env::var("CATALOG_API_KEY").unwrap_or_default();
        let catalog_base_url =
            std::env::var("CATALOG_BASE_URL").unwrap_or(DEFAULT_CATALOG_BASE_URL.into());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR.into());

        let defaults = SearchSettings::default();
        let page_size = env_parse("SEARCH_PAGE_SIZE", defaults.page_size)?;
        let debounce_ms = env_parse("SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let scroll_lookahead = env_parse("SEARCH_SCROLL_LOOKAHEAD", defaults.scroll_lookahead)?;
        let default_query =
            std::env::var("SEARCH_DEFAULT_QUERY").unwrap_or(defaults.default_query.clone());

        Ok(Config {
            catalog_api_key,
            catalog_base_url,
            bind_addr,
            search: SearchSettings {
                page_size,
                debounce: Duration::from_millis(debounce_ms),
                scroll_lookahead,
                default_query: default_query.trim().to_string(),
                ..defaults
            },
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.catalog_base_url.is_empty() {
            return Err("CATALOG_BASE_URL is empty".into());
        }
        if self.bind_addr.is_empty() {
            return Err("BIND_ADDR is empty".into());
        }
        self.search.validate()
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "SEARCH_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            ));
        }
        if self.default_query.trim().is_empty() {
            return Err("SEARCH_DEFAULT_QUERY is empty".into());
        }
        if self.topic_pool.iter().all(|t| t.trim().is_empty()) {
            return Err("topic pool has no usable topic".into());
        }
        Ok(())
    }
}

fn env_parse<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {}", name, raw)),
        _ => Ok(default),
    }
}
