// Domain models shared by the catalog client, the search controller and the API layer

/// One catalog entry as returned by the volumes search.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    /// Always served over https, see `domain::mapping::secure_url`.
    pub thumbnail_url: Option<String>,
    pub rating: Option<f64>,
    pub preview_url: Option<String>,
}

impl Book {
    /// Authors joined for display, "Unknown Author" when the provider sent none.
    pub fn authors_line(&self) -> String {
        match self.authors.as_deref() {
            Some(authors) if !authors.is_empty() => authors.join(", "),
            _ => "Unknown Author".to_string(),
        }
    }
}

/// One bounded slice of search results plus the provider's total hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Book>,
    pub total: u64,
}
