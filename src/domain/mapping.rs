// Mapping from catalog wire DTOs to domain models

use super::models::Book;
use crate::catalog_client::Volume;

/// Upgrade a plaintext `http://` URL to `https://`. Other schemes pass through.
pub fn secure_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

pub fn map_volume_to_book(volume: Volume) -> Book {
    let info = volume.volume_info;
    let thumbnail_url = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        .map(|t| secure_url(&t));

    Book {
        id: volume.id,
        title: info.title,
        authors: info.authors,
        published_date: info.published_date,
        description: info.description,
        thumbnail_url,
        rating: info.average_rating,
        preview_url: info.preview_link,
    }
}
