/// iTunes Search API response types for deserialization.
///
/// These structures mirror the JSON returned by `GET /search?entity=podcast`.
use serde::Deserialize;

/// The top-level search response
#[derive(Debug, Deserialize)]
pub(super) struct ItunesResponse {
    #[serde(default)]
    pub results: Vec<ItunesPodcast>,
}

/// A single podcast result; every field may be missing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ItunesPodcast {
    pub collection_id: Option<u64>,
    pub artist_id: Option<u64>,
    pub collection_name: Option<String>,
    pub artist_name: Option<String>,
    pub feed_url: Option<String>,
    pub artwork_url600: Option<String>,
    pub primary_genre_name: Option<String>,
}
