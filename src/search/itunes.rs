/// iTunes Search API provider implementation.
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::itunes_types::{ItunesPodcast, ItunesResponse};
use super::{PodcastSearch, PodcastSummary};
use crate::error::SearchError;
use crate::http::HttpClient;

const DEFAULT_BASE_URL: &str = "https://itunes.apple.com/";
const DEFAULT_LIMIT: usize = 10;
const UNKNOWN: &str = "Unknown";

/// Podcast search backed by the public iTunes Search API.
///
/// Needs no credentials. Queries `{base}/search` restricted to podcasts.
pub struct ItunesSearch<C> {
    client: C,
    base_url: Url,
    limit: usize,
}

impl<C: HttpClient> ItunesSearch<C> {
    /// Creates a provider talking to the public iTunes endpoint.
    pub fn new(client: C) -> Result<Self, SearchError> {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Creates a provider talking to a different host, e.g. a proxy or test server.
    pub fn with_base_url(client: C, base_url: &str) -> Result<Self, SearchError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            limit: DEFAULT_LIMIT,
        })
    }

    /// Caps the number of results the API is asked for.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, SearchError> {
        let mut url = self.base_url.join("search")?;
        url.query_pairs_mut()
            .append_pair("term", query)
            .append_pair("entity", "podcast")
            .append_pair("media", "podcast")
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    /// Converts an API result into a summary, dropping it if it has no feed.
    fn convert_podcast(podcast: ItunesPodcast) -> Option<PodcastSummary> {
        let feed_url = podcast.feed_url.filter(|url| !url.trim().is_empty())?;
        let id = podcast.collection_id.or(podcast.artist_id).unwrap_or(0);

        Some(PodcastSummary {
            id: id.to_string(),
            name: podcast
                .collection_name
                .unwrap_or_else(|| UNKNOWN.to_string()),
            artist: podcast.artist_name.unwrap_or_else(|| UNKNOWN.to_string()),
            feed_url,
            artwork_url: podcast.artwork_url600.unwrap_or_default(),
            genre: podcast
                .primary_genre_name
                .unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }
}

#[async_trait]
impl<C: HttpClient> PodcastSearch for ItunesSearch<C> {
    async fn search_podcasts(&self, query: &str) -> Result<Vec<PodcastSummary>, SearchError> {
        let url = self.search_url(query)?;
        debug!(%url, "searching iTunes");

        let request_failed = |e| SearchError::Request {
            url: url.to_string(),
            source: e,
        };

        let response = self
            .client
            .get_stream(url.as_str())
            .await
            .map_err(request_failed)?;

        if !response.is_success() {
            return Err(SearchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let body = response.into_bytes().await.map_err(request_failed)?;
        let parsed: ItunesResponse = serde_json::from_slice(&body)?;

        let podcasts: Vec<_> = parsed
            .results
            .into_iter()
            .filter_map(Self::convert_podcast)
            .collect();
        debug!(results = podcasts.len(), "iTunes search finished");

        Ok(podcasts)
    }
}
