//! Podcast catalog search.
//!
//! The download pipeline only ever needs a feed URL. Where it comes from is
//! up to a [`PodcastSearch`] implementation chosen by the caller.
mod itunes;
mod itunes_types;

pub use itunes::ItunesSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A podcast as listed by a catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastSummary {
    /// Provider-specific identifier
    pub id: String,
    pub name: String,
    pub artist: String,
    /// RSS or Atom feed to hand to the feed retriever
    pub feed_url: String,
    pub artwork_url: String,
    pub genre: String,
}

/// A catalog that can look up podcasts by free-text query
#[async_trait]
pub trait PodcastSearch: Send + Sync {
    /// Search for podcasts matching `query`
    ///
    /// Results without a feed URL are never returned.
    async fn search_podcasts(&self, query: &str) -> Result<Vec<PodcastSummary>, SearchError>;
}
