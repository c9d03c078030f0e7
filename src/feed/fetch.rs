// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{Episode, parse_feed};

/// Fetches podcast feeds and normalizes their entries into episodes
#[derive(Clone)]
pub struct FeedRetriever<C> {
    client: C,
}

impl<C: HttpClient> FeedRetriever<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetch a feed and return its downloadable episodes in document order
    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<Episode>, FeedError> {
        let base_url = Url::parse(feed_url)?;

        debug!(url = feed_url, "fetching feed");
        let bytes = fetch_feed_bytes(&self.client, feed_url).await?;

        let episodes = parse_feed(&bytes, &base_url)?;
        debug!(url = feed_url, episodes = episodes.len(), "feed retrieved");

        Ok(episodes)
    }

    /// Like [`FeedRetriever::fetch`], but logs the failure and yields no episodes
    pub async fn fetch_or_empty(&self, feed_url: &str) -> Vec<Episode> {
        match self.fetch(feed_url).await {
            Ok(episodes) => episodes,
            Err(e) => {
                warn!(url = feed_url, error = %e, "feed retrieval failed");
                Vec::new()
            }
        }
    }
}

/// Fetch raw feed bytes from a URL (without parsing)
async fn fetch_feed_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    let fetch_failed = |e| FeedError::Fetch {
        url: url.to_string(),
        source: e,
    };

    let response = client.get_stream(url).await.map_err(fetch_failed)?;

    if !response.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    response.into_bytes().await.map_err(fetch_failed)
}
