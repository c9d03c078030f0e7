use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching or parsing podcast feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to fetch feed from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for feed {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse feed as RSS ({rss}) or Atom ({atom})")]
    Parse {
        rss: rss::Error,
        atom: atom_syndication::Error,
    },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Download of {url} failed: {cause}")]
    Transport {
        url: String,
        #[source]
        cause: TransportCause,
    },

    #[error("Filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filename '{0}' is empty after sanitization")]
    InvalidFilename(String),
}

/// Underlying reason for a [`DownloadError::Transport`]
#[derive(Error, Debug)]
pub enum TransportCause {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("stream interrupted: {0}")]
    Stream(#[source] reqwest::Error),
}

/// Errors that can occur when querying a podcast catalog
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Search request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} from search endpoint {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to parse search response: {0}")]
    Parse(#[from] serde_json::Error),
}
