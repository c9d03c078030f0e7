pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod search;

// Re-export main types for convenience
pub use episode::{CHUNK_SIZE, DownloadResult, EpisodeDownloader, get_audio_extension, sanitize};
pub use error::{DownloadError, FeedError, SearchError, TransportCause};
pub use feed::{Episode, FeedRetriever, UNTITLED_EPISODE, parse_feed};
pub use http::{ByteStream, HttpClient, HttpResponse, ReqwestClient};
pub use search::{ItunesSearch, PodcastSearch, PodcastSummary};
