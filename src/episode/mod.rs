mod download;
mod filename;

pub use download::{CHUNK_SIZE, DownloadResult, EpisodeDownloader};
pub use filename::{get_audio_extension, sanitize};
