use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{DownloadError, TransportCause};
use crate::http::HttpClient;

use super::filename::sanitize;

/// Upper bound for a single write to the destination file
pub const CHUNK_SIZE: usize = 8192;

/// Outcome of [`EpisodeDownloader::download`]: the written file or why it failed
pub type DownloadResult = Result<PathBuf, DownloadError>;

/// Streams episode audio into files below a download root directory
pub struct EpisodeDownloader<C> {
    client: C,
    root: PathBuf,
}

impl<C: HttpClient> EpisodeDownloader<C> {
    /// Create a downloader writing below `root`, creating the directory if needed
    pub fn new(client: C, root: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| io_failed(&root, e))?;
        Ok(Self { client, root })
    }

    /// Directory downloaded files are written to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Download `url` into the root directory under the sanitized `filename`
    ///
    /// When the server announces a Content-Length the body is written in
    /// pieces of at most [`CHUNK_SIZE`] bytes and `on_progress` receives the
    /// percentage after every piece. The value is not clamped, so a server
    /// sending more than it announced pushes it past 100. Without a usable
    /// Content-Length the body is written in one go and `on_progress` is
    /// never called.
    ///
    /// A failure part-way leaves the partial file in place.
    pub async fn download(
        &self,
        url: &str,
        filename: &str,
        mut on_progress: Option<&mut dyn FnMut(f64)>,
    ) -> DownloadResult {
        let safe_name = sanitize(filename);
        if safe_name.is_empty() {
            return Err(DownloadError::InvalidFilename(filename.to_string()));
        }
        let output_path = self.root.join(safe_name);

        let transport_failed = |cause| DownloadError::Transport {
            url: url.to_string(),
            cause,
        };

        let response = self
            .client
            .get_stream(url)
            .await
            .map_err(|e| transport_failed(TransportCause::Request(e)))?;

        // Bail out before touching the filesystem
        if !response.is_success() {
            return Err(transport_failed(TransportCause::Status(response.status)));
        }

        let total_size = response.content_length.filter(|&len| len > 0);
        debug!(url, path = %output_path.display(), ?total_size, "starting download");

        let mut file = File::create(&output_path)
            .await
            .map_err(|e| io_failed(&output_path, e))?;

        let bytes_written = match total_size {
            None => {
                let body = response
                    .into_bytes()
                    .await
                    .map_err(|e| transport_failed(TransportCause::Stream(e)))?;

                file.write_all(&body)
                    .await
                    .map_err(|e| io_failed(&output_path, e))?;

                body.len() as u64
            }
            Some(total) => {
                let mut bytes_downloaded: u64 = 0;
                let mut stream = response.body;

                while let Some(chunk_result) = stream.next().await {
                    let chunk =
                        chunk_result.map_err(|e| transport_failed(TransportCause::Stream(e)))?;

                    for piece in chunk.chunks(CHUNK_SIZE) {
                        file.write_all(piece)
                            .await
                            .map_err(|e| io_failed(&output_path, e))?;

                        bytes_downloaded += piece.len() as u64;

                        if let Some(report) = on_progress.as_deref_mut() {
                            report(bytes_downloaded as f64 / total as f64 * 100.0);
                        }
                    }
                }

                bytes_downloaded
            }
        };

        // Ensure all data is flushed to disk
        file.flush()
            .await
            .map_err(|e| io_failed(&output_path, e))?;

        debug!(url, bytes_written, "download finished");

        Ok(output_path)
    }
}

fn io_failed(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ReqwestClient;
    use crate::http::testing::{Scripted, ScriptedClient};

    use tempfile::tempdir;

    const EPISODE_URL: &str = "http://x/ep.mp3";

    fn downloader(root: &Path, response: Scripted) -> EpisodeDownloader<ScriptedClient> {
        let client = ScriptedClient::new().with(EPISODE_URL, response);
        EpisodeDownloader::new(client, root).unwrap()
    }

    #[tokio::test]
    async fn download_reports_progress_per_chunk() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), Scripted::ok(vec![vec![1u8; 512], vec![2u8; 512]]));

        let mut reported = Vec::new();
        let mut on_progress = |percent: f64| reported.push(percent);

        let path = downloader
            .download(EPISODE_URL, "My: Show/1.mp3", Some(&mut on_progress))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("My_ Show_1.mp3"));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024);
        assert_eq!(reported, vec![50.0, 100.0]);
    }

    #[tokio::test]
    async fn download_splits_large_chunks() {
        let dir = tempdir().unwrap();
        let body = vec![7u8; 2 * CHUNK_SIZE + 100];
        let downloader = downloader(dir.path(), Scripted::ok(vec![body.clone()]));

        let mut reported = Vec::new();
        let mut on_progress = |percent: f64| reported.push(percent);

        let path = downloader
            .download(EPISODE_URL, "big.mp3", Some(&mut on_progress))
            .await
            .unwrap();

        assert_eq!(reported.len(), 3);
        assert_eq!(reported.last(), Some(&100.0));
        assert!(reported.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(std::fs::read(path).unwrap(), body);
    }

    #[tokio::test]
    async fn download_without_content_length_skips_progress() {
        let dir = tempdir().unwrap();
        let downloader = downloader(
            dir.path(),
            Scripted::without_length(vec![b"test audio ".to_vec(), b"content".to_vec()]),
        );

        let mut calls = 0;
        let mut on_progress = |_: f64| calls += 1;

        let path = downloader
            .download(EPISODE_URL, "episode.mp3", Some(&mut on_progress))
            .await
            .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(std::fs::read(path).unwrap(), b"test audio content");
    }

    #[tokio::test]
    async fn download_treats_zero_content_length_as_unknown() {
        let dir = tempdir().unwrap();
        let response = Scripted {
            status: 200,
            content_length: Some(0),
            chunks: vec![b"surprise".to_vec()],
        };
        let downloader = downloader(dir.path(), response);

        let mut calls = 0;
        let mut on_progress = |_: f64| calls += 1;

        let path = downloader
            .download(EPISODE_URL, "episode.mp3", Some(&mut on_progress))
            .await
            .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(std::fs::read(path).unwrap(), b"surprise");
    }

    #[tokio::test]
    async fn download_progress_can_exceed_declared_size() {
        let dir = tempdir().unwrap();
        let response = Scripted {
            status: 200,
            content_length: Some(100),
            chunks: vec![vec![0u8; 100], vec![0u8; 50]],
        };
        let downloader = downloader(dir.path(), response);

        let mut reported = Vec::new();
        let mut on_progress = |percent: f64| reported.push(percent);

        downloader
            .download(EPISODE_URL, "episode.mp3", Some(&mut on_progress))
            .await
            .unwrap();

        assert_eq!(reported, vec![100.0, 150.0]);
    }

    #[tokio::test]
    async fn download_works_without_callback() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), Scripted::ok(vec![b"abc".to_vec()]));

        let path = downloader
            .download(EPISODE_URL, "episode.mp3", None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn download_fails_on_http_error_without_creating_file() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), Scripted::status(404));

        let result = downloader.download(EPISODE_URL, "episode.mp3", None).await;

        match result {
            Err(DownloadError::Transport {
                cause: TransportCause::Status(status),
                ..
            }) => assert_eq!(status, 404),
            other => panic!("Expected Transport status error, got {:?}", other),
        }
        assert!(!dir.path().join("episode.mp3").exists());
    }

    #[tokio::test]
    async fn download_wraps_connection_failures() {
        let dir = tempdir().unwrap();
        let downloader = EpisodeDownloader::new(ReqwestClient::new(), dir.path()).unwrap();

        let result = downloader
            .download("http://127.0.0.1:1/ep.mp3", "episode.mp3", None)
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::Transport {
                cause: TransportCause::Request(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn download_cut_off_mid_body_keeps_partial_file() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Announce 5000 bytes, send 100, then hang up
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n")
                .await
                .unwrap();
            socket.write_all(&[9u8; 100]).await.unwrap();
            socket.flush().await.unwrap();
        });

        let dir = tempdir().unwrap();
        let downloader = EpisodeDownloader::new(ReqwestClient::new(), dir.path()).unwrap();
        let url = format!("http://{addr}/ep.mp3");

        let result = downloader.download(&url, "episode.mp3", None).await;
        server.await.unwrap();

        assert!(matches!(
            result,
            Err(DownloadError::Transport {
                cause: TransportCause::Stream(_),
                ..
            })
        ));
        assert!(dir.path().join("episode.mp3").exists());
    }

    #[tokio::test]
    async fn download_reports_filesystem_failures() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();
        let downloader = downloader(dir.path(), Scripted::ok(vec![b"abc".to_vec()]));

        let result = downloader.download(EPISODE_URL, "taken", None).await;

        match result {
            Err(DownloadError::Io { path, .. }) => assert_eq!(path, dir.path().join("taken")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn download_rejects_blank_filename() {
        let dir = tempdir().unwrap();
        let downloader = downloader(dir.path(), Scripted::ok(vec![b"abc".to_vec()]));

        let result = downloader.download(EPISODE_URL, "   ", None).await;
        assert!(matches!(result, Err(DownloadError::InvalidFilename(_))));
    }

    #[test]
    fn new_creates_missing_root_and_tolerates_existing() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("downloads");

        let first = EpisodeDownloader::new(ScriptedClient::new(), &root).unwrap();
        assert!(root.is_dir());
        assert_eq!(first.root(), root.as_path());

        EpisodeDownloader::new(ScriptedClient::new(), &root).unwrap();
    }
}
