//! Where the package index comes from.
//!
//! The loader only sees the [`IndexSource`] trait, so tests can substitute an
//! in-memory source and the binary can browse either a server or a saved file.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::IndexLoadError;

/// Path of the index document on a documentation server.
pub const DEFAULT_INDEX_PATH: &str = "/resources/shortcuts.json";

/// A fetchable index document.
pub trait IndexSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn location(&self) -> &str;

    /// Fetch the raw document body.
    fn fetch(&self) -> BoxFuture<'static, Result<Vec<u8>, IndexLoadError>>;
}

/// Index served over HTTP(S).
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IndexLoadError> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexLoadError::Fetch {
                location: url.clone(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, url })
    }
}

impl IndexSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> BoxFuture<'static, Result<Vec<u8>, IndexLoadError>> {
        let client = self.client.clone();
        let url = self.url.clone();
        async move {
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| IndexLoadError::Fetch {
                    location: url.clone(),
                    message: e.to_string(),
                })?;

            if !response.status().is_success() {
                return Err(IndexLoadError::Status {
                    location: url,
                    status: response.status().as_u16(),
                });
            }

            response
                .bytes()
                .await
                .map(|body| body.to_vec())
                .map_err(|e| IndexLoadError::Fetch {
                    location: url.clone(),
                    message: format!("failed to read response: {}", e),
                })
        }
        .boxed()
    }
}

/// Index saved on the local filesystem.
pub struct FileSource {
    path: PathBuf,
    location: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = path.display().to_string();
        Self { path, location }
    }
}

impl IndexSource for FileSource {
    fn location(&self) -> &str {
        &self.location
    }

    fn fetch(&self) -> BoxFuture<'static, Result<Vec<u8>, IndexLoadError>> {
        let path = self.path.clone();
        let location = self.location.clone();
        async move {
            tokio::fs::read(&path)
                .await
                .map_err(|e| IndexLoadError::Fetch {
                    location,
                    message: e.to_string(),
                })
        }
        .boxed()
    }
}

/// Pick a source for `location`: URLs go over HTTP, anything else is a file path.
pub fn source_for(
    location: &str,
    timeout: Duration,
) -> Result<Arc<dyn IndexSource>, IndexLoadError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpSource::new(location, timeout)?))
    } else {
        Ok(Arc::new(FileSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_source_for_picks_transport() {
        let url = "http://localhost:8080/resources/shortcuts.json";
        let http = source_for(url, Duration::from_secs(5)).unwrap();
        assert_eq!(http.location(), url);

        let file = source_for("./shortcuts.json", Duration::from_secs(5)).unwrap();
        assert_eq!(file.location(), "./shortcuts.json");
    }

    #[tokio::test]
    async fn test_file_source_reads_body() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"pkgA": {}}"#).unwrap();

        let source = FileSource::new(file.path());
        let body = source.fetch().await.unwrap();
        assert_eq!(body, br#"{"pkgA": {}}"#.to_vec());
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("shortcuts.json"));

        match source.fetch().await {
            Err(IndexLoadError::Fetch { location, .. }) => {
                assert!(location.ends_with("shortcuts.json"));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    /// Accept one connection on a local port and answer it with `response`.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}{}", addr, DEFAULT_INDEX_PATH)
    }

    #[tokio::test]
    async fn test_http_source_reads_body() {
        let body = r#"{"pkgA": {"Type1": {}}}"#;
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ))
        .await;

        let source = HttpSource::new(url, Duration::from_secs(5)).unwrap();
        assert_eq!(source.fetch().await.unwrap(), body.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
        )
        .await;

        let source = HttpSource::new(url.clone(), Duration::from_secs(5)).unwrap();
        match source.fetch().await {
            Err(IndexLoadError::Status { status, location }) => {
                assert_eq!(status, 404);
                assert_eq!(location, url);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_fetch_error() {
        // Reserve a free port, then release it so nothing is listening there.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let source = HttpSource::new(
            format!("http://127.0.0.1:{}{}", port, DEFAULT_INDEX_PATH),
            Duration::from_secs(2),
        )
        .unwrap();

        let result = source.fetch().await;
        assert!(matches!(result, Err(IndexLoadError::Fetch { .. })));
    }
}
