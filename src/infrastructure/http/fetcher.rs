//! `reqwest`-backed fetch adapter.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::domain::ports::{FetchError, FetchPort, FetchResult};
use crate::infrastructure::config::ResourceCacheConfig;

/// HTTP GET adapter backed by a shared `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a client with the configured timeout and user agent.
    ///
    /// # Errors
    /// Returns [`FetchError::Transport`] if the client cannot be built.
    pub fn new(config: &ResourceCacheConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> FetchResult<reqwest::Response> {
        debug!(url = %url, "Issuing GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl FetchPort for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> FetchResult<Bytes> {
        let response = self.get(url).await?;
        response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read body: {e}")))
    }

    async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("failed to read body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/")
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ResourceCacheConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_text_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let text = fetcher().fetch_text(&url).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_fetch_bytes_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nabcd",
        )
        .await;

        let bytes = fetcher().fetch_bytes(&url).await.unwrap();
        assert_eq!(&bytes[..], b"abcd");
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_status_error() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let err = fetcher().fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_transport_error() {
        // Bind to grab a free port, then drop the listener so nothing answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher()
            .fetch_text(&format!("http://{addr}/"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
