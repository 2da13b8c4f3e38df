//! HTTP client for the remote game catalog service.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    config::ApiSettings,
    models::{GameDetail, GameId, GameSummary, Screenshot, Trailer},
};

use super::records::{
    normalize, CatalogPage, RemoteGameDetail, RemoteMovie, RemoteScreenshot, ResultList,
};

/// Public endpoint of the catalog service.
pub const DEFAULT_BASE_URL: &str = "https://api.rawg.io/api";

/// Number of records requested per remote page.
pub const DEFAULT_REMOTE_PAGE_SIZE: u32 = 20;

/// Failures talking to the catalog service.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No key was provisioned for the endpoint.
    #[error("no API key configured for the catalog service")]
    MissingKey,

    /// Transport level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("catalog service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// The payload did not have the expected shape.
    #[error("unexpected response from catalog service: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Async client for the catalog service.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    preview_key: Option<String>,
    page_size: u32,
}

impl CatalogClient {
    /// Build a client from the `[api]` configuration table.
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mediaamp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.key.trim().to_string(),
            preview_key: settings
                .preview_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
            page_size: settings.page_size.max(1),
        })
    }

    /// Point the client at a different service root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one listing page and normalize every record on it.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<GameSummary>, FetchError> {
        let params = [
            ("page", page.max(1).to_string()),
            ("page_size", self.page_size.to_string()),
        ];
        let listing: CatalogPage = self.get("/games", &self.api_key, &params).await?;
        debug!(
            page,
            received = listing.results.len(),
            total = listing.count.unwrap_or_default(),
            "Catalog page received"
        );
        Ok(listing.results.into_iter().map(normalize).collect())
    }

    /// Fetch the full record for one game.
    pub async fn fetch_detail(&self, id: GameId) -> Result<GameDetail, FetchError> {
        let detail: RemoteGameDetail = self
            .get(&format!("/games/{id}"), &self.api_key, &[])
            .await?;
        Ok(detail.into())
    }

    /// Fetch screenshots for one game.
    pub async fn fetch_screenshots(&self, id: GameId) -> Result<Vec<Screenshot>, FetchError> {
        let list: ResultList<RemoteScreenshot> = self
            .get(&format!("/games/{id}/screenshots"), &self.api_key, &[])
            .await?;
        Ok(list.results.into_iter().map(Screenshot::from).collect())
    }

    /// Fetch trailers for one game.
    pub async fn fetch_trailers(&self, id: GameId) -> Result<Vec<Trailer>, FetchError> {
        let list: ResultList<RemoteMovie> = self
            .get(&format!("/games/{id}/movies"), &self.api_key, &[])
            .await?;
        Ok(list.results.into_iter().map(Trailer::from).collect())
    }

    /// First screenshot of a library entry, fetched with the preview key.
    ///
    /// Returns `Ok(None)` without a request when no preview key is configured.
    pub async fn fetch_preview(&self, id: GameId) -> Result<Option<String>, FetchError> {
        let Some(key) = self.preview_key.as_deref() else {
            return Ok(None);
        };
        let list: ResultList<RemoteScreenshot> = self
            .get(&format!("/games/{id}/screenshots"), key, &[])
            .await?;
        Ok(list
            .results
            .into_iter()
            .map(|shot| Screenshot::from(shot).image)
            .find(|image| !image.is_empty()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        key: &str,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        if key.is_empty() {
            return Err(FetchError::MissingKey);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(&[("key", key)])
            .query(params)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "Catalog request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: summarize_body(status, &body),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn summarize_body(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status.canonical_reason().unwrap_or("no body").to_string();
    }
    trimmed.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned response and hands back the raw request head.
    async fn mock_server(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let status = status.to_string();
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let read = stream.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..read]).to_string();

            let resp = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (url, handle)
    }

    fn client(base_url: &str, key: &str, preview_key: Option<&str>) -> CatalogClient {
        let settings = ApiSettings {
            base_url: base_url.to_string(),
            key: key.to_string(),
            preview_key: preview_key.map(str::to_string),
            page_size: DEFAULT_REMOTE_PAGE_SIZE,
        };
        CatalogClient::new(&settings).unwrap()
    }

    #[tokio::test]
    async fn fetch_page_sends_paging_query_and_normalizes() {
        let body = r#"{"count": 2, "results": [
            {"id": 1, "name": "Halo", "slug": "halo", "released": "2001-11-15",
             "genres": [{"name": "Shooter"}], "tags": []},
            {"id": 2, "name": "Minecraft", "slug": "minecraft", "released": null}
        ]}"#;
        let (url, handle) = mock_server("200 OK", body).await;

        let games = client(&url, "secret", None).fetch_page(3).await.unwrap();
        let request = handle.await.unwrap();

        let request_line = request.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /games?"));
        assert!(request_line.contains("key=secret"));
        assert!(request_line.contains("page=3"));
        assert!(request_line.contains("page_size=20"));

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].category, "Shooter");
        assert_eq!(games[0].release_year, Some(2001));
        assert_eq!(games[1].category, "N/A");
        assert_eq!(games[1].release_year, None);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (url, _handle) = mock_server("401 Unauthorized", r#"{"error": "bad key"}"#).await;

        let err = client(&url, "wrong", None).fetch_page(1).await.unwrap_err();
        match err {
            FetchError::Status { status, ref body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let (url, _handle) = mock_server("200 OK", r#"{"results": "nope"}"#).await;

        let err = client(&url, "secret", None).fetch_page(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let err = client("http://127.0.0.1:9", "  ", None)
            .fetch_page(1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingKey));
    }

    #[tokio::test]
    async fn preview_uses_its_own_key() {
        let body = r#"{"results": [{"id": 5, "image": "https://media.example.com/shot.jpg"}]}"#;
        let (url, handle) = mock_server("200 OK", body).await;

        let preview = client(&url, "main", Some("preview"))
            .fetch_preview(42)
            .await
            .unwrap();
        let request = handle.await.unwrap();

        assert_eq!(preview.as_deref(), Some("https://media.example.com/shot.jpg"));
        let request_line = request.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /games/42/screenshots?"));
        assert!(request_line.contains("key=preview"));
        assert!(!request_line.contains("key=main"));
    }

    #[tokio::test]
    async fn trailers_prefer_the_full_quality_stream() {
        let body = r#"{"count": 1, "results": [
            {"id": 9, "name": "Launch Trailer",
             "data": {"480": "https://v.example.com/480.mp4", "max": "https://v.example.com/max.mp4"}}
        ]}"#;
        let (url, handle) = mock_server("200 OK", body).await;

        let trailers = client(&url, "secret", None).fetch_trailers(7).await.unwrap();
        let request = handle.await.unwrap();

        assert!(request.starts_with("GET /games/7/movies?"));
        assert_eq!(trailers.len(), 1);
        assert_eq!(trailers[0].name, "Launch Trailer");
        assert_eq!(trailers[0].url.as_deref(), Some("https://v.example.com/max.mp4"));
    }

    #[tokio::test]
    async fn preview_without_key_is_skipped() {
        let preview = client("http://127.0.0.1:9", "main", None)
            .fetch_preview(42)
            .await
            .unwrap();
        assert!(preview.is_none());
    }
}
