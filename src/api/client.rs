use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::models::DownloaderConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server responded with {0}")]
    Status(StatusCode),

    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: DownloaderConfig,
}

impl ApiClient {
    pub fn new(config: DownloaderConfig) -> Result<Self> {
        // Redirects are followed by the default policy.
        let client = Client::builder()
            .connect_timeout(config.transfer_timeout)
            .read_timeout(config.transfer_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| ApiError::InvalidUrl(url.to_string(), e))
    }

    /// Step 1: HEAD probe for the expected size.
    /// `Ok(None)` when the server does not report a usable length.
    pub async fn probe_size(&self, url: &str) -> Result<Option<u64>> {
        let response = self
            .client
            .head(Self::parse_url(url)?)
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        // `Response::content_length` reports the (empty) HEAD body, so read the header.
        let size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|len| *len > 0);

        Ok(size)
    }

    /// Step 2: streaming GET of the body.
    pub async fn download_file_stream(
        &self,
        url: &str,
    ) -> Result<BoxStream<'static, Result<bytes::Bytes>>> {
        let response = self.client.get(Self::parse_url(url)?).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(DownloaderConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_probe_reads_content_length_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/file.exe")
            .with_status(200)
            .with_header("content-length", "1000")
            .create_async()
            .await;

        let size = client()
            .probe_size(&format!("{}/file.exe", server.url()))
            .await
            .unwrap();

        assert_eq!(size, Some(1000));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_without_length_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/file.exe")
            .with_status(200)
            .create_async()
            .await;

        let size = client()
            .probe_size(&format!("{}/file.exe", server.url()))
            .await
            .unwrap();

        assert_eq!(size, None);
    }

    #[tokio::test]
    async fn test_probe_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/file.exe")
            .with_status(405)
            .create_async()
            .await;

        let err = client()
            .probe_size(&format!("{}/file.exe", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status(StatusCode::METHOD_NOT_ALLOWED)));
    }

    #[tokio::test]
    async fn test_stream_rejects_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.exe")
            .with_status(404)
            .create_async()
            .await;

        let result = client()
            .download_file_stream(&format!("{}/missing.exe", server.url()))
            .await;

        assert!(matches!(result, Err(ApiError::Status(StatusCode::NOT_FOUND))));
    }

    #[tokio::test]
    async fn test_stream_yields_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/file.exe")
            .with_status(200)
            .with_body("hello installer")
            .create_async()
            .await;

        let stream = client()
            .download_file_stream(&format!("{}/file.exe", server.url()))
            .await
            .unwrap();

        let chunks: Vec<_> = stream.collect().await;
        let body: Vec<u8> = chunks
            .into_iter()
            .map(|chunk| chunk.unwrap())
            .flat_map(|chunk| chunk.to_vec())
            .collect();
        assert_eq!(body, b"hello installer");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let result = client().probe_size("::not a url::").await;
        assert!(matches!(result, Err(ApiError::InvalidUrl(..))));
    }
}
