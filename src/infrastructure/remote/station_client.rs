//! HTTP client for the station's request channel

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote control errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("No such file on the station: {0}")]
    NotFound(String),

    #[error("Station answered HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    ParseError(String),

    #[error("Failed to send datagram to {addr}: {message}")]
    SendFailed { addr: String, message: String },

    #[error("Failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },
}

/// Body of `/start` and `/stop`
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

pub struct StationClient {
    base_url: String,
    client: reqwest::Client,
}

impl StationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, RemoteError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Names of the stored files
    pub async fn list(&self) -> Result<Vec<String>, RemoteError> {
        self.get("list")
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))
    }

    pub async fn start(&self) -> Result<StatusResponse, RemoteError> {
        self.status_of("start").await
    }

    pub async fn stop(&self) -> Result<StatusResponse, RemoteError> {
        self.status_of("stop").await
    }

    async fn status_of(&self, path: &str) -> Result<StatusResponse, RemoteError> {
        self.get(path)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(e.to_string()))
    }

    /// Stream a stored file to `dest`, reporting the running byte count.
    ///
    /// # Returns
    /// Bytes written
    pub async fn download<F>(&self, name: &str, dest: &Path, on_progress: F) -> Result<u64, RemoteError>
    where
        F: Fn(u64),
    {
        let mut response = self.get(name).await?;

        let write_failed = |e: std::io::Error| RemoteError::WriteFailed {
            path: dest.display().to_string(),
            message: e.to_string(),
        };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_failed)?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?
        {
            file.write_all(&chunk).await.map_err(write_failed)?;
            written += chunk.len() as u64;
            on_progress(written);
        }
        file.flush().await.map_err(write_failed)?;

        Ok(written)
    }
}
