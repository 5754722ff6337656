//! HTTP Backend Implementation
//!
//! Production client for the document-intelligence service over HTTP.
//!
//! # Service API
//!
//! - `POST /api/v1/documents/upload` - Multipart upload, answers 202 Accepted
//!   with the indexing job handle
//! - `GET <status_url>` - Indexing job status
//! - `GET /api/v1/documents` - List of indexed documents
//! - `POST /api/v1/documents/{id}/chat` - Streamed answer; raw UTF-8 chunks,
//!   end signaled by connection close

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::decode::Utf8Decoder;
use super::traits::{
    BackendError, DocumentBackend, DocumentInfo, StreamingToken, UploadAccepted,
};
use crate::config::ClientConfig;
use crate::jobs::JobStatus;

/// API path prefix, shared by every endpoint except server-provided status URLs
const API_BASE_PATH: &str = "/api/v1";

/// Error body the server sends alongside non-success statuses
#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Request body for the chat endpoint
#[derive(Serialize)]
struct ChatPayload<'a> {
    question: &'a str,
}

/// HTTP client for the document service
#[derive(Clone)]
pub struct HttpBackend {
    /// Service base URL, without a trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a new backend
    ///
    /// The optional `session_cookie` is attached as a default `Cookie` header
    /// on every request (ambient credential context).
    pub fn new(base_url: impl Into<String>, session_cookie: Option<&str>) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(cookie) = session_cookie {
            if let Ok(value) = reqwest::header::HeaderValue::from_str(cookie) {
                headers.insert(reqwest::header::COOKIE, value);
            } else {
                tracing::warn!("Session cookie contains invalid header characters, ignoring");
            }
        }

        let base = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .default_headers(headers)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from `ClientConfig`
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone(), config.session_cookie.as_deref())
    }

    /// Upload endpoint URL
    fn upload_url(&self) -> String {
        format!("{}{}/documents/upload", self.base_url, API_BASE_PATH)
    }

    /// Document list endpoint URL
    fn documents_url(&self) -> String {
        format!("{}{}/documents", self.base_url, API_BASE_PATH)
    }

    /// Chat endpoint URL for a document
    fn chat_url(&self, document_id: i64) -> String {
        format!(
            "{}{}/documents/{}/chat",
            self.base_url, API_BASE_PATH, document_id
        )
    }

    /// Resolve a server-provided URL, which may be relative to the base URL
    fn resolve(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.documents_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadAccepted, BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        // The server dispatches the indexing job asynchronously, so success
        // is 202 Accepted and nothing else.
        if response.status() != reqwest::StatusCode::ACCEPTED {
            let status = response.status();
            let detail = match response.json::<ErrorBody>().await {
                Ok(body) => body.detail,
                Err(_) => format!("server answered {status}"),
            };
            return Err(BackendError::UploadRejected { detail });
        }

        Ok(response.json::<UploadAccepted>().await?)
    }

    async fn job_status(&self, status_url: &str) -> Result<JobStatus, BackendError> {
        let response = self
            .http_client
            .get(self.resolve(status_url))
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<JobStatus>().await?)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, BackendError> {
        let response = self
            .http_client
            .get(self.documents_url())
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<Vec<DocumentInfo>>().await?)
    }

    async fn ask_streaming(
        &self,
        document_id: i64,
        question: &str,
    ) -> Result<mpsc::Receiver<StreamingToken>, BackendError> {
        let response = self
            .http_client
            .post(self.chat_url(document_id))
            .json(&ChatPayload { question })
            .send()
            .await
            .map_err(|e| BackendError::StreamUnavailable(e.to_string()))?;

        // Failure before any bytes were produced
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(BackendError::StreamUnavailable(format!(
                "{status}: {detail}"
            )));
        }

        let mut stream = response.bytes_stream();
        let (tx, rx) = mpsc::channel(100);

        // Spawn task to read the chunked body and forward decoded text
        tokio::spawn(async move {
            let mut decoder = Utf8Decoder::new();
            let mut full_response = String::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => match decoder.feed(&bytes) {
                        Ok(text) => {
                            if text.is_empty() {
                                // Chunk ended mid-character; the tail is
                                // buffered until the rest arrives.
                                continue;
                            }
                            full_response.push_str(&text);
                            if tx.send(StreamingToken::Token(text)).await.is_err() {
                                // Receiver dropped, stop reading
                                return;
                            }
                        }
                        Err(e) => {
                            let _ = tx
                                .send(StreamingToken::Error(
                                    BackendError::StreamInterrupted(e.to_string()).to_string(),
                                ))
                                .await;
                            return;
                        }
                    },
                    Err(e) => {
                        let _ = tx
                            .send(StreamingToken::Error(
                                BackendError::StreamInterrupted(e.to_string()).to_string(),
                            ))
                            .await;
                        return;
                    }
                }
            }

            if let Err(e) = decoder.finish() {
                let _ = tx
                    .send(StreamingToken::Error(
                        BackendError::StreamInterrupted(e.to_string()).to_string(),
                    ))
                    .await;
                return;
            }

            // The server signals completion by closing the connection.
            let _ = tx
                .send(StreamingToken::Complete {
                    message: full_response,
                })
                .await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let backend = HttpBackend::new("http://localhost:8000", None);
        assert_eq!(
            backend.upload_url(),
            "http://localhost:8000/api/v1/documents/upload"
        );
        assert_eq!(
            backend.documents_url(),
            "http://localhost:8000/api/v1/documents"
        );
        assert_eq!(
            backend.chat_url(42),
            "http://localhost:8000/api/v1/documents/42/chat"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/", None);
        assert_eq!(
            backend.documents_url(),
            "http://localhost:8000/api/v1/documents"
        );
    }

    #[test]
    fn test_resolve_status_url() {
        let backend = HttpBackend::new("http://localhost:8000", None);

        // Relative path, as the server usually sends it
        assert_eq!(
            backend.resolve("/api/v1/documents/jobs/abc"),
            "http://localhost:8000/api/v1/documents/jobs/abc"
        );

        // Already absolute
        assert_eq!(
            backend.resolve("http://other:9000/api/v1/documents/jobs/abc"),
            "http://other:9000/api/v1/documents/jobs/abc"
        );

        // Relative without a leading slash
        assert_eq!(
            backend.resolve("api/v1/documents/jobs/abc"),
            "http://localhost:8000/api/v1/documents/jobs/abc"
        );
    }
}
