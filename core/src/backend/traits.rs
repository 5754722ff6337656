//! Document Backend Traits
//!
//! Trait definitions for the document service client. This abstraction lets
//! the Coordinator drive uploads, status checks, and answer streams against
//! the real HTTP service or a test double without changing core logic.
//!
//! # Design Philosophy
//!
//! The `DocumentBackend` trait provides a common interface for:
//! - Uploading a document and receiving the indexing job handle
//! - Checking job status and listing indexed documents
//! - Opening a streamed answer to a question
//!
//! Streamed answers are delivered as a channel of [`StreamingToken`]s so the
//! consumer logic is identical regardless of the underlying transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::jobs::JobStatus;

/// Token stream events from an answer stream
#[derive(Clone, Debug)]
pub enum StreamingToken {
    /// A chunk of answer text, in arrival order
    Token(String),
    /// Answer completed successfully
    Complete {
        /// The complete answer text
        message: String,
    },
    /// Error occurred before completion; any partial text must be discarded
    Error(String),
}

/// An indexed document known to the server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Server-assigned document ID
    pub id: i64,
    /// Original filename
    pub filename: String,
}

/// Response to an accepted upload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadAccepted {
    /// Server-assigned ID of the document being indexed
    pub document_id: i64,
    /// Filename as recorded by the server
    pub filename: String,
    /// Endpoint to poll for indexing job status
    pub status_url: String,
    /// Initial state of the indexing job
    #[serde(rename = "job_details")]
    pub job: JobStatus,
}

/// Errors from the document service transport
#[derive(Debug, Error)]
pub enum BackendError {
    /// The server refused the upload (anything other than 202 Accepted)
    #[error("upload rejected: {detail}")]
    UploadRejected {
        /// Server-provided detail message, or a generic one naming the status
        detail: String,
    },

    /// A plain JSON exchange answered with a non-success HTTP status
    #[error("request failed with HTTP status {status}")]
    RequestFailed {
        /// The HTTP status code
        status: u16,
    },

    /// The answer stream failed before any bytes were produced
    #[error("answer stream unavailable: {0}")]
    StreamUnavailable(String),

    /// The answer stream ended abnormally mid-stream
    #[error("answer stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Document service backend trait
///
/// All calls carry ambient credential context (a session cookie configured on
/// the transport); authentication itself is a precondition, not core logic.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Get the backend name (e.g., "http")
    fn name(&self) -> &str;

    /// Check if the service is healthy and reachable
    async fn health_check(&self) -> bool;

    /// Upload a document for indexing (multipart, field name `file`)
    ///
    /// Success is HTTP 202 with the job handle; anything else is
    /// [`BackendError::UploadRejected`].
    async fn upload_document(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadAccepted, BackendError>;

    /// Fetch the current status of an indexing job
    async fn job_status(&self, status_url: &str) -> Result<JobStatus, BackendError>;

    /// List the indexed documents, in server order
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, BackendError>;

    /// Ask a question about a document and stream the answer
    ///
    /// Returns a channel receiver that yields tokens as they arrive. The
    /// channel closes after `Complete` or `Error`; dropping the receiver
    /// cancels the read. Fails with [`BackendError::StreamUnavailable`] when
    /// the response signals failure before any bytes are produced.
    async fn ask_streaming(
        &self,
        document_id: i64,
        question: &str,
    ) -> Result<mpsc::Receiver<StreamingToken>, BackendError>;
}
