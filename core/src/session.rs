//! Session Management
//!
//! Holds the conversation state for the active document: message history, the
//! in-flight answer buffer, the latest indexing job observation, and the
//! user-visible error. All mutation goes through named transitions driven by
//! the Coordinator, one event at a time.
//!
//! # Design Philosophy
//!
//! History is per-document and append-only; adopting or selecting a different
//! document starts it empty. The in-flight answer lives in a separate mutable
//! buffer and is promoted into history only when its stream completes - a
//! failed stream never commits a truncated answer.

use serde::{Deserialize, Serialize};

use crate::backend::DocumentInfo;
use crate::jobs::JobStatus;
use crate::messages::{MessageId, MessageRole};

/// A finalized message in the conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl ConversationMessage {
    /// Create a new message
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
        }
    }
}

/// Transient accumulator for an in-progress answer
///
/// Promoted to an immutable [`ConversationMessage`] only on successful stream
/// completion; discarded on error or cancellation.
#[derive(Clone, Debug)]
pub struct StreamBuffer {
    /// The ID the finalized assistant message will carry
    pub message_id: MessageId,
    /// The full answer text accumulated so far
    pub accumulated: String,
}

/// Conversation state for the active document
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Finalized messages, in order
    messages: Vec<ConversationMessage>,
    /// In-flight answer, if a stream is active
    buffer: Option<StreamBuffer>,
    /// User-visible error from the last failed operation
    error: Option<String>,
    /// Whether an indexing job is being tracked
    indexing: bool,
    /// The document questions are asked about
    document: Option<DocumentInfo>,
    /// Latest indexing job observation, for display
    job: Option<JobStatus>,
}

impl Session {
    /// Create an empty session with no active document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // Upload / indexing transitions
    // ============================================

    /// An upload was accepted and its job is now being tracked
    pub fn begin_upload(&mut self) {
        self.indexing = true;
        self.error = None;
        self.job = None;
    }

    /// Record the latest job observation (pass-through display update)
    pub fn on_job_update(&mut self, job: JobStatus) {
        self.job = Some(job);
    }

    /// The indexing job succeeded; adopt the new document
    ///
    /// History is per-document and starts empty for the adopted one.
    pub fn on_job_success(&mut self, document: DocumentInfo) {
        self.document = Some(document);
        self.indexing = false;
        self.messages.clear();
        self.buffer = None;
    }

    /// The indexing job failed
    pub fn on_job_failure(&mut self, job: JobStatus) {
        self.error = Some(job.message.clone());
        self.job = Some(job);
        self.indexing = false;
    }

    /// Job tracking itself broke down (status check failed or timed out)
    pub fn on_job_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.indexing = false;
    }

    // ============================================
    // Question / answer transitions
    // ============================================

    /// Submit a question
    ///
    /// Rejected as a no-op (`None`) while busy or when the trimmed text is
    /// empty. Otherwise the user message is appended immediately, the answer
    /// buffer opens, and the user message ID is returned.
    pub fn submit_question(&mut self, text: &str) -> Option<MessageId> {
        if self.is_busy() {
            tracing::debug!("Question rejected: session busy");
            return None;
        }
        if text.trim().is_empty() {
            tracing::debug!("Question rejected: empty");
            return None;
        }

        let message = ConversationMessage::new(MessageRole::User, text.to_string());
        let id = message.id.clone();
        self.messages.push(message);
        self.error = None;
        self.buffer = Some(StreamBuffer {
            message_id: MessageId::new(),
            accumulated: String::new(),
        });
        Some(id)
    }

    /// Update the in-flight answer with the full accumulated text
    ///
    /// Permanent history is untouched.
    pub fn on_assistant_token(&mut self, accumulated: &str) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.accumulated = accumulated.to_string();
        }
    }

    /// The answer stream completed; promote the buffer into history
    ///
    /// Returns the ID of the finalized assistant message.
    pub fn on_assistant_complete(&mut self, final_text: String) -> Option<MessageId> {
        let buffer = self.buffer.take()?;
        let id = buffer.message_id.clone();
        self.messages.push(ConversationMessage {
            id: id.clone(),
            role: MessageRole::Assistant,
            content: final_text,
        });
        Some(id)
    }

    /// The answer stream failed; discard the partial answer
    ///
    /// The user's question remains in history, not retracted.
    pub fn on_assistant_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.buffer = None;
    }

    // ============================================
    // Document selection
    // ============================================

    /// Switch to a different document
    ///
    /// Clears history and any in-flight answer; the indexing flag is left
    /// alone so an upload being tracked keeps the session busy.
    pub fn select_document(&mut self, document: DocumentInfo) {
        self.document = Some(document);
        self.messages.clear();
        self.buffer = None;
        self.error = None;
    }

    // ============================================
    // Accessors
    // ============================================

    /// Busy while an indexing job is tracked or an answer stream is active
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.indexing || self.buffer.is_some()
    }

    /// Whether an indexing job is being tracked
    #[must_use]
    pub fn is_indexing(&self) -> bool {
        self.indexing
    }

    /// The document questions are asked about
    #[must_use]
    pub fn active_document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    /// Finalized messages, in order
    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Number of finalized messages
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The in-flight answer, if a stream is active
    #[must_use]
    pub fn stream_buffer(&self) -> Option<&StreamBuffer> {
        self.buffer.as_ref()
    }

    /// The error from the last failed operation, if any
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Latest indexing job observation, if any
    #[must_use]
    pub fn job(&self) -> Option<&JobStatus> {
        self.job.as_ref()
    }
}
