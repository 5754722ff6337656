//! Client Messages
//!
//! Messages sent from the Coordinator to UI surfaces. These represent all the
//! ways the client core can communicate with any connected UI (CLI, web view,
//! test harness, etc.).
//!
//! # Design Philosophy
//!
//! The Coordinator owns all conversation and job state. UI surfaces are pure
//! renderers that display what the Coordinator tells them to. This separation
//! enables hot-swappable surfaces and headless operation for testing.

use serde::{Deserialize, Serialize};

use crate::backend::DocumentInfo;
use crate::jobs::JobStatus;

/// Messages from Coordinator to UI Surface
///
/// These messages tell the UI what to display. The UI should not have any
/// business logic - just render what it's told.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ClientMessage {
    // ============================================
    // Conversation Messages
    // ============================================
    /// A complete message to display
    Message {
        /// Unique message ID for tracking
        id: MessageId,
        /// Who sent this message
        role: MessageRole,
        /// The message content
        content: String,
    },

    /// A streaming update (partial answer)
    Token {
        /// Message ID this update belongs to
        message_id: MessageId,
        /// The full answer text accumulated so far (not a delta)
        accumulated: String,
    },

    /// Answer stream has completed
    StreamEnd {
        /// Message ID that completed
        message_id: MessageId,
        /// Final complete content
        final_content: String,
    },

    /// Answer stream encountered an error
    StreamError {
        /// Message ID that errored
        message_id: MessageId,
        /// Error description
        error: String,
    },

    // ============================================
    // Indexing Job Messages
    // ============================================
    /// Latest observed status of the tracked indexing job
    JobUpdate {
        /// The job status as reported by the server
        job: JobStatus,
    },

    /// The indexing job completed and the document was adopted
    JobSucceeded {
        /// The newly indexed document
        document: DocumentInfo,
    },

    /// The indexing job failed or its tracking broke down
    JobFailed {
        /// Failure description (server message or poll error)
        message: String,
    },

    // ============================================
    // Document Messages
    // ============================================
    /// The current list of indexed documents, in server order
    DocumentList {
        /// Available documents
        documents: Vec<DocumentInfo>,
    },

    // ============================================
    // System Messages
    // ============================================
    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Coordinator state change
    State {
        /// The new state
        state: CoordinatorState,
    },

    /// Acknowledgment of received event
    Ack {
        /// Event ID being acknowledged
        event_id: EventId,
    },

    /// Request surface to quit
    Quit {
        /// Optional goodbye message
        message: Option<String>,
    },
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event identifier (for acks)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// User input
    User,
    /// Assistant answer derived from the document
    Assistant,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Coordinator operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Starting up, not ready
    Initializing,
    /// Ready for input
    Ready,
    /// Tracking an indexing job
    Indexing,
    /// Streaming an answer
    Responding,
    /// Shutting down
    ShuttingDown,
}

impl CoordinatorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::Indexing => "Indexing document...",
            Self::Responding => "Answering...",
            Self::ShuttingDown => "Shutting down...",
        }
    }
}
