//! Surface Events
//!
//! Events sent from UI surfaces to the Coordinator. These are the complete
//! interface the core needs from presentation: surfaces report what the user
//! did and the Coordinator decides how to respond.

use serde::{Deserialize, Serialize};

use crate::backend::DocumentInfo;
use crate::messages::EventId;

/// Events from UI Surface to Coordinator
///
/// Every event carries an ID so the Coordinator can acknowledge receipt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// User picked a file and asked for it to be uploaded and indexed
    UploadRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// Original filename, forwarded to the server
        filename: String,
        /// Raw file contents
        bytes: Vec<u8>,
    },

    /// User submitted a question about the active document
    QuestionSubmitted {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The question text
        content: String,
    },

    /// User switched to a previously indexed document
    DocumentSelected {
        /// Event ID for acknowledgment
        event_id: EventId,
        /// The chosen document
        document: DocumentInfo,
    },

    /// User asked for a fresh document list
    RefreshRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
    },

    /// User requested quit
    QuitRequested {
        /// Event ID for acknowledgment
        event_id: EventId,
    },
}

impl SurfaceEvent {
    /// Generate a new event ID for this event
    pub fn new_event_id() -> EventId {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        EventId(format!("evt_{id}"))
    }

    /// Get the event ID
    pub fn event_id(&self) -> &EventId {
        match self {
            Self::UploadRequested { event_id, .. }
            | Self::QuestionSubmitted { event_id, .. }
            | Self::DocumentSelected { event_id, .. }
            | Self::RefreshRequested { event_id }
            | Self::QuitRequested { event_id } => event_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_unique() {
        let id1 = SurfaceEvent::new_event_id();
        let id2 = SurfaceEvent::new_event_id();
        assert_ne!(id1.0, id2.0);
    }

    #[test]
    fn test_event_id_accessor() {
        let event = SurfaceEvent::QuestionSubmitted {
            event_id: SurfaceEvent::new_event_id(),
            content: "why?".to_string(),
        };
        assert!(event.event_id().0.starts_with("evt_"));
    }
}
