//! Coordinator - The Client Core
//!
//! The Coordinator is the single logical thread of control for the client. It
//! orchestrates:
//! - Document uploads and the tracking of their indexing jobs
//! - Streamed answers to questions about the active document
//! - Session state (history, in-flight answer, errors)
//! - Communication with UI surfaces
//!
//! # Design Philosophy
//!
//! The Coordinator is UI-agnostic. It doesn't know or care whether it's
//! talking to a CLI, a web view, or a test harness. It communicates through:
//! - [`ClientMessage`]: Messages sent TO the UI surface
//! - [`SurfaceEvent`]: Events received FROM the UI surface
//!
//! The poller and the stream reader run on their own tasks but deliver their
//! observations over channels drained by [`Coordinator::poll`], so session
//! state is only ever mutated here, one event at a time. Two invariants are
//! enforced at this level: a new upload cancels the poll of any prior job
//! before its own begins, and at most one answer stream is active at a time.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{DocumentBackend, DocumentInfo};
use crate::config::ClientConfig;
use crate::events::SurfaceEvent;
use crate::jobs::{JobEvent, JobOutcome, JobPoller};
use crate::messages::{ClientMessage, CoordinatorState, EventId, MessageRole, NotifyLevel};
use crate::session::Session;
use crate::streaming::{StreamConsumer, StreamConsumerConfig, StreamEvent};

/// The Coordinator - headless client core
pub struct Coordinator<B: DocumentBackend> {
    /// Configuration
    config: ClientConfig,
    /// Document service backend
    backend: Arc<B>,
    /// Conversation state
    session: Session,
    /// Tracks the indexing job of the most recent upload
    poller: JobPoller,
    /// Consumes the active answer stream
    consumer: StreamConsumer,
    /// Current operational state
    state: CoordinatorState,
    /// Channel to send messages to the UI surface
    tx: mpsc::Sender<ClientMessage>,
    /// Document that will be adopted when the tracked job succeeds
    pending_document: Option<DocumentInfo>,
}

impl<B: DocumentBackend + 'static> Coordinator<B> {
    /// Create a new Coordinator with the given backend
    pub fn new(backend: B, config: ClientConfig, tx: mpsc::Sender<ClientMessage>) -> Self {
        let consumer = StreamConsumer::with_config(StreamConsumerConfig {
            idle_timeout: config.stream_idle_timeout,
        });

        Self {
            config,
            backend: Arc::new(backend),
            session: Session::new(),
            poller: JobPoller::new(),
            consumer,
            state: CoordinatorState::Initializing,
            tx,
            pending_document: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Get the session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start the Coordinator
    ///
    /// Checks service health and fetches the initial document list; the first
    /// listed document becomes the default selection.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.set_state(CoordinatorState::Initializing).await;

        if !self.backend.health_check().await {
            self.notify(
                NotifyLevel::Warning,
                "Document service not reachable - uploads and questions will fail until it is",
            )
            .await;
        }

        self.refresh_documents().await;
        self.set_state(CoordinatorState::Ready).await;

        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        match event {
            SurfaceEvent::UploadRequested {
                event_id,
                filename,
                bytes,
            } => {
                self.ack(event_id).await;
                self.handle_upload(filename, bytes).await;
            }

            SurfaceEvent::QuestionSubmitted { event_id, content } => {
                self.ack(event_id).await;
                self.handle_question(content).await;
            }

            SurfaceEvent::DocumentSelected { event_id, document } => {
                self.ack(event_id).await;
                self.handle_select(document).await;
            }

            SurfaceEvent::RefreshRequested { event_id } => {
                self.ack(event_id).await;
                self.refresh_documents().await;
            }

            SurfaceEvent::QuitRequested { event_id } => {
                self.ack(event_id).await;
                self.shutdown().await;
            }
        }

        Ok(())
    }

    /// Handle an upload request
    async fn handle_upload(&mut self, filename: String, bytes: Vec<u8>) {
        // Only one job may be tracked at a time: a new upload supersedes the
        // poll of any prior job before its own begins.
        self.poller.cancel();
        self.pending_document = None;

        match self.backend.upload_document(&filename, bytes).await {
            Ok(accepted) => {
                tracing::info!(
                    document_id = accepted.document_id,
                    job_id = %accepted.job.job_id,
                    filename = %accepted.filename,
                    "Upload accepted, tracking indexing job"
                );

                self.session.begin_upload();
                self.session.on_job_update(accepted.job.clone());
                self.pending_document = Some(DocumentInfo {
                    id: accepted.document_id,
                    filename: accepted.filename.clone(),
                });

                self.send(ClientMessage::JobUpdate {
                    job: accepted.job.clone(),
                })
                .await;

                self.poller.start(
                    Arc::clone(&self.backend),
                    accepted.status_url,
                    self.config.poll_interval,
                    self.config.max_poll_duration,
                );
                self.set_state(CoordinatorState::Indexing).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, filename = %filename, "Upload failed");
                self.session.on_job_error(e.to_string());
                self.notify(NotifyLevel::Error, &format!("Upload failed: {e}"))
                    .await;
            }
        }
    }

    /// Handle a submitted question
    async fn handle_question(&mut self, content: String) {
        let document = match self.session.active_document() {
            Some(document) => document.clone(),
            None => {
                self.notify(
                    NotifyLevel::Warning,
                    "Upload or select a document before asking questions",
                )
                .await;
                return;
            }
        };

        // Busy or empty questions are a no-op by contract
        let user_id = match self.session.submit_question(&content) {
            Some(id) => id,
            None => return,
        };

        self.send(ClientMessage::Message {
            id: user_id,
            role: MessageRole::User,
            content: content.clone(),
        })
        .await;

        match self.backend.ask_streaming(document.id, &content).await {
            Ok(rx) => {
                if !self.consumer.begin(rx) {
                    // Unreachable while the session busy flag is respected
                    tracing::warn!("Answer stream rejected: another stream is active");
                    return;
                }
                self.set_state(CoordinatorState::Responding).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, document_id = document.id, "Failed to open answer stream");
                let message_id = self.session.stream_buffer().map(|b| b.message_id.clone());
                self.session.on_assistant_error(e.to_string());
                if let Some(message_id) = message_id {
                    self.send(ClientMessage::StreamError {
                        message_id,
                        error: e.to_string(),
                    })
                    .await;
                }
                self.notify(NotifyLevel::Error, &format!("Failed to send question: {e}"))
                    .await;
            }
        }
    }

    /// Handle switching to a previously indexed document
    async fn handle_select(&mut self, document: DocumentInfo) {
        // Switching documents abandons any in-flight answer.
        self.consumer.cancel();

        tracing::info!(
            document_id = document.id,
            filename = %document.filename,
            "Switched active document"
        );
        self.session.select_document(document);
        self.publish_idle_state().await;
    }

    /// Fetch and publish the document list
    async fn refresh_documents(&mut self) {
        match self.backend.list_documents().await {
            Ok(documents) => {
                // Default to the first listed document when nothing is
                // selected yet, so the user can start asking right away.
                if self.session.active_document().is_none() {
                    if let Some(first) = documents.first() {
                        self.session.select_document(first.clone());
                    }
                }
                self.send(ClientMessage::DocumentList { documents }).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch document list");
                self.notify(
                    NotifyLevel::Warning,
                    &format!("Failed to fetch document list: {e}"),
                )
                .await;
            }
        }
    }

    /// Drain pending job and stream observations
    ///
    /// Call this regularly. Session state is only mutated here and in
    /// `handle_event`, one event at a time. Returns true if there was
    /// activity.
    pub async fn poll(&mut self) -> bool {
        let mut activity = false;

        for event in self.poller.poll() {
            activity = true;
            match event {
                JobEvent::Update(job) => {
                    self.session.on_job_update(job.clone());
                    self.send(ClientMessage::JobUpdate { job }).await;
                }

                JobEvent::Terminal(JobOutcome::Succeeded(job)) => {
                    match self.pending_document.take() {
                        Some(document) => {
                            tracing::info!(
                                document_id = document.id,
                                message = %job.message,
                                "Document indexed"
                            );
                            // Adoption switches the conversation to the new
                            // document; an answer about the old one cannot
                            // outlive the switch.
                            self.consumer.cancel();
                            self.session.on_job_success(document.clone());
                            self.send(ClientMessage::JobSucceeded { document }).await;
                        }
                        None => {
                            tracing::warn!(job_id = %job.job_id, "Job succeeded with no pending document");
                        }
                    }
                    self.publish_idle_state().await;
                }

                JobEvent::Terminal(JobOutcome::Failed(job)) => {
                    tracing::warn!(job_id = %job.job_id, message = %job.message, "Indexing failed");
                    self.pending_document = None;
                    self.session.on_job_failure(job.clone());
                    self.send(ClientMessage::JobFailed {
                        message: job.message.clone(),
                    })
                    .await;
                    self.notify(NotifyLevel::Error, &format!("Indexing failed: {}", job.message))
                        .await;
                    self.publish_idle_state().await;
                }

                JobEvent::Terminal(JobOutcome::PollError(error)) => {
                    tracing::warn!(error = %error, "Job tracking failed");
                    self.pending_document = None;
                    self.session.on_job_error(error.clone());
                    self.send(ClientMessage::JobFailed {
                        message: error.clone(),
                    })
                    .await;
                    self.notify(NotifyLevel::Error, &format!("Status check failed: {error}"))
                        .await;
                    self.publish_idle_state().await;
                }
            }
        }

        for event in self.consumer.poll() {
            activity = true;
            match event {
                StreamEvent::Token { accumulated } => {
                    self.session.on_assistant_token(&accumulated);
                    let message_id = self.session.stream_buffer().map(|b| b.message_id.clone());
                    if let Some(message_id) = message_id {
                        self.send(ClientMessage::Token {
                            message_id,
                            accumulated,
                        })
                        .await;
                    }
                }

                StreamEvent::Complete { message } => {
                    if let Some(message_id) = self.session.on_assistant_complete(message.clone()) {
                        self.send(ClientMessage::StreamEnd {
                            message_id,
                            final_content: message,
                        })
                        .await;
                    }
                    self.publish_idle_state().await;
                }

                StreamEvent::Error { message } => {
                    tracing::warn!(error = %message, "Answer stream failed");
                    let message_id = self.session.stream_buffer().map(|b| b.message_id.clone());
                    self.session.on_assistant_error(message.clone());
                    if let Some(message_id) = message_id {
                        self.send(ClientMessage::StreamError {
                            message_id,
                            error: message.clone(),
                        })
                        .await;
                    }
                    self.notify(NotifyLevel::Error, &message).await;
                    self.publish_idle_state().await;
                }
            }
        }

        activity
    }

    /// Shut down the Coordinator
    pub async fn shutdown(&mut self) {
        self.set_state(CoordinatorState::ShuttingDown).await;
        self.poller.cancel();
        self.consumer.cancel();

        self.send(ClientMessage::Quit {
            message: Some("Goodbye!".to_string()),
        })
        .await;
    }

    /// Publish Ready or Indexing depending on whether a job is still tracked
    async fn publish_idle_state(&mut self) {
        let state = if self.poller.is_polling() {
            CoordinatorState::Indexing
        } else {
            CoordinatorState::Ready
        };
        self.set_state(state).await;
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: CoordinatorState) {
        self.state = state;
        self.send(ClientMessage::State { state }).await;
    }

    /// Send acknowledgment
    async fn ack(&self, event_id: EventId) {
        self.send(ClientMessage::Ack { event_id }).await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ClientMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: ClientMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
