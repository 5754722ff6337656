//! docchat Core - Headless Client for a Document-Intelligence Service
//!
//! This crate provides the client core for docchat, completely independent of
//! any UI framework. It can drive a CLI, a web view, a native GUI, or run
//! headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                              │
//! │   ┌─────────┐   ┌──────────┐   ┌──────────────────────────┐    │
//! │   │   CLI   │   │ Web view │   │   Headless (testing)     │    │
//! │   └────┬────┘   └────┬─────┘   └────────────┬─────────────┘    │
//! │        └─────────────┴──────────────────────┘                  │
//! │                          │                                     │
//! │                  SurfaceEvent (up)                             │
//! │                 ClientMessage (down)                           │
//! │                          │                                     │
//! └──────────────────────────┼─────────────────────────────────────┘
//!                            │
//! ┌──────────────────────────┼─────────────────────────────────────┐
//! │                    DOCCHAT CORE                                │
//! │  ┌───────────────────────┴───────────────────────────────────┐ │
//! │  │                     Coordinator                           │ │
//! │  │  ┌─────────┐  ┌───────────┐  ┌────────────┐  ┌─────────┐  │ │
//! │  │  │ Session │  │ JobPoller │  │  Stream    │  │ Backend │  │ │
//! │  │  │         │  │           │  │  Consumer  │  │ (HTTP)  │  │ │
//! │  │  └─────────┘  └───────────┘  └────────────┘  └─────────┘  │ │
//! │  └───────────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Coordinator`]: The main orchestration struct that manages everything
//! - [`ClientMessage`]: Messages sent from Coordinator to UI surfaces
//! - [`SurfaceEvent`]: Events sent from UI surfaces to Coordinator
//! - [`Session`]: Conversation state for the active document
//! - [`JobPoller`]: Tracks one indexing job to completion
//! - [`StreamConsumer`]: Consumes one streamed answer at a time
//!
//! # Quick Start
//!
//! ```ignore
//! use docchat_core::{
//!     backend::HttpBackend,
//!     config::load_config,
//!     events::SurfaceEvent,
//!     Coordinator,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = HttpBackend::from_config(&config);
//!
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut coordinator = Coordinator::new(backend, config, tx);
//!     coordinator.start().await?;
//!
//!     // Main loop: forward user actions, drain messages, poll for activity
//!     loop {
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message to UI
//!         }
//!         coordinator.poll().await;
//!         // Handle user input, send as SurfaceEvent via handle_event()
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Document service abstraction (HTTP implementation, wire
//!   types, incremental UTF-8 decoding)
//! - [`config`]: TOML/environment configuration loading
//! - [`coordinator`]: Main Coordinator struct
//! - [`events`]: Events from UI surfaces to the Coordinator
//! - [`jobs`]: Indexing job types and the job poller
//! - [`messages`]: Messages from the Coordinator to UI surfaces
//! - [`session`]: Conversation state for the active document
//! - [`streaming`]: Answer stream consumption
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It's pure client
//! logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod jobs;
pub mod messages;
pub mod session;
pub mod streaming;

// Re-exports for convenience
pub use backend::{
    BackendError, DocumentBackend, DocumentInfo, HttpBackend, StreamingToken, UploadAccepted,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ClientToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
pub use coordinator::Coordinator;
pub use events::SurfaceEvent;
pub use jobs::{JobEvent, JobOutcome, JobPoller, JobState, JobStatus, PollerState};
pub use messages::{
    ClientMessage, CoordinatorState, EventId, MessageId, MessageRole, NotifyLevel,
};
pub use session::{ConversationMessage, Session, StreamBuffer};
pub use streaming::{StreamConsumer, StreamConsumerConfig, StreamEvent};
