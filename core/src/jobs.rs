//! Indexing Job Tracking
//!
//! Types for the server-side indexing job an upload kicks off, and the
//! `JobPoller` that tracks one job to completion. The server owns job state;
//! the client only observes it through the status endpoint.
//!
//! # Design Philosophy
//!
//! Polling is a cancellable periodic task: a spawned tokio task ticks on a
//! fixed interval, queries the status URL sequentially (requests never
//! overlap), and reports observations over a channel. The Coordinator drains
//! that channel with a non-blocking `poll()`. The task stops itself on the
//! first terminal observation, so a terminal state is reported exactly once.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::DocumentBackend;

/// State of a server-side indexing job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    /// Job accepted but not started
    Pending,
    /// Job is actively indexing
    Started,
    /// Indexing completed successfully
    Success,
    /// Indexing failed
    Failure,
}

impl JobState {
    /// Whether this state ends polling (success or failure)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Started => "Started",
            Self::Success => "Success",
            Self::Failure => "Failure",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One observation of an indexing job, as reported by the status endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobStatus {
    /// Opaque job identifier, unique per upload
    pub job_id: String,
    /// Current job state
    pub status: JobState,
    /// Server-provided progress or result message
    #[serde(default)]
    pub message: String,
}

/// An event from the polling task
#[derive(Clone, Debug)]
pub enum JobEvent {
    /// A status observation (sent for every response, terminal ones included)
    Update(JobStatus),
    /// The job reached a terminal state or tracking broke down; the poll is over
    Terminal(JobOutcome),
}

/// How a tracked job ended
#[derive(Clone, Debug)]
pub enum JobOutcome {
    /// The server reported SUCCESS
    Succeeded(JobStatus),
    /// The server reported FAILURE
    Failed(JobStatus),
    /// A status check failed, or the configured time limit ran out
    PollError(String),
}

/// Poller lifecycle states
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollerState {
    /// No job is being tracked
    Idle,
    /// A job is being tracked
    Polling,
    /// Tracking ended with a SUCCESS observation
    Succeeded,
    /// Tracking ended with a FAILURE observation
    Failed,
    /// Tracking ended because a status check failed
    PollError,
}

impl PollerState {
    /// Whether tracking has ended (success, failure, or poll error)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::PollError)
    }
}

/// Tracks at most one indexing job at a time
///
/// Created idle; `start` supersedes any tracked job, `cancel` is idempotent.
pub struct JobPoller {
    /// Current lifecycle state
    state: PollerState,
    /// Receiver for events from the polling task
    rx: Option<mpsc::Receiver<JobEvent>>,
    /// Handle to the polling task, kept so cancellation is explicit
    handle: Option<JoinHandle<()>>,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl JobPoller {
    /// Create an idle poller
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PollerState::Idle,
            rx: None,
            handle: None,
        }
    }

    /// Get the current lifecycle state
    #[must_use]
    pub fn state(&self) -> PollerState {
        self.state
    }

    /// Whether a job is currently being tracked
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.state == PollerState::Polling
    }

    /// Start tracking a job
    ///
    /// Supersedes (cancels) any job still being tracked, then spawns a task
    /// that checks `status_url` every `interval`. The first check happens one
    /// interval after start. With `max_duration` set, tracking gives up with a
    /// poll error once that much time has passed without a terminal state.
    pub fn start<B: DocumentBackend + 'static>(
        &mut self,
        backend: Arc<B>,
        status_url: String,
        interval: Duration,
        max_duration: Option<Duration>,
    ) {
        self.cancel();

        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval's first tick resolves immediately; consume it so the
            // first status check happens one interval in.
            ticker.tick().await;

            loop {
                ticker.tick().await;

                if let Some(max) = max_duration {
                    if started.elapsed() >= max {
                        let _ = tx
                            .send(JobEvent::Terminal(JobOutcome::PollError(format!(
                                "job did not reach a terminal state within {}s",
                                max.as_secs()
                            ))))
                            .await;
                        return;
                    }
                }

                match backend.job_status(&status_url).await {
                    Ok(status) => {
                        let terminal = status.status.is_terminal();
                        if tx.send(JobEvent::Update(status.clone())).await.is_err() {
                            // Receiver dropped, tracking was cancelled
                            return;
                        }
                        if terminal {
                            let outcome = match status.status {
                                JobState::Success => JobOutcome::Succeeded(status),
                                _ => JobOutcome::Failed(status),
                            };
                            let _ = tx.send(JobEvent::Terminal(outcome)).await;
                            return;
                        }
                    }
                    Err(e) => {
                        // Fail fast: a broken status check ends tracking, it
                        // never silently continues.
                        let _ = tx
                            .send(JobEvent::Terminal(JobOutcome::PollError(e.to_string())))
                            .await;
                        return;
                    }
                }
            }
        });

        self.rx = Some(rx);
        self.handle = Some(handle);
        self.state = PollerState::Polling;
        let interval_ms = interval.as_millis() as u64;
        tracing::debug!(interval_ms, "Job tracking started");
    }

    /// Drain pending observations (non-blocking)
    ///
    /// Records the terminal state and releases the channel when a terminal
    /// event is seen, so it can never be observed twice. A channel that
    /// disconnects without a terminal event is reported as a poll error.
    pub fn poll(&mut self) -> Vec<JobEvent> {
        // Collect first to keep the receiver borrow contained
        let (events, finished) = {
            let rx = match self.rx.as_mut() {
                Some(rx) => rx,
                None => return Vec::new(),
            };

            let mut collected = Vec::new();
            let mut finished = false;
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        let terminal = matches!(event, JobEvent::Terminal(_));
                        collected.push(event);
                        if terminal {
                            finished = true;
                            break;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        collected.push(JobEvent::Terminal(JobOutcome::PollError(
                            "status task stopped unexpectedly".to_string(),
                        )));
                        finished = true;
                        break;
                    }
                }
            }
            (collected, finished)
        };

        if finished {
            if let Some(JobEvent::Terminal(outcome)) = events.last() {
                self.state = match outcome {
                    JobOutcome::Succeeded(_) => PollerState::Succeeded,
                    JobOutcome::Failed(_) => PollerState::Failed,
                    JobOutcome::PollError(_) => PollerState::PollError,
                };
            }
            self.rx = None;
            self.handle = None;
        }

        events
    }

    /// Stop tracking, if a job is being tracked
    ///
    /// Idempotent. From `Polling` this aborts the task and returns to `Idle`;
    /// from `Idle` or any terminal state it has no observable effect.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.rx = None;
        if self.state == PollerState::Polling {
            self.state = PollerState::Idle;
            tracing::debug!("Job tracking cancelled");
        }
    }
}
