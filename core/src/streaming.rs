//! Answer Stream Consumption
//!
//! Drives a single live answer stream at a time: accumulates incoming tokens
//! into a growing buffer, reports every update with the full accumulated text,
//! and finalizes or discards the buffer when the stream ends.
//!
//! # Design Philosophy
//!
//! The consumer wraps the channel of [`StreamingToken`]s a backend hands out
//! and is polled non-blockingly by the Coordinator, so stream consumption and
//! job tracking share one logical thread of control. At most one stream is
//! active per consumer, mirroring at most one outstanding question per
//! conversation; after completion or error the consumer resets for reuse.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::StreamingToken;

/// Configuration for the stream consumer
#[derive(Clone, Copy, Debug)]
pub struct StreamConsumerConfig {
    /// Give up on a stream after this long without a token (`None` disables)
    pub idle_timeout: Option<Duration>,
}

impl Default for StreamConsumerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(120)),
        }
    }
}

/// An event from the active answer stream
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// New text arrived
    Token {
        /// The full answer accumulated so far, never a delta
        accumulated: String,
    },
    /// Stream completed successfully
    Complete {
        /// The final complete answer
        message: String,
    },
    /// Stream failed; partial text is discarded, never promoted
    Error {
        /// Error description
        message: String,
    },
}

/// The stream currently being consumed
struct ActiveStream {
    /// The underlying token receiver
    rx: mpsc::Receiver<StreamingToken>,
    /// Accumulated answer text
    accumulated: String,
    /// Last time a token arrived, for the idle cutoff
    last_activity: Instant,
}

/// Consumes at most one answer stream at a time
pub struct StreamConsumer {
    /// Configuration
    config: StreamConsumerConfig,
    /// Active stream, if any
    active: Option<ActiveStream>,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConsumer {
    /// Create a consumer with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StreamConsumerConfig::default())
    }

    /// Create a consumer with custom configuration
    #[must_use]
    pub fn with_config(config: StreamConsumerConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Whether a stream is currently being consumed
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// The answer text accumulated so far, if a stream is active
    #[must_use]
    pub fn accumulated(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.accumulated.as_str())
    }

    /// Adopt a new stream
    ///
    /// Returns `false` (no-op) when a stream is already active - at most one
    /// outstanding question at a time.
    pub fn begin(&mut self, rx: mpsc::Receiver<StreamingToken>) -> bool {
        if self.active.is_some() {
            tracing::debug!("Rejected answer stream: another stream is active");
            return false;
        }
        self.active = Some(ActiveStream {
            rx,
            accumulated: String::new(),
            last_activity: Instant::now(),
        });
        true
    }

    /// Drain pending tokens (non-blocking)
    ///
    /// Emits one `Token` event per received chunk, carrying the full
    /// accumulated text. On completion, error, disconnection without
    /// completion, or idle cutoff the stream is released and the consumer
    /// returns to idle.
    pub fn poll(&mut self) -> Vec<StreamEvent> {
        let stream = match self.active.as_mut() {
            Some(stream) => stream,
            None => return Vec::new(),
        };

        let mut events = Vec::new();
        let mut finished = false;

        loop {
            match stream.rx.try_recv() {
                Ok(StreamingToken::Token(text)) => {
                    stream.accumulated.push_str(&text);
                    stream.last_activity = Instant::now();
                    events.push(StreamEvent::Token {
                        accumulated: stream.accumulated.clone(),
                    });
                }
                Ok(StreamingToken::Complete { message }) => {
                    events.push(StreamEvent::Complete { message });
                    finished = true;
                    break;
                }
                Ok(StreamingToken::Error(message)) => {
                    events.push(StreamEvent::Error { message });
                    finished = true;
                    break;
                }
                Err(mpsc::error::TryRecvError::Empty) => {
                    if let Some(idle) = self.config.idle_timeout {
                        if stream.last_activity.elapsed() >= idle {
                            events.push(StreamEvent::Error {
                                message: format!(
                                    "no data received for {}s, giving up on answer",
                                    idle.as_secs()
                                ),
                            });
                            finished = true;
                        }
                    }
                    break;
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    // Channel closed without a proper completion
                    events.push(StreamEvent::Error {
                        message: "answer stream disconnected unexpectedly".to_string(),
                    });
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            self.active = None;
        }

        events
    }

    /// Drop the active stream without emitting anything
    ///
    /// Used when the user navigates to a different document mid-stream.
    /// No-op when idle.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("Answer stream cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn consumer_without_idle_cutoff() -> StreamConsumer {
        StreamConsumer::with_config(StreamConsumerConfig { idle_timeout: None })
    }

    #[tokio::test]
    async fn test_tokens_accumulate_in_arrival_order() {
        let mut consumer = consumer_without_idle_cutoff();
        let (tx, rx) = mpsc::channel(10);
        assert!(consumer.begin(rx));

        tx.send(StreamingToken::Token("The ".to_string()))
            .await
            .unwrap();
        tx.send(StreamingToken::Token("answer ".to_string()))
            .await
            .unwrap();
        tx.send(StreamingToken::Token("is 42.".to_string()))
            .await
            .unwrap();

        let events = consumer.poll();
        let accumulated: Vec<String> = events
            .iter()
            .map(|e| match e {
                StreamEvent::Token { accumulated } => accumulated.clone(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(
            accumulated,
            vec!["The ", "The answer ", "The answer is 42."]
        );

        tx.send(StreamingToken::Complete {
            message: "The answer is 42.".to_string(),
        })
        .await
        .unwrap();

        let events = consumer.poll();
        assert!(matches!(
            &events[..],
            [StreamEvent::Complete { message }] if message == "The answer is 42."
        ));
        assert!(!consumer.is_streaming());
    }

    #[tokio::test]
    async fn test_error_discards_stream() {
        let mut consumer = consumer_without_idle_cutoff();
        let (tx, rx) = mpsc::channel(10);
        assert!(consumer.begin(rx));

        tx.send(StreamingToken::Token("partial".to_string()))
            .await
            .unwrap();
        tx.send(StreamingToken::Error("connection reset".to_string()))
            .await
            .unwrap();

        let events = consumer.poll();
        assert!(matches!(events.first(), Some(StreamEvent::Token { .. })));
        assert!(matches!(
            events.last(),
            Some(StreamEvent::Error { message }) if message == "connection reset"
        ));
        assert!(!consumer.is_streaming());
        assert_eq!(consumer.accumulated(), None);
    }

    #[tokio::test]
    async fn test_disconnect_without_completion_is_error() {
        let mut consumer = consumer_without_idle_cutoff();
        let (tx, rx) = mpsc::channel(10);
        assert!(consumer.begin(rx));

        tx.send(StreamingToken::Token("half an ans".to_string()))
            .await
            .unwrap();
        drop(tx);

        let events = consumer.poll();
        assert!(matches!(events.last(), Some(StreamEvent::Error { .. })));
        assert!(!consumer.is_streaming());
    }

    #[tokio::test]
    async fn test_second_stream_rejected_while_active() {
        let mut consumer = consumer_without_idle_cutoff();
        let (_tx1, rx1) = mpsc::channel::<StreamingToken>(1);
        let (_tx2, rx2) = mpsc::channel::<StreamingToken>(1);

        assert!(consumer.begin(rx1));
        assert!(!consumer.begin(rx2));
        assert!(consumer.is_streaming());
    }

    #[tokio::test]
    async fn test_cancel_resets_for_reuse() {
        let mut consumer = consumer_without_idle_cutoff();
        let (_tx, rx) = mpsc::channel::<StreamingToken>(1);

        assert!(consumer.begin(rx));
        consumer.cancel();
        assert!(!consumer.is_streaming());
        assert!(consumer.poll().is_empty());

        let (_tx2, rx2) = mpsc::channel::<StreamingToken>(1);
        assert!(consumer.begin(rx2));
    }

    #[test]
    fn test_accumulated_exposes_partial_text() {
        tokio_test::block_on(async {
            let mut consumer = consumer_without_idle_cutoff();
            let (tx, rx) = mpsc::channel(10);
            assert!(consumer.begin(rx));
            assert_eq!(consumer.accumulated(), Some(""));

            tx.send(StreamingToken::Token("so far".to_string()))
                .await
                .unwrap();
            consumer.poll();
            assert_eq!(consumer.accumulated(), Some("so far"));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_cutoff_gives_up() {
        let mut consumer = StreamConsumer::with_config(StreamConsumerConfig {
            idle_timeout: Some(Duration::from_secs(5)),
        });
        let (_tx, rx) = mpsc::channel::<StreamingToken>(1);
        assert!(consumer.begin(rx));

        assert!(consumer.poll().is_empty());

        tokio::time::advance(Duration::from_secs(6)).await;

        let events = consumer.poll();
        assert!(matches!(events.first(), Some(StreamEvent::Error { .. })));
        assert!(!consumer.is_streaming());
    }
}
