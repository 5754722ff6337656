//! docchat CLI
//!
//! Thin terminal surface over the docchat client core. All business logic
//! lives in `docchat-core`; this binary only forwards user input as surface
//! events and prints what the Coordinator says.
//!
//! # Usage
//!
//! ```bash
//! # Connect to the default service (http://localhost:8000)
//! docchat
//!
//! # Custom service URL
//! docchat --base-url http://docs.internal:9000
//!
//! # With verbose logging
//! RUST_LOG=debug docchat
//! ```
//!
//! # Commands
//!
//! - `/upload <path>` - Upload a file and track its indexing job
//! - `/docs` - List indexed documents
//! - `/use <id>` - Chat with a previously indexed document
//! - `/quit` - Exit
//! - Anything else is a question about the active document

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use docchat_core::{
    load_config_from_path, ClientMessage, ConfigOverrides, Coordinator, CoordinatorState,
    DocumentInfo, HttpBackend, MessageId, MessageRole, NotifyLevel, SurfaceEvent,
};

/// docchat - chat with your indexed documents
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the document service
    #[arg(short = 'u', long, env = "DOCCHAT_BASE_URL", value_name = "URL")]
    base_url: Option<String>,

    /// Session cookie forwarded with every request
    #[arg(long, env = "DOCCHAT_SESSION_COOKIE", value_name = "COOKIE")]
    session_cookie: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "DOCCHAT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Job status poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,
}

/// Documents the renderer last saw, for `/use <id>` lookups
type KnownDocuments = Arc<Mutex<Vec<DocumentInfo>>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docchat=info".parse()?)
                .add_directive("docchat_core=info".parse()?),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // Config file, overridden by environment, overridden by CLI flags
    let config_path = args.config.clone().or_else(docchat_core::default_config_path);
    let mut config = load_config_from_path(config_path)?;

    let mut overrides = ConfigOverrides::new();
    if let Some(base_url) = args.base_url {
        overrides = overrides.with_base_url(base_url);
    }
    if let Some(cookie) = args.session_cookie {
        overrides = overrides.with_session_cookie(cookie);
    }
    if let Some(ms) = args.poll_interval_ms {
        overrides = overrides.with_poll_interval_ms(ms);
    }
    overrides.apply(&mut config)?;

    debug!(base_url = %config.base_url, source = %config.source(), "Configuration loaded");

    let backend = HttpBackend::from_config(&config);

    let (msg_tx, msg_rx) = mpsc::channel::<ClientMessage>(100);
    let (event_tx, mut event_rx) = mpsc::channel::<SurfaceEvent>(100);

    let mut coordinator = Coordinator::new(backend, config, msg_tx);
    coordinator.start().await?;

    let coordinator = Arc::new(Mutex::new(coordinator));
    let documents: KnownDocuments = Arc::new(Mutex::new(Vec::new()));
    let shutdown = Arc::new(tokio::sync::Notify::new());

    // Renderer: print what the Coordinator says
    let renderer = tokio::spawn(render_loop(
        msg_rx,
        Arc::clone(&documents),
        Arc::clone(&shutdown),
    ));

    // Forward surface events to the Coordinator
    let coordinator_for_events = Arc::clone(&coordinator);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let mut coordinator = coordinator_for_events.lock().await;
            if let Err(e) = coordinator.handle_event(event).await {
                warn!(error = %e, "Failed to handle event");
            }
        }
    });

    // Drain job and stream observations
    let coordinator_for_polling = Arc::clone(&coordinator);
    tokio::spawn(async move {
        loop {
            {
                let mut coordinator = coordinator_for_polling.lock().await;
                coordinator.poll().await;
            }
            // Small delay to avoid busy-looping
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }
    });

    // Input loop: stdin lines become surface events
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = tokio::signal::ctrl_c() => {
                let _ = event_tx
                    .send(SurfaceEvent::QuitRequested {
                        event_id: SurfaceEvent::new_event_id(),
                    })
                    .await;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if let Some(event) = parse_line(&line, &documents).await {
                            let _ = event_tx.send(event).await;
                        }
                    }
                    // stdin closed
                    None => {
                        let _ = event_tx
                            .send(SurfaceEvent::QuitRequested {
                                event_id: SurfaceEvent::new_event_id(),
                            })
                            .await;
                    }
                }
            }
        }
    }

    renderer.abort();
    Ok(())
}

/// Turn one input line into a surface event, or `None` for local handling
async fn parse_line(line: &str, documents: &KnownDocuments) -> Option<SurfaceEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix("/upload ") {
        let path = PathBuf::from(rest.trim());
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| rest.trim().to_string());

        return match tokio::fs::read(&path).await {
            Ok(bytes) => Some(SurfaceEvent::UploadRequested {
                event_id: SurfaceEvent::new_event_id(),
                filename,
                bytes,
            }),
            Err(e) => {
                println!("! Cannot read {}: {e}", path.display());
                None
            }
        };
    }

    if line == "/docs" {
        return Some(SurfaceEvent::RefreshRequested {
            event_id: SurfaceEvent::new_event_id(),
        });
    }

    if let Some(rest) = line.strip_prefix("/use ") {
        let id: i64 = match rest.trim().parse() {
            Ok(id) => id,
            Err(_) => {
                println!("! /use expects a document id (see /docs)");
                return None;
            }
        };
        let document = documents.lock().await.iter().find(|d| d.id == id).cloned();
        return match document {
            Some(document) => Some(SurfaceEvent::DocumentSelected {
                event_id: SurfaceEvent::new_event_id(),
                document,
            }),
            None => {
                println!("! Unknown document id {id} (see /docs)");
                None
            }
        };
    }

    if line == "/quit" || line == "/exit" {
        return Some(SurfaceEvent::QuitRequested {
            event_id: SurfaceEvent::new_event_id(),
        });
    }

    if line.starts_with('/') {
        println!("! Commands: /upload <path>, /docs, /use <id>, /quit");
        return None;
    }

    Some(SurfaceEvent::QuestionSubmitted {
        event_id: SurfaceEvent::new_event_id(),
        content: line.to_string(),
    })
}

/// Print Coordinator messages to the terminal
async fn render_loop(
    mut rx: mpsc::Receiver<ClientMessage>,
    documents: KnownDocuments,
    shutdown: Arc<tokio::sync::Notify>,
) {
    let mut stdout = tokio::io::stdout();
    // Bytes already printed per streaming message, so only the new suffix of
    // the accumulated text is written
    let mut printed: HashMap<MessageId, usize> = HashMap::new();

    while let Some(msg) = rx.recv().await {
        match msg {
            ClientMessage::Message { role, content, .. } => {
                let prefix = match role {
                    MessageRole::User => "you",
                    MessageRole::Assistant => "ai",
                };
                println!("[{prefix}] {content}");
            }

            ClientMessage::Token {
                message_id,
                accumulated,
            } => {
                let seen = printed.entry(message_id).or_insert(0);
                if *seen == 0 {
                    let _ = stdout.write_all(b"[ai] ").await;
                }
                let fresh = accumulated.as_bytes().get(*seen..).unwrap_or_default();
                let _ = stdout.write_all(fresh).await;
                let _ = stdout.flush().await;
                *seen = accumulated.len();
            }

            ClientMessage::StreamEnd { message_id, .. } => {
                printed.remove(&message_id);
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }

            ClientMessage::StreamError { message_id, error } => {
                printed.remove(&message_id);
                println!("\n! Answer failed: {error}");
            }

            ClientMessage::JobUpdate { job } => {
                println!("[job {}] {}: {}", job.job_id, job.status, job.message);
            }

            ClientMessage::JobSucceeded { document } => {
                println!(
                    "[job] indexed '{}' (id {}), now chatting with it",
                    document.filename, document.id
                );
            }

            ClientMessage::JobFailed { message } => {
                println!("! Indexing failed: {message}");
            }

            ClientMessage::DocumentList { documents: docs } => {
                if docs.is_empty() {
                    println!("(no indexed documents yet - /upload one)");
                } else {
                    for doc in &docs {
                        println!("  {} - {}", doc.id, doc.filename);
                    }
                }
                *documents.lock().await = docs;
            }

            ClientMessage::Notify { level, message } => {
                let tag = match level {
                    NotifyLevel::Info => "i",
                    NotifyLevel::Warning => "warn",
                    NotifyLevel::Error => "error",
                    NotifyLevel::Success => "ok",
                };
                println!("[{tag}] {message}");
            }

            ClientMessage::State { state } => {
                if matches!(state, CoordinatorState::Indexing) {
                    println!("[{}]", state.description());
                }
            }

            ClientMessage::Ack { .. } => {}

            ClientMessage::Quit { message } => {
                if let Some(message) = message {
                    println!("{message}");
                }
                shutdown.notify_one();
                break;
            }
        }
    }
}
