//! Newline-delimited JSON bridge between the worker and the platform adapter.
//!
//! One reader loop parses [`PlatformMessage`]s and routes them to per-job
//! channels. Each job runs its session in its own task. A single writer task
//! serialises every [`WorkerMessage`] onto the output stream, so stdout stays
//! a clean protocol channel; diagnostics go to stderr.

use crate::error::AgentError;
use crate::metrics::UsageSummary;
use crate::pipeline::SessionOptions;
use crate::protocol::{AgentCredentials, PlatformMessage, WorkerMessage};
use crate::session::{SessionBackend, SessionEvent};
use crate::tool::ToolOutput;
use crate::worker::Worker;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Capacity of each job's inbound event channel.
const JOB_EVENT_CAPACITY: usize = 64;

/// Capacity of the shared outbound message channel.
const OUTBOUND_CAPACITY: usize = 256;

/// Session backend fed by the bridge's reader loop.
#[derive(Debug)]
pub struct ChannelBackend {
    job_id: String,
    events: mpsc::Receiver<SessionEvent>,
    outbound: mpsc::Sender<WorkerMessage>,
    credentials: Option<AgentCredentials>,
}

impl ChannelBackend {
    pub fn new(
        job_id: impl Into<String>,
        events: mpsc::Receiver<SessionEvent>,
        outbound: mpsc::Sender<WorkerMessage>,
        credentials: Option<AgentCredentials>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            events,
            outbound,
            credentials,
        }
    }

    async fn send(&self, message: WorkerMessage) -> Result<(), AgentError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| AgentError::Platform("outbound channel closed".to_string()))
    }
}

#[async_trait]
impl SessionBackend for ChannelBackend {
    async fn start(&mut self, room: &str, options: &SessionOptions) -> Result<(), AgentError> {
        let credentials = self.credentials.take();
        self.send(WorkerMessage::SessionStart {
            job_id: self.job_id.clone(),
            room: room.to_string(),
            options: options.clone(),
            credentials,
        })
        .await
    }

    async fn generate_reply(&mut self) -> Result<(), AgentError> {
        self.send(WorkerMessage::GenerateReply {
            job_id: self.job_id.clone(),
        })
        .await
    }

    async fn send_tool_output(
        &mut self,
        call_id: &str,
        output: ToolOutput,
    ) -> Result<(), AgentError> {
        self.send(WorkerMessage::ToolOutput {
            job_id: self.job_id.clone(),
            call_id: call_id.to_string(),
            output: output.output,
            is_error: output.is_error,
        })
        .await
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    async fn close(&mut self, usage: &UsageSummary) -> Result<(), AgentError> {
        self.send(WorkerMessage::SessionClosed {
            job_id: self.job_id.clone(),
            usage: usage.clone(),
        })
        .await
    }
}

/// Runs the bridge over the process's stdin and stdout until stdin closes or
/// `shutdown` completes.
pub async fn run_stdio<S>(worker: Arc<Worker>, shutdown: S) -> Result<(), AgentError>
where
    S: Future<Output = ()>,
{
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    run_bridge(worker, reader, writer, shutdown).await
}

/// Runs the bridge until `reader` reaches EOF, fails, or `shutdown`
/// completes. Every exit drains running sessions the way EOF does, so each
/// one reports `session_closed` before the writer is flushed.
pub async fn run_bridge<R, W, S>(
    worker: Arc<Worker>,
    mut reader: R,
    writer: W,
    shutdown: S,
) -> Result<(), AgentError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let (out_tx, out_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer_handle = tokio::spawn(write_messages(writer, out_rx));

    send_outbound(
        &out_tx,
        WorkerMessage::WorkerReady {
            vad: Arc::clone(worker.vad()),
        },
    )
    .await;
    tracing::info!("worker ready; waiting for jobs");

    let mut jobs: HashMap<String, mpsc::Sender<SessionEvent>> = HashMap::new();
    let mut sessions = JoinSet::new();
    let mut buf = Vec::new();
    let mut read_error = None;
    tokio::pin!(shutdown);

    loop {
        buf.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read,
            () = &mut shutdown => {
                tracing::info!(running = jobs.len(), "shutdown requested; closing sessions");
                break;
            }
        };
        match read {
            Ok(0) => {
                tracing::info!(running = jobs.len(), "platform input closed; closing sessions");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "failed to read platform input; closing sessions");
                read_error = Some(e);
                break;
            }
        }

        let line = trim_line(&buf);
        if line.is_empty() {
            continue;
        }

        while let Some(finished) = sessions.try_join_next() {
            log_session_exit(finished);
        }

        let message: PlatformMessage = match serde_json::from_slice(line) {
            Ok(message) => message,
            Err(e) => {
                let error =
                    AgentError::Protocol(format!("failed to parse platform message: {}", e));
                tracing::warn!(
                    raw_line = %String::from_utf8_lossy(line),
                    "{}",
                    error
                );
                send_protocol_error(&out_tx, error).await;
                continue;
            }
        };

        if let PlatformMessage::JobAssigned { job_id, room } = message {
            if jobs.contains_key(&job_id) {
                let error = AgentError::Protocol(format!("job {} is already running", job_id));
                tracing::warn!(%job_id, "duplicate job assignment");
                send_protocol_error(&out_tx, error).await;
                continue;
            }

            tracing::info!(%job_id, %room, "job assigned");
            let (event_tx, event_rx) = mpsc::channel(JOB_EVENT_CAPACITY);
            let credentials = worker.agent_credentials(&job_id, &room);
            let backend = ChannelBackend::new(job_id.clone(), event_rx, out_tx.clone(), credentials);
            jobs.insert(job_id.clone(), event_tx);

            let worker = Arc::clone(&worker);
            sessions.spawn(async move { worker.run_job(job_id, room, backend).await.map(|_| ()) });
            continue;
        }

        let job_id = message.job_id().to_string();
        let is_end = matches!(message, PlatformMessage::JobEnded { .. });
        let Some(event) = message.into_session_event() else {
            continue;
        };

        match jobs.get(&job_id) {
            Some(events) => {
                if events.send(event).await.is_err() {
                    tracing::warn!(%job_id, "session already finished; dropping event");
                    jobs.remove(&job_id);
                } else if is_end {
                    jobs.remove(&job_id);
                }
            }
            None => {
                tracing::warn!(%job_id, "event for unknown job; dropping");
            }
        }
    }

    jobs.clear();
    while let Some(finished) = sessions.join_next().await {
        log_session_exit(finished);
    }

    drop(out_tx);
    let written = match writer_handle.await {
        Ok(result) => result,
        Err(e) => Err(AgentError::Platform(format!("writer task failed: {}", e))),
    };

    match read_error {
        Some(e) => Err(AgentError::Io(e)),
        None => written,
    }
}

/// Strips surrounding ASCII whitespace, including the line terminator.
fn trim_line(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

async fn send_protocol_error(out_tx: &mpsc::Sender<WorkerMessage>, error: AgentError) {
    send_outbound(
        out_tx,
        WorkerMessage::ProtocolError {
            message: error.to_string(),
        },
    )
    .await;
}

async fn send_outbound(out_tx: &mpsc::Sender<WorkerMessage>, message: WorkerMessage) {
    if out_tx.send(message).await.is_err() {
        tracing::warn!("outbound channel closed; dropping message");
    }
}

fn log_session_exit(result: Result<Result<(), AgentError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("session ended with error: {}", e),
        Err(e) => tracing::error!("session task panicked or was cancelled: {}", e),
    }
}

async fn write_messages<W>(
    mut writer: W,
    mut messages: mpsc::Receiver<WorkerMessage>,
) -> Result<(), AgentError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = messages.recv().await {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize worker message; skipping");
                continue;
            }
        };
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
