//! Line-delimited JSON telemetry for an external visualizer
//!
//! A single client is served at a time. Each recorded turn is written as
//! `{"speaker": ..., "message": ..., "sentiment": ...}` followed by `\n`.
//!
//! Publishing only queues the line; a background task owns the socket. When
//! the queue is full the line is dropped, and a client that stops reading is
//! disconnected once a write exceeds the write timeout. The debate never
//! waits on the visualizer.

use agora_core::Turn;
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lines buffered between the debate and the socket writer
pub const QUEUE_DEPTH: usize = 256;

/// Default bound on a single socket write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct TelemetryRecord<'a> {
    speaker: &'a str,
    message: &'a str,
    sentiment: f64,
}

/// Encode one turn as a telemetry line
pub fn encode_line(turn: &Turn) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(&TelemetryRecord {
        speaker: turn.speaker.name(),
        message: &turn.message,
        sentiment: turn.sentiment,
    })?;
    line.push(b'\n');
    Ok(line)
}

/// TCP listener pushing turns to at most one connected client
#[derive(Debug)]
pub struct TelemetrySink {
    lines: mpsc::Sender<Vec<u8>>,
    connected: Arc<AtomicBool>,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TelemetrySink {
    /// Bind and start accepting. Port 0 picks a free port.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        Self::bind_with_timeout(addr, DEFAULT_WRITE_TIMEOUT).await
    }

    /// Bind with a custom bound on socket writes
    pub async fn bind_with_timeout(addr: &str, write_timeout: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (lines, queue) = mpsc::channel(QUEUE_DEPTH);
        let connected = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(serve(listener, queue, connected.clone(), write_timeout));

        info!(addr = %local_addr, "Telemetry listening");
        Ok(Self {
            lines,
            connected,
            local_addr,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queue one turn for the client. Returns `false` when the line was
    /// dropped: no client, a full queue or an encoding failure.
    pub fn publish(&self, turn: &Turn) -> bool {
        if !self.is_connected() {
            return false;
        }

        let line = match encode_line(turn) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode telemetry record");
                return false;
            }
        };

        match self.lines.try_send(line) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Telemetry queue full, dropping line");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

impl Drop for TelemetrySink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    listener: TcpListener,
    mut queue: mpsc::Receiver<Vec<u8>>,
    connected: Arc<AtomicBool>,
    write_timeout: Duration,
) {
    let mut client: Option<TcpStream> = None;

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    if client.is_some() {
                        debug!(%peer, "Telemetry client already connected, refusing");
                        continue;
                    }
                    info!(%peer, "Telemetry client connected");
                    client = Some(stream);
                    connected.store(true, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!(error = %e, "Telemetry accept failed");
                    connected.store(false, Ordering::SeqCst);
                    return;
                }
            },
            line = queue.recv() => {
                let Some(line) = line else { return };
                let Some(stream) = client.as_mut() else { continue };

                let failure = match tokio::time::timeout(write_timeout, stream.write_all(&line)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(_) => Some(format!("write stalled for {:?}", write_timeout)),
                };
                if let Some(error) = failure {
                    warn!(%error, "Telemetry client dropped");
                    client = None;
                    connected.store(false, Ordering::SeqCst);
                }
            }
        }
    }
}
