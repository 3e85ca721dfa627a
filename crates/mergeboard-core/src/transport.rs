//! Transport adapter: best-effort broadcast of envelopes to room members.
//!
//! No delivery, ordering, or retry guarantee is assumed from any
//! implementation; the engine's join-retry and last-snapshot-wins policies
//! exist specifically to tolerate that. [`MemoryHub`] is an in-process
//! fan-out bus (tests and same-process peers); [`WsTransport`] speaks the
//! envelope protocol over a WebSocket relay from a background thread.

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;
use tungstenite::{connect, Message};
use url::Url;

use crate::protocol::Envelope;

/// Transport errors. Sends are fire-and-forget; an error means the envelope
/// never left this process.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,
    #[error("Invalid transport URL: {0}")]
    InvalidUrl(String),
    #[error("Send failed: {0}")]
    Send(String),
}

/// Best-effort publish/subscribe channel carrying envelopes.
pub trait Transport: Send {
    /// Broadcast an envelope to all other room members. Fire-and-forget.
    fn send(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// Drain envelopes received since the last poll. Non-blocking.
    fn poll(&mut self) -> Vec<Envelope>;
}

// ============================================================================
// In-memory hub
// ============================================================================

#[derive(Default)]
struct HubInner {
    queues: Vec<VecDeque<Envelope>>,
}

/// In-process broadcast bus. Every endpoint's send is delivered to every
/// other endpoint, never echoed back to the sender (gossip semantics).
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint to the hub.
    pub fn endpoint(&self) -> MemoryTransport {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.queues.push(VecDeque::new());
        MemoryTransport {
            inner: self.inner.clone(),
            index: inner.queues.len() - 1,
        }
    }
}

/// One peer's endpoint on a [`MemoryHub`].
pub struct MemoryTransport {
    inner: Arc<Mutex<HubInner>>,
    index: usize,
}

impl Transport for MemoryTransport {
    fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        for (i, queue) in inner.queues.iter_mut().enumerate() {
            if i != self.index {
                queue.push_back(envelope.clone());
            }
        }
        Ok(())
    }

    fn poll(&mut self) -> Vec<Envelope> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.queues[self.index].drain(..).collect()
    }
}

// ============================================================================
// WebSocket transport
// ============================================================================

enum WsCommand {
    Send(String),
    Close,
}

/// WebSocket transport adapter.
///
/// Runs the socket on a background thread; `send` enqueues a serialized
/// envelope and `poll` drains whatever the thread has parsed so far, so the
/// caller never blocks on the network.
pub struct WsTransport {
    cmd_tx: Option<Sender<WsCommand>>,
    envelope_rx: Option<Receiver<Envelope>>,
    _thread: Option<JoinHandle<()>>,
}

impl WsTransport {
    /// Connect to a relay and spawn the socket thread.
    pub fn connect(url: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel::<WsCommand>();
        let (envelope_tx, envelope_rx) = channel::<Envelope>();
        let url = url.to_string();

        let handle = thread::spawn(move || socket_loop(&url, cmd_rx, envelope_tx));

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            envelope_rx: Some(envelope_rx),
            _thread: Some(handle),
        })
    }

    /// Close the connection. Idempotent.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.envelope_rx = None;
        self._thread = None;
    }
}

fn socket_loop(url: &str, cmd_rx: Receiver<WsCommand>, envelope_tx: Sender<Envelope>) {
    info!("transport thread connecting to {url}");
    let mut socket = match connect(url) {
        Ok((socket, response)) => {
            info!("transport connected, status {}", response.status());
            socket
        }
        Err(e) => {
            error!("transport connection failed: {e}");
            return;
        }
    };

    // Short read timeout keeps the loop responsive to outbound commands.
    if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
        let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
        let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
    }

    loop {
        match cmd_rx.try_recv() {
            Ok(WsCommand::Send(json)) => {
                if let Err(e) = socket.send(Message::Text(json)) {
                    error!("transport send error: {e}");
                    break;
                }
            }
            Ok(WsCommand::Close) => {
                let _ = socket.close(None);
                break;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match socket.read() {
            Ok(Message::Text(text)) => match Envelope::from_json(&text) {
                Ok(envelope) => {
                    if envelope_tx.send(envelope).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("ignoring malformed envelope: {e}"),
            },
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                error!("transport read error: {e}");
                break;
            }
        }
    }
    debug!("transport thread exiting");
}

impl Transport for WsTransport {
    fn send(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let tx = self.cmd_tx.as_ref().ok_or(TransportError::NotConnected)?;
        let json = envelope
            .to_json()
            .map_err(|e| TransportError::Send(e.to_string()))?;
        tx.send(WsCommand::Send(json))
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn poll(&mut self) -> Vec<Envelope> {
        let mut received = Vec::new();
        if let Some(rx) = &self.envelope_rx {
            while let Ok(envelope) = rx.try_recv() {
                received.push(envelope);
            }
        }
        received
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
