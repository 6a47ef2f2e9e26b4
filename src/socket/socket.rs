/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::Builder;
use tungstenite::Message;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ServerConfig;
use crate::error::LiftError;
use crate::shared::LiftId;

/***************************************/
/*             Constants               */
/***************************************/
const EVENT_CLIENT_INFO: &str = "client_info";
const EVENT_LIFT_MOVED: &str = "lift_moved";

const STATE_CLOSED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_OPEN: u8 = 2;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

impl ChannelState {
    fn from_u8(value: u8) -> ChannelState {
        match value {
            STATE_CONNECTING => ChannelState::Connecting,
            STATE_OPEN => ChannelState::Open,
            _ => ChannelState::Closed,
        }
    }
}

/// Classified inbound traffic plus connection lifecycle notifications,
/// forwarded to the reconciler loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Opened,
    ClientInfo { client_id: String },
    LiftMoved { lift_id: LiftId, floor_requested: u8 },
    Closed,
}

/**
 * Shared connection state between the manager and its reader thread.
 *
 * Teardown flips the gate to Closed before the connection is discarded, so
 * a reader that races teardown forwards nothing further. The reader only
 * reports failure while it still holds the gate; a torn-down channel stays
 * silently Closed.
 */
pub struct ChannelGate {
    state: AtomicU8,
}

impl ChannelGate {
    pub(crate) fn new_connecting() -> Arc<ChannelGate> {
        Arc::new(ChannelGate {
            state: AtomicU8::new(STATE_CONNECTING),
        })
    }

    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Connecting -> Open. Fails if teardown won the race.
    pub fn open(&self) -> bool {
        self.state
            .compare_exchange(STATE_CONNECTING, STATE_OPEN, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Detaches the reader: no event sent after this returns is forwarded.
    pub fn detach(&self) {
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
    }

    /// Open/Connecting -> Closed from the reader side. Returns whether the
    /// reader still held the gate, i.e. whether the closure is reportable.
    pub fn close_attached(&self) -> bool {
        self.state.swap(STATE_CLOSED, Ordering::SeqCst) != STATE_CLOSED
    }

    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_OPEN
    }
}

/**
 * Owns the lifecycle of the push channel: one logical WebSocket connection
 * bound to exactly one session id at a time.
 *
 * State machine per session id: Closed -> Connecting -> Open -> Closed.
 * Rebinding to a new session id reaches Closed for the old id before
 * Connecting begins for the new one. A dropped connection stays Closed; no
 * reconnect is attempted until the session id changes again.
 */
pub struct SocketManager {
    socket_url: String,
    event_tx: cbc::Sender<SocketEvent>,
    active: Option<ActiveChannel>,
}

struct ActiveChannel {
    session_id: String,
    gate: Arc<ChannelGate>,
}

impl SocketManager {
    pub fn new(config: &ServerConfig, event_tx: cbc::Sender<SocketEvent>) -> SocketManager {
        SocketManager {
            socket_url: config.socket_url.trim_end_matches('/').to_string(),
            event_tx,
            active: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.active
            .as_ref()
            .map(|channel| channel.gate.state())
            .unwrap_or(ChannelState::Closed)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|channel| channel.session_id.as_str())
    }

    /// Handle on the current channel's gate, used by tests to observe the
    /// teardown-before-connect ordering.
    pub fn gate(&self) -> Option<Arc<ChannelGate>> {
        self.active.as_ref().map(|channel| channel.gate.clone())
    }

    /// Binds the channel to `session_id`, tearing down any channel bound to
    /// a different id first. Binding to the already-bound id is a no-op.
    pub fn bind(&mut self, session_id: &str) {
        if self
            .active
            .as_ref()
            .map(|channel| channel.session_id == session_id)
            .unwrap_or(false)
        {
            return;
        }
        self.teardown();
        if session_id.is_empty() {
            return;
        }

        let url = format!("{}/ws/?sessionId={}", self.socket_url, session_id);
        let gate = ChannelGate::new_connecting();
        let reader_gate = gate.clone();
        let reader_tx = self.event_tx.clone();

        let reader_thread = Builder::new().name("socket_reader".into());
        let spawned = reader_thread.spawn(move || run_channel(&url, &reader_gate, &reader_tx));
        match spawned {
            Ok(_) => {
                self.active = Some(ActiveChannel {
                    session_id: session_id.to_string(),
                    gate,
                });
            }
            Err(e) => {
                warn!("failed to spawn socket reader: {}", e);
                gate.detach();
            }
        }
    }

    pub fn teardown(&mut self) {
        if let Some(channel) = self.active.take() {
            info!("closing push channel for session {}", channel.session_id);
            channel.gate.detach();
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/
#[derive(Deserialize)]
struct Envelope {
    body: serde_json::Value,
}

/// Classifies one inbound envelope `{"body": {"event": ..., ...}}`.
/// Unrecognized event tags and malformed payloads yield `None`.
pub fn classify(raw: &str) -> Option<SocketEvent> {
    let envelope: Envelope = serde_json::from_str(raw).ok()?;
    let event = envelope.body.get("event")?.as_str()?;
    match event {
        EVENT_CLIENT_INFO => {
            let client_id = envelope.body.get("clientId")?.as_str()?;
            Some(SocketEvent::ClientInfo {
                client_id: client_id.to_string(),
            })
        }
        EVENT_LIFT_MOVED => {
            let lift_id = envelope.body.get("lift_id")?.as_str()?;
            let floor = envelope.body.get("floor_requested")?.as_u64()?;
            Some(SocketEvent::LiftMoved {
                lift_id: lift_id.to_string(),
                floor_requested: u8::try_from(floor).ok()?,
            })
        }
        other => {
            debug!("ignoring push event {}", other);
            None
        }
    }
}

/// Reader thread body: connect, forward classified events while the gate is
/// held, report closure once if still attached.
fn run_channel(url: &str, gate: &ChannelGate, event_tx: &cbc::Sender<SocketEvent>) {
    match tungstenite::connect(url) {
        Ok((mut socket, _response)) => {
            if !gate.open() {
                // Torn down while connecting; never deliver anything.
                let _ = socket.close(None);
                return;
            }
            let _ = event_tx.send(SocketEvent::Opened);

            loop {
                if !gate.is_open() {
                    let _ = socket.close(None);
                    break;
                }
                match socket.read() {
                    Ok(Message::Text(text)) => {
                        if gate.is_open() {
                            if let Some(event) = classify(&text) {
                                let _ = event_tx.send(event);
                            }
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        }
        Err(e) => {
            warn!("{}", LiftError::Channel(e.to_string()));
        }
    }

    if gate.close_attached() {
        let _ = event_tx.send(SocketEvent::Closed);
    }
}
