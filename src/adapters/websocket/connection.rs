//! Connection Manager - one persistent socket per room view.
//!
//! A driver task owns the socket and walks
//! `Idle → Connecting → Open → Backoff(n) → Connecting … → Failed`.
//! It multiplexes inbound frames, outbound commands, the keep-alive tick and
//! shutdown with `tokio::select!`. Status is published on a `watch` channel
//! and mirrored into the event stream as synthetic `connection_status` and
//! `connection_error` events; connecting never returns an error.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use super::codec::{self, ClientFrame, DecodeOutcome};
use crate::config::{ApiConfig, ConnectionConfig};
use crate::domain::bargain::{ConnectionPhase, ConnectionState, RoomEvent};
use crate::domain::foundation::{RoomId, Session};
use crate::ports::{Frame, FrameChannel, RoomTransport};

/// Builds `ws(s)://{base}/bargain/{room_id}/ws?token=…` from the REST base URL.
pub fn room_ws_url(base_url: &str, room_id: &RoomId, token: &str) -> Result<Url, String> {
    let raw = format!("{}/bargain/{}/ws", base_url.trim_end_matches('/'), room_id);
    let mut url = Url::parse(&raw).map_err(|e| format!("invalid room URL {}: {}", raw, e))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(format!("unsupported URL scheme: {}", other)),
    };
    url.set_scheme(scheme)
        .map_err(|_| format!("cannot switch {} to {}", raw, scheme))?;
    url.query_pairs_mut().append_pair("token", token);

    Ok(url)
}

/// Opens room connections over a [`RoomTransport`].
pub struct ConnectionManager {
    transport: Arc<dyn RoomTransport>,
    base_url: String,
    config: ConnectionConfig,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn RoomTransport>, api: &ApiConfig, config: ConnectionConfig) -> Self {
        Self {
            transport,
            base_url: api.base_url().to_string(),
            config,
        }
    }

    /// Spawns the driver for `room_id`. Must be called inside a tokio runtime.
    ///
    /// Returns the handle and the room's event stream. Events arrive in the
    /// order frames were received.
    pub fn connect(
        &self,
        room_id: RoomId,
        session: &Session,
    ) -> (ConnectionHandle, mpsc::Receiver<RoomEvent>) {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer);
        let (commands_tx, commands_rx) = mpsc::channel(self.config.event_buffer);
        let (state_tx, state_rx) =
            watch::channel(ConnectionState::idle(self.config.max_reconnect_attempts));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            room_id,
            url: room_ws_url(&self.base_url, &room_id, session.token()),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            state: state_tx,
            events: events_tx,
            commands: commands_rx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(driver.run());

        let handle = ConnectionHandle {
            sender: FrameSender {
                room_id,
                commands: commands_tx,
                state: state_rx,
            },
            shutdown: shutdown_tx,
            task: Some(task),
        };
        (handle, events_rx)
    }
}

/// Cloneable outbound half of a room connection.
#[derive(Clone)]
pub struct FrameSender {
    room_id: RoomId,
    commands: mpsc::Sender<String>,
    state: watch::Receiver<ConnectionState>,
}

impl FrameSender {
    pub fn is_open(&self) -> bool {
        self.state.borrow().phase.is_open()
    }

    /// Best-effort send. `false` when the socket is not open or the outbound
    /// queue is full.
    pub fn send(&self, frame: &ClientFrame) -> bool {
        if !self.is_open() {
            tracing::debug!(room_id = %self.room_id, kind = frame.kind(), "dropping frame, room socket not open");
            return false;
        }
        match codec::encode(frame) {
            Ok(text) => self.commands.try_send(text).is_ok(),
            Err(e) => {
                tracing::warn!(room_id = %self.room_id, kind = frame.kind(), error = %e, "failed to encode frame");
                false
            }
        }
    }
}

/// Caller side of a room connection. Dropping it disconnects.
pub struct ConnectionHandle {
    sender: FrameSender,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub fn room_id(&self) -> RoomId {
        self.sender.room_id
    }

    pub fn state(&self) -> ConnectionState {
        self.sender.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.sender.state.clone()
    }

    pub fn is_open(&self) -> bool {
        self.sender.is_open()
    }

    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    pub fn send(&self, frame: &ClientFrame) -> bool {
        self.sender.send(frame)
    }

    /// Cleanly closes the socket and cancels any pending reconnect and the
    /// keep-alive. No events are emitted afterwards.
    pub fn disconnect(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Disconnects and waits for the driver to finish closing the socket.
    pub async fn close(mut self) {
        self.disconnect();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum ConnectionOutcome {
    Stop,
    Reconnect { reason: String },
}

struct Driver {
    room_id: RoomId,
    url: Result<Url, String>,
    transport: Arc<dyn RoomTransport>,
    config: ConnectionConfig,
    state: watch::Sender<ConnectionState>,
    events: mpsc::Sender<RoomEvent>,
    commands: mpsc::Receiver<String>,
    shutdown: watch::Receiver<bool>,
}

impl Driver {
    async fn run(mut self) {
        let url = match self.url.clone() {
            Ok(url) => url,
            Err(reason) => {
                tracing::error!(room_id = %self.room_id, error = %reason, "cannot build room socket URL");
                self.publish(ConnectionPhase::Failed, Some(reason.clone()));
                self.emit(RoomEvent::ConnectionError { message: reason }).await;
                return;
            }
        };

        loop {
            if self.is_shutting_down() {
                self.stopped();
                return;
            }

            match self.run_single_connection(&url).await {
                ConnectionOutcome::Stop => {
                    self.stopped();
                    return;
                }
                ConnectionOutcome::Reconnect { reason } => {
                    let made = self.state.borrow().attempts;
                    if made >= self.config.max_reconnect_attempts {
                        tracing::warn!(room_id = %self.room_id, attempt = made, error = %reason, "giving up on room socket");
                        self.publish(ConnectionPhase::Failed, Some(reason));
                        return;
                    }

                    let attempts = made + 1;
                    self.state.send_modify(|s| s.attempts = attempts);

                    tracing::info!(
                        room_id = %self.room_id,
                        attempt = attempts,
                        max_attempts = self.config.max_reconnect_attempts,
                        error = %reason,
                        "room socket closed, reconnecting"
                    );
                    self.publish(ConnectionPhase::Backoff(attempts), Some(reason));

                    tokio::select! {
                        _ = self.shutdown.changed() => {
                            self.stopped();
                            return;
                        }
                        _ = sleep(self.config.reconnect_delay()) => {}
                    }
                }
            }
        }
    }

    async fn run_single_connection(&mut self, url: &Url) -> ConnectionOutcome {
        self.publish(ConnectionPhase::Connecting, None);

        let connected = tokio::select! {
            _ = self.shutdown.changed() => return ConnectionOutcome::Stop,
            result = self.transport.connect(url.as_str()) => result,
        };
        let mut channel = match connected {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(room_id = %self.room_id, error = %e, "failed to connect room socket");
                let reason = e.to_string();
                if !self.emit(RoomEvent::ConnectionError { message: reason.clone() }).await {
                    return ConnectionOutcome::Stop;
                }
                return ConnectionOutcome::Reconnect { reason };
            }
        };

        tracing::info!(room_id = %self.room_id, "room socket connected");
        self.state.send_modify(|s| {
            s.phase = ConnectionPhase::Open;
            s.attempts = 0;
            s.last_error = None;
        });
        // Queue the snapshot request before announcing the open connection so a
        // listener reacting to the status never races ahead of it.
        if let Ok(text) = codec::encode(&ClientFrame::GetRecentActivity) {
            if let Err(e) = channel.send(text).await {
                return self.connection_lost(e.to_string()).await;
            }
        }
        if !self.emit(RoomEvent::ConnectionStatus { connected: true }).await {
            let _ = channel.close().await;
            return ConnectionOutcome::Stop;
        }

        let period = self.config.keepalive_interval();
        let mut keepalive = interval_at(Instant::now() + period, period);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::debug!(room_id = %self.room_id, "closing room socket");
                    let _ = channel.close().await;
                    return ConnectionOutcome::Stop;
                }
                Some(text) = self.commands.recv() => {
                    if let Err(e) = channel.send(text).await {
                        return self.connection_lost(e.to_string()).await;
                    }
                }
                _ = keepalive.tick() => {
                    if let Ok(text) = codec::encode(&ClientFrame::Ping) {
                        if let Err(e) = channel.send(text).await {
                            return self.connection_lost(e.to_string()).await;
                        }
                    }
                }
                frame = channel.recv() => {
                    match frame {
                        Some(Ok(Frame::Text(text))) => {
                            if !self.dispatch(&text).await {
                                let _ = channel.close().await;
                                return ConnectionOutcome::Stop;
                            }
                        }
                        Some(Ok(Frame::Close { code })) => {
                            let reason = match code {
                                Some(code) => format!("closed by server (code {})", code),
                                None => "closed by server".to_string(),
                            };
                            return self.connection_lost(reason).await;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(room_id = %self.room_id, error = %e, "room socket error");
                            let reason = e.to_string();
                            if !self.emit(RoomEvent::ConnectionError { message: reason.clone() }).await {
                                return ConnectionOutcome::Stop;
                            }
                            return self.connection_lost(reason).await;
                        }
                        None => return self.connection_lost("stream ended".to_string()).await,
                    }
                }
            }
        }
    }

    /// Close path shared by peer close, stream end and read/write errors.
    async fn connection_lost(&mut self, reason: String) -> ConnectionOutcome {
        while self.commands.try_recv().is_ok() {}
        if !self.emit(RoomEvent::ConnectionStatus { connected: false }).await {
            return ConnectionOutcome::Stop;
        }
        ConnectionOutcome::Reconnect { reason }
    }

    /// Decodes one frame and forwards it. `false` once nobody is listening.
    async fn dispatch(&self, text: &str) -> bool {
        match codec::decode(text) {
            DecodeOutcome::Event(event) => {
                tracing::trace!(room_id = %self.room_id, kind = event.kind(), "room event");
                self.emit(event).await
            }
            DecodeOutcome::Unknown(kind) => {
                tracing::debug!(room_id = %self.room_id, kind = %kind, "ignoring unknown room message");
                true
            }
            DecodeOutcome::Malformed(reason) => {
                tracing::warn!(room_id = %self.room_id, error = %reason, "dropping malformed room message");
                true
            }
        }
    }

    async fn emit(&self, event: RoomEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    fn publish(&self, phase: ConnectionPhase, error: Option<String>) {
        self.state.send_modify(|s| {
            s.phase = phase;
            if error.is_some() {
                s.last_error = error;
            }
        });
    }

    /// Caller-initiated stop; nothing is pending any more.
    fn stopped(&self) {
        self.state.send_modify(|s| {
            s.phase = ConnectionPhase::Idle;
            s.attempts = 0;
        });
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}
