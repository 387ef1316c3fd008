//! RoomSession - one live room view.
//!
//! Owns the room's connection and a session task that applies events to the
//! [`RoomState`] in arrival order, publishing every change through a `watch`
//! channel. Also drives the local typing indicator and the HTTP backfill used
//! when the socket has not delivered the room's history.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::adapters::websocket::{ClientFrame, ConnectionHandle, ConnectionManager, FrameSender};
use crate::domain::bargain::{
    ApplyOutcome, BargainRoom, Bid, ChatMessage, ConnectionState, RoomEvent, RoomInfo, RoomState,
};
use crate::domain::foundation::{MessageId, RoomId, Session, Timestamp};
use crate::domain::view::RoomView;
use crate::ports::{BargainApi, BargainApiError};

/// Idle time after the last keystroke before the local user stops typing.
pub const TYPING_IDLE: Duration = Duration::from_millis(2_000);

/// Inputs raised locally rather than by the server.
#[derive(Debug)]
enum LocalInput {
    /// History fetched over HTTP; only applied while still unhydrated.
    Backfill {
        info: RoomInfo,
        bids: Vec<Bid>,
        messages: Vec<ChatMessage>,
    },
    MarkRead(MessageId),
}

#[derive(Debug, Clone, Copy)]
enum TypingSignal {
    Keystroke,
    Stop,
}

pub struct RoomSession {
    room_id: RoomId,
    session: Session,
    connection: ConnectionHandle,
    state: watch::Receiver<RoomState>,
    local: mpsc::UnboundedSender<LocalInput>,
    typing: mpsc::UnboundedSender<TypingSignal>,
    tasks: Vec<JoinHandle<()>>,
}

impl RoomSession {
    /// Connects to `room` and starts applying its events. Must be called
    /// inside a tokio runtime.
    pub fn open(room: BargainRoom, session: Session, manager: &ConnectionManager) -> Self {
        let room_id = room.id;
        let (connection, events) = manager.connect(room_id, &session);
        let (state_tx, state_rx) = watch::channel(RoomState::new(room));
        let (local_tx, local_rx) = mpsc::unbounded_channel();
        let (typing_tx, typing_rx) = mpsc::unbounded_channel();

        let tasks = vec![
            tokio::spawn(apply_events(room_id, events, local_rx, state_tx)),
            tokio::spawn(drive_typing(connection.sender(), typing_rx)),
        ];
        tracing::info!(room_id = %room_id, user_id = %session.user_id, "room session opened");

        Self {
            room_id,
            session,
            connection,
            state: state_rx,
            local: local_tx,
            typing: typing_tx,
            tasks,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Latest room state.
    pub fn snapshot(&self) -> RoomState {
        self.state.borrow().clone()
    }

    /// Change notifications for the room state.
    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state.clone()
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// View-ready projection of the current state.
    pub fn view(&self, now: &Timestamp) -> RoomView {
        RoomView::project(&self.state.borrow(), &self.session, &self.connection.state(), now)
    }

    /// Fetches the room over HTTP when the socket has not hydrated it yet.
    ///
    /// Returns `false` without a request when the room is already hydrated.
    pub async fn hydrate_from_http(&self, api: &dyn BargainApi) -> Result<bool, BargainApiError> {
        if self.state.borrow().hydrated {
            return Ok(false);
        }

        let detail = api.get_room(&self.room_id).await?;
        let room = &detail.room;
        let info = RoomInfo {
            mode: Some(room.mode),
            status: Some(room.status),
            current_price: Some(room.current_price),
            quantity: Some(room.quantity),
        };
        tracing::debug!(
            room_id = %self.room_id,
            bids = detail.recent_bids.len(),
            messages = detail.recent_messages.len(),
            "backfilling room from HTTP"
        );
        let queued = self
            .local
            .send(LocalInput::Backfill {
                info,
                bids: detail.recent_bids,
                messages: detail.recent_messages,
            })
            .is_ok();
        Ok(queued)
    }

    /// Marks messages up to `message_id` as read.
    pub fn mark_read_through(&self, message_id: MessageId) {
        let _ = self.local.send(LocalInput::MarkRead(message_id));
    }

    /// Local keystroke: announces typing once and re-arms the idle stop.
    pub fn notify_typing(&self) {
        let _ = self.typing.send(TypingSignal::Keystroke);
    }

    /// Local user sent or cleared the draft.
    pub fn stop_typing(&self) {
        let _ = self.typing.send(TypingSignal::Stop);
    }

    /// Closes the socket cleanly and stops the session tasks.
    pub async fn close(self) {
        let RoomSession {
            room_id,
            connection,
            typing,
            tasks,
            ..
        } = self;

        drop(typing);
        connection.close().await;
        for task in tasks {
            task.abort();
        }
        tracing::info!(room_id = %room_id, "room session closed");
    }
}

async fn apply_events(
    room_id: RoomId,
    mut events: mpsc::Receiver<RoomEvent>,
    mut local: mpsc::UnboundedReceiver<LocalInput>,
    state: watch::Sender<RoomState>,
) {
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let kind = event.kind();
                let now = Timestamp::now();
                let mut outcome = ApplyOutcome::Ignored;
                state.send_if_modified(|s| {
                    let was_hydrated = s.hydrated;
                    outcome = s.apply(event, now);
                    outcome == ApplyOutcome::Applied || s.hydrated != was_hydrated
                });
                tracing::trace!(room_id = %room_id, kind, outcome = ?outcome, "applied room event");
            }
            Some(input) = local.recv() => apply_local(room_id, input, &state),
            else => break,
        }
    }
}

fn apply_local(room_id: RoomId, input: LocalInput, state: &watch::Sender<RoomState>) {
    match input {
        LocalInput::Backfill { info, bids, messages } => {
            state.send_if_modified(|s| {
                if s.hydrated {
                    tracing::debug!(room_id = %room_id, "socket hydrated first, dropping HTTP backfill");
                    return false;
                }
                let now = Timestamp::now();
                s.apply(RoomEvent::RecentActivity { bids, messages }, now);
                s.apply(RoomEvent::RoomInfo(info), now);
                true
            });
        }
        LocalInput::MarkRead(message_id) => {
            state.send_modify(|s| s.mark_read_through(&message_id));
        }
    }
}

/// Sends `typing` on the first keystroke and a stop after [`TYPING_IDLE`].
async fn drive_typing(sender: FrameSender, mut signals: mpsc::UnboundedReceiver<TypingSignal>) {
    let mut typing = false;
    let idle = sleep_until(Instant::now() + TYPING_IDLE);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                Some(TypingSignal::Keystroke) => {
                    if !typing {
                        typing = sender.send(&ClientFrame::Typing { is_typing: true });
                    }
                    idle.as_mut().reset(Instant::now() + TYPING_IDLE);
                }
                Some(TypingSignal::Stop) => {
                    if typing {
                        sender.send(&ClientFrame::Typing { is_typing: false });
                        typing = false;
                    }
                }
                None => {
                    if typing {
                        sender.send(&ClientFrame::Typing { is_typing: false });
                    }
                    return;
                }
            },
            _ = &mut idle, if typing => {
                sender.send(&ClientFrame::Typing { is_typing: false });
                typing = false;
            }
        }
    }
}
