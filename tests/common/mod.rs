//! Shared test infrastructure: a scripted room transport and an in-memory
//! bargain API.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use bargain_live::config::{ApiConfig, ConnectionConfig};
use bargain_live::domain::bargain::{
    AcceptedDeal, AvailableQuery, BargainRoom, Bid, BidDraft, ChatMessage, ChatRequest,
    CreateRoomRequest, MyBargainsQuery,
};
use bargain_live::domain::foundation::{BidId, Role, RoomId, Session, Timestamp, UserId};
use bargain_live::ports::{
    BargainApi, BargainApiError, ConfirmationPrompt, ConfirmationRequest, Frame, FrameChannel,
    HistoryEntry, PublicBargain, RoomDetail, RoomTransport, TransportError,
};

// =============================================================================
// Scripted transport
// =============================================================================

/// Server end of one scripted connection.
#[derive(Clone)]
pub struct ServerSide {
    frames: mpsc::UnboundedSender<Frame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ServerSide {
    pub fn push(&self, frame: Frame) {
        let _ = self.frames.send(frame);
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(Frame::Text(value.to_string()));
    }

    /// Everything the client sent on this connection, as JSON values.
    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| serde_json::from_str(text).unwrap())
            .collect()
    }

    pub fn sent_types(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|v| v["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn was_closed_by_client(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct ScriptedChannel {
    incoming: mpsc::UnboundedReceiver<Frame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl FrameChannel for ScriptedChannel {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

enum Script {
    Open(ScriptedChannel),
    Fail,
}

/// Plays back connection outcomes in order; refuses once the script runs out.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    connects: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a connection that opens; returns its server end.
    pub fn accept_next(&self) -> ServerSide {
        let (frames, incoming) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        self.scripts.lock().unwrap().push_back(Script::Open(ScriptedChannel {
            incoming,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        }));
        ServerSide { frames, sent, closed }
    }

    pub fn refuse_next(&self) {
        self.scripts.lock().unwrap().push_back(Script::Fail);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoomTransport for ScriptedTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameChannel>, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Open(channel)) => Ok(Box::new(channel)),
            Some(Script::Fail) | None => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

pub fn api_config() -> ApiConfig {
    ApiConfig::default()
}

pub fn connection_config(max_attempts: u32) -> ConnectionConfig {
    ConnectionConfig {
        max_reconnect_attempts: max_attempts,
        ..ConnectionConfig::default()
    }
}

// =============================================================================
// In-memory bargain API
// =============================================================================

/// Records calls and answers like the bargain service would.
#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<String>>,
    detail: Mutex<Option<RoomDetail>>,
}

impl RecordingApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_detail(detail: RoomDetail) -> Arc<Self> {
        Arc::new(Self {
            detail: Mutex::new(Some(detail)),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl BargainApi for RecordingApi {
    async fn create_room(&self, request: &CreateRoomRequest) -> Result<BargainRoom, BargainApiError> {
        self.record("create_room");
        Ok(BargainRoom::new(RoomId::new(), request.mode, request.quantity, request.starting_price))
    }

    async fn list_available(&self, _query: &AvailableQuery) -> Result<Vec<PublicBargain>, BargainApiError> {
        self.record("list_available");
        Ok(Vec::new())
    }

    async fn my_bargains(&self, _query: &MyBargainsQuery) -> Result<Vec<BargainRoom>, BargainApiError> {
        self.record("my_bargains");
        Ok(Vec::new())
    }

    async fn get_room(&self, _room_id: &RoomId) -> Result<RoomDetail, BargainApiError> {
        self.record("get_room");
        self.detail.lock().unwrap().clone().ok_or(BargainApiError::Status {
            status: 404,
            detail: "Bargain room not found".to_string(),
        })
    }

    async fn place_bid(&self, room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError> {
        self.record("place_bid");
        let mut bid = Bid::new(Role::Buyer, draft.price, draft.quantity, Timestamp::now())
            .with_bidder(UserId::new("buyer-1").unwrap());
        bid.room_id = Some(*room_id);
        bid.message = draft.message.clone();
        Ok(bid)
    }

    async fn respond_public(&self, _room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError> {
        self.record("respond_public");
        Ok(Bid::new(Role::Seller, draft.price, draft.quantity, Timestamp::now()))
    }

    async fn accept_bid(&self, _room_id: &RoomId, bid_id: &BidId) -> Result<AcceptedDeal, BargainApiError> {
        self.record("accept_bid");
        Ok(AcceptedDeal {
            accepted_bid_id: Some(*bid_id),
            final_price: None,
            quantity: None,
        })
    }

    async fn history(&self, _room_id: &RoomId) -> Result<Vec<HistoryEntry>, BargainApiError> {
        self.record("history");
        Ok(Vec::new())
    }

    async fn chat(&self, _room_id: &RoomId) -> Result<Vec<ChatMessage>, BargainApiError> {
        self.record("chat");
        Ok(Vec::new())
    }

    async fn post_chat(&self, _room_id: &RoomId, _request: &ChatRequest) -> Result<(), BargainApiError> {
        self.record("post_chat");
        Ok(())
    }
}

/// Confirms every prompt.
pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmationPrompt for AlwaysConfirm {
    async fn confirm(&self, _request: &ConfirmationRequest) -> bool {
        true
    }
}

pub fn session(id: &str, role: Role) -> Session {
    Session::new(UserId::new(id).unwrap(), role, "test-token")
}
