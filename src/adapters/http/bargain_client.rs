//! HTTP Bargain Client - `reqwest` implementation of the `BargainApi` port.
//!
//! # Configuration
//!
//! ```ignore
//! let client = HttpBargainClient::new(&config.api, &session)?;
//! let room = client.get_room(&room_id).await?;
//! ```
//!
//! # Errors
//!
//! Non-success responses carry a JSON body with a `detail` field. FastAPI
//! validation failures send `detail` as a list of `{loc, msg}` objects; both
//! shapes are flattened into [`BargainApiError::Status`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::domain::bargain::{
    AcceptRequest, AcceptedDeal, AvailableQuery, BargainRoom, Bid, BidDraft, ChatMessage,
    ChatRequest, CreateRoomRequest, MyBargainsQuery, RoomMode,
};
use crate::domain::foundation::{BidId, RoomId, Session};
use crate::ports::{BargainApi, BargainApiError, HistoryEntry, PublicBargain, RoomDetail};

/// Bargain REST client bound to one session's token.
pub struct HttpBargainClient {
    base_url: String,
    token: Secret<String>,
    client: Client,
}

impl HttpBargainClient {
    pub fn new(config: &ApiConfig, session: &Session) -> Result<Self, BargainApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BargainApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            token: Secret::new(session.token().to_string()),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/bargain/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BargainApiError> {
        let response = request
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BargainApiError::Timeout
                } else if e.is_connect() {
                    BargainApiError::Network(format!("Connection failed: {}", e))
                } else {
                    BargainApiError::Network(e.to_string())
                }
            })?;
        Self::handle_response_status(response).await
    }

    async fn handle_response_status(response: Response) -> Result<Response, BargainApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        tracing::debug!(status = status.as_u16(), detail = %detail, "bargain API request rejected");

        Err(BargainApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, BargainApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BargainApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BargainApiError> {
        let response = self.send(self.client.get(self.url(path))).await?;
        Self::parse(response).await
    }
}

#[derive(Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

/// Pulls the human-readable `detail` out of an error body.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl BargainApi for HttpBargainClient {
    async fn create_room(&self, request: &CreateRoomRequest) -> Result<BargainRoom, BargainApiError> {
        let path = match request.mode {
            RoomMode::Public => "public/create",
            RoomMode::Private => "private/create",
        };
        let response = self
            .send(self.client.post(self.url(path)).json(request))
            .await?;
        Self::parse(response).await
    }

    async fn list_available(&self, query: &AvailableQuery) -> Result<Vec<PublicBargain>, BargainApiError> {
        let response = self
            .send(self.client.get(self.url("public/available")).query(query))
            .await?;
        Self::parse(response).await
    }

    async fn my_bargains(&self, query: &MyBargainsQuery) -> Result<Vec<BargainRoom>, BargainApiError> {
        let response = self
            .send(self.client.get(self.url("my-bargains")).query(query))
            .await?;
        Self::parse(response).await
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<RoomDetail, BargainApiError> {
        self.get(&room_id.to_string()).await
    }

    async fn place_bid(&self, room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError> {
        let url = self.url(&format!("{}/bid", room_id));
        let response = self.send(self.client.post(url).json(draft)).await?;
        Self::parse(response).await
    }

    async fn respond_public(&self, room_id: &RoomId, draft: &BidDraft) -> Result<Bid, BargainApiError> {
        let url = self.url(&format!("public/{}/respond", room_id));
        let response = self.send(self.client.post(url).json(draft)).await?;
        Self::parse(response).await
    }

    async fn accept_bid(&self, room_id: &RoomId, bid_id: &BidId) -> Result<AcceptedDeal, BargainApiError> {
        let url = self.url(&format!("{}/accept", room_id));
        let body = AcceptRequest { bid_id: *bid_id };
        let response = self.send(self.client.post(url).json(&body)).await?;
        Self::parse(response).await
    }

    async fn history(&self, room_id: &RoomId) -> Result<Vec<HistoryEntry>, BargainApiError> {
        let envelope: HistoryEnvelope = self.get(&format!("{}/history", room_id)).await?;
        Ok(envelope.history)
    }

    async fn chat(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, BargainApiError> {
        let envelope: ChatEnvelope = self.get(&format!("{}/chat", room_id)).await?;
        Ok(envelope.messages)
    }

    async fn post_chat(&self, room_id: &RoomId, request: &ChatRequest) -> Result<(), BargainApiError> {
        let url = self.url(&format!("{}/chat", room_id));
        self.send(self.client.post(url).json(request)).await?;
        Ok(())
    }
}
