//! RoomDirectory - room creation, listings and history over REST.
//!
//! Reads are retried with exponential backoff on transient failures.
//! Creation is never retried since the server offers no idempotency key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use super::negotiation::NegotiationError;
use crate::domain::bargain::{
    AvailableQuery, BargainRoom, ChatMessage, CreateRoomRequest, MyBargainsQuery, RoomMode,
};
use crate::domain::foundation::RoomId;
use crate::ports::{BargainApi, BargainApiError, HistoryEntry, PublicBargain, RoomDetail};

const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub struct RoomDirectory {
    api: Arc<dyn BargainApi>,
    max_retries: u32,
    retry_delay: Duration,
}

impl RoomDirectory {
    pub fn new(api: Arc<dyn BargainApi>) -> Self {
        Self {
            api,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Sets the maximum retry count for reads.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Creates a public or private room after local validation.
    pub async fn create_room(&self, request: &CreateRoomRequest) -> Result<BargainRoom, NegotiationError> {
        request.validate()?;
        tracing::info!(
            mode = ?request.mode,
            product_id = %request.product_id,
            quantity = request.quantity,
            "creating bargain room"
        );
        let room = self.api.create_room(request).await?;
        tracing::info!(room_id = %room.id, "bargain room created");
        Ok(room)
    }

    /// Open public bargains sellers may respond to.
    pub async fn list_available(&self, query: &AvailableQuery) -> Result<Vec<PublicBargain>, NegotiationError> {
        query.page.validate()?;
        let mut listings = self
            .read("list_available", || self.api.list_available(query))
            .await?;
        // The listing payload does not carry room_type.
        for listing in &mut listings {
            listing.room.mode = RoomMode::Public;
        }
        Ok(listings)
    }

    /// Rooms the local user created or takes part in.
    pub async fn my_bargains(&self, query: &MyBargainsQuery) -> Result<Vec<BargainRoom>, NegotiationError> {
        query.page.validate()?;
        self.read("my_bargains", || self.api.my_bargains(query)).await
    }

    pub async fn get_room(&self, room_id: &RoomId) -> Result<RoomDetail, NegotiationError> {
        self.read("get_room", || self.api.get_room(room_id)).await
    }

    pub async fn history(&self, room_id: &RoomId) -> Result<Vec<HistoryEntry>, NegotiationError> {
        self.read("history", || self.api.history(room_id)).await
    }

    pub async fn chat(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, NegotiationError> {
        self.read("chat", || self.api.chat(room_id)).await
    }

    async fn read<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, NegotiationError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, BargainApiError>>,
    {
        let mut retry_count = 0;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(e) => NegotiationError::from(e),
            };
            if !err.is_retryable() || retry_count >= self.max_retries {
                return Err(err);
            }

            // Exponential backoff: 500ms, 1s, 2s, ...
            let delay = self.retry_delay * (1 << retry_count);
            tracing::debug!(operation, attempt = retry_count + 1, error = %err, "retrying bargain read");
            sleep(delay).await;
            retry_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bargain::{AcceptedDeal, Bid, BidDraft, ChatRequest, Page};
    use crate::domain::foundation::{BidId, UserId};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<&'static str>>,
        transient_failures: Mutex<u32>,
        reject_with: Option<u16>,
    }

    impl MockApi {
        fn flaky(failures: u32) -> Self {
            Self {
                transient_failures: Mutex::new(failures),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn outcome(&self, call: &'static str) -> Result<(), BargainApiError> {
            self.calls.lock().unwrap().push(call);
            if let Some(status) = self.reject_with {
                return Err(BargainApiError::Status {
                    status,
                    detail: "Invalid request".to_string(),
                });
            }
            let mut failures = self.transient_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(BargainApiError::Status {
                    status: 503,
                    detail: "Service Unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BargainApi for MockApi {
        async fn create_room(&self, request: &CreateRoomRequest) -> Result<BargainRoom, BargainApiError> {
            self.outcome("create_room")?;
            Ok(BargainRoom::new(RoomId::new(), request.mode, request.quantity, request.starting_price))
        }

        async fn list_available(&self, _query: &AvailableQuery) -> Result<Vec<PublicBargain>, BargainApiError> {
            self.outcome("list_available")?;
            let listing = serde_json::from_value(serde_json::json!({
                "room_id": "6a2f41a3-c54b-4a8e-8b4a-2b8a5e2d9f10",
                "product_id": "p-1",
                "quantity": 200,
                "current_bid_price": "38.50",
                "total_seller_responses": 2
            }))
            .map_err(|e| BargainApiError::Decode(e.to_string()))?;
            Ok(vec![listing])
        }

        async fn my_bargains(&self, _query: &MyBargainsQuery) -> Result<Vec<BargainRoom>, BargainApiError> {
            self.outcome("my_bargains")?;
            Ok(Vec::new())
        }

        async fn get_room(&self, _room_id: &RoomId) -> Result<RoomDetail, BargainApiError> {
            Err(BargainApiError::Status {
                status: 404,
                detail: "Bargain room not found".to_string(),
            })
        }

        async fn place_bid(&self, _room_id: &RoomId, _draft: &BidDraft) -> Result<Bid, BargainApiError> {
            unreachable!()
        }

        async fn respond_public(&self, _room_id: &RoomId, _draft: &BidDraft) -> Result<Bid, BargainApiError> {
            unreachable!()
        }

        async fn accept_bid(&self, _room_id: &RoomId, _bid_id: &BidId) -> Result<AcceptedDeal, BargainApiError> {
            unreachable!()
        }

        async fn history(&self, _room_id: &RoomId) -> Result<Vec<HistoryEntry>, BargainApiError> {
            self.outcome("history")?;
            Ok(Vec::new())
        }

        async fn chat(&self, _room_id: &RoomId) -> Result<Vec<ChatMessage>, BargainApiError> {
            self.outcome("chat")?;
            Ok(Vec::new())
        }

        async fn post_chat(&self, _room_id: &RoomId, _request: &ChatRequest) -> Result<(), BargainApiError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn invalid_room_request_is_rejected_locally() {
        let api = Arc::new(MockApi::default());
        let directory = RoomDirectory::new(api.clone());

        let request = CreateRoomRequest::public("p-1", 10, 40.0, "5600");
        let err = directory.create_room(&request).await.unwrap_err();

        assert!(matches!(err, NegotiationError::Validation(_)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn creates_private_room() {
        let api = Arc::new(MockApi::default());
        let directory = RoomDirectory::new(api.clone());

        let request = CreateRoomRequest::private("p-1", UserId::new("seller-1").unwrap(), 10, 40.0, "560001")
            .expiring_in(48);
        let room = directory.create_room(&request).await.unwrap();

        assert_eq!(room.mode, RoomMode::Private);
        assert_eq!(api.calls(), vec!["create_room"]);
    }

    #[tokio::test]
    async fn creation_is_not_retried() {
        let api = Arc::new(MockApi::flaky(1));
        let directory = RoomDirectory::new(api.clone());

        let request = CreateRoomRequest::public("p-1", 10, 40.0, "560001");
        let err = directory.create_room(&request).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_read_failures_are_retried() {
        let api = Arc::new(MockApi::flaky(2));
        let directory = RoomDirectory::new(api.clone());

        let history = directory.history(&RoomId::new()).await.unwrap();

        assert!(history.is_empty());
        assert_eq!(api.calls(), vec!["history", "history", "history"]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let api = Arc::new(MockApi::flaky(5));
        let directory = RoomDirectory::new(api.clone()).with_max_retries(1);

        let err = directory.chat(&RoomId::new()).await.unwrap_err();

        assert!(matches!(err, NegotiationError::Network(_)));
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let api = Arc::new(MockApi {
            reject_with: Some(422),
            ..MockApi::default()
        });
        let directory = RoomDirectory::new(api.clone());

        let err = directory.my_bargains(&MyBargainsQuery::default()).await.unwrap_err();

        assert_eq!(
            err,
            NegotiationError::Rejected {
                detail: "Invalid request".to_string()
            }
        );
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_room_is_reported_closed() {
        let directory = RoomDirectory::new(Arc::new(MockApi::default()));

        let err = directory.get_room(&RoomId::new()).await.unwrap_err();

        assert!(matches!(err, NegotiationError::RoomClosed(detail) if detail == "Bargain room not found"));
    }

    #[tokio::test]
    async fn public_listings_are_marked_public() {
        let directory = RoomDirectory::new(Arc::new(MockApi::default()));

        let listings = directory.list_available(&AvailableQuery::default()).await.unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].room.mode, RoomMode::Public);
        assert_eq!(listings[0].room.current_price, 38.5);
    }

    #[tokio::test]
    async fn oversized_page_is_rejected() {
        let api = Arc::new(MockApi::default());
        let directory = RoomDirectory::new(api.clone());
        let query = AvailableQuery {
            page: Page { skip: 0, limit: 500 },
            ..AvailableQuery::default()
        };

        assert!(directory.list_available(&query).await.is_err());
        assert!(api.calls().is_empty());
    }
}
