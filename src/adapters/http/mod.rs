//! HTTP adapters for the bargain REST service.

mod bargain_client;

pub use bargain_client::HttpBargainClient;
