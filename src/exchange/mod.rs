//! Signed Bitso REST client
//!
//! Request signing, the order book fetcher, and the snapshot types it
//! produces. The capture loop talks to the exchange through the
//! [`OrderBookSource`] trait so it can run against a scripted source in tests.

mod client;
mod signer;
mod types;

pub use client::{BitsoClient, API_VERSION, BITSO_API_URL};
pub use signer::RequestSigner;
pub use types::{FetchError, OrderBookSnapshot, OrderLevel};

use async_trait::async_trait;

/// Trait for order book sources
#[async_trait]
pub trait OrderBookSource: Send + Sync {
    /// Fetch one order book snapshot for the given book
    async fn fetch_order_book(&self, book: &str) -> Result<OrderBookSnapshot, FetchError>;
}
