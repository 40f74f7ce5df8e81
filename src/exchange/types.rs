//! Order book snapshot types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// One open order on a side of the book
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLevel {
    /// Limit price
    pub price: Decimal,
    /// Order amount
    pub amount: Decimal,
}

/// One fetched, timestamped view of an order book
///
/// Immutable once produced; discarded after the derived spread row is
/// written. The bid/ask arrays arrive unordered from the API, so the best
/// values are derived by scanning, not by trusting position.
#[derive(Debug, Clone)]
pub struct OrderBookSnapshot {
    /// Traded pair identifier, e.g. `usd_mxn`
    pub book: String,
    /// Timestamp reported by the exchange, not client wall-clock
    pub captured_at: DateTime<Utc>,
    /// Exchange-assigned monotonically increasing sequence number
    pub sequence: u64,
    /// Open buy orders, unordered
    pub bids: Vec<OrderLevel>,
    /// Open sell orders, unordered
    pub asks: Vec<OrderLevel>,
}

impl OrderBookSnapshot {
    /// Highest price a buyer is willing to pay
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.iter().map(|l| l.price).max()
    }

    /// Lowest price a seller is willing to accept
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.iter().map(|l| l.price).min()
    }
}

/// Errors from a single order book fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Rejected credentials or a stale nonce (HTTP 401/403)
    #[error("authentication rejected (status {status}): {body}")]
    Auth { status: u16, body: String },

    /// Any other non-success HTTP status from the exchange
    #[error("exchange returned status {status}: {body}")]
    Remote { status: u16, body: String },

    /// Payload was not a well-formed order book response
    #[error("malformed order book payload: {0}")]
    Decode(String),

    /// Connection, DNS or timeout failure before a status was received
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
