//! Bid/ask spread computation
//!
//! Derives the top-of-book spread from a snapshot. All arithmetic is
//! `Decimal`; the percentage formula is fixed at `(ask - bid) * 100 / ask`.

use crate::exchange::OrderBookSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Side of the order book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// Errors deriving a spread from a snapshot
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpreadError {
    /// One side of the book has no orders; the tick is skipped
    #[error("order book has no {side} orders")]
    EmptyBook { side: Side },

    /// A zero best ask makes the percentage undefined
    #[error("best ask is zero, spread is undefined")]
    ZeroAsk,
}

/// One derived spread observation, the unit persisted to the lake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadRow {
    /// The snapshot's exchange timestamp
    pub timestamp: DateTime<Utc>,
    /// Traded pair identifier
    pub book: String,
    /// Best bid price
    pub bid: Decimal,
    /// Best ask price
    pub ask: Decimal,
    /// `(ask - bid) * 100 / ask`
    pub spread: Decimal,
}

impl SpreadRow {
    /// Derive the spread row for a snapshot
    ///
    /// Returns `EmptyBook` when either side has no orders and `ZeroAsk`
    /// when the best ask is zero; neither aborts the capture loop.
    pub fn from_snapshot(snapshot: &OrderBookSnapshot) -> Result<Self, SpreadError> {
        let bid = snapshot
            .best_bid()
            .ok_or(SpreadError::EmptyBook { side: Side::Bid })?;
        let ask = snapshot
            .best_ask()
            .ok_or(SpreadError::EmptyBook { side: Side::Ask })?;

        if ask.is_zero() {
            return Err(SpreadError::ZeroAsk);
        }

        let spread = (ask - bid) * Decimal::ONE_HUNDRED / ask;

        Ok(Self {
            timestamp: snapshot.captured_at,
            book: snapshot.book.clone(),
            bid,
            ask,
            spread,
        })
    }
}
