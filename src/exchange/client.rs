//! Bitso REST API client for order book snapshots
//!
//! Issues one signed GET per call and decodes the payload into an
//! [`OrderBookSnapshot`]. No retry or backoff here; retry policy belongs
//! to the capture loop.

use super::signer::RequestSigner;
use super::types::{FetchError, OrderBookSnapshot, OrderLevel};
use super::OrderBookSource;
use crate::config::{ApiConfig, Credentials};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Bitso sandbox REST API base URL
pub const BITSO_API_URL: &str = "https://sandbox.bitso.com";

/// API version path segment
pub const API_VERSION: &str = "api/v3";

/// Client for the Bitso order book endpoint
pub struct BitsoClient {
    base_url: String,
    client: Client,
    signer: RequestSigner,
}

impl BitsoClient {
    /// Create a new client from configuration and credentials
    pub fn new(config: &ApiConfig, credentials: Credentials) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            signer: RequestSigner::new(credentials),
        }
    }

    /// Fetch one order book snapshot
    pub async fn fetch_order_book(&self, book: &str) -> Result<OrderBookSnapshot, FetchError> {
        let request_path = format!("/{API_VERSION}/order_book/?book={book}");
        let url = format!("{}{}", self.base_url, request_path);

        // Signed immediately before the call so the nonce stays fresh
        let auth_header = self.signer.authorization_header("GET", &request_path);

        tracing::debug!(book = %book, url = %url, "Fetching order book");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, auth_header)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Auth {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: OrderBookResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        parsed.payload.into_snapshot(book)
    }
}

#[async_trait]
impl OrderBookSource for BitsoClient {
    async fn fetch_order_book(&self, book: &str) -> Result<OrderBookSnapshot, FetchError> {
        BitsoClient::fetch_order_book(self, book).await
    }
}

/// Raw order book response envelope
#[derive(Debug, Deserialize)]
struct OrderBookResponse {
    payload: OrderBookPayload,
}

/// Raw order book payload
#[derive(Debug, Deserialize)]
struct OrderBookPayload {
    /// ISO-8601 timestamp with offset
    updated_at: String,
    /// The live API serializes this as a string; the docs say integer
    #[serde(deserialize_with = "deserialize_sequence")]
    sequence: u64,
    bids: Vec<OrderLevel>,
    asks: Vec<OrderLevel>,
}

impl OrderBookPayload {
    fn into_snapshot(self, book: &str) -> Result<OrderBookSnapshot, FetchError> {
        let captured_at = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|e| FetchError::Decode(format!("bad updated_at '{}': {e}", self.updated_at)))?
            .with_timezone(&Utc);

        Ok(OrderBookSnapshot {
            book: book.to_string(),
            captured_at,
            sequence: self.sequence,
            bids: self.bids,
            asks: self.asks,
        })
    }
}

/// Accept the sequence as either a JSON number or a string
fn deserialize_sequence<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SequenceRepr {
        Number(u64),
        Text(String),
    }

    match SequenceRepr::deserialize(deserializer)? {
        SequenceRepr::Number(n) => Ok(n),
        SequenceRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE_PAYLOAD: &str = r#"{
        "success": true,
        "payload": {
            "updated_at": "2022-05-12T10:33:20-05:00",
            "sequence": "27214",
            "bids": [
                {"book": "usd_mxn", "price": "17.08", "amount": "100.0"},
                {"book": "usd_mxn", "price": "17.10", "amount": "25.5"}
            ],
            "asks": [
                {"book": "usd_mxn", "price": "17.25", "amount": "40.0"},
                {"book": "usd_mxn", "price": "17.20", "amount": "10.0"}
            ]
        }
    }"#;

    #[test]
    fn test_decode_sample_payload() {
        let response: OrderBookResponse = serde_json::from_str(SAMPLE_PAYLOAD).unwrap();
        let snapshot = response.payload.into_snapshot("usd_mxn").unwrap();

        assert_eq!(snapshot.book, "usd_mxn");
        assert_eq!(snapshot.sequence, 27214);
        assert_eq!(snapshot.captured_at.to_rfc3339(), "2022-05-12T15:33:20+00:00");
        assert_eq!(snapshot.best_bid(), Some(dec!(17.10)));
        assert_eq!(snapshot.best_ask(), Some(dec!(17.20)));
    }

    #[test]
    fn test_decode_numeric_sequence() {
        let json = r#"{
            "payload": {
                "updated_at": "2022-05-12T10:33:20+00:00",
                "sequence": 42,
                "bids": [],
                "asks": []
            }
        }"#;
        let response: OrderBookResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.payload.sequence, 42);
    }

    #[test]
    fn test_bad_timestamp_is_decode_error() {
        let payload = OrderBookPayload {
            updated_at: "not-a-timestamp".to_string(),
            sequence: 1,
            bids: vec![],
            asks: vec![],
        };
        let err = payload.into_snapshot("usd_mxn").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        let result: Result<OrderBookResponse, _> = serde_json::from_str("{\"payload\": 3}");
        assert!(result.is_err());
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let config = ApiConfig {
            base_url: "https://sandbox.bitso.com/".to_string(),
            timeout_secs: 5,
        };
        let client = BitsoClient::new(
            &config,
            Credentials {
                key: "k".to_string(),
                secret: "s".to_string(),
            },
        );
        assert_eq!(client.base_url, "https://sandbox.bitso.com");
    }
}
