//! Request signing for the Bitso REST API
//!
//! Every call carries an `Authorization: Bitso {key}:{nonce}:{signature}`
//! header where the signature is an HMAC-SHA256 over
//! `{nonce}{method}{request_path}{body}`. The nonce is the Unix time in
//! milliseconds and must be generated immediately before the call; the
//! server rejects nonces outside its skew tolerance window.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Authorization scheme name used in the header value
pub const AUTH_SCHEME: &str = "Bitso";

/// Signs API requests with the configured key and secret
#[derive(Clone)]
pub struct RequestSigner {
    credentials: Credentials,
}

impl RequestSigner {
    /// Create a signer for the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Produce an authorization header value for a single call
    ///
    /// `request_path` is the full path including the query string, e.g.
    /// `/api/v3/order_book/?book=usd_mxn`. The body is empty for reads.
    pub fn authorization_header(&self, method: &str, request_path: &str) -> String {
        let nonce = Utc::now().timestamp_millis();
        self.header_for_nonce(nonce, method, request_path, "")
    }

    fn header_for_nonce(&self, nonce: i64, method: &str, request_path: &str, body: &str) -> String {
        let message = format!("{nonce}{method}{request_path}{body}");

        let mut mac = HmacSha256::new_from_slice(self.credentials.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(message.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        format!("{AUTH_SCHEME} {}:{nonce}:{signature}", self.credentials.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> RequestSigner {
        RequestSigner::new(Credentials {
            key: "test-key".to_string(),
            secret: "test-secret".to_string(),
        })
    }

    #[test]
    fn test_known_signature() {
        // HMAC-SHA256("test-secret", "1651234567890GET/api/v3/order_book/?book=usd_mxn")
        let header = test_signer().header_for_nonce(
            1651234567890,
            "GET",
            "/api/v3/order_book/?book=usd_mxn",
            "",
        );
        assert_eq!(
            header,
            "Bitso test-key:1651234567890:\
             445dc9312b9fdb960c65096e7b641f1558cdbbf1b8102898425737a9ad9e9263"
        );
    }

    #[test]
    fn test_header_shape() {
        let header = test_signer().authorization_header("GET", "/api/v3/order_book/?book=btc_mxn");

        let rest = header.strip_prefix("Bitso test-key:").unwrap();
        let (nonce, signature) = rest.split_once(':').unwrap();
        assert!(nonce.parse::<i64>().is_ok());
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_covers_request_path() {
        let signer = test_signer();
        let a = signer.header_for_nonce(1, "GET", "/api/v3/order_book/?book=usd_mxn", "");
        let b = signer.header_for_nonce(1, "GET", "/api/v3/order_book/?book=btc_mxn", "");
        assert_ne!(a, b);
    }

    #[test]
    fn test_nonce_advances_between_calls() {
        let signer = test_signer();
        let extract = |h: &str| -> i64 {
            h.split(':').nth(1).unwrap().parse().unwrap()
        };
        let first = extract(&signer.authorization_header("GET", "/api/v3/order_book/"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = extract(&signer.authorization_header("GET", "/api/v3/order_book/"));
        assert!(second > first);
    }
}
