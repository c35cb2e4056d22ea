//! Verification of identity-provider webhook signatures.
//!
//! Webhooks are signed Svix-style: the signed content is
//! `{msg_id}.{timestamp}.{body}`, the MAC is HMAC-SHA256 keyed with the
//! base64 payload of a `whsec_`-prefixed secret, and the `svix-signature`
//! header carries one or more space-separated `v1,<base64 mac>` entries.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::Timestamp;

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried by webhook signing secrets.
const SECRET_PREFIX: &str = "whsec_";

/// Signature scheme version accepted in the signature header.
const SIGNATURE_VERSION: &str = "v1";

/// Maximum clock skew between the sender's timestamp and ours.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Errors from webhook signature verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Webhook secret is not valid base64")]
    InvalidSecret,

    #[error("Webhook timestamp header is not a unix timestamp")]
    InvalidTimestamp,

    #[error("Webhook timestamp is outside the allowed tolerance")]
    TimestampOutOfTolerance,

    #[error("No webhook signature matched")]
    NoMatchingSignature,
}

/// Verifies webhook requests against a shared signing secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Build a verifier from a `whsec_...` secret (the prefix is optional).
    pub fn from_secret(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.trim().trim_start_matches(SECRET_PREFIX);
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        Ok(Self {
            key,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        })
    }

    /// Override the allowed clock skew.
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Check the headers of one delivery against its raw body.
    pub fn verify(
        &self,
        msg_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
        now: Timestamp,
    ) -> Result<(), SignatureError> {
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if (now.timestamp() - sent_at).abs() > self.tolerance_secs {
            return Err(SignatureError::TimestampOutOfTolerance);
        }

        let mac = self.mac_for(msg_id, sent_at, body);

        let matched = signature_header
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(SignatureError::NoMatchingSignature)
        }
    }

    /// Produce the `v1,<base64>` signature for a payload.
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> String {
        let digest = self.mac_for(msg_id, timestamp, body).finalize().into_bytes();
        format!("{SIGNATURE_VERSION},{}", STANDARD.encode(digest))
    }

    fn mac_for(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }
}
