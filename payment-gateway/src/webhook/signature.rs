//! Stripe webhook signature verification.
//!
//! Stripe signs each delivery with HMAC-SHA256 and sends the result in the
//! `Stripe-Signature` header as `t=<unix seconds>,v1=<hex digest>`. The signed
//! message is `"<t>.<raw body>"`. Multiple `v1` entries may be present while a
//! secret is being rolled; other schemes (`v0`) are ignored.
//! Reference: https://docs.stripe.com/webhooks#verify-manually

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use super::event::VerifiedEvent;
use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature, lowercase as axum normalizes names.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

const SIGNATURE_SCHEME: &str = "v1";

/// Parsed `Stripe-Signature` header.
#[derive(Debug, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: u64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let Some((key, value)) = item.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" if timestamp.is_none() => timestamp = Some(value.trim()),
                SIGNATURE_SCHEME => signatures.push(value.trim().to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp
            .and_then(|t| t.parse::<u64>().ok())
            .ok_or(WebhookError::InvalidSignature(
                "unable to extract timestamp and signatures from header",
            ))?;

        if signatures.is_empty() {
            return Err(WebhookError::InvalidSignature(
                "no signatures found with expected scheme",
            ));
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

/// Verifies deliveries against the process-wide signing secret.
///
/// Immutable after construction, so one instance is shared by every request.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs,
        }
    }

    /// Build a verifier only when a non-blank secret is configured.
    pub fn from_secret(secret: Option<&str>, tolerance_secs: u64) -> Option<Self> {
        secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self::new(s, tolerance_secs))
    }

    /// Verify a delivery against the current time.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<VerifiedEvent, WebhookError> {
        self.verify_at(payload, header, unix_now())
    }

    /// Verify a delivery as of `now` (unix seconds).
    ///
    /// The body is only decoded into an event after the signature and the
    /// timestamp window have both been checked.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: u64,
    ) -> Result<VerifiedEvent, WebhookError> {
        let body = std::str::from_utf8(payload)
            .map_err(|_| WebhookError::InvalidPayload("body is not valid UTF-8".to_string()))?;

        let parsed = SignatureHeader::parse(header).inspect_err(|_| {
            warn!(header_length = header.len(), "stripe_signature_header_malformed");
        })?;

        let mac = signed_mac(&self.secret, parsed.timestamp, body);
        let matched = parsed.signatures.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });

        if !matched {
            warn!(
                candidates = parsed.signatures.len(),
                timestamp = parsed.timestamp,
                "stripe_signature_mismatch"
            );
            return Err(WebhookError::InvalidSignature(
                "no signatures found matching the expected signature for payload",
            ));
        }

        if parsed.timestamp.saturating_add(self.tolerance_secs) < now {
            warn!(
                webhook_time = parsed.timestamp,
                current_time = now,
                age_seconds = now - parsed.timestamp,
                max_age_seconds = self.tolerance_secs,
                "stripe_signature_stale"
            );
            return Err(WebhookError::InvalidSignature(
                "timestamp outside the tolerance zone",
            ));
        }

        VerifiedEvent::from_verified_body(body)
    }
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`.
pub fn compute_signature(secret: &str, timestamp: u64, payload: &str) -> String {
    hex::encode(signed_mac(secret, timestamp, payload).finalize().into_bytes())
}

/// Build a complete `Stripe-Signature` header value for a payload.
pub fn signature_header(secret: &str, timestamp: u64, payload: &str) -> String {
    format!(
        "t={},{}={}",
        timestamp,
        SIGNATURE_SCHEME,
        compute_signature(secret, timestamp, payload)
    )
}

fn signed_mac(secret: &str, timestamp: u64, payload: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","amount":2999,"metadata":{"order_id":"order_12345"}}}}"#;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(SECRET, 300)
    }

    #[test]
    fn test_parse_header() {
        let parsed = SignatureHeader::parse("t=1700000000,v1=abc,v0=old,v1=def").unwrap();
        assert_eq!(parsed.timestamp, 1700000000);
        assert_eq!(parsed.signatures, vec!["abc".to_string(), "def".to_string()]);
    }

    #[test]
    fn test_parse_header_missing_timestamp() {
        assert!(matches!(
            SignatureHeader::parse("v1=abc"),
            Err(WebhookError::InvalidSignature(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("t=yesterday,v1=abc"),
            Err(WebhookError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_parse_header_missing_scheme() {
        assert!(matches!(
            SignatureHeader::parse("t=1700000000,v0=abc"),
            Err(WebhookError::InvalidSignature(_))
        ));
        assert!(matches!(
            SignatureHeader::parse("garbage"),
            Err(WebhookError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_verify_valid() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, now, BODY);
        let event = verifier().verify_at(BODY.as_bytes(), &header, now).unwrap();
        assert_eq!(event.id(), "evt_1");
        assert_eq!(event.kind(), "payment_intent.succeeded");
    }

    #[test]
    fn test_verify_against_wall_clock() {
        let header = signature_header(SECRET, unix_now(), BODY);
        assert!(verifier().verify(BODY.as_bytes(), &header).is_ok());
    }

    #[test]
    fn test_verify_wrong_secret() {
        let now = 1_700_000_000;
        let header = signature_header("whsec_other", now, BODY);
        let err = verifier().verify_at(BODY.as_bytes(), &header, now).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature(_)));
    }

    #[test]
    fn test_verify_tampered_body() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, now, BODY);
        let tampered = BODY.replace("2999", "1");
        let err = verifier()
            .verify_at(tampered.as_bytes(), &header, now)
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature(_)));
    }

    #[test]
    fn test_verify_stale_timestamp() {
        let signed_at = 1_700_000_000;
        let header = signature_header(SECRET, signed_at, BODY);

        assert!(verifier()
            .verify_at(BODY.as_bytes(), &header, signed_at + 300)
            .is_ok());

        let err = verifier()
            .verify_at(BODY.as_bytes(), &header, signed_at + 301)
            .unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_verify_future_timestamp_accepted() {
        let now = 1_700_000_000;
        let header = signature_header(SECRET, now + 60, BODY);
        assert!(verifier().verify_at(BODY.as_bytes(), &header, now).is_ok());
    }

    #[test]
    fn test_verify_any_of_multiple_signatures() {
        let now = 1_700_000_000;
        let header = format!(
            "t={},v1={},v1={}",
            now,
            compute_signature("whsec_rolled_out", now, BODY),
            compute_signature(SECRET, now, BODY)
        );
        assert!(verifier().verify_at(BODY.as_bytes(), &header, now).is_ok());
    }

    #[test]
    fn test_verify_non_hex_signature() {
        let header = "t=1700000000,v1=not-hex-at-all";
        let err = verifier()
            .verify_at(BODY.as_bytes(), header, 1_700_000_000)
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature(_)));
    }

    #[test]
    fn test_verify_non_utf8_body() {
        let payload = [0xff, 0xfe, 0xfd];
        let err = verifier()
            .verify_at(&payload, "t=1700000000,v1=00", 1_700_000_000)
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn test_verify_signed_garbage_is_invalid_payload() {
        let now = 1_700_000_000;
        let body = "definitely not an event";
        let header = signature_header(SECRET, now, body);
        let err = verifier().verify_at(body.as_bytes(), &header, now).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidPayload(_)));
    }

    #[test]
    fn test_from_secret() {
        assert!(WebhookVerifier::from_secret(None, 300).is_none());
        assert!(WebhookVerifier::from_secret(Some(""), 300).is_none());
        assert!(WebhookVerifier::from_secret(Some("   "), 300).is_none());
        assert!(WebhookVerifier::from_secret(Some("whsec_123"), 300).is_some());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", verifier());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("redacted"));
    }

    mod properties {
        use super::*;
        use proptest::collection::vec;
        use proptest::prelude::*;

        const NOW: u64 = 1_700_000_000;

        fn envelope() -> impl Strategy<Value = String> {
            ("[A-Za-z0-9_]{1,32}", "[a-z_.]{1,48}", ".*", any::<i64>()).prop_map(
                |(id, kind, note, amount)| {
                    serde_json::json!({
                        "id": format!("evt_{}", id),
                        "type": kind,
                        "data": {"object": {"note": note, "amount": amount}},
                    })
                    .to_string()
                },
            )
        }

        proptest! {
            #[test]
            fn signed_envelope_verifies(secret in "[ -~]{1,64}", body in envelope()) {
                let header = signature_header(&secret, NOW, &body);
                let verifier = WebhookVerifier::new(secret, 300);
                prop_assert!(verifier.verify_at(body.as_bytes(), &header, NOW).is_ok());
            }

            #[test]
            fn signed_text_always_authenticates(secret in "[ -~]{1,64}", body in ".*") {
                let header = signature_header(&secret, NOW, &body);
                let result = WebhookVerifier::new(secret, 300).verify_at(body.as_bytes(), &header, NOW);
                prop_assert!(!matches!(result, Err(WebhookError::InvalidSignature(_))));
            }

            #[test]
            fn other_secret_is_rejected(
                signer in "[ -~]{1,64}",
                expected in "[ -~]{1,64}",
                body in envelope(),
            ) {
                prop_assume!(signer != expected);
                let header = signature_header(&signer, NOW, &body);
                let result = WebhookVerifier::new(expected, 300).verify_at(body.as_bytes(), &header, NOW);
                prop_assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
            }

            #[test]
            fn one_byte_change_is_rejected(
                secret in "[ -~]{1,64}",
                body in envelope(),
                index in any::<proptest::sample::Index>(),
                flip in 1u8..=255,
            ) {
                let header = signature_header(&secret, NOW, &body);
                let mut tampered = body.into_bytes();
                let i = index.index(tampered.len());
                tampered[i] ^= flip;
                let result = WebhookVerifier::new(secret, 300).verify_at(&tampered, &header, NOW);
                prop_assert!(result.is_err());
            }

            #[test]
            fn arbitrary_header_never_panics(header in ".*") {
                let _ = SignatureHeader::parse(&header);
                prop_assert!(verifier().verify_at(BODY.as_bytes(), &header, NOW).is_err());
            }

            #[test]
            fn header_shaped_input_never_panics(
                timestamp in "[0-9]{0,24}",
                signatures in vec("[0-9a-fA-F]{0,70}", 0..4),
                trailer in "[,= a-z0-9]{0,16}",
            ) {
                let mut header = format!("t={}", timestamp);
                for signature in &signatures {
                    header.push_str(",v1=");
                    header.push_str(signature);
                }
                header.push_str(&trailer);

                let _ = SignatureHeader::parse(&header);
                prop_assert!(verifier().verify_at(BODY.as_bytes(), &header, NOW).is_err());
            }
        }
    }
}
