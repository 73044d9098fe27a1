//! Webhook signature verification.
//!
//! The provider signs every webhook delivery with HMAC-SHA512 over the raw
//! request body using the account's secret key; the signature arrives in a
//! request header. Verification must run against the raw bytes, before any
//! JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// Signs a webhook payload using HMAC-SHA512, hex-encoded.
pub fn sign_webhook(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a webhook signature using constant-time comparison.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign_webhook(payload, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_signing_round_trip() {
        let payload = br#"{"event":"charge.success","data":{"reference":"REF-1-abcd1234"}}"#;
        let secret = "sk_test_secret";

        let signature = sign_webhook(payload, secret);
        assert_eq!(signature.len(), 128);
        assert!(verify_webhook_signature(payload, &signature, secret));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"event":"charge.success"}"#;
        let signature = sign_webhook(payload, "sk_live_real");

        assert!(!verify_webhook_signature(payload, &signature, "sk_live_other"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = "sk_test_secret";
        let signature = sign_webhook(br#"{"amount":100}"#, secret);

        assert!(!verify_webhook_signature(
            br#"{"amount":999}"#,
            &signature,
            secret
        ));
    }
}
