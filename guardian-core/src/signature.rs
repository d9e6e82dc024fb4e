//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs webhook payloads with a shared secret and puts the result in
//! the `X-Hub-Signature-256` header as `sha256=<hex>`. Verification must run
//! against the raw request body, before the body is parsed as JSON.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Why a webhook delivery failed signature verification.
///
/// `Missing` and `Invalid` are authentication failures (the sender could not
/// prove knowledge of the secret); `Malformed` and `UnsupportedAlgorithm` are
/// client errors in the header itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Hub-Signature-256 header")]
    Missing,
    #[error("invalid signature format")]
    Malformed,
    #[error("unsupported hash algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    #[error("signature does not match payload")]
    Invalid,
}

/// Verifies a webhook signature header against the raw payload and secret.
///
/// The header must have the form `sha256=<hex-digest>`. Comparison is
/// constant-time via the HMAC library's `verify_slice`.
///
/// A missing header is rejected (`SignatureError::Missing`); callers that
/// deliberately accept unsigned deliveries must opt in at their own layer.
pub fn verify_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &[u8],
) -> Result<(), SignatureError> {
    let header = signature_header.ok_or(SignatureError::Missing)?;

    let (algorithm, hex_digest) = header.split_once('=').ok_or(SignatureError::Malformed)?;

    if algorithm != "sha256" {
        return Err(SignatureError::UnsupportedAlgorithm(algorithm.to_string()));
    }

    let claimed = hex::decode(hex_digest).map_err(|_| SignatureError::Malformed)?;

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::Malformed)?;
    mac.update(payload);

    mac.verify_slice(&claimed)
        .map_err(|_| SignatureError::Invalid)
}

/// Computes the HMAC-SHA256 digest of a payload under the given secret.
///
/// Used by tests to produce expected signatures.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a digest as a GitHub-style header value, `sha256=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sign(payload: &[u8], secret: &[u8]) -> String {
        format_signature_header(&compute_signature(payload, secret))
    }

    #[test]
    fn valid_signature_accepted() {
        let payload = b"{\"action\":\"opened\"}";
        let secret = b"webhook-secret";
        let header = sign(payload, secret);
        assert_eq!(verify_signature(payload, Some(&header), secret), Ok(()));
    }

    /// The worked example from GitHub's webhook documentation.
    #[test]
    fn github_documentation_example() {
        let payload = b"Hello, World!";
        let secret = b"It's a Secret to Everybody";
        let expected = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert_eq!(verify_signature(payload, Some(expected), secret), Ok(()));
    }

    #[test]
    fn missing_header_rejected() {
        assert_eq!(
            verify_signature(b"payload", None, b"secret"),
            Err(SignatureError::Missing)
        );
    }

    #[test]
    fn header_without_separator_is_malformed() {
        assert_eq!(
            verify_signature(b"payload", Some("deadbeef"), b"secret"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn wrong_algorithm_rejected() {
        assert_eq!(
            verify_signature(b"payload", Some("sha1=deadbeef"), b"secret"),
            Err(SignatureError::UnsupportedAlgorithm("sha1".to_string()))
        );
    }

    #[test]
    fn invalid_hex_is_malformed() {
        assert_eq!(
            verify_signature(b"payload", Some("sha256=zzzz"), b"secret"),
            Err(SignatureError::Malformed)
        );
        // Odd-length hex cannot decode either
        assert_eq!(
            verify_signature(b"payload", Some("sha256=abc"), b"secret"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn wrong_secret_rejected() {
        let payload = b"payload";
        let header = sign(payload, b"right-secret");
        assert_eq!(
            verify_signature(payload, Some(&header), b"wrong-secret"),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn modified_payload_rejected() {
        let secret = b"secret";
        let header = sign(b"original", secret);
        assert_eq!(
            verify_signature(b"tampered", Some(&header), secret),
            Err(SignatureError::Invalid)
        );
    }

    #[test]
    fn empty_payload_and_empty_secret_round_trip() {
        let header = sign(b"", b"");
        assert_eq!(verify_signature(b"", Some(&header), b""), Ok(()));
    }

    #[test]
    fn truncated_digest_rejected() {
        let payload = b"payload";
        let secret = b"secret";
        let digest = compute_signature(payload, secret);
        let header = format_signature_header(&digest[..16]);
        assert_eq!(
            verify_signature(payload, Some(&header), secret),
            Err(SignatureError::Invalid)
        );
    }

    proptest! {
        /// Signing and verifying with the same secret always succeeds.
        #[test]
        fn prop_sign_verify_round_trip(payload: Vec<u8>, secret: Vec<u8>) {
            let header = sign(&payload, &secret);
            prop_assert_eq!(verify_signature(&payload, Some(&header), &secret), Ok(()));
        }

        /// Verifying against a different secret always fails.
        #[test]
        fn prop_wrong_secret_fails(payload: Vec<u8>, secret1: Vec<u8>, secret2: Vec<u8>) {
            prop_assume!(secret1 != secret2);
            let header = sign(&payload, &secret1);
            prop_assert_eq!(
                verify_signature(&payload, Some(&header), &secret2),
                Err(SignatureError::Invalid)
            );
        }

        /// Any change to the payload invalidates the signature.
        #[test]
        fn prop_modified_payload_fails(original: Vec<u8>, modified: Vec<u8>, secret: Vec<u8>) {
            prop_assume!(original != modified);
            let header = sign(&original, &secret);
            prop_assert_eq!(
                verify_signature(&modified, Some(&header), &secret),
                Err(SignatureError::Invalid)
            );
        }

        /// Flipping any single bit of the digest invalidates it.
        #[test]
        fn prop_bit_flipped_digest_fails(payload: Vec<u8>, secret: Vec<u8>, bit in 0usize..256) {
            let mut digest = compute_signature(&payload, &secret);
            digest[bit / 8] ^= 1 << (bit % 8);
            let header = format_signature_header(&digest);
            prop_assert_eq!(
                verify_signature(&payload, Some(&header), &secret),
                Err(SignatureError::Invalid)
            );
        }

        /// Arbitrary header strings never panic, whatever the outcome.
        #[test]
        fn prop_arbitrary_header_no_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = verify_signature(&payload, Some(&header), &secret);
        }
    }
}
