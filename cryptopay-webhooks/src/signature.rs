//! Webhook signature verification
//!
//! The API signs every webhook body with HMAC-SHA256. The HMAC key is the
//! SHA-256 digest of the app's API token, and the signature arrives as
//! lowercase hex in the `Crypto-Pay-API-Signature` header.

use std::fmt;

use cryptopay_api::Credential;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{Result, WebhookError};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature (matched case-insensitively)
pub const SIGNATURE_HEADER: &str = "Crypto-Pay-API-Signature";

/// Why an update was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The request had an empty body
    NoBody,
    /// The signature header was absent or empty
    MissingSignature,
    /// The signature did not match the body
    InvalidHash,
}

impl RejectReason {
    /// Short description
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBody => "no body",
            Self::MissingSignature => "missing signature header",
            Self::InvalidHash => "invalid hash",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of verifying one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Rejected(RejectReason),
}

impl Verification {
    /// Whether the update is authentic
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Reason for rejection, if rejected
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Verified => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// Signal the outcome according to `policy`
    ///
    /// `Verified` is always `Ok(true)`. A rejection is an error under
    /// [`FailurePolicy::Error`] and `Ok(false)` under
    /// [`FailurePolicy::ReturnFalse`].
    pub fn into_result(self, policy: FailurePolicy) -> Result<bool> {
        match (self, policy) {
            (Self::Verified, _) => Ok(true),
            (Self::Rejected(reason), FailurePolicy::Error) => Err(WebhookError::Verification(reason)),
            (Self::Rejected(_), FailurePolicy::ReturnFalse) => Ok(false),
        }
    }
}

/// How a failed verification is signalled to the caller
///
/// Both policies run the same verification; only the signalling differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return an error
    #[default]
    Error,
    /// Return `false`
    ReturnFalse,
}

/// Signature computation keyed by an API token
#[derive(Clone)]
pub struct WebhookSignature {
    key: [u8; 32],
}

impl WebhookSignature {
    /// Derive the signing key from the API token
    pub fn new(token: &Credential) -> Self {
        Self::from_token(token.expose())
    }

    /// Derive the signing key from a raw token string
    pub fn from_token(token: &str) -> Self {
        Self {
            key: Sha256::digest(token.as_bytes()).into(),
        }
    }

    /// Lowercase hex HMAC-SHA256 of `body`
    pub fn compute(&self, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take any size key");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a body against the value of the signature header
    pub fn verify(&self, body: Option<&[u8]>, signature: Option<&str>) -> Verification {
        let Some(body) = body.filter(|body| !body.is_empty()) else {
            return Verification::Rejected(RejectReason::NoBody);
        };
        let Some(signature) = signature.filter(|signature| !signature.is_empty()) else {
            return Verification::Rejected(RejectReason::MissingSignature);
        };

        let expected = self.compute(body);
        if constant_time_compare(signature, &expected) {
            Verification::Verified
        } else {
            Verification::Rejected(RejectReason::InvalidHash)
        }
    }
}

impl fmt::Debug for WebhookSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSignature")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Verify a webhook body with a one-off key derived from `token`
pub fn verify_webhook(
    body: Option<&[u8]>,
    signature: Option<&str>,
    token: &Credential,
) -> Verification {
    WebhookSignature::new(token).verify(body, signature)
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "1234:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw";
    const BODY: &[u8] = br#"{"update_id":7,"update_type":"invoice_paid","request_date":"2024-01-01T00:00:00Z","payload":{"invoice_id":42,"status":"paid"}}"#;
    const SIGNATURE: &str = "d4fd8348cb9bbec2b3f046346b8c057ee749844d62f8a34bf38f8171457db3bf";

    #[test]
    fn test_known_vectors() {
        let signer = WebhookSignature::from_token(TOKEN);
        assert_eq!(signer.compute(BODY), SIGNATURE);

        let signer = WebhookSignature::from_token("test-token");
        assert_eq!(
            signer.compute(b"hello"),
            "f7b9ad0105d54f3ce4381087ac1f17f2de156e35aba5d3229b9c947122711cfb"
        );
    }

    #[test]
    fn test_verify_valid_signature() {
        let verification = verify_webhook(Some(BODY), Some(SIGNATURE), &Credential::new(TOKEN));
        assert!(verification.is_verified());
        assert_eq!(verification.into_result(FailurePolicy::Error).unwrap(), true);
    }

    #[test]
    fn test_any_body_byte_flip_rejects() {
        let signer = WebhookSignature::from_token(TOKEN);
        for index in 0..BODY.len() {
            let mut body = BODY.to_vec();
            body[index] ^= 0x01;
            assert_eq!(
                signer.verify(Some(&body), Some(SIGNATURE)),
                Verification::Rejected(RejectReason::InvalidHash),
                "flipping body byte {} was not detected",
                index
            );
        }
    }

    #[test]
    fn test_any_signature_char_change_rejects() {
        let signer = WebhookSignature::from_token(TOKEN);
        for index in 0..SIGNATURE.len() {
            let mut signature = SIGNATURE.as_bytes().to_vec();
            signature[index] = if signature[index] == b'0' { b'1' } else { b'0' };
            let signature = String::from_utf8(signature).unwrap();
            assert!(!signer.verify(Some(BODY), Some(&signature)).is_verified());
        }
    }

    #[test]
    fn test_uppercase_signature_is_rejected() {
        let signer = WebhookSignature::from_token(TOKEN);
        let upper = SIGNATURE.to_uppercase();
        assert!(!signer.verify(Some(BODY), Some(&upper)).is_verified());
    }

    #[test]
    fn test_wrong_token_rejects() {
        let verification = verify_webhook(Some(BODY), Some(SIGNATURE), &Credential::new("other"));
        assert_eq!(verification.reject_reason(), Some(RejectReason::InvalidHash));
    }

    #[test]
    fn test_missing_body_and_header() {
        let signer = WebhookSignature::from_token(TOKEN);
        assert_eq!(
            signer.verify(None, Some(SIGNATURE)).reject_reason(),
            Some(RejectReason::NoBody)
        );
        assert_eq!(
            signer.verify(Some(b""), Some(SIGNATURE)).reject_reason(),
            Some(RejectReason::NoBody)
        );
        assert_eq!(
            signer.verify(Some(BODY), None).reject_reason(),
            Some(RejectReason::MissingSignature)
        );
        assert_eq!(
            signer.verify(Some(BODY), Some("")).reject_reason(),
            Some(RejectReason::MissingSignature)
        );
    }

    #[test]
    fn test_failure_policy_signalling() {
        let rejected = Verification::Rejected(RejectReason::InvalidHash);
        assert!(matches!(
            rejected.into_result(FailurePolicy::Error),
            Err(WebhookError::Verification(RejectReason::InvalidHash))
        ));
        assert_eq!(rejected.into_result(FailurePolicy::ReturnFalse).unwrap(), false);
    }

    #[test]
    fn test_reject_reason_messages() {
        assert_eq!(RejectReason::NoBody.to_string(), "no body");
        assert_eq!(
            WebhookError::Verification(RejectReason::InvalidHash).to_string(),
            "Webhook data not verified: invalid hash"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", WebhookSignature::from_token(TOKEN));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
        assert!(!constant_time_compare("", "a"));
    }
}
