//! # Webhook Signature Validation
//!
//! GitHub signs webhook bodies with HMAC-SHA256 when the webhook has a secret
//! and sends the digest as `X-Hub-Signature-256: sha256=<hex>`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::instrument;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a signature was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature header is missing")]
    Missing,

    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Secret cannot be used as an HMAC key")]
    InvalidSecret,

    #[error("Signature does not match payload")]
    Mismatch,
}

/// Verifies that a webhook body was signed by the code host.
#[async_trait]
pub trait SignatureValidator: Send + Sync {
    /// Check `signature` (as sent in the header, if any) against `payload`.
    async fn validate_signature(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError>;
}

/// Validator backed by a shared secret from configuration.
pub struct HmacSignatureValidator {
    secret: String,
}

impl HmacSignatureValidator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compute the `sha256=<hex>` header value for `payload`.
    pub fn sign(&self, payload: &[u8]) -> Result<String, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(payload);
        Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
    }
}

impl std::fmt::Debug for HmacSignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSignatureValidator")
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl SignatureValidator for HmacSignatureValidator {
    #[instrument(skip(self, payload, signature), fields(sig_len = signature.map(str::len)))]
    async fn validate_signature(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError> {
        let signature = signature.ok_or(SignatureError::Missing)?;
        let hex_part = signature.strip_prefix("sha256=").unwrap_or(signature);
        let provided = hex::decode(hex_part).map_err(|_| SignatureError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if bool::from(expected.as_slice().ct_eq(&provided)) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
