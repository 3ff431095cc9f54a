//! Abstraction over the `sign`/`unsign` primitives assumed given by the
//! hosting application. See `engine::token::HmacSigner` for the one
//! concrete implementation this crate ships.

use thiserror::Error;

/// Failure modes for verifying a signed token or cookie. All of these are
/// treated as "no actor" by the token extractor — they never propagate to
/// the dispatcher as a surfaced error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    BadSignature,
    #[error("token or cookie has expired")]
    Expired,
    #[error("payload malformed: {0}")]
    Malformed(String),
}

/// Verifies and produces signed, namespace-scoped payloads.
///
/// A signature produced under one namespace MUST fail verification under
/// any other namespace (invariant 9: round-trip only within a namespace).
pub trait Signer: Send + Sync {
    fn sign(&self, payload: &[u8], namespace: &str) -> String;

    /// # Errors
    /// Returns [`SignatureError::BadSignature`] if the signature doesn't
    /// verify against `namespace`.
    fn unsign(&self, signed: &str, namespace: &str) -> Result<Vec<u8>, SignatureError>;
}
