//! Signed cookie and bearer-token actor extraction, plus the crate's one
//! concrete [`Signer`] implementation.
//!
//! All failure modes here are silent: every function returns `None` rather
//! than propagating a [`SignatureError`] — token and cookie failures are
//! never surfaced past this boundary, they just yield no actor.

use authz_sdk::{Actor, SignatureError, Signer};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const BASE62_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// HMAC-SHA256 implementation of [`Signer`]. The namespace is folded into
/// the MAC input, so a signature produced for one namespace fails
/// verification under any other (invariant 9).
pub struct HmacSigner {
    key: Vec<u8>,
}

impl HmacSigner {
    /// Validates the key against the MAC's key-length requirement once, up
    /// front, so `sign`/`unsign` never need to handle a construction failure
    /// for a key they didn't just accept.
    ///
    /// # Errors
    /// Returns [`SignatureError::Malformed`] if `key` is not a valid HMAC-SHA256 key.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, SignatureError> {
        let key = key.into();
        HmacSha256::new_from_slice(&key)
            .map_err(|_| SignatureError::Malformed("invalid HMAC key length".to_string()))?;
        Ok(Self { key })
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HmacSigner::new already validated this key"))
    }
}

impl Signer for HmacSigner {
    fn sign(&self, payload: &[u8], namespace: &str) -> String {
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = self.mac();
        mac.update(namespace.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{payload_b64}.{sig_b64}")
    }

    fn unsign(&self, signed: &str, namespace: &str) -> Result<Vec<u8>, SignatureError> {
        let (payload_b64, sig_b64) = signed
            .split_once('.')
            .ok_or_else(|| SignatureError::Malformed("missing signature separator".to_string()))?;
        let provided = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| SignatureError::Malformed("invalid base64 signature".to_string()))?;

        let mut mac = self.mac();
        mac.update(namespace.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| SignatureError::BadSignature)?;

        URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SignatureError::Malformed("invalid base64 payload".to_string()))
    }
}

/// Decodes a base-62 digit string into a non-negative integer, mirroring
/// `baseconv.base62.decode`.
pub fn base62_decode(input: &str) -> Option<i64> {
    if input.is_empty() {
        return None;
    }
    let mut value: i64 = 0;
    for ch in input.bytes() {
        let digit = BASE62_ALPHABET.iter().position(|&b| b == ch)? as i64;
        value = value.checked_mul(62)?.checked_add(digit)?;
    }
    Some(value)
}

/// Settings the bearer-token extractor needs from the active config
/// snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TokenSettings {
    pub allow_signed_tokens: bool,
    pub max_signed_tokens_ttl: Option<i64>,
}

/// Decodes the `ds_actor` cookie: `{a: <actor>, e?: <base62 expiry>}`.
pub fn actor_from_cookie(cookie_value: &str, signer: &dyn Signer, now: i64) -> Option<Actor> {
    let payload_bytes = signer.unsign(cookie_value, "actor").ok()?;
    let payload: Value = serde_json::from_slice(&payload_bytes).ok()?;

    if let Some(encoded_expiry) = payload.get("e").and_then(Value::as_str) {
        let expiry = base62_decode(encoded_expiry)?;
        if now > expiry {
            return None;
        }
    }

    Some(Actor::new(payload.get("a")?.clone()))
}

/// Decodes `Bearer dstok_<signed>`: `{a, t, d?, _r?}`.
pub fn actor_from_bearer(
    authorization: &str,
    signer: &dyn Signer,
    settings: TokenSettings,
    now: i64,
) -> Option<Actor> {
    if !settings.allow_signed_tokens {
        return None;
    }

    const PREFIX: &str = "dstok_";
    let token = authorization.strip_prefix("Bearer ")?;
    let token = token.strip_prefix(PREFIX)?;

    let payload_bytes = signer.unsign(token, "token").ok()?;
    let payload: Value = serde_json::from_slice(&payload_bytes).ok()?;

    let created = payload.get("t")?.as_i64()?;
    let mut duration = match payload.get("d") {
        None => None,
        Some(Value::Null) => None,
        Some(value) => Some(value.as_i64()?),
    };

    if let Some(max_ttl) = settings.max_signed_tokens_ttl {
        duration = match duration {
            None => Some(max_ttl),
            Some(d) if d > max_ttl => Some(max_ttl),
            Some(d) => Some(d),
        };
    }

    if let Some(duration) = duration {
        if now - created > duration {
            return None;
        }
    }

    let mut actor = serde_json::Map::new();
    actor.insert("id".to_string(), payload.get("a")?.clone());
    actor.insert("token".to_string(), Value::String("dstok".to_string()));
    if let Some(restrictions) = payload.get("_r") {
        actor.insert("_r".to_string(), restrictions.clone());
    }
    if let Some(duration) = duration {
        actor.insert(
            "token_expires".to_string(),
            Value::Number((created + duration).into()),
        );
    }

    Some(Actor::new(Value::Object(actor)))
}
