//! HMAC-signed tokens for the local backend.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256(claims))`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TokenKind {
    Id,
    Access,
    Refresh,
    Storage,
}

/// Claims carried by every local token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub kind: TokenKind,
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(kind: TokenKind, sub: &str, username: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            kind,
            sub: sub.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

/// Why a token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenRejection {
    Malformed,
    BadSignature,
    WrongKind,
    Expired,
}

/// Signs and verifies tokens with the store's key.
#[derive(Clone)]
pub(crate) struct Signer {
    key: Vec<u8>,
}

impl Signer {
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
    }

    /// Raw HMAC-SHA256 of `message`.
    pub fn sign_bytes(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time check of `signature` against `message`.
    pub fn verify_bytes(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac();
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }

    pub fn issue(&self, claims: &Claims) -> String {
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(claims).expect("claims serialize to JSON"),
        );
        let signature = URL_SAFE_NO_PAD.encode(self.sign_bytes(payload.as_bytes()));
        format!("{}.{}", payload, signature)
    }

    /// Verify signature, kind and expiry.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenRejection> {
        let (payload, signature) = token.split_once('.').ok_or(TokenRejection::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenRejection::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenRejection::BadSignature)?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(TokenRejection::Malformed)?;

        if claims.kind != kind {
            return Err(TokenRejection::WrongKind);
        }
        if !claims.is_live_at(Utc::now()) {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("key", &"[REDACTED]").finish()
    }
}
