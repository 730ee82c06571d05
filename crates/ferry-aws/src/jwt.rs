//! Unverified reads of Cognito token claims.
//!
//! Signatures are not checked. The identity pool verifies the id token on
//! exchange.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TokenClaims {
    pub sub: Option<String>,
    #[serde(rename = "cognito:username")]
    pub username: Option<String>,
    pub email: Option<String>,
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the payload segment of `token`.
pub(crate) fn claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
pub(crate) fn fake_token(payload: &serde_json::Value) -> String {
    format!(
        "eyJhbGciOiJSUzI1NiJ9.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_id_token_claims() {
        let token = fake_token(&json!({
            "sub": "0f1e2d3c",
            "cognito:username": "0f1e2d3c",
            "email": "alice@example.com",
            "exp": 1_700_000_000,
            "token_use": "id"
        }));
        let claims = claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("0f1e2d3c"));
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn garbage_has_no_claims() {
        assert!(claims("opaque").is_none());
        assert!(claims("a.!!!.c").is_none());
    }
}
