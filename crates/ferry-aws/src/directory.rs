//! Cognito user-pool directory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::{
    AuthFlowType, AuthenticationResultType, ChallengeNameType,
};
use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

use ferry_core::error::AuthenticationError;
use ferry_core::{
    AccessToken, Config, Credentials, Directory, IdToken, Identity, LoginSession, RefreshToken,
    Result, SessionStore, SignUpOutput,
};

use crate::error::{authentication_error, directory_error};
use crate::jwt;
use crate::sdk::sdk_config;
use crate::srp::SrpClient;

fn malformed(message: impl Into<String>) -> ferry_core::Error {
    AuthenticationError::MalformedResponse {
        message: message.into(),
    }
    .into()
}

fn unsupported(challenge: &ChallengeNameType) -> ferry_core::Error {
    AuthenticationError::UnsupportedChallenge {
        challenge: challenge.as_str().to_string(),
    }
    .into()
}

fn parameter<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| malformed(format!("challenge is missing {}", name)))
}

/// Identity directory backed by a Cognito user pool.
///
/// Sign-in uses the SRP flow, so the password never leaves the process.
/// The current session lives in the supplied [`SessionStore`] and is
/// renewed with `REFRESH_TOKEN_AUTH` once it expires.
#[derive(Clone)]
pub struct CognitoDirectory {
    client: Client,
    client_id: String,
    pool_name: String,
    sessions: Arc<dyn SessionStore>,
}

impl CognitoDirectory {
    pub fn new(config: &Config, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            client: Client::new(&sdk_config(config)),
            client_id: config.client_id.clone(),
            pool_name: config.user_pool_name().to_string(),
            sessions,
        }
    }

    /// Build a session from an authentication result. A result without a
    /// refresh token keeps `previous_refresh`.
    fn session_from(
        result: &AuthenticationResultType,
        username_hint: &str,
        previous_refresh: Option<RefreshToken>,
    ) -> Result<LoginSession> {
        let id_token = result
            .id_token()
            .ok_or_else(|| malformed("authentication result has no id token"))?;
        let access_token = result
            .access_token()
            .ok_or_else(|| malformed("authentication result has no access token"))?;

        let id_claims = jwt::claims(id_token).unwrap_or_default();
        let access_claims = jwt::claims(access_token).unwrap_or_default();

        let expires_at = match (id_claims.expires_at(), access_claims.expires_at()) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => Utc::now() + Duration::seconds(i64::from(result.expires_in())),
        };

        let username = id_claims
            .username
            .unwrap_or_else(|| username_hint.to_string());
        let sub = id_claims.sub.unwrap_or_else(|| username.clone());
        let mut identity = Identity::new(username, sub);
        if let Some(email) = id_claims.email {
            identity = identity.with_email(email);
        }

        let refresh_token = result
            .refresh_token()
            .map(RefreshToken::new)
            .or(previous_refresh);

        Ok(LoginSession::new(
            identity,
            IdToken::new(id_token),
            AccessToken::new(access_token),
            refresh_token,
            expires_at,
        ))
    }

    /// Run the `USER_SRP_AUTH` exchange.
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginSession> {
        let srp = SrpClient::new(&self.pool_name);

        let initiated = self
            .client
            .initiate_auth()
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::UserSrpAuth)
            .auth_parameters("USERNAME", credentials.identifier())
            .auth_parameters("SRP_A", srp.public_hex())
            .send()
            .await
            .map_err(authentication_error)?;

        if let Some(result) = initiated.authentication_result() {
            return Self::session_from(result, credentials.identifier(), None);
        }

        match initiated.challenge_name() {
            Some(ChallengeNameType::PasswordVerifier) => {}
            Some(other) => return Err(unsupported(other)),
            None => return Err(malformed("no challenge and no authentication result")),
        }

        let empty = HashMap::new();
        let params = initiated.challenge_parameters().unwrap_or(&empty);
        let user_id = parameter(params, "USER_ID_FOR_SRP")?;
        let claim = srp
            .password_claim(
                user_id,
                credentials.secret(),
                parameter(params, "SRP_B")?,
                parameter(params, "SALT")?,
                parameter(params, "SECRET_BLOCK")?,
                Utc::now(),
            )
            .map_err(|e| malformed(e.to_string()))?;

        debug!(user_id, "Answering password verifier");

        let responded = self
            .client
            .respond_to_auth_challenge()
            .client_id(&self.client_id)
            .challenge_name(ChallengeNameType::PasswordVerifier)
            .set_session(initiated.session().map(str::to_string))
            .challenge_responses("USERNAME", user_id)
            .challenge_responses("PASSWORD_CLAIM_SECRET_BLOCK", claim.secret_block)
            .challenge_responses("TIMESTAMP", claim.timestamp)
            .challenge_responses("PASSWORD_CLAIM_SIGNATURE", claim.signature)
            .send()
            .await
            .map_err(authentication_error)?;

        if let Some(next) = responded.challenge_name() {
            return Err(unsupported(next));
        }

        let result = responded
            .authentication_result()
            .ok_or_else(|| malformed("verifier accepted without authentication result"))?;
        Self::session_from(result, credentials.identifier(), None)
    }

    /// Renew `session` with its refresh token.
    async fn refresh(&self, session: &LoginSession) -> Result<Option<LoginSession>> {
        let Some(refresh_token) = session.refresh_token() else {
            return Ok(None);
        };

        let output = self
            .client
            .initiate_auth()
            .client_id(&self.client_id)
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .auth_parameters("REFRESH_TOKEN", refresh_token.as_str())
            .send()
            .await
            .map_err(authentication_error)?;

        let Some(result) = output.authentication_result() else {
            return Ok(None);
        };

        Self::session_from(
            result,
            &session.identity().username,
            Some(refresh_token.clone()),
        )
        .map(Some)
    }
}

#[async_trait]
impl Directory for CognitoDirectory {
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    async fn sign_up(&self, credentials: Credentials) -> Result<SignUpOutput> {
        let output = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(credentials.identifier())
            .password(credentials.secret())
            .send()
            .await
            .map_err(directory_error)?;

        info!(confirmed = output.user_confirmed(), "Registered identity");
        Ok(SignUpOutput {
            user_id: output.user_sub().to_string(),
            confirmed: output.user_confirmed(),
        })
    }

    #[instrument(skip(self, code))]
    async fn confirm_sign_up(&self, identifier: &str, code: &str) -> Result<()> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(identifier)
            .confirmation_code(code)
            .send()
            .await
            .map_err(directory_error)?;

        debug!("Confirmed registration");
        Ok(())
    }

    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    async fn sign_in(&self, credentials: Credentials) -> Result<LoginSession> {
        let session = self.authenticate(&credentials).await?;
        self.sessions.save(&session).await?;

        debug!(expires_at = %session.expires_at(), "Signed in");
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn current_session(&self) -> Option<LoginSession> {
        let stored = match self.sessions.load().await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to load session");
                return None;
            }
        };

        if stored.is_valid() {
            return Some(stored);
        }

        debug!("Session expired, refreshing");
        let renewed = match self.refresh(&stored).await {
            Ok(Some(renewed)) if renewed.is_valid() => renewed,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                return None;
            }
        };

        if let Err(e) = self.sessions.save(&renewed).await {
            warn!(error = %e, "Failed to store refreshed session");
        }
        Some(renewed)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) {
        if let Err(e) = self.sessions.clear().await {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

impl std::fmt::Debug for CognitoDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitoDirectory")
            .field("client_id", &self.client_id)
            .field("pool_name", &self.pool_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::fake_token;
    use crate::sdk::test_config;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use ferry_core::{Error, MemorySessionStore};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TARGET: &str = "x-amz-target";

    fn amz_json(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/x-amz-json-1.1")
    }

    fn amz_error(code: &str, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_raw(
            json!({ "__type": code, "message": message }).to_string(),
            "application/x-amz-json-1.1",
        )
    }

    fn tokens(exp: i64) -> serde_json::Value {
        json!({
            "AuthenticationResult": {
                "IdToken": fake_token(&json!({
                    "sub": "sub-123",
                    "cognito:username": "sub-123",
                    "email": "alice@example.com",
                    "exp": exp
                })),
                "AccessToken": fake_token(&json!({ "sub": "sub-123", "exp": exp + 60 })),
                "RefreshToken": "refresh-1",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })
    }

    fn directory(server: &MockServer) -> (CognitoDirectory, Arc<MemorySessionStore>) {
        let sessions = Arc::new(MemorySessionStore::new());
        let config = test_config(Some(&server.uri()));
        (CognitoDirectory::new(&config, sessions.clone()), sessions)
    }

    async fn mount_verifier_challenge(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.InitiateAuth"))
            .and(body_partial_json(json!({ "AuthFlow": "USER_SRP_AUTH" })))
            .respond_with(amz_json(json!({
                "ChallengeName": "PASSWORD_VERIFIER",
                "Session": "challenge-session",
                "ChallengeParameters": {
                    "USER_ID_FOR_SRP": "sub-123",
                    "SRP_B": "abcdef0123456789abcdef0123456789",
                    "SALT": "0a1b2c3d4e5f",
                    "SECRET_BLOCK": STANDARD.encode(b"opaque secret block"),
                    "USERNAME": "sub-123"
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn srp_sign_in_stores_session() {
        let server = MockServer::start().await;
        mount_verifier_challenge(&server).await;

        let exp = Utc::now().timestamp() + 3600;
        Mock::given(method("POST"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.RespondToAuthChallenge"))
            .and(body_partial_json(json!({
                "ChallengeName": "PASSWORD_VERIFIER",
                "Session": "challenge-session",
                "ChallengeResponses": { "USERNAME": "sub-123" }
            })))
            .respond_with(amz_json(tokens(exp)))
            .expect(1)
            .mount(&server)
            .await;

        let (directory, sessions) = directory(&server);
        let session = directory
            .sign_in(Credentials::new("alice@example.com", "hunter22"))
            .await
            .unwrap();

        assert_eq!(session.identity().id, "sub-123");
        assert_eq!(session.identity().email.as_deref(), Some("alice@example.com"));
        // Earlier of the id and access token expiries.
        assert_eq!(session.expires_at().timestamp(), exp);
        assert!(sessions.load().await.unwrap().is_some());
        assert!(directory.current_session().await.is_some());
    }

    #[tokio::test]
    async fn wrong_password_is_authentication_error() {
        let server = MockServer::start().await;
        mount_verifier_challenge(&server).await;
        Mock::given(method("POST"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.RespondToAuthChallenge"))
            .respond_with(amz_error("NotAuthorizedException", "Incorrect username or password."))
            .mount(&server)
            .await;

        let (directory, sessions) = directory(&server);
        let err = directory
            .sign_in(Credentials::new("alice@example.com", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(AuthenticationError::Rejected(_))));
        assert_eq!(err.code(), Some("NotAuthorizedException"));
        assert!(sessions.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn follow_up_challenge_is_unsupported() {
        let server = MockServer::start().await;
        mount_verifier_challenge(&server).await;
        Mock::given(method("POST"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.RespondToAuthChallenge"))
            .respond_with(amz_json(json!({
                "ChallengeName": "NEW_PASSWORD_REQUIRED",
                "Session": "next",
                "ChallengeParameters": {}
            })))
            .mount(&server)
            .await;

        let (directory, _) = directory(&server);
        let err = directory
            .sign_in(Credentials::new("alice@example.com", "hunter22"))
            .await
            .unwrap_err();

        match err {
            Error::Authentication(AuthenticationError::UnsupportedChallenge { challenge }) => {
                assert_eq!(challenge, "NEW_PASSWORD_REQUIRED")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn expired_session_is_refreshed() {
        let server = MockServer::start().await;
        let exp = Utc::now().timestamp() + 3600;
        let mut refreshed = tokens(exp);
        refreshed["AuthenticationResult"]
            .as_object_mut()
            .unwrap()
            .remove("RefreshToken");

        Mock::given(method("POST"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.InitiateAuth"))
            .and(body_partial_json(json!({
                "AuthFlow": "REFRESH_TOKEN_AUTH",
                "AuthParameters": { "REFRESH_TOKEN": "refresh-0" }
            })))
            .respond_with(amz_json(refreshed))
            .expect(1)
            .mount(&server)
            .await;

        let (directory, sessions) = directory(&server);
        let expired = LoginSession::new(
            Identity::new("sub-123", "sub-123"),
            IdToken::new("old-id"),
            AccessToken::new("old-access"),
            Some(RefreshToken::new("refresh-0")),
            Utc::now() - Duration::seconds(1),
        );
        sessions.save(&expired).await.unwrap();

        let renewed = directory.current_session().await.unwrap();
        assert!(renewed.is_valid());
        assert_eq!(renewed.refresh_token().unwrap().as_str(), "refresh-0");
        assert_eq!(sessions.load().await.unwrap(), Some(renewed));
    }

    #[tokio::test]
    async fn failed_refresh_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header(TARGET, "AWSCognitoIdentityProviderService.InitiateAuth"))
            .respond_with(amz_error("NotAuthorizedException", "Refresh Token has expired"))
            .mount(&server)
            .await;

        let (directory, sessions) = directory(&server);
        let expired = LoginSession::new(
            Identity::new("sub-123", "sub-123"),
            IdToken::new("old-id"),
            AccessToken::new("old-access"),
            Some(RefreshToken::new("refresh-0")),
            Utc::now() - Duration::seconds(1),
        );
        sessions.save(&expired).await.unwrap();

        assert!(directory.current_session().await.is_none());
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let server = MockServer::start().await;
        let (directory, sessions) = directory(&server);
        sessions
            .save(&LoginSession::new(
                Identity::new("u", "s"),
                IdToken::new("i"),
                AccessToken::new("a"),
                None,
                Utc::now() + Duration::hours(1),
            ))
            .await
            .unwrap();

        directory.sign_out().await;
        directory.sign_out().await;
        assert!(sessions.load().await.unwrap().is_none());
    }
}
