//! GoTrue-style identity provider over `/auth/v1`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use capstone_core::{Email, Identity, UserId};

use super::{BackendClient, BackendError};
use crate::identity::{IdentityProvider, Session, SignUpOutcome};

/// Identity provider backed by the backend's auth service.
#[derive(Debug, Clone)]
pub struct GoTrueProvider {
    client: BackendClient,
}

impl GoTrueProvider {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, BackendError> {
        let url = self
            .client
            .endpoint("auth/v1/token", &[("grant_type", grant_type)])?;
        let response: TokenResponse = self
            .client
            .send_json(self.client.request(Method::POST, url).json(&body))
            .await?;
        Ok(response.into_session(Utc::now()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl UserResponse {
    fn into_identity(self) -> Identity {
        // A malformed address from the provider is dropped, not fatal
        let email = self.email.as_deref().and_then(|e| Email::parse(e).ok());
        let full_name = self
            .user_metadata
            .and_then(|m| m.full_name.or(m.name))
            .filter(|n| !n.trim().is_empty());
        Identity::new(UserId::new(self.id), email, full_name)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: UserResponse,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session::new(
            self.user.into_identity(),
            self.access_token,
            self.refresh_token,
            expires_at,
        )
    }
}

/// Sign-up answers with a session when email confirmation is off, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    User(UserResponse),
}

#[async_trait]
impl IdentityProvider for GoTrueProvider {
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Session, BackendError> {
        self.token_grant(
            "password",
            json!({ "email": email.as_str(), "password": password }),
        )
        .await
    }

    async fn sign_up(
        &self,
        full_name: &str,
        email: &Email,
        password: &str,
    ) -> Result<SignUpOutcome, BackendError> {
        let url = self.client.endpoint("auth/v1/signup", &[])?;
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "data": { "full_name": full_name },
        });
        let response: SignUpResponse = self
            .client
            .send_json(self.client.request(Method::POST, url).json(&body))
            .await?;

        Ok(match response {
            SignUpResponse::Session(token) => SignUpOutcome::SignedIn(token.into_session(Utc::now())),
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "sign-up awaiting email confirmation");
                SignUpOutcome::ConfirmationRequired(user.into_identity())
            }
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, BackendError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        let url = self.client.endpoint("auth/v1/logout", &[])?;
        self.client
            .send(
                self.client
                    .request(Method::POST, url)
                    .bearer_auth(session.access_token()),
            )
            .await?;
        Ok(())
    }
}
