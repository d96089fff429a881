//! Bearer credential handling.
//!
//! The backend issues the token; this module only stores it and answers
//! "is someone signed in" for protected operations.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Storage for the bearer token.
pub trait CredentialStore: Send + Sync {
    fn get_token(&self) -> Result<Option<String>>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// Token kept for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_token(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Staff login: room/staff number and password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub number: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Token-issuing backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
}

/// Signed-in state backed by a credential store.
pub struct AuthSession<S: CredentialStore> {
    store: S,
}

impl<S: CredentialStore> AuthSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Exchanges credentials for a token and stores it.
    pub async fn login(&self, api: &dyn AuthApi, request: LoginRequest) -> Result<String> {
        if request.number.trim().is_empty() || request.password.is_empty() {
            return Err(Error::invalid_input("Room number and password are required"));
        }
        let response = api.login(&request).await?;
        if response.token.trim().is_empty() {
            return Err(Error::auth("Login response did not include a token"));
        }
        self.store.set_token(&response.token)?;
        info!("Signed in as {}", request.number);
        Ok(response.token)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear_token()?;
        debug!("Stored token cleared");
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.store.get_token()?.filter(|token| !token.is_empty()))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Ok(Some(_)))
    }

    /// Token for a protected operation, or an auth error asking the user to sign in.
    pub fn require_token(&self) -> Result<String> {
        self.token()?
            .ok_or_else(|| Error::auth("No access token configured. Please sign in first."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAuth(Result<LoginResponse>);

    #[async_trait]
    impl AuthApi for FixedAuth {
        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
            self.0.clone()
        }
    }

    fn request() -> LoginRequest {
        LoginRequest {
            number: "101".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn login_stores_token_and_logout_clears_it() {
        let session = AuthSession::new(MemoryCredentialStore::new());
        assert!(!session.is_authenticated());

        let api = FixedAuth(Ok(LoginResponse {
            token: "jwt".to_string(),
        }));
        session.login(&api, request()).await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.require_token().unwrap(), "jwt");

        session.logout().unwrap();
        assert!(matches!(session.require_token(), Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn failed_login_leaves_session_signed_out() {
        let session = AuthSession::new(MemoryCredentialStore::new());
        let api = FixedAuth(Err(Error::api(401, "Invalid credentials")));

        let err = session.login(&api, request()).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_any_request() {
        let session = AuthSession::new(MemoryCredentialStore::new());
        let api = FixedAuth(Err(Error::transport("should not be called")));
        let err = session
            .login(
                &api,
                LoginRequest {
                    number: " ".to_string(),
                    password: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
