//! Auth flows: API calls whose results are pushed into the session.

use cloudbp_common::{LoginRequest, RegisterRequest, User};

use crate::api::AuthApi;
use crate::error::{Error, Result};
use crate::session::Session;

/// Couples an [`AuthApi`] with the [`Session`] it feeds.
pub struct AuthClient {
    api: AuthApi,
    session: Session,
}

impl AuthClient {
    pub fn new(api: AuthApi, session: Session) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Log in and adopt the returned token and user.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User> {
        let response = self.api.login(&LoginRequest::new(username, password)).await?;
        tracing::info!(username = %response.user.username, "Logged in");
        self.adopt(response.token, response.user)
    }

    /// Register a new account and adopt the returned token and user.
    ///
    /// A mismatched confirmation is rejected before any request is sent.
    pub async fn register(&mut self, request: &RegisterRequest) -> Result<&User> {
        if !request.passwords_match() {
            return Err(Error::InvalidInput(
                "password confirmation does not match".to_string(),
            ));
        }
        let response = self.api.register(request).await?;
        tracing::info!(username = %response.user.username, "Registered");
        self.adopt(response.token, response.user)
    }

    /// Tell the server, then drop the local session whatever it answered.
    ///
    /// The server is only contacted while a token is held. Its error, if any,
    /// is returned after the local session has been cleared. A failure to
    /// clear the durable token takes precedence.
    pub async fn logout(&mut self) -> Result<()> {
        let remote = match self.session.token() {
            Some(token) => self.api.logout(token).await.map(|_| ()),
            None => Ok(()),
        };
        if let Err(ref e) = remote {
            tracing::warn!("Server-side logout failed: {}", e);
        }
        self.session.logout()?;
        remote
    }

    /// Ask for a new token. Returns whether the server issued one.
    pub async fn refresh(&mut self) -> Result<bool> {
        let token = self.session.token().ok_or(Error::NotAuthenticated)?;
        let response = self.api.refresh(token).await?;
        match response.token {
            Some(token) if !token.is_empty() => {
                self.session.set_token(token)?;
                tracing::debug!("Token refreshed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Fetch the profile for the current token and cache it in the session.
    pub async fn fetch_profile(&mut self) -> Result<&User> {
        let token = self.session.token().ok_or(Error::NotAuthenticated)?;
        let user = self.api.get_user_info(token).await?;
        self.session.set_user(user)?;
        self.session.user().ok_or(Error::NotAuthenticated)
    }

    fn adopt(&mut self, token: String, user: User) -> Result<&User> {
        self.session.set_token(token)?;
        self.session.set_user(user)?;
        self.session.user().ok_or(Error::NotAuthenticated)
    }
}
