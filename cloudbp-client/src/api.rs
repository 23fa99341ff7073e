//! Typed wrappers for the auth endpoints.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use cloudbp_common::{
    ApiEnvelope, ApiErrorBody, ApiMessage, AuthResponse, LoginRequest, RegisterRequest,
    TokenResponse, User,
};

use crate::error::{Error, Result};
use crate::transport::{ApiReply, Transport};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const PROFILE_PATH: &str = "/user/profile";

/// Stateless client for the auth API.
///
/// Each method is one request and one decoded reply. Storing the results is
/// up to the caller, and so is supplying the bearer token for the endpoints
/// that need one.
#[derive(Clone)]
pub struct AuthApi {
    transport: Arc<dyn Transport>,
}

impl AuthApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.send(Method::POST, LOGIN_PATH, Some(request), None).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.send(Method::POST, REGISTER_PATH, Some(request), None).await
    }

    /// Returns the server's acknowledgement message, if it sent one.
    pub async fn logout(&self, token: &str) -> Result<Option<String>> {
        let reply = self.call(Method::POST, LOGOUT_PATH, None, Some(token)).await?;
        if reply.body.trim().is_empty() {
            return Ok(None);
        }
        let ack: ApiMessage = decode_json(&reply.body)?;
        Ok(ack.message)
    }

    pub async fn refresh(&self, token: &str) -> Result<TokenResponse> {
        let reply = self.call(Method::POST, REFRESH_PATH, None, Some(token)).await?;
        if reply.body.trim().is_empty() {
            return Ok(TokenResponse::default());
        }
        decode_envelope(&reply.body)
    }

    pub async fn get_user_info(&self, token: &str) -> Result<User> {
        self.send::<(), _>(Method::GET, PROFILE_PATH, None, Some(token)).await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let reply = self.call(method, path, body, bearer).await?;
        decode_envelope(&reply.body)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<ApiReply> {
        let reply = self.transport.request(method, path, body, bearer).await?;
        if reply.is_success() {
            Ok(reply)
        } else {
            Err(status_error(reply))
        }
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    decode_json::<ApiEnvelope<T>>(body).map(ApiEnvelope::into_data)
}

/// Prefer the server's `{"error": ...}` message, fall back to the raw body.
fn status_error(reply: ApiReply) -> Error {
    let message = match serde_json::from_str::<ApiErrorBody>(&reply.body) {
        Ok(body) => body.error,
        Err(_) => reply.body.trim().to_string(),
    };
    Error::Status {
        status: reply.status,
        message,
    }
}
