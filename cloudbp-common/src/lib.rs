//! CloudBP Common Types
//!
//! Wire types shared by the auth client and anything else talking to the API.

pub mod auth;
pub mod envelope;
pub mod user;

pub use auth::{AuthResponse, LoginRequest, RegisterRequest, TokenResponse};
pub use envelope::{ApiEnvelope, ApiErrorBody, ApiMessage};
pub use user::{Role, User};
