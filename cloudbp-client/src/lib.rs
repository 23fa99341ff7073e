//! CloudBP auth client.
//!
//! Typed wrappers for the auth endpoints, a session store that persists the
//! bearer token, and the flows that connect the two.

pub mod api;
pub mod config;
pub mod error;
pub mod flows;
pub mod session;
pub mod storage;
pub mod transport;

pub use api::AuthApi;
pub use config::Config;
pub use error::{Error, Result};
pub use flows::AuthClient;
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore, TOKEN_KEY};
pub use transport::{ApiReply, HttpTransport, Transport};
