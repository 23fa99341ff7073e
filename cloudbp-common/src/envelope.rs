//! Response envelopes used by the CloudBP API.
//!
//! Successful responses are wrapped as `{"message": ..., "data": ...}`;
//! failures carry `{"error": ...}`. Some endpoints return a bare payload, so
//! decoding accepts both shapes.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A successful response body, wrapped or bare.
///
/// An object with a `data` key is always treated as wrapped, so a malformed
/// payload is an error rather than a bare value with every field defaulted.
#[derive(Debug, Clone)]
pub enum ApiEnvelope<T> {
    Wrapped { data: T, message: Option<String> },
    Bare(T),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ApiEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let wrapped = value
            .as_object_mut()
            .and_then(|obj| obj.remove("data").map(|data| (data, obj.remove("message"))));

        match wrapped {
            Some((data, message)) => {
                let message = match message {
                    None | Some(Value::Null) => None,
                    Some(m) => Some(String::deserialize(m).map_err(D::Error::custom)?),
                };
                let data = T::deserialize(data).map_err(D::Error::custom)?;
                Ok(ApiEnvelope::Wrapped { data, message })
            }
            None => T::deserialize(value)
                .map(ApiEnvelope::Bare)
                .map_err(D::Error::custom),
        }
    }
}

impl<T> ApiEnvelope<T> {
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiEnvelope::Wrapped { message, .. } => message.as_deref(),
            ApiEnvelope::Bare(_) => None,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            ApiEnvelope::Wrapped { data, .. } => data,
            ApiEnvelope::Bare(data) => data,
        }
    }
}

/// Acknowledgement body with only a message, e.g. from logout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
