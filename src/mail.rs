//! Raw message wire types, mirroring the mail provider's "get full
//! message" JSON: headers as `{name, value}` pairs, body data as
//! base64url strings, nested `parts` for multipart messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw, provider-fetched message. Immutable input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Provider-assigned message id — doubles as the dedup key downstream.
    pub id: String,
    /// Epoch-millisecond timestamp as a string, as the provider sends it.
    #[serde(rename = "internalDate", default, skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<String>,
    pub payload: Payload,
}

/// A MIME-like payload node: either a leaf with body data, or a
/// multipart container with child `parts` (possibly nested).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Payload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Body {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl RawMessage {
    fn header(&self, name: &str) -> &str {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
            .unwrap_or("")
    }

    /// Subject header, or empty string.
    pub fn subject(&self) -> &str {
        self.header("Subject")
    }

    /// From header, or empty string.
    pub fn sender(&self) -> &str {
        self.header("From")
    }

    /// Receipt time from `internalDate` millis; `None` if absent/garbled.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.internal_date.as_deref()?.parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}
