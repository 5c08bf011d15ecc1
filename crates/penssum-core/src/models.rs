//! Data models for Penssum Admin
//!
//! `Product` mirrors the listing shape returned by the remote service.
//! Field names on the wire are camelCase with a Mongo-style `_id`.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// A user-submitted listing awaiting review
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub custom_category: String,
    #[serde(default)]
    pub description: String,
    /// Delivery date as sent by the service (usually RFC 3339)
    #[serde(default)]
    pub date_of_delivery: String,
    /// Price, kept as the service's decimal string
    #[serde(default, rename = "valueString")]
    pub price: String,
    /// Attached file references, echoed back untouched on rejection
    #[serde(default)]
    pub files: Vec<FileRef>,
    /// Miniature image URI
    #[serde(default)]
    pub link_miniature: String,
}

/// Opaque reference to a file attached to a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FileRef(pub serde_json::Value);

impl Product {
    /// Delivery date formatted as `DD-MM-YYYY`
    ///
    /// Falls back to the raw value when it isn't a recognised date.
    pub fn delivery_date_display(&self) -> String {
        let raw = self.date_of_delivery.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.date_naive().format("%d-%m-%Y").to_string();
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return date.format("%d-%m-%Y").to_string();
        }
        raw.to_string()
    }

    /// Page on the web front-end describing this product
    pub fn information_url(&self, web_url: &str) -> String {
        information_url(web_url, &self.id)
    }
}

/// Deep link to a product page on the web front-end
pub fn information_url(web_url: &str, id: &str) -> String {
    format!(
        "{}/post/information/{}",
        web_url.trim_end_matches('/'),
        id
    )
}

/// Connectivity belief held by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// No check has completed yet
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectivityState {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Disconnected
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectivityState::Connected
    }

    /// Boolean form; `None` while unknown
    pub fn as_bool(self) -> Option<bool> {
        match self {
            ConnectivityState::Unknown => None,
            ConnectivityState::Connected => Some(true),
            ConnectivityState::Disconnected => Some(false),
        }
    }
}

/// Opaque push token issued to this device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushToken(String);

impl PushToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PushToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
