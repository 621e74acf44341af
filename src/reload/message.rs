//! Live reload message protocol.
//!
//! JSON messages pushed from the dev server to browser clients.
//!
//! # Message Types
//!
//! - `connected`: Handshake completed
//! - `reload`: Trigger full page reload
//! - `error`: Show the error overlay (no reload)
//! - `clear_error`: Hide the error overlay

use serde::{Deserialize, Serialize};

/// Message sent over the live reload WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Full page reload
    Reload {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Failed pass (display overlay, no reload)
    Error { summary: String, detail: String },

    /// Clear error overlay
    #[serde(rename = "clear_error")]
    ClearError,
}

impl ReloadMessage {
    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Error {
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
