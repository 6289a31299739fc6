//! Chat message types.
//!
//! These types define the protocol between clients and the server, both over
//! the WebSocket and in upload responses. Field names are camelCase on the
//! wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved author for server-generated notices.
pub const SYSTEM_AUTHOR: &str = "System";

/// File reference attached to a message for a shared file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Download path for the stored object.
    pub file_url: String,
    /// Original filename as uploaded.
    pub file_name: String,
}

/// A chat message as delivered to every client.
///
/// `id`, `username` and `timestamp` are always assigned by the server;
/// anything a client supplies for them is discarded. Timestamps are ordered
/// per session only, not across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    /// Set only for file-share messages; omitted on the wire otherwise.
    #[serde(flatten)]
    pub file: Option<FileRef>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Stamp a client-authored text message.
    pub fn user(username: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            content: content.into(),
            file: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a server-authored notice.
    pub fn system(content: impl Into<String>) -> Self {
        Self::user(SYSTEM_AUTHOR, content)
    }

    /// Create the message announcing a shared file.
    pub fn file_share(
        username: impl Into<String>,
        file_url: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let file_name = file_name.into();
        let mut msg = Self::user(username, format!("shared a file: {}", file_name));
        msg.file = Some(FileRef {
            file_url: file_url.into(),
            file_name,
        });
        msg
    }
}

/// The inbound payload from a client.
///
/// `content` is the only field the server honors; client-supplied ids,
/// usernames and timestamps are ignored.
#[derive(Debug, Deserialize)]
pub struct Inbound {
    #[serde(default)]
    pub content: String,
}

/// Resolve a client-chosen display name, falling back to a pseudonymous one.
pub fn resolve_display_name(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "anonymous-{}",
            &Uuid::new_v4().simple().to_string()[..8]
        ),
    }
}
