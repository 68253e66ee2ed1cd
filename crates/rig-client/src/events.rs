//! Status and data events emitted by the client
//!
//! Every status transition and every completed response is published on a
//! single broadcast channel so that observers see them in the order they
//! happened.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection status of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not connected and not trying to
    Disconnected,
    /// A connect attempt is in progress
    Connecting,
    /// Connected; commands flow
    Connected,
    /// The last connect attempt failed
    Error,
    /// Connection was lost; a retry is scheduled
    Reconnecting,
    /// Reconnection gave up; waits for an explicit connect
    Failed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A status transition with its human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// New status
    pub status: ConnectionStatus,
    /// Message for display
    pub message: String,
    /// Current reconnect attempt (reconnecting only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attempt: Option<u32>,
    /// Configured maximum reconnect attempts (reconnecting only)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_attempts: Option<u32>,
}

impl StatusUpdate {
    /// Create a status update without attempt counters
    pub fn new(status: ConnectionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            attempt: None,
            max_attempts: None,
        }
    }

    /// Create a reconnecting update carrying the attempt counters
    pub fn reconnecting(attempt: u32, max_attempts: u32) -> Self {
        Self {
            status: ConnectionStatus::Reconnecting,
            message: format!("Reconnecting ({}/{})...", attempt, max_attempts),
            attempt: Some(attempt),
            max_attempts: Some(max_attempts),
        }
    }
}

impl Default for StatusUpdate {
    fn default() -> Self {
        Self::new(ConnectionStatus::Disconnected, "Not connected")
    }
}

/// Event emitted by the client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection status changed
    Status(StatusUpdate),
    /// A response arrived (trimmed text)
    Data(String),
}

impl ClientEvent {
    /// Returns the status update if this is a status event
    pub fn as_status(&self) -> Option<&StatusUpdate> {
        match self {
            ClientEvent::Status(update) => Some(update),
            ClientEvent::Data(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnecting_payload() {
        let update = StatusUpdate::reconnecting(2, 5);
        assert_eq!(update.message, "Reconnecting (2/5)...");

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "reconnecting");
        assert_eq!(json["attempt"], 2);
        assert_eq!(json["maxAttempts"], 5);
    }

    #[test]
    fn test_plain_payload_omits_counters() {
        let update = StatusUpdate::new(ConnectionStatus::Connected, "Connected to radio:4532");
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["status"], "connected");
        assert!(json.get("attempt").is_none());
        assert!(json.get("maxAttempts").is_none());
    }

    #[test]
    fn test_event_classification() {
        let status = ClientEvent::Status(StatusUpdate::default());
        assert_eq!(
            status.as_status().map(|s| s.status),
            Some(ConnectionStatus::Disconnected)
        );
        assert!(ClientEvent::Data("RPRT 0".into()).as_status().is_none());
    }
}
