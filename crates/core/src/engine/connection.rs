//! Swarm connection state around reconfiguration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection state of the swarm backend.
///
/// `Connected -> Disconnecting -> Disconnected -> Reconnecting -> Connected`.
/// A failed disconnect or reconnect leaves the backend `Disconnected` until
/// a later reconnect succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnecting,
    Disconnected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    /// Whether `self -> next` is a legal step.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connected, Disconnecting)
                | (Disconnecting, Disconnected)
                | (Disconnected, Reconnecting)
                | (Disconnected, Disconnecting)
                | (Reconnecting, Connected)
                | (Reconnecting, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Connected.can_transition_to(Disconnecting));
        assert!(Disconnecting.can_transition_to(Disconnected));
        assert!(Disconnected.can_transition_to(Reconnecting));
        assert!(Reconnecting.can_transition_to(Connected));
    }

    #[test]
    fn test_failure_transitions() {
        assert!(Reconnecting.can_transition_to(Disconnected));
        assert!(Disconnected.can_transition_to(Disconnecting));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Connected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Reconnecting));
        assert!(!Disconnecting.can_transition_to(Connected));
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Disconnected).unwrap(),
            "\"disconnected\""
        );
        assert_eq!(Reconnecting.to_string(), "reconnecting");
    }
}
