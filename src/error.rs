//! Error types for the duo tracker
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application, with thiserror enums for the failures callers
//! need to match on.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Domain errors raised by the store, roster loading and configuration
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Player already registered: {player_id}")]
    PlayerAlreadyRegistered { player_id: String },

    #[error("Player {player_id} is already part of duo {duo_id}")]
    PlayerAlreadyPaired { player_id: String, duo_id: String },

    #[error("Duo not found: {duo_id}")]
    DuoNotFound { duo_id: String },

    #[error("Duo already exists: {duo_id}")]
    DuoAlreadyExists { duo_id: String },

    #[error("Invalid duo {duo_id}: {reason}")]
    InvalidDuo { duo_id: String, reason: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Match already scored: {match_id}")]
    MatchAlreadyScored { match_id: String },

    #[error("Invalid rank label: {label}")]
    InvalidRank { label: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

/// Failures surfaced by the match-telemetry collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TelemetryError {
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl TelemetryError {
    /// Whether the failure is a transient network or quota problem
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TelemetryError::RateLimited { .. } | TelemetryError::Transport { .. }
        ) || matches!(self, TelemetryError::Status { status, .. } if *status >= 500)
    }

    /// The requested resource is gone or unreadable; retrying will not help
    pub fn is_unusable_match(&self) -> bool {
        matches!(
            self,
            TelemetryError::NotFound { .. } | TelemetryError::Decode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TelemetryError::RateLimited { attempts: 3 }.is_transient());
        assert!(TelemetryError::Transport {
            message: "reset".to_string()
        }
        .is_transient());
        assert!(TelemetryError::Status {
            status: 503,
            endpoint: "match".to_string()
        }
        .is_transient());
        assert!(!TelemetryError::Status {
            status: 403,
            endpoint: "match".to_string()
        }
        .is_transient());
        assert!(!TelemetryError::NotFound {
            resource: "EUW1_1".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_unusable_match_classification() {
        assert!(TelemetryError::NotFound {
            resource: "EUW1_1".to_string()
        }
        .is_unusable_match());
        assert!(TelemetryError::Decode {
            endpoint: "match".to_string(),
            message: "missing field `info`".to_string()
        }
        .is_unusable_match());
        // an auth failure says nothing about the match itself
        assert!(!TelemetryError::Status {
            status: 403,
            endpoint: "match".to_string()
        }
        .is_unusable_match());
        assert!(!TelemetryError::RateLimited { attempts: 3 }.is_unusable_match());
    }
}
