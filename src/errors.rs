//! Error types for the arcade core
//!
//! One root error with a category per failure class. Precondition failures are
//! raised before any state is touched or any contract call is issued.

use crate::settlement::SettlementError;

/// Root error type for all arcade operations
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Rejected before any state change or contract call
    #[error("Rejected: {0}")]
    Precondition(#[from] PreconditionError),

    /// Token contract call failed
    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// Key-value store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),
}

/// User-facing rejections
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PreconditionError {
    #[error("No wallet connected")]
    MissingIdentity,

    #[error("Insufficient balance: need {required} LTK, have {available} LTK")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("Invalid guess '{guess}': {reason}")]
    InvalidGuess { guess: String, reason: String },

    #[error("Daily claim not available for another {remaining_secs}s")]
    ClaimCooldown { remaining_secs: u64 },

    #[error("A daily claim for this wallet is already being submitted")]
    ClaimInProgress,

    #[error("No plays remaining, purchase more to continue")]
    NoCreditsRemaining,

    #[error("A play is already in progress")]
    PlayInProgress,

    #[error("No play in progress")]
    NoPlayInProgress,

    #[error("Game is over, start a new one")]
    GameOver,

    #[error("Reward amount must be positive, got {0}")]
    InvalidRewardAmount(f64),

    #[error("No pending rewards to settle")]
    NothingToSettle,

    #[error("Play does not belong to a {expected} session")]
    GameMismatch { expected: String },
}

/// Key-value store errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database open failed: {0}")]
    OpenFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Store unavailable")]
    Unavailable,
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::WriteFailed(e.to_string())
    }
}

impl From<toml::de::Error> for ArcadeError {
    fn from(e: toml::de::Error) -> Self {
        ArcadeError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

impl From<std::io::Error> for ArcadeError {
    fn from(e: std::io::Error) -> Self {
        ArcadeError::Configuration(ConfigurationError::LoadFailed(e.to_string()))
    }
}

// Convenience type alias for Results
pub type ArcadeResult<T> = Result<T, ArcadeError>;

impl ArcadeError {
    /// True for rejections the player can fix (connect wallet, wait, buy plays)
    pub fn is_precondition(&self) -> bool {
        matches!(self, ArcadeError::Precondition(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err: ArcadeError = PreconditionError::ClaimCooldown { remaining_secs: 42 }.into();
        assert!(err.to_string().contains("Rejected"));
        assert!(err.to_string().contains("42s"));
    }

    #[test]
    fn test_insufficient_balance_details() {
        let err = PreconditionError::InsufficientBalance {
            required: 15.0,
            available: 3.0,
        };
        assert!(err.to_string().contains("need 15 LTK"));
        assert!(err.to_string().contains("have 3 LTK"));
    }

    #[test]
    fn test_error_conversion() {
        let err: ArcadeError = ConfigurationError::ValidationFailed("test".to_string()).into();
        match err {
            ArcadeError::Configuration(_) => {}
            _ => panic!("Expected configuration error"),
        }
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_error_source() {
        let err: ArcadeError = StorageError::Unavailable.into();
        assert!(err.source().is_some());
    }
}
