// Network Center - Error Types
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Engine error taxonomy.
//!
//! Validation failures surface synchronously before any host mutation.
//! Apply failures happen inside background tasks and are only visible in
//! logs and subsequent status queries.

use thiserror::Error;

use crate::host::OpError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller-supplied names or pairings violate identity or role
    /// constraints. Always recoverable by resubmission.
    #[error("validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// An individual OS step failed while converging live state.
    #[error("apply failed at step '{step}': {detail}")]
    Apply { step: String, detail: String },

    /// A referenced interface, rule, or configuration no longer exists.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A required external binary or service is absent.
    #[error("environment error: {0}")]
    Environment(String),
}

impl EngineError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { kind, name: name.into() }
    }

    /// Error messages suitable for the `errors` list of a service result.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { errors } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl From<OpError> for EngineError {
    fn from(err: OpError) -> Self {
        match err {
            OpError::MissingBinary { ref program } => {
                Self::Environment(format!("required binary '{}' is not available", program))
            }
            other => Self::Apply { step: other.command().to_string(), detail: other.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_spread() {
        let err = EngineError::validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.messages(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn missing_binary_maps_to_environment() {
        let op = OpError::MissingBinary { program: "iptables".into() };
        let err: EngineError = op.into();
        assert!(matches!(err, EngineError::Environment(_)));
    }
}
