// Network Center - Service Result
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Structured result envelope for every mutation and validation call.

use serde::Serialize;

use crate::error::EngineError;

/// Result envelope consumed by the API layer.
///
/// `success` on a mutation means "accepted and validated", not "fully
/// applied". Final truth requires a follow-up status query.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl<T> ServiceResult<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn from_error(message: impl Into<String>, err: &EngineError) -> Self {
        Self::failure(message, err.messages())
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_carries_data() {
        let r = ServiceResult::ok(7u32, "done");
        assert!(r.success);
        assert_eq!(r.data, Some(7));
        assert!(r.errors.is_empty());
    }

    #[test]
    fn failure_carries_errors() {
        let r: ServiceResult<()> = ServiceResult::failure("rejected", vec!["bad name".into()]);
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.errors, vec!["bad name".to_string()]);
    }

    #[test]
    fn warnings_attach() {
        let r = ServiceResult::ok(1u8, "done").with_warnings(vec!["link down".into()]);
        assert_eq!(r.warnings.len(), 1);
    }
}
