//! # Engine Error Types
//!
//! Errors raised at the service boundary: the session guard, the commit
//! protocol, and collaborator call failures.
//!
//! ## Propagation Policy
//! Protocol functions fail fast and loud - any precondition violation aborts
//! before mutation. A collaborator failure mid-commit triggers the rollback
//! path; rollback step failures are logged and never mask the original error.

use thiserror::Error;

use karat_core::CoreError;

// =============================================================================
// Service Error
// =============================================================================

/// A failure reported by an external collaborator service.
///
/// Carries which collaborator failed and its message; the engine treats every
/// collaborator error uniformly as a commit failure.
#[derive(Debug, Clone, Error)]
#[error("{service}: {message}")]
pub struct ServiceError {
    /// Collaborator name, e.g. "inventory", "transaction-ledger".
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        ServiceError {
            service,
            message: message.into(),
        }
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors surfaced by the settlement engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Commit guard: the acting employee has no open physical drawer session.
    #[error("No open cash session for employee {employee_id}")]
    NoCashSession { employee_id: String },

    /// `open` was called while a physical session is already open.
    #[error("Employee {employee_id} already has an open cash session")]
    DrawerAlreadyOpen { employee_id: String },

    /// `close` was called with an unknown session ID.
    #[error("Cash session not found: {0}")]
    SessionNotFound(String),

    /// A commit was attempted on a cart that is not fully settled.
    #[error("Cart is not fully settled: {remaining} outstanding")]
    NotSettled { remaining: String },

    /// A commit was attempted on an empty cart.
    #[error("Cannot commit an empty cart")]
    EmptyCart,

    /// An external collaborator call failed.
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] ServiceError),

    /// A core business rule was violated (wraps karat-core errors).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_message() {
        let err = ServiceError::new("inventory", "connection refused");
        assert_eq!(err.to_string(), "inventory: connection refused");
    }

    #[test]
    fn test_collaborator_wrapping() {
        let err: EngineError = ServiceError::new("transaction-ledger", "timeout").into();
        assert_eq!(
            err.to_string(),
            "Collaborator error: transaction-ledger: timeout"
        );
    }

    #[test]
    fn test_no_session_message() {
        let err = EngineError::NoCashSession {
            employee_id: "emp-3".to_string(),
        };
        assert_eq!(err.to_string(), "No open cash session for employee emp-3");
    }
}
