//! # Error Types
//!
//! Domain-specific error types for karat-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  karat-core errors (this file)                                         │
//! │  ├── CoreError        - Ticket transitions, payment rules              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  karat-engine errors (separate crate)                                  │
//! │  ├── EngineError      - Session guard, commit protocol                 │
//! │  └── ServiceError     - Collaborator call failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller/UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ticket ID, amounts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Calculation functions never fail on well-formed input; malformed cart
//!    amounts normalize to zero instead of erroring

use thiserror::Error;

use crate::types::{PawnAction, TicketStatus};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations: illegal ticket transitions and
/// payment amounts outside the acceptable window.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A lifecycle action was attempted on a ticket not in PAWN status.
    ///
    /// ## When This Occurs
    /// - Redeeming an already-redeemed ticket
    /// - Forfeiting a redeemed ticket
    /// - Extending a forfeited ticket
    /// - Running the sweep over a ticket forfeited by a previous pass
    ///   (the sweep skips these; a direct call errors)
    #[error("Ticket {ticket_id} is {status:?}, cannot {action:?}")]
    InvalidTransition {
        ticket_id: String,
        status: TicketStatus,
        action: PawnAction,
    },

    /// A partial payment was rejected before touching the balance.
    ///
    /// ## When This Occurs
    /// - Amount is zero or negative
    /// - Amount exceeds the absolute remaining balance (overpayment)
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A collection that must be non-empty is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
