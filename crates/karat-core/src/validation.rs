//! # Validation Module
//!
//! Input validation utilities for Karat POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation before any mutation   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Collaborator services - server-side constraints              │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::PawnTerms;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an external identifier (ticket ID, customer ID, employee ID).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 64 characters
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`crate::MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > crate::MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: crate::MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a pawn terms snapshot before a ticket freezes it.
///
/// ## Rules
/// - `term_days` and `frequency_days` must be positive
/// - `interest_rate_bps` must not exceed 10000 (100% per period)
pub fn validate_terms(terms: &PawnTerms) -> ValidationResult<()> {
    if terms.term_days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "term_days".to_string(),
        });
    }

    if terms.frequency_days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "frequency_days".to_string(),
        });
    }

    if terms.interest_rate_bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "interest_rate_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
