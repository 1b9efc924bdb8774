//! # karat-core: Pure Business Logic for Karat POS
//!
//! This crate is the **heart** of the Karat pawn & settlement engine. It
//! contains all financial logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Karat POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (browser POS)                       │   │
//! │  │    Checkout UI ──► Pawn Desk UI ──► Drawer UI ──► Reports       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              karat-engine (async service boundary)              │   │
//! │  │    SettlementProcessor, CashSessionGate, overdue sweep,         │   │
//! │  │    collaborator traits (inventory, ledger, history, config)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ karat-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │   cart    │  │   │
//! │  │   │PawnTicket │  │   Money   │  │  accrual  │  │ CartLine  │  │   │
//! │  │   │  History  │  │   Rate    │  │ state m/c │  │ payments  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (PawnTicket, history records, sessions)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Pawn accrual math and the ticket state machine
//! - [`cart`] - Settlement cart, signed line values, partial payments
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every calculation is deterministic - same input =
//!    same output; accrual reads only a ticket's frozen terms
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64), rates in
//!    basis points, to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use karat_core::ledger::{create_ticket, redemption_amount};
//! use karat_core::money::Money;
//! use karat_core::types::{PawnItem, PawnTerms};
//!
//! let terms = PawnTerms { term_days: 90, interest_rate_bps: 290, frequency_days: 30 };
//! let (ticket, _created) = create_ticket(
//!     "PT-1042",
//!     "C-7",
//!     vec![PawnItem { item_id: "I-1".into(), price: Money::from_cents(100_000) }],
//!     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
//!     terms,
//!     "emp-3",
//! ).unwrap();
//!
//! // $1,000 over 3 periods at 2.9% + 1% insurance → $1,117.00
//! assert_eq!(redemption_amount(&ticket).total.cents(), 111_700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use karat_core::Money` instead of
// `use karat_core::money::Money`

pub use cart::{CartLine, LineKind, PaymentOutcome, RawCartLine, SettlementCart};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Insurance rate charged per interest period, in basis points (1%).
///
/// ## Business Reason
/// Covers collateral storage and coverage while the store holds it. Charged
/// on the same period schedule as interest.
pub const INSURANCE_RATE_BPS: u32 = 100;

/// Protection plan markup, in basis points (15%).
///
/// ## Business Reason
/// Optional per-line coverage the customer opts into at checkout. Applied
/// after quantity scaling, before tax.
pub const PROTECTION_PLAN_RATE_BPS: u32 = 1_500;

/// Maximum quantity of a single cart line, enforced by
/// [`validation::validate_quantity`] at commit time.
///
/// ## Business Reason
/// Prevents accidental over-entry (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
