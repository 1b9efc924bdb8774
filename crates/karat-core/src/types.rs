//! # Domain Types
//!
//! Core domain types used throughout Karat POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │   PawnTicket    │   │ PawnHistoryRecord│   │ CashDrawerSession│     │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │     │
//! │  │  ticket_id      │   │  ticket_id       │   │  id (UUID)       │     │
//! │  │  items          │   │  action          │   │  employee_id     │     │
//! │  │  frozen terms   │   │  amounts paid    │   │  drawer kind     │     │
//! │  │  due_date       │   │  performed_by    │   │  opened/closed   │     │
//! │  │  status         │   │  (append-only)   │   └──────────────────┘     │
//! │  └─────────────────┘   └──────────────────┘                            │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │  TicketStatus   │   │  PaymentMethod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pawn           │   │  Cash           │       │
//! │  │  290 = 2.9%     │   │  Redeemed       │   │  ExternalCard   │       │
//! │  └─────────────────┘   │  Forfeited      │   │  StoreCredit    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Frozen-Terms Pattern
//! A pawn ticket copies `PawnTerms` out of the store configuration the moment
//! it is created. Later configuration changes never touch an existing ticket:
//! accrual is always computed from the copy carried by the ticket itself.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 290 bps = 2.9% (monthly pawn interest), 1300 bps = 13% (sales tax)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Pawn Terms & Store Configuration
// =============================================================================

/// The accrual terms applied to a pawn loan.
///
/// Copied into each `PawnTicket` at creation - never read live afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PawnTerms {
    /// Loan term in days; due date = transaction date + term.
    pub term_days: u32,
    /// Interest per frequency period, in basis points (290 = 2.9%).
    pub interest_rate_bps: u32,
    /// Length of one interest period in days (typically 30).
    pub frequency_days: u32,
}

/// Whether overdue tickets forfeit automatically or only by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitureMode {
    /// Overdue tickets stay PAWN until an employee forfeits them.
    Manual,
    /// The overdue sweep forfeits tickets past their due date.
    Automatic,
}

impl Default for ForfeitureMode {
    fn default() -> Self {
        ForfeitureMode::Manual
    }
}

/// A snapshot of store configuration consumed by the engine.
///
/// Produced by the `ConfigProvider` collaborator; immutable once handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub terms: PawnTerms,
    pub forfeiture_mode: ForfeitureMode,
    /// Sales tax rate applied to sale lines (1300 bps = 13%).
    pub tax_rate: Rate,
}

// =============================================================================
// Pawn Ticket
// =============================================================================

/// One item of collateral on a pawn ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PawnItem {
    /// Inventory identifier assigned by the inventory collaborator.
    pub item_id: String,
    /// Principal contributed by this item. Zero is allowed.
    pub price: Money,
}

/// The status of a pawn ticket. One status is shared by every item on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Loan is active; collateral held by the store.
    Pawn,
    /// Customer repaid principal + interest + insurance. Terminal.
    Redeemed,
    /// Ticket passed due date without redemption. Terminal.
    Forfeited,
}

impl TicketStatus {
    /// Terminal states accept no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Redeemed | TicketStatus::Forfeited)
    }
}

/// A pawn loan collateralized by one or more items, tracked as a single unit.
///
/// ## Invariants
/// - `term_days` / `interest_rate_bps` / `frequency_days` are frozen at
///   creation from the `PawnTerms` in effect then; never recomputed
/// - `due_date` is computed once at creation and persisted
/// - `transaction_date` is immutable
/// - status transitions only via the ledger operations (redeem/forfeit/extend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PawnTicket {
    /// External ticket identifier (server-assigned).
    pub ticket_id: String,
    pub customer_id: String,
    /// Collateral items; principal = sum of item prices.
    pub items: Vec<PawnItem>,
    /// Calendar date the loan was written. Immutable.
    #[ts(as = "String")]
    pub transaction_date: NaiveDate,
    /// Frozen copy of the terms in effect at creation.
    pub terms: PawnTerms,
    /// `transaction_date + term_days`, persisted at creation.
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub status: TicketStatus,
}

impl PawnTicket {
    /// Total loan principal: the sum of every item's price.
    pub fn principal(&self) -> Money {
        self.items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.price)
    }
}

// =============================================================================
// Pawn History
// =============================================================================

/// The lifecycle action a history record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PawnAction {
    Created,
    Extend,
    Redeem,
    Forfeit,
}

/// Append-only audit record, one per lifecycle action on a ticket.
///
/// ## Invariants
/// - Never mutated or deleted after insertion (audit trail)
/// - Exactly one `Created` record per ticket
/// - Financial fields are populated only where the action pays money
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PawnHistoryRecord {
    pub ticket_id: String,
    pub action: PawnAction,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    pub principal: Option<Money>,
    pub interest_paid: Option<Money>,
    pub fee_paid: Option<Money>,
    pub total_paid: Option<Money>,
    /// Only for `Extend`.
    #[ts(as = "Option<String>")]
    pub new_due_date: Option<NaiveDate>,
    /// Only for `Extend`.
    pub extension_days: Option<u32>,
    /// Employee identifier.
    pub performed_by: String,
    pub notes: Option<String>,
}

/// Amounts paid in a redemption or extension, as settled at checkout.
///
/// Supplied by the settlement processor - the ledger records these as facts
/// and does not re-derive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaidAmounts {
    pub principal: Money,
    pub interest: Money,
    pub insurance_fee: Money,
    pub total: Money,
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    ExternalCard,
    /// Store credit applied from the customer's account.
    StoreCredit,
}

/// One accepted partial payment against a settlement cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub method: PaymentMethod,
    pub amount: Money,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Cash Drawer Session
// =============================================================================

/// The kind of drawer an employee session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DrawerKind {
    /// The physical till. Required for settlement commits.
    Physical,
    /// Non-cash drawer (layaway ledger, online orders).
    Virtual,
}

/// A bounded window in which an employee may record cash-affecting
/// transactions.
///
/// ## Invariant
/// At most one open `Physical` session per employee at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashDrawerSession {
    /// Session identifier (UUID v4, engine-assigned).
    pub id: String,
    pub employee_id: String,
    pub drawer: DrawerKind,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl CashDrawerSession {
    /// A session is open until `closed_at` is set.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
