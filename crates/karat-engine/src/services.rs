//! # Collaborator Service Contracts
//!
//! The engine never talks to storage directly. Every durable effect goes
//! through one of the traits below; any REST/gRPC binding is acceptable on
//! the other side.
//!
//! ## Collaborator Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Settlement Collaborators                           │
//! │                                                                         │
//! │  InventoryService          item artifacts, status changes              │
//! │  TransactionLedgerService  transaction records, payment postings       │
//! │  TicketLinkService         ticket ↔ transaction ↔ item linkage         │
//! │  PawnHistoryStore          append-only pawn audit trail                │
//! │  ConfigProvider            store configuration snapshots               │
//! │                                                                         │
//! │  Every trait method can fail; the commit protocol treats any failure   │
//! │  as a commit failure and compensates in reverse order.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delete Methods
//! The `delete_*` methods exist solely for the rollback path. A successful
//! settlement never deletes anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use karat_core::{CartLine, Money, PawnHistoryRecord, PaymentMethod, StoreConfig};

use crate::error::ServiceError;

// =============================================================================
// Inventory
// =============================================================================

/// Inventory status values the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Sold to a customer; leaves the floor.
    Sold,
    /// Collateral held against an active pawn loan.
    PawnHeld,
    /// Forfeited collateral awaiting appraisal/pricing for the floor.
    AvailableForProcessing,
}

/// A newly-appraised item the settlement creates (buy/pawn/trade intake).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub description: String,
    pub price: Money,
}

#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Creates item artifacts, returning server-assigned IDs in input order.
    async fn create_items(&self, items: &[NewItem]) -> Result<Vec<String>, ServiceError>;

    /// Deletes an item artifact (rollback only).
    async fn delete_item(&self, item_id: &str) -> Result<(), ServiceError>;

    /// Moves an item to a new status, optionally overriding its price.
    async fn set_status(
        &self,
        item_id: &str,
        status: ItemStatus,
        price_override: Option<Money>,
    ) -> Result<(), ServiceError>;
}

// =============================================================================
// Transaction Ledger
// =============================================================================

/// Everything the backend needs to record one settled transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub customer_id: String,
    pub employee_id: String,
    pub lines: Vec<CartLine>,
    pub total: Money,
}

#[async_trait]
pub trait TransactionLedgerService: Send + Sync {
    /// Creates the transaction record, returning its server-assigned ID.
    async fn create_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<String, ServiceError>;

    /// Deletes a transaction record (rollback only).
    async fn delete_transaction(&self, transaction_id: &str) -> Result<(), ServiceError>;

    /// Posts one payment against a transaction.
    async fn post_payment(
        &self,
        transaction_id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<(), ServiceError>;
}

// =============================================================================
// Ticket Linkage
// =============================================================================

/// Links settlement artifacts per transaction type. The backend keys its
/// per-type ticket tables on these.
#[async_trait]
pub trait TicketLinkService: Send + Sync {
    async fn link_buy_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError>;

    async fn link_sale_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError>;

    async fn link_pawn_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError>;

    async fn link_trade_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError>;

    /// Removes every pawn ticket created under a transaction (rollback only).
    async fn delete_pawn_tickets_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<(), ServiceError>;
}

// =============================================================================
// Pawn History
// =============================================================================

#[async_trait]
pub trait PawnHistoryStore: Send + Sync {
    /// Appends one audit record. `transaction_id` ties records written during
    /// a settlement to that transaction so the rollback path can find them;
    /// records written outside a settlement (sweep forfeitures) pass `None`.
    async fn append(
        &self,
        transaction_id: Option<&str>,
        record: &PawnHistoryRecord,
    ) -> Result<(), ServiceError>;

    /// All history for a ticket, oldest first.
    async fn query(&self, ticket_id: &str) -> Result<Vec<PawnHistoryRecord>, ServiceError>;

    /// Removes history rows written under a transaction (rollback only).
    async fn delete_for_transaction(&self, transaction_id: &str) -> Result<(), ServiceError>;
}

// =============================================================================
// Configuration
// =============================================================================

#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// An immutable snapshot of the store configuration in effect now.
    ///
    /// Consumed, never mutated: tickets freeze the terms out of a snapshot
    /// at creation; nothing re-reads configuration for an existing ticket.
    async fn snapshot(&self) -> Result<StoreConfig, ServiceError>;
}
