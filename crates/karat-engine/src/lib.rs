//! # karat-engine: Settlement Engine for Karat POS
//!
//! The async service boundary of the pawn & settlement engine: the commit
//! protocol, the cash-drawer gate, the overdue sweep, and the collaborator
//! contracts everything durable goes through.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     karat-engine (THIS CRATE)                           │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌─────────────────┐  ┌─────────────────────┐    │
//! │  │ SettlementProc.  │  │ CashSessionGate │  │ OverdueSweep        │    │
//! │  │ (settlement.rs)  │  │ (drawer.rs)     │  │ (sweep.rs)          │    │
//! │  │                  │  │                 │  │                     │    │
//! │  │ ordered commit   │◄─│ open/close/     │  │ auto-forfeit pass,  │    │
//! │  │ + reverse-order  │  │ is_open guard   │  │ idempotent by       │    │
//! │  │ compensation     │  │                 │  │ status guard        │    │
//! │  └────────┬─────────┘  └─────────────────┘  └──────────┬──────────┘    │
//! │           │                                            │               │
//! │           ▼                                            ▼               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Collaborator traits (services.rs)                    │   │
//! │  │  InventoryService · TransactionLedgerService ·                  │   │
//! │  │  TicketLinkService · PawnHistoryStore · ConfigProvider          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  DEPENDENCIES:                                                         │
//! │  • karat-core: pure money/accrual/cart math and the ticket state       │
//! │    machine - this crate adds I/O and ordering, never math              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//! One employee drives one cart at a time; there is no cross-cart locking
//! here. The engine suspends only at collaborator calls, each treated as a
//! potentially-failing synchronous step. Once `commit` begins, the only exit
//! paths are full success or the compensation path.

pub mod drawer;
pub mod error;
pub mod services;
pub mod settlement;
pub mod sweep;

pub use drawer::CashSessionGate;
pub use error::{EngineError, EngineResult, ServiceError};
pub use services::{
    ConfigProvider, InventoryService, ItemStatus, NewItem, PawnHistoryStore, TicketLinkService,
    TransactionLedgerService, TransactionPayload,
};
pub use settlement::{CommitResult, SettlementContext, SettlementProcessor};
pub use sweep::{OverdueSweep, AUTO_FORFEIT_NOTE};
