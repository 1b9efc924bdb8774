//! Shared test fixtures: recording in-memory collaborator stubs.
//!
//! Every stub counts its create and delete calls so atomicity tests can
//! assert creates == deletes after a rolled-back commit.

// Each integration test binary compiles this module; not every binary uses
// every fixture.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use karat_core::{
    ForfeitureMode, Money, PawnHistoryRecord, PawnTerms, PaymentMethod, Rate, StoreConfig,
};
use karat_engine::{
    CashSessionGate, ConfigProvider, InventoryService, ItemStatus, NewItem, PawnHistoryStore,
    ServiceError, SettlementContext, SettlementProcessor, TicketLinkService,
    TransactionLedgerService, TransactionPayload,
};

// =============================================================================
// Inventory stub
// =============================================================================

#[derive(Default)]
pub struct StubInventory {
    counter: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub status_calls: Mutex<Vec<(String, ItemStatus)>>,
    /// When set, every `set_status` call fails.
    pub fail_set_status: bool,
}

impl StubInventory {
    pub fn failing_set_status() -> Self {
        StubInventory {
            fail_set_status: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl InventoryService for StubInventory {
    async fn create_items(&self, items: &[NewItem]) -> Result<Vec<String>, ServiceError> {
        let mut ids = Vec::new();
        for _ in items {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let id = format!("item-{n}");
            self.created.lock().unwrap().push(id.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), ServiceError> {
        self.deleted.lock().unwrap().push(item_id.to_string());
        Ok(())
    }

    async fn set_status(
        &self,
        item_id: &str,
        status: ItemStatus,
        _price_override: Option<Money>,
    ) -> Result<(), ServiceError> {
        if self.fail_set_status {
            return Err(ServiceError::new("inventory", "status update rejected"));
        }
        self.status_calls
            .lock()
            .unwrap()
            .push((item_id.to_string(), status));
        Ok(())
    }
}

// =============================================================================
// Transaction ledger stub
// =============================================================================

#[derive(Default)]
pub struct StubTransactions {
    counter: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub payments: Mutex<Vec<(String, Money, PaymentMethod)>>,
    /// When set, `post_payment` fails once this many payments have landed.
    pub fail_payment_after: Option<usize>,
}

impl StubTransactions {
    pub fn failing_payments_after(n: usize) -> Self {
        StubTransactions {
            fail_payment_after: Some(n),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TransactionLedgerService for StubTransactions {
    async fn create_transaction(
        &self,
        _payload: &TransactionPayload,
    ) -> Result<String, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("txn-{n}");
        self.created.lock().unwrap().push(id.clone());
        Ok(id)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<(), ServiceError> {
        self.deleted.lock().unwrap().push(transaction_id.to_string());
        Ok(())
    }

    async fn post_payment(
        &self,
        transaction_id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<(), ServiceError> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(limit) = self.fail_payment_after {
            if payments.len() >= limit {
                return Err(ServiceError::new("transaction-ledger", "payment declined"));
            }
        }
        payments.push((transaction_id.to_string(), amount, method));
        Ok(())
    }
}

// =============================================================================
// Ticket link stub
// =============================================================================

#[derive(Default)]
pub struct StubLinks {
    pub pawn_links: Mutex<Vec<(String, String, String)>>,
    pub sale_links: Mutex<Vec<(String, String, String)>>,
    pub buy_links: Mutex<Vec<(String, String, String)>>,
    pub trade_links: Mutex<Vec<(String, String, String)>>,
    pub deleted_pawn_transactions: Mutex<Vec<String>>,
}

#[async_trait]
impl TicketLinkService for StubLinks {
    async fn link_buy_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError> {
        self.buy_links.lock().unwrap().push((
            ticket_id.to_string(),
            transaction_id.to_string(),
            item_id.to_string(),
        ));
        Ok(())
    }

    async fn link_sale_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError> {
        self.sale_links.lock().unwrap().push((
            ticket_id.to_string(),
            transaction_id.to_string(),
            item_id.to_string(),
        ));
        Ok(())
    }

    async fn link_pawn_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError> {
        self.pawn_links.lock().unwrap().push((
            ticket_id.to_string(),
            transaction_id.to_string(),
            item_id.to_string(),
        ));
        Ok(())
    }

    async fn link_trade_ticket(
        &self,
        ticket_id: &str,
        transaction_id: &str,
        item_id: &str,
    ) -> Result<(), ServiceError> {
        self.trade_links.lock().unwrap().push((
            ticket_id.to_string(),
            transaction_id.to_string(),
            item_id.to_string(),
        ));
        Ok(())
    }

    async fn delete_pawn_tickets_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<(), ServiceError> {
        self.deleted_pawn_transactions
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        // Mirror the backend: the linked tickets are gone.
        self.pawn_links
            .lock()
            .unwrap()
            .retain(|(_, txn, _)| txn != transaction_id);
        Ok(())
    }
}

// =============================================================================
// Pawn history stub
// =============================================================================

#[derive(Default)]
pub struct StubHistory {
    pub records: Mutex<Vec<(Option<String>, PawnHistoryRecord)>>,
    pub deleted_transactions: Mutex<Vec<String>>,
}

impl StubHistory {
    pub fn records_for(&self, ticket_id: &str) -> Vec<PawnHistoryRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.ticket_id == ticket_id)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl PawnHistoryStore for StubHistory {
    async fn append(
        &self,
        transaction_id: Option<&str>,
        record: &PawnHistoryRecord,
    ) -> Result<(), ServiceError> {
        self.records
            .lock()
            .unwrap()
            .push((transaction_id.map(str::to_string), record.clone()));
        Ok(())
    }

    async fn query(&self, ticket_id: &str) -> Result<Vec<PawnHistoryRecord>, ServiceError> {
        Ok(self.records_for(ticket_id))
    }

    async fn delete_for_transaction(&self, transaction_id: &str) -> Result<(), ServiceError> {
        self.deleted_transactions
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        self.records
            .lock()
            .unwrap()
            .retain(|(txn, _)| txn.as_deref() != Some(transaction_id));
        Ok(())
    }
}

// =============================================================================
// Config stub
// =============================================================================

/// Hands out a fixed configuration snapshot, as the backend would.
pub struct StubConfig(pub StoreConfig);

#[async_trait]
impl ConfigProvider for StubConfig {
    async fn snapshot(&self) -> Result<StoreConfig, ServiceError> {
        Ok(self.0)
    }
}

// =============================================================================
// Fixture bundle
// =============================================================================

pub struct Fixture {
    pub inventory: Arc<StubInventory>,
    pub transactions: Arc<StubTransactions>,
    pub links: Arc<StubLinks>,
    pub history: Arc<StubHistory>,
    pub gate: Arc<CashSessionGate>,
    pub processor: SettlementProcessor,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(StubInventory::default(), StubTransactions::default())
    }

    pub fn with_transactions(transactions: StubTransactions) -> Self {
        Self::build(StubInventory::default(), transactions)
    }

    pub fn with_inventory(inventory: StubInventory) -> Self {
        Self::build(inventory, StubTransactions::default())
    }

    fn build(inventory: StubInventory, transactions: StubTransactions) -> Self {
        let inventory = Arc::new(inventory);
        let transactions = Arc::new(transactions);
        let links = Arc::new(StubLinks::default());
        let history = Arc::new(StubHistory::default());
        let gate = Arc::new(CashSessionGate::new());

        let processor = SettlementProcessor::new(
            inventory.clone(),
            transactions.clone(),
            links.clone(),
            history.clone(),
            gate.clone(),
        );

        Fixture {
            inventory,
            transactions,
            links,
            history,
            gate,
            processor,
        }
    }
}

// =============================================================================
// Common values
// =============================================================================

pub fn standard_terms() -> PawnTerms {
    PawnTerms {
        term_days: 90,
        interest_rate_bps: 290,
        frequency_days: 30,
    }
}

pub fn store_config() -> StoreConfig {
    StoreConfig {
        terms: standard_terms(),
        forfeiture_mode: ForfeitureMode::Manual,
        tax_rate: Rate::from_bps(1300),
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
}

pub fn context() -> SettlementContext {
    SettlementContext {
        customer_id: "C-1".to_string(),
        employee_id: "emp-1".to_string(),
        today: today(),
        config: store_config(),
    }
}
