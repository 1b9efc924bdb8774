//! # Settlement Processor
//!
//! Drives a fully-paid cart into durable records, all-or-nothing.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settlement Commit Protocol                           │
//! │                                                                         │
//! │  1. GUARD       cash session open, cart non-empty and fully settled    │
//! │  2. ITEMS       create artifacts for newly-appraised goods             │
//! │  3. TRANSACTION create the transaction record                          │
//! │  4. TICKETS     per-line linkage; pawn lines create PawnTickets        │
//! │                 and their Created history                              │
//! │  5. PAYMENTS    post every queued PaymentEvent                         │
//! │  6. EFFECTS     sale items → SOLD, redeem tickets → REDEEMED,          │
//! │                 payment lines → Extend history; ticket transitions     │
//! │                 are staged and written back only on full success       │
//! │                                                                         │
//! │  success:       clear the cart                                         │
//! │  failure (2-6): compensate in STRICT REVERSE order:                    │
//! │                 history → tickets → transaction → items                │
//! │                 each step log-and-continue; original error surfaces;   │
//! │                 the cart is NOT cleared and stays re-submittable       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Later steps reference identifiers produced by earlier ones, so the steps
//! run strictly sequentially, and the compensation order mirrors the
//! creation order reversed (foreign-key-like dependencies).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use karat_core::ledger;
use karat_core::validation::{validate_quantity, validate_terms};
use karat_core::{
    CartLine, LineKind, Money, PawnItem, PawnTicket, SettlementCart, StoreConfig, DrawerKind,
};

use crate::drawer::CashSessionGate;
use crate::error::{EngineError, EngineResult};
use crate::services::{
    InventoryService, ItemStatus, NewItem, PawnHistoryStore, TicketLinkService,
    TransactionLedgerService, TransactionPayload,
};

// =============================================================================
// Context & Result
// =============================================================================

/// Who is settling, for whom, and under which configuration snapshot.
#[derive(Debug, Clone)]
pub struct SettlementContext {
    pub customer_id: String,
    pub employee_id: String,
    /// The working business date; becomes the transaction date of any pawn
    /// ticket the settlement creates.
    pub today: NaiveDate,
    /// Configuration snapshot captured when checkout started. Pawn lines
    /// freeze `config.terms` into their tickets.
    pub config: StoreConfig,
}

/// What a successful commit produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub transaction_id: String,
    /// Item artifacts created for newly-appraised goods, in line order.
    pub created_item_ids: Vec<String>,
    /// Pawn tickets written by this settlement.
    pub created_tickets: Vec<PawnTicket>,
    pub total: Money,
}

// =============================================================================
// Compensation
// =============================================================================

/// One undo step, recorded as its durable resource is created.
///
/// Executed in reverse on failure so that dependents are removed before the
/// records they reference.
#[derive(Debug)]
enum Compensation {
    DeleteHistory { transaction_id: String },
    DeletePawnTickets { transaction_id: String },
    DeleteTransaction { transaction_id: String },
    DeleteItem { item_id: String },
}

// =============================================================================
// Settlement Processor
// =============================================================================

/// Orchestrates the commit protocol over the collaborator services.
pub struct SettlementProcessor {
    inventory: Arc<dyn InventoryService>,
    transactions: Arc<dyn TransactionLedgerService>,
    links: Arc<dyn TicketLinkService>,
    history: Arc<dyn PawnHistoryStore>,
    gate: Arc<CashSessionGate>,
}

impl SettlementProcessor {
    pub fn new(
        inventory: Arc<dyn InventoryService>,
        transactions: Arc<dyn TransactionLedgerService>,
        links: Arc<dyn TicketLinkService>,
        history: Arc<dyn PawnHistoryStore>,
        gate: Arc<CashSessionGate>,
    ) -> Self {
        SettlementProcessor {
            inventory,
            transactions,
            links,
            history,
            gate,
        }
    }

    /// Commits a fully-settled cart.
    ///
    /// `tickets` are the caller's loaded pawn tickets referenced by redeem
    /// and payment lines; redeemed/extended tickets are written back only
    /// on full success.
    ///
    /// On success the cart is cleared. On any failure the cart and the
    /// caller's tickets are left untouched and every durable record created
    /// by this attempt has been compensated (best effort, log-and-continue),
    /// so the caller may re-offer the identical cart.
    pub async fn commit(
        &self,
        cart: &mut SettlementCart,
        tickets: &mut [PawnTicket],
        ctx: &SettlementContext,
    ) -> EngineResult<CommitResult> {
        // Guards - all before any mutation.
        if !self.gate.is_open(&ctx.employee_id, DrawerKind::Physical) {
            return Err(EngineError::NoCashSession {
                employee_id: ctx.employee_id.clone(),
            });
        }
        if cart.is_empty() {
            return Err(EngineError::EmptyCart);
        }
        if !cart.is_fully_settled() {
            return Err(EngineError::NotSettled {
                remaining: cart.remaining_balance().to_string(),
            });
        }
        validate_terms(&ctx.config.terms).map_err(karat_core::CoreError::from)?;
        for line in &cart.lines {
            validate_quantity(line.quantity).map_err(karat_core::CoreError::from)?;
        }

        debug!(
            customer_id = %ctx.customer_id,
            employee_id = %ctx.employee_id,
            lines = cart.line_count(),
            total = %cart.total(),
            "Starting settlement commit"
        );

        let mut compensations: Vec<Compensation> = Vec::new();

        match self.run_protocol(cart, tickets, ctx, &mut compensations).await {
            Ok(result) => {
                cart.clear();
                info!(
                    transaction_id = %result.transaction_id,
                    total = %result.total,
                    tickets = result.created_tickets.len(),
                    "Settlement committed"
                );
                Ok(result)
            }
            Err(err) => {
                error!(%err, steps = compensations.len(), "Commit failed, rolling back");
                self.rollback(&compensations).await;
                Err(err)
            }
        }
    }

    /// Steps 2-6. Every durable creation pushes its compensation before the
    /// next fallible call, so the undo list is complete at any failure point.
    async fn run_protocol(
        &self,
        cart: &SettlementCart,
        tickets: &mut [PawnTicket],
        ctx: &SettlementContext,
        compensations: &mut Vec<Compensation>,
    ) -> EngineResult<CommitResult> {
        let total = cart.total();

        // Step 2: item artifacts for newly-appraised goods.
        let line_items = self.create_intake_items(cart, compensations).await?;

        // Step 3: the transaction record.
        let payload = TransactionPayload {
            customer_id: ctx.customer_id.clone(),
            employee_id: ctx.employee_id.clone(),
            lines: cart.lines.clone(),
            total,
        };
        let transaction_id = self.transactions.create_transaction(&payload).await?;
        compensations.push(Compensation::DeleteTransaction {
            transaction_id: transaction_id.clone(),
        });
        debug!(transaction_id = %transaction_id, "Transaction created");

        // Step 4: per-line ticket linkage; pawn lines become tickets.
        let created_tickets = self
            .link_tickets(cart, &line_items, &transaction_id, ctx, compensations)
            .await?;

        // Step 5: post every queued payment.
        for payment in &cart.payments {
            self.transactions
                .post_payment(&transaction_id, payment.amount, payment.method)
                .await?;
        }
        debug!(transaction_id = %transaction_id, payments = cart.payments.len(), "Payments posted");

        // Step 6: post-payment effects.
        self.apply_post_payment_effects(
            cart,
            &line_items,
            tickets,
            &transaction_id,
            ctx,
            compensations,
        )
        .await?;

        let created_item_ids = line_items.into_iter().flatten().collect();

        Ok(CommitResult {
            transaction_id,
            created_item_ids,
            created_tickets,
            total,
        })
    }

    /// Creates inventory artifacts for buy/pawn/trade lines that carry no
    /// existing item reference. Returns, per line, the artifact ID created
    /// for it (None for lines that reference existing inventory or none).
    async fn create_intake_items(
        &self,
        cart: &SettlementCart,
        compensations: &mut Vec<Compensation>,
    ) -> EngineResult<Vec<Option<String>>> {
        let mut intake_indices = Vec::new();
        let mut new_items = Vec::new();

        for (index, line) in cart.lines.iter().enumerate() {
            let needs_artifact = matches!(
                line.kind,
                LineKind::Buy | LineKind::Pawn | LineKind::Trade
            ) && line.item_id.is_none();

            if needs_artifact {
                intake_indices.push(index);
                new_items.push(NewItem {
                    description: intake_description(line.kind),
                    price: line.amount,
                });
            }
        }

        let mut line_items: Vec<Option<String>> = vec![None; cart.lines.len()];
        if new_items.is_empty() {
            return Ok(line_items);
        }

        let created = self.inventory.create_items(&new_items).await?;
        for (index, item_id) in intake_indices.into_iter().zip(created) {
            compensations.push(Compensation::DeleteItem {
                item_id: item_id.clone(),
            });
            line_items[index] = Some(item_id);
        }

        debug!(count = new_items.len(), "Intake items created");
        Ok(line_items)
    }

    /// Links each line to its per-type ticket record; pawn lines (grouped by
    /// ticket ID) create PawnTickets and their Created history.
    async fn link_tickets(
        &self,
        cart: &SettlementCart,
        line_items: &[Option<String>],
        transaction_id: &str,
        ctx: &SettlementContext,
        compensations: &mut Vec<Compensation>,
    ) -> EngineResult<Vec<PawnTicket>> {
        // Group pawn lines that share a ticket ID into one multi-item
        // ticket; lines without one each get their own ticket.
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();

        for (index, line) in cart.lines.iter().enumerate() {
            if line.kind != LineKind::Pawn {
                continue;
            }
            match &line.ticket_id {
                Some(ticket_id) => match group_index.get(ticket_id) {
                    Some(&at) => groups[at].1.push(index),
                    None => {
                        group_index.insert(ticket_id.clone(), groups.len());
                        groups.push((ticket_id.clone(), vec![index]));
                    }
                },
                None => groups.push((Uuid::new_v4().to_string(), vec![index])),
            }
        }

        let mut created_tickets = Vec::new();
        let mut pushed_ticket_comp = false;

        for (ticket_id, line_indices) in groups {
            let items: Vec<PawnItem> = line_indices
                .iter()
                .map(|&index| PawnItem {
                    item_id: resolved_item_id(&cart.lines[index], &line_items[index]),
                    price: cart.lines[index].amount,
                })
                .collect();

            let (ticket, created_record) = ledger::create_ticket(
                &ticket_id,
                &ctx.customer_id,
                items,
                ctx.today,
                ctx.config.terms,
                &ctx.employee_id,
            )?;

            // Push undo steps BEFORE the fallible calls that need them:
            // reverse execution order is history → tickets.
            if !pushed_ticket_comp {
                compensations.push(Compensation::DeletePawnTickets {
                    transaction_id: transaction_id.to_string(),
                });
                pushed_ticket_comp = true;
            }
            push_history_compensation(compensations, transaction_id);

            for item in &ticket.items {
                self.links
                    .link_pawn_ticket(&ticket.ticket_id, transaction_id, &item.item_id)
                    .await?;
            }
            self.history
                .append(Some(transaction_id), &created_record)
                .await?;

            debug!(ticket_id = %ticket.ticket_id, principal = %ticket.principal(), "Pawn ticket created");
            created_tickets.push(ticket);
        }

        // Non-pawn linkage.
        for (index, line) in cart.lines.iter().enumerate() {
            let item_id = resolved_item_id(line, &line_items[index]);
            if item_id.is_empty() {
                continue;
            }
            let ticket_id = line
                .ticket_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            match line.kind {
                LineKind::Buy => {
                    self.links
                        .link_buy_ticket(&ticket_id, transaction_id, &item_id)
                        .await?;
                }
                LineKind::Sale => {
                    self.links
                        .link_sale_ticket(&ticket_id, transaction_id, &item_id)
                        .await?;
                }
                LineKind::Trade => {
                    self.links
                        .link_trade_ticket(&ticket_id, transaction_id, &item_id)
                        .await?;
                }
                _ => {}
            }
        }

        Ok(created_tickets)
    }

    /// Step 6: inventory status flips and ledger history for redeem and
    /// extension lines. Runs only after payments posted successfully.
    ///
    /// Redeem/extend transitions operate on staged clones; the caller's
    /// tickets are written back only once every collaborator call in this
    /// step has succeeded. A failure anywhere leaves them exactly as loaded,
    /// and the history rows appended here are covered by the `DeleteHistory`
    /// compensation pushed before the first append.
    async fn apply_post_payment_effects(
        &self,
        cart: &SettlementCart,
        line_items: &[Option<String>],
        tickets: &mut [PawnTicket],
        transaction_id: &str,
        ctx: &SettlementContext,
        compensations: &mut Vec<Compensation>,
    ) -> EngineResult<()> {
        let mut redeemed: HashSet<String> = HashSet::new();
        let mut staged: Vec<(usize, PawnTicket)> = Vec::new();

        for (index, line) in cart.lines.iter().enumerate() {
            match line.kind {
                LineKind::Sale => {
                    let item_id = resolved_item_id(line, &line_items[index]);
                    if !item_id.is_empty() {
                        self.inventory
                            .set_status(&item_id, ItemStatus::Sold, None)
                            .await?;
                    }
                }
                LineKind::Redeem => {
                    let Some(ticket_id) = &line.ticket_id else {
                        continue;
                    };
                    if !redeemed.insert(ticket_id.clone()) {
                        continue; // one redemption per ticket
                    }
                    let Some(position) = tickets.iter().position(|t| &t.ticket_id == ticket_id)
                    else {
                        warn!(ticket_id = %ticket_id, "Redeem line references unknown ticket, skipping");
                        continue;
                    };
                    let mut ticket = working_copy(&staged, tickets, position);
                    let amounts = ledger::redemption_amount(&ticket);
                    let record = ledger::redeem(&mut ticket, &ctx.employee_id, amounts)?;
                    push_history_compensation(compensations, transaction_id);
                    self.history.append(Some(transaction_id), &record).await?;
                    info!(ticket_id = %ticket_id, total = %amounts.total, "Ticket redeemed");
                    stage(&mut staged, position, ticket);
                }
                LineKind::Payment => {
                    let Some(ticket_id) = &line.ticket_id else {
                        continue;
                    };
                    let Some(position) = tickets.iter().position(|t| &t.ticket_id == ticket_id)
                    else {
                        warn!(ticket_id = %ticket_id, "Payment line references unknown ticket, skipping");
                        continue;
                    };
                    let mut ticket = working_copy(&staged, tickets, position);
                    let quote = ledger::extension_amount(&ticket);
                    // Due-date advancement is caller-supplied on the line;
                    // absent, the ticket keeps its current due date.
                    let new_due = line.new_due_date.unwrap_or(ticket.due_date);
                    let days = line.extension_days.unwrap_or(0);
                    let record =
                        ledger::extend(&mut ticket, &ctx.employee_id, quote, new_due, days)?;
                    push_history_compensation(compensations, transaction_id);
                    self.history.append(Some(transaction_id), &record).await?;
                    info!(ticket_id = %ticket_id, new_due_date = %new_due, "Ticket extended");
                    stage(&mut staged, position, ticket);
                }
                _ => {}
            }
        }

        // Every effect landed; publish the staged transitions to the caller.
        for (position, ticket) in staged {
            tickets[position] = ticket;
        }

        Ok(())
    }

    /// Failure path: best-effort compensation in strict reverse creation order.
    /// A failed undo step is logged and never stops the remaining steps.
    async fn rollback(&self, compensations: &[Compensation]) {
        for compensation in compensations.iter().rev() {
            let outcome = match compensation {
                Compensation::DeleteHistory { transaction_id } => {
                    self.history.delete_for_transaction(transaction_id).await
                }
                Compensation::DeletePawnTickets { transaction_id } => {
                    self.links
                        .delete_pawn_tickets_for_transaction(transaction_id)
                        .await
                }
                Compensation::DeleteTransaction { transaction_id } => {
                    self.transactions.delete_transaction(transaction_id).await
                }
                Compensation::DeleteItem { item_id } => self.inventory.delete_item(item_id).await,
            };

            if let Err(err) = outcome {
                warn!(%err, step = ?compensation, "Rollback step failed, continuing");
            }
        }
    }
}

/// A line's effective inventory reference: its own, or the artifact created
/// for it in step 2. Empty string when neither exists.
fn resolved_item_id(line: &CartLine, created: &Option<String>) -> String {
    line.item_id
        .clone()
        .or_else(|| created.clone())
        .unwrap_or_default()
}

/// Pushes the history compensation once per commit. Callers invoke this
/// before the fallible append it covers, so the undo list is complete at any
/// failure point.
fn push_history_compensation(compensations: &mut Vec<Compensation>, transaction_id: &str) {
    let present = compensations
        .iter()
        .any(|c| matches!(c, Compensation::DeleteHistory { .. }));
    if !present {
        compensations.push(Compensation::DeleteHistory {
            transaction_id: transaction_id.to_string(),
        });
    }
}

/// The current staged state of a ticket, falling back to the caller's copy.
/// A later line targeting an already-staged ticket must see the earlier
/// transition (so e.g. extending a ticket redeemed two lines up still fails).
fn working_copy(
    staged: &[(usize, PawnTicket)],
    tickets: &[PawnTicket],
    position: usize,
) -> PawnTicket {
    staged
        .iter()
        .find(|(p, _)| *p == position)
        .map(|(_, t)| t.clone())
        .unwrap_or_else(|| tickets[position].clone())
}

/// Records a ticket's staged transition, replacing any earlier stage for the
/// same position.
fn stage(staged: &mut Vec<(usize, PawnTicket)>, position: usize, ticket: PawnTicket) {
    match staged.iter_mut().find(|(p, _)| *p == position) {
        Some(entry) => entry.1 = ticket,
        None => staged.push((position, ticket)),
    }
}

fn intake_description(kind: LineKind) -> String {
    match kind {
        LineKind::Buy => "Buy intake".to_string(),
        LineKind::Pawn => "Pawn collateral".to_string(),
        LineKind::Trade => "Trade intake".to_string(),
        _ => "Intake".to_string(),
    }
}
