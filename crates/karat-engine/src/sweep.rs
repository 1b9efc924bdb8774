//! # Overdue Sweep
//!
//! Periodic/triggered auto-forfeiture of tickets past their due date.
//!
//! The sweep is driven by whatever scheduler the host runs (a timer task, a
//! cron hook, an explicit button); this module only owns one pass over a
//! ticket snapshot. Idempotence comes from the state machine: a ticket
//! forfeited by one pass is no longer PAWN, so the next pass skips it.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use karat_core::ledger;
use karat_core::{ForfeitureMode, PawnTicket};

use crate::error::EngineResult;
use crate::services::{InventoryService, ItemStatus, PawnHistoryStore};

/// History note written on every automatic forfeiture.
pub const AUTO_FORFEIT_NOTE: &str = "Auto-forfeited — exceeded due date.";

/// Sweeps a ticket set, forfeiting everything overdue.
pub struct OverdueSweep {
    history: Arc<dyn PawnHistoryStore>,
    inventory: Arc<dyn InventoryService>,
}

impl OverdueSweep {
    pub fn new(history: Arc<dyn PawnHistoryStore>, inventory: Arc<dyn InventoryService>) -> Self {
        OverdueSweep { history, inventory }
    }

    /// Runs one pass. No-op unless `mode` is `Automatic`.
    ///
    /// For every overdue PAWN ticket: transitions it to FORFEITED, appends a
    /// Forfeit history record with [`AUTO_FORFEIT_NOTE`], and releases its
    /// collateral to the processing queue via the inventory collaborator.
    /// Returns the forfeited ticket IDs.
    ///
    /// Running the sweep twice over the same set forfeits nothing the second
    /// time: the status guard in `is_overdue` filters non-PAWN tickets.
    pub async fn run(
        &self,
        tickets: &mut [PawnTicket],
        today: NaiveDate,
        mode: ForfeitureMode,
        performed_by: &str,
    ) -> EngineResult<Vec<String>> {
        if mode != ForfeitureMode::Automatic {
            debug!(?mode, "Forfeiture mode is not automatic, sweep skipped");
            return Ok(Vec::new());
        }

        let mut forfeited = Vec::new();

        for ticket in tickets.iter_mut() {
            if !ledger::is_overdue(ticket, today) {
                continue;
            }

            let record =
                ledger::forfeit(ticket, performed_by, Some(AUTO_FORFEIT_NOTE.to_string()))?;
            self.history.append(None, &record).await?;

            // Collateral becomes store stock awaiting appraisal. Inventory
            // owns the item state; a failure here leaves the forfeiture
            // recorded and the release is retried on a later pass by hand.
            for item in &ticket.items {
                if let Err(err) = self
                    .inventory
                    .set_status(&item.item_id, ItemStatus::AvailableForProcessing, None)
                    .await
                {
                    warn!(%err, item_id = %item.item_id, "Failed to release forfeited collateral");
                }
            }

            info!(
                ticket_id = %ticket.ticket_id,
                due_date = %ticket.due_date,
                "Ticket auto-forfeited"
            );
            forfeited.push(ticket.ticket_id.clone());
        }

        Ok(forfeited)
    }
}
